use std::sync::Arc;

use crate::config::Config;
use crate::inference::CompetencyEngine;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Scoring engine; owns the process-wide classifier cache.
    pub engine: Arc<CompetencyEngine>,
}
