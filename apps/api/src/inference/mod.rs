// Competency inference core.
// Classifier probabilities first; rule-based and keyword scorers fill in when the model
// is missing, fails, or returns nothing. Nothing in here touches the network.

pub mod catalog;
pub mod classifier;
pub mod engine;
pub mod handlers;
pub mod keywords;
pub mod ml;
pub mod normalizer;
pub mod registry;
pub mod rules;

use serde::Serialize;
use thiserror::Error;

use crate::inference::rules::FusionWeights;

pub use engine::CompetencyEngine;

/// Largest `top_k` a job analysis accepts, from a request or from configuration.
pub const MAX_TOP_K: usize = 20;
pub use registry::ModelRegistry;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("no model source configured")]
    NoSource,

    #[error("cannot read model artifact {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse model artifact: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("malformed model artifact: {0}")]
    Malformed(String),

    #[error("inference failed: {0}")]
    Inference(String),
}

/// Numeric policy knobs. Every field has a working default.
#[derive(Debug, Clone, Serialize)]
pub struct InferenceSettings {
    /// Global threshold that beats anything stored in the artifact.
    pub threshold_override: Option<f64>,
    /// Profile path: backfill until this many competencies are returned.
    pub min_results: usize,
    /// Backfill never goes below this probability.
    pub min_prob_floor: f64,
    /// Job path `top_k` when the request doesn't give one.
    pub default_top_k: usize,
    pub fusion_weights: FusionWeights,
}

impl Default for InferenceSettings {
    fn default() -> Self {
        Self {
            threshold_override: None,
            min_results: 3,
            min_prob_floor: 0.25,
            default_top_k: 6,
            fusion_weights: FusionWeights::default(),
        }
    }
}
