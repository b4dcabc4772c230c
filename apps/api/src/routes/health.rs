use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns service status, version, and the classifier state without triggering a load.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "competency-api",
        "model_path": state.config.model_path.display().to_string(),
        "model": state.engine.registry().status(),
    }))
}
