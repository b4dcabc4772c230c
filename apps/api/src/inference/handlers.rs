use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::inference::engine::{AnalysisResult, JobAnalysis, ProfileOptions};
use crate::inference::registry::ModelStatus;
use crate::inference::MAX_TOP_K;
use crate::models::competency::WorkshopRecord;
use crate::state::AppState;

fn default_true() -> bool {
    true
}

/// Spanish field names used by existing clients are accepted as aliases.
#[derive(Debug, Deserialize)]
pub struct ProfileRequest {
    #[serde(default, alias = "participanteId")]
    pub subject_id: Option<String>,
    #[serde(default, alias = "cvTexto")]
    pub cv_text: Option<String>,
    #[serde(default, alias = "talleres")]
    pub workshops: Option<Vec<WorkshopRecord>>,
    #[serde(default = "default_true", alias = "useML")]
    pub use_ml: bool,
    #[serde(default = "default_true", alias = "incluirTalleres")]
    pub include_workshops: bool,
}

#[derive(Debug, Deserialize)]
pub struct JobRequest {
    #[serde(alias = "puestoTexto")]
    pub job_text: String,
    #[serde(default, alias = "topK")]
    pub top_k: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    pub model: ModelStatus,
}

/// POST /api/v1/analyze/profile
pub async fn handle_analyze_profile(
    State(state): State<AppState>,
    Json(req): Json<ProfileRequest>,
) -> Result<Json<AnalysisResult>, AppError> {
    if let Some(bad) = req
        .workshops
        .iter()
        .flatten()
        .find(|w| !(0.0..=1.0).contains(&w.attendance_fraction))
    {
        return Err(AppError::Validation(format!(
            "attendance_fraction for '{}' must be between 0 and 1",
            bad.topic
        )));
    }

    let engine = state.engine.clone();
    let result = tokio::task::spawn_blocking(move || {
        let options = ProfileOptions {
            use_ml: req.use_ml,
            include_workshops: req.include_workshops,
        };
        engine.analyze_profile(
            req.subject_id,
            req.cv_text.as_deref(),
            req.workshops.as_deref(),
            options,
        )
    })
    .await
    .map_err(|e| AppError::Internal(e.into()))?;

    Ok(Json(result))
}

/// POST /api/v1/analyze/job
pub async fn handle_analyze_job(
    State(state): State<AppState>,
    Json(req): Json<JobRequest>,
) -> Result<Json<JobAnalysis>, AppError> {
    let top_k = req
        .top_k
        .unwrap_or(state.engine.settings().default_top_k);
    if !(1..=MAX_TOP_K).contains(&top_k) {
        return Err(AppError::Validation(format!(
            "top_k must be between 1 and {MAX_TOP_K}"
        )));
    }

    let engine = state.engine.clone();
    let result =
        tokio::task::spawn_blocking(move || engine.analyze_job_requirements(&req.job_text, top_k))
            .await
            .map_err(|e| AppError::Internal(e.into()))?;

    Ok(Json(result))
}

/// POST /api/v1/model/reload
pub async fn handle_model_reload(
    State(state): State<AppState>,
) -> Result<Json<ReloadResponse>, AppError> {
    let registry = state.engine.registry().clone();
    let status = tokio::task::spawn_blocking(move || {
        registry.reload().map(|_| registry.status())
    })
    .await
    .map_err(|e| AppError::Internal(e.into()))?
    .map_err(|e| AppError::ModelUnavailable(e.to_string()))?;

    tracing::info!(?status, "classifier reloaded on request");
    Ok(Json(ReloadResponse { model: status }))
}

/// POST /api/v1/model/clear
/// Drops the cached classifier; the next analysis loads it again from disk.
pub async fn handle_model_clear(State(state): State<AppState>) -> Json<ReloadResponse> {
    let registry = state.engine.registry();
    registry.clear();
    tracing::info!("classifier cache cleared on request");
    Json(ReloadResponse {
        model: registry.status(),
    })
}
