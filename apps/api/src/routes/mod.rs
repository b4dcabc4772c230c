pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::errors::AppError;
use crate::inference::handlers;
use crate::state::AppState;

async fn not_found() -> AppError {
    AppError::NotFound("no such route".to_string())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/api/v1/analyze/profile",
            post(handlers::handle_analyze_profile),
        )
        .route("/api/v1/analyze/job", post(handlers::handle_analyze_job))
        .route("/api/v1/model/reload", post(handlers::handle_model_reload))
        .route("/api/v1/model/clear", post(handlers::handle_model_clear))
        .fallback(not_found)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::inference::{CompetencyEngine, InferenceSettings, ModelRegistry};

    const SAMPLE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures/sample_artifact.json");

    fn app(registry: ModelRegistry) -> Router {
        let settings = InferenceSettings::default();
        let engine = Arc::new(CompetencyEngine::new(Arc::new(registry), settings.clone()));
        let config = Config {
            port: 0,
            model_path: PathBuf::from(SAMPLE),
            inference: settings,
        };
        build_router(AppState { config, engine })
    }

    async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => request
                .header("content-type", "application/json")
                .body(Body::from(json.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn health_reports_model_state() {
        let (status, body) = send(app(ModelRegistry::disabled()), Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "competency-api");
        assert_eq!(body["model"]["state"], "not_loaded");
    }

    #[tokio::test]
    async fn profile_without_model_uses_rules() {
        let payload = json!({
            "subject_id": "p-001",
            "workshops": [{ "topic": "Excel", "attendance_fraction": 1.0 }]
        });
        let (status, body) = send(
            app(ModelRegistry::disabled()),
            Method::POST,
            "/api/v1/analyze/profile",
            Some(payload),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["subject_id"], "p-001");
        assert_eq!(body["meta"]["mode"], "rules");
        assert_eq!(body["meta"]["weights"]["workshops"], 0.6);
        let first = &body["competencies"][0];
        assert_eq!(first["name"], "Analítica de Datos");
        assert_eq!(first["level"], 100.0);
        assert_eq!(first["confidence"], 0.75);
        assert_eq!(first["sources"], json!(["talleres"]));
    }

    #[tokio::test]
    async fn profile_accepts_spanish_field_names() {
        let payload = json!({
            "participanteId": "p-002",
            "cvTexto": "Experiencia en python y sql",
            "talleres": [{ "tema": "SQL", "asistencia_pct": 0.5 }],
            "useML": false
        });
        let (status, body) = send(
            app(ModelRegistry::new(SAMPLE)),
            Method::POST,
            "/api/v1/analyze/profile",
            Some(payload),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["subject_id"], "p-002");
        assert_eq!(body["meta"]["mode"], "rules");
        let names: Vec<&str> = body["competencies"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["name"].as_str().unwrap())
            .collect();
        assert!(names.contains(&"Analítica de Datos"));
        assert!(names.contains(&"Programación"));
    }

    #[tokio::test]
    async fn profile_rejects_attendance_out_of_range() {
        let payload = json!({ "workshops": [{ "topic": "Excel", "attendance_fraction": 1.5 }] });
        let (status, body) = send(
            app(ModelRegistry::disabled()),
            Method::POST,
            "/api/v1/analyze/profile",
            Some(payload),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn job_without_model_uses_keywords() {
        let payload = json!({
            "puestoTexto": "Buscamos vendedor con experiencia en ventas y atención al cliente.",
            "topK": 5
        });
        let (status, body) = send(
            app(ModelRegistry::disabled()),
            Method::POST,
            "/api/v1/analyze/job",
            Some(payload),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["meta"]["mode"], "keywords");
        let competencies = body["competencies"].as_array().unwrap();
        assert_eq!(competencies.len(), 2);
        for c in competencies {
            assert_eq!(c["level"], 55.0);
            assert_eq!(c["confidence"], 0.6);
            assert_eq!(c["sources"], json!(["keywords"]));
        }
    }

    #[tokio::test]
    async fn job_without_any_signal_is_empty() {
        let payload = json!({ "job_text": "" });
        let (status, body) = send(
            app(ModelRegistry::disabled()),
            Method::POST,
            "/api/v1/analyze/job",
            Some(payload),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["meta"]["mode"], "none");
        assert_eq!(body["competencies"], json!([]));
    }

    #[tokio::test]
    async fn job_without_top_k_uses_configured_default() {
        let payload = json!({ "job_text": "ventas" });
        let (status, body) = send(
            app(ModelRegistry::disabled()),
            Method::POST,
            "/api/v1/analyze/job",
            Some(payload),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["meta"]["mode"], "keywords");
        assert_eq!(body["competencies"][0]["name"], "Ventas");
    }

    #[tokio::test]
    async fn job_rejects_top_k_out_of_range() {
        for top_k in [0, 21] {
            let payload = json!({ "job_text": "ventas", "top_k": top_k });
            let (status, _) = send(
                app(ModelRegistry::disabled()),
                Method::POST,
                "/api/v1/analyze/job",
                Some(payload),
            )
            .await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "top_k = {top_k}");
        }
    }

    #[tokio::test]
    async fn reload_without_source_is_unavailable() {
        let (status, body) = send(
            app(ModelRegistry::disabled()),
            Method::POST,
            "/api/v1/model/reload",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"]["code"], "MODEL_UNAVAILABLE");
    }

    #[tokio::test]
    async fn reload_reports_loaded_model() {
        let (status, body) = send(
            app(ModelRegistry::new(SAMPLE)),
            Method::POST,
            "/api/v1/model/reload",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["model"]["state"], "loaded");
        assert_eq!(body["model"]["classes"], 4);
        assert_eq!(body["model"]["variant"], "probability");
    }

    #[tokio::test]
    async fn clear_drops_cached_model() {
        let registry = Arc::new(ModelRegistry::new(SAMPLE));
        assert!(registry.get().is_some());
        let engine = Arc::new(CompetencyEngine::new(
            Arc::clone(&registry),
            InferenceSettings::default(),
        ));
        let config = Config {
            port: 0,
            model_path: PathBuf::from(SAMPLE),
            inference: InferenceSettings::default(),
        };
        let app = build_router(AppState { config, engine });

        let (status, body) = send(app, Method::POST, "/api/v1/model/clear", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["model"]["state"], "not_loaded");
        assert!(registry.get().is_some());
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let (status, body) = send(app(ModelRegistry::disabled()), Method::GET, "/api/v1/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }
}
