mod config;
mod errors;
mod inference;
mod models;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::inference::{CompetencyEngine, ModelRegistry};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // load .env if present; ignore if missing

    // Initialize structured logging before config so invalid values are reported
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}=info", env!("CARGO_CRATE_NAME")))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    info!("Starting competency API v{}", env!("CARGO_PKG_VERSION"));

    // Warm the classifier so the first request doesn't pay for the load
    let registry = Arc::new(ModelRegistry::new(config.model_path.clone()));
    let warm = registry.clone();
    match tokio::task::spawn_blocking(move || warm.get()).await? {
        Some(artifact) => info!(
            path = %config.model_path.display(),
            classes = artifact.classes().len(),
            "classifier ready"
        ),
        None => warn!(
            path = %config.model_path.display(),
            "no classifier loaded; serving rule and keyword results"
        ),
    }

    let engine = Arc::new(CompetencyEngine::new(registry, config.inference.clone()));
    let state = AppState {
        config: config.clone(),
        engine,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
