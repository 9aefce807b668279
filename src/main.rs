// =============================================================================
// SUSE Engine: Main Entry Point
// =============================================================================
//
// Loads the default analysis config and serves the REST API. The pipeline is
// stateless; nothing else runs in the background.
// =============================================================================

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use suse_engine::api;
use suse_engine::app_state::AppState;
use suse_engine::AnalysisConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & logging ─────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("SUSE Engine starting up");

    // ── 2. Default analysis config ───────────────────────────────────────
    let config_path =
        std::env::var("ANALYSIS_CONFIG").unwrap_or_else(|_| "analysis_config.json".into());
    let config = match AnalysisConfig::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            warn!(path = %config_path, error = %format!("{e:#}"), "using default analysis config");
            AnalysisConfig::default()
        }
    };
    info!(
        required_candles = config.required_candles(),
        max_candles = config.max_candles,
        "analysis defaults ready"
    );

    // ── 3. API server ────────────────────────────────────────────────────
    let state = Arc::new(AppState::new(config));
    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:4000".into());

    let app = api::rest::router(state);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind API server on {bind_addr}"))?;
    info!(addr = %bind_addr, "API server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("API server failed")?;

    info!("SUSE Engine stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
