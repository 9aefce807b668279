// =============================================================================
// REST API Endpoints: Axum 0.7
// =============================================================================
//
// All endpoints live under `/api/v1/`:
//   POST /api/v1/analyze   candle window in, AnalysisResult out
//   GET  /api/v1/health    liveness + served counter
//   GET  /api/v1/config    current default AnalysisConfig
//   POST /api/v1/config    replace the defaults (validated)
//
// Every AnalysisError maps to HTTP 400 `{ "error": "<message>" }`.
// CORS only admits `http://localhost[:port]` origins.
// =============================================================================

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Json, State},
    http::{header::HeaderValue, request::Parts, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use serde_json::Value;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{info, warn};

use crate::analysis::{self, AnalysisRequest};
use crate::app_state::AppState;
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;

// =============================================================================
// Router construction
// =============================================================================

/// Build the REST API router with CORS middleware and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(|origin: &HeaderValue, _: &Parts| {
            is_local_origin(origin)
        }))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/analyze", post(analyze))
        .route("/api/v1/health", get(health))
        .route("/api/v1/config", get(get_config).post(set_config))
        .layer(ServiceBuilder::new().layer(cors))
        .with_state(state)
}

fn is_local_origin(origin: &HeaderValue) -> bool {
    let Ok(origin) = origin.to_str() else {
        return false;
    };
    match origin.strip_prefix("http://localhost") {
        Some("") => true,
        Some(rest) => rest
            .strip_prefix(':')
            .is_some_and(|port| !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit())),
        None => false,
    }
}

// =============================================================================
// Errors
// =============================================================================

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for AnalysisError {
    fn into_response(self) -> Response {
        warn!(error = %self, "request rejected");
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

fn parse_body(body: &[u8]) -> Result<Value, AnalysisError> {
    serde_json::from_slice(body)
        .map_err(|e| AnalysisError::InvalidInput(format!("request body is not valid JSON: {e}")))
}

// =============================================================================
// Analyze
// =============================================================================

async fn analyze(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let defaults = state.config();
    let outcome = parse_body(&body)
        .and_then(|value| AnalysisRequest::from_json(&value))
        .and_then(|request| analysis::analyze(&request, &defaults));

    match outcome {
        Ok(result) => {
            state.record_analysis();
            Json(result).into_response()
        }
        Err(e) => e.into_response(),
    }
}

// =============================================================================
// Health
// =============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    analyses_served: u64,
    server_time: i64,
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        analyses_served: state.analyses_served(),
        server_time: chrono::Utc::now().timestamp_millis(),
    })
}

// =============================================================================
// Config
// =============================================================================

async fn get_config(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.config())
}

async fn set_config(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let outcome = parse_body(&body).and_then(|value| {
        let config = AnalysisConfig::from_json(&value)?;
        config.validate()?;
        Ok(config)
    });

    match outcome {
        Ok(config) => {
            info!(
                ema_periods = ?config.ema_periods,
                confidence_floor = config.confidence_floor,
                "default analysis config replaced"
            );
            state.replace_config(config.clone());
            Json(config).into_response()
        }
        Err(e) => e.into_response(),
    }
}
