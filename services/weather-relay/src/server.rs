//! HTTP server for relay health and status.
//!
//! Provides endpoints for:
//! - Liveness (`/health`)
//! - Outcome counters and settings (`/status`)
//! - Prometheus scraping (`/metrics`)

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::stats::{RelayStats, StatsSnapshot};

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub service: String,
    pub queue: String,
    pub endpoint: String,
    pub workers: usize,
    pub prefetch: usize,
    pub started_at: String,
    pub uptime_secs: i64,
    pub stats: StatsSnapshot,
}

// ============================================================================
// Shared State
// ============================================================================

pub struct ServerState {
    pub stats: Arc<RelayStats>,
    pub queue: String,
    /// Endpoint with credentials redacted.
    pub endpoint: String,
    pub workers: usize,
    pub prefetch: usize,
    /// None when no recorder is installed (tests).
    pub prometheus: Option<PrometheusHandle>,
}

// ============================================================================
// Router
// ============================================================================

/// Create the status API router.
pub fn create_router(state: Arc<ServerState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/status", get(status_handler))
        .route("/metrics", get(metrics_handler))
        .layer(cors)
        .layer(Extension(state))
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /health
async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: "weather-relay".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /status - counters plus the settings operators usually ask about
async fn status_handler(Extension(state): Extension<Arc<ServerState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        service: "weather-relay".to_string(),
        queue: state.queue.clone(),
        endpoint: state.endpoint.clone(),
        workers: state.workers,
        prefetch: state.prefetch,
        started_at: state.stats.started_at().to_rfc3339(),
        uptime_secs: state.stats.uptime_secs(),
        stats: state.stats.snapshot(),
    })
}

/// GET /metrics - Prometheus text format
async fn metrics_handler(Extension(state): Extension<Arc<ServerState>>) -> impl IntoResponse {
    match &state.prometheus {
        Some(handle) => (StatusCode::OK, handle.render()).into_response(),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            "metrics recorder not installed",
        )
            .into_response(),
    }
}

pub async fn run_server(state: Arc<ServerState>, port: u16) -> anyhow::Result<()> {
    let app = create_router(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    info!(port = port, "Starting relay status server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
