//! Health, readiness and metrics endpoints for the generator daemon
//!
//! - `/healthz`: generator staleness and stream writer failures, 503 once
//!   either is unhealthy
//! - `/readyz`: 503 until the first batch reaches the stream file
//! - `/metrics`: Prometheus text exposition

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use monitor_lib::HealthRegistry;
use prometheus::{Encoder, TextEncoder};
use std::sync::Arc;
use tracing::{info, warn};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub health_registry: HealthRegistry,
}

fn availability(ok: bool) -> StatusCode {
    if ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;
    (availability(health.status.is_operational()), Json(health))
}

async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;
    (availability(readiness.ready), Json(readiness))
}

async fn metrics() -> impl IntoResponse {
    let mut buffer = Vec::new();
    let status = match TextEncoder::new().encode(&prometheus::gather(), &mut buffer) {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            warn!(error = %e, "Failed to encode metrics");
            buffer.clear();
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (
        status,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        buffer,
    )
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Serve the endpoints on `port` until the task is aborted
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "API server listening");

    axum::serve(listener, create_router(state)).await?;
    Ok(())
}
