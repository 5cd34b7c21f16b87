//! Integration tests for the generator API endpoints

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use coldstore_generator::api::{create_router, AppState};
use monitor_lib::{
    generator::GenerationLoopBuilder, stream::CsvSink, HealthRegistry, MonitorMetrics, ZoneId,
};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

const TICK: Duration = Duration::from_secs(10);

fn setup_test_app() -> (Router, Arc<AppState>) {
    let state = Arc::new(AppState {
        health_registry: HealthRegistry::new(TICK),
    });
    (create_router(state.clone()), state)
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

async fn get_text(app: Router, uri: &str) -> String {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}

#[tokio::test]
async fn test_healthz_returns_ok_when_healthy() {
    let (app, state) = setup_test_app();
    state.health_registry.record_tick().await;

    let (status, health) = get_json(app, "/healthz").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["generator"]["status"], "healthy");
    assert_eq!(health["stream_writer"]["status"], "healthy");
    assert_eq!(health["ticks"], 1);
}

#[tokio::test]
async fn test_healthz_returns_ok_when_writer_degraded() {
    let (app, state) = setup_test_app();
    state.health_registry.record_write_failure("append failed").await;

    let (status, health) = get_json(app, "/healthz").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "degraded");
    assert_eq!(
        health["stream_writer"]["message"],
        "1 failed appends: append failed"
    );
}

#[tokio::test]
async fn test_healthz_returns_503_after_repeated_write_failures() {
    let (app, state) = setup_test_app();
    for _ in 0..5 {
        state.health_registry.record_write_failure("disk full").await;
    }

    let (status, health) = get_json(app, "/healthz").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(health["status"], "unhealthy");
    assert_eq!(health["stream_writer"]["status"], "unhealthy");
}

#[tokio::test]
async fn test_readyz_returns_503_before_first_batch() {
    let (app, _state) = setup_test_app();

    let (status, readiness) = get_json(app, "/readyz").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(readiness["ready"], false);
    assert_eq!(readiness["reason"], "No readings persisted yet");
}

#[tokio::test]
async fn test_readyz_after_generated_batch_is_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stream.csv");
    let (app, state) = setup_test_app();

    let mut generation = GenerationLoopBuilder::new()
        .sink(Arc::new(CsvSink::new(&path)))
        .health(state.health_registry.clone())
        .seed(Some(3))
        .build()
        .unwrap();
    let at = chrono::NaiveDate::from_ymd_opt(2024, 6, 1)
        .and_then(|d| d.and_hms_opt(9, 0, 0))
        .unwrap();
    let results = generation.tick_at(at).await;
    assert!(results.persisted);

    let (status, readiness) = get_json(app, "/readyz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(readiness["ready"], true);

    let load = monitor_lib::stream::load_stream(&path).unwrap();
    assert_eq!(load.readings.len(), ZoneId::ALL.len());
}

#[tokio::test]
async fn test_readyz_returns_503_when_writer_keeps_failing() {
    let (app, state) = setup_test_app();
    state.health_registry.record_write_success().await;
    for _ in 0..5 {
        state.health_registry.record_write_failure("disk full").await;
    }

    let (status, readiness) = get_json(app, "/readyz").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(readiness["reason"], "Component unhealthy");
}

#[tokio::test]
async fn test_metrics_endpoint_returns_prometheus_format() {
    let (app, _state) = setup_test_app();

    let metrics = MonitorMetrics::new();
    metrics.observe_generation_latency(0.001);
    metrics.record_reading(ZoneId::Pharma, 9.2, false);
    metrics.inc_alerts_raised(ZoneId::Pharma, monitor_lib::alerting::Severity::Warning);
    metrics.set_zones_monitored(4);

    let metrics_text = get_text(app, "/metrics").await;

    assert!(metrics_text.contains("coldstore_generation_latency_seconds_bucket"));
    assert!(metrics_text.contains("coldstore_readings_generated_total"));
    assert!(metrics_text.contains("coldstore_readings_out_of_band_total"));
    assert!(metrics_text.contains("coldstore_alerts_raised_total"));
    assert!(metrics_text.contains("zone=\"Z4-Pharma\""));
    assert!(metrics_text.contains("coldstore_zones_monitored"));
}
