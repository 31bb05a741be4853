//! Health Check API Tests

use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::Value;

use feed_gateway::infrastructure::profile_store::InMemoryProfileStore;

use crate::common::{test_router, TestApp, UnavailableStore};

fn server_with_memory_store() -> TestServer {
    TestServer::new(test_router(Arc::new(InMemoryProfileStore::new()))).unwrap()
}

#[tokio::test]
async fn test_health_check_returns_version() {
    let server = server_with_memory_store();

    let response = server.get("/health").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_liveness_probe() {
    let server = TestServer::new(test_router(Arc::new(UnavailableStore))).unwrap();

    let response = server.get("/health/live").await;

    // Liveness ignores dependencies
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["status"], "alive");
}

#[tokio::test]
async fn test_readiness_reports_store_and_connections() {
    let server = server_with_memory_store();

    let response = server.get("/health/ready").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_ne!(body["checks"]["profile_store"]["status"], "unhealthy");
    assert_eq!(body["checks"]["connections"]["registered"], 0);
}

#[tokio::test]
async fn test_readiness_fails_when_store_is_down() {
    let server = TestServer::new(test_router(Arc::new(UnavailableStore))).unwrap();

    let response = server.get("/health/ready").await;

    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = response.json();
    assert_eq!(body["status"], "unhealthy");
}

#[tokio::test]
async fn test_readiness_counts_joined_connections() {
    let app = TestApp::spawn().await;
    let _a = app.join("a", None).await;
    let _b = app.join("b", Some("r1")).await;
    app.wait_for_registered(2).await;

    let server = TestServer::new(test_router_for(&app)).unwrap();
    let body: Value = server.get("/health/ready").await.json();

    assert_eq!(body["checks"]["connections"]["registered"], 2);
    assert_eq!(body["checks"]["connections"]["open"], 2);
}

#[tokio::test]
async fn test_metrics_exposes_gateway_series() {
    let server = server_with_memory_store();

    let response = server.get("/metrics").await;

    response.assert_status_ok();
    assert!(response.text().contains("feed_gateway_"));
}

fn test_router_for(app: &TestApp) -> axum::Router {
    feed_gateway::presentation::http::create_router(app.state.clone())
}
