//! Health Check Handlers
//!
//! Provides health check endpoints for liveness and readiness probes.
//!
//! # Endpoints
//! - `GET /health` - Basic health check
//! - `GET /health/live` - Liveness probe (is the server running?)
//! - `GET /health/ready` - Readiness probe (is the profile store reachable?)

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::Serialize;
use std::time::{Duration, Instant};

use crate::domain::ProfileStore;
use crate::startup::AppState;

/// Server start time for uptime calculation
static SERVER_START: Lazy<Instant> = Lazy::new(Instant::now);
static SERVER_START_TIME: Lazy<DateTime<Utc>> = Lazy::new(Utc::now);

/// Upper bound on a readiness ping
const STORE_PING_TIMEOUT: Duration = Duration::from_secs(2);

/// Store latency above which the gateway reports itself degraded
const STORE_DEGRADED_LATENCY_MS: u64 = 50;

/// Initialize the server start time (call during startup)
pub fn init_server_start() {
    Lazy::force(&SERVER_START);
    Lazy::force(&SERVER_START_TIME);
}

/// Basic health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Detailed health check response
#[derive(Debug, Serialize)]
pub struct DetailedHealthResponse {
    pub status: HealthStatus,
    pub version: &'static str,
    pub uptime_seconds: u64,
    pub started_at: String,
    pub checks: HealthChecks,
}

#[derive(Debug, Serialize)]
pub struct HealthChecks {
    pub profile_store: ServiceHealth,
    pub connections: ConnectionHealth,
}

/// Health status for individual services
#[derive(Debug, Serialize)]
pub struct ServiceHealth {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Registry counts
#[derive(Debug, Serialize)]
pub struct ConnectionHealth {
    pub registered: usize,
    pub open: usize,
}

/// Overall health status
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Simple liveness response
#[derive(Debug, Serialize)]
pub struct LivenessResponse {
    pub status: &'static str,
}

/// Basic health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Liveness probe - always 200 while the process is serving
pub async fn liveness() -> Json<LivenessResponse> {
    Json(LivenessResponse { status: "alive" })
}

/// Readiness probe - 503 when the profile store cannot be reached
pub async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    let store_health = check_profile_store(state.profile_store.as_ref()).await;
    let status = store_health.status;

    let response = DetailedHealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: SERVER_START.elapsed().as_secs(),
        started_at: SERVER_START_TIME.to_rfc3339(),
        checks: HealthChecks {
            profile_store: store_health,
            connections: ConnectionHealth {
                registered: state.registry.len(),
                open: state.registry.open_count(),
            },
        },
    };

    let status_code = match status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(response))
}

/// Ping the profile store and grade its latency
async fn check_profile_store(store: &dyn ProfileStore) -> ServiceHealth {
    let start = Instant::now();
    match tokio::time::timeout(STORE_PING_TIMEOUT, store.ping()).await {
        Ok(Ok(())) => {
            let latency = start.elapsed().as_millis() as u64;
            ServiceHealth {
                status: if latency < STORE_DEGRADED_LATENCY_MS {
                    HealthStatus::Healthy
                } else {
                    HealthStatus::Degraded
                },
                latency_ms: Some(latency),
                message: None,
            }
        }
        Ok(Err(e)) => ServiceHealth {
            status: HealthStatus::Unhealthy,
            latency_ms: None,
            message: Some(format!("Profile store check failed: {}", e)),
        },
        Err(_) => ServiceHealth {
            status: HealthStatus::Unhealthy,
            latency_ms: None,
            message: Some("Profile store ping timed out".to_string()),
        },
    }
}
