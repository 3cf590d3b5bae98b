//! Status Routes
//!
//! Health checks.
//!
//! Routes:
//! - GET /health - Basic health check (store ping)
//! - GET /health/ready - Readiness check (store and archive configuration)

use std::time::Instant;

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::AppState;

/// Build status routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/ready", get(readiness_check))
}

// ============================================================================
// Response Types
// ============================================================================

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Readiness check response.
#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub checks: Vec<DependencyCheck>,
}

#[derive(Debug, Serialize)]
pub struct DependencyCheck {
    pub name: String,
    pub status: HealthStatus,
    pub latency_ms: Option<u64>,
    pub message: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Basic health check.
///
/// GET /health
///
/// Pings the local store; 503 when it does not answer.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let status = match state.library.store().health_check().await {
        Ok(()) => HealthStatus::Healthy,
        Err(e) => {
            tracing::warn!("Store health check failed: {}", e);
            HealthStatus::Unhealthy
        }
    };

    let code = if status == HealthStatus::Healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        code,
        Json(HealthResponse {
            status,
            version: env!("CARGO_PKG_VERSION").into(),
            timestamp: Utc::now(),
        }),
    )
}

/// Readiness check.
///
/// GET /health/ready
///
/// Returns 503 when the local store does not answer. A missing archive only
/// degrades the service, since uploads and listings still work.
async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    let store_check = check_store(&state).await;
    let ready = store_check.status == HealthStatus::Healthy;

    let archive_check = DependencyCheck {
        name: "archive".into(),
        status: if state.library.has_archive() {
            HealthStatus::Healthy
        } else {
            HealthStatus::Degraded
        },
        latency_ms: None,
        message: (!state.library.has_archive()).then(|| "Archive not configured".to_string()),
    };

    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(ReadinessResponse {
            ready,
            checks: vec![store_check, archive_check],
        }),
    )
}

async fn check_store(state: &AppState) -> DependencyCheck {
    let start = Instant::now();
    let result = state.library.store().health_check().await;
    let latency_ms = start.elapsed().as_millis() as u64;

    let (status, message) = match result {
        Ok(()) => (HealthStatus::Healthy, None),
        Err(e) => (HealthStatus::Unhealthy, Some(e.to_string())),
    };

    DependencyCheck {
        name: "store".into(),
        status,
        latency_ms: Some(latency_ms),
        message,
    }
}
