//! Health Routes
//!
//! Health check endpoints for monitoring and Kubernetes probes.
//!
//! - GET /health/live - Liveness probe (process is alive)
//! - GET /health/ready - Readiness probe (backend reachable)
//! - GET /health - Full health status

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::api::dto::HealthResponse;
use crate::api::state::AppState;
use crate::backend::{BackendResult, Query};
use crate::model::Table;

/// GET /health/live
///
/// Kubernetes liveness probe.
/// Returns 200 if the process is alive, no dependency checks.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// GET /health/ready
///
/// Kubernetes readiness probe.
/// Returns 200 if a one-row read against the backend succeeds.
pub async fn readiness(State(state): State<Arc<AppState>>) -> StatusCode {
    match check_backend(&state).await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// GET /health
///
/// Full health status with component details.
pub async fn full_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let (status, backend) = match check_backend(&state).await {
        Ok(()) => ("healthy", "ok".to_string()),
        Err(e) => ("degraded", e.to_string()),
    };

    Json(HealthResponse {
        status: status.to_string(),
        backend,
        backend_kind: state.backend.name().to_string(),
        signed_in: state.workspace.session().is_some(),
        uptime_seconds: state.uptime_seconds(),
        ws_connections: state.ws_connection_count(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn check_backend(state: &AppState) -> BackendResult<()> {
    state
        .backend
        .select(Table::Categories, &Query::new().limit(1))
        .await
        .map(|_| ())
}
