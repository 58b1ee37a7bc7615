//! Health check endpoints for Kubernetes probes
//!
//! - `/healthz` - Liveness: Is the process alive?
//! - `/readyz` - Readiness: Warm, and is the database (if any) reachable?

use super::AppState;
use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct HealthStatus {
    pub status: String,
}

#[derive(Serialize, ToSchema)]
pub struct ReadyStatus {
    /// `true`, `warming`, `db-connecting` or `db-ping-fail`
    pub ready: String,
}

/// Liveness probe handler
///
/// Always returns 200 OK - if this responds, the process is alive.
#[utoipa::path(
    get,
    path = "/healthz",
    tag = "healthcheck",
    summary = "Liveness check",
    responses((status = 200, description = "Alive", body = HealthStatus))
)]
pub async fn healthz() -> (StatusCode, Json<HealthStatus>) {
    (
        StatusCode::OK,
        Json(HealthStatus {
            status: "ok".to_string(),
        }),
    )
}

/// Readiness probe handler
///
/// Returns 200 `{"ready":"true"}` when ready, otherwise 503 with the reason
/// (`warming`, `db-connecting` or `db-ping-fail`).
#[utoipa::path(
    get,
    path = "/readyz",
    tag = "healthcheck",
    summary = "Readiness check: warmup and database reachability",
    responses(
        (status = 200, description = "Ready", body = ReadyStatus),
        (status = 503, description = "Not ready: warming, db-connecting or db-ping-fail", body = ReadyStatus)
    )
)]
pub async fn readyz(State(state): State<AppState>) -> (StatusCode, Json<ReadyStatus>) {
    let readiness = state.lifecycle.readiness().await;
    state.metrics.record_readiness(readiness.as_str());

    let status = if readiness.is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        status,
        Json(ReadyStatus {
            ready: readiness.as_str().to_string(),
        }),
    )
}
