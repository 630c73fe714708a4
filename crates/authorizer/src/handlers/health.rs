//! Liveness and readiness checks.

use crate::routes::AppState;
use axum::extract::State;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;
use tracing::instrument;

/// Readiness check body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReadinessResponse {
    pub status: &'static str,

    /// `populated` once the key set has been fetched, `cold` before.
    pub jwks: &'static str,
}

/// Liveness check. Always "OK" while the process is serving.
#[instrument(skip_all, name = "authz.health.check")]
pub async fn health_check() -> &'static str {
    "OK"
}

/// Readiness check.
///
/// The key set is populated lazily on the first authorize call, so a cold
/// cache does not make the service unready; it is only reported.
#[instrument(skip_all, name = "authz.health.ready")]
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> Json<ReadinessResponse> {
    let jwks = if state.authorizer.key_cache().is_populated() {
        "populated"
    } else {
        "cold"
    };

    Json(ReadinessResponse {
        status: "ready",
        jwks,
    })
}
