//! Liveness check.

use tracing::instrument;

/// Liveness check. Always "OK" while the process is serving.
#[instrument(skip_all, name = "store.health.check")]
pub async fn health_check() -> &'static str {
    "OK"
}
