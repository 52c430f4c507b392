//! Liveness and health endpoints.
//!
//! `/ping` is served on the feed listener and only says the process is up.
//! `/health` is served on the separate health listener and checks the store
//! and the key service.

use axum::{extract::State, http::StatusCode, routing::get, Router};
use tracing::warn;

use crate::state::AppState;

/// Routes served on the feed listener.
pub fn ping_routes() -> Router<AppState> {
    Router::new().route("/ping", get(ping))
}

/// Routes served on the health listener.
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

/// GET /ping
pub async fn ping() -> StatusCode {
    StatusCode::OK
}

/// GET /health
///
/// 200 when the store and key service are both reachable, 503 otherwise.
/// Which check failed is logged, not returned.
pub async fn health(State(state): State<AppState>) -> StatusCode {
    let mut healthy = true;

    if let Err(e) = state.store().health_check().await {
        warn!(error = %e, "Feed store health check failed");
        healthy = false;
    }

    if let Err(e) = state.cipher().check_health().await {
        warn!(error = %e, "Key service health check failed");
        healthy = false;
    }

    if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
