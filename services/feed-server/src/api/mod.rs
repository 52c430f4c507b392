//! HTTP API handlers and routing.

pub mod error;
mod events;
mod health;
mod notifications;
mod response;

pub use events::parse_version;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Create the feed router: feed pages, event documents and `/ping`.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(notifications::routes())
        .merge(events::routes())
        .merge(health::ping_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Create the router served on the health listener.
pub fn create_health_router(state: AppState) -> Router {
    Router::new()
        .merge(health::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
