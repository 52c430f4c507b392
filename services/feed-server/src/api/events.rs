//! Single event retrieval.
//!
//! `GET /events/{aggregate_id}/{version}`

use axum::{
    extract::{Path, State},
    response::Response,
    routing::get,
    Router,
};
use tracing::{error, info};

use crate::api::error::ApiError;
use crate::api::response::document_response;
use crate::db::DbError;
use crate::feed::{self, CachePolicy};
use crate::state::AppState;

/// Create event routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/events/{aggregate_id}/{version}", get(retrieve_event))
}

/// Parse a version path segment: a non-negative integer.
pub fn parse_version(raw: &str) -> Result<i32, ApiError> {
    raw.parse::<u32>()
        .ok()
        .and_then(|version| i32::try_from(version).ok())
        .ok_or_else(|| ApiError::bad_request(format!("Invalid version: {raw}")))
}

/// GET /events/{aggregate_id}/{version}
pub async fn retrieve_event(
    State(state): State<AppState>,
    Path((aggregate_id, version)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    info!(aggregate_id = %aggregate_id, version = %version, "Retrieving event");

    let version = parse_version(&version)?;

    let event = match state.store().retrieve_event(&aggregate_id, version).await {
        Ok(event) => event,
        Err(DbError::NotFound) => return Err(ApiError::not_found()),
        Err(e) => {
            error!(
                error = %e,
                aggregate_id = %aggregate_id,
                version,
                "Failed to retrieve event"
            );
            return Err(ApiError::internal("Error retrieving event"));
        }
    };

    let document = feed::event_document(&aggregate_id, version, &event);

    document_response(
        &state,
        document.to_xml(),
        CachePolicy::for_event(&aggregate_id, version),
    )
    .await
}
