//! Feed page endpoints.
//!
//! - `GET /notifications/recent`: events not yet archived
//! - `GET /notifications/{feed_id}`: an immutable archive page

use axum::{
    extract::{Path, State},
    response::Response,
    routing::get,
    Router,
};
use chrono::Utc;
use tracing::{error, info};

use crate::api::error::ApiError;
use crate::api::response::document_response;
use crate::feed::{self, CachePolicy};
use crate::state::AppState;

/// Create feed routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/notifications/recent", get(recent))
        .route("/notifications/", get(archive_without_id))
        .route("/notifications/{feed_id}", get(archive))
}

/// GET /notifications/recent
pub async fn recent(State(state): State<AppState>) -> Result<Response, ApiError> {
    let store = state.store();

    let events = store.retrieve_recent().await.map_err(|e| {
        error!(error = %e, "Failed to retrieve recent events");
        ApiError::internal("Error retrieving feed items")
    })?;

    let latest_feed = store.retrieve_last_feed().await.map_err(|e| {
        error!(error = %e, "Failed to retrieve last feed id");
        ApiError::internal("Error retrieving feed id")
    })?;

    let page = feed::recent_page(&events, latest_feed.as_deref(), state.links(), Utc::now());

    document_response(&state, page.to_xml(), CachePolicy::Recent).await
}

/// GET /notifications/{feed_id}
pub async fn archive(
    State(state): State<AppState>,
    Path(feed_id): Path<String>,
) -> Result<Response, ApiError> {
    archive_page(&state, &feed_id).await
}

/// GET /notifications/ (no feed id)
async fn archive_without_id(State(state): State<AppState>) -> Result<Response, ApiError> {
    archive_page(&state, "").await
}

async fn archive_page(state: &AppState, feed_id: &str) -> Result<Response, ApiError> {
    if feed_id.is_empty() {
        return Err(ApiError::bad_request("No feed id in uri"));
    }

    info!(feed_id = %feed_id, "Processing request for feed");
    let store = state.store();

    let events = store.retrieve_archive(feed_id).await.map_err(|e| {
        error!(error = %e, feed_id = %feed_id, "Failed to retrieve archive");
        ApiError::internal("Error retrieving feed")
    })?;

    // Archive ids are only ever created together with their events.
    if events.is_empty() {
        info!(feed_id = %feed_id, "No data found for feed");
        return Err(ApiError::not_found());
    }

    let previous_feed = store.retrieve_previous_feed(feed_id).await.map_err(|e| {
        error!(error = %e, feed_id = %feed_id, "Failed to retrieve previous feed id");
        ApiError::internal("Error retrieving previous feed id")
    })?;

    let next_feed = store.retrieve_next_feed(feed_id).await.map_err(|e| {
        error!(error = %e, feed_id = %feed_id, "Failed to retrieve next feed id");
        ApiError::internal("Error retrieving next feed id")
    })?;

    let page = feed::archive_page(
        feed_id,
        &events,
        previous_feed.as_deref(),
        next_feed.as_deref(),
        state.links(),
    );

    document_response(state, page.to_xml(), CachePolicy::for_feed(feed_id)).await
}
