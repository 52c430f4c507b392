//! The shared tail of every document handler.

use axum::response::{IntoResponse, Response};
use esfeed_atom::AtomError;
use tracing::error;

use crate::api::error::ApiError;
use crate::feed::CachePolicy;
use crate::state::AppState;

/// Turn a serialized document into the response: cache headers, then the
/// (possibly encrypted) body.
///
/// Nothing is written unless every step succeeds.
pub(crate) async fn document_response(
    state: &AppState,
    document: Result<String, AtomError>,
    policy: CachePolicy,
) -> Result<Response, ApiError> {
    let document = document.map_err(|e| {
        error!(error = %e, "Failed to serialize document");
        ApiError::internal("Error serializing document")
    })?;

    let headers = policy.headers().map_err(|e| {
        error!(error = %e, ?policy, "Invalid cache header value");
        ApiError::internal("Error building response")
    })?;

    let body = state
        .cipher()
        .transform(document.into_bytes())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to encrypt response");
            ApiError::internal("Error encrypting response")
        })?;

    Ok((headers, body).into_response())
}
