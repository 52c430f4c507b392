//! Cache headers by resource mutability.
//!
//! Archive pages and single events never change once they exist, so they may
//! be cached by clients and intermediaries for 30 days. The recent page gains
//! and loses entries as events are archived and must never be cached.

use axum::http::{
    header::{CACHE_CONTROL, CONTENT_TYPE, ETAG},
    HeaderMap, HeaderValue,
};
use esfeed_atom::{ATOM_MEDIA_TYPE, XML_MEDIA_TYPE};

use super::RECENT_FEED_ID;

/// Cache-Control for immutable resources: 30 days.
pub const IMMUTABLE_CACHE_CONTROL: &str = "max-age=2592000";

/// Cache-Control for the recent page.
pub const NO_STORE: &str = "no-store";

/// Header set for a served resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachePolicy {
    /// The mutable recent page.
    Recent,
    /// An immutable archive page.
    Archive { feed_id: String },
    /// A single event.
    Event { aggregate_id: String, version: i32 },
}

impl CachePolicy {
    /// Policy for a feed page, by id.
    pub fn for_feed(feed_id: &str) -> Self {
        if feed_id == RECENT_FEED_ID {
            CachePolicy::Recent
        } else {
            CachePolicy::Archive {
                feed_id: feed_id.to_string(),
            }
        }
    }

    pub fn for_event(aggregate_id: &str, version: i32) -> Self {
        CachePolicy::Event {
            aggregate_id: aggregate_id.to_string(),
            version,
        }
    }

    pub fn cache_control(&self) -> &'static str {
        match self {
            CachePolicy::Recent => NO_STORE,
            CachePolicy::Archive { .. } | CachePolicy::Event { .. } => IMMUTABLE_CACHE_CONTROL,
        }
    }

    /// The resource's natural key, for immutable resources.
    pub fn etag(&self) -> Option<String> {
        match self {
            CachePolicy::Recent => None,
            CachePolicy::Archive { feed_id } => Some(feed_id.clone()),
            CachePolicy::Event {
                aggregate_id,
                version,
            } => Some(format!("{aggregate_id}:{version}")),
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            CachePolicy::Recent | CachePolicy::Archive { .. } => ATOM_MEDIA_TYPE,
            CachePolicy::Event { .. } => XML_MEDIA_TYPE,
        }
    }

    /// Response headers for the resource.
    ///
    /// Fails only if the natural key is not a valid header value.
    pub fn headers(&self) -> Result<HeaderMap, axum::http::header::InvalidHeaderValue> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(self.content_type()));
        headers.insert(CACHE_CONTROL, HeaderValue::from_static(self.cache_control()));
        if let Some(etag) = self.etag() {
            headers.insert(ETAG, HeaderValue::from_str(&etag)?);
        }
        Ok(headers)
    }
}
