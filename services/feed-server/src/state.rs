//! Application state shared across request handlers.

use std::sync::Arc;

use crate::cipher::EnvelopeCipher;
use crate::config::LinkConfig;
use crate::db::FeedStore;

/// Shared application state.
///
/// This is passed to all request handlers via Axum's state extractor.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    store: Arc<dyn FeedStore>,
    cipher: EnvelopeCipher,
    links: LinkConfig,
}

impl AppState {
    /// Create a new application state.
    pub fn new(store: Arc<dyn FeedStore>, cipher: EnvelopeCipher, links: LinkConfig) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                store,
                cipher,
                links,
            }),
        }
    }

    /// Get a reference to the feed store.
    pub fn store(&self) -> &dyn FeedStore {
        self.inner.store.as_ref()
    }

    /// Get a reference to the response cipher.
    pub fn cipher(&self) -> &EnvelopeCipher {
        &self.inner.cipher
    }

    /// Where feed links point.
    pub fn links(&self) -> &LinkConfig {
        &self.inner.links
    }
}
