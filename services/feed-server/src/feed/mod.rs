//! Feed documents and their caching rules.

pub mod assembler;
pub mod cache;

pub use assembler::{
    archive_page, build_entries, event_document, next_feed_or_recent, recent_page,
    RECENT_FEED_ID,
};
pub use cache::CachePolicy;
