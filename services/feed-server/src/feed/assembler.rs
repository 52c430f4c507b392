//! Feed page assembly.
//!
//! Pages form a doubly linked chain:
//!
//! ```text
//! oldest archive <-> ... <-> newest archive <-> recent
//! ```
//!
//! `prev-archive` always points at an older page. `next-archive` points at a
//! newer one, and the newest archive points at `recent`, which is how a client
//! walking forward from old history ends up back at the mutable head.

use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{DateTime, SecondsFormat, Utc};
use esfeed_atom::{rel, Content, Entry, EventDocument, Feed, Link};

use crate::config::LinkConfig;
use crate::db::Event;

/// Identifier of the mutable head page.
pub const RECENT_FEED_ID: &str = "recent";

/// Title of every entry.
pub const ENTRY_TITLE: &str = "event";

/// Timestamp format used for `published`.
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Entry id of an event.
pub fn entry_id(aggregate_id: &str, version: i32) -> String {
    format!("urn:esid:{aggregate_id}:{version}")
}

fn feed_href(links: &LinkConfig, feed_id: &str) -> String {
    links.href(&format!("/notifications/{feed_id}"))
}

fn event_href(links: &LinkConfig, aggregate_id: &str, version: i32) -> String {
    links.href(&format!("/events/{aggregate_id}/{version}"))
}

/// The page after an archive: its successor, or `recent` when there is none.
///
/// An empty successor id is treated the same as a missing one.
pub fn next_feed_or_recent(next: Option<&str>) -> &str {
    match next {
        Some(next) if !next.is_empty() => next,
        _ => RECENT_FEED_ID,
    }
}

/// Map events to entries, one for one, in store order.
pub fn build_entries(events: &[Event], links: &LinkConfig) -> Vec<Entry> {
    events
        .iter()
        .map(|event| Entry {
            title: ENTRY_TITLE.to_string(),
            id: entry_id(&event.aggregate_id, event.version),
            links: vec![Link::new(
                rel::SELF,
                event_href(links, &event.aggregate_id, event.version),
            )],
            published: format_timestamp(&event.timestamp),
            content: Content {
                kind: event.type_code.clone(),
                body: STANDARD.encode(&event.payload),
            },
        })
        .collect()
}

/// The recent page: events not yet archived.
pub fn recent_page(
    events: &[Event],
    latest_archive_id: Option<&str>,
    links: &LinkConfig,
    now: DateTime<Utc>,
) -> Feed {
    let mut feed = Feed::new(RECENT_FEED_ID);
    feed.updated = Some(now.to_rfc3339_opts(SecondsFormat::Secs, true));

    let self_href = feed_href(links, RECENT_FEED_ID);
    feed.links.push(Link::new(rel::SELF, self_href.clone()));
    feed.links.push(Link::new(rel::RELATED, self_href));

    if let Some(latest) = latest_archive_id.filter(|id| !id.is_empty()) {
        feed.links.push(Link::new(rel::PREV_ARCHIVE, feed_href(links, latest)));
    }

    feed.entries = build_entries(events, links);
    feed
}

/// An archive page.
///
/// Callers must not build a page for an archive without events: such an id
/// does not exist and is answered with not found before assembly.
pub fn archive_page(
    feed_id: &str,
    events: &[Event],
    previous_feed_id: Option<&str>,
    next_feed_id: Option<&str>,
    links: &LinkConfig,
) -> Feed {
    debug_assert!(!events.is_empty(), "archive {feed_id} has no events");

    let mut feed = Feed::new(feed_id);
    feed.links.push(Link::new(rel::SELF, feed_href(links, feed_id)));

    if let Some(previous) = previous_feed_id {
        feed.links.push(Link::new(rel::PREV_ARCHIVE, feed_href(links, previous)));
    }

    feed.links.push(Link::new(
        rel::NEXT_ARCHIVE,
        feed_href(links, next_feed_or_recent(next_feed_id)),
    ));

    feed.entries = build_entries(events, links);
    // Derived from content so repeated fetches serialize identically.
    feed.updated = feed.entries.last().map(|entry| entry.published.clone());
    feed
}

/// Document for a single event.
pub fn event_document(aggregate_id: &str, version: i32, event: &Event) -> EventDocument {
    EventDocument::new(
        aggregate_id,
        version,
        format_timestamp(&event.timestamp),
        event.type_code.clone(),
        STANDARD.encode(&event.payload),
    )
}
