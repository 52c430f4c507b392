//! In-memory feed store.

use async_trait::async_trait;

use super::{DbError, Event, FeedStore};

#[derive(Debug, Clone)]
struct ArchiveFeed {
    feed_id: String,
    previous_feed_id: Option<String>,
    events: Vec<Event>,
}

/// A fixed snapshot of the event and feed tables.
///
/// Built up front and then shared read-only, which makes it suitable for router
/// tests and local demos.
#[derive(Debug, Clone, Default)]
pub struct MemoryFeedStore {
    recent: Vec<Event>,
    feeds: Vec<ArchiveFeed>,
    unavailable: bool,
}

impl MemoryFeedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an event that is not yet assigned to an archive page.
    pub fn with_recent(mut self, event: Event) -> Self {
        self.recent.push(event);
        self
    }

    /// Seal `events` into a new archive page after the current newest one.
    pub fn with_archive(mut self, feed_id: impl Into<String>, events: Vec<Event>) -> Self {
        let previous_feed_id = self.feeds.last().map(|feed| feed.feed_id.clone());
        self.feeds.push(ArchiveFeed {
            feed_id: feed_id.into(),
            previous_feed_id,
            events,
        });
        self
    }

    /// Make every operation fail as if the database were down.
    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    fn check_available(&self) -> Result<(), DbError> {
        if self.unavailable {
            return Err(DbError::Query(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }

    fn feed(&self, feed_id: &str) -> Option<&ArchiveFeed> {
        self.feeds.iter().find(|feed| feed.feed_id == feed_id)
    }
}

#[async_trait]
impl FeedStore for MemoryFeedStore {
    async fn retrieve_recent(&self) -> Result<Vec<Event>, DbError> {
        self.check_available()?;
        Ok(self.recent.clone())
    }

    async fn retrieve_last_feed(&self) -> Result<Option<String>, DbError> {
        self.check_available()?;
        Ok(self.feeds.last().map(|feed| feed.feed_id.clone()))
    }

    async fn retrieve_archive(&self, feed_id: &str) -> Result<Vec<Event>, DbError> {
        self.check_available()?;
        Ok(self
            .feed(feed_id)
            .map(|feed| feed.events.clone())
            .unwrap_or_default())
    }

    async fn retrieve_previous_feed(&self, feed_id: &str) -> Result<Option<String>, DbError> {
        self.check_available()?;
        Ok(self
            .feed(feed_id)
            .and_then(|feed| feed.previous_feed_id.clone()))
    }

    async fn retrieve_next_feed(&self, feed_id: &str) -> Result<Option<String>, DbError> {
        self.check_available()?;
        Ok(self
            .feeds
            .iter()
            .find(|feed| feed.previous_feed_id.as_deref() == Some(feed_id))
            .map(|feed| feed.feed_id.clone()))
    }

    async fn retrieve_event(&self, aggregate_id: &str, version: i32) -> Result<Event, DbError> {
        self.check_available()?;
        self.recent
            .iter()
            .chain(self.feeds.iter().flat_map(|feed| feed.events.iter()))
            .find(|event| event.aggregate_id == aggregate_id && event.version == version)
            .cloned()
            .ok_or(DbError::NotFound)
    }

    async fn health_check(&self) -> Result<(), DbError> {
        self.check_available()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn event(aggregate_id: &str, version: i32) -> Event {
        Event {
            aggregate_id: aggregate_id.to_string(),
            version,
            type_code: "t".to_string(),
            timestamp: Utc::now(),
            payload: vec![],
        }
    }

    #[tokio::test]
    async fn test_archives_chain_in_insertion_order() {
        let store = MemoryFeedStore::new()
            .with_archive("a", vec![event("agg", 1)])
            .with_archive("b", vec![event("agg", 2)])
            .with_archive("c", vec![event("agg", 3)]);

        assert_eq!(store.retrieve_last_feed().await.unwrap().as_deref(), Some("c"));
        assert_eq!(store.retrieve_previous_feed("a").await.unwrap(), None);
        assert_eq!(store.retrieve_previous_feed("b").await.unwrap().as_deref(), Some("a"));
        assert_eq!(store.retrieve_next_feed("b").await.unwrap().as_deref(), Some("c"));
        assert_eq!(store.retrieve_next_feed("c").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_unknown_archive_is_empty() {
        let store = MemoryFeedStore::new();
        assert!(store.retrieve_archive("missing").await.unwrap().is_empty());
        assert_eq!(store.retrieve_last_feed().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_retrieve_event_searches_recent_and_archives() {
        let store = MemoryFeedStore::new()
            .with_archive("a", vec![event("agg", 1)])
            .with_recent(event("agg", 2));

        assert_eq!(store.retrieve_event("agg", 1).await.unwrap().version, 1);
        assert_eq!(store.retrieve_event("agg", 2).await.unwrap().version, 2);
        assert!(store.retrieve_event("agg", 3).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_unavailable_store_fails_every_call() {
        let store = MemoryFeedStore::new().unavailable();
        assert!(matches!(store.retrieve_recent().await, Err(DbError::Query(_))));
        assert!(matches!(store.health_check().await, Err(DbError::Query(_))));
        assert!(!store.retrieve_event("agg", 1).await.unwrap_err().is_not_found());
    }
}
