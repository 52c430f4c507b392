//! Feed store queries.
//!
//! Tables (written by the event store's archiver):
//! - `t_aeae_atom_event`: every published event; `feedid` is null until the
//!   event is sealed into an archive page
//! - `t_aefd_feed`: one row per archive page, linked to the page before it
//!   through `previous`

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{postgres::PgPool, postgres::PgRow, Row};

use super::DbError;

/// An event as stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub aggregate_id: String,
    pub version: i32,
    pub type_code: String,
    pub timestamp: DateTime<Utc>,
    pub payload: Vec<u8>,
}

impl<'r> sqlx::FromRow<'r, PgRow> for Event {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            aggregate_id: row.try_get("aggregate_id")?,
            version: row.try_get("version")?,
            type_code: row.try_get("typecode")?,
            // Stored as UTC without a zone.
            timestamp: row.try_get::<NaiveDateTime, _>("event_time")?.and_utc(),
            payload: row.try_get("payload")?,
        })
    }
}

/// Read operations the feed is published from.
///
/// Implementations are shared by all in-flight requests.
#[async_trait]
pub trait FeedStore: Send + Sync {
    /// Events not yet assigned to an archive page, oldest first.
    async fn retrieve_recent(&self) -> Result<Vec<Event>, DbError>;

    /// The newest archive page, if any page has been sealed yet.
    async fn retrieve_last_feed(&self) -> Result<Option<String>, DbError>;

    /// Events of an archive page, oldest first. Empty when the page does not exist.
    async fn retrieve_archive(&self, feed_id: &str) -> Result<Vec<Event>, DbError>;

    /// The archive page sealed before `feed_id`.
    async fn retrieve_previous_feed(&self, feed_id: &str) -> Result<Option<String>, DbError>;

    /// The archive page sealed after `feed_id`.
    async fn retrieve_next_feed(&self, feed_id: &str) -> Result<Option<String>, DbError>;

    /// A single event.
    ///
    /// # Errors
    ///
    /// Returns `DbError::NotFound` if no event has this aggregate id and version.
    async fn retrieve_event(&self, aggregate_id: &str, version: i32) -> Result<Event, DbError>;

    /// Check that the store is reachable.
    async fn health_check(&self) -> Result<(), DbError>;
}

/// Postgres-backed feed store.
#[derive(Clone)]
pub struct PgFeedStore {
    pool: PgPool,
}

impl PgFeedStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FeedStore for PgFeedStore {
    async fn retrieve_recent(&self) -> Result<Vec<Event>, DbError> {
        sqlx::query_as::<_, Event>(
            r#"
            SELECT event_time, aggregate_id, version, typecode, payload
            FROM t_aeae_atom_event
            WHERE feedid IS NULL
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::Query)
    }

    async fn retrieve_last_feed(&self) -> Result<Option<String>, DbError> {
        let row = sqlx::query("SELECT feedid FROM t_aefd_feed ORDER BY id DESC LIMIT 1")
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::Query)?;

        match row {
            Some(row) => {
                let feed_id: Option<String> = row.try_get("feedid").map_err(DbError::Query)?;
                Ok(feed_id.filter(|id| !id.is_empty()))
            }
            None => Ok(None),
        }
    }

    async fn retrieve_archive(&self, feed_id: &str) -> Result<Vec<Event>, DbError> {
        sqlx::query_as::<_, Event>(
            r#"
            SELECT event_time, aggregate_id, version, typecode, payload
            FROM t_aeae_atom_event
            WHERE feedid = $1
            ORDER BY id
            "#,
        )
        .bind(feed_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::Query)
    }

    async fn retrieve_previous_feed(&self, feed_id: &str) -> Result<Option<String>, DbError> {
        let row = sqlx::query("SELECT previous FROM t_aefd_feed WHERE feedid = $1")
            .bind(feed_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::Query)?;

        match row {
            Some(row) => row
                .try_get::<Option<String>, _>("previous")
                .map_err(DbError::Query),
            None => Ok(None),
        }
    }

    async fn retrieve_next_feed(&self, feed_id: &str) -> Result<Option<String>, DbError> {
        let row = sqlx::query("SELECT feedid FROM t_aefd_feed WHERE previous = $1")
            .bind(feed_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::Query)?;

        match row {
            Some(row) => row
                .try_get::<Option<String>, _>("feedid")
                .map_err(DbError::Query),
            None => Ok(None),
        }
    }

    async fn retrieve_event(&self, aggregate_id: &str, version: i32) -> Result<Event, DbError> {
        sqlx::query_as::<_, Event>(
            r#"
            SELECT event_time, aggregate_id, version, typecode, payload
            FROM t_aeae_atom_event
            WHERE aggregate_id = $1 AND version = $2
            "#,
        )
        .bind(aggregate_id)
        .bind(version)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::Query)?
        .ok_or(DbError::NotFound)
    }

    async fn health_check(&self) -> Result<(), DbError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(DbError::Query)?;
        Ok(())
    }
}
