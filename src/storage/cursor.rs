//! Cursor persistence for resumable polling.
//!
//! Each watched stream keeps one saved position, the id of the last event
//! it fully processed. The store is an explicit interface injected into the
//! poll loop so tests can run against an in-memory implementation.

use crate::chain::types::EventId;
use crate::utils::error::Result;
use async_trait::async_trait;
use sqlx::postgres::PgPool;
use sqlx::Row;
use std::collections::HashMap;
use std::sync::Mutex;

/// Abstract interface for loading and saving stream cursors.
///
/// Losing a cursor is not catastrophic: the loop restarts from the
/// beginning of the event log and replays, which is safe because all
/// writes are idempotent upserts.
#[async_trait]
pub trait CursorStore: Send + Sync {
    /// Loads the saved cursor for a stream, or `None` if the stream has
    /// never been processed.
    async fn load(&self, stream_id: &str) -> Result<Option<EventId>>;

    /// Saves the cursor for a stream, replacing any previous value.
    async fn save(&self, stream_id: &str, cursor: &EventId) -> Result<()>;
}

/// Postgres-backed cursor store, one row per stream.
pub struct PgCursorStore {
    pool: PgPool,
}

impl PgCursorStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CursorStore for PgCursorStore {
    async fn load(&self, stream_id: &str) -> Result<Option<EventId>> {
        let row = sqlx::query("SELECT tx_digest, event_seq FROM cursors WHERE id = $1")
            .bind(stream_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| EventId {
            tx_digest: r.get("tx_digest"),
            event_seq: r.get("event_seq"),
        }))
    }

    async fn save(&self, stream_id: &str, cursor: &EventId) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO cursors (id, tx_digest, event_seq)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE
            SET tx_digest = EXCLUDED.tx_digest,
                event_seq = EXCLUDED.event_seq
            ",
        )
        .bind(stream_id)
        .bind(&cursor.tx_digest)
        .bind(&cursor.event_seq)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

/// In-memory cursor store for tests.
#[derive(Default)]
pub struct InMemoryCursorStore {
    cursors: Mutex<HashMap<String, EventId>>,
}

impl InMemoryCursorStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CursorStore for InMemoryCursorStore {
    async fn load(&self, stream_id: &str) -> Result<Option<EventId>> {
        Ok(self.cursors.lock().unwrap().get(stream_id).cloned())
    }

    async fn save(&self, stream_id: &str, cursor: &EventId) -> Result<()> {
        self.cursors
            .lock()
            .unwrap()
            .insert(stream_id.to_string(), cursor.clone());
        Ok(())
    }
}
