//! Poll Store
//!
//! Durable table of poll definitions and lifecycle state. Polls are
//! created once, bound to their posted message once, and closed once;
//! options are immutable after creation.

use super::{Database, StoreError};
use crate::polls::types::{MessageRef, Poll};
use sqlx::Row;

/// Database access for the polls table.
#[derive(Debug, Clone)]
pub struct PollStore {
    db: Database,
}

impl PollStore {
    /// Create a store over the shared database.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Insert a new poll row.
    pub async fn create(&self, poll: &Poll) -> Result<(), StoreError> {
        let options_json = serde_json::to_string(&poll.options)
            .map_err(|e| StoreError::Storage(format!("Failed to encode options: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO polls (id, topic, options, allow_multiple, is_closed,
                               creator_id, channel_id, created_at, closes_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&poll.id)
        .bind(&poll.topic)
        .bind(&options_json)
        .bind(poll.allow_multiple as i64)
        .bind(poll.is_closed as i64)
        .bind(&poll.creator_id)
        .bind(&poll.channel_id)
        .bind(poll.created_at)
        .bind(poll.closes_at)
        .execute(self.db.pool())
        .await
        .map_err(|e| StoreError::Storage(format!("Failed to insert poll: {}", e)))?;

        Ok(())
    }

    /// Fetch a poll by ID.
    pub async fn get(&self, poll_id: &str) -> Result<Option<Poll>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, topic, options, allow_multiple, is_closed,
                   creator_id, channel_id, created_at, closes_at,
                   message_channel, message_ts
            FROM polls
            WHERE id = ?1
            "#,
        )
        .bind(poll_id)
        .fetch_optional(self.db.pool())
        .await
        .map_err(|e| StoreError::Storage(format!("Failed to fetch poll: {}", e)))?;

        row.map(row_to_poll).transpose()
    }

    /// Bind the posted chat message to the poll.
    ///
    /// Channel and timestamp are set in a single UPDATE so the binding
    /// is never partially present.
    pub async fn bind_message(
        &self,
        poll_id: &str,
        message: &MessageRef,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE polls SET message_channel = ?2, message_ts = ?3 WHERE id = ?1
            "#,
        )
        .bind(poll_id)
        .bind(&message.channel)
        .bind(&message.ts)
        .execute(self.db.pool())
        .await
        .map_err(|e| StoreError::Storage(format!("Failed to bind poll message: {}", e)))?;

        Ok(())
    }

    /// Mark a poll closed.
    ///
    /// Returns true only for the caller whose UPDATE actually flipped
    /// the flag; a missing or already-closed poll returns false. This
    /// is the idempotency guard for duplicate close triggers.
    pub async fn mark_closed(&self, poll_id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE polls SET is_closed = 1 WHERE id = ?1 AND is_closed = 0
            "#,
        )
        .bind(poll_id)
        .execute(self.db.pool())
        .await
        .map_err(|e| StoreError::Storage(format!("Failed to close poll: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    /// List open polls whose deadline has passed.
    pub async fn list_overdue(&self, now_ms: i64) -> Result<Vec<Poll>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, topic, options, allow_multiple, is_closed,
                   creator_id, channel_id, created_at, closes_at,
                   message_channel, message_ts
            FROM polls
            WHERE is_closed = 0 AND closes_at <= ?1
            ORDER BY closes_at ASC
            "#,
        )
        .bind(now_ms)
        .fetch_all(self.db.pool())
        .await
        .map_err(|e| StoreError::Storage(format!("Failed to list overdue polls: {}", e)))?;

        rows.into_iter().map(row_to_poll).collect()
    }
}

fn row_to_poll(row: sqlx::sqlite::SqliteRow) -> Result<Poll, StoreError> {
    let options_json: String = row.get("options");
    let options: Vec<String> = serde_json::from_str(&options_json)
        .map_err(|e| StoreError::Storage(format!("Failed to decode options: {}", e)))?;

    let message = match (
        row.get::<Option<String>, _>("message_channel"),
        row.get::<Option<String>, _>("message_ts"),
    ) {
        (Some(channel), Some(ts)) => Some(MessageRef { channel, ts }),
        _ => None,
    };

    Ok(Poll {
        id: row.get("id"),
        topic: row.get("topic"),
        options,
        allow_multiple: row.get::<i64, _>("allow_multiple") != 0,
        is_closed: row.get::<i64, _>("is_closed") != 0,
        creator_id: row.get("creator_id"),
        channel_id: row.get("channel_id"),
        created_at: row.get("created_at"),
        closes_at: row.get("closes_at"),
        message,
    })
}
