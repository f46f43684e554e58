//! Persistence Layer
//!
//! SQLite-backed storage for polls and votes via sqlx. One `Database`
//! is opened at startup and shared; per-table stores borrow its pool.

pub mod polls;
pub mod votes;

pub use polls::PollStore;
pub use votes::VoteStore;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;

/// Errors from the persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Shared SQLite database handle.
#[derive(Debug, Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Open (creating if missing) the database at the given path and
    /// initialize the schema.
    pub async fn open(db_path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::new()
            .filename(db_path.as_ref())
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Storage(format!("Failed to connect: {}", e)))?;

        let db = Self { pool };
        db.init().await?;

        Ok(db)
    }

    /// Open an in-memory database, used by tests.
    ///
    /// A single connection keeps every caller on the same in-memory
    /// database instance.
    pub async fn open_in_memory() -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| StoreError::Storage(format!("Bad connect options: {}", e)))?;

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Storage(format!("Failed to connect: {}", e)))?;

        let db = Self { pool };
        db.init().await?;

        Ok(db)
    }

    /// Create tables and indexes if they do not exist.
    async fn init(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS polls (
                id              TEXT PRIMARY KEY,
                topic           TEXT NOT NULL,
                options         TEXT NOT NULL,
                allow_multiple  INTEGER NOT NULL,
                is_closed       INTEGER NOT NULL DEFAULT 0,
                creator_id      TEXT NOT NULL,
                channel_id      TEXT NOT NULL,
                created_at      INTEGER NOT NULL,
                closes_at       INTEGER NOT NULL,
                message_channel TEXT,
                message_ts      TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("Failed to create polls table: {}", e)))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS votes (
                id           TEXT PRIMARY KEY,
                poll_id      TEXT NOT NULL,
                user_id      TEXT NOT NULL,
                option_index INTEGER NOT NULL,
                created_at   INTEGER NOT NULL,
                UNIQUE(poll_id, user_id, option_index)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("Failed to create votes table: {}", e)))?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_votes_poll ON votes(poll_id)
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("Failed to create vote index: {}", e)))?;

        Ok(())
    }

    /// Access the underlying pool.
    pub(crate) fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_in_memory() {
        let db = Database::open_in_memory().await.unwrap();

        // Schema init is idempotent
        db.init().await.unwrap();
    }

    #[tokio::test]
    async fn test_open_on_disk() {
        let tmp = tempfile::tempdir().unwrap();
        let db = Database::open(tmp.path().join("quorum.db")).await.unwrap();
        db.init().await.unwrap();
    }
}
