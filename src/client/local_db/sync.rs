//! # Sync Storage Operations
//!
//! `KeyValueStore` implementation for the SQLite database, plus the names of
//! the two entries the sync layer keeps there.

use async_trait::async_trait;
use sqlx::Row;

use super::{KeyValueStore, LocalDatabase, StoreError};

/// Serialized pending mutation queue
pub const SYNC_QUEUE_KEY: &str = "sync_queue";

/// Serialized last successful full fetch
pub const CACHED_ITEMS_KEY: &str = "cached_items";

#[async_trait]
impl KeyValueStore for LocalDatabase {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let row = sqlx::query("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(self.pool())
            .await?;

        match row {
            Some(row) => Ok(Some(row.try_get("value")?)),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO kv_store (key, value, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(value)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(self.pool())
        .await?;
        Ok(())
    }
}
