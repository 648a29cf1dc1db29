//! # Local Database Module
//!
//! Session-surviving key-value storage for the dashboard. It holds exactly two
//! logical entries: the serialized sync queue and the cached equipment
//! collection.
//!
//! ## Key Components
//!
//! - `KeyValueStore`: the async storage trait the sync layer depends on
//! - `LocalDatabase`: SQLite-backed implementation (WAL mode)
//! - `MemoryStore`: process-local implementation
//! - `schema.rs`: table definitions and schema versioning
//! - `sync.rs`: key names and the `KeyValueStore` impl for `LocalDatabase`
//!
//! ## Usage
//!
//! ```rust,no_run
//! use repairdesk::client::local_db::{KeyValueStore, LocalDatabase};
//!
//! # async fn example() -> Result<(), repairdesk::client::local_db::StoreError> {
//! let db = LocalDatabase::new().await?;
//! db.set("cached_items", "[]").await?;
//! assert_eq!(db.get("cached_items").await?.as_deref(), Some("[]"));
//! # Ok(())
//! # }
//! ```

pub mod memory;
pub mod schema;
pub mod sync;

pub use memory::MemoryStore;
pub use sync::{CACHED_ITEMS_KEY, SYNC_QUEUE_KEY};

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from the local key-value store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Scoped key-value storage that survives across sessions
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// Local SQLite database
///
/// Wraps a small connection pool; the single `kv_store` table is created on
/// open.
#[derive(Debug, Clone)]
pub struct LocalDatabase {
    pool: SqlitePool,
}

impl LocalDatabase {
    /// Open the database at the platform default location
    pub async fn new() -> Result<Self, StoreError> {
        Self::open(&Self::default_path()).await
    }

    /// Open or create the database file at `path`
    ///
    /// Uses WAL mode for better concurrency and performance.
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.init_schema().await?;

        tracing::debug!("Opened local database at {}", path.display());
        Ok(db)
    }

    /// Platform data directory, falling back to the temp dir
    pub fn default_path() -> PathBuf {
        let mut path = dirs::data_dir().unwrap_or_else(std::env::temp_dir);
        path.push("repairdesk");
        path.push("local.db");
        path
    }

    async fn init_schema(&self) -> Result<(), StoreError> {
        sqlx::query(schema::CREATE_KV_STORE).execute(&self.pool).await?;
        sqlx::query(schema::CREATE_SCHEMA_MIGRATIONS)
            .execute(&self.pool)
            .await?;

        let current_version: (i64,) =
            sqlx::query_as("SELECT COALESCE(MAX(version), 0) FROM schema_migrations")
                .fetch_one(&self.pool)
                .await?;

        for version in schema::pending_migrations(current_version.0) {
            sqlx::query("INSERT INTO schema_migrations (version, applied_at) VALUES (?, ?)")
                .bind(version)
                .bind(chrono::Utc::now().to_rfc3339())
                .execute(&self.pool)
                .await?;
        }

        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Number of stored keys, for diagnostics
    pub async fn entry_count(&self) -> Result<u64, StoreError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM kv_store")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0.max(0) as u64)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_database_creation() {
        let dir = tempfile::tempdir().unwrap();
        let db = LocalDatabase::open(&dir.path().join("nested").join("local.db"))
            .await
            .unwrap();
        assert_eq!(db.entry_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_reopen_keeps_schema_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("local.db");

        let db = LocalDatabase::open(&path).await.unwrap();
        db.close().await;
        let db = LocalDatabase::open(&path).await.unwrap();

        let versions: Vec<(i64,)> = sqlx::query_as("SELECT version FROM schema_migrations")
            .fetch_all(db.pool())
            .await
            .unwrap();
        assert_eq!(versions, vec![(schema::CURRENT_SCHEMA_VERSION,)]);
    }
}
