//! Database Schema Definitions
//!
//! The local store is a single key/value table. Migrations are recorded in
//! `schema_migrations` so that a newer build can extend the layout in place.

/// Current database schema version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// Schema migration versions
pub const MIGRATION_VERSIONS: &[i64] = &[1];

pub const CREATE_KV_STORE: &str = "CREATE TABLE IF NOT EXISTS kv_store (
    key TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL
)";

pub const CREATE_SCHEMA_MIGRATIONS: &str = "CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL
)";

/// Whether a database at `current_version` is behind this build
pub fn needs_migration(current_version: i64) -> bool {
    current_version < CURRENT_SCHEMA_VERSION
}

/// Migrations newer than `current_version`, oldest first
pub fn pending_migrations(current_version: i64) -> Vec<i64> {
    MIGRATION_VERSIONS
        .iter()
        .filter(|&&v| v > current_version)
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_version() {
        assert!(!needs_migration(CURRENT_SCHEMA_VERSION));
        assert!(needs_migration(0));
    }

    #[test]
    fn test_pending_migrations() {
        assert_eq!(pending_migrations(0), vec![1]);
        assert_eq!(pending_migrations(1), Vec::<i64>::new());
    }
}
