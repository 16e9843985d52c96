//! Database Schema Definitions
//!
//! Two key-value tables: `data_cache` holds serialized datasets, and
//! `sync_metadata` holds the small scalar markers (row count, sync date,
//! version hash). Both are created by migrations, applied in order and
//! recorded in `schema_migrations`.

pub(crate) const CREATE_SCHEMA_MIGRATIONS: &str = "CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL
)";

/// One schema step
#[derive(Debug)]
pub struct Migration {
    pub version: i32,
    pub statements: &'static [&'static str],
}

/// All migrations, ascending by version
pub const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    statements: &[
        "CREATE TABLE IF NOT EXISTS data_cache (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        "CREATE TABLE IF NOT EXISTS sync_metadata (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
    ],
}];

/// Version reached once every migration ran
pub fn latest_version() -> i32 {
    MIGRATIONS.last().map_or(0, |m| m.version)
}

/// Migrations newer than `applied`
pub fn pending(applied: i32) -> impl Iterator<Item = &'static Migration> {
    MIGRATIONS.iter().filter(move |m| m.version > applied)
}
