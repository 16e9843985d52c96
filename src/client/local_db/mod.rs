//! # Local Database Module
//!
//! SQLite-backed durable storage for the local persistent cache. The
//! database is a plain key-value store split in two key spaces:
//!
//! - **Data** (`data_cache`): one serialized dataset per dataset kind
//! - **Markers** (`sync_metadata`): last row count, last sync date, last hash
//!
//! ## Key Components
//!
//! - `LocalDatabase`: connection pool and schema management
//! - `schema.rs`: migrations that create the tables
//! - `sync.rs`: entry reads and writes for both key spaces
//! - `cache.rs`: the never-failing `LocalCache` façade and `MemoryStore`
//!
//! ## Usage
//!
//! ```rust,no_run
//! use disconnect_sync::client::local_db::{KeySpace, LocalDatabase};
//!
//! # async fn example() -> disconnect_sync::shared::Result<()> {
//! let db = LocalDatabase::open("/tmp/ledger-cache.db").await?;
//! db.put_entry(KeySpace::Markers, "consumers_last_row_count", "100").await?;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod schema;
pub mod sync;

pub use cache::{KeyValueStore, LocalCache, MemoryStore};

use crate::shared::error::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::Path;

/// The two key spaces of the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeySpace {
    /// Serialized datasets
    Data,
    /// Scalar sync markers
    Markers,
}

impl KeySpace {
    pub(crate) fn table(&self) -> &'static str {
        match self {
            KeySpace::Data => "data_cache",
            KeySpace::Markers => "sync_metadata",
        }
    }
}

/// Local database connection manager
#[derive(Debug, Clone)]
pub struct LocalDatabase {
    pool: SqlitePool,
}

impl LocalDatabase {
    /// Open or create the database file
    ///
    /// Creates parent directories and the file when missing, uses WAL mode.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
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
        tracing::debug!(path = %path.display(), "local cache database opened");
        Ok(db)
    }

    /// Private in-memory database, one connection so every query sees the same data
    pub async fn open_in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::new().in_memory(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        let db = Self { pool };
        db.init_schema().await?;
        Ok(db)
    }

    /// Create the bookkeeping table and run pending migrations
    async fn init_schema(&self) -> Result<()> {
        sqlx::query(schema::CREATE_SCHEMA_MIGRATIONS)
            .execute(&self.pool)
            .await?;
        self.run_migrations().await
    }

    async fn run_migrations(&self) -> Result<()> {
        let (applied,): (i32,) =
            sqlx::query_as("SELECT COALESCE(MAX(version), 0) FROM schema_migrations")
                .fetch_one(&self.pool)
                .await?;

        for migration in schema::pending(applied) {
            let mut tx = self.pool.begin().await?;
            for statement in migration.statements {
                sqlx::query(statement).execute(&mut *tx).await?;
            }
            sqlx::query("INSERT INTO schema_migrations (version, applied_at) VALUES (?, ?)")
                .bind(migration.version)
                .bind(chrono::Utc::now().to_rfc3339())
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;
            tracing::debug!(version = migration.version, "cache schema migrated");
        }
        Ok(())
    }

    /// Get connection pool reference
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Get database statistics
    pub async fn get_stats(&self) -> Result<DatabaseStats> {
        let datasets: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM data_cache")
            .fetch_one(&self.pool)
            .await?;
        let markers: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sync_metadata")
            .fetch_one(&self.pool)
            .await?;
        let bytes: (i64,) = sqlx::query_as("SELECT COALESCE(SUM(LENGTH(value)), 0) FROM data_cache")
            .fetch_one(&self.pool)
            .await?;

        Ok(DatabaseStats {
            cached_datasets: datasets.0 as u64,
            markers: markers.0 as u64,
            cached_bytes: bytes.0 as u64,
        })
    }
}

/// Database statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseStats {
    /// Number of datasets stored
    pub cached_datasets: u64,
    /// Number of scalar markers stored
    pub markers: u64,
    /// Total size of serialized datasets
    pub cached_bytes: u64,
}
