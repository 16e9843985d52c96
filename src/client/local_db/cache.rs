//! # Local Persistent Cache
//!
//! `LocalCache` is what the rest of the client talks to. It never returns an
//! error: when the underlying store is missing or failing, reads yield `None`,
//! writes become no-ops, and a warning is logged. The session keeps working
//! from memory alone.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use disconnect_sync::client::local_db::LocalCache;
//! use disconnect_sync::shared::DatasetKind;
//!
//! # async fn example() {
//! let cache = LocalCache::open("/tmp/ledger-cache.db").await;
//! let cached = cache.load_dataset(DatasetKind::Consumers).await;
//! let last_count = cache.last_row_count(DatasetKind::Consumers).await;
//! # }
//! ```

use crate::client::local_db::{KeySpace, LocalDatabase};
use crate::shared::dataset::{Dataset, DatasetKind};
use crate::shared::error::{Result, SyncError};
use crate::shared::record::Record;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Durable key-value backend
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, space: KeySpace, key: &str) -> Result<Option<String>>;
    async fn set(&self, space: KeySpace, key: &str, value: &str) -> Result<()>;
    async fn clear(&self) -> Result<()>;
}

#[async_trait]
impl KeyValueStore for LocalDatabase {
    async fn get(&self, space: KeySpace, key: &str) -> Result<Option<String>> {
        self.get_entry(space, key).await
    }

    async fn set(&self, space: KeySpace, key: &str, value: &str) -> Result<()> {
        self.put_entry(space, key, value).await
    }

    async fn clear(&self) -> Result<()> {
        self.clear_entries().await
    }
}

/// Process-local store, lost when the session ends
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<(KeySpace, String), String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, space: KeySpace, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().await;
        Ok(entries.get(&(space, key.to_string())).cloned())
    }

    async fn set(&self, space: KeySpace, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.insert((space, key.to_string()), value.to_string());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.entries.write().await.clear();
        Ok(())
    }
}

/// Never-failing cache façade
#[derive(Clone)]
pub struct LocalCache {
    store: Option<Arc<dyn KeyValueStore>>,
}

impl std::fmt::Debug for LocalCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalCache")
            .field("available", &self.is_available())
            .finish()
    }
}

impl LocalCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store: Some(store) }
    }

    /// Open the SQLite file; falls back to an unavailable cache on failure
    pub async fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match LocalDatabase::open(path).await {
            Ok(db) => Self::new(Arc::new(db)),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "persistent cache unavailable, continuing in memory");
                Self::unavailable()
            }
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Cache with no backing store: every read misses, every write is dropped
    pub fn unavailable() -> Self {
        Self { store: None }
    }

    pub fn is_available(&self) -> bool {
        self.store.is_some()
    }

    async fn get_in(&self, space: KeySpace, key: &str) -> Option<String> {
        let store = self.store.as_ref()?;
        match store.get(space, key).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, error = %e, "cache read failed");
                None
            }
        }
    }

    async fn set_in(&self, space: KeySpace, key: &str, value: &str) {
        let Some(store) = self.store.as_ref() else {
            tracing::debug!(key, "cache unavailable, write skipped");
            return;
        };
        if let Err(e) = store.set(space, key, value).await {
            tracing::warn!(key, error = %e, "cache write failed");
        }
    }

    /// Read a data entry
    pub async fn get(&self, key: &str) -> Option<String> {
        self.get_in(KeySpace::Data, key).await
    }

    /// Write a data entry
    pub async fn set(&self, key: &str, value: &str) {
        self.set_in(KeySpace::Data, key, value).await
    }

    /// Drop every entry of both key spaces
    pub async fn clear(&self) {
        if let Some(store) = self.store.as_ref() {
            if let Err(e) = store.clear().await {
                tracing::warn!(error = %e, "cache clear failed");
            }
        }
    }

    /// Last cached dataset; a payload that no longer parses counts as absent
    pub async fn load_dataset(&self, kind: DatasetKind) -> Option<Dataset> {
        let raw = self.get(&kind.cache_key()).await?;
        match decode_dataset(&raw) {
            Ok(dataset) => Some(dataset),
            Err(e) => {
                tracing::warn!(dataset = %kind, error = %e, "discarding unreadable cached dataset");
                None
            }
        }
    }

    pub async fn save_dataset(&self, kind: DatasetKind, dataset: &Dataset) {
        match serde_json::to_string(dataset.records()) {
            Ok(raw) => self.set(&kind.cache_key(), &raw).await,
            Err(e) => tracing::warn!(dataset = %kind, error = %e, "failed to serialize dataset"),
        }
    }

    pub async fn last_row_count(&self, kind: DatasetKind) -> Option<u64> {
        let raw = self.get_in(KeySpace::Markers, &kind.row_count_key()).await?;
        raw.trim().parse().ok()
    }

    pub async fn set_last_row_count(&self, kind: DatasetKind, count: u64) {
        self.set_in(KeySpace::Markers, &kind.row_count_key(), &count.to_string())
            .await
    }

    pub async fn last_sync_date(&self, kind: DatasetKind) -> Option<DateTime<Utc>> {
        let raw = self.get_in(KeySpace::Markers, &kind.sync_date_key()).await?;
        DateTime::parse_from_rfc3339(&raw)
            .ok()
            .map(|date| date.with_timezone(&Utc))
    }

    pub async fn set_last_sync_date(&self, kind: DatasetKind, date: DateTime<Utc>) {
        self.set_in(KeySpace::Markers, &kind.sync_date_key(), &date.to_rfc3339())
            .await
    }

    pub async fn last_version_hash(&self, kind: DatasetKind) -> Option<String> {
        self.get_in(KeySpace::Markers, &kind.version_hash_key()).await
    }

    pub async fn set_last_version_hash(&self, kind: DatasetKind, hash: &str) {
        self.set_in(KeySpace::Markers, &kind.version_hash_key(), hash)
            .await
    }
}

fn decode_dataset(raw: &str) -> Result<Dataset> {
    let records: Vec<Record> = serde_json::from_str(raw)
        .map_err(|e| SyncError::data_format(format!("cached dataset: {}", e)))?;
    Ok(Dataset::from_records(records))
}
