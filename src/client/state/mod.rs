//! Per-dataset client state.
//!
//! `DatasetState` owns the in-memory view of one dataset. Readers get cheap
//! `Arc<Dataset>` snapshots or subscribe to changes; writers go through
//! [`DatasetState::apply`], which serializes read-modify-write cycles,
//! persists the result to the cache and only then publishes it.

use crate::client::local_db::LocalCache;
use crate::client::sync::sync_state::SyncStatus;
use crate::shared::dataset::{Dataset, DatasetKind};
use crate::shared::record::SyncState;
use std::sync::Arc;
use tokio::sync::{broadcast, watch, Mutex};

const TRANSITION_BUFFER: usize = 32;

/// In-memory dataset, status signal and load error of one dataset kind
#[derive(Debug)]
pub struct DatasetState {
    kind: DatasetKind,
    cache: LocalCache,
    data: watch::Sender<Arc<Dataset>>,
    status: watch::Sender<SyncStatus>,
    transitions: broadcast::Sender<SyncStatus>,
    load_error: watch::Sender<Option<String>>,
    write_lock: Mutex<()>,
}

impl DatasetState {
    pub fn new(kind: DatasetKind, cache: LocalCache) -> Self {
        let (data, _) = watch::channel(Arc::new(Dataset::new()));
        let (status, _) = watch::channel(SyncStatus::Idle);
        let (transitions, _) = broadcast::channel(TRANSITION_BUFFER);
        let (load_error, _) = watch::channel(None);
        Self {
            kind,
            cache,
            data,
            status,
            transitions,
            load_error,
            write_lock: Mutex::new(()),
        }
    }

    pub fn kind(&self) -> DatasetKind {
        self.kind
    }

    pub fn cache(&self) -> &LocalCache {
        &self.cache
    }

    /// Current dataset
    pub fn snapshot(&self) -> Arc<Dataset> {
        self.data.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<Dataset>> {
        self.data.subscribe()
    }

    pub fn status(&self) -> SyncStatus {
        *self.status.borrow()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<SyncStatus> {
        self.status.subscribe()
    }

    /// Every status change in order, unlike [`Self::subscribe_status`]
    /// which only holds the latest value
    pub fn subscribe_transitions(&self) -> broadcast::Receiver<SyncStatus> {
        self.transitions.subscribe()
    }

    pub(crate) fn set_status(&self, status: SyncStatus) {
        let previous = self.status.send_replace(status);
        if previous != status {
            tracing::debug!(dataset = %self.kind, from = %previous, to = %status, "status changed");
            // no receivers is fine
            let _ = self.transitions.send(status);
        }
    }

    /// Blocking load error, set only when a pass failed with nothing to show
    pub fn load_error(&self) -> Option<String> {
        self.load_error.borrow().clone()
    }

    pub fn subscribe_load_error(&self) -> watch::Receiver<Option<String>> {
        self.load_error.subscribe()
    }

    pub(crate) fn set_load_error(&self, error: Option<String>) {
        self.load_error.send_replace(error);
    }

    /// Replace the dataset with `f(current)`, persist it, then publish it.
    ///
    /// Returns the published dataset together with whatever `f` reported.
    pub async fn apply<F, R>(&self, f: F) -> (Arc<Dataset>, R)
    where
        F: FnOnce(&Dataset) -> (Dataset, R),
    {
        let _guard = self.write_lock.lock().await;
        let current = self.snapshot();
        let (next, report) = f(&current);
        self.cache.save_dataset(self.kind, &next).await;
        let next = Arc::new(next);
        self.data.send_replace(next.clone());
        (next, report)
    }

    /// Populate memory from the cache at session start.
    ///
    /// The cache is read under the write lock and its rows are laid under
    /// whatever is already in memory, so an edit published in the meantime
    /// keeps its in-memory copy. Cached records still marked `syncing` lost
    /// their retry task with the previous session and are downgraded to
    /// `error` so they can be resubmitted. Returns the number of records now
    /// in memory.
    pub async fn load_from_cache(&self) -> usize {
        let _guard = self.write_lock.lock().await;
        let Some(cached) = self.cache.load_dataset(self.kind).await else {
            return 0;
        };

        let current = self.snapshot();
        let mut records = current.records().to_vec();
        let mut orphaned = 0;
        for record in cached.into_records() {
            if current.contains(&record.record_id) {
                continue;
            }
            if record.sync_state == SyncState::Syncing {
                orphaned += 1;
                records.push(record.with_sync_state(SyncState::Error));
            } else {
                records.push(record);
            }
        }

        let loaded = Dataset::from_records(records);
        self.cache.save_dataset(self.kind, &loaded).await;
        let count = loaded.len();
        self.data.send_replace(Arc::new(loaded));

        if orphaned > 0 {
            tracing::warn!(dataset = %self.kind, orphaned, "unconfirmed writes from a previous session marked as error");
        }
        tracing::info!(dataset = %self.kind, records = count, kept_in_memory = current.len(), "dataset loaded from cache");
        count
    }
}
