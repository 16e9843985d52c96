//! Key-value store that can hold a dataset read open

use async_trait::async_trait;
use disconnect_sync::client::local_db::KeySpace;
use disconnect_sync::client::{KeyValueStore, MemoryStore};
use disconnect_sync::shared::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Memory store whose next data read waits for [`GatedStore::release`]
#[derive(Default)]
pub struct GatedStore {
    inner: MemoryStore,
    armed: AtomicBool,
    reached: Notify,
    released: Notify,
}

impl GatedStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Hold the next read of a data key
    pub fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }

    /// Resolves once a held read has happened
    pub async fn wait_for_read(&self) {
        self.reached.notified().await;
    }

    pub fn release(&self) {
        self.released.notify_one();
    }
}

#[async_trait]
impl KeyValueStore for GatedStore {
    async fn get(&self, space: KeySpace, key: &str) -> Result<Option<String>> {
        let value = self.inner.get(space, key).await?;
        if space == KeySpace::Data && self.armed.swap(false, Ordering::SeqCst) {
            self.reached.notify_one();
            self.released.notified().await;
        }
        Ok(value)
    }

    async fn set(&self, space: KeySpace, key: &str, value: &str) -> Result<()> {
        self.inner.set(space, key, value).await
    }

    async fn clear(&self) -> Result<()> {
        self.inner.clear().await
    }
}
