//! Persistent cache integration tests
//!
//! Uses real SQLite files in temporary directories.

use crate::common::{consumer, consumers, dataset, pending};
use disconnect_sync::client::{DatasetState, LocalCache, LocalDatabase};
use disconnect_sync::shared::{DatasetKind, SyncState};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

#[tokio::test]
async fn test_dataset_and_markers_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cache.db");
    let stored = dataset(consumers(5));

    {
        let cache = LocalCache::open(&path).await;
        assert!(cache.is_available());
        cache.save_dataset(DatasetKind::Consumers, &stored).await;
        cache.set_last_row_count(DatasetKind::Consumers, 5).await;
        cache.set_last_version_hash(DatasetKind::Consumers, "c0ffee").await;
    }

    let cache = LocalCache::open(&path).await;
    assert_eq!(cache.load_dataset(DatasetKind::Consumers).await, Some(stored));
    assert_eq!(cache.last_row_count(DatasetKind::Consumers).await, Some(5));
    assert_eq!(
        cache.last_version_hash(DatasetKind::Consumers).await.as_deref(),
        Some("c0ffee")
    );
    assert_eq!(cache.load_dataset(DatasetKind::DeemedVisits).await, None);
}

#[tokio::test]
async fn test_orphaned_syncing_record_is_downgraded_on_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cache.db");

    {
        let cache = LocalCache::open(&path).await;
        let records = vec![
            consumer("C1", "connected"),
            pending(consumer("C2", "disconnected"), SyncState::Syncing),
        ];
        cache.save_dataset(DatasetKind::Consumers, &dataset(records)).await;
    }

    let state = DatasetState::new(DatasetKind::Consumers, LocalCache::open(&path).await);
    assert_eq!(state.load_from_cache().await, 2);
    assert_eq!(state.snapshot().get("C2").unwrap().sync_state, SyncState::Error);

    let reread = state.cache().load_dataset(DatasetKind::Consumers).await.unwrap();
    assert_eq!(reread.get("C2").unwrap().sync_state, SyncState::Error);
}

#[tokio::test]
async fn test_unopenable_path_degrades_to_unavailable_cache() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, b"file in the way").unwrap();

    let cache = LocalCache::open(blocker.join("cache.db")).await;
    assert!(!cache.is_available());

    cache.save_dataset(DatasetKind::Consumers, &dataset(consumers(2))).await;
    assert_eq!(cache.load_dataset(DatasetKind::Consumers).await, None);
}

#[tokio::test]
async fn test_stats_track_entries() {
    let dir = TempDir::new().unwrap();
    let db = LocalDatabase::open(dir.path().join("stats.db")).await.unwrap();
    let cache = LocalCache::new(std::sync::Arc::new(db.clone()));

    cache.save_dataset(DatasetKind::DeemedVisits, &dataset(consumers(3))).await;
    cache.set_last_row_count(DatasetKind::DeemedVisits, 3).await;

    let stats = db.get_stats().await.unwrap();
    assert_eq!(stats.cached_datasets, 1);
    assert_eq!(stats.markers, 1);
    assert!(stats.cached_bytes > 0);
}
