//! Update submitter integration tests
//!
//! Retry budget, supersede semantics and cancellation of record writes.

use crate::common::{consumer, dataset, expect_record, GatedStore, ScriptedRemote, UpdateStep};
use crate::{assert_err, assert_ok};
use disconnect_sync::client::offline::{RetryPolicy, UpdateSubmitter};
use disconnect_sync::client::sync::{CancelToken, SyncMetrics};
use disconnect_sync::client::{DatasetState, LocalCache};
use disconnect_sync::shared::{DatasetKind, SyncError, SyncState};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

struct Harness {
    remote: Arc<ScriptedRemote>,
    submitter: UpdateSubmitter,
    state: Arc<DatasetState>,
    cancel: CancelToken,
    metrics: Arc<SyncMetrics>,
}

fn harness(delay: Duration) -> Harness {
    let remote = ScriptedRemote::new();
    let cancel = CancelToken::new();
    let metrics = Arc::new(SyncMetrics::new());
    let submitter = UpdateSubmitter::new(
        remote.clone(),
        RetryPolicy::fixed(3, delay),
        cancel.clone(),
        metrics.clone(),
    );
    let state = Arc::new(DatasetState::new(DatasetKind::DeemedVisits, LocalCache::in_memory()));
    Harness {
        remote,
        submitter,
        state,
        cancel,
        metrics,
    }
}

#[tokio::test]
async fn test_optimistic_copy_is_visible_immediately() {
    let h = harness(Duration::from_millis(5));
    h.remote.script_updates([UpdateStep::Hang]);

    let handle = h.submitter.submit(h.state.clone(), consumer("DV-1", "visited")).await;

    let data = h.state.snapshot();
    let record = expect_record(&data, "DV-1");
    assert_eq!(record.sync_state, SyncState::Syncing);
    assert_eq!(record.fields.status, "visited");
    let cached = h.state.cache().load_dataset(DatasetKind::DeemedVisits).await.unwrap();
    assert_eq!(expect_record(&cached, "DV-1").sync_state, SyncState::Syncing);

    assert!(!handle.is_finished());
    h.submitter.abort_all();
}

#[tokio::test]
async fn test_always_failing_endpoint_stops_after_three_attempts() {
    let h = harness(Duration::from_millis(5));
    h.remote.set_update_default(UpdateStep::Fail(SyncError::network("HTTP 502: bad gateway")));

    let handle = h.submitter.submit(h.state.clone(), consumer("DV-2", "visited")).await;
    let result = handle.outcome().await;

    assert_eq!(result, Err(SyncError::exhausted("DV-2", 3)));
    assert_eq!(h.remote.update_calls(), 3);
    assert_eq!(expect_record(&h.state.snapshot(), "DV-2").sync_state, SyncState::Error);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(h.remote.update_calls(), 3);

    let metrics = h.metrics.snapshot();
    assert_eq!(metrics.writes_failed, 1);
    assert_eq!(metrics.write_retries, 2);
}

#[tokio::test]
async fn test_rejected_write_is_retried_with_same_payload() {
    let h = harness(Duration::from_millis(5));
    h.remote.script_updates([
        UpdateStep::Fail(SyncError::rejected("row locked")),
        UpdateStep::Accept,
    ]);

    let edited = consumer("DV-3", "visited").with_remarks("gate closed");
    let handle = h.submitter.submit(h.state.clone(), edited.clone()).await;
    assert_ok!(handle.outcome().await);

    let submitted = h.remote.submitted();
    assert_eq!(submitted.len(), 2);
    assert_eq!(submitted[0], submitted[1]);
    assert_eq!(submitted[0].fields, edited.fields);

    let data = h.state.snapshot();
    let record = expect_record(&data, "DV-3");
    assert_eq!(record.sync_state, SyncState::None);
    assert_eq!(record.fields.remarks.as_deref(), Some("gate closed"));
}

#[tokio::test]
async fn test_newer_submit_supersedes_older() {
    let h = harness(Duration::from_millis(5));
    h.remote.script_updates([UpdateStep::Hang, UpdateStep::Accept]);

    let first = h
        .submitter
        .submit(h.state.clone(), consumer("DV-4", "visited").with_remarks("first"))
        .await;
    while h.remote.update_calls() == 0 {
        tokio::task::yield_now().await;
    }
    let second = h
        .submitter
        .submit(h.state.clone(), consumer("DV-4", "visited").with_remarks("second"))
        .await;

    assert_ok!(second.outcome().await);
    assert_err!(first.outcome().await, SyncError::Cancelled);

    let data = h.state.snapshot();
    let record = expect_record(&data, "DV-4");
    assert_eq!(record.fields.remarks.as_deref(), Some("second"));
    assert_eq!(record.sync_state, SyncState::None);
    assert_eq!(h.submitter.in_flight(), 0);
}

#[tokio::test]
async fn test_records_retry_independently() {
    let h = harness(Duration::from_millis(5));
    h.remote.script_updates([UpdateStep::Hang]);

    let stuck = h.submitter.submit(h.state.clone(), consumer("DV-5", "visited")).await;
    let quick = h.submitter.submit(h.state.clone(), consumer("DV-6", "visited")).await;

    assert_ok!(quick.outcome().await);
    let data = h.state.snapshot();
    assert_eq!(expect_record(&data, "DV-5").sync_state, SyncState::Syncing);
    assert_eq!(expect_record(&data, "DV-6").sync_state, SyncState::None);
    assert_eq!(h.submitter.in_flight(), 1);
    assert!(!stuck.is_finished());
    h.submitter.abort_all();
}

#[tokio::test]
async fn test_cancel_stops_retry_loop() {
    let h = harness(Duration::from_secs(60));
    h.remote.set_update_default(UpdateStep::Fail(SyncError::network("offline")));

    let handle = h.submitter.submit(h.state.clone(), consumer("DV-7", "visited")).await;
    while h.remote.update_calls() == 0 {
        tokio::task::yield_now().await;
    }
    h.cancel.cancel();

    assert_eq!(handle.outcome().await, Err(SyncError::Cancelled));
    assert_eq!(h.remote.update_calls(), 1);
    assert_eq!(expect_record(&h.state.snapshot(), "DV-7").sync_state, SyncState::Syncing);
}

#[tokio::test]
async fn test_submit_during_cache_load_survives() {
    let remote = ScriptedRemote::new();
    remote.script_updates([UpdateStep::Hang]);
    let submitter = UpdateSubmitter::new(
        remote.clone(),
        RetryPolicy::fixed(3, Duration::from_millis(5)),
        CancelToken::new(),
        Arc::new(SyncMetrics::new()),
    );

    let store = GatedStore::new();
    let cache = LocalCache::new(store.clone());
    cache
        .save_dataset(DatasetKind::DeemedVisits, &dataset(vec![consumer("DV-1", "scheduled")]))
        .await;
    store.arm();
    let state = Arc::new(DatasetState::new(DatasetKind::DeemedVisits, cache));

    let loader = tokio::spawn({
        let state = state.clone();
        async move { state.load_from_cache().await }
    });
    store.wait_for_read().await;

    let submit = tokio::spawn({
        let submitter = submitter.clone();
        let state = state.clone();
        async move { submitter.submit(state, consumer("DV-9", "visited")).await }
    });
    tokio::task::yield_now().await;
    store.release();

    assert_eq!(loader.await.unwrap(), 1);
    let handle = submit.await.unwrap();

    let data = state.snapshot();
    assert_eq!(expect_record(&data, "DV-1").sync_state, SyncState::None);
    assert_eq!(expect_record(&data, "DV-9").sync_state, SyncState::Syncing);
    let cached = state.cache().load_dataset(DatasetKind::DeemedVisits).await.unwrap();
    assert_eq!(expect_record(&cached, "DV-9").sync_state, SyncState::Syncing);
    assert!(cached.contains("DV-1"));

    assert!(!handle.is_finished());
    submitter.abort_all();
}
