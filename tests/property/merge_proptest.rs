//! Property-based tests for the merge rules

use crate::common::assert_unique_ids;
use disconnect_sync::client::offline::{merge, MergeMode};
use disconnect_sync::shared::{Dataset, Record, SyncState};
use proptest::prelude::*;

fn sync_state() -> impl Strategy<Value = SyncState> {
    prop_oneof![
        3 => Just(SyncState::None),
        1 => Just(SyncState::Syncing),
        1 => Just(SyncState::Error),
    ]
}

/// Small id space so that collisions between existing and incoming are common
fn record(with_state: bool) -> impl Strategy<Value = Record> {
    (
        0u8..12,
        prop_oneof![Just("connected"), Just("disconnected"), Just("pending")],
        proptest::option::of("[a-z ]{0,12}"),
        sync_state(),
    )
        .prop_map(move |(n, status, remarks, state)| {
            let mut record = Record::new(format!("C{}", n)).with_status(status);
            record.fields.remarks = remarks;
            if with_state {
                record.with_sync_state(state)
            } else {
                record
            }
        })
}

fn existing() -> impl Strategy<Value = Dataset> {
    prop::collection::vec(record(true), 0..16).prop_map(|records| Dataset::from_records(records))
}

fn incoming() -> impl Strategy<Value = Vec<Record>> {
    prop::collection::vec(record(false), 0..16)
}

proptest! {
    #[test]
    fn test_patch_is_idempotent(existing in existing(), patch in incoming()) {
        let (once, _) = merge(&existing, patch.clone(), MergeMode::Patch);
        let (twice, _) = merge(&once, patch, MergeMode::Patch);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn test_snapshot_keeps_every_pending_local_record(existing in existing(), snapshot in incoming()) {
        let (merged, summary) = merge(&existing, snapshot, MergeMode::Snapshot);
        let mut kept = 0;
        for local in existing.pending() {
            prop_assert_eq!(merged.get(&local.record_id), Some(local));
            kept += 1;
        }
        prop_assert_eq!(summary.kept_local, kept);
    }

    #[test]
    fn test_snapshot_result_is_exactly_incoming_plus_pending(existing in existing(), snapshot in incoming()) {
        let (merged, _) = merge(&existing, snapshot.clone(), MergeMode::Snapshot);
        for record in merged.records() {
            let from_snapshot = snapshot.iter().any(|r| r.record_id == record.record_id);
            let pending_local = existing.get(&record.record_id).is_some_and(Record::is_pending);
            prop_assert!(from_snapshot || pending_local);
        }
        for record in &snapshot {
            prop_assert!(merged.contains(&record.record_id));
        }
    }

    #[test]
    fn test_merges_never_duplicate_ids(existing in existing(), batch in incoming(), snapshot in any::<bool>()) {
        let mode = if snapshot { MergeMode::Snapshot } else { MergeMode::Patch };
        let (merged, _) = merge(&existing, batch, mode);
        assert_unique_ids(merged.records());
    }

    #[test]
    fn test_patch_leaves_untouched_records_alone(existing in existing(), patch in incoming()) {
        let (merged, _) = merge(&existing, patch.clone(), MergeMode::Patch);
        for local in existing.records() {
            if !patch.iter().any(|r| r.record_id == local.record_id) {
                prop_assert_eq!(merged.get(&local.record_id), Some(local));
            }
        }
        prop_assert!(merged.len() >= existing.len());
    }
}
