//! # State Reconciliation
//!
//! Merges freshly fetched remote records into the current dataset.
//!
//! ## Rules
//!
//! - **Snapshot**: the remote list replaces the dataset, except that records
//!   with an unresolved local change (`syncing` or `error`) keep their local
//!   copy. A snapshot is a coarse point-in-time read that may predate a write
//!   the user is still waiting on. Pending records missing from the snapshot
//!   are kept as well.
//! - **Patch**: incoming records overwrite by key and new keys are appended.
//!   Patches are time-windowed to recent remote changes, so they are fresher
//!   than the cache by construction. This includes local copies in `error`
//!   or `syncing`; each such overwrite is logged at `warn`.
//!
//! ## Usage
//!
//! ```rust
//! use disconnect_sync::client::offline::reconciliation::{merge, MergeMode};
//! use disconnect_sync::shared::{Dataset, Record};
//!
//! let cached = Dataset::from_records(vec![Record::new("C1").with_status("connected")]);
//! let patch = vec![Record::new("C1").with_status("disconnected")];
//! let (merged, summary) = merge(&cached, patch, MergeMode::Patch);
//! assert_eq!(merged.get("C1").unwrap().fields.status, "disconnected");
//! assert_eq!(summary.applied, 1);
//! ```

use crate::shared::dataset::Dataset;
use crate::shared::record::{Record, SyncState};
use std::collections::HashSet;
use std::fmt;

/// Kind of remote read being merged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMode {
    /// Full dataset, local pending edits win
    Snapshot,
    /// Recent delta, incoming wins
    Patch,
}

impl fmt::Display for MergeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeMode::Snapshot => f.write_str("snapshot"),
            MergeMode::Patch => f.write_str("patch"),
        }
    }
}

/// What a merge did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeSummary {
    /// Incoming records written into the result
    pub applied: usize,
    /// Of those, keys that were not in the existing dataset
    pub added: usize,
    /// Pending local copies kept instead of the incoming one
    pub kept_local: usize,
    /// Existing records absent from a snapshot
    pub dropped: usize,
    /// Rows of a snapshot that repeated an earlier id
    pub duplicates: usize,
    /// Pending local copies a patch overwrote
    pub overridden_local: usize,
}

/// Merge `incoming` into `existing` according to `mode`.
pub fn merge(existing: &Dataset, incoming: Vec<Record>, mode: MergeMode) -> (Dataset, MergeSummary) {
    match mode {
        MergeMode::Snapshot => merge_snapshot(existing, incoming),
        MergeMode::Patch => merge_patch(existing, incoming),
    }
}

fn merge_snapshot(existing: &Dataset, incoming: Vec<Record>) -> (Dataset, MergeSummary) {
    let mut summary = MergeSummary::default();
    let mut result = Dataset::new();
    let mut seen = HashSet::new();

    for record in incoming {
        if !seen.insert(record.record_id.clone()) {
            // repeated id within the snapshot: the later row wins
            summary.duplicates += 1;
            if !result.get(&record.record_id).is_some_and(Record::is_pending) {
                result.upsert_in_place(record);
            }
            continue;
        }
        match existing.get(&record.record_id) {
            Some(local) if local.is_pending() => {
                summary.kept_local += 1;
                result.upsert_in_place(local.clone());
            }
            local => {
                if local.is_none() {
                    summary.added += 1;
                }
                summary.applied += 1;
                result.upsert_in_place(record);
            }
        }
    }

    for local in existing.records() {
        if seen.contains(&local.record_id) {
            continue;
        }
        if local.is_pending() {
            summary.kept_local += 1;
            result.upsert_in_place(local.clone());
        } else {
            summary.dropped += 1;
        }
    }

    (result, summary)
}

fn merge_patch(existing: &Dataset, incoming: Vec<Record>) -> (Dataset, MergeSummary) {
    let mut summary = MergeSummary::default();
    let mut result = existing.clone();
    let mut touched = HashSet::new();

    for record in incoming {
        if touched.insert(record.record_id.clone()) {
            summary.applied += 1;
            match existing.get(&record.record_id) {
                None => summary.added += 1,
                Some(local) if local.is_pending() => {
                    summary.overridden_local += 1;
                    tracing::warn!(
                        record_id = %local.record_id,
                        sync_state = ?local.sync_state,
                        "patch overwrote an unconfirmed local edit"
                    );
                }
                Some(_) => {}
            }
        }
        result.upsert_in_place(record.with_sync_state(SyncState::None));
    }

    (result, summary)
}
