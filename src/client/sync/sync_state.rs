//! # Sync State Management
//!
//! Status signal published by the orchestrator for each dataset, and the
//! outcome a pass reports back to its caller.

use serde::Serialize;
use std::fmt;

/// Status indicator shown next to a dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    #[default]
    Idle,
    /// Version check in progress
    Checking,
    /// Structural change detected, snapshot about to start
    Found,
    /// Snapshot or patch being fetched and merged
    Syncing,
    /// Fresh data applied
    Updated,
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SyncStatus::Idle => "idle",
            SyncStatus::Checking => "checking",
            SyncStatus::Found => "found",
            SyncStatus::Syncing => "syncing",
            SyncStatus::Updated => "updated",
        };
        f.write_str(label)
    }
}

/// What a single orchestrator pass did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Counts differed, a full snapshot was reconciled
    Snapshot {
        records: usize,
        kept_local: usize,
    },
    /// Counts matched and a non-empty patch was applied
    PatchApplied {
        applied: usize,
        added: usize,
    },
    /// Counts matched and the patch was empty
    Unchanged,
    /// A step failed but cached data stayed visible
    Degraded {
        reason: String,
    },
    /// The session was torn down mid-pass
    Cancelled,
}

impl SyncOutcome {
    /// Whether the pass changed the in-memory dataset
    pub fn changed_data(&self) -> bool {
        matches!(self, SyncOutcome::Snapshot { .. } | SyncOutcome::PatchApplied { .. })
    }
}
