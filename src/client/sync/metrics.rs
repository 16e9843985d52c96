//! # Sync Metrics
//!
//! Counters for orchestrator passes and record writes. Shared by the
//! orchestrator and the submitter through an `Arc`, so every counter is an
//! atomic and reads go through [`SyncMetrics::snapshot`].

use crate::client::sync::sync_state::SyncOutcome;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Default)]
pub struct SyncMetrics {
    total_passes: AtomicU64,
    snapshot_passes: AtomicU64,
    patch_passes: AtomicU64,
    unchanged_passes: AtomicU64,
    failed_passes: AtomicU64,
    cancelled_passes: AtomicU64,
    records_applied: AtomicU64,
    writes_submitted: AtomicU64,
    writes_confirmed: AtomicU64,
    writes_failed: AtomicU64,
    write_retries: AtomicU64,
    last_pass_duration: Mutex<Option<Duration>>,
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub total_passes: u64,
    pub snapshot_passes: u64,
    pub patch_passes: u64,
    pub unchanged_passes: u64,
    pub failed_passes: u64,
    pub cancelled_passes: u64,
    pub records_applied: u64,
    pub writes_submitted: u64,
    pub writes_confirmed: u64,
    pub writes_failed: u64,
    pub write_retries: u64,
    pub last_pass_duration: Option<Duration>,
}

impl MetricsSnapshot {
    /// Share of passes that did not fail; cancelled passes are not counted
    pub fn success_rate(&self) -> f64 {
        let finished = self.total_passes.saturating_sub(self.cancelled_passes);
        if finished == 0 {
            0.0
        } else {
            (finished - self.failed_passes.min(finished)) as f64 / finished as f64
        }
    }
}

fn bump(counter: &AtomicU64, by: u64) {
    counter.fetch_add(by, Ordering::Relaxed);
}

impl SyncMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finished orchestrator pass
    pub fn record_pass(&self, outcome: &SyncOutcome, duration: Duration) {
        bump(&self.total_passes, 1);
        match outcome {
            SyncOutcome::Snapshot { records, .. } => {
                bump(&self.snapshot_passes, 1);
                bump(&self.records_applied, *records as u64);
            }
            SyncOutcome::PatchApplied { applied, .. } => {
                bump(&self.patch_passes, 1);
                bump(&self.records_applied, *applied as u64);
            }
            SyncOutcome::Unchanged => bump(&self.unchanged_passes, 1),
            SyncOutcome::Degraded { .. } => bump(&self.failed_passes, 1),
            SyncOutcome::Cancelled => bump(&self.cancelled_passes, 1),
        }
        self.set_last_duration(duration);
    }

    /// Record a pass that failed with nothing to show
    pub fn record_pass_failure(&self, duration: Duration) {
        bump(&self.total_passes, 1);
        bump(&self.failed_passes, 1);
        self.set_last_duration(duration);
    }

    pub fn record_write_submitted(&self) {
        bump(&self.writes_submitted, 1);
    }

    pub fn record_write_retry(&self) {
        bump(&self.write_retries, 1);
    }

    pub fn record_write_confirmed(&self) {
        bump(&self.writes_confirmed, 1);
    }

    pub fn record_write_failed(&self) {
        bump(&self.writes_failed, 1);
    }

    fn set_last_duration(&self, duration: Duration) {
        let mut last = self
            .last_pass_duration
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *last = Some(duration);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);
        MetricsSnapshot {
            total_passes: load(&self.total_passes),
            snapshot_passes: load(&self.snapshot_passes),
            patch_passes: load(&self.patch_passes),
            unchanged_passes: load(&self.unchanged_passes),
            failed_passes: load(&self.failed_passes),
            cancelled_passes: load(&self.cancelled_passes),
            records_applied: load(&self.records_applied),
            writes_submitted: load(&self.writes_submitted),
            writes_confirmed: load(&self.writes_confirmed),
            writes_failed: load(&self.writes_failed),
            write_retries: load(&self.write_retries),
            last_pass_duration: *self
                .last_pass_duration
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        }
    }
}
