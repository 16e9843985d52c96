//! # Sync Orchestrator
//!
//! One pass per dataset brings the in-memory view up to date with the remote:
//!
//! ```text
//! load cache (if memory is empty)
//!   → checking → version
//!       counts differ → found → syncing → snapshot merge → updated → idle
//!       counts equal  → patch
//!                         non-empty → syncing → patch merge → updated → idle
//!                         empty     → idle
//! ```
//!
//! Every step awaits the previous one. A failing step sends status back to
//! `idle`. When cached data is on screen the failure is logged and reported
//! as [`SyncOutcome::Degraded`]. With nothing to show, a blocking load error
//! is published and returned.
//!
//! ## Components
//!
//! - `cancel.rs`: session cancellation token
//! - `scheduler.rs`: periodic refresh
//! - `sync_state.rs`: status signal and pass outcome
//! - `metrics.rs`: pass and write counters
//!
//! ## Usage
//!
//! ```rust,no_run
//! use disconnect_sync::client::sync::{CancelToken, SyncMetrics, SyncOrchestrator};
//! use disconnect_sync::client::state::DatasetState;
//! use disconnect_sync::client::local_db::LocalCache;
//! use disconnect_sync::client::remote_client::HttpRemote;
//! use disconnect_sync::client::config::Config;
//! use disconnect_sync::shared::{DatasetKind, PatchWindow, TimingSettings};
//! use std::sync::Arc;
//!
//! # async fn example() -> disconnect_sync::shared::Result<()> {
//! let remote = Arc::new(HttpRemote::new(Config::new())?);
//! let orchestrator = SyncOrchestrator::new(
//!     remote,
//!     TimingSettings::default(),
//!     CancelToken::new(),
//!     Arc::new(SyncMetrics::new()),
//! );
//! let state = DatasetState::new(DatasetKind::Consumers, LocalCache::in_memory());
//! let outcome = orchestrator.run(&state, PatchWindow::Hours(48)).await?;
//! println!("{:?}", outcome);
//! # Ok(())
//! # }
//! ```

pub mod cancel;
pub mod metrics;
pub mod scheduler;
pub mod sync_state;

pub use cancel::CancelToken;
pub use metrics::{MetricsSnapshot, SyncMetrics};
pub use scheduler::SyncScheduler;
pub use sync_state::{SyncOutcome, SyncStatus};

use crate::client::offline::reconciliation::{merge, MergeMode};
use crate::client::remote_client::RemoteSource;
use crate::client::state::DatasetState;
use crate::shared::config::TimingSettings;
use crate::shared::dataset::{PatchWindow, VersionMarker};
use crate::shared::error::{Result, SyncError};
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;

/// Runs sync passes against one remote
#[derive(Clone)]
pub struct SyncOrchestrator {
    remote: Arc<dyn RemoteSource>,
    timings: TimingSettings,
    cancel: CancelToken,
    metrics: Arc<SyncMetrics>,
}

impl std::fmt::Debug for SyncOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncOrchestrator")
            .field("timings", &self.timings)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

impl SyncOrchestrator {
    pub fn new(
        remote: Arc<dyn RemoteSource>,
        timings: TimingSettings,
        cancel: CancelToken,
        metrics: Arc<SyncMetrics>,
    ) -> Self {
        Self {
            remote,
            timings,
            cancel,
            metrics,
        }
    }

    pub fn metrics(&self) -> &Arc<SyncMetrics> {
        &self.metrics
    }

    /// Run one pass for `state`.
    ///
    /// Returns `Err` only when the pass failed and the dataset is empty; the
    /// same message is then published as the dataset's load error.
    pub async fn run(&self, state: &DatasetState, window: PatchWindow) -> Result<SyncOutcome> {
        let started = Instant::now();
        let kind = state.kind();

        match self.pass(state, window).await {
            Ok(outcome) => {
                state.set_load_error(None);
                self.metrics.record_pass(&outcome, started.elapsed());
                tracing::info!(dataset = %kind, ?outcome, elapsed_ms = started.elapsed().as_millis() as u64, "sync pass finished");
                Ok(outcome)
            }
            Err(SyncError::Cancelled) => {
                state.set_status(SyncStatus::Idle);
                self.metrics.record_pass(&SyncOutcome::Cancelled, started.elapsed());
                tracing::debug!(dataset = %kind, "sync pass cancelled");
                Ok(SyncOutcome::Cancelled)
            }
            Err(e) => {
                state.set_status(SyncStatus::Idle);
                if state.snapshot().is_empty() {
                    tracing::error!(dataset = %kind, error = %e, "sync failed with no cached data");
                    state.set_load_error(Some(e.to_string()));
                    self.metrics.record_pass_failure(started.elapsed());
                    Err(e)
                } else {
                    tracing::warn!(dataset = %kind, error = %e, "background sync failed, keeping cached data");
                    let outcome = SyncOutcome::Degraded {
                        reason: e.to_string(),
                    };
                    self.metrics.record_pass(&outcome, started.elapsed());
                    Ok(outcome)
                }
            }
        }
    }

    async fn pass(&self, state: &DatasetState, window: PatchWindow) -> Result<SyncOutcome> {
        let kind = state.kind();

        if state.snapshot().is_empty() {
            state.load_from_cache().await;
        }

        self.cancel.check()?;
        state.set_status(SyncStatus::Checking);
        let marker = self.cancel.guard(self.remote.fetch_version(kind)).await?;
        let local_count = state.cache().last_row_count(kind).await;

        if marker.requires_snapshot(local_count) {
            tracing::info!(dataset = %kind, local = ?local_count, remote = marker.count, "row count changed, fetching snapshot");
            self.snapshot_path(state, marker).await
        } else {
            self.log_hash_drift(state, &marker).await;
            self.patch_path(state, window).await
        }
    }

    async fn snapshot_path(&self, state: &DatasetState, marker: VersionMarker) -> Result<SyncOutcome> {
        let kind = state.kind();

        state.set_status(SyncStatus::Found);
        self.cancel.sleep(self.timings.found_delay()).await?;
        state.set_status(SyncStatus::Syncing);

        let incoming = self.cancel.guard(self.remote.fetch_snapshot(kind)).await?;
        self.cancel.check()?;
        let (merged, summary) = state
            .apply(|current| merge(current, incoming, MergeMode::Snapshot))
            .await;

        let cache = state.cache();
        cache.set_last_row_count(kind, marker.count).await;
        if let Some(hash) = &marker.hash {
            cache.set_last_version_hash(kind, hash).await;
        }
        cache.set_last_sync_date(kind, Utc::now()).await;

        if summary.kept_local > 0 {
            tracing::info!(dataset = %kind, kept_local = summary.kept_local, "pending local edits kept over snapshot");
        }
        self.show_updated(state).await?;

        Ok(SyncOutcome::Snapshot {
            records: merged.len(),
            kept_local: summary.kept_local,
        })
    }

    async fn patch_path(&self, state: &DatasetState, window: PatchWindow) -> Result<SyncOutcome> {
        let kind = state.kind();
        let since = window.cutoff(Utc::now());

        let incoming = self.cancel.guard(self.remote.fetch_patch(kind, since)).await?;
        if incoming.is_empty() {
            tracing::debug!(dataset = %kind, %window, "no recent changes");
            self.cancel.sleep(self.timings.unchanged_display()).await?;
            state.set_status(SyncStatus::Idle);
            return Ok(SyncOutcome::Unchanged);
        }

        self.cancel.check()?;
        state.set_status(SyncStatus::Syncing);
        let (_, summary) = state
            .apply(|current| merge(current, incoming, MergeMode::Patch))
            .await;
        state.cache().set_last_sync_date(kind, Utc::now()).await;
        tracing::info!(
            dataset = %kind,
            applied = summary.applied,
            added = summary.added,
            overridden_local = summary.overridden_local,
            "patch applied"
        );

        self.show_updated(state).await?;
        Ok(SyncOutcome::PatchApplied {
            applied: summary.applied,
            added: summary.added,
        })
    }

    async fn show_updated(&self, state: &DatasetState) -> Result<()> {
        state.set_status(SyncStatus::Updated);
        self.cancel.sleep(self.timings.updated_display()).await?;
        state.set_status(SyncStatus::Idle);
        Ok(())
    }

    /// Equal counts with a different hash do not trigger a snapshot
    async fn log_hash_drift(&self, state: &DatasetState, marker: &VersionMarker) {
        let Some(remote_hash) = marker.hash.as_deref() else {
            return;
        };
        let local_hash = state.cache().last_version_hash(state.kind()).await;
        if local_hash.as_deref().is_some_and(|local| local != remote_hash) {
            tracing::debug!(dataset = %state.kind(), local = ?local_hash, remote = remote_hash, "version hash differs at equal row count");
        }
    }
}
