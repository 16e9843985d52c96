/**
 * Sync Session
 *
 * Owns everything a dashboard session needs: the cache, the remote client,
 * one `DatasetState` per dataset, the orchestrator, the update submitter, the
 * cancellation token and the metrics. Created once, torn down with
 * `shutdown()` or on drop.
 */

use crate::client::config::Config;
use crate::client::local_db::LocalCache;
use crate::client::offline::optimistic::{SubmitHandle, UpdateSubmitter};
use crate::client::offline::retry::RetryPolicy;
use crate::client::remote_client::{HttpRemote, RemoteSource};
use crate::client::state::DatasetState;
use crate::client::sync::{CancelToken, MetricsSnapshot, SyncMetrics, SyncOrchestrator, SyncOutcome, SyncScheduler};
use crate::shared::dataset::DatasetKind;
use crate::shared::error::Result;
use crate::shared::record::Record;
use futures_util::future::join_all;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::task::JoinHandle;

pub struct SyncSession {
    config: Config,
    cache: LocalCache,
    consumers: Arc<DatasetState>,
    deemed_visits: Arc<DatasetState>,
    orchestrator: SyncOrchestrator,
    submitter: UpdateSubmitter,
    cancel: CancelToken,
    metrics: Arc<SyncMetrics>,
    periodic: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for SyncSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncSession")
            .field("server_url", &self.config.server_url())
            .field("cache", &self.cache)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

impl SyncSession {
    /// Open the SQLite cache and the HTTP remote described by `config`.
    ///
    /// A cache that cannot be opened leaves the session in memory-only mode.
    pub async fn start(config: Config) -> Result<Self> {
        let cache = LocalCache::open(config.cache_path()).await;
        let remote = HttpRemote::new(config.clone())?;
        tracing::info!(server = config.server_url(), cache_available = cache.is_available(), "sync session started");
        Ok(Self::with_parts(Arc::new(remote), cache, config))
    }

    /// Assemble a session from explicit parts
    pub fn with_parts(remote: Arc<dyn RemoteSource>, cache: LocalCache, config: Config) -> Self {
        let cancel = CancelToken::new();
        let metrics = Arc::new(SyncMetrics::new());
        let app = config.app();

        let orchestrator = SyncOrchestrator::new(
            Arc::clone(&remote),
            app.timings.clone(),
            cancel.clone(),
            Arc::clone(&metrics),
        );
        let submitter = UpdateSubmitter::new(
            remote,
            RetryPolicy::from(&app.retry),
            cancel.clone(),
            Arc::clone(&metrics),
        );

        Self {
            consumers: Arc::new(DatasetState::new(DatasetKind::Consumers, cache.clone())),
            deemed_visits: Arc::new(DatasetState::new(DatasetKind::DeemedVisits, cache.clone())),
            config,
            cache,
            orchestrator,
            submitter,
            cancel,
            metrics,
            periodic: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cache(&self) -> &LocalCache {
        &self.cache
    }

    pub fn dataset(&self, kind: DatasetKind) -> &Arc<DatasetState> {
        match kind {
            DatasetKind::Consumers => &self.consumers,
            DatasetKind::DeemedVisits => &self.deemed_visits,
        }
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Populate every empty dataset from the cache without touching the remote
    pub async fn load_cached(&self) {
        for kind in DatasetKind::ALL {
            let state = self.dataset(kind);
            if state.snapshot().is_empty() {
                state.load_from_cache().await;
            }
        }
    }

    /// Run one orchestrator pass for `kind`
    pub async fn refresh(&self, kind: DatasetKind) -> Result<SyncOutcome> {
        self.orchestrator
            .run(self.dataset(kind), self.config.patch_window(kind))
            .await
    }

    /// Refresh both datasets concurrently
    pub async fn refresh_all(&self) -> Vec<(DatasetKind, Result<SyncOutcome>)> {
        let passes = DatasetKind::ALL.map(|kind| async move { (kind, self.refresh(kind).await) });
        join_all(passes).await
    }

    /// Apply an edited record optimistically and submit it
    pub async fn submit(&self, kind: DatasetKind, record: Record) -> SubmitHandle {
        self.submitter
            .submit(Arc::clone(self.dataset(kind)), record)
            .await
    }

    /// Start refreshing both datasets every configured interval.
    ///
    /// Returns `false` when no interval is configured or a periodic refresh
    /// is already running.
    pub fn spawn_periodic(&self) -> bool {
        let Some(interval) = self.config.app().refresh_interval else {
            return false;
        };
        let mut periodic = self.periodic.lock().unwrap_or_else(PoisonError::into_inner);
        if periodic.as_ref().is_some_and(|task| !task.is_finished()) {
            return false;
        }

        let orchestrator = self.orchestrator.clone();
        let datasets = [
            (Arc::clone(&self.consumers), self.config.patch_window(DatasetKind::Consumers)),
            (Arc::clone(&self.deemed_visits), self.config.patch_window(DatasetKind::DeemedVisits)),
        ];
        let scheduler = SyncScheduler::new(interval, self.cancel.clone());
        let task = scheduler.spawn(move || {
            let orchestrator = orchestrator.clone();
            let datasets = datasets.clone();
            async move {
                let passes = datasets
                    .iter()
                    .map(|(state, window)| orchestrator.run(state, *window));
                for result in join_all(passes).await {
                    if let Err(e) = result {
                        tracing::warn!(error = %e, "periodic refresh failed");
                    }
                }
            }
        });
        *periodic = Some(task);
        true
    }

    /// Cancel every pass and retry task and stop the periodic refresh. Idempotent.
    pub fn shutdown(&self) {
        if self.cancel.is_cancelled() {
            return;
        }
        self.cancel.cancel();
        self.submitter.abort_all();
        if let Some(task) = self
            .periodic
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            task.abort();
        }
        tracing::info!("sync session shut down");
    }
}

impl Drop for SyncSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}
