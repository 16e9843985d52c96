//! # Optimistic Updates
//!
//! User edits are applied locally first and confirmed by the remote later.
//!
//! Per-record state machine: `none → syncing → {none | error}`.
//!
//! 1. The edited record is written with `syncing` into memory and cache.
//! 2. A background task posts it to the update endpoint.
//! 3. Success rewrites it with `none`. Failure is retried with the same
//!    payload until the [`RetryPolicy`] is spent, then the record is written
//!    with `error` and the task reports [`SyncError::SyncExhausted`].
//!
//! A newer submit for the same record supersedes the older task: the old
//! task is aborted and, should it be past its last await already, its write
//! is discarded. Cancelling the session token stops every task before its
//! next state mutation.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use disconnect_sync::client::offline::UpdateSubmitter;
//! # use disconnect_sync::client::state::DatasetState;
//! # use disconnect_sync::shared::Record;
//! # use std::sync::Arc;
//! # async fn example(submitter: UpdateSubmitter, state: Arc<DatasetState>, edited: Record) {
//! let handle = submitter.submit(state, edited).await;
//! // fire and forget, or wait for the final outcome
//! let outcome = handle.outcome().await;
//! # }
//! ```

use crate::client::offline::retry::{RetryDecision, RetryPolicy};
use crate::client::remote_client::RemoteSource;
use crate::client::state::DatasetState;
use crate::client::sync::cancel::CancelToken;
use crate::client::sync::metrics::SyncMetrics;
use crate::shared::dataset::DatasetKind;
use crate::shared::error::{Result, SyncError};
use crate::shared::record::{Record, SyncState};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::{AbortHandle, JoinHandle};
use uuid::Uuid;

type RecordKey = (DatasetKind, String);

/// Live retry task of one record
#[derive(Debug)]
struct Submission {
    id: Uuid,
    abort: Option<AbortHandle>,
}

#[derive(Debug, Default)]
struct Inflight {
    tasks: Mutex<HashMap<RecordKey, Submission>>,
}

impl Inflight {
    fn lock(&self) -> MutexGuard<'_, HashMap<RecordKey, Submission>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make `id` the live submission of `key`, aborting the previous one
    fn register(&self, key: RecordKey, id: Uuid) -> Option<Uuid> {
        let previous = self.lock().insert(key, Submission { id, abort: None })?;
        if let Some(abort) = previous.abort {
            abort.abort();
        }
        Some(previous.id)
    }

    /// Attach the spawned task; a task superseded meanwhile is aborted at once
    fn attach(&self, key: &RecordKey, id: Uuid, abort: AbortHandle) {
        let mut tasks = self.lock();
        match tasks.get_mut(key) {
            Some(submission) if submission.id == id => submission.abort = Some(abort),
            _ => abort.abort(),
        }
    }

    fn is_current(&self, key: &RecordKey, id: Uuid) -> bool {
        self.lock().get(key).is_some_and(|s| s.id == id)
    }

    fn finish(&self, key: &RecordKey, id: Uuid) {
        let mut tasks = self.lock();
        if tasks.get(key).is_some_and(|s| s.id == id) {
            tasks.remove(key);
        }
    }
}

/// Handle to one submission
#[derive(Debug)]
pub struct SubmitHandle {
    id: Uuid,
    record_id: String,
    task: JoinHandle<Result<()>>,
}

impl SubmitHandle {
    /// Submission id, unique per call to [`UpdateSubmitter::submit`]
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn record_id(&self) -> &str {
        &self.record_id
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Final outcome. A superseded or aborted submission reports `Cancelled`.
    pub async fn outcome(self) -> Result<()> {
        match self.task.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(SyncError::Cancelled),
            Err(e) => Err(SyncError::storage(format!("submit task failed: {}", e))),
        }
    }
}

/// Applies edits optimistically and drives their retries
#[derive(Clone)]
pub struct UpdateSubmitter {
    remote: Arc<dyn RemoteSource>,
    policy: RetryPolicy,
    cancel: CancelToken,
    metrics: Arc<SyncMetrics>,
    inflight: Arc<Inflight>,
}

impl std::fmt::Debug for UpdateSubmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateSubmitter")
            .field("policy", &self.policy)
            .field("in_flight", &self.in_flight())
            .finish()
    }
}

impl UpdateSubmitter {
    pub fn new(
        remote: Arc<dyn RemoteSource>,
        policy: RetryPolicy,
        cancel: CancelToken,
        metrics: Arc<SyncMetrics>,
    ) -> Self {
        Self {
            remote,
            policy,
            cancel,
            metrics,
            inflight: Arc::new(Inflight::default()),
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Number of records with a live retry task
    pub fn in_flight(&self) -> usize {
        self.inflight.lock().len()
    }

    /// Apply `record` optimistically and start submitting it.
    ///
    /// The `syncing` copy is in memory and cache when this returns. Must be
    /// called from within a tokio runtime.
    pub async fn submit(&self, state: Arc<DatasetState>, record: Record) -> SubmitHandle {
        let kind = state.kind();
        let id = Uuid::new_v4();
        let key: RecordKey = (kind, record.record_id.clone());
        let record = record.with_sync_state(SyncState::None);
        self.metrics.record_write_submitted();

        if let Some(previous) = self.inflight.register(key.clone(), id) {
            tracing::debug!(dataset = %kind, record_id = %key.1, superseded = %previous, "previous submission superseded");
        }

        let worker = Worker {
            remote: Arc::clone(&self.remote),
            policy: self.policy,
            cancel: self.cancel.clone(),
            metrics: Arc::clone(&self.metrics),
            inflight: Arc::clone(&self.inflight),
            state,
            key: key.clone(),
            id,
        };
        let optimistic = worker.write(record.with_sync_state(SyncState::Syncing)).await;

        let task = tokio::spawn(async move { worker.run(optimistic, record).await });
        self.inflight.attach(&key, id, task.abort_handle());

        SubmitHandle {
            id,
            record_id: key.1,
            task,
        }
    }

    /// Abort every live retry task
    pub fn abort_all(&self) {
        let mut tasks = self.inflight.lock();
        for (_, submission) in tasks.drain() {
            if let Some(abort) = submission.abort {
                abort.abort();
            }
        }
    }
}

/// State moved into one spawned submission
struct Worker {
    remote: Arc<dyn RemoteSource>,
    policy: RetryPolicy,
    cancel: CancelToken,
    metrics: Arc<SyncMetrics>,
    inflight: Arc<Inflight>,
    state: Arc<DatasetState>,
    key: RecordKey,
    id: Uuid,
}

impl Worker {
    async fn run(&self, optimistic: Result<()>, record: Record) -> Result<()> {
        let result = match optimistic {
            Ok(()) => self.drive(record).await,
            Err(e) => Err(e),
        };
        self.inflight.finish(&self.key, self.id);
        result
    }

    async fn drive(&self, record: Record) -> Result<()> {
        let kind = self.state.kind();
        let record_id = record.record_id.as_str();
        let mut task = self.policy.task();
        loop {
            let attempt = task.begin_attempt();
            let result = self
                .cancel
                .guard(self.remote.submit_update(kind, &record))
                .await;

            match result {
                Ok(()) => {
                    self.write(record.with_sync_state(SyncState::None)).await?;
                    self.metrics.record_write_confirmed();
                    tracing::info!(dataset = %kind, record_id, attempt, "update confirmed");
                    return Ok(());
                }
                Err(SyncError::Cancelled) => return Err(SyncError::Cancelled),
                Err(e) => match task.on_failure() {
                    RetryDecision::RetryAfter(delay) => {
                        self.metrics.record_write_retry();
                        tracing::warn!(dataset = %kind, record_id, attempt, error = %e, retry_in_ms = delay.as_millis() as u64, "update failed, retrying");
                        self.cancel.sleep(delay).await?;
                    }
                    RetryDecision::Exhausted { attempts } => {
                        self.write(record.with_sync_state(SyncState::Error)).await?;
                        self.metrics.record_write_failed();
                        tracing::error!(dataset = %kind, record_id, attempts, error = %e, "update failed, giving up");
                        return Err(SyncError::exhausted(record_id, attempts));
                    }
                },
            }
        }
    }

    /// Write `record` unless this submission was cancelled or superseded
    async fn write(&self, record: Record) -> Result<()> {
        let (_, written) = self
            .state
            .apply(|current| {
                if self.cancel.is_cancelled() || !self.inflight.is_current(&self.key, self.id) {
                    (current.clone(), false)
                } else {
                    (current.with_record(record), true)
                }
            })
            .await;
        if written {
            Ok(())
        } else {
            Err(SyncError::Cancelled)
        }
    }
}
