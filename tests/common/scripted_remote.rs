//! In-process remote with scripted answers
//!
//! Each endpoint returns whatever the test configured last. Update calls can
//! additionally be scripted one step at a time to model slow or failing writes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use disconnect_sync::client::RemoteSource;
use disconnect_sync::shared::{DatasetKind, Record, Result, SyncError, VersionMarker};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Scripted behaviour of one update call
#[derive(Debug, Clone)]
pub enum UpdateStep {
    Accept,
    Fail(SyncError),
    /// Never answer
    Hang,
}

#[derive(Debug, Default)]
pub struct CallCounts {
    pub version: AtomicUsize,
    pub snapshot: AtomicUsize,
    pub patch: AtomicUsize,
    pub update: AtomicUsize,
}

pub struct ScriptedRemote {
    version: Mutex<Result<VersionMarker>>,
    snapshot: Mutex<Result<Vec<Record>>>,
    patch: Mutex<Result<Vec<Record>>>,
    update_steps: Mutex<VecDeque<UpdateStep>>,
    update_default: Mutex<UpdateStep>,
    submitted: Mutex<Vec<Record>>,
    last_since: Mutex<Option<DateTime<Utc>>>,
    pub calls: CallCounts,
}

impl ScriptedRemote {
    /// Remote that is unreachable on every read and accepts every write
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            version: Mutex::new(Err(SyncError::network("unreachable"))),
            snapshot: Mutex::new(Err(SyncError::network("unreachable"))),
            patch: Mutex::new(Err(SyncError::network("unreachable"))),
            update_steps: Mutex::new(VecDeque::new()),
            update_default: Mutex::new(UpdateStep::Accept),
            submitted: Mutex::new(Vec::new()),
            last_since: Mutex::new(None),
            calls: CallCounts::default(),
        })
    }

    pub fn set_version(&self, count: u64, hash: Option<&str>) {
        *self.version.lock().unwrap() = Ok(VersionMarker::new(count, hash.map(str::to_string)));
    }

    pub fn fail_version(&self, error: SyncError) {
        *self.version.lock().unwrap() = Err(error);
    }

    pub fn set_snapshot(&self, records: Vec<Record>) {
        *self.snapshot.lock().unwrap() = Ok(records);
    }

    pub fn fail_snapshot(&self, error: SyncError) {
        *self.snapshot.lock().unwrap() = Err(error);
    }

    pub fn set_patch(&self, records: Vec<Record>) {
        *self.patch.lock().unwrap() = Ok(records);
    }

    pub fn fail_patch(&self, error: SyncError) {
        *self.patch.lock().unwrap() = Err(error);
    }

    /// Queue steps consumed by the next update calls, in order
    pub fn script_updates(&self, steps: impl IntoIterator<Item = UpdateStep>) {
        self.update_steps.lock().unwrap().extend(steps);
    }

    /// Behaviour once the scripted steps are used up
    pub fn set_update_default(&self, step: UpdateStep) {
        *self.update_default.lock().unwrap() = step;
    }

    pub fn submitted(&self) -> Vec<Record> {
        self.submitted.lock().unwrap().clone()
    }

    pub fn last_since(&self) -> Option<DateTime<Utc>> {
        *self.last_since.lock().unwrap()
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    pub fn update_calls(&self) -> usize {
        Self::count(&self.calls.update)
    }
}

#[async_trait]
impl RemoteSource for ScriptedRemote {
    async fn fetch_version(&self, _: DatasetKind) -> Result<VersionMarker> {
        self.calls.version.fetch_add(1, Ordering::SeqCst);
        self.version.lock().unwrap().clone()
    }

    async fn fetch_snapshot(&self, _: DatasetKind) -> Result<Vec<Record>> {
        self.calls.snapshot.fetch_add(1, Ordering::SeqCst);
        self.snapshot.lock().unwrap().clone()
    }

    async fn fetch_patch(&self, _: DatasetKind, since: DateTime<Utc>) -> Result<Vec<Record>> {
        self.calls.patch.fetch_add(1, Ordering::SeqCst);
        *self.last_since.lock().unwrap() = Some(since);
        self.patch.lock().unwrap().clone()
    }

    async fn submit_update(&self, _: DatasetKind, record: &Record) -> Result<()> {
        self.calls.update.fetch_add(1, Ordering::SeqCst);
        self.submitted.lock().unwrap().push(record.clone());
        let step = {
            let scripted = self.update_steps.lock().unwrap().pop_front();
            scripted.unwrap_or_else(|| self.update_default.lock().unwrap().clone())
        };
        match step {
            UpdateStep::Accept => Ok(()),
            UpdateStep::Fail(error) => Err(error),
            UpdateStep::Hang => std::future::pending().await,
        }
    }
}
