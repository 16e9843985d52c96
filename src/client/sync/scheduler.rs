//! # Sync Scheduler
//!
//! Re-runs a refresh job at a fixed interval until the session token is
//! cancelled. The first run happens one interval after start; callers that
//! want data immediately refresh once themselves before scheduling.

use crate::client::sync::cancel::CancelToken;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Periodic refresh driver
#[derive(Debug, Clone)]
pub struct SyncScheduler {
    interval: Duration,
    cancel: CancelToken,
    runs: Arc<AtomicU64>,
}

impl SyncScheduler {
    /// Create a scheduler; a zero interval is raised to one second
    pub fn new(interval: Duration, cancel: CancelToken) -> Self {
        let interval = if interval.is_zero() {
            Duration::from_secs(1)
        } else {
            interval
        };
        Self {
            interval,
            cancel,
            runs: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Completed runs so far
    pub fn runs(&self) -> u64 {
        self.runs.load(Ordering::Relaxed)
    }

    /// Spawn the loop. A run that overruns the interval delays the next tick
    /// instead of bursting.
    pub fn spawn<F, Fut>(&self, mut job: F) -> JoinHandle<()>
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let scheduler = self.clone();
        tokio::spawn(async move {
            let mut ticker =
                tokio::time::interval_at(Instant::now() + scheduler.interval, scheduler.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            tracing::debug!(interval_secs = scheduler.interval.as_secs(), "periodic refresh started");

            loop {
                tokio::select! {
                    biased;
                    _ = scheduler.cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        job().await;
                        scheduler.runs.fetch_add(1, Ordering::Relaxed);
                    }
                }
            }
            tracing::debug!(runs = scheduler.runs(), "periodic refresh stopped");
        })
    }
}
