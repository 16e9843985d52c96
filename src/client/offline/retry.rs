//! # Retry Logic and Backoff Strategies
//!
//! Bounded retry for record writes. A [`RetryTask`] counts attempts and, after
//! each failure, tells the caller either how long to wait before the next
//! attempt or that the budget is spent.
//!
//! The submitter uses a fixed interval (3 attempts, 5 s apart). Exponential
//! backoff is available for callers that configure it.
//!
//! ## Usage
//!
//! ```rust
//! use disconnect_sync::client::offline::retry::{RetryDecision, RetryPolicy};
//! use std::time::Duration;
//!
//! let policy = RetryPolicy::fixed(3, Duration::from_secs(5));
//! let mut task = policy.task();
//!
//! assert_eq!(task.begin_attempt(), 1);
//! assert_eq!(task.on_failure(), RetryDecision::RetryAfter(Duration::from_secs(5)));
//! assert_eq!(task.begin_attempt(), 2);
//! assert_eq!(task.on_failure(), RetryDecision::RetryAfter(Duration::from_secs(5)));
//! assert_eq!(task.begin_attempt(), 3);
//! assert_eq!(task.on_failure(), RetryDecision::Exhausted { attempts: 3 });
//! ```

use crate::shared::config::RetrySettings;
use std::time::Duration;

/// Backoff strategy configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackoffStrategy {
    /// Fixed interval between retries
    Fixed {
        interval: Duration,
    },
    /// Doubling interval, capped at `max`
    Exponential {
        base: Duration,
        max: Duration,
    },
}

impl BackoffStrategy {
    /// Delay to wait after the given (1-based) failed attempt
    pub fn delay_after(&self, attempt: u32) -> Duration {
        match *self {
            BackoffStrategy::Fixed { interval } => interval,
            BackoffStrategy::Exponential { base, max } => {
                let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
                base.saturating_mul(factor).min(max)
            }
        }
    }
}

/// Attempt budget plus backoff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    pub backoff: BackoffStrategy,
}

impl RetryPolicy {
    pub fn fixed(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff: BackoffStrategy::Fixed { interval },
        }
    }

    pub fn exponential(max_attempts: u32, base: Duration, max: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff: BackoffStrategy::Exponential { base, max },
        }
    }

    /// Fresh task for one submission
    pub fn task(&self) -> RetryTask {
        RetryTask {
            policy: *self,
            attempt: 0,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::from(&RetrySettings::default())
    }
}

impl From<&RetrySettings> for RetryPolicy {
    fn from(settings: &RetrySettings) -> Self {
        RetryPolicy::fixed(settings.max_attempts, Duration::from_millis(settings.delay_ms))
    }
}

/// What to do after a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    RetryAfter(Duration),
    Exhausted { attempts: u32 },
}

/// Attempt counter of one submission
#[derive(Debug, Clone)]
pub struct RetryTask {
    policy: RetryPolicy,
    attempt: u32,
}

impl RetryTask {
    /// Start the next attempt and return its 1-based number
    pub fn begin_attempt(&mut self) -> u32 {
        self.attempt += 1;
        self.attempt
    }

    /// Attempts started so far
    pub fn attempts(&self) -> u32 {
        self.attempt
    }

    pub fn on_failure(&self) -> RetryDecision {
        if self.attempt >= self.policy.max_attempts {
            RetryDecision::Exhausted {
                attempts: self.attempt,
            }
        } else {
            RetryDecision::RetryAfter(self.policy.backoff.delay_after(self.attempt))
        }
    }
}
