//! # Offline-First Writes and Merges
//!
//! Everything that keeps local edits safe while the remote is slow or away.
//!
//! ## Key Components
//!
//! - `optimistic.rs`: optimistic record writes and their retry tasks
//! - `retry.rs`: retry budget and backoff strategies
//! - `reconciliation.rs`: snapshot and patch merge rules

pub mod optimistic;
pub mod reconciliation;
pub mod retry;

// Re-export main types
pub use optimistic::{SubmitHandle, UpdateSubmitter};
pub use reconciliation::{merge, MergeMode, MergeSummary};
pub use retry::{BackoffStrategy, RetryDecision, RetryPolicy, RetryTask};
