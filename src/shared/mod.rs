//! Shared Module
//!
//! Platform-agnostic types of the sync core: ledger records, datasets and
//! version markers, the error taxonomy, and application configuration. None
//! of these types perform I/O.

/// Ledger record and its local sync state
pub mod record;

/// Dataset kinds, datasets, version markers and patch windows
pub mod dataset;

/// Shared error types
pub mod error;

/// Application configuration
pub mod config;

/// Re-export commonly used types for convenience
pub use record::{Amount, Record, RecordFields, SyncState};
pub use dataset::{Dataset, DatasetKind, PatchWindow, VersionMarker};
pub use error::{Result, SyncError};
pub use config::{AppConfig, AppConfigBuilder, ConfigError, RetrySettings, TimingSettings};
