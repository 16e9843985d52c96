//! Shared Error Types
//!
//! This module defines the error taxonomy used by every part of the sync core.
//! Read-path failures (version, snapshot, patch) are swallowed by the
//! orchestrator when cached data exists, write-path failures are retried and
//! then surfaced per record, storage failures degrade to warnings.
//!
//! # Error Categories
//!
//! - `Network` - transport or HTTP status failure
//! - `DataFormat` - unexpected or missing fields in a payload
//! - `Storage` - persistent cache unavailable or rejecting writes
//! - `SyncExhausted` - terminal, a write ran out of attempts
//! - `UpdateRejected` - the update endpoint answered `success: false`
//! - `Cancelled` - the owning session was torn down
//!
//! # Usage
//!
//! ```rust
//! use disconnect_sync::shared::error::SyncError;
//!
//! let error = SyncError::network("connection refused");
//! assert!(error.is_transient());
//! ```
use thiserror::Error;

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, SyncError>;

/// Errors raised by the sync core
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SyncError {
    /// Transport or HTTP failure talking to the remote source
    #[error("Network error: {message}")]
    Network {
        /// Human-readable error message
        message: String,
    },

    /// Response or cached payload did not have the expected shape
    #[error("Data format error: {message}")]
    DataFormat {
        /// Human-readable error message
        message: String,
    },

    /// Persistent cache unavailable or quota exceeded
    #[error("Storage error: {message}")]
    Storage {
        /// Human-readable error message
        message: String,
    },

    /// A record write used its whole retry budget
    #[error("Sync exhausted for record '{record_id}' after {attempts} attempts")]
    SyncExhausted {
        /// Record that could not be written
        record_id: String,
        /// Attempts performed before giving up
        attempts: u32,
    },

    /// Update endpoint answered but refused the write
    #[error("Update rejected: {message}")]
    UpdateRejected {
        /// Message reported by the remote, if any
        message: String,
    },

    /// The owning session was cancelled while the operation was pending
    #[error("Operation cancelled")]
    Cancelled,
}

impl SyncError {
    /// Create a new network error
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create a new data format error
    pub fn data_format(message: impl Into<String>) -> Self {
        Self::DataFormat {
            message: message.into(),
        }
    }

    /// Create a new storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Create a new rejected-update error
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::UpdateRejected {
            message: message.into(),
        }
    }

    /// Create the terminal error for a record write
    pub fn exhausted(record_id: impl Into<String>, attempts: u32) -> Self {
        Self::SyncExhausted {
            record_id: record_id.into(),
            attempts,
        }
    }

    /// Whether another attempt of the same operation may succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Network { .. } | Self::UpdateRejected { .. } | Self::DataFormat { .. }
        )
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        Self::data_format(format!("JSON error: {}", err))
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::data_format(format!("Failed to parse response: {}", err))
        } else {
            Self::network(err.to_string())
        }
    }
}

impl From<sqlx::Error> for SyncError {
    fn from(err: sqlx::Error) -> Self {
        Self::storage(err.to_string())
    }
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        Self::storage(err.to_string())
    }
}
