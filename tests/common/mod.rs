//! Common test utilities and helpers
//!
//! This module provides shared utilities for all tests including:
//! - Record and configuration fixtures
//! - A scripted in-process remote
//! - A key-value store that can pause reads
//! - wiremock helpers for the HTTP endpoints
//! - Custom assertion macros

pub mod fixtures;
pub mod gated_store;
pub mod scripted_remote;

// Re-export commonly used utilities
pub use assertions::*;
pub use fixtures::*;
pub use gated_store::*;
pub use mock_server::*;
pub use scripted_remote::*;
