//! Integration tests
//!
//! - `http_client_test`: wire shapes and error mapping against wiremock
//! - `orchestrator_test`: snapshot/patch branching and cache fallback
//! - `submitter_test`: optimistic writes, retry budget, supersede, cancel
//! - `persistence_test`: SQLite cache across reopen and unavailable storage
//! - `session_test`: full session over HTTP

pub mod persistence_test;
pub mod submitter_test;
