//! Disconnect Sync - Main Library
//!
//! Offline-first synchronization core of the disconnection-ledger dashboard.
//! Field agencies track and update disconnection actions against a consumer
//! ledger kept in spreadsheets; this crate keeps a local copy of that ledger
//! usable while the remote is slow or unreachable.
//!
//! # Overview
//!
//! - A persistent local cache gives instant data on start
//! - A cheap row-count check decides between a full snapshot and a patch of
//!   recent changes
//! - Snapshots never overwrite records whose local edit is still pending
//! - Edits are applied optimistically and retried a bounded number of times
//!
//! The same core drives two datasets: the consumer list and the deemed visit
//! list.
//!
//! # Module Structure
//!
//! - **`shared`** - Records, datasets, version markers, errors, configuration
//!   - No I/O
//!
//! - **`client`** - Everything that talks to the cache or the remote
//!   - SQLite cache, HTTP client
//!   - Orchestrator, reconciler, update submitter
//!   - `SyncSession`, the per-session owner
//!
//! # Usage
//!
//! ```rust,no_run
//! use disconnect_sync::client::{Config, SyncSession};
//! use disconnect_sync::shared::{DatasetKind, Record};
//!
//! # async fn example() -> disconnect_sync::shared::Result<()> {
//! let session = SyncSession::start(Config::new()).await?;
//! for (kind, result) in session.refresh_all().await {
//!     println!("{}: {:?}", kind, result);
//! }
//!
//! let edited = Record::new("C1").with_status("disconnected");
//! let handle = session.submit(DatasetKind::Consumers, edited).await;
//! handle.outcome().await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! - Datasets are published as `Arc<Dataset>` through `tokio::sync::watch`
//! - Writers serialize on a per-dataset lock; readers never block
//! - A session-wide cancellation token stops passes and retry tasks
//!
//! # Error Handling
//!
//! - `shared::error::SyncError` for every sync failure
//! - `shared::config::ConfigError` for configuration problems
//! - Cache failures are logged and never surface as errors

/// Shared types and data structures
pub mod shared;

/// Cache, remote client and sync machinery
pub mod client;
