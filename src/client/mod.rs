//! Client Sync Module
//!
//! The offline-first sync core consumed by the dashboard UI.
//!
//! # Architecture
//!
//! - **`config`** - Endpoint URLs and client configuration
//! - **`types`** - Wire shapes of the version and update endpoints
//! - **`remote_client`** - `RemoteSource` trait and its HTTP implementation
//! - **`local_db`** - SQLite-backed persistent cache
//! - **`state`** - Per-dataset in-memory view and status signals
//! - **`offline`** - Optimistic writes, retry and merge rules
//! - **`sync`** - Orchestrator, scheduler, cancellation and metrics
//! - **`session`** - Owner of all of the above for one session
//! - **`main`** - Headless `sync_agent` runner (binary)
//!
//! # Example
//!
//! ```rust,no_run
//! use disconnect_sync::client::{Config, SyncSession};
//! use disconnect_sync::shared::DatasetKind;
//!
//! # async fn example() -> disconnect_sync::shared::Result<()> {
//! let session = SyncSession::start(Config::new()).await?;
//! session.refresh(DatasetKind::Consumers).await?;
//! let consumers = session.dataset(DatasetKind::Consumers).snapshot();
//! println!("{} consumers", consumers.len());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod local_db;
pub mod offline;
pub mod remote_client;
pub mod session;
pub mod state;
pub mod sync;
pub mod types;

// Re-export commonly used types
pub use config::{Config, Endpoint};
pub use local_db::{KeyValueStore, LocalCache, LocalDatabase, MemoryStore};
pub use offline::{SubmitHandle, UpdateSubmitter};
pub use remote_client::{HttpRemote, RemoteSource};
pub use session::SyncSession;
pub use state::DatasetState;
pub use sync::{CancelToken, SyncOrchestrator, SyncOutcome, SyncStatus};
