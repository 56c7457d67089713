//! Sync engine, scheduler and snapshot store.
//!
//! This crate keeps the availability snapshot up to date:
//! - Concurrent retrieval of every department's feed
//! - Replace-in-full merge under a single write lock
//! - JSON persistence of the merged snapshot
//! - Background scheduling with backoff
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use roomcal_providers::FileFeedSource;
//! use roomcal_server::{JsonFileStore, SyncConfig, SyncEngine};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(JsonFileStore::with_default_key("/var/lib/roomcal"));
//!     let engine = SyncEngine::new(store, SyncConfig::default())
//!         .with_feed("dept-1", Arc::new(FileFeedSource::new("dept-1.ics")));
//!
//!     engine.restore().await?;
//!     let summary = engine.sync_once().await?;
//!     println!("{} blocked days", summary.blocked_days);
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod scheduler;
mod store;
mod sync;

pub use config::SyncConfig;
pub use error::{ServerError, ServerResult, StoreError};
pub use scheduler::{
    Scheduler, SchedulerCommand, SchedulerConfig, SchedulerHandle, SchedulerState,
    SharedSchedulerState, new_scheduler_state,
};
pub use store::{DEFAULT_KEY, JsonFileStore, MemoryStore, SnapshotStore};
pub use sync::{
    FeedBinding, FeedFailure, SharedSnapshot, SyncEngine, SyncSummary, new_shared_snapshot,
};
