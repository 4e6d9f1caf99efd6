#![forbid(unsafe_code)]

//! Runtime: persistence, observers, and the drag session for TileGrid.
//!
//! # Role in TileGrid
//! `tilegrid-runtime` connects the pure `tilegrid-core` engine to its
//! collaborators. It owns the store and catalog seams, runs the
//! fire-and-forget commit worker, and exposes [`GridSession`] as the one
//! object a rendering layer talks to.
//!
//! # Key modules
//! - [`store`]: the ordered-list store trait plus an in-memory store.
//! - [`file_store`]: a JSON-file store with atomic rewrites.
//! - [`catalog`]: item content lookup and prefix search.
//! - [`commit`] / [`retry`]: background full-replace commits with one retry.
//! - [`observe`]: order-change callbacks.
//! - [`config`] / [`logging`]: configuration and subscriber setup.
//! - [`session`]: the glue.

pub mod catalog;
pub mod commit;
pub mod config;
pub mod file_store;
pub mod logging;
pub mod observe;
pub mod retry;
pub mod session;
pub mod store;

pub use catalog::{Catalog, CatalogItem, DEFAULT_SEARCH_LIMIT, MemoryCatalog};
pub use commit::{CommitOutcome, CommitRequest, CommitStatus, OrderCommitter, WorkerStopped};
pub use config::{
    CommitConfig, ConfigError, EngineConfig, GestureConfig, GridConfig, LoggingConfig,
};
pub use file_store::JsonFileStore;
pub use logging::LogFormat;
#[cfg(feature = "subscriber")]
pub use logging::init_subscriber;
pub use observe::{OrderObservers, Subscription};
pub use retry::{BackoffStrategy, RetryPolicy, replace_with_retry};
pub use session::{GridSession, SessionError};
pub use store::{MemoryStore, OrderStore, RankedEntry, StoreError, UserId};
