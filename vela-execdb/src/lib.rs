//! Vela Execution Database
//!
//! Durable append-only event logs, in-memory aggregate caches, and the
//! secondary indices that make execution state queryable. The logs are the
//! source of truth; everything else is rebuildable from them after a
//! restart.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod database;
pub mod error;
pub mod keys;
pub mod serializer;
pub mod store;

pub use config::ExecDbConfig;
pub use database::ExecutionDatabase;
pub use error::StoreError;
pub use keys::Key;
pub use serializer::{EventSerializer, JsonEventSerializer};
pub use store::{BackingStore, MemoryStore};
