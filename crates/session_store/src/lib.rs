//! Durable per-session snapshot persistence.
//!
//! The store has no policy: `load` always yields a normalized snapshot
//! (defaults when nothing usable is stored) and `save` writes the full
//! snapshot as JSON under one key per session.

mod error;
mod paths;
mod store;

pub use error::SessionStoreError;
pub use paths::{default_store_root, snapshot_file_name, STORAGE_PREFIX};
pub use store::{FileSnapshotStore, MemorySnapshotStore, SnapshotStore};
