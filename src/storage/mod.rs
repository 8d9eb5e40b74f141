//! Durable local storage.
//!
//! The only persisted state is the active session snapshot, so storage is a
//! plain key/value [`SnapshotStore`]:
//!
//! - [`FileSnapshotStore`] keeps one JSON file per key in the data directory
//! - [`MemorySnapshotStore`] keeps everything in memory

mod snapshot;

pub use snapshot::{
    validate_key, FileSnapshotStore, MemorySnapshotStore, Result, SnapshotStore, StorageError,
};
