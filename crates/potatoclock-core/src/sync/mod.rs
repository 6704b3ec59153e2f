//! Sync adapter contract and the bundled document stores.
//!
//! The activity store talks to durable storage only through
//! [`SyncAdapter`]: full-collection snapshot subscriptions plus
//! record-level merge, replace and delete.

mod fanout;
pub mod memory;
pub mod sqlite;
pub mod types;

pub use memory::MemoryAdapter;
pub use sqlite::SqliteAdapter;
pub use types::{
    sanitize, CollectionKind, CollectionPath, Document, PutMode, Snapshot, SnapshotStream,
    SyncAdapter, SyncError, SyncRecord, WriteOp,
};
