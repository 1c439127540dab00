//! Cache store: named, versioned partitions of request-keyed response
//! snapshots.
//!
//! The store is the only shared mutable resource in the engine. Partitions are
//! addressed by immutable names and per-entry keys; concurrent writes to the
//! same key race with last-write-wins semantics, which is acceptable because
//! entries are idempotent snapshots of GET responses. Reads and writes against
//! a partition that has been deleted mid-flight degrade to misses rather than
//! errors.

mod memory;
mod sqlite;
mod traits;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{CacheStore, CachedResponse};
