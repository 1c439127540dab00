//! Storage trait for cache partitions.

use chrono::{DateTime, Utc};
use color_eyre::Result;

use crate::http::{RequestKey, ResponseSnapshot};

/// A snapshot retrieved from a partition, with its storage timestamp.
#[derive(Debug, Clone)]
pub struct CachedResponse {
  pub response: ResponseSnapshot,
  pub stored_at: DateTime<Utc>,
}

/// Trait for cache store backends.
///
/// All operations tolerate absent partitions: a `get` against a partition that
/// does not (or no longer) exists is a miss, a `delete_partition` of a missing
/// partition reports `false`, and a `put` creates the partition on demand.
pub trait CacheStore: Send + Sync {
  /// Store a snapshot, overwriting any previous entry for the key.
  fn put(&self, partition: &str, key: &RequestKey, snapshot: &ResponseSnapshot) -> Result<()>;

  /// Look up a snapshot in a specific partition.
  fn get(&self, partition: &str, key: &RequestKey) -> Result<Option<CachedResponse>>;

  /// Look up a snapshot across all partitions, in partition-name order.
  fn match_any(&self, key: &RequestKey) -> Result<Option<CachedResponse>>;

  /// Names of all existing partitions.
  fn list_partitions(&self) -> Result<Vec<String>>;

  /// Delete a partition and all its entries. Returns whether it existed.
  fn delete_partition(&self, partition: &str) -> Result<bool>;

  /// Number of entries in a partition; 0 if the partition does not exist.
  fn partition_len(&self, partition: &str) -> Result<usize>;
}
