//! In-memory cache store, used by tests and short-lived tooling runs.

use chrono::Utc;
use color_eyre::{eyre::eyre, Result};
use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::http::{RequestKey, ResponseSnapshot};

use super::traits::{CacheStore, CachedResponse};

type Partition = BTreeMap<String, CachedResponse>;

/// Cache store holding all partitions in process memory.
#[derive(Default)]
pub struct MemoryStore {
  // BTreeMap keeps list_partitions and match_any deterministic
  partitions: Mutex<BTreeMap<String, Partition>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, Partition>>> {
    self
      .partitions
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))
  }
}

impl CacheStore for MemoryStore {
  fn put(&self, partition: &str, key: &RequestKey, snapshot: &ResponseSnapshot) -> Result<()> {
    let mut partitions = self.lock()?;
    let entries = partitions.entry(partition.to_string()).or_default();
    entries.insert(
      key.canonical(),
      CachedResponse {
        response: snapshot.clone(),
        stored_at: Utc::now(),
      },
    );
    Ok(())
  }

  fn get(&self, partition: &str, key: &RequestKey) -> Result<Option<CachedResponse>> {
    let partitions = self.lock()?;
    Ok(
      partitions
        .get(partition)
        .and_then(|entries| entries.get(&key.canonical()))
        .cloned(),
    )
  }

  fn match_any(&self, key: &RequestKey) -> Result<Option<CachedResponse>> {
    let partitions = self.lock()?;
    let canonical = key.canonical();
    for entries in partitions.values() {
      if let Some(cached) = entries.get(&canonical) {
        return Ok(Some(cached.clone()));
      }
    }
    Ok(None)
  }

  fn list_partitions(&self) -> Result<Vec<String>> {
    let partitions = self.lock()?;
    Ok(partitions.keys().cloned().collect())
  }

  fn delete_partition(&self, partition: &str) -> Result<bool> {
    let mut partitions = self.lock()?;
    Ok(partitions.remove(partition).is_some())
  }

  fn partition_len(&self, partition: &str) -> Result<usize> {
    let partitions = self.lock()?;
    Ok(partitions.get(partition).map_or(0, |entries| entries.len()))
  }
}
