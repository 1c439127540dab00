//! Strategy executor: network-first and cache-first request handling.

use color_eyre::Result;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::http::{Request, ResponseKind, ResponseSnapshot};
use crate::network::NetworkClient;
use crate::store::CacheStore;

/// Where a served response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServeSource {
  /// Fresh data from network
  Network,
  /// Cache hit, no network round-trip attempted
  Cache,
  /// Network failed, serving last-known-good snapshot
  Offline,
}

/// A response served to the interception caller, with provenance.
#[derive(Debug, Clone)]
pub struct ServedResponse {
  pub response: ResponseSnapshot,
  pub source: ServeSource,
}

impl ServedResponse {
  fn network(response: ResponseSnapshot) -> Self {
    Self {
      response,
      source: ServeSource::Network,
    }
  }

  fn cached(response: ResponseSnapshot) -> Self {
    Self {
      response,
      source: ServeSource::Cache,
    }
  }

  fn offline(response: ResponseSnapshot) -> Self {
    Self {
      response,
      source: ServeSource::Offline,
    }
  }
}

/// Applies the chosen caching strategy and writes results back into the
/// appropriate partition.
///
/// Cache writes are fire-and-forget relative to the returned response: a
/// storage failure is logged and never fails the request that produced it.
pub struct StrategyExecutor<S: CacheStore> {
  store: Arc<S>,
  network: Arc<dyn NetworkClient>,
  shell_partition: String,
  api_partition: String,
}

impl<S: CacheStore> StrategyExecutor<S> {
  pub fn new(
    store: Arc<S>,
    network: Arc<dyn NetworkClient>,
    shell_partition: impl Into<String>,
    api_partition: impl Into<String>,
  ) -> Self {
    Self {
      store,
      network,
      shell_partition: shell_partition.into(),
      api_partition: api_partition.into(),
    }
  }

  /// Network-first: prefer a live response, refresh the API partition on a
  /// cacheable success, fall back to the partition only when the network
  /// fails.
  pub async fn network_first(&self, request: &Request) -> Result<ServedResponse> {
    match self.network.fetch(request).await {
      Ok(response) => {
        if request.method.is_cacheable() && response.is_ok() {
          self.store_quietly(&self.api_partition, request, &response);
        }
        Ok(ServedResponse::network(response))
      }
      Err(err) => {
        if request.method.is_cacheable() {
          if let Ok(Some(cached)) = self.store.get(&self.api_partition, &request.key()) {
            debug!(url = %request.url, "network failed, serving cached API response");
            return Ok(ServedResponse::offline(cached.response));
          }
        }
        // Nothing cached: the failure propagates, no synthetic response
        Err(err)
      }
    }
  }

  /// Cache-first: serve a hit without touching the network; on a miss, fetch
  /// and self-heal the shell partition when the response qualifies.
  pub async fn cache_first(&self, request: &Request) -> Result<ServedResponse> {
    if request.method.is_cacheable() {
      if let Ok(Some(cached)) = self.store.match_any(&request.key()) {
        return Ok(ServedResponse::cached(cached.response));
      }
    }

    let response = self.network.fetch(request).await?;

    // Never cache error pages, redirects or cross-origin responses
    if request.method.is_cacheable() && response.is_ok() && response.kind == ResponseKind::Basic {
      self.store_quietly(&self.shell_partition, request, &response);
    }

    Ok(ServedResponse::network(response))
  }

  fn store_quietly(&self, partition: &str, request: &Request, response: &ResponseSnapshot) {
    if let Err(err) = self.store.put(partition, &request.key(), response) {
      warn!(partition, url = %request.url, "cache write failed: {}", err);
    }
  }
}
