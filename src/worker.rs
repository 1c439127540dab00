//! The offline worker: one handler per platform event.
//!
//! Each `handle_*` method is the complete unit of work for its event; the
//! returned future is what a host must wait on before considering the event
//! settled (the "wait until done" contract). Handlers for distinct events may
//! run concurrently.

use color_eyre::{eyre::eyre, Result};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::classify::{classify, RequestClass};
use crate::clients::ClientRegistry;
use crate::config::Config;
use crate::http::Request;
use crate::lifecycle::{Lifecycle, WorkerState};
use crate::network::NetworkClient;
use crate::notify::{self, NotificationClick, NotificationSink, ACTION_VIEW};
use crate::store::CacheStore;
use crate::strategy::{ServedResponse, StrategyExecutor};
use crate::sync::SyncReplay;

/// Control messages the host page may post to the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMessage {
  /// Force immediate takeover without waiting for open pages to close
  SkipWaiting,
}

impl ControlMessage {
  /// Parse the page's message payload; only `{"type": "SKIP_WAITING"}` is
  /// recognized.
  pub fn parse(value: &serde_json::Value) -> Option<Self> {
    match value.get("type").and_then(|t| t.as_str()) {
      Some("SKIP_WAITING") => Some(Self::SkipWaiting),
      _ => None,
    }
  }
}

/// The request-interception and offline-cache engine.
///
/// Generic over the cache store; the network, client registry, notification
/// surface and sync replay are trait objects so tests can substitute fakes
/// individually.
pub struct OfflineWorker<S: CacheStore> {
  config: Config,
  store: Arc<S>,
  strategy: StrategyExecutor<S>,
  lifecycle: Arc<Lifecycle>,
  network: Arc<dyn NetworkClient>,
  clients: Arc<dyn ClientRegistry>,
  notifier: Arc<dyn NotificationSink>,
  replay: Arc<dyn SyncReplay>,
}

impl<S: CacheStore> OfflineWorker<S> {
  pub fn new(
    config: Config,
    store: Arc<S>,
    network: Arc<dyn NetworkClient>,
    clients: Arc<dyn ClientRegistry>,
    notifier: Arc<dyn NotificationSink>,
    replay: Arc<dyn SyncReplay>,
  ) -> Self {
    let strategy = StrategyExecutor::new(
      store.clone(),
      network.clone(),
      config.shell_partition.clone(),
      config.api_partition.clone(),
    );

    Self {
      config,
      store,
      strategy,
      lifecycle: Arc::new(Lifecycle::new()),
      network,
      clients,
      notifier,
      replay,
    }
  }

  pub fn config(&self) -> &Config {
    &self.config
  }

  pub fn state(&self) -> WorkerState {
    self.lifecycle.state()
  }

  pub fn lifecycle(&self) -> &Lifecycle {
    &self.lifecycle
  }

  /// Install: precache the shell asset list, then request immediate takeover.
  ///
  /// Precache failure is logged and install still completes; assets fetched
  /// before the failure stay cached.
  pub async fn handle_install(&self) -> Result<()> {
    info!(partition = %self.config.shell_partition, "install: caching app shell");

    if let Err(err) = self.precache_shell().await {
      warn!("install: shell precache failed: {}", err);
    }

    // Take over without waiting for existing pages to close
    self.lifecycle.request_skip_waiting();
    self.lifecycle.advance(WorkerState::Installed)?;
    Ok(())
  }

  async fn precache_shell(&self) -> Result<()> {
    for asset in &self.config.shell_assets {
      let url = self.config.asset_url(asset)?;
      let request = Request::get(url);

      let response = self
        .network
        .fetch(&request)
        .await
        .map_err(|err| eyre!("asset '{}' fetch failed: {}", asset, err))?;
      if !response.is_ok() {
        return Err(eyre!("asset '{}' returned status {}", asset, response.status));
      }

      self
        .store
        .put(&self.config.shell_partition, &request.key(), &response)?;
      debug!(asset = %asset, "precached");
    }
    Ok(())
  }

  /// Activate: evict every stale partition, then claim all open clients.
  pub async fn handle_activate(&self) -> Result<()> {
    self.lifecycle.advance(WorkerState::Activating)?;

    for name in self.store.list_partitions()? {
      if name != self.config.shell_partition && name != self.config.api_partition {
        info!(partition = %name, "activate: deleting stale partition");
        self.store.delete_partition(&name)?;
      }
    }

    self.clients.claim_all().await?;
    self.lifecycle.advance(WorkerState::Active)?;
    info!("activate: worker active");
    Ok(())
  }

  /// Fetch: classify the request and apply the matching strategy.
  pub async fn handle_fetch(&self, request: &Request) -> Result<ServedResponse> {
    match classify(request, &self.config.api_prefix) {
      RequestClass::Api => self.strategy.network_first(request).await,
      RequestClass::Shell => self.strategy.cache_first(request).await,
    }
  }

  /// Message: a single recognized control message; everything else is
  /// ignored.
  pub fn handle_message(&self, payload: &serde_json::Value) {
    match ControlMessage::parse(payload) {
      Some(ControlMessage::SkipWaiting) => {
        info!("message: skip waiting requested by page");
        self.lifecycle.request_skip_waiting();
      }
      None => debug!(%payload, "message: ignoring unrecognized payload"),
    }
  }

  /// Sync: run the replay routine when the registered tag fires.
  ///
  /// A replay failure propagates so the platform reschedules the attempt;
  /// there is no local retry.
  pub async fn handle_sync(&self, tag: &str) -> Result<()> {
    if tag != self.config.sync_tag {
      debug!(tag, "sync: ignoring unknown tag");
      return Ok(());
    }

    info!(tag, "sync: replaying deferred requests");
    self.replay.replay().await
  }

  /// Push: display a notification built from defaults and the payload.
  pub async fn handle_push(&self, payload: Option<&[u8]>) -> Result<()> {
    let intent = notify::build_intent(&self.config.notifications, payload);
    info!(title = %intent.title, "push: showing notification");
    self.notifier.show(intent).await
  }

  /// Notification click: close first, then dispatch the action.
  pub async fn handle_notification_click(&self, click: &NotificationClick) -> Result<()> {
    self.notifier.close(&click.tag).await?;

    if click.action == ACTION_VIEW {
      self.clients.open_window(&click.url).await?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::http::{Method, ResponseKind, ResponseSnapshot};
  use crate::notify::NotificationIntent;
  use crate::store::MemoryStore;
  use crate::strategy::ServeSource;
  use crate::sync::NoopReplay;
  use async_trait::async_trait;
  use std::collections::HashMap;
  use std::sync::Mutex;
  use url::Url;

  /// Network fake mapping URL paths to responses; unmapped paths fail.
  struct RoutedNetwork {
    routes: Mutex<HashMap<String, ResponseSnapshot>>,
    offline: Mutex<bool>,
  }

  impl RoutedNetwork {
    fn new() -> Arc<Self> {
      Arc::new(Self {
        routes: Mutex::new(HashMap::new()),
        offline: Mutex::new(false),
      })
    }

    fn route(&self, path: &str, response: ResponseSnapshot) {
      self.routes.lock().unwrap().insert(path.to_string(), response);
    }

    fn go_offline(&self) {
      *self.offline.lock().unwrap() = true;
    }
  }

  #[async_trait]
  impl NetworkClient for RoutedNetwork {
    async fn fetch(&self, request: &Request) -> Result<ResponseSnapshot> {
      if *self.offline.lock().unwrap() {
        return Err(eyre!("network unreachable"));
      }
      self
        .routes
        .lock()
        .unwrap()
        .get(request.path())
        .cloned()
        .ok_or_else(|| eyre!("no route for {}", request.path()))
    }
  }

  #[derive(Default)]
  struct RecordingClients {
    claimed: Mutex<bool>,
    opened: Mutex<Vec<String>>,
  }

  #[async_trait]
  impl ClientRegistry for RecordingClients {
    async fn claim_all(&self) -> Result<()> {
      *self.claimed.lock().unwrap() = true;
      Ok(())
    }

    async fn open_window(&self, url: &str) -> Result<()> {
      self.opened.lock().unwrap().push(url.to_string());
      Ok(())
    }
  }

  #[derive(Default)]
  struct RecordingSink {
    shown: Mutex<Vec<NotificationIntent>>,
    closed: Mutex<Vec<String>>,
  }

  #[async_trait]
  impl NotificationSink for RecordingSink {
    async fn show(&self, intent: NotificationIntent) -> Result<()> {
      self.shown.lock().unwrap().push(intent);
      Ok(())
    }

    async fn close(&self, tag: &str) -> Result<()> {
      self.closed.lock().unwrap().push(tag.to_string());
      Ok(())
    }
  }

  struct FailingReplay;

  #[async_trait]
  impl SyncReplay for FailingReplay {
    async fn replay(&self) -> Result<()> {
      Err(eyre!("backend still unreachable"))
    }
  }

  struct Harness {
    worker: OfflineWorker<MemoryStore>,
    store: Arc<MemoryStore>,
    network: Arc<RoutedNetwork>,
    clients: Arc<RecordingClients>,
    sink: Arc<RecordingSink>,
  }

  fn harness_with(config: Config, replay: Arc<dyn SyncReplay>) -> Harness {
    let store = Arc::new(MemoryStore::new());
    let network = RoutedNetwork::new();
    let clients = Arc::new(RecordingClients::default());
    let sink = Arc::new(RecordingSink::default());

    let worker = OfflineWorker::new(
      config,
      store.clone(),
      network.clone(),
      clients.clone(),
      sink.clone(),
      replay,
    );

    Harness {
      worker,
      store,
      network,
      clients,
      sink,
    }
  }

  fn harness(config: Config) -> Harness {
    harness_with(config, Arc::new(NoopReplay))
  }

  fn config() -> Config {
    Config {
      origin: "https://app.test".to_string(),
      shell_partition: "shell-v2".to_string(),
      api_partition: "api-v1".to_string(),
      shell_assets: vec!["/".to_string(), "/a.js".to_string()],
      ..Config::default()
    }
  }

  fn get(url: &str) -> Request {
    Request::get(Url::parse(url).unwrap())
  }

  #[tokio::test]
  async fn test_install_precaches_shell() {
    let h = harness(config());
    h.network.route("/", ResponseSnapshot::basic_ok("<html>"));
    h.network.route("/a.js", ResponseSnapshot::basic_ok("js"));

    h.worker.handle_install().await.unwrap();

    assert_eq!(h.worker.state(), WorkerState::Installed);
    assert!(h.worker.lifecycle().skip_waiting_requested());
    assert_eq!(h.store.partition_len("shell-v2").unwrap(), 2);
  }

  #[tokio::test]
  async fn test_install_survives_partial_precache_failure() {
    let h = harness(config());
    // "/a.js" has no route, so its fetch fails
    h.network.route("/", ResponseSnapshot::basic_ok("<html>"));

    h.worker.handle_install().await.unwrap();
    assert_eq!(h.worker.state(), WorkerState::Installed);

    let root = get("https://app.test/").key();
    let missing = get("https://app.test/a.js").key();
    assert!(h.store.get("shell-v2", &root).unwrap().is_some());
    assert!(h.store.get("shell-v2", &missing).unwrap().is_none());
  }

  #[tokio::test]
  async fn test_activate_prunes_only_stale_partitions() {
    let h = harness(config());
    let k = get("https://app.test/x").key();
    h.store.put("shell-v1", &k, &ResponseSnapshot::basic_ok("old")).unwrap();
    h.store.put("shell-v2", &k, &ResponseSnapshot::basic_ok("current")).unwrap();
    h.store.put("api-v1", &k, &ResponseSnapshot::basic_ok("api")).unwrap();

    h.worker.lifecycle().advance(WorkerState::Installed).unwrap();
    h.worker.handle_activate().await.unwrap();

    assert_eq!(h.store.list_partitions().unwrap(), vec!["api-v1", "shell-v2"]);
    assert_eq!(h.store.partition_len("shell-v2").unwrap(), 1);
    assert!(*h.clients.claimed.lock().unwrap());
    assert_eq!(h.worker.state(), WorkerState::Active);
  }

  #[tokio::test]
  async fn test_fetch_routes_api_network_first() {
    let h = harness(config());
    h.network
      .route("/api/user/profile", ResponseSnapshot::basic_ok("profile"));

    let served = h
      .worker
      .handle_fetch(&get("https://app.test/api/user/profile"))
      .await
      .unwrap();
    assert_eq!(served.source, ServeSource::Network);

    // Simulated network failure: the stored snapshot is served unchanged
    h.network.go_offline();
    let offline = h
      .worker
      .handle_fetch(&get("https://app.test/api/user/profile"))
      .await
      .unwrap();
    assert_eq!(offline.source, ServeSource::Offline);
    assert_eq!(offline.response.body, b"profile");
  }

  #[tokio::test]
  async fn test_fetch_routes_shell_cache_first() {
    let h = harness(config());
    h.network.route("/main.css", ResponseSnapshot::basic_ok("css"));

    let first = h
      .worker
      .handle_fetch(&get("https://app.test/main.css"))
      .await
      .unwrap();
    assert_eq!(first.source, ServeSource::Network);

    h.network.go_offline();
    let second = h
      .worker
      .handle_fetch(&get("https://app.test/main.css"))
      .await
      .unwrap();
    assert_eq!(second.source, ServeSource::Cache);
  }

  #[tokio::test]
  async fn test_fetch_post_bypasses_cache() {
    let h = harness(config());
    h.network.route(
      "/api/feedback",
      ResponseSnapshot::new(200, ResponseKind::Basic, b"ok".to_vec()),
    );

    let req = Request::new(
      Method::Post,
      Url::parse("https://app.test/api/feedback").unwrap(),
    );
    h.worker.handle_fetch(&req).await.unwrap();

    assert!(h.store.list_partitions().unwrap().is_empty());
  }

  #[tokio::test]
  async fn test_message_skip_waiting() {
    let h = harness(config());
    assert!(!h.worker.lifecycle().skip_waiting_requested());

    h.worker
      .handle_message(&serde_json::json!({"type": "SKIP_WAITING"}));
    assert!(h.worker.lifecycle().skip_waiting_requested());
  }

  #[tokio::test]
  async fn test_message_unknown_is_ignored() {
    let h = harness(config());
    h.worker.handle_message(&serde_json::json!({"type": "OTHER"}));
    h.worker.handle_message(&serde_json::json!(42));
    assert!(!h.worker.lifecycle().skip_waiting_requested());
  }

  #[tokio::test]
  async fn test_sync_matching_tag_runs_replay() {
    let h = harness(config());
    h.worker.handle_sync("sync-suggestions").await.unwrap();
    h.worker.handle_sync("some-other-tag").await.unwrap();
  }

  #[tokio::test]
  async fn test_sync_replay_failure_propagates() {
    let h = harness_with(config(), Arc::new(FailingReplay));
    assert!(h.worker.handle_sync("sync-suggestions").await.is_err());
    // Unmatched tags never reach the failing replay
    h.worker.handle_sync("unrelated").await.unwrap();
  }

  #[tokio::test]
  async fn test_push_payload_overrides_and_click_navigates() {
    let h = harness(config());
    let payload = br#"{"body": "X", "url": "/y"}"#;

    h.worker.handle_push(Some(payload)).await.unwrap();

    let shown = h.sink.shown.lock().unwrap().clone();
    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0].body, "X");
    assert_eq!(shown[0].url, "/y");

    let click = NotificationClick {
      action: ACTION_VIEW.to_string(),
      tag: shown[0].tag.clone(),
      url: shown[0].url.clone(),
    };
    h.worker.handle_notification_click(&click).await.unwrap();

    assert_eq!(*h.clients.opened.lock().unwrap(), vec!["/y".to_string()]);
    // Close happens before the action is dispatched
    assert_eq!(h.sink.closed.lock().unwrap().len(), 1);
  }

  #[tokio::test]
  async fn test_close_action_does_not_navigate() {
    let h = harness(config());
    let click = NotificationClick {
      action: "close".to_string(),
      tag: "swgate-notification".to_string(),
      url: "/dashboard".to_string(),
    };
    h.worker.handle_notification_click(&click).await.unwrap();

    assert!(h.clients.opened.lock().unwrap().is_empty());
    assert_eq!(h.sink.closed.lock().unwrap().len(), 1);
  }
}
