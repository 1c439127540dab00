//! Event host: delivers platform events to the worker.
//!
//! Events arrive over an mpsc channel and each one is handled in its own
//! spawned task, so events of the same type can run concurrently and nothing
//! orders a fetch against a concurrently-arriving activate. The host keeps
//! every outstanding task in a join set and drains it on shutdown, which is
//! the analogue of the platform's "extend the context's lifetime until the
//! work completes" rule.

use color_eyre::Result;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinSet;
use tracing::{debug, error};

use crate::http::Request;
use crate::notify::NotificationClick;
use crate::store::CacheStore;
use crate::strategy::ServedResponse;
use crate::worker::OfflineWorker;

/// A platform event delivered to the worker.
#[derive(Debug)]
pub enum WorkerEvent {
  Install,
  Activate,
  Fetch {
    request: Request,
    respond: oneshot::Sender<Result<ServedResponse>>,
  },
  Message(serde_json::Value),
  Sync {
    tag: String,
  },
  Push {
    payload: Option<Vec<u8>>,
  },
  NotificationClick(NotificationClick),
  Shutdown,
}

/// Runs the worker's event loop.
pub struct WorkerHost<S: CacheStore> {
  worker: Arc<OfflineWorker<S>>,
  rx: mpsc::UnboundedReceiver<WorkerEvent>,
}

impl<S: CacheStore + 'static> WorkerHost<S> {
  /// Create a host for the worker, returning the event sender the platform
  /// side uses to deliver events.
  pub fn new(worker: Arc<OfflineWorker<S>>) -> (Self, mpsc::UnboundedSender<WorkerEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Self { worker, rx }, tx)
  }

  /// Receive and dispatch events until the channel closes or a Shutdown
  /// event arrives, then wait for all in-flight handlers.
  pub async fn run(mut self) -> Result<()> {
    let mut in_flight = JoinSet::new();

    while let Some(event) = self.rx.recv().await {
      if matches!(event, WorkerEvent::Shutdown) {
        debug!("host: shutdown requested");
        break;
      }

      let worker = self.worker.clone();
      in_flight.spawn(async move {
        dispatch(worker, event).await;
      });

      // Reap already-finished handlers so the set stays small
      while in_flight.try_join_next().is_some() {}
    }

    while let Some(result) = in_flight.join_next().await {
      if let Err(err) = result {
        error!("host: event handler panicked: {}", err);
      }
    }

    Ok(())
  }
}

async fn dispatch<S: CacheStore>(worker: Arc<OfflineWorker<S>>, event: WorkerEvent) {
  match event {
    WorkerEvent::Install => {
      if let Err(err) = worker.handle_install().await {
        error!("install failed: {}", err);
      }
    }
    WorkerEvent::Activate => {
      if let Err(err) = worker.handle_activate().await {
        error!("activate failed: {}", err);
      }
    }
    WorkerEvent::Fetch { request, respond } => {
      let result = worker.handle_fetch(&request).await;
      // Requester may have gone away; that is not the worker's problem
      let _ = respond.send(result);
    }
    WorkerEvent::Message(payload) => {
      worker.handle_message(&payload);
    }
    WorkerEvent::Sync { tag } => {
      if let Err(err) = worker.handle_sync(&tag).await {
        error!(tag = %tag, "sync replay failed, platform will reschedule: {}", err);
      }
    }
    WorkerEvent::Push { payload } => {
      if let Err(err) = worker.handle_push(payload.as_deref()).await {
        error!("push handling failed: {}", err);
      }
    }
    WorkerEvent::NotificationClick(click) => {
      if let Err(err) = worker.handle_notification_click(&click).await {
        error!("notification click handling failed: {}", err);
      }
    }
    WorkerEvent::Shutdown => unreachable!("shutdown handled by the loop"),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::clients::DetachedClients;
  use crate::config::Config;
  use crate::http::{Request, ResponseSnapshot};
  use crate::network::NetworkClient;
  use crate::notify::LoggingSink;
  use crate::store::MemoryStore;
  use crate::strategy::ServeSource;
  use crate::sync::NoopReplay;
  use async_trait::async_trait;
  use url::Url;

  struct StaticNetwork;

  #[async_trait]
  impl NetworkClient for StaticNetwork {
    async fn fetch(&self, _request: &Request) -> Result<ResponseSnapshot> {
      Ok(ResponseSnapshot::basic_ok("hello"))
    }
  }

  fn worker() -> Arc<OfflineWorker<MemoryStore>> {
    let config = Config {
      origin: "https://app.test".to_string(),
      ..Config::default()
    };
    Arc::new(OfflineWorker::new(
      config,
      Arc::new(MemoryStore::new()),
      Arc::new(StaticNetwork),
      Arc::new(DetachedClients),
      Arc::new(LoggingSink),
      Arc::new(NoopReplay),
    ))
  }

  #[tokio::test]
  async fn test_fetch_event_round_trip() {
    let (host, tx) = WorkerHost::new(worker());
    let handle = tokio::spawn(host.run());

    let (respond, response) = oneshot::channel();
    tx.send(WorkerEvent::Fetch {
      request: Request::get(Url::parse("https://app.test/index.html").unwrap()),
      respond,
    })
    .unwrap();

    let served = response.await.unwrap().unwrap();
    assert_eq!(served.source, ServeSource::Network);
    assert_eq!(served.response.body, b"hello");

    tx.send(WorkerEvent::Shutdown).unwrap();
    handle.await.unwrap().unwrap();
  }

  #[tokio::test]
  async fn test_shutdown_drains_in_flight_work() {
    let w = worker();
    let (host, tx) = WorkerHost::new(w.clone());
    let handle = tokio::spawn(host.run());

    tx.send(WorkerEvent::Install).unwrap();
    tx.send(WorkerEvent::Shutdown).unwrap();
    handle.await.unwrap().unwrap();

    // Install ran to completion before the host returned
    assert!(w.lifecycle().skip_waiting_requested());
  }

  #[tokio::test]
  async fn test_closed_channel_ends_the_loop() {
    let (host, tx) = WorkerHost::new(worker());
    drop(tx);
    host.run().await.unwrap();
  }
}
