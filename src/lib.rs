//! swgate: an offline-first request interception and cache engine.
//!
//! The engine mirrors a browser service worker: it owns named, versioned
//! cache partitions, classifies intercepted requests into network-first (API)
//! or cache-first (app shell) strategies, manages its own install/activate
//! lifecycle, replays deferred work when connectivity returns, and dispatches
//! push-triggered notifications. Every platform surface (network, client
//! pages, notifications, sync replay) is a trait seam so the whole engine runs
//! under test without a browser runtime.

pub mod classify;
pub mod clients;
pub mod config;
pub mod host;
pub mod http;
pub mod lifecycle;
pub mod network;
pub mod notify;
pub mod store;
pub mod strategy;
pub mod sync;
pub mod worker;

pub use config::Config;
pub use http::{Method, Request, RequestKey, ResponseKind, ResponseSnapshot};
pub use store::{CacheStore, MemoryStore, SqliteStore};
pub use strategy::{ServeSource, ServedResponse};
pub use worker::OfflineWorker;
