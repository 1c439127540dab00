//! Client page registry seam.

use async_trait::async_trait;
use color_eyre::Result;
use tracing::info;

/// The set of pages under the worker's control.
///
/// The real platform owns the window list; this seam covers the two
/// operations the engine needs: claiming all open pages on activation and
/// opening a window for a notification's "view" action.
#[async_trait]
pub trait ClientRegistry: Send + Sync {
  /// Take control of all currently open pages so the new worker intercepts
  /// their requests immediately.
  async fn claim_all(&self) -> Result<()>;

  /// Navigate a client window to the given URL.
  async fn open_window(&self, url: &str) -> Result<()>;
}

/// Registry for terminal runs with no attached pages; both operations only
/// log.
pub struct DetachedClients;

#[async_trait]
impl ClientRegistry for DetachedClients {
  async fn claim_all(&self) -> Result<()> {
    info!("no attached clients to claim");
    Ok(())
  }

  async fn open_window(&self, url: &str) -> Result<()> {
    info!(url, "would open client window");
    Ok(())
  }
}
