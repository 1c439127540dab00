//! Deferred task queue: background-sync replay.
//!
//! The engine registers interest in a single replay tag. When the platform
//! signals restored connectivity with a matching tag, the replay routine runs
//! once; a failure propagates so the platform can reschedule per its own
//! retry policy. There is no local retry or backoff, and no persistent queue
//! of deferred requests: implementors needing one provide their own
//! [`SyncReplay`].

use async_trait::async_trait;
use color_eyre::Result;
use tracing::debug;

/// Replay routine invoked when a matching sync tag fires.
#[async_trait]
pub trait SyncReplay: Send + Sync {
  /// Replay deferred work. Must resolve Ok when there is nothing to replay
  /// and surface an error when replay fails.
  async fn replay(&self) -> Result<()>;
}

/// Default replay routine: nothing is queued, so there is nothing to do.
pub struct NoopReplay;

#[async_trait]
impl SyncReplay for NoopReplay {
  async fn replay(&self) -> Result<()> {
    debug!("no deferred requests queued, sync complete");
    Ok(())
  }
}
