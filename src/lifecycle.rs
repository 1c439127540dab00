//! Worker lifecycle state machine.

use color_eyre::{eyre::eyre, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// States of the interception layer itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
  /// Install event in progress
  Installing,
  /// Installed, waiting to activate
  Installed,
  /// Activate event in progress
  Activating,
  /// Active and intercepting requests
  Active,
  /// Superseded by a newer installation
  Redundant,
}

impl WorkerState {
  fn can_transition_to(self, next: WorkerState) -> bool {
    use WorkerState::*;
    matches!(
      (self, next),
      (Installing, Installed)
        | (Installed, Activating)
        | (Activating, Active)
        // Forced takeover skips the waiting period
        | (Installing, Activating)
        | (_, Redundant)
    )
  }
}

/// Tracks the worker's lifecycle state and the skip-waiting request flag.
pub struct Lifecycle {
  state: Mutex<WorkerState>,
  skip_waiting: AtomicBool,
}

impl Lifecycle {
  pub fn new() -> Self {
    Self {
      state: Mutex::new(WorkerState::Installing),
      skip_waiting: AtomicBool::new(false),
    }
  }

  pub fn state(&self) -> WorkerState {
    *self.state.lock().unwrap_or_else(|e| e.into_inner())
  }

  /// Move to the next state, rejecting invalid transitions.
  pub fn advance(&self, next: WorkerState) -> Result<()> {
    let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
    if !state.can_transition_to(next) {
      return Err(eyre!("Invalid lifecycle transition {:?} -> {:?}", *state, next));
    }
    *state = next;
    Ok(())
  }

  /// Request immediate takeover without waiting for open pages to close.
  pub fn request_skip_waiting(&self) {
    self.skip_waiting.store(true, Ordering::SeqCst);
  }

  pub fn skip_waiting_requested(&self) -> bool {
    self.skip_waiting.load(Ordering::SeqCst)
  }

  /// Mark this worker as superseded by a newer installation.
  pub fn make_redundant(&self) {
    let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
    *state = WorkerState::Redundant;
  }
}

impl Default for Lifecycle {
  fn default() -> Self {
    Self::new()
  }
}
