//! Push-triggered notifications.

use async_trait::async_trait;
use color_eyre::Result;
use serde::Deserialize;
use tracing::debug;

use crate::config::NotificationDefaults;

/// Action identifier for the navigation button.
pub const ACTION_VIEW: &str = "view";
/// Action identifier for the dismiss button.
pub const ACTION_CLOSE: &str = "close";

/// A user-facing alert about to be displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationIntent {
  pub title: String,
  pub body: String,
  pub icon: String,
  pub badge: String,
  pub tag: String,
  /// Where the "view" action navigates
  pub url: String,
  pub actions: Vec<NotificationAction>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationAction {
  pub action: String,
  pub title: String,
}

/// Structured fields a push payload may carry; everything is optional.
#[derive(Debug, Default, Deserialize)]
struct PushPayload {
  title: Option<String>,
  body: Option<String>,
  icon: Option<String>,
  url: Option<String>,
}

/// Build the intent for a push event.
///
/// Defaults come from configuration; fields present in a parseable payload
/// override them. An absent or malformed payload falls back to the defaults
/// unconditionally.
pub fn build_intent(defaults: &NotificationDefaults, payload: Option<&[u8]>) -> NotificationIntent {
  let payload = match payload {
    Some(raw) => match serde_json::from_slice::<PushPayload>(raw) {
      Ok(parsed) => parsed,
      Err(err) => {
        debug!("unparseable push payload, using defaults: {}", err);
        PushPayload::default()
      }
    },
    None => PushPayload::default(),
  };

  NotificationIntent {
    title: payload.title.unwrap_or_else(|| defaults.title.clone()),
    body: payload.body.unwrap_or_else(|| defaults.body.clone()),
    icon: payload.icon.unwrap_or_else(|| defaults.icon.clone()),
    badge: defaults.badge.clone(),
    tag: defaults.tag.clone(),
    url: payload.url.unwrap_or_else(|| defaults.url.clone()),
    actions: vec![
      NotificationAction {
        action: ACTION_VIEW.to_string(),
        title: "View".to_string(),
      },
      NotificationAction {
        action: ACTION_CLOSE.to_string(),
        title: "Close".to_string(),
      },
    ],
  }
}

/// A user interaction with a displayed notification.
#[derive(Debug, Clone)]
pub struct NotificationClick {
  /// Action button identifier; empty for a plain click on the body
  pub action: String,
  pub tag: String,
  /// Target URL carried by the displayed notification
  pub url: String,
}

/// Platform surface that displays and dismisses notifications.
#[async_trait]
pub trait NotificationSink: Send + Sync {
  async fn show(&self, intent: NotificationIntent) -> Result<()>;
  async fn close(&self, tag: &str) -> Result<()>;
}

/// Sink that only logs, for terminal runs without a notification surface.
pub struct LoggingSink;

#[async_trait]
impl NotificationSink for LoggingSink {
  async fn show(&self, intent: NotificationIntent) -> Result<()> {
    tracing::info!(title = %intent.title, body = %intent.body, url = %intent.url, "notification");
    Ok(())
  }

  async fn close(&self, tag: &str) -> Result<()> {
    tracing::info!(tag, "notification closed");
    Ok(())
  }
}
