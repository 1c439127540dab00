use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Worker configuration.
///
/// Partition names, the shell asset list and the API prefix are explicit
/// configuration rather than constants, so the engine can run against fake
/// names and asset lists in tests.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  /// Base origin the worker serves, e.g. "https://app.example.com"
  pub origin: String,
  /// Version-qualified name of the application-shell partition
  #[serde(default = "default_shell_partition")]
  pub shell_partition: String,
  /// Version-qualified name of the API-response partition
  #[serde(default = "default_api_partition")]
  pub api_partition: String,
  /// Asset paths precached on install for offline boot
  #[serde(default)]
  pub shell_assets: Vec<String>,
  /// Path prefix routed through the network-first strategy
  #[serde(default = "default_api_prefix")]
  pub api_prefix: String,
  /// API paths worth having offline; listed in `status` output
  #[serde(default)]
  pub offline_api_paths: Vec<String>,
  /// Background-sync tag that triggers deferred replay
  #[serde(default = "default_sync_tag")]
  pub sync_tag: String,
  #[serde(default)]
  pub store: StoreConfig,
  #[serde(default)]
  pub notifications: NotificationDefaults,
}

fn default_shell_partition() -> String {
  "app-shell-v1".to_string()
}

fn default_api_partition() -> String {
  "api-cache-v1".to_string()
}

fn default_api_prefix() -> String {
  "/api/".to_string()
}

fn default_sync_tag() -> String {
  "sync-suggestions".to_string()
}

/// Where the durable cache store lives.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreConfig {
  /// Database path; defaults to the platform data directory
  pub path: Option<PathBuf>,
}

/// Default content for push-triggered notifications, overridden per-field by
/// the push payload when one is present and parseable.
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationDefaults {
  #[serde(default = "default_notification_title")]
  pub title: String,
  #[serde(default = "default_notification_body")]
  pub body: String,
  #[serde(default = "default_notification_icon")]
  pub icon: String,
  #[serde(default = "default_notification_icon")]
  pub badge: String,
  #[serde(default = "default_notification_tag")]
  pub tag: String,
  /// Where the "view" action navigates
  #[serde(default = "default_notification_url")]
  pub url: String,
}

impl Default for NotificationDefaults {
  fn default() -> Self {
    Self {
      title: default_notification_title(),
      body: default_notification_body(),
      icon: default_notification_icon(),
      badge: default_notification_icon(),
      tag: default_notification_tag(),
      url: default_notification_url(),
    }
  }
}

fn default_notification_title() -> String {
  "New suggestion".to_string()
}

fn default_notification_body() -> String {
  "A new suggestion is available".to_string()
}

fn default_notification_icon() -> String {
  "/icon-192x192.png".to_string()
}

fn default_notification_tag() -> String {
  "swgate-notification".to_string()
}

fn default_notification_url() -> String {
  "/dashboard".to_string()
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./swgate.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/swgate/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Err(eyre!(
        "No configuration file found. Create one at ~/.config/swgate/config.yaml"
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("swgate.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("swgate").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    Ok(config)
  }

  /// Resolve a possibly-relative asset path against the configured origin.
  pub fn asset_url(&self, path: &str) -> Result<url::Url> {
    let base = url::Url::parse(&self.origin)
      .map_err(|e| eyre!("Invalid origin '{}': {}", self.origin, e))?;
    base
      .join(path)
      .map_err(|e| eyre!("Invalid asset path '{}': {}", path, e))
  }
}

impl Default for Config {
  fn default() -> Self {
    Self {
      origin: "http://localhost:3000".to_string(),
      shell_partition: default_shell_partition(),
      api_partition: default_api_partition(),
      shell_assets: Vec::new(),
      api_prefix: default_api_prefix(),
      offline_api_paths: Vec::new(),
      sync_tag: default_sync_tag(),
      store: StoreConfig::default(),
      notifications: NotificationDefaults::default(),
    }
  }
}
