use clap::{Parser, Subcommand};
use color_eyre::Result;
use std::path::PathBuf;
use std::sync::Arc;

use swgate::clients::DetachedClients;
use swgate::network::HttpClient;
use swgate::notify::LoggingSink;
use swgate::sync::NoopReplay;
use swgate::{CacheStore, Config, OfflineWorker, Request, ServeSource, SqliteStore};

#[derive(Parser, Debug)]
#[command(name = "swgate")]
#[command(about = "Offline-first request interception and cache engine")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/swgate/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Precache the configured app-shell assets
  Install,
  /// Prune stale cache partitions
  Activate,
  /// Show partitions and entry counts
  Status,
  /// Route one GET request through the worker and report the outcome
  Fetch {
    /// Absolute URL or a path resolved against the configured origin
    url: String,
  },
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;
  let _log_guard = init_tracing()?;

  let args = Args::parse();
  let config = Config::load(args.config.as_deref())?;

  let store = match &config.store.path {
    Some(path) => Arc::new(SqliteStore::open_at(path)?),
    None => Arc::new(SqliteStore::open()?),
  };

  let network = Arc::new(HttpClient::new(&config.origin)?);
  let worker = OfflineWorker::new(
    config.clone(),
    store.clone(),
    network,
    Arc::new(DetachedClients),
    Arc::new(LoggingSink),
    Arc::new(NoopReplay),
  );

  match args.command {
    Command::Install => {
      worker.handle_install().await?;
      println!(
        "Installed: {} asset(s) in partition '{}'",
        store.partition_len(&config.shell_partition)?,
        config.shell_partition
      );
      if !config.offline_api_paths.is_empty() {
        println!("API paths expected offline: {}", config.offline_api_paths.join(", "));
      }
    }
    Command::Activate => {
      worker.lifecycle().advance(swgate::lifecycle::WorkerState::Installed)?;
      worker.handle_activate().await?;
      println!("Active. Current partitions: {}", store.list_partitions()?.join(", "));
    }
    Command::Status => {
      let partitions = store.list_partitions()?;
      if partitions.is_empty() {
        println!("No cache partitions.");
      }
      for name in partitions {
        let current = name == config.shell_partition || name == config.api_partition;
        let marker = if current { "" } else { " (stale)" };
        println!("{}: {} entr(ies){}", name, store.partition_len(&name)?, marker);
      }
    }
    Command::Fetch { url } => {
      let url = if url.starts_with('/') {
        config.asset_url(&url)?
      } else {
        url::Url::parse(&url)?
      };
      // The CLI drives the worker directly; install/activate state is not
      // required for fetch handling
      let served = worker.handle_fetch(&Request::get(url)).await?;
      let source = match served.source {
        ServeSource::Network => "network",
        ServeSource::Cache => "cache",
        ServeSource::Offline => "cache (offline fallback)",
      };
      println!(
        "{} {} bytes from {}",
        served.response.status,
        served.response.body.len(),
        source
      );
    }
  }

  Ok(())
}

/// Log to a file under the platform cache directory, filtered by RUST_LOG.
fn init_tracing() -> Result<tracing_appender::non_blocking::WorkerGuard> {
  use tracing_subscriber::EnvFilter;

  let log_dir = dirs::cache_dir()
    .unwrap_or_else(std::env::temp_dir)
    .join("swgate");
  let appender = tracing_appender::rolling::daily(log_dir, "swgate.log");
  let (writer, guard) = tracing_appender::non_blocking(appender);

  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .with_writer(writer)
    .with_ansi(false)
    .init();

  Ok(guard)
}
