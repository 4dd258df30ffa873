//! meshres server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), registers the
//! configured resource types, opens the selected backend, and serves the JSON
//! API over HTTP.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::Parser;
use meshres_core::{backend::Backend, memory::MemoryBackend};
use meshres_server::{BackendKind, ServerConfig, build_service, router};
use meshres_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "meshres resource server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration. Nested keys use `__`, e.g. MESHRES_RETRY__MAX_ATTEMPTS.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(
      config::Environment::with_prefix("MESHRES")
        .prefix_separator("_")
        .separator("__"),
    )
    .build()
    .context("failed to read config file")?;

  let cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  match cfg.backend {
    BackendKind::Memory => {
      tracing::warn!("using the in-memory backend; resources will not survive a restart");
      serve(&cfg, MemoryBackend::new()).await
    }
    BackendKind::Sqlite => {
      let store_path = expand_tilde(&cfg.store_path);
      if let Some(parent) = store_path.parent() {
        std::fs::create_dir_all(parent)
          .with_context(|| format!("failed to create {parent:?}"))?;
      }
      let store = SqliteStore::open(&store_path)
        .await
        .with_context(|| format!("failed to open store at {store_path:?}"))?;
      tracing::info!(path = ?store_path, "opened sqlite store");
      serve(&cfg, store).await
    }
  }
}

async fn serve<B: Backend + 'static>(cfg: &ServerConfig, backend: B) -> anyhow::Result<()> {
  let service = build_service(cfg, backend).context("invalid type configuration")?;
  for ty in service.registry().types() {
    tracing::info!(%ty, "serving resource type");
  }

  let app = router(service, cfg);
  let address = format!("{}:{}", cfg.host, cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
