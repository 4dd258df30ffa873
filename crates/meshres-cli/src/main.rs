//! `meshctl` — command-line client for the meshres resource service.
//!
//! # Usage
//!
//! ```text
//! meshctl --url http://localhost:8502 read demo.v2.Artist artist-1
//! meshctl write --file artist.json
//! meshctl write-status demo.v2.Artist artist-1 --key consul.io/artist-controller --file status.json
//! meshctl list demo.v2.Artist --prefix artist-
//! meshctl --config ~/.config/meshres/meshctl.toml delete demo.v2.Artist artist-1
//! ```

mod client;

use std::{
  io::Read as _,
  path::{Path, PathBuf},
  time::Duration,
};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use client::{ApiClient, ApiConfig};
use meshres_core::{
  request::{DeleteRequest, ListRequest, ReadRequest, WriteRequest, WriteStatusRequest},
  resource::{Id, Resource, Status, Tenancy, Type},
};
use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

const DEFAULT_URL: &str = "http://localhost:8502";

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "meshctl", about = "Command-line client for the meshres resource service")]
struct Cli {
  /// Path to a TOML config file (url, timeout_secs).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the meshres server (default: http://localhost:8502).
  #[arg(long, env = "MESHRES_URL")]
  url: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Create or replace a resource body from a JSON file (`-` for stdin).
  Write {
    #[arg(short, long, default_value = "-")]
    file: PathBuf,
  },
  /// Set one controller's status on a resource.
  WriteStatus {
    #[command(flatten)]
    target: Target,
    /// Controller key the status is stored under.
    #[arg(long)]
    key: String,
    /// Status JSON file (`-` for stdin). `observed_generation` defaults to
    /// the resource's current generation.
    #[arg(short, long, default_value = "-")]
    file: PathBuf,
    /// Fail instead of retrying if the resource is at a different version.
    #[arg(long)]
    version: Option<String>,
  },
  /// Print a resource.
  Read {
    #[command(flatten)]
    target: Target,
  },
  /// Delete a resource. Deleting a missing resource succeeds.
  Delete {
    #[command(flatten)]
    target: Target,
    #[arg(long)]
    version: Option<String>,
  },
  /// List resources of a type.
  List {
    /// Resource type as `group.version.kind`.
    ty: Type,
    #[command(flatten)]
    tenancy: TenancyArgs,
    #[arg(long, default_value = "")]
    prefix: String,
    /// Print full resources as JSON instead of a table.
    #[arg(long)]
    json: bool,
  },
}

/// A single resource addressed by type and name.
#[derive(Args, Debug)]
struct Target {
  /// Resource type as `group.version.kind`.
  ty:      Type,
  name:    String,
  #[command(flatten)]
  tenancy: TenancyArgs,
  /// Only act on this specific instance of the name. Without it, whichever
  /// instance is currently live under the name is targeted, including one
  /// recreated since you last read it.
  #[arg(long)]
  uid:     Option<String>,
}

/// Tenancy flags. Empty values take the type's scope defaults.
#[derive(Args, Debug, Default)]
struct TenancyArgs {
  #[arg(long, default_value = "")]
  partition: String,
  #[arg(long, default_value = "")]
  namespace: String,
  #[arg(long, default_value = "")]
  peer:      String,
}

impl TenancyArgs {
  fn to_tenancy(&self) -> Tenancy {
    Tenancy::new(&self.partition, &self.namespace, &self.peer)
  }
}

impl Target {
  fn id(&self) -> Id {
    Id {
      ty:      Some(self.ty.clone()),
      tenancy: Some(self.tenancy.to_tenancy()),
      name:    self.name.clone(),
      uid:     self.uid.clone().unwrap_or_default(),
    }
  }
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url:          String,
  #[serde(default)]
  timeout_secs: Option<u64>,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load config file if provided.
  let file_cfg: ConfigFile = if let Some(path) = &cli.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  // CLI flags override config file, which overrides defaults.
  let api_config = ApiConfig {
    base_url: cli
      .url
      .clone()
      .or_else(|| (!file_cfg.url.is_empty()).then(|| file_cfg.url.clone()))
      .unwrap_or_else(|| DEFAULT_URL.to_string()),
    timeout:  Duration::from_secs(file_cfg.timeout_secs.unwrap_or(30)),
  };

  let client = ApiClient::new(api_config)?;
  run(&client, cli.command).await
}

async fn run(client: &ApiClient, command: Command) -> Result<()> {
  match command {
    Command::Write { file } => {
      let resource: Resource = read_json(&file)?;
      let written = client.write(&WriteRequest { resource: Some(resource) }).await?;
      print_json(&written)
    }
    Command::WriteStatus { target, key, file, version } => {
      let mut status: Status = read_json(&file)?;
      let mut id = target.id();

      // Fill in what the caller left out from the live resource.
      if id.uid.is_empty() || status.observed_generation.is_empty() {
        let current = client.read(&ReadRequest { id: Some(id.clone()) }).await?;
        if status.observed_generation.is_empty() {
          status.observed_generation = current.generation;
        }
        id = current.id;
      }

      let mut req = WriteStatusRequest::new(id, key, status);
      req.version = version.unwrap_or_default();
      let written = client.write_status(&req).await?;
      print_json(&written)
    }
    Command::Read { target } => {
      let resource = client.read(&ReadRequest { id: Some(target.id()) }).await?;
      print_json(&resource)
    }
    Command::Delete { target, version } => {
      let req = DeleteRequest { id: Some(target.id()), version: version.unwrap_or_default() };
      client.delete(&req).await?;
      println!("deleted {} {}", target.ty, target.name);
      Ok(())
    }
    Command::List { ty, tenancy, prefix, json } => {
      let req = ListRequest {
        ty:          Some(ty),
        tenancy:     Some(tenancy.to_tenancy()),
        name_prefix: prefix,
      };
      let resources = client.list(&req).await?;
      if json {
        return print_json(&resources);
      }
      for line in table(&resources) {
        println!("{line}");
      }
      Ok(())
    }
  }
}

// ─── Helpers ──────────────────────────────────────────────────────────────────

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
  let raw = if path == Path::new("-") {
    let mut buf = String::new();
    std::io::stdin()
      .read_to_string(&mut buf)
      .context("reading stdin")?;
    buf
  } else {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?
  };
  serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}

/// One header line plus one line per resource, columns left-aligned.
fn table(resources: &[Resource]) -> Vec<String> {
  let rows: Vec<[String; 4]> = resources
    .iter()
    .map(|r| {
      let tenancy = r.id.tenancy.clone().unwrap_or_default();
      [
        format!("{}/{}/{}", tenancy.partition, tenancy.namespace, tenancy.peer_name),
        r.id.name.clone(),
        r.version.clone(),
        r.status.len().to_string(),
      ]
    })
    .collect();

  let header = ["TENANCY", "NAME", "VERSION", "STATUSES"].map(String::from);
  let mut widths = header.clone().map(|h| h.chars().count());
  for row in &rows {
    for (w, cell) in widths.iter_mut().zip(row) {
      *w = (*w).max(cell.chars().count());
    }
  }

  std::iter::once(&header)
    .chain(&rows)
    .map(|row| {
      row
        .iter()
        .zip(widths)
        .map(|(cell, w)| format!("{cell:<w$}"))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
    })
    .collect()
}
