//! Server wiring for meshres.
//!
//! Turns a [`ServerConfig`] into a populated [`Registry`] and an axum
//! [`Router`] over the JSON API. The binary in `main.rs` picks the backend.

use std::{path::PathBuf, sync::Arc, time::Duration};

use axum::Router;
use meshres_core::{
  ResourceService, RetryConfig,
  backend::Backend,
  registry::{Registration, Registry, Scope},
  resource::Type,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:               String,
  pub port:               u16,
  pub backend:            BackendKind,
  /// Only read by the SQLite backend. A leading `~/` is expanded.
  pub store_path:         PathBuf,
  pub request_timeout_ms: u64,
  pub retry:              RetryConfig,
  pub types:              Vec<TypeConfig>,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:               "127.0.0.1".to_string(),
      port:               8502,
      backend:            BackendKind::default(),
      store_path:         PathBuf::from("~/.local/share/meshres/resources.db"),
      request_timeout_ms: 30_000,
      retry:              RetryConfig::default(),
      types:              Vec::new(),
    }
  }
}

impl ServerConfig {
  pub fn request_timeout(&self) -> Duration { Duration::from_millis(self.request_timeout_ms) }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
  /// Process-local; everything is lost on restart.
  #[default]
  Memory,
  Sqlite,
}

/// One resource type to register at startup.
#[derive(Debug, Deserialize, Clone)]
pub struct TypeConfig {
  pub group:         String,
  pub group_version: String,
  pub kind:          String,
  #[serde(default)]
  pub scope:         Scope,
}

impl TypeConfig {
  pub fn registration(&self) -> Registration {
    Registration::new(Type::new(&self.group, &self.group_version, &self.kind))
      .with_scope(self.scope)
  }
}

// ─── Wiring ──────────────────────────────────────────────────────────────────

/// Register every configured type. Duplicates are rejected.
pub fn build_registry(types: &[TypeConfig]) -> meshres_core::Result<Registry> {
  let registry = Registry::new();
  for ty in types {
    registry.register(ty.registration())?;
  }
  Ok(registry)
}

/// Build the service over `backend` with the configured registry and retry
/// policy.
pub fn build_service<B: Backend>(
  cfg: &ServerConfig,
  backend: B,
) -> meshres_core::Result<ResourceService<B>> {
  let registry = build_registry(&cfg.types)?;
  Ok(ResourceService::new(Arc::new(registry), backend).with_retry(cfg.retry.clone()))
}

/// The full application router, with request tracing.
pub fn router<B: Backend + 'static>(service: ResourceService<B>, cfg: &ServerConfig) -> Router {
  meshres_api::api_router(Arc::new(service), cfg.request_timeout())
    .layer(TraceLayer::new_for_http())
}

// ─── Tests ───────────────────────────────────────────────────────────────────
