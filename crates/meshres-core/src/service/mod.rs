//! [`ResourceService`] — the write, status-write, read, delete and list
//! operations over any [`Backend`].
//!
//! Each request runs independently. The only shared state is the registry and
//! whatever the backend manages; conflicting writers are resolved entirely by
//! the backend's compare-and-swap.

mod read;
mod retry;
mod status;
mod write;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use serde::Deserialize;

use crate::{
  Error, Result,
  backend::{Backend, Cas},
  registry::{Registration, Registry},
  resource::{Resource, ResourceKey},
};

// ─── Retry policy ────────────────────────────────────────────────────────────

/// Bounds for the automatic retry loops used by non-CAS writes.
///
/// The contract of a non-CAS write is "retry until it lands"; the ceiling only
/// exists so a pathological backend cannot pin a request forever.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
  /// Total attempts, including the first, before giving up.
  pub max_attempts:       u32,
  pub initial_backoff_ms: u64,
  pub max_backoff_ms:     u64,
}

impl Default for RetryConfig {
  fn default() -> Self {
    Self { max_attempts: 100, initial_backoff_ms: 5, max_backoff_ms: 500 }
  }
}

// ─── Service ─────────────────────────────────────────────────────────────────

pub struct ResourceService<B> {
  registry: Arc<Registry>,
  backend:  B,
  retry:    RetryConfig,
}

impl<B: Backend> ResourceService<B> {
  pub fn new(registry: Arc<Registry>, backend: B) -> Self {
    Self { registry, backend, retry: RetryConfig::default() }
  }

  pub fn with_retry(mut self, retry: RetryConfig) -> Self {
    self.retry = retry;
    self
  }

  pub fn registry(&self) -> &Registry { &self.registry }

  pub fn backend(&self) -> &B { &self.backend }

  /// Resolve the key's type and bring its tenancy into the registered scope.
  fn resolve(&self, key: &mut ResourceKey) -> Result<Registration> {
    let registration = self.registry.require(&key.ty)?;
    registration.scope.normalize(&mut key.tenancy)?;
    Ok(registration)
  }

  async fn read_current(&self, key: &ResourceKey) -> Result<Option<Resource>> {
    self.backend.read(key).await.map_err(Error::backend)
  }

  async fn write_cas(&self, resource: Resource, expected: String) -> Result<Cas<Resource>> {
    self.backend.write_cas(resource, expected).await.map_err(Error::backend)
  }
}

fn not_found(key: &ResourceKey, uid: &str) -> Error {
  if uid.is_empty() {
    Error::NotFound(key.to_string())
  } else {
    Error::NotFound(format!("{key} (uid {uid})"))
  }
}

fn version_mismatch(key: &ResourceKey, expected: &str) -> Error {
  Error::VersionMismatch { resource: key.to_string(), expected: expected.to_owned() }
}
