//! [`MemoryBackend`] — an in-process [`Backend`] for tests and ephemeral
//! servers.

use std::{
  collections::BTreeMap,
  sync::{Arc, Mutex, PoisonError},
};

use thiserror::Error;

use crate::{
  backend::{Backend, Cas, tenancy_matches},
  resource::{Resource, ResourceKey, Tenancy, Type},
};

#[derive(Debug, Error)]
pub enum MemoryError {
  #[error("resource id is missing its type or tenancy")]
  IncompleteId,
}

#[derive(Debug, Default)]
struct Inner {
  records:      BTreeMap<ResourceKey, Resource>,
  /// Versions are a store-wide counter, so a recreated resource never reuses
  /// a version its predecessor held.
  last_version: u64,
}

/// A map guarded by a mutex. The lock is only held inside a single call, which
/// is what makes each CAS atomic.
///
/// Cloning is cheap and clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
  inner: Arc<Mutex<Inner>>,
}

impl MemoryBackend {
  pub fn new() -> Self { Self::default() }

  fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
    self.inner.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

impl Backend for MemoryBackend {
  type Error = MemoryError;

  async fn read(&self, key: &ResourceKey) -> Result<Option<Resource>, MemoryError> {
    Ok(self.lock().records.get(key).cloned())
  }

  async fn write_cas(
    &self,
    mut resource: Resource,
    expected_version: String,
  ) -> Result<Cas<Resource>, MemoryError> {
    let key = resource.id.key().ok_or(MemoryError::IncompleteId)?;
    let mut inner = self.lock();

    let current = inner.records.get(&key).map(|r| r.version.as_str()).unwrap_or("");
    if current != expected_version {
      return Ok(Cas::Conflict);
    }

    inner.last_version += 1;
    resource.version = inner.last_version.to_string();
    inner.records.insert(key, resource.clone());
    Ok(Cas::Applied(resource))
  }

  async fn delete_cas(
    &self,
    key: &ResourceKey,
    expected_version: &str,
  ) -> Result<Cas<()>, MemoryError> {
    let mut inner = self.lock();
    let current = inner.records.get(key).map(|r| r.version.as_str());
    if current != Some(expected_version) {
      return Ok(Cas::Conflict);
    }
    inner.records.remove(key);
    Ok(Cas::Applied(()))
  }

  async fn list(
    &self,
    ty: &Type,
    tenancy: &Tenancy,
    name_prefix: &str,
  ) -> Result<Vec<Resource>, MemoryError> {
    Ok(
      self
        .lock()
        .records
        .iter()
        .filter(|(k, _)| {
          &k.ty == ty
            && tenancy_matches(tenancy, &k.tenancy)
            && k.name.starts_with(name_prefix)
        })
        .map(|(_, r)| r.clone())
        .collect(),
    )
  }
}
