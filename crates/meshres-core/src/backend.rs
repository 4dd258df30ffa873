//! The `Backend` trait — the storage contract the resource service consumes.
//!
//! Implemented by [`crate::memory::MemoryBackend`] and by
//! `meshres-store-sqlite`. The service never holds a lock across a read and the
//! following write; all write ordering comes from [`Backend::write_cas`].

use std::future::Future;

use crate::resource::{Resource, ResourceKey, Tenancy, Type};

/// Outcome of a compare-and-swap operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Cas<T> {
  /// The precondition held and the write was applied.
  Applied(T),
  /// The stored version did not match the expected one. Nothing was written.
  Conflict,
}

impl<T> Cas<T> {
  pub fn is_conflict(&self) -> bool { matches!(self, Self::Conflict) }
}

/// A versioned key-value store keyed by [`ResourceKey`].
///
/// Versions are opaque to callers. Expected versions are compared for exact
/// equality, and the empty string means "no record may exist".
pub trait Backend: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Point read by type, tenancy and name.
  fn read<'a>(
    &'a self,
    key: &'a ResourceKey,
  ) -> impl Future<Output = Result<Option<Resource>, Self::Error>> + Send + 'a;

  /// Store `resource` iff the current version equals `expected_version`.
  ///
  /// On success the backend mints a new version, which differs from every
  /// version it has handed out for this key, and returns the stored resource.
  /// Two concurrent calls against the same expected version never both
  /// succeed.
  fn write_cas(
    &self,
    resource: Resource,
    expected_version: String,
  ) -> impl Future<Output = Result<Cas<Resource>, Self::Error>> + Send + '_;

  /// Remove the record iff the current version equals `expected_version`.
  fn delete_cas<'a>(
    &'a self,
    key: &'a ResourceKey,
    expected_version: &'a str,
  ) -> impl Future<Output = Result<Cas<()>, Self::Error>> + Send + 'a;

  /// All resources of `ty` whose name starts with `name_prefix`, sorted by
  /// tenancy then name. Empty tenancy fields match any value.
  fn list<'a>(
    &'a self,
    ty: &'a Type,
    tenancy: &'a Tenancy,
    name_prefix: &'a str,
  ) -> impl Future<Output = Result<Vec<Resource>, Self::Error>> + Send + 'a;
}

/// Whether `candidate` falls inside a tenancy filter, treating empty filter
/// fields as wildcards.
pub fn tenancy_matches(filter: &Tenancy, candidate: &Tenancy) -> bool {
  let field = |f: &str, c: &str| f.is_empty() || f == c;
  field(&filter.partition, &candidate.partition)
    && field(&filter.namespace, &candidate.namespace)
    && field(&filter.peer_name, &candidate.peer_name)
}
