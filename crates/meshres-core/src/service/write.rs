//! Body writes.

use tokio_util::sync::CancellationToken;

use super::{ResourceService, not_found, retry::Backoff, version_mismatch};
use crate::{
  Result,
  backend::{Backend, Cas},
  request::WriteRequest,
  resource::{Resource, new_generation, new_uid},
  validate,
};

impl<B: Backend> ResourceService<B> {
  /// Create or replace a resource body.
  ///
  /// - No `uid`: create if absent, replace if present. A `uid` that does not
  ///   match the stored record (or with no record at all) is `NotFound`.
  /// - Non-empty `version`: strict CAS; any mismatch is `Aborted`.
  /// - Empty `version`: the write lands on whatever is current, retrying on
  ///   conflict.
  ///
  /// The stored status map is carried over untouched. The generation changes
  /// only if `data` or `metadata` changed.
  pub async fn write(
    &self,
    req: WriteRequest,
    cancel: &CancellationToken,
  ) -> Result<Resource> {
    let mut key = validate::write(&req)?;
    let registration = self.resolve(&mut key)?;

    // Presence was checked by validation.
    let mut input = req.resource.unwrap_or_default();
    input.id = key.to_id(std::mem::take(&mut input.id.uid));
    registration.prepare(&mut input)?;

    let strict = !input.version.is_empty();
    let mut backoff = Backoff::new(&self.retry, cancel);

    loop {
      backoff.check()?;

      let (candidate, expected) = match self.read_current(&key).await? {
        None => {
          if !input.id.uid.is_empty() {
            return Err(not_found(&key, &input.id.uid));
          }
          if strict {
            return Err(version_mismatch(&key, &input.version));
          }
          let mut created = input.clone();
          created.id.uid = new_uid();
          created.generation = new_generation();
          created.version.clear();
          (created, String::new())
        }
        Some(existing) => {
          if !input.id.uid.is_empty() && input.id.uid != existing.id.uid {
            return Err(not_found(&key, &input.id.uid));
          }
          if strict && input.version != existing.version {
            return Err(version_mismatch(&key, &input.version));
          }
          let mut updated = input.clone();
          updated.id.uid = existing.id.uid.clone();
          updated.status = existing.status.clone();
          updated.generation = if updated.body_eq(&existing) {
            existing.generation.clone()
          } else {
            new_generation()
          };
          (updated, existing.version)
        }
      };

      match self.write_cas(candidate, expected).await? {
        Cas::Applied(stored) => {
          tracing::debug!(
            resource = %key,
            version = %stored.version,
            generation = %stored.generation,
            "wrote resource"
          );
          return Ok(stored);
        }
        Cas::Conflict if strict => return Err(version_mismatch(&key, &input.version)),
        Cas::Conflict => backoff.conflict(&key).await?,
      }
    }
  }
}
