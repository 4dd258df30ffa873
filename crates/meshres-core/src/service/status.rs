//! Per-controller status writes.

use tokio_util::sync::CancellationToken;

use super::{ResourceService, not_found, retry::Backoff, version_mismatch};
use crate::{
  Result,
  backend::{Backend, Cas},
  request::WriteStatusRequest,
  resource::Resource,
  validate,
};

impl<B: Backend> ResourceService<B> {
  /// Replace the status entry owned by `req.key`, leaving every other entry,
  /// the body and the generation as they are.
  ///
  /// With a `version` the write is a strict CAS and a mismatch is `Aborted`.
  /// Without one, the merge is re-applied to fresh state after each conflict
  /// until it lands. Entries under different keys never conflict logically,
  /// so concurrent controllers all end up recorded.
  pub async fn write_status(
    &self,
    req: WriteStatusRequest,
    cancel: &CancellationToken,
  ) -> Result<Resource> {
    let mut key = validate::write_status(&req)?;
    self.resolve(&mut key)?;

    let WriteStatusRequest { id, version, key: controller, status } = req;
    // Presence of both was checked by validation.
    let uid = id.map(|id| id.uid).unwrap_or_default();
    let status = status.unwrap_or_default();
    let strict = !version.is_empty();
    let mut backoff = Backoff::new(&self.retry, cancel);

    loop {
      backoff.check()?;

      // A different uid is a different resource; report it the same way as
      // absence so its existence does not leak.
      let current = self
        .read_current(&key)
        .await?
        .filter(|r| r.id.uid == uid)
        .ok_or_else(|| not_found(&key, &uid))?;

      if strict && current.version != version {
        return Err(version_mismatch(&key, &version));
      }
      let expected = current.version.clone();

      let mut merged = current;
      merged.status.insert(controller.clone(), status.clone());

      match self.write_cas(merged, expected).await? {
        Cas::Applied(stored) => {
          tracing::debug!(
            resource = %key,
            controller = %controller,
            version = %stored.version,
            "wrote status"
          );
          return Ok(stored);
        }
        Cas::Conflict if strict => return Err(version_mismatch(&key, &version)),
        Cas::Conflict => backoff.conflict(&key).await?,
      }
    }
  }
}
