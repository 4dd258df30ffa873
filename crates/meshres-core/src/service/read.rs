//! Reads, deletes and listing.

use tokio_util::sync::CancellationToken;

use super::{ResourceService, not_found, retry::Backoff, version_mismatch};
use crate::{
  Error, Result,
  backend::{Backend, Cas},
  request::{DeleteRequest, ListRequest, ReadRequest},
  resource::Resource,
  validate,
};

impl<B: Backend> ResourceService<B> {
  /// Point read. When the request carries a `uid`, a record with a different
  /// one is `NotFound`.
  pub async fn read(&self, req: ReadRequest) -> Result<Resource> {
    let mut key = validate::read(&req)?;
    self.resolve(&mut key)?;
    let uid = req.id.map(|id| id.uid).unwrap_or_default();

    self
      .read_current(&key)
      .await?
      .filter(|r| uid.is_empty() || r.id.uid == uid)
      .ok_or_else(|| not_found(&key, &uid))
  }

  /// Delete a resource, invalidating its `uid`.
  ///
  /// Deleting something that is already gone succeeds, including when the
  /// name now belongs to a different `uid`.
  pub async fn delete(&self, req: DeleteRequest, cancel: &CancellationToken) -> Result<()> {
    let mut key = validate::delete(&req)?;
    self.resolve(&mut key)?;

    let DeleteRequest { id, version } = req;
    let uid = id.map(|id| id.uid).unwrap_or_default();
    let strict = !version.is_empty();
    let mut backoff = Backoff::new(&self.retry, cancel);

    loop {
      backoff.check()?;

      let Some(current) = self.read_current(&key).await? else {
        return Ok(());
      };
      if !uid.is_empty() && current.id.uid != uid {
        return Ok(());
      }
      if strict && current.version != version {
        return Err(version_mismatch(&key, &version));
      }

      let outcome = self
        .backend
        .delete_cas(&key, &current.version)
        .await
        .map_err(Error::backend)?;

      match outcome {
        Cas::Applied(()) => {
          tracing::debug!(resource = %key, uid = %current.id.uid, "deleted resource");
          return Ok(());
        }
        Cas::Conflict if strict => return Err(version_mismatch(&key, &version)),
        Cas::Conflict => backoff.conflict(&key).await?,
      }
    }
  }

  /// List resources of one type. Empty tenancy fields match anything.
  pub async fn list(&self, req: ListRequest) -> Result<Vec<Resource>> {
    let ty = validate::list(&req)?;
    self.registry.require(&ty)?;
    let tenancy = req.tenancy.unwrap_or_default();

    self
      .backend
      .list(&ty, &tenancy, &req.name_prefix)
      .await
      .map_err(Error::backend)
  }
}
