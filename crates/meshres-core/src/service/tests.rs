//! Service tests against the in-memory backend.

use std::sync::{
  Arc,
  atomic::{AtomicBool, AtomicUsize, Ordering},
};

use serde_json::json;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use super::{ResourceService, RetryConfig};
use crate::{
  Code,
  backend::{Backend, Cas},
  memory::{MemoryBackend, MemoryError},
  registry::{Registration, Registry, Scope},
  request::{DeleteRequest, ListRequest, ReadRequest, WriteRequest, WriteStatusRequest},
  resource::{
    Condition, Id, Resource, ResourceKey, State, Status, Tenancy, Type, is_generation,
  },
};

// ─── Fixtures ────────────────────────────────────────────────────────────────

const ARTIST_CONTROLLER: &str = "consul.io/artist-controller";

fn artist_type() -> Type { Type::new("demo", "v2", "Artist") }

fn album_type() -> Type { Type::new("demo", "v2", "Album") }

fn registry() -> Arc<Registry> {
  let registry = Registry::new();
  registry.register(Registration::new(artist_type())).unwrap();
  registry.register(Registration::new(album_type())).unwrap();
  registry
    .register(
      Registration::new(Type::new("demo", "v2", "Festival")).with_scope(Scope::Cluster),
    )
    .unwrap();
  Arc::new(registry)
}

fn service() -> ResourceService<MemoryBackend> {
  ResourceService::new(registry(), MemoryBackend::new())
}

fn artist(name: &str) -> Resource {
  Resource {
    id: Id {
      ty:      Some(artist_type()),
      tenancy: Some(Tenancy::default()),
      name:    name.into(),
      uid:     String::new(),
    },
    data: json!({ "name": "Mild Canines", "genre": "jazz" }),
    ..Default::default()
  }
}

fn ready(reason: &str) -> Status {
  Status {
    observed_generation: String::new(),
    conditions:          vec![Condition {
      ty:     "Ready".into(),
      state:  State::True,
      reason: reason.into(),
      ..Default::default()
    }],
  }
}

/// A CAS status request against `res` as it currently stands.
fn status_request(res: &Resource, key: &str) -> WriteStatusRequest {
  let mut status = ready("Reconciled");
  status.observed_generation = res.generation.clone();
  WriteStatusRequest {
    id:      Some(res.id.clone()),
    version: res.version.clone(),
    key:     key.into(),
    status:  Some(status),
  }
}

fn token() -> CancellationToken { CancellationToken::new() }

async fn create<B: Backend>(svc: &ResourceService<B>, res: Resource) -> Resource {
  svc.write(WriteRequest { resource: Some(res) }, &token()).await.unwrap()
}

async fn read_back<B: Backend>(svc: &ResourceService<B>, res: &Resource) -> Resource {
  svc.read(ReadRequest { id: Some(res.id.clone()) }).await.unwrap()
}

// ─── Instrumented backend ────────────────────────────────────────────────────

/// Wraps a [`MemoryBackend`] to count writes, pause a read, or force every CAS
/// to conflict.
#[derive(Clone, Default)]
struct TestBackend {
  inner:           MemoryBackend,
  writes:          Arc<AtomicUsize>,
  /// When set, the next read signals `read_done` and then waits for `unblock`
  /// before returning what it read.
  block_next_read: Arc<AtomicBool>,
  read_done:       Arc<Notify>,
  unblock:         Arc<Notify>,
  always_conflict: Arc<AtomicBool>,
  /// When set, the next delete reports a conflict without touching storage.
  conflict_next_delete: Arc<AtomicBool>,
}

impl Backend for TestBackend {
  type Error = MemoryError;

  async fn read(&self, key: &ResourceKey) -> Result<Option<Resource>, MemoryError> {
    let res = self.inner.read(key).await;
    if self.block_next_read.swap(false, Ordering::SeqCst) {
      self.read_done.notify_one();
      self.unblock.notified().await;
    }
    res
  }

  async fn write_cas(
    &self,
    resource: Resource,
    expected_version: String,
  ) -> Result<Cas<Resource>, MemoryError> {
    if self.always_conflict.load(Ordering::SeqCst) {
      return Ok(Cas::Conflict);
    }
    self.writes.fetch_add(1, Ordering::SeqCst);
    self.inner.write_cas(resource, expected_version).await
  }

  async fn delete_cas(
    &self,
    key: &ResourceKey,
    expected_version: &str,
  ) -> Result<Cas<()>, MemoryError> {
    if self.conflict_next_delete.swap(false, Ordering::SeqCst) {
      return Ok(Cas::Conflict);
    }
    self.inner.delete_cas(key, expected_version).await
  }

  async fn list(
    &self,
    ty: &Type,
    tenancy: &Tenancy,
    name_prefix: &str,
  ) -> Result<Vec<Resource>, MemoryError> {
    self.inner.list(ty, tenancy, name_prefix).await
  }
}

fn fast_retry(max_attempts: u32) -> RetryConfig {
  RetryConfig { max_attempts, initial_backoff_ms: 0, max_backoff_ms: 0 }
}

// ─── Body writes ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn write_creates_with_server_assigned_fields() {
  let svc = service();
  let res = create(&svc, artist("artist-1")).await;

  assert!(!res.id.uid.is_empty());
  assert!(!res.version.is_empty());
  assert!(is_generation(&res.generation));
  assert_eq!(res.id.tenancy, Some(Tenancy::new("default", "default", "local")));
  assert!(res.status.is_empty());
}

#[tokio::test]
async fn unchanged_body_keeps_generation_but_not_version() {
  let svc = service();
  let first = create(&svc, artist("artist-1")).await;
  let second = create(&svc, first.clone()).await;

  assert_eq!(second.id.uid, first.id.uid);
  assert_eq!(second.generation, first.generation);
  assert_ne!(second.version, first.version);
}

#[tokio::test]
async fn changed_body_bumps_generation() {
  let svc = service();
  let first = create(&svc, artist("artist-1")).await;

  let mut changed = first.clone();
  changed.data["genre"] = json!("blues");
  let second = create(&svc, changed).await;

  assert_ne!(second.generation, first.generation);
  assert_ne!(second.version, first.version);
  assert_eq!(second.data["genre"], "blues");

  let mut relabelled = second.clone();
  relabelled.metadata.insert("label".into(), "indie".into());
  let third = create(&svc, relabelled).await;
  assert_ne!(third.generation, second.generation);
}

#[tokio::test]
async fn write_with_stale_version_is_aborted() {
  let svc = service();
  let first = create(&svc, artist("artist-1")).await;
  let second = create(&svc, first.clone()).await;

  let mut stale = first.clone();
  stale.data["genre"] = json!("blues");
  let err = svc
    .write(WriteRequest { resource: Some(stale) }, &token())
    .await
    .unwrap_err();
  assert_eq!(err.code(), Code::Aborted);

  let stored = read_back(&svc, &first).await;
  assert_eq!(stored.version, second.version);
  assert_eq!(stored.data["genre"], "jazz");
}

#[tokio::test]
async fn create_with_version_is_aborted() {
  let svc = service();
  let mut res = artist("artist-1");
  res.version = "42".into();
  let err = svc.write(WriteRequest { resource: Some(res) }, &token()).await.unwrap_err();
  assert_eq!(err.code(), Code::Aborted);
}

#[tokio::test]
async fn write_with_foreign_uid_is_not_found() {
  let svc = service();
  let res = create(&svc, artist("artist-1")).await;

  let mut other = res.clone();
  other.id.uid = crate::resource::new_uid();
  other.version.clear();
  let err = svc.write(WriteRequest { resource: Some(other) }, &token()).await.unwrap_err();
  assert_eq!(err.code(), Code::NotFound);

  let mut absent = artist("artist-2");
  absent.id.uid = crate::resource::new_uid();
  let err = svc.write(WriteRequest { resource: Some(absent) }, &token()).await.unwrap_err();
  assert_eq!(err.code(), Code::NotFound);
}

#[tokio::test]
async fn body_write_preserves_status() {
  let svc = service();
  let res = create(&svc, artist("artist-1")).await;
  let with_status = svc
    .write_status(status_request(&res, ARTIST_CONTROLLER), &token())
    .await
    .unwrap();

  let mut body = with_status.clone();
  body.status.clear();
  body.data["genre"] = json!("blues");
  let rewritten = create(&svc, body).await;

  assert_eq!(rewritten.status, with_status.status);
}

#[tokio::test]
async fn write_with_status_is_invalid() {
  let svc = service();
  let mut res = artist("artist-1");
  res.status.insert(ARTIST_CONTROLLER.into(), ready("Sneaky"));
  let err = svc.write(WriteRequest { resource: Some(res) }, &token()).await.unwrap_err();
  assert_eq!(err.code(), Code::InvalidArgument);
}

#[tokio::test]
async fn registration_hooks_run_on_write() {
  let registry = Registry::new();
  registry
    .register(
      Registration::new(artist_type())
        .with_mutate(|r| {
          r.metadata.entry("managed-by".into()).or_insert_with(|| "meshres".into());
        })
        .with_validate(|r| match r.data.get("name") {
          Some(serde_json::Value::String(_)) => Ok(()),
          _ => Err("artist name must be a string".into()),
        }),
    )
    .unwrap();
  let svc = ResourceService::new(Arc::new(registry), MemoryBackend::new());

  let res = create(&svc, artist("artist-1")).await;
  assert_eq!(res.metadata["managed-by"], "meshres");

  let mut bad = artist("artist-2");
  bad.data = json!({ "name": 7 });
  let err = svc.write(WriteRequest { resource: Some(bad) }, &token()).await.unwrap_err();
  assert_eq!(err.code(), Code::InvalidArgument);
  assert!(err.to_string().contains("artist name must be a string"));
}

#[tokio::test]
async fn cluster_scoped_type_rejects_namespace() {
  let svc = service();
  let mut fest = artist("fest-1");
  fest.id.ty = Some(Type::new("demo", "v2", "Festival"));
  fest.id.tenancy = Some(Tenancy::new("", "team-a", ""));

  let err = svc.write(WriteRequest { resource: Some(fest.clone()) }, &token()).await.unwrap_err();
  assert_eq!(err.code(), Code::InvalidArgument);

  fest.id.tenancy = Some(Tenancy::default());
  let stored = create(&svc, fest).await;
  assert_eq!(stored.id.tenancy, Some(Tenancy::new("", "", "local")));
}

// ─── Status writes ───────────────────────────────────────────────────────────

#[tokio::test]
async fn status_validation_failure_touches_no_storage() {
  let backend = TestBackend::default();
  let svc = ResourceService::new(registry(), backend.clone());
  let res = create(&svc, artist("artist-1")).await;
  let writes_before = backend.writes.load(Ordering::SeqCst);

  let mut req = status_request(&res, ARTIST_CONTROLLER);
  req.status.as_mut().unwrap().observed_generation = "bogus".into();
  let err = svc.write_status(req, &token()).await.unwrap_err();

  assert_eq!(err.code(), Code::InvalidArgument);
  assert_eq!(backend.writes.load(Ordering::SeqCst), writes_before);
  assert!(read_back(&svc, &res).await.status.is_empty());
}

#[tokio::test]
async fn cas_status_write_changes_version_not_generation() {
  for cas in [true, false] {
    let svc = service();
    let res = create(&svc, artist("artist-1")).await;

    let mut req = status_request(&res, ARTIST_CONTROLLER);
    if !cas {
      req.version.clear();
    }
    let first = svc.write_status(req, &token()).await.unwrap();

    let mut req = status_request(&first, "consul.io/other-controller");
    if !cas {
      req.version.clear();
    }
    let second = svc.write_status(req, &token()).await.unwrap();

    assert_eq!(second.generation, res.generation, "cas={cas}");
    assert_ne!(second.version, first.version, "cas={cas}");
    assert_ne!(first.version, res.version, "cas={cas}");
    assert!(second.status.contains_key(ARTIST_CONTROLLER), "cas={cas}");
    assert!(second.status.contains_key("consul.io/other-controller"), "cas={cas}");
  }
}

#[tokio::test]
async fn stale_status_version_is_aborted_and_store_unchanged() {
  let svc = service();
  let res = create(&svc, artist("artist-1")).await;

  let mut req = status_request(&res, ARTIST_CONTROLLER);
  req.version = "nope".into();
  let err = svc.write_status(req, &token()).await.unwrap_err();
  assert_eq!(err.code(), Code::Aborted);

  let stored = read_back(&svc, &res).await;
  assert_eq!(stored.version, res.version);
  assert!(stored.status.is_empty());
}

#[tokio::test]
async fn controllers_own_their_entries() {
  let svc = service();
  let res = create(&svc, artist("artist-1")).await;

  let mut a = status_request(&res, "A");
  a.version.clear();
  svc.write_status(a, &token()).await.unwrap();

  let mut b = status_request(&res, "B");
  b.version.clear();
  b.status.as_mut().unwrap().conditions[0].state = State::False;
  svc.write_status(b, &token()).await.unwrap();

  let mut a_again = status_request(&res, "A");
  a_again.version.clear();
  a_again.status.as_mut().unwrap().conditions[0].reason = "Second pass".into();
  let out = svc.write_status(a_again, &token()).await.unwrap();

  assert_eq!(out.status.len(), 2);
  assert_eq!(out.status["A"].conditions[0].reason, "Second pass");
  assert_eq!(out.status["B"].conditions[0].state, State::False);
  assert_eq!(out.status["B"].conditions[0].reason, "Reconciled");
}

#[tokio::test]
async fn status_write_with_wrong_uid_is_not_found() {
  let svc = service();
  let res = create(&svc, artist("artist-1")).await;

  let mut req = status_request(&res, ARTIST_CONTROLLER);
  req.id.as_mut().unwrap().uid = crate::resource::new_uid();
  let err = svc.write_status(req, &token()).await.unwrap_err();
  assert_eq!(err.code(), Code::NotFound);
}

#[tokio::test]
async fn status_write_for_missing_resource_is_not_found() {
  let svc = service();
  let mut res = artist("artist-1");
  res.id.uid = crate::resource::new_uid();
  res.generation = crate::resource::new_generation();

  let err = svc
    .write_status(status_request(&res, ARTIST_CONTROLLER), &token())
    .await
    .unwrap_err();
  assert_eq!(err.code(), Code::NotFound);
}

#[tokio::test]
async fn unregistered_type_is_invalid_argument() {
  let svc = ResourceService::new(Arc::new(Registry::new()), MemoryBackend::new());
  let mut res = artist("artist-1");
  res.id.uid = crate::resource::new_uid();
  res.generation = crate::resource::new_generation();

  let err = svc
    .write_status(status_request(&res, ARTIST_CONTROLLER), &token())
    .await
    .unwrap_err();
  assert_eq!(err.code(), Code::InvalidArgument);
  assert!(err.to_string().contains("resource type demo.v2.Artist not registered"));

  let err = svc
    .write(WriteRequest { resource: Some(artist("artist-1")) }, &token())
    .await
    .unwrap_err();
  assert_eq!(err.code(), Code::InvalidArgument);
  assert!(err.to_string().contains("demo.v2.Artist"));
}

#[tokio::test]
async fn non_cas_status_write_retries_past_concurrent_body_write() {
  let backend = TestBackend::default();
  let svc = Arc::new(ResourceService::new(registry(), backend.clone()));
  let res = create(&svc, artist("artist-1")).await;

  // Pause the status write between its read and its write.
  backend.block_next_read.store(true, Ordering::SeqCst);
  let task = tokio::spawn({
    let svc = svc.clone();
    let mut req = status_request(&res, ARTIST_CONTROLLER);
    req.version.clear();
    async move { svc.write_status(req, &CancellationToken::new()).await }
  });
  backend.read_done.notified().await;

  let mut changed = res.clone();
  changed.version.clear();
  changed.data["genre"] = json!("blues");
  let updated = create(&svc, changed).await;

  backend.unblock.notify_one();
  let out = task.await.unwrap().unwrap();

  assert_eq!(out.data["genre"], "blues");
  assert_eq!(out.generation, updated.generation);
  assert_ne!(out.version, updated.version);
  assert!(out.status.contains_key(ARTIST_CONTROLLER));
}

#[tokio::test]
async fn non_cas_body_write_retries_past_concurrent_status_write() {
  let backend = TestBackend::default();
  let svc = Arc::new(ResourceService::new(registry(), backend.clone()));
  let res = create(&svc, artist("artist-1")).await;

  // Pause the body write between its read and its write.
  backend.block_next_read.store(true, Ordering::SeqCst);
  let task = tokio::spawn({
    let svc = svc.clone();
    let mut changed = res.clone();
    changed.version.clear();
    changed.data["genre"] = json!("blues");
    async move { svc.write(WriteRequest { resource: Some(changed) }, &CancellationToken::new()).await }
  });
  backend.read_done.notified().await;

  let with_status = svc
    .write_status(status_request(&res, ARTIST_CONTROLLER), &token())
    .await
    .unwrap();

  backend.unblock.notify_one();
  let out = task.await.unwrap().unwrap();

  assert_eq!(out.data["genre"], "blues");
  assert_ne!(out.generation, res.generation);
  assert_ne!(out.version, with_status.version);
  assert_eq!(out.status, with_status.status);
  assert_eq!(read_back(&svc, &res).await, out);
}

#[tokio::test]
async fn cas_body_write_does_not_retry() {
  let backend = TestBackend::default();
  let svc = ResourceService::new(registry(), backend.clone()).with_retry(fast_retry(10));
  let res = create(&svc, artist("artist-1")).await;
  let writes = backend.writes.load(Ordering::SeqCst);

  // The pre-read version matches, but the CAS itself loses.
  backend.always_conflict.store(true, Ordering::SeqCst);
  let mut changed = res.clone();
  changed.data["genre"] = json!("blues");
  let err = svc
    .write(WriteRequest { resource: Some(changed) }, &token())
    .await
    .unwrap_err();

  assert_eq!(err.code(), Code::Aborted);
  assert_eq!(backend.writes.load(Ordering::SeqCst), writes);
  backend.always_conflict.store(false, Ordering::SeqCst);
  assert_eq!(read_back(&svc, &res).await, res);
}

#[tokio::test]
async fn non_cas_delete_retries_past_conflict() {
  let backend = TestBackend::default();
  let svc = ResourceService::new(registry(), backend.clone()).with_retry(fast_retry(3));
  let res = create(&svc, artist("artist-1")).await;

  backend.conflict_next_delete.store(true, Ordering::SeqCst);
  svc
    .delete(DeleteRequest { id: Some(res.id.clone()), version: String::new() }, &token())
    .await
    .unwrap();

  assert!(!backend.conflict_next_delete.load(Ordering::SeqCst));
  let err = svc
    .read(ReadRequest { id: Some(res.id.clone()) })
    .await
    .unwrap_err();
  assert_eq!(err.code(), Code::NotFound);
}

#[tokio::test]
async fn cas_delete_conflict_is_aborted() {
  let backend = TestBackend::default();
  let svc = ResourceService::new(registry(), backend.clone()).with_retry(fast_retry(3));
  let res = create(&svc, artist("artist-1")).await;

  backend.conflict_next_delete.store(true, Ordering::SeqCst);
  let err = svc
    .delete(DeleteRequest { id: Some(res.id.clone()), version: res.version.clone() }, &token())
    .await
    .unwrap_err();

  assert_eq!(err.code(), Code::Aborted);
  assert_eq!(read_back(&svc, &res).await, res);
}

#[tokio::test]
async fn cas_status_write_does_not_retry() {
  let backend = TestBackend::default();
  let svc = ResourceService::new(registry(), backend.clone()).with_retry(fast_retry(10));
  let res = create(&svc, artist("artist-1")).await;

  backend.always_conflict.store(true, Ordering::SeqCst);
  let err = svc
    .write_status(status_request(&res, ARTIST_CONTROLLER), &token())
    .await
    .unwrap_err();
  assert_eq!(err.code(), Code::Aborted);
}

#[tokio::test]
async fn retry_ceiling_escalates_to_internal() {
  let backend = TestBackend::default();
  let svc = ResourceService::new(registry(), backend.clone()).with_retry(fast_retry(3));
  let res = create(&svc, artist("artist-1")).await;

  backend.always_conflict.store(true, Ordering::SeqCst);
  let mut req = status_request(&res, ARTIST_CONTROLLER);
  req.version.clear();
  let err = svc.write_status(req, &token()).await.unwrap_err();

  assert_eq!(err.code(), Code::Internal);
  assert!(matches!(err, crate::Error::RetriesExhausted { attempts: 3, .. }));
}

#[tokio::test]
async fn cancellation_stops_the_retry_loop() {
  let backend = TestBackend::default();
  let svc = ResourceService::new(registry(), backend.clone()).with_retry(RetryConfig {
    max_attempts:       u32::MAX,
    initial_backoff_ms: 60_000,
    max_backoff_ms:     60_000,
  });
  let res = create(&svc, artist("artist-1")).await;

  backend.always_conflict.store(true, Ordering::SeqCst);
  let cancel = CancellationToken::new();
  tokio::spawn({
    let cancel = cancel.clone();
    async move {
      tokio::time::sleep(std::time::Duration::from_millis(20)).await;
      cancel.cancel();
    }
  });

  let mut req = status_request(&res, ARTIST_CONTROLLER);
  req.version.clear();
  let err = svc.write_status(req, &cancel).await.unwrap_err();
  assert_eq!(err.code(), Code::Unavailable);
}

#[tokio::test]
async fn already_cancelled_request_never_writes() {
  let backend = TestBackend::default();
  let svc = ResourceService::new(registry(), backend.clone());
  let cancel = CancellationToken::new();
  cancel.cancel();

  let err = svc
    .write(WriteRequest { resource: Some(artist("artist-1")) }, &cancel)
    .await
    .unwrap_err();
  assert!(matches!(err, crate::Error::Cancelled));
  assert_eq!(backend.writes.load(Ordering::SeqCst), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_controllers_are_all_recorded() {
  let svc = Arc::new(service());
  let res = create(&svc, artist("artist-1")).await;

  let tasks: Vec<_> = (0..16)
    .map(|i| {
      let svc = svc.clone();
      let mut req = status_request(&res, &format!("controller-{i}"));
      req.version.clear();
      tokio::spawn(async move { svc.write_status(req, &CancellationToken::new()).await })
    })
    .collect();
  for task in tasks {
    task.await.unwrap().unwrap();
  }

  let stored = read_back(&svc, &res).await;
  assert_eq!(stored.status.len(), 16);
  assert_eq!(stored.generation, res.generation);
}

#[tokio::test]
async fn artist_scenario() {
  let svc = service();
  let artist = create(&svc, artist("artist-1")).await;

  let mut req = WriteStatusRequest::new(artist.id.clone(), "controller-a", ready("Reconciled"));
  req.status.as_mut().unwrap().observed_generation = artist.generation.clone();
  let after_a = svc.write_status(req, &token()).await.unwrap();
  assert_eq!(after_a.status["controller-a"].conditions[0].state, State::True);

  let mut req = WriteStatusRequest::new(artist.id.clone(), "controller-b", ready("Reconciled"));
  req.status.as_mut().unwrap().observed_generation = artist.generation.clone();
  let after_b = svc.write_status(req, &token()).await.unwrap();

  assert!(after_b.status.contains_key("controller-a"));
  assert!(after_b.status.contains_key("controller-b"));
  assert_eq!(after_a.generation, artist.generation);
  assert_eq!(after_b.generation, artist.generation);
  assert_ne!(after_a.version, artist.version);
  assert_ne!(after_b.version, after_a.version);
}

// ─── Read / delete / list ────────────────────────────────────────────────────

#[tokio::test]
async fn read_checks_uid_only_when_given() {
  let svc = service();
  let res = create(&svc, artist("artist-1")).await;

  let mut id = res.id.clone();
  id.uid.clear();
  assert_eq!(svc.read(ReadRequest { id: Some(id.clone()) }).await.unwrap(), res);

  id.uid = crate::resource::new_uid();
  let err = svc.read(ReadRequest { id: Some(id) }).await.unwrap_err();
  assert_eq!(err.code(), Code::NotFound);
}

#[tokio::test]
async fn delete_invalidates_uid() {
  let svc = service();
  let res = create(&svc, artist("artist-1")).await;

  svc
    .delete(DeleteRequest { id: Some(res.id.clone()), version: String::new() }, &token())
    .await
    .unwrap();

  let err = svc
    .write_status(status_request(&res, ARTIST_CONTROLLER), &token())
    .await
    .unwrap_err();
  assert_eq!(err.code(), Code::NotFound);

  let mut old = res.clone();
  old.version.clear();
  let err = svc.write(WriteRequest { resource: Some(old) }, &token()).await.unwrap_err();
  assert_eq!(err.code(), Code::NotFound);

  // Recreating the name mints a new uid.
  let reborn = create(&svc, artist("artist-1")).await;
  assert_ne!(reborn.id.uid, res.id.uid);
}

#[tokio::test]
async fn delete_is_idempotent_and_honours_version() {
  let svc = service();
  let res = create(&svc, artist("artist-1")).await;

  let err = svc
    .delete(DeleteRequest { id: Some(res.id.clone()), version: "nope".into() }, &token())
    .await
    .unwrap_err();
  assert_eq!(err.code(), Code::Aborted);

  let req = DeleteRequest { id: Some(res.id.clone()), version: res.version.clone() };
  svc.delete(req.clone(), &token()).await.unwrap();
  svc.delete(req, &token()).await.unwrap();
}

#[tokio::test]
async fn list_returns_one_type() {
  let svc = service();
  create(&svc, artist("artist-1")).await;
  create(&svc, artist("artist-2")).await;
  let mut album = artist("album-1");
  album.id.ty = Some(album_type());
  create(&svc, album).await;

  let artists = svc
    .list(ListRequest { ty: Some(artist_type()), ..Default::default() })
    .await
    .unwrap();
  let names: Vec<_> = artists.iter().map(|r| r.id.name.as_str()).collect();
  assert_eq!(names, ["artist-1", "artist-2"]);

  let err = svc
    .list(ListRequest { ty: Some(Type::new("demo", "v2", "Label")), ..Default::default() })
    .await
    .unwrap_err();
  assert_eq!(err.code(), Code::InvalidArgument);
}
