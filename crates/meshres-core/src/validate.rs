//! Request shape checks, run before any registry lookup or storage access.
//!
//! Every check for a request runs, and all failures are reported together as
//! a single [`Error::Validation`]. On success the storage key is returned, so
//! callers never re-derive identity from unchecked optional fields.

use crate::{
  Error, Result,
  error::FieldErrors,
  request::{DeleteRequest, ListRequest, ReadRequest, WriteRequest, WriteStatusRequest},
  resource::{Condition, Id, ResourceKey, Type, is_generation},
};

const REQUIRED: &str = "is required";

// ─── Requests ────────────────────────────────────────────────────────────────

pub fn write(req: &WriteRequest) -> Result<ResourceKey> {
  let mut errs = FieldErrors::default();
  let Some(res) = &req.resource else {
    errs.push("resource", REQUIRED);
    return finish(errs, None);
  };

  let key = check_id(&mut errs, "resource.id", Some(&res.id), false);
  if !res.status.is_empty() {
    errs.push(
      "resource.status",
      "can only be set through WriteStatus",
    );
  }
  finish(errs, key)
}

pub fn write_status(req: &WriteStatusRequest) -> Result<ResourceKey> {
  let mut errs = FieldErrors::default();
  let key = check_id(&mut errs, "id", req.id.as_ref(), true);

  if req.key.is_empty() {
    errs.push("key", REQUIRED);
  }

  match &req.status {
    None => errs.push("status", REQUIRED),
    Some(status) => {
      if status.observed_generation.is_empty() {
        errs.push("status.observed_generation", REQUIRED);
      } else if !is_generation(&status.observed_generation) {
        errs.push(
          "status.observed_generation",
          format!("{:?} is not a valid generation", status.observed_generation),
        );
      }
      for (i, cond) in status.conditions.iter().enumerate() {
        check_condition(&mut errs, &format!("status.conditions[{i}]"), cond);
      }
    }
  }

  finish(errs, key)
}

pub fn read(req: &ReadRequest) -> Result<ResourceKey> {
  let mut errs = FieldErrors::default();
  let key = check_id(&mut errs, "id", req.id.as_ref(), false);
  finish(errs, key)
}

pub fn delete(req: &DeleteRequest) -> Result<ResourceKey> {
  let mut errs = FieldErrors::default();
  let key = check_id(&mut errs, "id", req.id.as_ref(), false);
  finish(errs, key)
}

pub fn list(req: &ListRequest) -> Result<Type> {
  let mut errs = FieldErrors::default();
  check_type(&mut errs, "type", req.ty.as_ref());
  errs.into_result()?;
  req.ty.clone().ok_or_else(|| missing("type"))
}

// ─── Pieces ──────────────────────────────────────────────────────────────────

fn check_id(
  errs: &mut FieldErrors,
  path: &str,
  id: Option<&Id>,
  require_uid: bool,
) -> Option<ResourceKey> {
  let Some(id) = id else {
    errs.push(path, REQUIRED);
    return None;
  };

  check_type(errs, &format!("{path}.type"), id.ty.as_ref());
  if id.tenancy.is_none() {
    errs.push(format!("{path}.tenancy"), REQUIRED);
  }
  if id.name.is_empty() {
    errs.push(format!("{path}.name"), REQUIRED);
  }
  if require_uid && id.uid.is_empty() {
    errs.push(format!("{path}.uid"), REQUIRED);
  }

  id.key()
}

fn check_type(errs: &mut FieldErrors, path: &str, ty: Option<&Type>) {
  let Some(ty) = ty else {
    errs.push(path, REQUIRED);
    return;
  };
  if ty.group.is_empty() {
    errs.push(format!("{path}.group"), REQUIRED);
  }
  if ty.group_version.is_empty() {
    errs.push(format!("{path}.group_version"), REQUIRED);
  }
  if ty.kind.is_empty() {
    errs.push(format!("{path}.kind"), REQUIRED);
  }
}

fn check_condition(errs: &mut FieldErrors, path: &str, cond: &Condition) {
  if cond.ty.is_empty() {
    errs.push(format!("{path}.type"), REQUIRED);
  }
  // The related-resource reference is optional, but complete when present.
  if let Some(r) = &cond.resource {
    check_type(errs, &format!("{path}.resource.type"), r.ty.as_ref());
    if r.tenancy.is_none() {
      errs.push(format!("{path}.resource.tenancy"), REQUIRED);
    }
    if r.name.is_empty() {
      errs.push(format!("{path}.resource.name"), REQUIRED);
    }
  }
}

fn finish(errs: FieldErrors, key: Option<ResourceKey>) -> Result<ResourceKey> {
  errs.into_result()?;
  key.ok_or_else(|| missing("id"))
}

fn missing(field: &str) -> Error {
  let mut errs = FieldErrors::default();
  errs.push(field, REQUIRED);
  Error::Validation(errs)
}
