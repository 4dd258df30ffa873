//! Error types for `meshres-core`.
//!
//! Every error carries a [`Code`] so transports can map it to their own status
//! space without matching on variants.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::resource::Type;

// ─── Code ────────────────────────────────────────────────────────────────────

/// Client-visible classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Code {
  /// Malformed request: missing field, unregistered type, bad token.
  InvalidArgument,
  /// The referenced instance does not exist (or has a different `uid`).
  NotFound,
  /// An explicit version precondition failed.
  Aborted,
  Internal,
  /// The backend failed or the request was cancelled.
  Unavailable,
}

impl fmt::Display for Code {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::InvalidArgument => "invalid_argument",
      Self::NotFound => "not_found",
      Self::Aborted => "aborted",
      Self::Internal => "internal",
      Self::Unavailable => "unavailable",
    })
  }
}

// ─── Field errors ────────────────────────────────────────────────────────────

/// A single validation failure, addressed by a dotted field path such as
/// `status.conditions[0].resource.name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
  pub field:   String,
  pub problem: String,
}

impl fmt::Display for FieldError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}: {}", self.field, self.problem)
  }
}

/// All validation failures found in one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(pub Vec<FieldError>);

impl FieldErrors {
  pub fn push(&mut self, field: impl Into<String>, problem: impl Into<String>) {
    self.0.push(FieldError { field: field.into(), problem: problem.into() });
  }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  /// `Ok(())` when nothing was recorded, otherwise the aggregated error.
  pub fn into_result(self) -> Result<()> {
    if self.is_empty() { Ok(()) } else { Err(Error::Validation(self)) }
  }
}

impl fmt::Display for FieldErrors {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (i, e) in self.0.iter().enumerate() {
      if i > 0 {
        f.write_str("; ")?;
      }
      write!(f, "{e}")?;
    }
    Ok(())
  }
}

// ─── Error ───────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid request: {0}")]
  Validation(FieldErrors),

  #[error("resource type {0} not registered")]
  TypeNotRegistered(Type),

  #[error("resource type {0} already registered")]
  AlreadyRegistered(Type),

  /// Rejected by a registration's validate hook or its tenancy scope.
  #[error("invalid resource: {0}")]
  InvalidResource(String),

  #[error("resource not found: {0}")]
  NotFound(String),

  #[error("version mismatch on {resource}: expected {expected:?}")]
  VersionMismatch { resource: String, expected: String },

  #[error("gave up after {attempts} conflicting writes to {resource}")]
  RetriesExhausted { resource: String, attempts: u32 },

  #[error("request cancelled")]
  Cancelled,

  #[error("backend error: {0}")]
  Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap any backend error.
  pub fn backend(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Backend(Box::new(e))
  }

  pub fn code(&self) -> Code {
    match self {
      Self::Validation(_)
      | Self::TypeNotRegistered(_)
      | Self::AlreadyRegistered(_)
      | Self::InvalidResource(_) => Code::InvalidArgument,
      Self::NotFound(_) => Code::NotFound,
      Self::VersionMismatch { .. } => Code::Aborted,
      Self::RetriesExhausted { .. } => Code::Internal,
      Self::Cancelled | Self::Backend(_) => Code::Unavailable,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
