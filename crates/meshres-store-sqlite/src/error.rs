//! Error type for `meshres-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  /// A resource handed to the store had no type or tenancy in its id.
  #[error("resource id is missing its type or tenancy")]
  IncompleteId,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
