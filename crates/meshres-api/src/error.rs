//! API error type and [`axum::response::IntoResponse`] implementation.

use std::time::Duration;

use axum::{
  Json,
  extract::rejection::JsonRejection,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use meshres_core::Code;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error(transparent)]
  Service(#[from] meshres_core::Error),

  #[error("malformed request body: {0}")]
  Body(#[from] JsonRejection),

  #[error("request did not complete within {0:?}")]
  Timeout(Duration),
}

impl ApiError {
  pub fn code(&self) -> Code {
    match self {
      ApiError::Service(e) => e.code(),
      ApiError::Body(_) => Code::InvalidArgument,
      ApiError::Timeout(_) => Code::Unavailable,
    }
  }
}

/// HTTP status for each error code.
pub fn status_for(code: Code) -> StatusCode {
  match code {
    Code::InvalidArgument => StatusCode::BAD_REQUEST,
    Code::NotFound => StatusCode::NOT_FOUND,
    Code::Aborted => StatusCode::CONFLICT,
    Code::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    Code::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let code = self.code();
    let message = self.to_string();
    match code {
      Code::Internal | Code::Unavailable => tracing::warn!(%code, "{message}"),
      _ => tracing::debug!(%code, "{message}"),
    }
    (status_for(code), Json(json!({ "code": code, "message": message }))).into_response()
  }
}
