//! JSON RPC API for the meshres resource service.
//!
//! Exposes an axum [`Router`] backed by a [`ResourceService`] over any
//! [`Backend`]. TLS and auth are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = meshres_api::api_router(service, Duration::from_secs(30));
//! ```

pub mod error;
pub mod handlers;

use std::{future::Future, sync::Arc, time::Duration};

use axum::{Router, extract::FromRequest, routing::post};
use meshres_core::{ResourceService, backend::Backend};

pub use error::ApiError;

/// Path prefix shared by every endpoint.
pub const SERVICE_PREFIX: &str = "/resource.v1.ResourceService";

// ─── State ───────────────────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct ApiState<B> {
  pub service:         Arc<ResourceService<B>>,
  /// Upper bound on a single request, retries included.
  pub request_timeout: Duration,
}

impl<B> Clone for ApiState<B> {
  fn clone(&self) -> Self {
    Self { service: self.service.clone(), request_timeout: self.request_timeout }
  }
}

impl<B> ApiState<B> {
  /// Run a service call under the request timeout.
  async fn bounded<T>(
    &self,
    call: impl Future<Output = meshres_core::Result<T>>,
  ) -> Result<T, ApiError> {
    match tokio::time::timeout(self.request_timeout, call).await {
      Ok(result) => Ok(result?),
      Err(_) => Err(ApiError::Timeout(self.request_timeout)),
    }
  }
}

// ─── Extractor ───────────────────────────────────────────────────────────────

/// JSON request body whose rejection is reported as an [`ApiError`].
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct Body<T>(pub T);

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<B>(service: Arc<ResourceService<B>>, request_timeout: Duration) -> Router<()>
where
  B: Backend + 'static,
{
  let route = |method: &str| format!("{SERVICE_PREFIX}/{method}");
  Router::new()
    .route(&route("Write"), post(handlers::write::<B>))
    .route(&route("WriteStatus"), post(handlers::write_status::<B>))
    .route(&route("Read"), post(handlers::read::<B>))
    .route(&route("Delete"), post(handlers::delete::<B>))
    .route(&route("List"), post(handlers::list::<B>))
    .with_state(ApiState { service, request_timeout })
}

// ─── Tests ───────────────────────────────────────────────────────────────────
