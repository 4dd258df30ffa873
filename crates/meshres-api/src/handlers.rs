//! Handlers for the `/resource.v1.ResourceService/*` endpoints.
//!
//! | Path | Body | Response |
//! |------|------|----------|
//! | `Write` | `{"resource": ...}` | `{"resource": ...}` |
//! | `WriteStatus` | `{"id", "version", "key", "status"}` | `{"resource": ...}` |
//! | `Read` | `{"id": ...}` | `{"resource": ...}` |
//! | `Delete` | `{"id", "version"}` | `{}` |
//! | `List` | `{"type", "tenancy", "name_prefix"}` | `{"resources": [...]}` |

use axum::{Json, extract::State};
use meshres_core::{
  backend::Backend,
  request::{
    DeleteRequest, ListRequest, ListResponse, ReadRequest, ResourceResponse, WriteRequest,
    WriteStatusRequest,
  },
};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

use crate::{ApiState, Body, error::ApiError};

/// A token that is cancelled once the handler finishes or is dropped.
fn request_token() -> (CancellationToken, tokio_util::sync::DropGuard) {
  let token = CancellationToken::new();
  let guard = token.clone().drop_guard();
  (token, guard)
}

// ─── Write ───────────────────────────────────────────────────────────────────

pub async fn write<B: Backend + 'static>(
  State(state): State<ApiState<B>>,
  Body(req): Body<WriteRequest>,
) -> Result<Json<ResourceResponse>, ApiError> {
  let (cancel, _guard) = request_token();
  let resource = state.bounded(state.service.write(req, &cancel)).await?;
  Ok(Json(ResourceResponse { resource }))
}

pub async fn write_status<B: Backend + 'static>(
  State(state): State<ApiState<B>>,
  Body(req): Body<WriteStatusRequest>,
) -> Result<Json<ResourceResponse>, ApiError> {
  let (cancel, _guard) = request_token();
  let resource = state
    .bounded(state.service.write_status(req, &cancel))
    .await?;
  Ok(Json(ResourceResponse { resource }))
}

// ─── Read / Delete / List ────────────────────────────────────────────────────

pub async fn read<B: Backend + 'static>(
  State(state): State<ApiState<B>>,
  Body(req): Body<ReadRequest>,
) -> Result<Json<ResourceResponse>, ApiError> {
  let resource = state.bounded(state.service.read(req)).await?;
  Ok(Json(ResourceResponse { resource }))
}

pub async fn delete<B: Backend + 'static>(
  State(state): State<ApiState<B>>,
  Body(req): Body<DeleteRequest>,
) -> Result<Json<Value>, ApiError> {
  let (cancel, _guard) = request_token();
  state.bounded(state.service.delete(req, &cancel)).await?;
  Ok(Json(json!({})))
}

pub async fn list<B: Backend + 'static>(
  State(state): State<ApiState<B>>,
  Body(req): Body<ListRequest>,
) -> Result<Json<ListResponse>, ApiError> {
  let resources = state.bounded(state.service.list(req)).await?;
  Ok(Json(ListResponse { resources }))
}
