//! Async HTTP client wrapping the meshres JSON API.

use anyhow::{Context, Result, anyhow};
use meshres_core::{
  Code,
  request::{
    DeleteRequest, ListRequest, ListResponse, ReadRequest, ResourceResponse, WriteRequest,
    WriteStatusRequest,
  },
  resource::Resource,
};
use reqwest::Client;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::time::Duration;

/// Connection settings for the meshres API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
  pub timeout:  Duration,
}

/// Error body returned by the server for every failed call.
#[derive(Debug, Deserialize)]
struct ErrorBody {
  code:    Code,
  message: String,
}

/// Async HTTP client for the meshres JSON API.
///
/// Cheap to clone — the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(config.timeout)
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config })
  }

  fn url(&self, method: &str) -> String {
    format!(
      "{}/resource.v1.ResourceService/{}",
      self.config.base_url.trim_end_matches('/'),
      method
    )
  }

  /// `POST /resource.v1.ResourceService/<method>` with a JSON body.
  async fn call<Req, Resp>(&self, method: &str, req: &Req) -> Result<Resp>
  where
    Req: Serialize,
    Resp: DeserializeOwned,
  {
    tracing::debug!(method, "calling resource service");
    let resp = self
      .client
      .post(self.url(method))
      .json(req)
      .send()
      .await
      .with_context(|| format!("{method} request failed"))?;

    let status = resp.status();
    if !status.is_success() {
      return Err(match resp.json::<ErrorBody>().await {
        Ok(body) => anyhow!("{method} → {status} {}: {}", body.code, body.message),
        Err(_) => anyhow!("{method} → {status}"),
      });
    }
    resp
      .json()
      .await
      .with_context(|| format!("deserialising {method} response"))
  }

  pub async fn write(&self, req: &WriteRequest) -> Result<Resource> {
    let resp: ResourceResponse = self.call("Write", req).await?;
    Ok(resp.resource)
  }

  pub async fn write_status(&self, req: &WriteStatusRequest) -> Result<Resource> {
    let resp: ResourceResponse = self.call("WriteStatus", req).await?;
    Ok(resp.resource)
  }

  pub async fn read(&self, req: &ReadRequest) -> Result<Resource> {
    let resp: ResourceResponse = self.call("Read", req).await?;
    Ok(resp.resource)
  }

  pub async fn delete(&self, req: &DeleteRequest) -> Result<()> {
    let _: serde_json::Value = self.call("Delete", req).await?;
    Ok(())
  }

  pub async fn list(&self, req: &ListRequest) -> Result<Vec<Resource>> {
    let resp: ListResponse = self.call("List", req).await?;
    Ok(resp.resources)
  }
}
