//! Request and response messages for the resource service.

use serde::{Deserialize, Serialize};

use crate::resource::{Id, Resource, Status, Tenancy, Type};

/// Create or replace a resource body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WriteRequest {
  /// `resource.version` non-empty means a strict CAS write.
  pub resource: Option<Resource>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WriteStatusRequest {
  pub id:      Option<Id>,
  /// Empty means "retry until my status lands".
  pub version: String,
  /// The controller key that owns `status`.
  pub key:     String,
  pub status:  Option<Status>,
}

impl WriteStatusRequest {
  pub fn new(id: Id, key: impl Into<String>, status: Status) -> Self {
    Self { id: Some(id), version: String::new(), key: key.into(), status: Some(status) }
  }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadRequest {
  pub id: Option<Id>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeleteRequest {
  pub id:      Option<Id>,
  pub version: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ListRequest {
  #[serde(rename = "type")]
  pub ty:          Option<Type>,
  /// Empty fields match any value.
  pub tenancy:     Option<Tenancy>,
  pub name_prefix: String,
}

/// Response for `Write`, `WriteStatus` and `Read`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceResponse {
  pub resource: Resource,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse {
  pub resources: Vec<Resource>,
}
