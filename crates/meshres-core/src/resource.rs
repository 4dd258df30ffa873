//! Resource types — the unit of storage in the mesh control plane.
//!
//! A resource is a uniformly-shaped envelope around an opaque JSON payload.
//! The envelope carries identity, two version tokens and a status map with
//! one entry per reporting controller.
//!
//! Request-facing identity fields are optional so that a missing `type` or
//! `tenancy` reaches the validation layer instead of failing deserialisation.

use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Type ────────────────────────────────────────────────────────────────────

/// The (group, group-version, kind) triple identifying a schema.
#[derive(
  Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(default)]
pub struct Type {
  pub group:         String,
  pub group_version: String,
  pub kind:          String,
}

impl Type {
  pub fn new(
    group: impl Into<String>,
    group_version: impl Into<String>,
    kind: impl Into<String>,
  ) -> Self {
    Self {
      group:         group.into(),
      group_version: group_version.into(),
      kind:          kind.into(),
    }
  }
}

impl fmt::Display for Type {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}.{}.{}", self.group, self.group_version, self.kind)
  }
}

/// Parses the `group.version.kind` form produced by `Display`. The group may
/// itself contain dots; the last two segments are always version and kind.
impl FromStr for Type {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let mut parts = s.rsplitn(3, '.');
    match (parts.next(), parts.next(), parts.next()) {
      (Some(kind), Some(version), Some(group))
        if !kind.is_empty() && !version.is_empty() && !group.is_empty() =>
      {
        Ok(Type::new(group, version, kind))
      }
      _ => Err(format!("expected group.version.kind, got {s:?}")),
    }
  }
}

// ─── Tenancy ─────────────────────────────────────────────────────────────────

/// Where a resource lives. Empty fields are filled in from the registered
/// scope before the resource reaches storage.
#[derive(
  Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(default)]
pub struct Tenancy {
  pub partition: String,
  pub namespace: String,
  pub peer_name: String,
}

impl Tenancy {
  pub fn new(
    partition: impl Into<String>,
    namespace: impl Into<String>,
    peer_name: impl Into<String>,
  ) -> Self {
    Self {
      partition: partition.into(),
      namespace: namespace.into(),
      peer_name: peer_name.into(),
    }
  }
}

// ─── Identity ────────────────────────────────────────────────────────────────

/// Identity of a resource instance as it appears on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Id {
  #[serde(rename = "type")]
  pub ty:      Option<Type>,
  pub tenancy: Option<Tenancy>,
  pub name:    String,
  /// Minted by the server on create; distinguishes successive resources that
  /// reuse the same name.
  pub uid:     String,
}

impl Id {
  /// The storage key, if type and tenancy are both present.
  pub fn key(&self) -> Option<ResourceKey> {
    Some(ResourceKey {
      ty:      self.ty.clone()?,
      tenancy: self.tenancy.clone()?,
      name:    self.name.clone(),
    })
  }
}

/// The identity a backend keys on: everything in [`Id`] except the `uid`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceKey {
  pub ty:      Type,
  pub tenancy: Tenancy,
  pub name:    String,
}

impl ResourceKey {
  pub fn to_id(&self, uid: impl Into<String>) -> Id {
    Id {
      ty:      Some(self.ty.clone()),
      tenancy: Some(self.tenancy.clone()),
      name:    self.name.clone(),
      uid:     uid.into(),
    }
  }
}

impl fmt::Display for ResourceKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{}/{}/{}/{}/{}",
      self.ty,
      self.tenancy.partition,
      self.tenancy.peer_name,
      self.tenancy.namespace,
      self.name
    )
  }
}

/// A pointer to another resource, without its `uid`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Reference {
  #[serde(rename = "type")]
  pub ty:      Option<Type>,
  pub tenancy: Option<Tenancy>,
  pub name:    String,
  /// Optional free-text pointer into a part of the referenced resource.
  pub section: String,
}

impl Reference {
  pub fn to(id: &Id, section: impl Into<String>) -> Self {
    Self {
      ty:      id.ty.clone(),
      tenancy: id.tenancy.clone(),
      name:    id.name.clone(),
      section: section.into(),
    }
  }
}

// ─── Status ──────────────────────────────────────────────────────────────────

/// Tri-state truth value of a [`Condition`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum State {
  #[default]
  Unknown,
  True,
  False,
}

/// A single fact reported by a controller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Condition {
  /// Discriminator such as `"Ready"` or `"AlbumCreated"`.
  #[serde(rename = "type")]
  pub ty:       String,
  pub state:    State,
  pub reason:   String,
  pub message:  String,
  pub resource: Option<Reference>,
}

/// One controller's view of a resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Status {
  /// The resource generation this status was computed against.
  pub observed_generation: String,
  /// Ordered; the core preserves the order it was given.
  pub conditions:          Vec<Condition>,
}

// ─── Resource ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Resource {
  pub id:         Id,
  /// Changes on every successful write, body or status.
  pub version:    String,
  /// Changes only when the body (`data` or `metadata`) changes.
  pub generation: String,
  pub metadata:   BTreeMap<String, String>,
  /// Keyed by controller.
  pub status:     BTreeMap<String, Status>,
  pub data:       serde_json::Value,
}

impl Resource {
  /// Whether `self` and `other` carry the same body.
  pub fn body_eq(&self, other: &Resource) -> bool {
    self.data == other.data && self.metadata == other.metadata
  }
}

// ─── Tokens ──────────────────────────────────────────────────────────────────

/// Mint a fresh, globally unique `uid`.
pub fn new_uid() -> String { Uuid::now_v7().to_string() }

/// Mint a fresh generation token. Tokens are time-ordered.
pub fn new_generation() -> String { Uuid::now_v7().to_string() }

/// Whether `token` is syntactically a generation token.
pub fn is_generation(token: &str) -> bool { Uuid::parse_str(token).is_ok() }
