//! Encoding and decoding between resource types and SQLite columns.
//!
//! Identity is spread over plain text columns so it can be indexed. Metadata,
//! status and data are stored as compact JSON.

use meshres_core::resource::{Resource, ResourceKey, Tenancy, Type};

use crate::{Error, Result};

// ─── Key ─────────────────────────────────────────────────────────────────────

/// The seven key columns, owned so they can move into a connection closure.
#[derive(Debug, Clone)]
pub struct KeyColumns {
  pub group_name:    String,
  pub group_version: String,
  pub kind:          String,
  pub partition:     String,
  pub namespace:     String,
  pub peer_name:     String,
  pub name:          String,
}

impl KeyColumns {
  pub fn from_key(key: &ResourceKey) -> Self {
    Self {
      group_name:    key.ty.group.clone(),
      group_version: key.ty.group_version.clone(),
      kind:          key.ty.kind.clone(),
      partition:     key.tenancy.partition.clone(),
      namespace:     key.tenancy.namespace.clone(),
      peer_name:     key.tenancy.peer_name.clone(),
      name:          key.name.clone(),
    }
  }
}

// ─── Row type ────────────────────────────────────────────────────────────────

/// Raw strings for one `resources` row, in [`crate::schema::COLUMNS`] order.
pub struct RawResource {
  pub key:           KeyColumns,
  pub uid:           String,
  pub version:       String,
  pub generation:    String,
  pub metadata_json: String,
  pub status_json:   String,
  pub data_json:     String,
}

impl RawResource {
  pub fn from_resource(res: &Resource) -> Result<Self> {
    let key = res.id.key().ok_or(Error::IncompleteId)?;
    Ok(Self {
      key:           KeyColumns::from_key(&key),
      uid:           res.id.uid.clone(),
      version:       res.version.clone(),
      generation:    res.generation.clone(),
      metadata_json: serde_json::to_string(&res.metadata)?,
      status_json:   serde_json::to_string(&res.status)?,
      data_json:     serde_json::to_string(&res.data)?,
    })
  }

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      key:           KeyColumns {
        group_name:    row.get(0)?,
        group_version: row.get(1)?,
        kind:          row.get(2)?,
        partition:     row.get(3)?,
        namespace:     row.get(4)?,
        peer_name:     row.get(5)?,
        name:          row.get(6)?,
      },
      uid:           row.get(7)?,
      version:       row.get(8)?,
      generation:    row.get(9)?,
      metadata_json: row.get(10)?,
      status_json:   row.get(11)?,
      data_json:     row.get(12)?,
    })
  }

  pub fn into_resource(self) -> Result<Resource> {
    let k = self.key;
    let key = ResourceKey {
      ty:      Type::new(k.group_name, k.group_version, k.kind),
      tenancy: Tenancy::new(k.partition, k.namespace, k.peer_name),
      name:    k.name,
    };
    Ok(Resource {
      id:         key.to_id(self.uid),
      version:    self.version,
      generation: self.generation,
      metadata:   serde_json::from_str(&self.metadata_json)?,
      status:     serde_json::from_str(&self.status_json)?,
      data:       serde_json::from_str(&self.data_json)?,
    })
  }
}
