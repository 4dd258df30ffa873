//! [`SqliteStore`] — the SQLite implementation of [`Backend`].

use std::path::Path;

use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use meshres_core::{
  backend::{Backend, Cas},
  resource::{Resource, ResourceKey, Tenancy, Type},
};

use crate::{
  Result,
  encode::{KeyColumns, RawResource},
  schema::{COLUMNS, KEY_WHERE, SCHEMA},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A resource backend stored in a single SQLite file.
///
/// All statements run on the one connection thread owned by
/// [`tokio_rusqlite`], and each CAS runs inside its own transaction, so a
/// version check and the write that depends on it can never interleave with
/// another writer.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Backend impl ────────────────────────────────────────────────────────────

impl Backend for SqliteStore {
  type Error = crate::Error;

  async fn read(&self, key: &ResourceKey) -> Result<Option<Resource>> {
    let k = KeyColumns::from_key(key);

    let raw: Option<RawResource> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {COLUMNS} FROM resources WHERE {KEY_WHERE}"),
              rusqlite::params![
                k.group_name,
                k.group_version,
                k.kind,
                k.partition,
                k.namespace,
                k.peer_name,
                k.name,
              ],
              RawResource::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawResource::into_resource).transpose()
  }

  async fn write_cas(
    &self,
    mut resource: Resource,
    expected_version: String,
  ) -> Result<Cas<Resource>> {
    resource.version = Uuid::now_v7().to_string();
    let raw = RawResource::from_resource(&resource)?;
    let expected = expected_version.clone();

    let applied = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let k = &raw.key;

        let current: Option<String> = tx
          .query_row(
            &format!("SELECT version FROM resources WHERE {KEY_WHERE}"),
            rusqlite::params![
              k.group_name,
              k.group_version,
              k.kind,
              k.partition,
              k.namespace,
              k.peer_name,
              k.name,
            ],
            |row| row.get(0),
          )
          .optional()?;

        // Dropping `tx` without committing rolls back.
        if current.as_deref().unwrap_or("") != expected {
          return Ok(false);
        }

        tx.execute(
          &format!(
            "INSERT OR REPLACE INTO resources ({COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"
          ),
          rusqlite::params![
            k.group_name,
            k.group_version,
            k.kind,
            k.partition,
            k.namespace,
            k.peer_name,
            k.name,
            raw.uid,
            raw.version,
            raw.generation,
            raw.metadata_json,
            raw.status_json,
            raw.data_json,
          ],
        )?;
        tx.commit()?;
        Ok(true)
      })
      .await?;

    if applied {
      Ok(Cas::Applied(resource))
    } else {
      tracing::trace!(expected = %expected_version, "sqlite cas conflict");
      Ok(Cas::Conflict)
    }
  }

  async fn delete_cas(&self, key: &ResourceKey, expected_version: &str) -> Result<Cas<()>> {
    let k = KeyColumns::from_key(key);
    let expected = expected_version.to_owned();

    let deleted = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          &format!("DELETE FROM resources WHERE {KEY_WHERE} AND version = ?8"),
          rusqlite::params![
            k.group_name,
            k.group_version,
            k.kind,
            k.partition,
            k.namespace,
            k.peer_name,
            k.name,
            expected,
          ],
        )?;
        Ok(n)
      })
      .await?;

    Ok(if deleted == 1 { Cas::Applied(()) } else { Cas::Conflict })
  }

  async fn list(
    &self,
    ty: &Type,
    tenancy: &Tenancy,
    name_prefix: &str,
  ) -> Result<Vec<Resource>> {
    let ty = ty.clone();
    let tenancy = tenancy.clone();
    let prefix = name_prefix.to_owned();

    let raws: Vec<RawResource> = self
      .conn
      .call(move |conn| {
        // Empty tenancy parameters act as wildcards.
        let mut stmt = conn.prepare(&format!(
          "SELECT {COLUMNS} FROM resources
           WHERE group_name = ?1 AND group_version = ?2 AND kind = ?3
             AND (?4 = '' OR partition = ?4)
             AND (?5 = '' OR namespace = ?5)
             AND (?6 = '' OR peer_name = ?6)
             AND substr(name, 1, length(?7)) = ?7
           ORDER BY partition, namespace, peer_name, name"
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![
              ty.group,
              ty.group_version,
              ty.kind,
              tenancy.partition,
              tenancy.namespace,
              tenancy.peer_name,
              prefix,
            ],
            RawResource::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawResource::into_resource).collect()
  }
}
