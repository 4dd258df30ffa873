//! SQL schema for the meshres SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- One row per live resource. Deleting a resource deletes its row, which is
-- what invalidates its uid.
CREATE TABLE IF NOT EXISTS resources (
    group_name    TEXT NOT NULL,
    group_version TEXT NOT NULL,
    kind          TEXT NOT NULL,
    partition     TEXT NOT NULL,
    namespace     TEXT NOT NULL,
    peer_name     TEXT NOT NULL,
    name          TEXT NOT NULL,
    uid           TEXT NOT NULL,
    version       TEXT NOT NULL,   -- minted by the store on every write
    generation    TEXT NOT NULL,   -- minted by the service on body changes
    metadata_json TEXT NOT NULL DEFAULT '{}',
    status_json   TEXT NOT NULL DEFAULT '{}',
    data_json     TEXT NOT NULL DEFAULT 'null',
    PRIMARY KEY (group_name, group_version, kind, partition, namespace, peer_name, name)
);

CREATE INDEX IF NOT EXISTS resources_uid_idx ON resources(uid);

PRAGMA user_version = 1;
";

/// Matches exactly one row by storage key, parameters `?1`..`?7`.
pub const KEY_WHERE: &str = "group_name = ?1 AND group_version = ?2 AND kind = ?3
   AND partition = ?4 AND namespace = ?5 AND peer_name = ?6 AND name = ?7";

pub const COLUMNS: &str = "group_name, group_version, kind, partition, namespace,
   peer_name, name, uid, version, generation, metadata_json, status_json, data_json";
