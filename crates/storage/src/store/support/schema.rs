#![forbid(unsafe_code)]

use super::time::now_ms;
use crate::store::StoreError;
use rusqlite::{Connection, OptionalExtension, params};
use std::collections::BTreeSet;

const SCHEMA_VERSION: &str = "1";

const REQUIRED_TABLES: [&str; 11] = [
    "history_meta",
    "history_structure",
    "history_resources",
    "history_contents",
    "history_property_defs",
    "history_properties",
    "history_principals",
    "history_projects",
    "history_project_resources",
    "visits",
    "subscriptions",
];

/// Refuses databases written by another schema generation. An empty file passes.
pub(in crate::store) fn preflight_gate(conn: &Connection) -> Result<(), StoreError> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
    )?;
    let mut rows = stmt.query([])?;
    let mut tables = BTreeSet::new();
    while let Some(row) = rows.next()? {
        tables.insert(row.get::<_, String>(0)?);
    }

    if tables.is_empty() {
        return Ok(());
    }

    let required: BTreeSet<&str> = REQUIRED_TABLES.into_iter().collect();
    if tables
        .iter()
        .any(|table| !required.contains(table.as_str()))
    {
        return Err(StoreError::InvalidInput(
            "RESET_REQUIRED: unsupported tables detected",
        ));
    }
    if required.iter().any(|table| !tables.contains(*table)) {
        return Err(StoreError::InvalidInput(
            "RESET_REQUIRED: required table is missing",
        ));
    }

    let version = conn
        .query_row(
            "SELECT value FROM history_meta WHERE key='schema_version'",
            [],
            |row| row.get::<_, String>(0),
        )
        .optional()?;

    match version.as_deref() {
        Some(SCHEMA_VERSION) => Ok(()),
        Some(_) => Err(StoreError::InvalidInput(
            "RESET_REQUIRED: schema version mismatch",
        )),
        None => Err(StoreError::InvalidInput(
            "RESET_REQUIRED: schema version row is missing",
        )),
    }
}

pub(in crate::store) fn install_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode=WAL;
        PRAGMA synchronous=NORMAL;

        CREATE TABLE IF NOT EXISTS history_meta (
          key TEXT PRIMARY KEY,
          value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS history_structure (
          structure_id TEXT NOT NULL,
          resource_id TEXT NOT NULL,
          path TEXT NOT NULL,
          parent_id TEXT NOT NULL,
          date_released INTEGER NOT NULL,
          date_expired INTEGER NOT NULL,
          state INTEGER NOT NULL,
          structure_version INTEGER NOT NULL,
          publish_tag INTEGER NOT NULL,
          PRIMARY KEY(structure_id, publish_tag)
        );
        CREATE INDEX IF NOT EXISTS idx_history_structure_resource
          ON history_structure(resource_id, publish_tag);
        CREATE INDEX IF NOT EXISTS idx_history_structure_parent
          ON history_structure(parent_id);

        CREATE TABLE IF NOT EXISTS history_resources (
          resource_id TEXT NOT NULL,
          type_id INTEGER NOT NULL,
          flags INTEGER NOT NULL,
          size INTEGER NOT NULL,
          date_content INTEGER NOT NULL,
          date_created INTEGER NOT NULL,
          user_created TEXT NOT NULL,
          date_last_modified INTEGER NOT NULL,
          user_last_modified TEXT NOT NULL,
          state INTEGER NOT NULL,
          sibling_count INTEGER NOT NULL,
          resource_version INTEGER NOT NULL,
          publish_tag INTEGER NOT NULL,
          PRIMARY KEY(resource_id, publish_tag)
        );

        CREATE TABLE IF NOT EXISTS history_contents (
          resource_id TEXT NOT NULL,
          publish_tag INTEGER NOT NULL,
          data BLOB NOT NULL,
          keep_permanently INTEGER NOT NULL DEFAULT 0,
          PRIMARY KEY(resource_id, publish_tag)
        );

        CREATE TABLE IF NOT EXISTS history_property_defs (
          def_id TEXT PRIMARY KEY,
          name TEXT NOT NULL UNIQUE
        );

        CREATE TABLE IF NOT EXISTS history_properties (
          structure_id TEXT NOT NULL,
          mapping_id TEXT NOT NULL,
          def_id TEXT NOT NULL,
          mapping_type INTEGER NOT NULL CHECK(mapping_type IN (1, 2)),
          value TEXT NOT NULL,
          publish_tag INTEGER NOT NULL,
          FOREIGN KEY(def_id) REFERENCES history_property_defs(def_id) ON DELETE RESTRICT
        );
        CREATE INDEX IF NOT EXISTS idx_history_properties_structure
          ON history_properties(structure_id, publish_tag);
        CREATE INDEX IF NOT EXISTS idx_history_properties_mapping
          ON history_properties(mapping_id, mapping_type, publish_tag);

        CREATE TABLE IF NOT EXISTS history_principals (
          principal_id TEXT PRIMARY KEY,
          name TEXT NOT NULL,
          ou TEXT NOT NULL,
          description TEXT NOT NULL,
          email TEXT NOT NULL,
          kind TEXT NOT NULL,
          deleted_by TEXT NOT NULL,
          deleted_date INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS history_projects (
          publish_tag INTEGER PRIMARY KEY,
          project_id TEXT NOT NULL,
          name TEXT NOT NULL,
          description TEXT NOT NULL,
          owner_id TEXT NOT NULL,
          user_group_id TEXT NOT NULL,
          manager_group_id TEXT NOT NULL,
          date_created INTEGER NOT NULL,
          published_by TEXT NOT NULL,
          publish_date INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS history_project_resources (
          publish_tag INTEGER NOT NULL,
          path TEXT NOT NULL,
          PRIMARY KEY(publish_tag, path)
        );

        CREATE TABLE IF NOT EXISTS visits (
          user_id TEXT NOT NULL,
          structure_id TEXT NOT NULL,
          date_visited INTEGER NOT NULL,
          PRIMARY KEY(user_id, structure_id)
        );

        CREATE TABLE IF NOT EXISTS subscriptions (
          principal_id TEXT NOT NULL,
          structure_id TEXT NOT NULL,
          date_deleted INTEGER NOT NULL DEFAULT 0,
          PRIMARY KEY(principal_id, structure_id)
        );
        "#,
    )?;

    let now_ms = now_ms();
    conn.execute(
        "INSERT OR IGNORE INTO history_meta(key, value) VALUES ('schema_version', ?1)",
        params![SCHEMA_VERSION],
    )?;
    conn.execute(
        "INSERT OR IGNORE INTO history_meta(key, value) VALUES ('created_at_ms', ?1)",
        params![now_ms.to_string()],
    )?;
    Ok(())
}
