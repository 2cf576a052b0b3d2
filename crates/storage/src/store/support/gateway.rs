#![forbid(unsafe_code)]

use super::queries::Query;
use crate::store::StoreError;
use hist_core::history::{ResourceSnapshot, ResourceState, StructureSnapshot};
use rusqlite::types::{FromSql, Type};
use rusqlite::{Connection, OptionalExtension, Params, Row};
use uuid::Uuid;

pub(in crate::store) fn query_rows<T, P, F>(
    conn: &Connection,
    query: Query,
    params: P,
    map: F,
) -> Result<Vec<T>, StoreError>
where
    P: Params,
    F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
{
    collect_rows(conn, query, params, map).map_err(|err| StoreError::storage(query, err))
}

pub(in crate::store) fn query_opt<T, P, F>(
    conn: &Connection,
    query: Query,
    params: P,
    map: F,
) -> Result<Option<T>, StoreError>
where
    P: Params,
    F: FnOnce(&Row<'_>) -> rusqlite::Result<T>,
{
    single_row(conn, query, params, map).map_err(|err| StoreError::storage(query, err))
}

/// First column of a single-row aggregate; SQL `NULL` becomes `None`.
pub(in crate::store) fn query_scalar<T, P>(
    conn: &Connection,
    query: Query,
    params: P,
) -> Result<Option<T>, StoreError>
where
    T: FromSql,
    P: Params,
{
    let value = query_opt(conn, query, params, |row| row.get::<_, Option<T>>(0))?;
    Ok(value.flatten())
}

pub(in crate::store) fn execute<P: Params>(
    conn: &Connection,
    query: Query,
    params: P,
) -> Result<usize, StoreError> {
    conn.prepare_cached(query.sql())
        .and_then(|mut stmt| stmt.execute(params))
        .map_err(|err| StoreError::storage(query, err))
}

fn collect_rows<T, P, F>(conn: &Connection, query: Query, params: P, map: F) -> rusqlite::Result<Vec<T>>
where
    P: Params,
    F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
{
    let mut stmt = conn.prepare_cached(query.sql())?;
    let rows = stmt.query_map(params, map)?;
    rows.collect()
}

fn single_row<T, P, F>(conn: &Connection, query: Query, params: P, map: F) -> rusqlite::Result<Option<T>>
where
    P: Params,
    F: FnOnce(&Row<'_>) -> rusqlite::Result<T>,
{
    let mut stmt = conn.prepare_cached(query.sql())?;
    stmt.query_row(params, map).optional()
}

pub(in crate::store) fn id_at<I: From<Uuid>>(row: &Row<'_>, idx: usize) -> rusqlite::Result<I> {
    let raw = row.get::<_, String>(idx)?;
    Uuid::parse_str(&raw)
        .map(I::from)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err)))
}

pub(in crate::store) fn state_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<ResourceState> {
    let code = row.get::<_, i64>(idx)?;
    ResourceState::from_code(code).ok_or(rusqlite::Error::IntegralValueOutOfRange(idx, code))
}

pub(in crate::store) fn structure_at(row: &Row<'_>) -> rusqlite::Result<StructureSnapshot> {
    Ok(StructureSnapshot {
        structure_id: id_at(row, 0)?,
        resource_id: id_at(row, 1)?,
        path: row.get(2)?,
        parent_id: id_at(row, 3)?,
        date_released: row.get(4)?,
        date_expired: row.get(5)?,
        state: state_at(row, 6)?,
        structure_version: row.get(7)?,
        publish_tag: row.get(8)?,
    })
}

/// Reads a resource snapshot whose columns start at `offset`.
pub(in crate::store) fn resource_at(row: &Row<'_>, offset: usize) -> rusqlite::Result<ResourceSnapshot> {
    Ok(ResourceSnapshot {
        resource_id: id_at(row, offset)?,
        type_id: row.get(offset + 1)?,
        flags: row.get(offset + 2)?,
        size: row.get(offset + 3)?,
        date_content: row.get(offset + 4)?,
        date_created: row.get(offset + 5)?,
        user_created: id_at(row, offset + 6)?,
        date_last_modified: row.get(offset + 7)?,
        user_last_modified: id_at(row, offset + 8)?,
        state: state_at(row, offset + 9)?,
        sibling_count: row.get(offset + 10)?,
        resource_version: row.get(offset + 11)?,
        publish_tag: row.get(offset + 12)?,
    })
}
