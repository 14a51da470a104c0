//! Query sets over the two mapping rowset forms
//!
//! - `MappingQuerySet`: normalized `mapping` joined through its history chain,
//!   grouped ascending, stale snapshots filtered, duplicates dropped
//! - `MappingViewQuerySet`: denormalized `mapping_view`, grouped descending
//!
//! Each instance owns its group-count memo. Narrowing with `filter` returns a
//! new instance with an empty memo.

pub mod mapping;
pub mod view;

pub use mapping::{MappingField, MappingQuerySet};
pub use view::{MappingViewQuerySet, ViewFacets, ViewField};

use crate::counts::RowSetSql;
use crate::error::GroupingResult;
use crate::pager::RowRange;
use crate::sqlite_pragma::prepare;
use rusqlite::types::Value;
use rusqlite::{Connection, Row};

pub(crate) fn count_rows(conn: &Connection, rowset: &RowSetSql) -> GroupingResult<u64> {
    let sql = format!(
        "SELECT COUNT(*) {from}{where_sql}",
        from = rowset.from,
        where_sql = rowset.where_sql
    );
    let mut stmt = prepare(conn, &sql)?;
    let count: i64 = stmt.query_row(rusqlite::params_from_iter(rowset.params.iter()), |row| row.get(0))?;
    Ok(count as u64)
}

pub(crate) fn count_distinct(conn: &Connection, rowset: &RowSetSql, column: &str) -> GroupingResult<u64> {
    let sql = format!(
        "SELECT COUNT(DISTINCT {column}) {from}{where_sql}",
        column = column,
        from = rowset.from,
        where_sql = rowset.where_sql
    );
    let mut stmt = prepare(conn, &sql)?;
    let count: i64 = stmt.query_row(rusqlite::params_from_iter(rowset.params.iter()), |row| row.get(0))?;
    Ok(count as u64)
}

/// Fetch one row window in group order
///
/// `tiebreak` orders rows inside a group so consecutive windows never overlap.
pub(crate) fn fetch_range<T, F>(
    conn: &Connection,
    rowset: &RowSetSql,
    columns: &str,
    tiebreak: &str,
    range: RowRange,
    map: F,
) -> GroupingResult<Vec<T>>
where
    F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
{
    if range.is_empty() {
        return Ok(Vec::new());
    }

    let sql = format!(
        "SELECT {columns} {from}{where_sql} ORDER BY {order}, {tiebreak} LIMIT ? OFFSET ?",
        columns = columns,
        from = rowset.from,
        where_sql = rowset.where_sql,
        order = rowset.group_order_by(),
        tiebreak = tiebreak,
    );

    let mut params = rowset.params.clone();
    params.push(Value::Integer(range.count as i64));
    params.push(Value::Integer(range.offset as i64));

    let mut stmt = prepare(conn, &sql)?;
    let rows = stmt.query_map(rusqlite::params_from_iter(params.iter()), map)?;

    let mut fetched = Vec::with_capacity(range.count as usize);
    for row in rows {
        fetched.push(row?);
    }

    log::debug!(
        "Fetched {} rows for window offset={} count={}",
        fetched.len(),
        range.offset,
        range.count
    );

    Ok(fetched)
}
