//! Per-group row counts over an ordered rowset
//!
//! The count sequence drives offset arithmetic for the ranged fetch, so the
//! same `ORDER BY` is used for counting and fetching, and the sequence is
//! memoized by the query-set instance that owns the index.

use crate::error::GroupingResult;
use crate::sqlite_pragma::prepare;
use crate::types::GroupCount;
use rusqlite::types::Value;
use rusqlite::Connection;
use std::cell::OnceCell;

/// Direction of the group ordering
///
/// NULL keys sort last when ascending and first when descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn order_by(&self, column: &str) -> String {
        match self {
            SortOrder::Ascending => format!("{col} IS NULL, {col} ASC", col = column),
            SortOrder::Descending => format!("{col} IS NOT NULL, {col} DESC", col = column),
        }
    }
}

/// SQL shape of one filtered, ordered rowset
#[derive(Debug, Clone)]
pub struct RowSetSql {
    /// `FROM ...` including joins
    pub from: &'static str,
    /// ` WHERE ...` or empty
    pub where_sql: String,
    pub params: Vec<Value>,
    pub key_column: &'static str,
    pub order: SortOrder,
}

impl RowSetSql {
    pub fn group_order_by(&self) -> String {
        self.order.order_by(self.key_column)
    }
}

/// Memoized `(GroupKey, total)` sequence for one query object
///
/// Not `Sync`; each request builds its own query set and therefore its own
/// index.
#[derive(Debug, Default)]
pub struct GroupCountIndex {
    memo: OnceCell<Vec<GroupCount>>,
}

impl GroupCountIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts in group order, computed on first call only
    pub fn counts(&self, conn: &Connection, rowset: &RowSetSql) -> GroupingResult<&[GroupCount]> {
        if let Some(counts) = self.memo.get() {
            log::debug!("Group counts memo hit ({} groups)", counts.len());
            return Ok(counts);
        }

        let computed = query_group_counts(conn, rowset)?;
        log::debug!("Computed group counts ({} groups)", computed.len());

        Ok(self.memo.get_or_init(|| computed))
    }

    pub fn is_computed(&self) -> bool {
        self.memo.get().is_some()
    }
}

/// Count every row per group key, NULL keys included
pub fn query_group_counts(conn: &Connection, rowset: &RowSetSql) -> GroupingResult<Vec<GroupCount>> {
    let sql = format!(
        "SELECT {key}, COUNT(*) {from}{where_sql} GROUP BY {key} ORDER BY {order}",
        key = rowset.key_column,
        from = rowset.from,
        where_sql = rowset.where_sql,
        order = rowset.group_order_by(),
    );

    let mut stmt = prepare(conn, &sql)?;
    let rows = stmt.query_map(rusqlite::params_from_iter(rowset.params.iter()), |row| {
        Ok(GroupCount {
            grouping_id: row.get(0)?,
            total: row.get::<_, i64>(1)? as u64,
        })
    })?;

    let mut counts = Vec::new();
    for count in rows {
        counts.push(count?);
    }

    Ok(counts)
}
