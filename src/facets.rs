//! Summary facets over a filtered rowset
//!
//! Facets ignore grouping entirely; they reduce whatever rows the filter
//! selects.

use crate::counts::RowSetSql;
use crate::error::GroupingResult;
use crate::filter::{Field, Filter};
use crate::sqlite_pragma::prepare;
use crate::types::Species;
use rusqlite::{Connection, Row};
use serde::Serialize;

/// Alignment-difference histogram
///
/// Rows with a NULL difference fall in no bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Divergences {
    /// difference == 0
    pub identical: u64,
    /// 0 < difference <= 5
    pub small: u64,
    /// difference > 5
    pub large: u64,
}

impl Divergences {
    pub const SMALL_MAX: i64 = 5;

    pub fn as_array(&self) -> [u64; 3] {
        [self.identical, self.small, self.large]
    }

    pub fn total(&self) -> u64 {
        self.identical + self.small + self.large
    }
}

/// A query set that can be narrowed and counted
pub trait Facetable: Sized {
    type Field: Field;

    /// Field holding the integer alignment difference
    const ALIGNMENT_DIFFERENCE: Self::Field;

    fn narrowed(&self, extra: Filter<Self::Field>) -> Self;

    fn count(&self) -> GroupingResult<u64>;
}

/// Three independent filter+count queries, one per bucket
pub fn divergences<Q: Facetable>(query_set: &Q) -> GroupingResult<Divergences> {
    let field = Q::ALIGNMENT_DIFFERENCE;

    let identical = query_set.narrowed(Filter::new().eq(field, 0_i64)).count()?;
    let small = query_set
        .narrowed(Filter::new().gt(field, 0_i64).lte(field, Divergences::SMALL_MAX))
        .count()?;
    let large = query_set
        .narrowed(Filter::new().gt(field, Divergences::SMALL_MAX))
        .count()?;

    Ok(Divergences { identical, small, large })
}

/// `SELECT DISTINCT <select>` over the rowset plus optional extra joins
pub(crate) fn query_distinct<T, F>(
    conn: &Connection,
    rowset: &RowSetSql,
    select: &str,
    extra_joins: &str,
    map: F,
) -> GroupingResult<Vec<T>>
where
    F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
{
    let sql = format!(
        "SELECT DISTINCT {select} {from}{joins}{where_sql} ORDER BY {select}",
        select = select,
        from = rowset.from,
        joins = extra_joins,
        where_sql = rowset.where_sql,
    );

    let mut stmt = prepare(conn, &sql)?;
    let rows = stmt.query_map(rusqlite::params_from_iter(rowset.params.iter()), map)?;

    let mut values = Vec::new();
    for value in rows {
        values.push(value?);
    }
    Ok(values)
}

pub(crate) fn species_from_row(row: &Row<'_>) -> rusqlite::Result<Species> {
    Ok(Species {
        tax_id: row.get(0)?,
        name: row.get(1)?,
    })
}

/// Whether the rowset selects at least one row
pub(crate) fn row_exists(conn: &Connection, rowset: &RowSetSql) -> GroupingResult<bool> {
    let sql = format!(
        "SELECT EXISTS(SELECT 1 {from}{where_sql})",
        from = rowset.from,
        where_sql = rowset.where_sql,
    );

    let mut stmt = prepare(conn, &sql)?;
    let exists: bool = stmt.query_row(rusqlite::params_from_iter(rowset.params.iter()), |row| row.get(0))?;
    Ok(exists)
}
