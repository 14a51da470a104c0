//! Normalized mapping query set
//!
//! Rows are `mapping x mapping_history` join rows restricted to history rows
//! recorded in the same release and group as the mapping's latest entry, so
//! the key counted for a row is the key the resolver assigns it. Repeats of
//! that entry stay in the counts and are dropped on assembly, as are rows
//! whose latest snapshot has been superseded for their species.

use super::{count_distinct, count_rows, fetch_range};
use crate::counts::{GroupCountIndex, RowSetSql, SortOrder};
use crate::error::GroupingResult;
use crate::facets::{self, Divergences, Facetable};
use crate::filter::{Field, Filter};
use crate::pager::{self, GroupedRows, RowRange};
use crate::resolver::HistoryKeyResolver;
use crate::types::{GroupCount, MappingRow, Species};
use rusqlite::Connection;

const FROM: &str = "FROM mapping m
    JOIN mapping_history mh ON mh.mapping_id = m.mapping_id
    JOIN release_mapping_history rmh
      ON rmh.release_mapping_history_id = mh.release_mapping_history_id
    JOIN mapping_history latest ON latest.mapping_history_id = (
        SELECT h.mapping_history_id FROM mapping_history h
        JOIN release_mapping_history r
          ON r.release_mapping_history_id = h.release_mapping_history_id
        WHERE h.mapping_id = m.mapping_id
        ORDER BY r.time_mapped DESC, h.mapping_history_id DESC
        LIMIT 1)
      AND latest.release_mapping_history_id = mh.release_mapping_history_id
      AND latest.grouping_id IS mh.grouping_id
    LEFT JOIN uniprot_entry ue ON ue.uniprot_id = m.uniprot_id
    LEFT JOIN ensembl_transcript t ON t.transcript_id = m.transcript_id
    LEFT JOIN ensembl_gene g ON g.gene_id = t.gene_id";

const COLUMNS: &str = "m.mapping_id, mh.mapping_history_id, m.uniprot_id,
    m.transcript_id, m.alignment_difference, m.status, m.first_release_mapping_history_id,
    ue.uniprot_acc, t.enst_id, g.ensg_id, g.gene_name, g.chromosome";

const SPECIES_JOINS: &str = "
    LEFT JOIN transcript_history th ON th.transcript_id = m.transcript_id
    LEFT JOIN ensembl_species_history esh
      ON esh.ensembl_species_history_id = th.ensembl_species_history_id";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingField {
    MappingId,
    UniprotId,
    TranscriptId,
    Status,
    AlignmentDifference,
    GroupingId,
    ReleaseMappingHistoryId,
    UniprotTaxId,
    UniprotAcc,
    EnstId,
    EnsgId,
    Chromosome,
    MappingType,
}

impl Field for MappingField {
    fn column(&self) -> &'static str {
        match self {
            MappingField::MappingId => "m.mapping_id",
            MappingField::UniprotId => "m.uniprot_id",
            MappingField::TranscriptId => "m.transcript_id",
            MappingField::Status => "m.status",
            MappingField::AlignmentDifference => "m.alignment_difference",
            MappingField::GroupingId => "mh.grouping_id",
            MappingField::ReleaseMappingHistoryId => "mh.release_mapping_history_id",
            MappingField::UniprotTaxId => "rmh.uniprot_taxid",
            MappingField::UniprotAcc => "ue.uniprot_acc",
            MappingField::EnstId => "t.enst_id",
            MappingField::EnsgId => "g.ensg_id",
            MappingField::Chromosome => "g.chromosome",
            MappingField::MappingType => "mh.sp_ensembl_mapping_type",
        }
    }
}

fn mapping_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<MappingRow> {
    Ok(MappingRow {
        mapping_id: row.get(0)?,
        mapping_history_id: row.get(1)?,
        uniprot_id: row.get(2)?,
        transcript_id: row.get(3)?,
        alignment_difference: row.get(4)?,
        status: row.get(5)?,
        first_release_mapping_history_id: row.get(6)?,
        uniprot_acc: row.get(7)?,
        enst_id: row.get(8)?,
        ensg_id: row.get(9)?,
        gene_name: row.get(10)?,
        chromosome: row.get(11)?,
    })
}

pub struct MappingQuerySet<'c> {
    conn: &'c Connection,
    filter: Filter<MappingField>,
    counts: GroupCountIndex,
}

impl<'c> MappingQuerySet<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self::with_filter(conn, Filter::new())
    }

    pub fn with_filter(conn: &'c Connection, filter: Filter<MappingField>) -> Self {
        Self {
            conn,
            filter,
            counts: GroupCountIndex::new(),
        }
    }

    /// Narrow to rows also matching `extra`
    pub fn filter(&self, extra: Filter<MappingField>) -> Self {
        Self::with_filter(self.conn, self.filter.clone().merge(&extra))
    }

    pub fn rowset(&self) -> RowSetSql {
        let (where_sql, params) = self.filter.to_where_clause();
        RowSetSql {
            from: FROM,
            where_sql,
            params,
            key_column: MappingField::GroupingId.column(),
            order: SortOrder::Ascending,
        }
    }

    /// Joined rows selected, duplicates included
    pub fn count(&self) -> GroupingResult<u64> {
        count_rows(self.conn, &self.rowset())
    }

    /// Distinct mappings selected
    pub fn mapping_count(&self) -> GroupingResult<u64> {
        count_distinct(self.conn, &self.rowset(), MappingField::MappingId.column())
    }

    /// `(grouping_id, total)` in ascending key order, memoized
    pub fn grouped_counts(&self) -> GroupingResult<&[GroupCount]> {
        self.counts.counts(self.conn, &self.rowset())
    }

    /// Number of groups
    pub fn grouped_count(&self) -> GroupingResult<usize> {
        Ok(self.grouped_counts()?.len())
    }

    pub fn row_range(&self, offset: usize, limit: usize) -> GroupingResult<RowRange> {
        Ok(pager::row_range(self.grouped_counts()?, offset, limit))
    }

    /// Raw join rows of one window, no resolution or deduplication
    pub fn fetch_rows(&self, range: RowRange) -> GroupingResult<Vec<MappingRow>> {
        fetch_range(
            self.conn,
            &self.rowset(),
            COLUMNS,
            "m.mapping_id, mh.mapping_history_id",
            range,
            mapping_from_row,
        )
    }

    /// `limit` groups starting at group `offset`
    ///
    /// Keys are resolved from each mapping's latest history entry; stale and
    /// repeated rows are dropped.
    pub fn grouped_slice(&self, offset: usize, limit: usize) -> GroupingResult<GroupedRows<MappingRow>> {
        let range = self.row_range(offset, limit)?;
        log::debug!(
            "Grouped slice offset={} limit={} -> rows [{}, {})",
            offset,
            limit,
            range.offset,
            range.offset + range.count
        );

        let rows = self.fetch_rows(range)?;
        if rows.is_empty() {
            return Ok(GroupedRows::new());
        }

        let resolver = HistoryKeyResolver::load(self.conn, rows.iter().map(|row| row.mapping_id))?;
        Ok(pager::assemble(rows, &resolver))
    }

    /// Distinct status ids present
    pub fn statuses(&self) -> GroupingResult<Vec<i64>> {
        facets::query_distinct(self.conn, &self.rowset(), "m.status", "", |row| row.get(0))
    }

    /// Distinct (tax id, species) through transcript -> history -> species load
    pub fn species(&self) -> GroupingResult<Vec<Species>> {
        facets::query_distinct(
            self.conn,
            &self.rowset(),
            "esh.ensembl_tax_id, esh.species",
            SPECIES_JOINS,
            facets::species_from_row,
        )
    }

    /// Mappings per alignment-difference bucket, each mapping counted once
    pub fn divergences(&self) -> GroupingResult<Divergences> {
        facets::divergences(self)
    }

    /// Sorted distinct gene chromosomes, NULL excluded
    pub fn chromosomes(&self) -> GroupingResult<Vec<String>> {
        let chromosomes: Vec<Option<String>> =
            facets::query_distinct(self.conn, &self.rowset(), "g.chromosome", "", |row| row.get(0))?;

        let mut chromosomes: Vec<String> = chromosomes.into_iter().flatten().collect();
        chromosomes.sort();
        Ok(chromosomes)
    }
}

impl Facetable for MappingQuerySet<'_> {
    type Field = MappingField;

    const ALIGNMENT_DIFFERENCE: MappingField = MappingField::AlignmentDifference;

    fn narrowed(&self, extra: Filter<MappingField>) -> Self {
        self.filter(extra)
    }

    fn count(&self) -> GroupingResult<u64> {
        self.mapping_count()
    }
}
