//! Denormalized mapping view query set
//!
//! The view is pre-filtered upstream to current releases, so every row is
//! eligible and keys are read straight off the row. Groups run in descending
//! key order.

use super::{count_rows, fetch_range};
use crate::counts::{GroupCountIndex, RowSetSql, SortOrder};
use crate::error::{GroupingError, GroupingResult};
use crate::facets::{self, Divergences, Facetable};
use crate::filter::{Field, Filter};
use crate::pager::{self, GroupedRows, RowRange};
use crate::resolver::InlineKeyResolver;
use crate::types::{GroupCount, MappingViewRow, Species};
use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;

const FROM: &str = "FROM mapping_view v";

/// Region accessions defined on assembly patches
const PATCH_REGION_PATTERN: &str = "(?i)^CHR";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewField {
    Id,
    MappingId,
    UniprotId,
    TranscriptId,
    Status,
    AlignmentDifference,
    UniprotAcc,
    UniprotTaxId,
    EntryType,
    EnstId,
    EnsgId,
    GeneName,
    Chromosome,
    RegionAccession,
    GroupingId,
    ReleaseMappingHistoryId,
    /// `uniprot_mapping_status`: mapped / unmapped / ...
    MappingType,
}

impl Field for ViewField {
    fn column(&self) -> &'static str {
        match self {
            ViewField::Id => "v.id",
            ViewField::MappingId => "v.mapping_id",
            ViewField::UniprotId => "v.uniprot_id",
            ViewField::TranscriptId => "v.transcript_id",
            ViewField::Status => "v.status",
            ViewField::AlignmentDifference => "v.alignment_difference",
            ViewField::UniprotAcc => "v.uniprot_acc",
            ViewField::UniprotTaxId => "v.uniprot_tax_id",
            ViewField::EntryType => "v.entry_type",
            ViewField::EnstId => "v.enst_id",
            ViewField::EnsgId => "v.ensg_id",
            ViewField::GeneName => "v.gene_name",
            ViewField::Chromosome => "v.chromosome",
            ViewField::RegionAccession => "v.region_accession",
            ViewField::GroupingId => "v.grouping_id",
            ViewField::ReleaseMappingHistoryId => "v.release_mapping_history_id",
            ViewField::MappingType => "v.uniprot_mapping_status",
        }
    }
}

/// Every view facet, for filter sidebars
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewFacets {
    pub statuses: Vec<Option<i64>>,
    pub species: Vec<Species>,
    pub divergences: Divergences,
    pub chromosomes: Vec<String>,
    pub types: Vec<Option<String>>,
    pub has_patches: bool,
}

pub struct MappingViewQuerySet<'c> {
    conn: &'c Connection,
    filter: Filter<ViewField>,
    counts: GroupCountIndex,
}

impl<'c> MappingViewQuerySet<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self::with_filter(conn, Filter::new())
    }

    pub fn with_filter(conn: &'c Connection, filter: Filter<ViewField>) -> Self {
        Self {
            conn,
            filter,
            counts: GroupCountIndex::new(),
        }
    }

    /// Narrow to rows also matching `extra`
    pub fn filter(&self, extra: Filter<ViewField>) -> Self {
        Self::with_filter(self.conn, self.filter.clone().merge(&extra))
    }

    pub fn rowset(&self) -> RowSetSql {
        let (where_sql, params) = self.filter.to_where_clause();
        RowSetSql {
            from: FROM,
            where_sql,
            params,
            key_column: ViewField::GroupingId.column(),
            order: SortOrder::Descending,
        }
    }

    pub fn count(&self) -> GroupingResult<u64> {
        count_rows(self.conn, &self.rowset())
    }

    /// First row selected, if any
    pub fn first(&self) -> GroupingResult<Option<MappingViewRow>> {
        Ok(self
            .fetch_rows(RowRange { offset: 0, count: 1 })?
            .into_iter()
            .next())
    }

    /// `(grouping_id, total)` in descending key order, memoized
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

    pub fn fetch_rows(&self, range: RowRange) -> GroupingResult<Vec<MappingViewRow>> {
        fetch_range(
            self.conn,
            &self.rowset(),
            MappingViewRow::COLUMNS,
            "v.id",
            range,
            MappingViewRow::from_row,
        )
    }

    /// `limit` groups starting at group `offset`
    pub fn grouped_slice(&self, offset: usize, limit: usize) -> GroupingResult<GroupedRows<MappingViewRow>> {
        let range = self.row_range(offset, limit)?;
        log::debug!(
            "Grouped view slice offset={} limit={} -> rows [{}, {})",
            offset,
            limit,
            range.offset,
            range.offset + range.count
        );

        let rows = self.fetch_rows(range)?;
        Ok(pager::assemble(rows, &InlineKeyResolver))
    }

    pub fn statuses(&self) -> GroupingResult<Vec<Option<i64>>> {
        facets::query_distinct(self.conn, &self.rowset(), "v.status", "", |row| row.get(0))
    }

    /// Distinct tax ids, each named from its most recent Ensembl species load
    ///
    /// Rows without a tax id are left out; a tax id with no species load is
    /// an integrity fault.
    pub fn species(&self) -> GroupingResult<Vec<Species>> {
        let tax_ids: Vec<Option<i64>> =
            facets::query_distinct(self.conn, &self.rowset(), "v.uniprot_tax_id", "", |row| row.get(0))?;

        let mut stmt = self.conn.prepare(
            "SELECT species FROM ensembl_species_history
             WHERE ensembl_tax_id = ?1
             ORDER BY time_loaded DESC, ensembl_species_history_id DESC
             LIMIT 1",
        )?;

        let mut species = Vec::with_capacity(tax_ids.len());
        for tax_id in tax_ids.into_iter().flatten() {
            let name: Option<String> = stmt
                .query_row([tax_id], |row| row.get(0))
                .optional()?
                .ok_or(GroupingError::SpeciesNotFound { tax_id: Some(tax_id) })?;

            species.push(Species {
                tax_id: Some(tax_id),
                name,
            });
        }

        Ok(species)
    }

    pub fn divergences(&self) -> GroupingResult<Divergences> {
        facets::divergences(self)
    }

    /// Sorted distinct chromosomes, NULL and empty excluded
    pub fn chromosomes(&self) -> GroupingResult<Vec<String>> {
        let chromosomes: Vec<Option<String>> =
            facets::query_distinct(self.conn, &self.rowset(), "v.chromosome", "", |row| row.get(0))?;

        let mut chromosomes: Vec<String> = chromosomes
            .into_iter()
            .flatten()
            .filter(|chromosome| !chromosome.is_empty())
            .collect();
        chromosomes.sort();
        Ok(chromosomes)
    }

    /// Distinct mapping types (`uniprot_mapping_status`)
    pub fn types(&self) -> GroupingResult<Vec<Option<String>>> {
        facets::query_distinct(self.conn, &self.rowset(), "v.uniprot_mapping_status", "", |row| {
            row.get(0)
        })
    }

    /// Whether any row lies on an assembly patch region
    ///
    /// Uses `REGEXP`, which is registered on the connection if missing.
    pub fn has_patches(&self) -> GroupingResult<bool> {
        let patches = self.filter(Filter::new().matches(ViewField::RegionAccession, PATCH_REGION_PATTERN));
        facets::row_exists(self.conn, &patches.rowset())
    }

    pub fn facets(&self) -> GroupingResult<ViewFacets> {
        Ok(ViewFacets {
            statuses: self.statuses()?,
            species: self.species()?,
            divergences: self.divergences()?,
            chromosomes: self.chromosomes()?,
            types: self.types()?,
            has_patches: self.has_patches()?,
        })
    }
}

impl Facetable for MappingViewQuerySet<'_> {
    type Field = ViewField;

    const ALIGNMENT_DIFFERENCE: ViewField = ViewField::AlignmentDifference;

    fn narrowed(&self, extra: Filter<ViewField>) -> Self {
        self.filter(extra)
    }

    fn count(&self) -> GroupingResult<u64> {
        MappingViewQuerySet::count(self)
    }
}
