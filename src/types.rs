//! Row and group types shared by both query-set forms

use chrono::NaiveDateTime;
use serde::Serialize;

/// Group identifier; NULL is a valid group of its own
pub type GroupKey = Option<i64>;

/// Raw row count for one group, duplicates included
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GroupCount {
    pub grouping_id: GroupKey,
    pub total: u64,
}

/// A release mapping history entry: one species mapped at one point in time
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseSnapshot {
    pub release_mapping_history_id: i64,
    pub uniprot_taxid: Option<i64>,
    pub time_mapped: NaiveDateTime,
    pub uniprot_release: Option<String>,
}

/// (taxonomy id, species name) facet entry
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Species {
    pub tax_id: Option<i64>,
    pub name: Option<String>,
}

/// A row the pager can bucket into groups
pub trait GroupedRow {
    /// Identity used to drop duplicate rows within one group
    fn primary_id(&self) -> i64;
}

/// Normalized mapping row with its eager-loaded UniProt entry, transcript and gene
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MappingRow {
    pub mapping_id: i64,
    pub mapping_history_id: i64,
    pub uniprot_id: Option<i64>,
    pub transcript_id: Option<i64>,
    pub alignment_difference: Option<i64>,
    pub status: i64,
    pub first_release_mapping_history_id: Option<i64>,
    pub uniprot_acc: Option<String>,
    pub enst_id: Option<String>,
    pub ensg_id: Option<String>,
    pub gene_name: Option<String>,
    pub chromosome: Option<String>,
}

impl GroupedRow for MappingRow {
    fn primary_id(&self) -> i64 {
        self.mapping_id
    }
}

/// Row of the denormalized `mapping_view` table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MappingViewRow {
    pub id: i64,
    pub mapping_id: Option<i64>,
    pub uniprot_id: Option<i64>,
    pub transcript_id: Option<i64>,
    pub alignment_difference: Option<i64>,
    pub status: Option<i64>,
    pub uniprot_acc: Option<String>,
    pub uniprot_tax_id: Option<i64>,
    pub entry_type: Option<i64>,
    pub gene_symbol_up: Option<String>,
    pub enst_id: Option<String>,
    pub enst_version: Option<i64>,
    pub ensg_id: Option<String>,
    pub gene_name: Option<String>,
    pub chromosome: Option<String>,
    pub region_accession: Option<String>,
    pub seq_region_start: Option<i64>,
    pub seq_region_end: Option<i64>,
    pub seq_region_strand: Option<i64>,
    pub mapping_history_id: Option<i64>,
    pub release_mapping_history_id: Option<i64>,
    pub sp_ensembl_mapping_type: Option<String>,
    pub grouping_id: GroupKey,
    pub time_mapped: NaiveDateTime,
    pub uniprot_release: Option<String>,
    pub ensembl_release: Option<i64>,
    pub uniprot_mapping_status: Option<String>,
}

impl GroupedRow for MappingViewRow {
    fn primary_id(&self) -> i64 {
        self.id
    }
}

impl MappingViewRow {
    pub const COLUMNS: &'static str = "v.id, v.mapping_id, v.uniprot_id, v.transcript_id,
        v.alignment_difference, v.status, v.uniprot_acc, v.uniprot_tax_id, v.entry_type,
        v.gene_symbol_up, v.enst_id, v.enst_version, v.ensg_id, v.gene_name, v.chromosome,
        v.region_accession, v.seq_region_start, v.seq_region_end, v.seq_region_strand,
        v.mapping_history_id, v.release_mapping_history_id, v.sp_ensembl_mapping_type,
        v.grouping_id, v.time_mapped, v.uniprot_release, v.ensembl_release,
        v.uniprot_mapping_status";

    /// Map a row selected with [`MappingViewRow::COLUMNS`]
    pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            mapping_id: row.get(1)?,
            uniprot_id: row.get(2)?,
            transcript_id: row.get(3)?,
            alignment_difference: row.get(4)?,
            status: row.get(5)?,
            uniprot_acc: row.get(6)?,
            uniprot_tax_id: row.get(7)?,
            entry_type: row.get(8)?,
            gene_symbol_up: row.get(9)?,
            enst_id: row.get(10)?,
            enst_version: row.get(11)?,
            ensg_id: row.get(12)?,
            gene_name: row.get(13)?,
            chromosome: row.get(14)?,
            region_accession: row.get(15)?,
            seq_region_start: row.get(16)?,
            seq_region_end: row.get(17)?,
            seq_region_strand: row.get(18)?,
            mapping_history_id: row.get(19)?,
            release_mapping_history_id: row.get(20)?,
            sp_ensembl_mapping_type: row.get(21)?,
            grouping_id: row.get(22)?,
            time_mapped: row.get(23)?,
            uniprot_release: row.get(24)?,
            ensembl_release: row.get(25)?,
            uniprot_mapping_status: row.get(26)?,
        })
    }

    /// Mapped entries are not curated through the unmapped endpoints
    pub fn is_mapped(&self) -> bool {
        self.uniprot_mapping_status.as_deref() == Some("mapped") && self.mapping_id.is_some()
    }
}
