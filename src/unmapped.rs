//! Unmapped entries of a species' latest release
//!
//! Swiss-Prot: entries present in the UniProt release of the species' latest
//! mapping run, minus the entries that run mapped. Ensembl: transcripts of
//! the species load used by the latest run, minus the transcripts it mapped.

use crate::error::{GroupingError, GroupingResult};
use crate::resolver::latest_release_for_species;
use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnmappedSource {
    SwissProt,
    Ensembl,
}

impl FromStr for UnmappedSource {
    type Err = GroupingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "swissprot" => Ok(UnmappedSource::SwissProt),
            "ensembl" => Ok(UnmappedSource::Ensembl),
            other => Err(GroupingError::UnknownSource(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnmappedSwissProtEntry {
    pub uniprot_acc: Option<String>,
    pub entry_type: String,
    /// No canonical entry is referenced
    pub is_canonical: bool,
    pub alias: Option<String>,
    pub gene_symbol: Option<String>,
    pub gene_accession: Option<String>,
    pub length: Option<i64>,
    pub protein_existence_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnmappedTranscript {
    pub transcript_id: i64,
    pub enst_id: Option<String>,
    pub enst_version: Option<i64>,
    pub biotype: Option<String>,
    pub ensg_id: Option<String>,
    pub gene_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum UnmappedEntries {
    SwissProt(Vec<UnmappedSwissProtEntry>),
    Ensembl(Vec<UnmappedTranscript>),
}

impl UnmappedEntries {
    pub fn len(&self) -> usize {
        match self {
            UnmappedEntries::SwissProt(entries) => entries.len(),
            UnmappedEntries::Ensembl(transcripts) => transcripts.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub fn unmapped_entries(conn: &Connection, taxid: i64, source: UnmappedSource) -> GroupingResult<UnmappedEntries> {
    let entries = match source {
        UnmappedSource::SwissProt => UnmappedEntries::SwissProt(unmapped_swissprot_entries(conn, taxid)?),
        UnmappedSource::Ensembl => UnmappedEntries::Ensembl(unmapped_transcripts(conn, taxid)?),
    };

    log::debug!("{} unmapped {:?} entries for taxid {}", entries.len(), source, taxid);
    Ok(entries)
}

/// Swiss-Prot entries of the latest UniProt release not mapped by it, by accession
pub fn unmapped_swissprot_entries(conn: &Connection, taxid: i64) -> GroupingResult<Vec<UnmappedSwissProtEntry>> {
    let release = latest_release_for_species(conn, taxid)?;

    let mut stmt = conn.prepare(
        "SELECT DISTINCT ue.uniprot_id, ue.uniprot_acc, et.description, ue.canonical_uniprot_id,
                ue.alias, ue.gene_symbol, ue.chromosome_line, ue.length, ue.protein_existence_id
         FROM uniprot_entry ue
         JOIN uniprot_entry_history ueh ON ueh.uniprot_id = ue.uniprot_id
         JOIN cv_entry_type et ON et.id = ue.entry_type
         WHERE ue.uniprot_tax_id = ?1
           AND ueh.release_version = ?2
           AND et.description LIKE '%swiss%'
           AND ue.uniprot_id NOT IN (
               SELECT m.uniprot_id FROM mapping m
               JOIN mapping_history mh ON mh.mapping_id = m.mapping_id
               WHERE mh.release_mapping_history_id = ?3 AND m.uniprot_id IS NOT NULL)
         ORDER BY ue.uniprot_acc, ue.uniprot_id",
    )?;

    let rows = stmt.query_map(
        rusqlite::params![taxid, release.uniprot_release, release.release_mapping_history_id],
        |row| {
            Ok(UnmappedSwissProtEntry {
                uniprot_acc: row.get(1)?,
                entry_type: row.get(2)?,
                is_canonical: row.get::<_, Option<i64>>(3)?.is_none(),
                alias: row.get(4)?,
                gene_symbol: row.get(5)?,
                gene_accession: row.get(6)?,
                length: row.get(7)?,
                protein_existence_id: row.get(8)?,
            })
        },
    )?;

    let mut entries = Vec::new();
    for entry in rows {
        entries.push(entry?);
    }
    Ok(entries)
}

/// Transcripts of the latest run's species load that it did not map
pub fn unmapped_transcripts(conn: &Connection, taxid: i64) -> GroupingResult<Vec<UnmappedTranscript>> {
    let (release_id, species_history_id): (i64, i64) = conn
        .query_row(
            "SELECT rmh.release_mapping_history_id, rmh.ensembl_species_history_id
             FROM release_mapping_history rmh
             JOIN ensembl_species_history esh
               ON esh.ensembl_species_history_id = rmh.ensembl_species_history_id
             WHERE esh.ensembl_tax_id = ?1
             ORDER BY rmh.release_mapping_history_id DESC
             LIMIT 1",
            [taxid],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?
        .ok_or(GroupingError::SnapshotNotFound { taxid: Some(taxid) })?;

    let mut stmt = conn.prepare(
        "SELECT t.transcript_id, t.enst_id, t.enst_version, t.biotype, g.ensg_id, g.gene_name
         FROM ensembl_transcript t
         JOIN transcript_history th ON th.transcript_id = t.transcript_id
         LEFT JOIN ensembl_gene g ON g.gene_id = t.gene_id
         WHERE th.ensembl_species_history_id = ?1
           AND t.transcript_id NOT IN (
               SELECT m.transcript_id FROM mapping m
               JOIN mapping_history mh ON mh.mapping_id = m.mapping_id
               WHERE mh.release_mapping_history_id = ?2 AND m.transcript_id IS NOT NULL)
         ORDER BY t.enst_id, t.transcript_id",
    )?;

    let rows = stmt.query_map([species_history_id, release_id], |row| {
        Ok(UnmappedTranscript {
            transcript_id: row.get(0)?,
            enst_id: row.get(1)?,
            enst_version: row.get(2)?,
            biotype: row.get(3)?,
            ensg_id: row.get(4)?,
            gene_name: row.get(5)?,
        })
    })?;

    let mut transcripts = Vec::new();
    for transcript in rows {
        transcripts.push(transcript?);
    }
    Ok(transcripts)
}
