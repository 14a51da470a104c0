//! Group key resolution and stale-snapshot filtering
//!
//! The view carries `grouping_id` inline. The normalized form has to walk the
//! history chain: latest history entry for the mapping, then the latest
//! release snapshot for that entry's species. Both lookups are batched per
//! page in [`HistoryKeyResolver::load`].

use crate::error::{GroupingError, GroupingResult};
use crate::filter::placeholders;
use crate::types::{GroupKey, MappingRow, MappingViewRow, ReleaseSnapshot};
use rusqlite::{Connection, OptionalExtension};
use std::collections::{BTreeSet, HashMap};

/// Bound on `IN (...)` list size per statement
const LOOKUP_CHUNK: usize = 500;

pub trait GroupKeyResolver<R> {
    fn resolve(&self, row: &R) -> GroupKey;

    fn is_eligible(&self, row: &R) -> bool;

    /// Whether rows repeating a primary id within a group are dropped
    fn deduplicates(&self) -> bool {
        true
    }
}

/// Resolver for `mapping_view` rows
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineKeyResolver;

impl GroupKeyResolver<MappingViewRow> for InlineKeyResolver {
    fn resolve(&self, row: &MappingViewRow) -> GroupKey {
        row.grouping_id
    }

    fn is_eligible(&self, _row: &MappingViewRow) -> bool {
        true
    }

    fn deduplicates(&self) -> bool {
        false
    }
}

/// Most recently mapped history entry of one mapping
#[derive(Debug, Clone, PartialEq)]
struct LatestHistory {
    grouping_id: GroupKey,
    release_mapping_history_id: i64,
    uniprot_taxid: Option<i64>,
}

/// Resolver for normalized rows, preloaded for one page
#[derive(Debug, Default)]
pub struct HistoryKeyResolver {
    latest: HashMap<i64, LatestHistory>,
    species_latest: HashMap<Option<i64>, i64>,
}

impl HistoryKeyResolver {
    /// Batch-load history and species snapshots for the given mappings
    ///
    /// One query per chunk of mapping ids, one per distinct species. Fails if
    /// a species referenced by a history entry has no snapshot at all.
    pub fn load(conn: &Connection, mapping_ids: impl IntoIterator<Item = i64>) -> GroupingResult<Self> {
        let ids: Vec<i64> = mapping_ids.into_iter().collect::<BTreeSet<_>>().into_iter().collect();
        let mut latest = HashMap::with_capacity(ids.len());

        for chunk in ids.chunks(LOOKUP_CHUNK) {
            let sql = format!(
                "SELECT mh.mapping_id, mh.grouping_id, rmh.release_mapping_history_id, rmh.uniprot_taxid
                 FROM mapping_history mh
                 JOIN release_mapping_history rmh
                   ON rmh.release_mapping_history_id = mh.release_mapping_history_id
                 WHERE mh.mapping_id IN ({})
                 ORDER BY mh.mapping_id, rmh.time_mapped DESC, mh.mapping_history_id DESC",
                placeholders(chunk.len())
            );

            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(rusqlite::params_from_iter(chunk.iter()), |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    LatestHistory {
                        grouping_id: row.get(1)?,
                        release_mapping_history_id: row.get(2)?,
                        uniprot_taxid: row.get(3)?,
                    },
                ))
            })?;

            // Ordered newest first per mapping, so the first entry seen wins
            for row in rows {
                let (mapping_id, history) = row?;
                latest.entry(mapping_id).or_insert(history);
            }
        }

        let mut species_latest = HashMap::new();
        for history in latest.values() {
            if species_latest.contains_key(&history.uniprot_taxid) {
                continue;
            }
            let snapshot = latest_snapshot_for_species(conn, history.uniprot_taxid)?;
            species_latest.insert(history.uniprot_taxid, snapshot.release_mapping_history_id);
        }

        log::debug!(
            "Resolved history for {} mappings across {} species",
            latest.len(),
            species_latest.len()
        );

        Ok(Self { latest, species_latest })
    }
}

impl GroupKeyResolver<MappingRow> for HistoryKeyResolver {
    fn resolve(&self, row: &MappingRow) -> GroupKey {
        self.latest.get(&row.mapping_id).and_then(|history| history.grouping_id)
    }

    fn is_eligible(&self, row: &MappingRow) -> bool {
        let Some(history) = self.latest.get(&row.mapping_id) else {
            log::debug!("Mapping {} has no history entry, skipping", row.mapping_id);
            return false;
        };

        self.species_latest.get(&history.uniprot_taxid) == Some(&history.release_mapping_history_id)
    }
}

fn snapshot_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ReleaseSnapshot> {
    Ok(ReleaseSnapshot {
        release_mapping_history_id: row.get(0)?,
        uniprot_taxid: row.get(1)?,
        time_mapped: row.get(2)?,
        uniprot_release: row.get(3)?,
    })
}

/// Snapshot with the greatest `time_mapped` for a species
///
/// A NULL taxonomy id matches snapshots whose taxonomy id is NULL.
pub fn latest_snapshot_for_species(conn: &Connection, taxid: Option<i64>) -> GroupingResult<ReleaseSnapshot> {
    conn.query_row(
        "SELECT release_mapping_history_id, uniprot_taxid, time_mapped, uniprot_release
         FROM release_mapping_history
         WHERE uniprot_taxid IS ?1
         ORDER BY time_mapped DESC, release_mapping_history_id DESC
         LIMIT 1",
        [taxid],
        snapshot_from_row,
    )
    .optional()?
    .ok_or(GroupingError::SnapshotNotFound { taxid })
}

/// Release with the greatest id for a species
pub fn latest_release_for_species(conn: &Connection, taxid: i64) -> GroupingResult<ReleaseSnapshot> {
    conn.query_row(
        "SELECT release_mapping_history_id, uniprot_taxid, time_mapped, uniprot_release
         FROM release_mapping_history
         WHERE uniprot_taxid = ?1
         ORDER BY release_mapping_history_id DESC
         LIMIT 1",
        [taxid],
        snapshot_from_row,
    )
    .optional()?
    .ok_or(GroupingError::SnapshotNotFound { taxid: Some(taxid) })
}
