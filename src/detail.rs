//! Single unmapped entry with its related entries

use crate::error::{GroupingError, GroupingResult};
use crate::filter::Filter;
use crate::pager::RowRange;
use crate::queryset::{MappingViewQuerySet, ViewField};
use crate::types::MappingViewRow;
use crate::vocabulary::VocabularyCache;
use rusqlite::Connection;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnmappedDetail {
    pub entry: MappingViewRow,
    /// Description of `entry.status`
    pub status: Option<String>,
    /// Other view rows sharing the entry's grouping id
    pub related_entries: Vec<MappingViewRow>,
}

/// Look up one unmapped view entry and the rest of its group
///
/// Fails with `NotFound` for an unknown id and `EntryMapped` if the entry is
/// already mapped. A NULL grouping id has no related entries.
pub fn unmapped_detail(
    conn: &Connection,
    vocabulary: &VocabularyCache,
    mapping_view_id: i64,
) -> GroupingResult<UnmappedDetail> {
    let entry = MappingViewQuerySet::with_filter(conn, Filter::new().eq(ViewField::Id, mapping_view_id))
        .first()?
        .ok_or(GroupingError::NotFound(mapping_view_id))?;

    if entry.is_mapped() {
        if let Some(mapping_id) = entry.mapping_id {
            return Err(GroupingError::EntryMapped(mapping_id));
        }
    }

    let related_entries = related_entries(conn, &entry)?;

    let status = match entry.status {
        Some(status) => vocabulary.status_description(conn, status)?,
        None => None,
    };

    Ok(UnmappedDetail {
        entry,
        status,
        related_entries,
    })
}

/// View rows in the same group as `entry`, excluding `entry` itself
pub fn related_entries(conn: &Connection, entry: &MappingViewRow) -> GroupingResult<Vec<MappingViewRow>> {
    let Some(grouping_id) = entry.grouping_id else {
        return Ok(Vec::new());
    };

    let related = MappingViewQuerySet::with_filter(
        conn,
        Filter::new()
            .eq(ViewField::GroupingId, grouping_id)
            .ne(ViewField::Id, entry.id),
    );
    let count = related.count()?;

    related.fetch_rows(RowRange { offset: 0, count })
}
