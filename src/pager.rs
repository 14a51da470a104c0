//! Group-offset to row-offset translation and group assembly
//!
//! Callers page in whole groups. [`row_range`] turns a `(group_offset,
//! group_limit)` request into the contiguous row window that holds exactly
//! those groups; [`assemble`] buckets the fetched rows back into groups.

use crate::resolver::GroupKeyResolver;
use crate::types::{GroupCount, GroupKey, GroupedRow};
use serde::ser::{Serialize, Serializer};
use std::collections::{HashMap, HashSet};

/// Contiguous row window `[offset, offset + count)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RowRange {
    pub offset: u64,
    pub count: u64,
}

impl RowRange {
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Rows covering groups `[group_offset, group_offset + group_limit)`
pub fn row_range(counts: &[GroupCount], group_offset: usize, group_limit: usize) -> RowRange {
    let start = group_offset.min(counts.len());
    let end = group_offset.saturating_add(group_limit).min(counts.len());

    let offset = if start == 0 {
        0
    } else {
        counts[..start].iter().map(|c| c.total).sum()
    };
    let count = counts[start..end].iter().map(|c| c.total).sum();

    RowRange { offset, count }
}

/// Ordered mapping GroupKey -> rows, keys in first-seen order
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedRows<R> {
    groups: Vec<(GroupKey, Vec<R>)>,
    index: HashMap<GroupKey, usize>,
}

impl<R> Default for GroupedRows<R> {
    fn default() -> Self {
        Self {
            groups: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<R> GroupedRows<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Row list for `key`, created empty at the end if absent
    pub fn get_or_create(&mut self, key: GroupKey) -> &mut Vec<R> {
        let position = match self.index.get(&key) {
            Some(&position) => position,
            None => {
                self.groups.push((key, Vec::new()));
                self.index.insert(key, self.groups.len() - 1);
                self.groups.len() - 1
            }
        };
        &mut self.groups[position].1
    }

    pub fn push(&mut self, key: GroupKey, row: R) {
        self.get_or_create(key).push(row);
    }

    pub fn get(&self, key: &GroupKey) -> Option<&[R]> {
        self.index.get(key).map(|&position| self.groups[position].1.as_slice())
    }

    pub fn keys(&self) -> impl Iterator<Item = GroupKey> + '_ {
        self.groups.iter().map(|(key, _)| *key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (GroupKey, &[R])> + '_ {
        self.groups.iter().map(|(key, rows)| (*key, rows.as_slice()))
    }

    /// Number of groups
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of rows across all groups
    pub fn row_count(&self) -> usize {
        self.groups.iter().map(|(_, rows)| rows.len()).sum()
    }
}

#[derive(serde::Serialize)]
struct GroupEntry<'a, R> {
    grouping_id: GroupKey,
    entries: &'a [R],
}

impl<R: Serialize> Serialize for GroupedRows<R> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.groups.iter().map(|(key, rows)| GroupEntry {
            grouping_id: *key,
            entries: rows,
        }))
    }
}

/// Bucket fetched rows by resolved key, in fetch order
///
/// Ineligible rows are skipped. When the resolver deduplicates, a row whose
/// primary id is already recorded under its key is skipped too.
pub fn assemble<R, K>(rows: impl IntoIterator<Item = R>, resolver: &K) -> GroupedRows<R>
where
    R: GroupedRow,
    K: GroupKeyResolver<R>,
{
    let mut grouped = GroupedRows::new();
    let mut added: HashMap<GroupKey, HashSet<i64>> = HashMap::new();
    let deduplicate = resolver.deduplicates();
    let mut skipped_duplicates = 0usize;
    let mut skipped_stale = 0usize;

    for row in rows {
        let key = resolver.resolve(&row);

        if deduplicate && added.get(&key).is_some_and(|ids| ids.contains(&row.primary_id())) {
            skipped_duplicates += 1;
            continue;
        }

        if !resolver.is_eligible(&row) {
            skipped_stale += 1;
            continue;
        }

        if deduplicate {
            added.entry(key).or_default().insert(row.primary_id());
        }
        grouped.push(key, row);
    }

    if skipped_duplicates > 0 || skipped_stale > 0 {
        log::debug!(
            "Assembled {} groups, skipped {} duplicate and {} stale rows",
            grouped.len(),
            skipped_duplicates,
            skipped_stale
        );
    }

    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(totals: &[(Option<i64>, u64)]) -> Vec<GroupCount> {
        totals
            .iter()
            .map(|&(grouping_id, total)| GroupCount { grouping_id, total })
            .collect()
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        id: i64,
        key: GroupKey,
        stale: bool,
    }

    impl GroupedRow for Row {
        fn primary_id(&self) -> i64 {
            self.id
        }
    }

    struct FieldResolver {
        deduplicate: bool,
    }

    impl GroupKeyResolver<Row> for FieldResolver {
        fn resolve(&self, row: &Row) -> GroupKey {
            row.key
        }

        fn is_eligible(&self, row: &Row) -> bool {
            !row.stale
        }

        fn deduplicates(&self) -> bool {
            self.deduplicate
        }
    }

    fn row(id: i64, key: GroupKey) -> Row {
        Row { id, key, stale: false }
    }

    #[test]
    fn test_row_range_middle_group() {
        let counts = counts(&[(Some(1), 3), (Some(2), 2), (Some(3), 5)]);

        assert_eq!(row_range(&counts, 1, 1), RowRange { offset: 3, count: 2 });
        assert_eq!(row_range(&counts, 0, 2), RowRange { offset: 0, count: 5 });
        assert_eq!(row_range(&counts, 2, 10), RowRange { offset: 5, count: 5 });
    }

    #[test]
    fn test_row_range_out_of_bounds_is_empty() {
        let counts = counts(&[(Some(1), 3), (Some(2), 2)]);

        assert!(row_range(&counts, 5, 3).is_empty());
        assert!(row_range(&counts, 0, 0).is_empty());
        assert!(row_range(&[], 0, 10).is_empty());
        assert!(row_range(&counts, usize::MAX, usize::MAX).is_empty());
    }

    #[test]
    fn test_row_range_counts_null_group() {
        let counts = counts(&[(Some(4), 1), (None, 3)]);

        assert_eq!(row_range(&counts, 1, 1), RowRange { offset: 1, count: 3 });
    }

    #[test]
    fn test_assemble_keeps_first_seen_order() {
        let rows = vec![row(1, Some(9)), row(2, None), row(3, Some(9)), row(4, Some(2))];
        let grouped = assemble(rows, &FieldResolver { deduplicate: true });

        assert_eq!(grouped.keys().collect::<Vec<_>>(), vec![Some(9), None, Some(2)]);
        assert_eq!(grouped.get(&Some(9)).unwrap().len(), 2);
        assert_eq!(grouped.get(&None).unwrap()[0].id, 2);
        assert_eq!(grouped.row_count(), 4);
    }

    #[test]
    fn test_assemble_deduplicates_within_group() {
        let rows = vec![row(1, Some(1)), row(1, Some(1)), row(1, Some(2)), row(2, Some(1))];
        let grouped = assemble(rows, &FieldResolver { deduplicate: true });

        let ids: Vec<i64> = grouped.get(&Some(1)).unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2]);
        // Same id under another key is a different group member
        assert_eq!(grouped.get(&Some(2)).unwrap().len(), 1);
    }

    #[test]
    fn test_assemble_without_dedup_keeps_everything() {
        let rows = vec![row(1, Some(1)), row(1, Some(1))];
        let grouped = assemble(rows, &FieldResolver { deduplicate: false });

        assert_eq!(grouped.get(&Some(1)).unwrap().len(), 2);
    }

    #[test]
    fn test_assemble_skips_stale_rows() {
        let rows = vec![
            Row { id: 1, key: Some(1), stale: true },
            row(2, Some(1)),
            Row { id: 3, key: Some(5), stale: true },
        ];
        let grouped = assemble(rows, &FieldResolver { deduplicate: true });

        assert_eq!(grouped.len(), 1);
        assert_eq!(grouped.get(&Some(1)).unwrap()[0].id, 2);
        assert!(grouped.get(&Some(5)).is_none());
    }

    #[test]
    fn test_stale_row_does_not_block_current_duplicate() {
        let rows = vec![
            Row { id: 7, key: Some(1), stale: true },
            row(7, Some(1)),
        ];
        let grouped = assemble(rows, &FieldResolver { deduplicate: true });

        assert_eq!(grouped.get(&Some(1)).unwrap().len(), 1);
    }

    #[test]
    fn test_grouped_rows_serialize_as_ordered_list() {
        let mut grouped = GroupedRows::new();
        grouped.push(Some(3), 30);
        grouped.push(None, 0);
        grouped.push(Some(3), 31);

        let json = serde_json::to_value(&grouped).unwrap();

        assert_eq!(
            json,
            serde_json::json!([
                {"grouping_id": 3, "entries": [30, 31]},
                {"grouping_id": null, "entries": [0]},
            ])
        );
    }
}
