//! Mapping Groups - grouped pagination over UniProt/Ensembl mappings
//!
//! Callers page through mapping rows in whole groups (`grouping_id`) rather
//! than raw rows, and pull summary facets for the same filtered rowset.
//!
//! # Architecture
//!
//! ```text
//! Filter<F> → MappingQuerySet / MappingViewQuerySet
//!     ↓
//! GroupCountIndex (memoized (grouping_id, total), same ORDER BY as fetch)
//!     ↓
//! pager::row_range (group offset/limit → row offset/count)
//!     ↓
//! ranged fetch → GroupKeyResolver (batched history lookups) → pager::assemble
//!     ↓
//! GroupedRows (grouping_id → deduplicated rows, first-seen order)
//! ```
//!
//! Facets (`statuses`, `species`, `divergences`, `chromosomes`, `types`,
//! `has_patches`) run independently on the same filters. `detail` and
//! `unmapped` cover single unmapped entries and per-species unmapped listings.

#[cfg(test)]
mod test_support;

pub mod config;
pub mod counts;
pub mod detail;
pub mod error;
pub mod facets;
pub mod filter;
pub mod pager;
pub mod queryset;
pub mod resolver;
pub mod schema;
pub mod sqlite_pragma;
pub mod types;
pub mod unmapped;
pub mod vocabulary;

pub use config::{ConfigError, QueryConfig};
pub use counts::{GroupCountIndex, SortOrder};
pub use detail::{unmapped_detail, UnmappedDetail};
pub use error::{GroupingError, GroupingResult};
pub use facets::Divergences;
pub use filter::{Condition, Field, Filter};
pub use pager::{GroupedRows, RowRange};
pub use queryset::{MappingField, MappingQuerySet, MappingViewQuerySet, ViewFacets, ViewField};
pub use resolver::{GroupKeyResolver, HistoryKeyResolver, InlineKeyResolver};
pub use types::{GroupCount, GroupKey, MappingRow, MappingViewRow, ReleaseSnapshot, Species};
pub use unmapped::{unmapped_entries, UnmappedEntries, UnmappedSource};
pub use vocabulary::VocabularyCache;
