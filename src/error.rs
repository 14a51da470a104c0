//! Crate error type
//!
//! Stale rows, duplicate rows, NULL group keys and empty rowsets are filtering
//! policy and never show up here. Only storage faults and integrity faults do.

#[derive(Debug, thiserror::Error)]
pub enum GroupingError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A species has no release mapping history at all
    #[error("No release mapping history found for taxonomy id {taxid:?}")]
    SnapshotNotFound { taxid: Option<i64> },

    /// A taxonomy id has no Ensembl species load to take its name from
    #[error("No Ensembl species history found for taxonomy id {tax_id:?}")]
    SpeciesNotFound { tax_id: Option<i64> },

    #[error("Mapping view entry {0} not found")]
    NotFound(i64),

    #[error("Entry is mapped with id {0}")]
    EntryMapped(i64),

    #[error("Unknown source '{0}', expected 'swissprot' or 'ensembl'")]
    UnknownSource(String),
}

pub type GroupingResult<T> = Result<T, GroupingError>;
