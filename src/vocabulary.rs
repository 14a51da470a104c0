//! Entry-type and status vocabulary cache
//!
//! The `cv_*` tables are effectively static reference data, so a single
//! cache may be shared across requests behind an `Arc`. Each map is loaded
//! whole on first lookup and kept until `invalidate`.

use crate::error::GroupingResult;
use rusqlite::Connection;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

type Descriptions = Arc<HashMap<i64, String>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Vocabulary {
    EntryType,
    Status,
}

impl Vocabulary {
    fn table(&self) -> &'static str {
        match self {
            Vocabulary::EntryType => "cv_entry_type",
            Vocabulary::Status => "cv_ue_status",
        }
    }
}

#[derive(Debug, Default)]
pub struct VocabularyCache {
    entry_types: RwLock<Option<Descriptions>>,
    statuses: RwLock<Option<Descriptions>>,
}

impl VocabularyCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Description of an entry type id, `None` if unknown
    pub fn entry_description(&self, conn: &Connection, id: i64) -> GroupingResult<Option<String>> {
        Ok(self.descriptions(conn, Vocabulary::EntryType)?.get(&id).cloned())
    }

    /// Description of a status id, `None` if unknown
    pub fn status_description(&self, conn: &Connection, id: i64) -> GroupingResult<Option<String>> {
        Ok(self.descriptions(conn, Vocabulary::Status)?.get(&id).cloned())
    }

    /// Drop both maps; the next lookup reloads from the database
    pub fn invalidate(&self) {
        *write_slot(&self.entry_types) = None;
        *write_slot(&self.statuses) = None;
        log::debug!("Vocabulary cache invalidated");
    }

    pub fn is_loaded(&self) -> bool {
        read_slot(&self.entry_types).is_some() || read_slot(&self.statuses).is_some()
    }

    fn slot(&self, vocabulary: Vocabulary) -> &RwLock<Option<Descriptions>> {
        match vocabulary {
            Vocabulary::EntryType => &self.entry_types,
            Vocabulary::Status => &self.statuses,
        }
    }

    fn descriptions(&self, conn: &Connection, vocabulary: Vocabulary) -> GroupingResult<Descriptions> {
        let slot = self.slot(vocabulary);

        if let Some(loaded) = read_slot(slot).as_ref() {
            return Ok(Arc::clone(loaded));
        }

        let mut guard = write_slot(slot);
        // Another thread may have loaded it while we waited for the lock
        if let Some(loaded) = guard.as_ref() {
            return Ok(Arc::clone(loaded));
        }

        let loaded = Arc::new(load_descriptions(conn, vocabulary)?);
        log::info!("📚 Loaded {} entries from {}", loaded.len(), vocabulary.table());
        *guard = Some(Arc::clone(&loaded));

        Ok(loaded)
    }
}

// A poisoned lock only means a panic mid-write of an Option; the value is
// still a valid cache state.
fn read_slot(slot: &RwLock<Option<Descriptions>>) -> std::sync::RwLockReadGuard<'_, Option<Descriptions>> {
    slot.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write_slot(slot: &RwLock<Option<Descriptions>>) -> std::sync::RwLockWriteGuard<'_, Option<Descriptions>> {
    slot.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn load_descriptions(conn: &Connection, vocabulary: Vocabulary) -> GroupingResult<HashMap<i64, String>> {
    let sql = format!("SELECT id, description FROM {}", vocabulary.table());
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))?;

    let mut descriptions = HashMap::new();
    for row in rows {
        let (id, description) = row?;
        descriptions.insert(id, description);
    }
    Ok(descriptions)
}
