//! Fixtures shared by integration tests

#![allow(dead_code)]

use mapping_groups::schema::{apply_embedded_schema, run_schema_migrations};
use mapping_groups::sqlite_pragma::register_functions;
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};

pub fn memory_db() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    apply_embedded_schema(&conn).unwrap();
    register_functions(&conn).unwrap();
    insert_vocabulary(&conn);
    conn
}

/// File database migrated from the crate's `sql/` directory
pub fn file_db(dir: &Path) -> PathBuf {
    let db_path = dir.join("mappings.db");
    let mut conn = Connection::open(&db_path).unwrap();
    let schema_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("sql");
    run_schema_migrations(&mut conn, schema_dir).unwrap();
    insert_vocabulary(&conn);
    db_path
}

fn insert_vocabulary(conn: &Connection) {
    conn.execute_batch(
        "INSERT INTO cv_ue_status (id, description) VALUES
            (1, 'NOT_REVIEWED'), (2, 'UNDER_REVIEW'), (3, 'REVIEWED');
         INSERT INTO cv_entry_type (id, description) VALUES (1, 'Swiss-Prot'), (2, 'TrEMBL');",
    )
    .unwrap();
}

pub fn release(conn: &Connection, taxid: i64, time_mapped: &str) -> i64 {
    conn.execute(
        "INSERT INTO release_mapping_history (time_mapped, uniprot_taxid) VALUES (?1, ?2)",
        params![time_mapped, taxid],
    )
    .unwrap();
    conn.last_insert_rowid()
}

/// Mapping with one history entry per `(release, grouping_id)` pair
pub fn mapping(conn: &Connection, history: &[(i64, Option<i64>)]) -> i64 {
    conn.execute("INSERT INTO mapping (status) VALUES (1)", []).unwrap();
    let mapping_id = conn.last_insert_rowid();
    for &(release_id, grouping_id) in history {
        conn.execute(
            "INSERT INTO mapping_history (release_mapping_history_id, mapping_id, grouping_id)
             VALUES (?1, ?2, ?3)",
            params![release_id, mapping_id, grouping_id],
        )
        .unwrap();
    }
    mapping_id
}

pub struct ViewRow<'a> {
    pub grouping_id: Option<i64>,
    pub tax_id: Option<i64>,
    pub difference: Option<i64>,
    pub chromosome: Option<&'a str>,
    pub region_accession: Option<&'a str>,
    pub mapping_status: &'a str,
    pub mapping_id: Option<i64>,
}

impl Default for ViewRow<'_> {
    fn default() -> Self {
        Self {
            grouping_id: None,
            tax_id: Some(9606),
            difference: None,
            chromosome: None,
            region_accession: None,
            mapping_status: "unmapped",
            mapping_id: None,
        }
    }
}

pub fn view_row(conn: &Connection, row: ViewRow<'_>) -> i64 {
    conn.execute(
        "INSERT INTO mapping_view (grouping_id, uniprot_tax_id, alignment_difference, chromosome,
            region_accession, uniprot_mapping_status, mapping_id, status, time_mapped)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 1, '2020-01-01 00:00:00')",
        params![
            row.grouping_id,
            row.tax_id,
            row.difference,
            row.chromosome,
            row.region_accession,
            row.mapping_status,
            row.mapping_id,
        ],
    )
    .unwrap();
    conn.last_insert_rowid()
}

pub fn species_load(conn: &Connection, tax_id: i64, species: &str, time_loaded: &str) {
    conn.execute(
        "INSERT INTO ensembl_species_history (species, ensembl_tax_id, time_loaded) VALUES (?1, ?2, ?3)",
        params![species, tax_id, time_loaded],
    )
    .unwrap();
}
