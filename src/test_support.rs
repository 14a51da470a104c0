//! Seeding helpers shared by unit tests

use crate::schema::apply_embedded_schema;
use crate::sqlite_pragma::register_functions;
use crate::types::{MappingRow, MappingViewRow};
use chrono::NaiveDate;
use rusqlite::{params, Connection, ToSql};

/// In-memory database with schema, REGEXP and the status/entry vocabularies
pub fn seed_db() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    apply_embedded_schema(&conn).unwrap();
    register_functions(&conn).unwrap();
    conn.execute_batch(
        "INSERT INTO cv_ue_status (id, description) VALUES
            (1, 'NOT_REVIEWED'), (2, 'UNDER_REVIEW'), (3, 'REVIEWED'), (4, 'REJECTED');
         INSERT INTO cv_entry_type (id, description) VALUES
            (1, 'Swiss-Prot'), (2, 'TrEMBL'), (3, 'Swiss-Prot isoform');",
    )
    .unwrap();
    conn
}

/// Builder for normalized mapping fixtures
pub struct Seed<'c> {
    conn: &'c Connection,
    next_acc: u32,
}

impl<'c> Seed<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn, next_acc: 1 }
    }

    pub fn release(&mut self, taxid: i64, time_mapped: &str) -> i64 {
        self.conn
            .execute(
                "INSERT INTO release_mapping_history (time_mapped, uniprot_release, uniprot_taxid, status)
                 VALUES (?1, '2020_01', ?2, 'MAPPING_COMPLETED')",
                params![time_mapped, taxid],
            )
            .unwrap();
        self.conn.last_insert_rowid()
    }

    pub fn mapping(&mut self, transcript_id: Option<i64>) -> i64 {
        let acc = format!("P{:05}", self.next_acc);
        self.next_acc += 1;
        self.conn
            .execute(
                "INSERT INTO uniprot_entry (uniprot_acc, uniprot_tax_id, entry_type) VALUES (?1, 9606, 1)",
                [&acc],
            )
            .unwrap();
        let uniprot_id = self.conn.last_insert_rowid();

        self.mapping_of(Some(uniprot_id), transcript_id)
    }

    /// Release mapping run against an Ensembl species load
    pub fn ensembl_release(&mut self, taxid: i64, species_history_id: i64, time_mapped: &str) -> i64 {
        self.conn
            .execute(
                "INSERT INTO release_mapping_history
                    (ensembl_species_history_id, time_mapped, uniprot_release, uniprot_taxid, status)
                 VALUES (?1, ?2, '2020_01', ?3, 'MAPPING_COMPLETED')",
                params![species_history_id, time_mapped, taxid],
            )
            .unwrap();
        self.conn.last_insert_rowid()
    }

    pub fn uniprot_entry(&mut self, acc: &str, taxid: i64, entry_type: i64) -> i64 {
        self.conn
            .execute(
                "INSERT INTO uniprot_entry (uniprot_acc, uniprot_tax_id, entry_type) VALUES (?1, ?2, ?3)",
                params![acc, taxid, entry_type],
            )
            .unwrap();
        self.conn.last_insert_rowid()
    }

    pub fn entry_release(&mut self, uniprot_id: i64, release_version: &str) {
        self.conn
            .execute(
                "INSERT INTO uniprot_entry_history (uniprot_id, release_version) VALUES (?1, ?2)",
                params![uniprot_id, release_version],
            )
            .unwrap();
    }

    /// Mapping between existing entities
    pub fn mapping_of(&mut self, uniprot_id: Option<i64>, transcript_id: Option<i64>) -> i64 {
        self.conn
            .execute(
                "INSERT INTO mapping (uniprot_id, transcript_id) VALUES (?1, ?2)",
                params![uniprot_id, transcript_id],
            )
            .unwrap();
        self.conn.last_insert_rowid()
    }

    pub fn history(&mut self, mapping_id: i64, release_id: i64, grouping_id: Option<i64>) -> i64 {
        self.conn
            .execute(
                "INSERT INTO mapping_history (release_mapping_history_id, mapping_id, entry_type, grouping_id)
                 VALUES (?1, ?2, 1, ?3)",
                params![release_id, mapping_id, grouping_id],
            )
            .unwrap();
        self.conn.last_insert_rowid()
    }

    pub fn set_status(&mut self, mapping_id: i64, status: i64) {
        self.conn
            .execute(
                "UPDATE mapping SET status = ?1 WHERE mapping_id = ?2",
                params![status, mapping_id],
            )
            .unwrap();
    }

    pub fn set_difference(&mut self, mapping_id: i64, difference: Option<i64>) {
        self.conn
            .execute(
                "UPDATE mapping SET alignment_difference = ?1 WHERE mapping_id = ?2",
                params![difference, mapping_id],
            )
            .unwrap();
    }

    pub fn species_load(&mut self, tax_id: i64, species: &str, time_loaded: &str) -> i64 {
        insert_species_load(self.conn, tax_id, species, time_loaded)
    }

    pub fn gene(&mut self, ensg_id: &str, chromosome: Option<&str>, region_accession: Option<&str>) -> i64 {
        self.conn
            .execute(
                "INSERT INTO ensembl_gene (ensg_id, chromosome, region_accession) VALUES (?1, ?2, ?3)",
                params![ensg_id, chromosome, region_accession],
            )
            .unwrap();
        self.conn.last_insert_rowid()
    }

    pub fn transcript(&mut self, gene_id: i64, enst_id: &str) -> i64 {
        self.conn
            .execute(
                "INSERT INTO ensembl_transcript (gene_id, enst_id, enst_version) VALUES (?1, ?2, 1)",
                params![gene_id, enst_id],
            )
            .unwrap();
        self.conn.last_insert_rowid()
    }

    pub fn transcript_history(&mut self, transcript_id: i64, species_history_id: i64) {
        self.conn
            .execute(
                "INSERT INTO transcript_history (transcript_id, ensembl_species_history_id) VALUES (?1, ?2)",
                params![transcript_id, species_history_id],
            )
            .unwrap();
    }
}

/// Builder for `mapping_view` fixtures
pub struct ViewSeed<'c> {
    conn: &'c Connection,
}

impl<'c> ViewSeed<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// Insert an unmapped view row with status 1
    pub fn row(&mut self, grouping_id: Option<i64>) -> i64 {
        self.conn
            .execute(
                "INSERT INTO mapping_view (grouping_id, status, time_mapped, uniprot_mapping_status)
                 VALUES (?1, 1, '2020-01-01 00:00:00', 'unmapped')",
                [grouping_id],
            )
            .unwrap();
        self.conn.last_insert_rowid()
    }

    /// Insert `n` rows per key, in the given order
    pub fn groups(&mut self, groups: &[(Option<i64>, usize)]) -> Vec<i64> {
        let mut ids = Vec::new();
        for &(grouping_id, n) in groups {
            for _ in 0..n {
                ids.push(self.row(grouping_id));
            }
        }
        ids
    }

    /// Overwrite one column of one row
    pub fn set<V: ToSql>(&mut self, id: i64, column: &str, value: V) {
        let sql = format!("UPDATE mapping_view SET {} = ?1 WHERE id = ?2", column);
        self.conn.execute(&sql, params![value, id]).unwrap();
    }

    pub fn species_load(&mut self, tax_id: i64, species: &str, time_loaded: &str) -> i64 {
        insert_species_load(self.conn, tax_id, species, time_loaded)
    }
}

fn insert_species_load(conn: &Connection, tax_id: i64, species: &str, time_loaded: &str) -> i64 {
    conn.execute(
        "INSERT INTO ensembl_species_history (species, ensembl_tax_id, ensembl_release, time_loaded)
         VALUES (?1, ?2, 100, ?3)",
        params![species, tax_id, time_loaded],
    )
    .unwrap();
    conn.last_insert_rowid()
}

/// Normalized row carrying only the fields resolvers look at
pub fn mapping_row(mapping_id: i64) -> MappingRow {
    MappingRow {
        mapping_id,
        mapping_history_id: 0,
        uniprot_id: None,
        transcript_id: None,
        alignment_difference: None,
        status: 1,
        first_release_mapping_history_id: None,
        uniprot_acc: None,
        enst_id: None,
        ensg_id: None,
        gene_name: None,
        chromosome: None,
    }
}

pub fn view_row(id: i64, grouping_id: Option<i64>) -> MappingViewRow {
    MappingViewRow {
        id,
        mapping_id: None,
        uniprot_id: None,
        transcript_id: None,
        alignment_difference: None,
        status: Some(1),
        uniprot_acc: None,
        uniprot_tax_id: None,
        entry_type: None,
        gene_symbol_up: None,
        enst_id: None,
        enst_version: None,
        ensg_id: None,
        gene_name: None,
        chromosome: None,
        region_accession: None,
        seq_region_start: None,
        seq_region_end: None,
        seq_region_strand: None,
        mapping_history_id: None,
        release_mapping_history_id: None,
        sp_ensembl_mapping_type: None,
        grouping_id,
        time_mapped: NaiveDate::from_ymd_opt(2020, 1, 1)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .unwrap(),
        uniprot_release: None,
        ensembl_release: None,
        uniprot_mapping_status: Some("unmapped".to_string()),
    }
}
