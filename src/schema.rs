//! Schema migrations
//!
//! Every file under `sql/` uses `IF NOT EXISTS`, so both loaders are idempotent.

use crate::error::GroupingResult;
use rusqlite::Connection;
use std::fs;
use std::path::Path;

/// The `sql/` files compiled into the binary, in application order
const EMBEDDED_SCHEMA: &[(&str, &str)] = &[
    ("00_vocabulary.sql", include_str!("../sql/00_vocabulary.sql")),
    ("01_ensembl.sql", include_str!("../sql/01_ensembl.sql")),
    ("02_uniprot.sql", include_str!("../sql/02_uniprot.sql")),
    ("03_mappings.sql", include_str!("../sql/03_mappings.sql")),
    ("04_mapping_view.sql", include_str!("../sql/04_mapping_view.sql")),
];

/// Run schema migrations from SQL files
///
/// Reads all .sql files from `schema_dir` and executes them sorted by file
/// name (00_, 01_, ...). Stops at the first failure.
pub fn run_schema_migrations(conn: &mut Connection, schema_dir: impl AsRef<Path>) -> GroupingResult<()> {
    let schema_path = schema_dir.as_ref();

    if !schema_path.is_dir() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Schema directory not found: {}", schema_path.display()),
        )
        .into());
    }

    let mut sql_files: Vec<_> = fs::read_dir(schema_path)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().and_then(|s| s.to_str()) == Some("sql"))
        .collect();

    sql_files.sort();

    log::info!("🔧 Running schema migrations from: {}", schema_path.display());

    let tx = conn.transaction()?;
    for path in &sql_files {
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        log::info!("   ├─ Executing: {}", filename);
        tx.execute_batch(&fs::read_to_string(path)?)?;
    }
    tx.commit()?;

    log::info!("✅ Applied {} schema files", sql_files.len());

    Ok(())
}

/// Apply the compiled-in schema
pub fn apply_embedded_schema(conn: &Connection) -> GroupingResult<()> {
    for (filename, sql) in EMBEDDED_SCHEMA {
        log::debug!("Applying embedded schema: {}", filename);
        conn.execute_batch(sql)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn table_count(conn: &Connection) -> i64 {
        conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
            [],
            |row| row.get(0),
        )
        .unwrap()
    }

    #[test]
    fn test_embedded_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        apply_embedded_schema(&conn).unwrap();
        let tables = table_count(&conn);
        apply_embedded_schema(&conn).unwrap();

        assert_eq!(tables, 12);
        assert_eq!(table_count(&conn), tables);
    }

    #[test]
    fn test_migrations_from_directory_in_order() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("01_child.sql"),
            "CREATE TABLE IF NOT EXISTS child (id INTEGER PRIMARY KEY, parent_id INTEGER REFERENCES parent(id));
             INSERT INTO child (parent_id) SELECT id FROM parent;",
        )
        .unwrap();
        fs::write(
            dir.path().join("00_parent.sql"),
            "CREATE TABLE IF NOT EXISTS parent (id INTEGER PRIMARY KEY);
             INSERT INTO parent (id) VALUES (7);",
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "not sql").unwrap();

        let mut conn = Connection::open_in_memory().unwrap();
        run_schema_migrations(&mut conn, dir.path()).unwrap();

        let parent_id: i64 = conn
            .query_row("SELECT parent_id FROM child", [], |row| row.get(0))
            .unwrap();
        assert_eq!(parent_id, 7);
    }

    #[test]
    fn test_missing_directory_is_error() {
        let mut conn = Connection::open_in_memory().unwrap();
        let result = run_schema_migrations(&mut conn, "/nonexistent/schema/dir");

        assert!(result.is_err());
    }
}
