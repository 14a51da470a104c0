//! Connection setup for read-side SQLite access
//!
//! Applies read-tuned PRAGMAs and registers the `REGEXP` scalar function that
//! SQLite leaves undefined by default.

use regex::Regex;
use rusqlite::functions::FunctionFlags;
use rusqlite::{Connection, Statement};
use std::path::Path;
use std::sync::Arc;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Apply PRAGMAs suited to large read-mostly scans
pub fn apply_read_pragmas(conn: &Connection) -> rusqlite::Result<()> {
    conn.pragma_update(None, "temp_store", "MEMORY")?;
    conn.pragma_update(None, "cache_size", -64_000)?;
    conn.pragma_update(None, "mmap_size", 268_435_456_i64)?;
    Ok(())
}

/// Register `REGEXP` so `col REGEXP ?` works in filters
///
/// The compiled pattern is cached per statement as auxiliary data, so a scan
/// compiles it once rather than per row. NULL text yields NULL (no match).
pub fn register_functions(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        "regexp",
        2,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        move |ctx| {
            let pattern: Arc<Regex> = ctx.get_or_create_aux(0, |vr| -> Result<_, BoxError> {
                Ok(Regex::new(vr.as_str()?)?)
            })?;

            let text = ctx
                .get_raw(1)
                .as_str_or_null()
                .map_err(|e| rusqlite::Error::UserFunctionError(e.into()))?;

            Ok(text.map(|t| pattern.is_match(t)))
        },
    )
}

fn is_missing_regexp(err: &rusqlite::Error) -> bool {
    err.to_string().to_ascii_lowercase().contains("no such function: regexp")
}

/// Prepare `sql`, registering `REGEXP` first if the connection lacks it
///
/// A `REGEXP` the caller registered is left in place.
pub fn prepare<'c>(conn: &'c Connection, sql: &str) -> rusqlite::Result<Statement<'c>> {
    match conn.prepare(sql) {
        Err(err) if is_missing_regexp(&err) => {
            log::debug!("REGEXP not registered on connection, registering");
            register_functions(conn)?;
            conn.prepare(sql)
        }
        prepared => prepared,
    }
}

/// Open a database for querying only
///
/// Functions are registered before `query_only` is switched on.
pub fn open_read_only(db_path: impl AsRef<Path>) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path.as_ref())?;

    apply_read_pragmas(&conn)?;
    register_functions(&conn)?;

    conn.pragma_update(None, "query_only", "ON")?;

    log::debug!("📂 Opened read-only database: {}", db_path.as_ref().display());

    Ok(conn)
}
