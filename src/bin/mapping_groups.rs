//! Mapping Groups CLI
//!
//! Query grouped pages and facets from a mapping database.
//!
//! ## Usage
//!
//! ```bash
//! mapping_groups init sql
//! mapping_groups page --taxid 9606 --offset 0 --limit 15
//! mapping_groups facets --taxid 9606
//! mapping_groups detail 42
//! mapping_groups unmapped 9606 swissprot
//! ```
//!
//! ## Environment Variables
//!
//! - MAPPING_DB_PATH - SQLite database path (default: data/mappings.db)
//! - DEFAULT_GROUP_LIMIT - Groups per page when --limit is absent (default: 15)
//! - MAX_GROUP_LIMIT - Upper bound for --limit (default: 100)
//! - RUST_LOG - Logging level (optional, default: info)

use mapping_groups::schema::run_schema_migrations;
use mapping_groups::sqlite_pragma::open_read_only;
use mapping_groups::{
    unmapped_detail, unmapped_entries, Filter, MappingViewQuerySet, QueryConfig, UnmappedSource,
    VocabularyCache, ViewField,
};
use rusqlite::Connection;
use serde_json::json;
use std::env;
use std::error::Error;
use std::process;

const USAGE: &str = "usage: mapping_groups <init <schema_dir> | page [--taxid N] [--offset N] [--limit N] | facets [--taxid N] | detail <id> | unmapped <taxid> <swissprot|ensembl>>";

/// Value following `flag`, parsed
fn flag_value<T: std::str::FromStr>(args: &[String], flag: &str) -> Result<Option<T>, String> {
    match args.iter().position(|arg| arg == flag) {
        None => Ok(None),
        Some(idx) => {
            let raw = args
                .get(idx + 1)
                .ok_or_else(|| format!("{} requires a value", flag))?;
            raw.parse()
                .map(Some)
                .map_err(|_| format!("invalid value for {}: '{}'", flag, raw))
        }
    }
}

fn view_filter(args: &[String]) -> Result<Filter<ViewField>, String> {
    let mut filter = Filter::new();
    if let Some(taxid) = flag_value::<i64>(args, "--taxid")? {
        filter = filter.eq(ViewField::UniprotTaxId, taxid);
    }
    Ok(filter)
}

fn run(config: &QueryConfig, args: &[String]) -> Result<(), Box<dyn Error>> {
    let command = args.first().map(String::as_str).ok_or(USAGE)?;
    let rest = &args[1..];

    match command {
        "init" => {
            let schema_dir = rest.first().ok_or(USAGE)?;
            if let Some(parent) = std::path::Path::new(&config.db_path).parent() {
                std::fs::create_dir_all(parent)?;
            }
            let mut conn = Connection::open(&config.db_path)?;
            run_schema_migrations(&mut conn, schema_dir)?;
        }
        "page" => {
            let conn = open_read_only(&config.db_path)?;
            let offset = flag_value::<usize>(rest, "--offset")?.unwrap_or(0);
            let limit = config.group_limit(flag_value::<usize>(rest, "--limit")?);

            let query_set = MappingViewQuerySet::with_filter(&conn, view_filter(rest)?);
            let count = query_set.grouped_count()?;
            let results = query_set.grouped_slice(offset, limit)?;

            log::info!("📄 Page offset={} limit={}: {} of {} groups", offset, limit, results.len(), count);

            let page = json!({
                "count": count,
                "offset": offset,
                "limit": limit,
                "results": results,
            });
            println!("{}", serde_json::to_string_pretty(&page)?);
        }
        "facets" => {
            let conn = open_read_only(&config.db_path)?;
            let facets = MappingViewQuerySet::with_filter(&conn, view_filter(rest)?).facets()?;
            println!("{}", serde_json::to_string_pretty(&facets)?);
        }
        "detail" => {
            let id: i64 = rest
                .first()
                .ok_or(USAGE)?
                .parse()
                .map_err(|_| format!("invalid mapping view id: '{}'", rest[0]))?;

            let conn = open_read_only(&config.db_path)?;
            let vocabulary = VocabularyCache::new();
            let detail = unmapped_detail(&conn, &vocabulary, id)?;
            println!("{}", serde_json::to_string_pretty(&detail)?);
        }
        "unmapped" => {
            let taxid: i64 = rest
                .first()
                .ok_or(USAGE)?
                .parse()
                .map_err(|_| format!("invalid taxonomy id: '{}'", rest[0]))?;
            let source: UnmappedSource = rest.get(1).ok_or(USAGE)?.parse()?;

            let conn = open_read_only(&config.db_path)?;
            let entries = unmapped_entries(&conn, taxid, source)?;
            log::info!("📋 {} unmapped {:?} entries for taxid {}", entries.len(), source, taxid);
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        other => return Err(format!("unknown command '{}'\n{}", other, USAGE).into()),
    }

    Ok(())
}

fn main() {
    dotenv::dotenv().ok();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let config = match QueryConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("❌ Configuration error: {}", e);
            process::exit(2);
        }
    };

    log::debug!("Configuration: {:?}", config);

    let args: Vec<String> = env::args().skip(1).collect();
    if let Err(e) = run(&config, &args) {
        log::error!("❌ {}", e);
        process::exit(1);
    }
}
