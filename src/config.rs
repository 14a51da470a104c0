//! Query configuration from environment variables

use std::env;

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

/// Configuration for the query layer and the CLI
///
/// Loaded from environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryConfig {
    /// Path to SQLite database file
    pub db_path: String,

    /// Groups per page when the caller does not ask for a limit
    pub default_group_limit: usize,

    /// Upper bound on groups per page; larger requests are clamped
    pub max_group_limit: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            db_path: "data/mappings.db".to_string(),
            default_group_limit: 15,
            max_group_limit: 100,
        }
    }
}

impl QueryConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `MAPPING_DB_PATH` (default: data/mappings.db)
    /// - `DEFAULT_GROUP_LIMIT` (default: 15)
    /// - `MAX_GROUP_LIMIT` (default: 100)
    ///
    /// `RUST_LOG` is read by the logger, not here.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let db_path = env::var("MAPPING_DB_PATH").unwrap_or(defaults.db_path);
        let default_group_limit =
            parse_usize("DEFAULT_GROUP_LIMIT", defaults.default_group_limit)?;
        let max_group_limit = parse_usize("MAX_GROUP_LIMIT", defaults.max_group_limit)?;

        if max_group_limit == 0 {
            return Err(ConfigError::InvalidValue(
                "MAX_GROUP_LIMIT must be greater than 0".to_string(),
            ));
        }

        if default_group_limit > max_group_limit {
            return Err(ConfigError::InvalidValue(format!(
                "DEFAULT_GROUP_LIMIT ({}) exceeds MAX_GROUP_LIMIT ({})",
                default_group_limit, max_group_limit
            )));
        }

        Ok(Self {
            db_path,
            default_group_limit,
            max_group_limit,
        })
    }

    /// Resolve the number of groups to fetch for a request
    pub fn group_limit(&self, requested: Option<usize>) -> usize {
        match requested {
            None => self.default_group_limit,
            Some(limit) if limit > self.max_group_limit => {
                log::warn!(
                    "Requested group limit {} clamped to {}",
                    limit,
                    self.max_group_limit
                );
                self.max_group_limit
            }
            Some(limit) => limit,
        }
    }
}

fn parse_usize(var: &str, default: usize) -> Result<usize, ConfigError> {
    match env::var(var) {
        Ok(value) => value.trim().parse().map_err(|_| {
            ConfigError::InvalidValue(format!("{} must be a non-negative integer, got '{}'", var, value))
        }),
        Err(_) => Ok(default),
    }
}
