//! Migration configuration.
//!
//! Built by the CLI from command-line flags; there is no config file.
//! The JSON column-name dictionary is an explicit field here rather than
//! module-level state so the heuristics stay testable.

use crate::error::{MigrateError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

/// Default number of rows per insert round-trip.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Default number of rows sampled per table for JSON detection.
pub const DEFAULT_SAMPLE_ROWS: usize = 10;

/// Column names that are likely to hold JSON documents when the declared
/// type gives no hint. Compared lowercased.
const DEFAULT_JSON_NAME_HINTS: &[&str] = &[
    "meta",
    "metadata",
    "settings",
    "config",
    "payload",
    "options",
    "attributes",
    "properties",
    "extra",
    "json",
];

/// Root configuration for a migration run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the SQLite database file.
    pub source_path: PathBuf,

    /// PostgreSQL connection string / DSN.
    pub target_dsn: String,

    /// Print DDL only; execute nothing against the target.
    #[serde(default)]
    pub dry_run: bool,

    /// Tables to skip entirely.
    #[serde(default)]
    pub skip_tables: HashSet<String>,

    /// Column names forced to be treated as JSON, in every table (lowercased).
    #[serde(default)]
    pub json_columns: HashSet<String>,

    /// Column-name dictionary for JSON detection (lowercased).
    #[serde(default = "default_json_name_hints")]
    pub json_name_hints: HashSet<String>,

    /// Rows sampled per table for JSON detection.
    #[serde(default = "default_sample_rows")]
    pub sample_rows: usize,

    /// Rows per insert round-trip.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_json_name_hints() -> HashSet<String> {
    DEFAULT_JSON_NAME_HINTS.iter().map(|s| s.to_string()).collect()
}

fn default_sample_rows() -> usize {
    DEFAULT_SAMPLE_ROWS
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

impl Config {
    /// Create a configuration with defaults for everything but the endpoints.
    pub fn new(source_path: impl Into<PathBuf>, target_dsn: impl Into<String>) -> Self {
        Self {
            source_path: source_path.into(),
            target_dsn: target_dsn.into(),
            dry_run: false,
            skip_tables: HashSet::new(),
            json_columns: HashSet::new(),
            json_name_hints: default_json_name_hints(),
            sample_rows: DEFAULT_SAMPLE_ROWS,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Parse a comma-separated list flag into a set, trimmed and lowercased.
    pub fn parse_list(raw: &str) -> HashSet<String> {
        raw.split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.source_path.as_os_str().is_empty() {
            return Err(MigrateError::Config("source path is empty".to_string()));
        }
        if self.target_dsn.trim().is_empty() {
            return Err(MigrateError::Config("target DSN is empty".to_string()));
        }
        if self.batch_size == 0 {
            return Err(MigrateError::Config(
                "batch size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list_trims_and_lowercases() {
        let set = Config::parse_list(" Nodes, connections ,,PinData ");
        assert_eq!(set.len(), 3);
        assert!(set.contains("nodes"));
        assert!(set.contains("connections"));
        assert!(set.contains("pindata"));
    }

    #[test]
    fn test_parse_list_empty() {
        assert!(Config::parse_list("").is_empty());
        assert!(Config::parse_list(" , ,").is_empty());
    }

    #[test]
    fn test_validate_rejects_zero_batch() {
        let mut config = Config::new("db.sqlite", "postgresql://localhost/db");
        config.batch_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_endpoints() {
        assert!(Config::new("", "postgresql://localhost/db").validate().is_err());
        assert!(Config::new("db.sqlite", "  ").validate().is_err());
    }

    #[test]
    fn test_default_hints_present() {
        let config = Config::new("db.sqlite", "postgresql://localhost/db");
        assert!(config.json_name_hints.contains("meta"));
        assert!(config.json_name_hints.contains("settings"));
    }
}
