// ⚙️ Ledger configuration
//
// Every field has a default, so an empty JSON object (or no file at all)
// yields a working configuration.

use crate::error::{LedgerError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable pointing at a JSON config file
pub const CONFIG_ENV: &str = "BUDGET_LEDGER_CONFIG";

/// Environment variable overriding the database path
pub const DB_ENV: &str = "BUDGET_LEDGER_DB";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// SQLite database file
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Use WAL journal mode for file-backed stores
    #[serde(default = "default_wal")]
    pub wal: bool,

    /// How many months past the current one the calendar enumerates
    #[serde(default = "default_months_ahead")]
    pub months_ahead: u32,

    /// `EnvFilter` directive used by `init_tracing`
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_database_path() -> PathBuf {
    PathBuf::from("budget.db")
}

fn default_wal() -> bool {
    true
}

fn default_months_ahead() -> u32 {
    10
}

fn default_log_filter() -> String {
    "budget_ledger=info".to_string()
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal: default_wal(),
            months_ahead: default_months_ahead(),
            log_filter: default_log_filter(),
        }
    }
}

impl LedgerConfig {
    /// Configuration for a store at `path`, everything else defaulted
    pub fn with_database(path: impl Into<PathBuf>) -> Self {
        Self {
            database_path: path.into(),
            ..Self::default()
        }
    }

    /// Load from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            LedgerError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        serde_json::from_str(contents)
            .map_err(|e| LedgerError::Config(format!("invalid config: {}", e)))
    }

    /// Resolve from `BUDGET_LEDGER_CONFIG` (file) then `BUDGET_LEDGER_DB` (override)
    pub fn from_env() -> Result<Self> {
        let mut config = match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::load(Path::new(&path))?,
            None => Self::default(),
        };

        if let Some(db) = std::env::var_os(DB_ENV) {
            config.database_path = PathBuf::from(db);
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LedgerConfig::default();
        assert_eq!(config.database_path, PathBuf::from("budget.db"));
        assert!(config.wal);
        assert_eq!(config.months_ahead, 10);
        assert_eq!(config.log_filter, "budget_ledger=info");
    }

    #[test]
    fn test_empty_json_uses_defaults() {
        let config = LedgerConfig::from_json("{}").unwrap();
        assert_eq!(config, LedgerConfig::default());
    }

    #[test]
    fn test_partial_json() {
        let config =
            LedgerConfig::from_json(r#"{"database_path": "/tmp/x.db", "months_ahead": 3}"#)
                .unwrap();
        assert_eq!(config.database_path, PathBuf::from("/tmp/x.db"));
        assert_eq!(config.months_ahead, 3);
        assert!(config.wal);
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        let err = LedgerConfig::from_json("not json").unwrap_err();
        assert!(matches!(err, LedgerError::Config(_)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        std::fs::write(&path, r#"{"wal": false}"#).unwrap();

        let config = LedgerConfig::load(&path).unwrap();
        assert!(!config.wal);
        assert_eq!(config.months_ahead, 10);
    }

    #[test]
    fn test_load_missing_file() {
        let err = LedgerConfig::load(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, LedgerError::Config(_)));
    }
}
