use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::types::{DEFAULT_BATCH_SIZE, DEFAULT_PAGE_SIZE, error::DatabaseError};

/// Top-level settings, usually read from a TOML file:
///
/// ```toml
/// batch_size = 10
/// page_size = 7
///
/// [database]
/// path = "prodev.db"
/// busy_timeout_ms = 5000
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamConfig {
    pub database: DatabaseConfig,

    /// Rows per page for batch streaming
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Rows per request for offset pagination
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

/// Where the data lives. Passed to the connection provider at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file
    pub path: PathBuf,

    /// How long a connection waits on a locked database
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_busy_timeout_ms() -> u64 {
    5000 // 5 seconds
}

impl DatabaseConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

impl StreamConfig {
    pub fn new(database: DatabaseConfig) -> Self {
        Self {
            database,
            batch_size: default_batch_size(),
            page_size: default_page_size(),
        }
    }

    /// Load config from TOML file
    pub fn from_file(path: &Path) -> Result<Self, DatabaseError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, DatabaseError> {
        let config: StreamConfig = toml::from_str(content).map_err(|e| DatabaseError::Config {
            details: format!("Failed to parse config: {}", e),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Sizes are checked here so a bad file fails before any scan starts.
    pub fn validate(&self) -> Result<(), DatabaseError> {
        if self.batch_size == 0 {
            return Err(DatabaseError::InvalidBatchSize {
                size: self.batch_size,
            });
        }
        if self.page_size == 0 {
            return Err(DatabaseError::InvalidPageSize {
                size: self.page_size,
            });
        }
        if self.database.path.as_os_str().is_empty() {
            return Err(DatabaseError::Config {
                details: "database.path must not be empty".to_string(),
            });
        }
        Ok(())
    }
}
