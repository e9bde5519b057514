//! Configuration for the query layer and its front ends

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::catalog::CatalogEntry;
use crate::error::Result;
use crate::filter::FilterConfig;

/// Environment variable that overrides `database.path`
pub const DB_PATH_ENV: &str = "NEO_QUERY_DB";

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NeoQueryConfig {
    /// Database connection settings
    pub database: DatabaseConfig,
    /// Starting filter for `filter` requests
    pub filters: FilterConfig,
    /// Output settings
    pub output: OutputConfig,
    /// Extra catalog entries appended after the built-in ones
    pub queries: Vec<CatalogEntry>,
}

/// Database connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Path to the SQLite file
    pub path: PathBuf,
    /// Open the file read-only (default: true)
    pub read_only: bool,
    /// How long a statement waits on a locked database, in milliseconds
    pub busy_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("Asteroid_Data.db"),
            read_only: true,
            busy_timeout_ms: 5000,
        }
    }
}

/// Result rendering format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Csv,
}

/// Output configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Rendering format
    pub format: OutputFormat,
    /// Cap on rows shown by the table renderer (None = all)
    pub max_rows: Option<usize>,
}

impl NeoQueryConfig {
    /// Parse a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&text)?;
        tracing::debug!("Loaded configuration from {}", path.as_ref().display());
        Ok(config)
    }

    /// Load from an optional file, then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Apply `NEO_QUERY_DB`
    pub fn apply_env(&mut self) {
        if let Ok(path) = std::env::var(DB_PATH_ENV) {
            if !path.trim().is_empty() {
                self.database.path = PathBuf::from(path);
            }
        }
    }
}
