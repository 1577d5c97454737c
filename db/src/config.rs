//! Editor configuration.
//!
//! Defines the YAML-serializable settings shared by the access layer and its
//! hosts. Every field has a default, so an empty document (or no file at all)
//! yields a working configuration.
//!
//! # Example YAML
//!
//! ```yaml
//! default_page_size: 50
//! engine:
//!   foreign_keys: true
//! log_filter: "dbgrid=debug"
//! ```

use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Rows per page when a caller does not ask for a specific size.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Settings applied to each freshly initialized engine instance.
///
/// # Examples
///
/// ```
/// # use dbgrid_db::EngineOptions;
/// let options = EngineOptions::default();
/// assert!(!options.foreign_keys);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    /// Enforce foreign key constraints (`PRAGMA foreign_keys = ON`).
    pub foreign_keys: bool,
}

/// Top-level editor configuration.
///
/// # Examples
///
/// ```
/// use dbgrid_db::EditorConfig;
///
/// let config: EditorConfig = serde_yaml::from_str("default_page_size: 25").unwrap();
/// assert_eq!(config.default_page_size, 25);
/// assert!(!config.engine.foreign_keys);
/// assert_eq!(config.log_filter, "warn");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Page size used by table reads that do not specify one.
    pub default_page_size: usize,
    /// Engine settings.
    pub engine: EngineOptions,
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            engine: EngineOptions::default(),
            log_filter: "warn".to_string(),
        }
    }
}

impl EditorConfig {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::DatabaseError::IoError) if the file cannot
    /// be read, or [`YamlError`](crate::DatabaseError::YamlError) if parsing
    /// fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    /// Loads configuration from `path` if given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Saves the configuration as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::DatabaseError::IoError) if the file cannot
    /// be written, or [`YamlError`](crate::DatabaseError::YamlError) if
    /// serialization fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }
}
