//! Error types for loading and persisting database files.
//!
//! Covers every way a file can be refused at open time, plus I/O, engine,
//! and configuration failures.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading or saving a database file.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// The file does not exist.
    #[error("Database file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The file extension is not in the allow-list.
    #[error("Unsupported file format: {0}. Supported formats: .db, .sqlite, .sqlite3")]
    UnsupportedFormat(String),

    /// The file content is not a valid SQLite image.
    #[error("Invalid SQLite database: {0}")]
    InvalidFormat(String),

    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Engine failure outside of image validation.
    #[error("engine error: {0}")]
    EngineError(#[from] rusqlite::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

/// Convenience alias for results with [`DatabaseError`].
pub type Result<T> = std::result::Result<T, DatabaseError>;
