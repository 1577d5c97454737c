//! Error types for the access layer.
//!
//! Only contract violations and read-path failures live here. Engine
//! failures on the write path are not errors: they are returned as
//! [`ExecuteResult::Failed`](dbgrid_core::ExecuteResult::Failed).

use dbgrid_core::IdentifierError;
use dbgrid_db::DatabaseError;
use thiserror::Error;

/// Errors that can occur during access-layer operations.
#[derive(Debug, Error)]
pub enum AccessError {
    /// The handle is closed or was never opened.
    #[error("Database not open")]
    NotOpen,

    /// A table or column name contains a forbidden character.
    #[error(transparent)]
    InvalidIdentifier(#[from] IdentifierError),

    /// The file could not be opened (missing, unsupported, or invalid).
    #[error(transparent)]
    Load(#[from] DatabaseError),

    /// A read statement failed to prepare or step.
    #[error("{0}")]
    Engine(#[from] rusqlite::Error),

    /// A mutation succeeded in memory but could not be written back.
    #[error("failed to save database: {0}")]
    Persist(#[source] DatabaseError),
}

/// Convenience alias for results with [`AccessError`].
pub type Result<T> = std::result::Result<T, AccessError>;
