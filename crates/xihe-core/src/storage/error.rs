//! Error types for the storage layer.

use thiserror::Error;
use xihe_domain::{DomainError, RepositoryError};

/// Errors that can occur in the storage layer.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Database connection or statement error.
    #[error("Database error: {0}")]
    Connection(#[from] rusqlite::Error),

    /// Item not found in storage.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid data error.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// The stored version differs from the one the caller read.
    #[error("Version conflict")]
    Conflict,

    /// The shared connection was poisoned by a panicking holder.
    #[error("Database lock poisoned")]
    Poisoned,

    /// An insert was refused because its scope already holds the maximum number of rows.
    #[error("Limit of {0} rows reached")]
    LimitReached(usize),
}

/// Result type alias for storage operations.
pub type StorageResult<T> = std::result::Result<T, StorageError>;

impl From<DomainError> for StorageError {
    fn from(err: DomainError) -> Self {
        Self::InvalidData(err.to_string())
    }
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

impl From<StorageError> for RepositoryError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Connection(e) if is_constraint_violation(&e) => {
                Self::Duplicate(e.to_string())
            }
            StorageError::NotFound(msg) => Self::NotFound(msg),
            StorageError::Conflict => Self::ConcurrentModification,
            StorageError::LimitReached(max) => Self::LimitReached(max),
            StorageError::Serialization(e) => Self::InvalidValue(e.to_string()),
            StorageError::InvalidData(msg) => Self::InvalidValue(msg),
            other => Self::Backend(other.to_string()),
        }
    }
}
