//! Error types for Xihe Core.

use thiserror::Error;
use xihe_domain::{DomainError, ProviderError, RepositoryError};
use xihe_training::{TrainingError, ValidationError};

use crate::storage::StorageError;

/// Error returned by the application services.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// A command was malformed; nothing was persisted or submitted.
    #[error("{0}")]
    Validation(String),

    /// A stored value could not be rebuilt into its domain type.
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// The aggregate changed since the caller read it; re-read and retry.
    #[error("concurrent modification")]
    ConcurrencyConflict,

    #[error("not found: {0}")]
    NotFound(String),

    /// The code hosting or compute platform failed.
    #[error("external provider error: {0}")]
    ExternalProvider(String),

    /// The request conflicts with current state (duplicate, limit reached, job finished).
    #[error("{0}")]
    Conflict(String),

    #[error("storage error: {0}")]
    Storage(String),
}

/// Result type alias for service operations.
pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotNew(_)
            | RepositoryError::Duplicate(_)
            | RepositoryError::LimitReached(_) => Self::Conflict(err.to_string()),
            RepositoryError::NotFound(msg) => Self::NotFound(msg),
            RepositoryError::ConcurrentModification => Self::ConcurrencyConflict,
            RepositoryError::InvalidValue(msg) => Self::InvalidValue(msg),
            RepositoryError::Backend(msg) => Self::Storage(msg),
        }
    }
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        RepositoryError::from(err).into()
    }
}

impl From<DomainError> for ServiceError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::InvalidValue(msg) => Self::InvalidValue(msg),
        }
    }
}

impl From<ProviderError> for ServiceError {
    fn from(err: ProviderError) -> Self {
        Self::ExternalProvider(err.0)
    }
}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<TrainingError> for ServiceError {
    fn from(err: TrainingError) -> Self {
        match err {
            TrainingError::Validation(e) => e.into(),
            TrainingError::InvalidValue(e) => e.into(),
            TrainingError::Repository(e) => e.into(),
            TrainingError::Platform(e) => e.into(),
            TrainingError::TooManyTrainings(_) | TrainingError::JobAlreadyDone(_) => {
                Self::Conflict(err.to_string())
            }
        }
    }
}
