//! Error types shared by the domain layer and its ports.

use thiserror::Error;

/// Errors raised while constructing domain values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A raw value violated the format, length or charset rules of its type.
    #[error("invalid value: {0}")]
    InvalidValue(String),
}

/// Result type alias for domain value construction.
pub type DomainResult<T> = std::result::Result<T, DomainError>;

/// Errors reported by repository ports.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// A create-only save received an aggregate that already has an identity.
    #[error("must be a new {0}")]
    NotNew(&'static str),

    /// An aggregate with the same natural key already exists.
    #[error("duplicate creating: {0}")]
    Duplicate(String),

    /// No aggregate matches the lookup key.
    #[error("not found: {0}")]
    NotFound(String),

    /// The caller-supplied version does not match the stored one.
    #[error("concurrent modification")]
    ConcurrentModification,

    /// A create was refused because the scope already holds this many aggregates.
    #[error("at most {0} allowed")]
    LimitReached(usize),

    /// A stored representation could not be rebuilt into its domain type.
    #[error("invalid stored value: {0}")]
    InvalidValue(String),

    /// The backing store failed.
    #[error("repository backend error: {0}")]
    Backend(String),
}

impl From<DomainError> for RepositoryError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::InvalidValue(msg) => Self::InvalidValue(msg),
        }
    }
}

/// Result type alias for repository operations.
pub type RepositoryResult<T> = std::result::Result<T, RepositoryError>;

/// Failure reported by an external provider (code hosting, compute platform).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("provider error: {0}")]
pub struct ProviderError(pub String);

impl ProviderError {
    #[must_use]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_new_message() {
        let err = RepositoryError::NotNew("project");
        assert_eq!(err.to_string(), "must be a new project");
    }

    #[test]
    fn test_domain_error_converts_to_invalid_stored_value() {
        let err: RepositoryError =
            DomainError::InvalidValue("account: too short".to_string()).into();
        assert_eq!(err, RepositoryError::InvalidValue("account: too short".to_string()));
    }
}
