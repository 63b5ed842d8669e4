use thiserror::Error;
use xihe_domain::{DomainError, ProviderError, RepositoryError};

use crate::command::ValidationError;

pub type TrainingResult<T> = std::result::Result<T, TrainingError>;

#[derive(Debug, Error)]
pub enum TrainingError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    InvalidValue(#[from] DomainError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("training platform error: {0}")]
    Platform(#[from] ProviderError),

    #[error("a project can hold at most {0} trainings")]
    TooManyTrainings(usize),

    #[error("job already finished with status {0}")]
    JobAlreadyDone(String),
}
