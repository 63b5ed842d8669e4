//! Xihe Core
//!
//! Application layer of the project/training backend:
//! - Project and training services with their commands and DTOs
//! - SQLite implementations of the repository ports
//! - Configuration, logging setup and the `AppContext` composition root

pub mod app;
pub mod config;
pub mod context;
pub mod error;
pub mod logging;
pub mod storage;

pub use app::{
    ProjectCreateCmd, ProjectDTO, ProjectForkCmd, ProjectService, ProjectUpdateCmd,
    ResourceListCmd, ResourceTagsUpdateCmd, TrainingDTO, TrainingService, TrainingSummaryDTO,
};
pub use config::{Config, ConfigError, DatabaseConfig, LoggingConfig, TrainingServiceConfig};
pub use context::AppContext;
pub use error::{ServiceError, ServiceResult};
