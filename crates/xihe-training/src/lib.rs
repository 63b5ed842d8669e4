//! Xihe Training
//!
//! Training-job primitives for:
//! - Describing a job (`TrainingConfig`) and validating requests (`TrainingCreateCmd`)
//! - The persisted aggregate (`UserTraining`) and its listing projection
//! - Reconciling platform status reports (`JobStatusRules`)
//! - Ports for persistence (`TrainingRepository`) and the compute platform (`Trainer`)

pub mod command;
pub mod config;
pub mod error;
pub mod job;
pub mod repository;
pub mod status;
pub mod trainer;

pub use command::{
    ComputeCmd, InputCmd, KeyValueCmd, TrainingCreateCmd, ValidationError, ValidationRule,
};
pub use config::{
    Compute, ComputeFlavor, ComputeType, ComputeVersion, CustomizedKey, CustomizedValue,
    Directory, FilePath, Input, KeyValue, TrainingConfig, TrainingDesc, TrainingName,
};
pub use error::{TrainingError, TrainingResult};
pub use job::{JobDetail, JobInfo, TrainingIndex, TrainingSummary, UserTraining};
pub use repository::TrainingRepository;
pub use status::{DEFAULT_DONE_STATUSES, JobStatusRules, STATUS_SCHEDULING};
pub use trainer::{Trainer, TrainingSubmission};
