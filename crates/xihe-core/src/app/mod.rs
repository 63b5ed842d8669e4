//! Application services.

pub mod dto;
pub mod project;
pub mod training;

pub use dto::{ComputeDTO, ProjectDTO, TrainingDTO, TrainingSummaryDTO, to_date};
pub use project::{
    ProjectCreateCmd, ProjectForkCmd, ProjectService, ProjectUpdateCmd, PropertyChange,
    ResourceListCmd, ResourceTagsUpdateCmd,
};
pub use training::TrainingService;
