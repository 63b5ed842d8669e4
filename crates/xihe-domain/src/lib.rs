//! Xihe Domain
//!
//! Shared domain primitives for the project/training backend:
//! - Validated value types (`Account`, `ProjName`, `RepoType`, ...)
//! - The `Project` aggregate and activity records
//! - Ports for persistence (`ProjectRepository`, `ActivityRepository`)
//!   and code hosting (`RepoProvider`)

pub mod activity;
pub mod error;
pub mod platform;
pub mod project;
pub mod repository;
pub mod values;

pub use activity::{Activity, ActivityType, ResourceObject};
pub use error::{DomainError, DomainResult, ProviderError, RepositoryError, RepositoryResult};
pub use platform::{RepoOption, RepoProvider};
pub use project::{Project, ProjectModifiableProperty, RelatedResources, ResourceIndex};
pub use repository::{
    ActivityRepository, ProjectPropertyUpdateInfo, ProjectRepository, RelatedResourceInfo,
    ResourceListOption, ResourceToUpdate, UserResourceListOption,
};
pub use values::{
    Account, CoverId, ProjName, ProjType, ProtocolName, RepoType, ResourceDesc, ResourceType,
    TrainingPlatform,
};
