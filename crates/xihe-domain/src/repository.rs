//! Persistence ports for projects and activities.
//!
//! Implementations own identity assignment and enforce the concurrency rules:
//! create-only `save`, single-statement counter updates, and version checks on
//! every versioned write.

use async_trait::async_trait;

use crate::activity::Activity;
use crate::error::RepositoryResult;
use crate::project::{Project, ProjectModifiableProperty, ResourceIndex};
use crate::values::{Account, ProjName, RepoType};

/// Filter for listing one owner's projects.
#[derive(Debug, Clone, Default)]
pub struct ResourceListOption {
    /// Substring match on the project name.
    pub name: Option<String>,
    pub repo_type: Option<RepoType>,
}

/// Selects a batch of projects owned by one user.
#[derive(Debug, Clone)]
pub struct UserResourceListOption {
    pub owner: Account,
    pub ids: Vec<String>,
}

/// Identifies a project together with the version the caller last read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceToUpdate {
    pub owner: Account,
    pub id: String,
    pub version: u64,
}

impl From<&Project> for ResourceToUpdate {
    fn from(p: &Project) -> Self {
        Self { owner: p.owner.clone(), id: p.id.clone(), version: p.version }
    }
}

/// A related-resource set mutation.
#[derive(Debug, Clone)]
pub struct RelatedResourceInfo {
    pub target: ResourceToUpdate,
    pub resource: ResourceIndex,
}

/// A property update guarded by the caller's version.
#[derive(Debug, Clone)]
pub struct ProjectPropertyUpdateInfo {
    pub target: ResourceToUpdate,
    pub property: ProjectModifiableProperty,
}

#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// Persists a new project and returns it with its assigned id.
    ///
    /// Fails with `NotNew` when `project.id` is already set.
    async fn save(&self, project: &Project) -> RepositoryResult<Project>;

    async fn get(&self, owner: &Account, id: &str) -> RepositoryResult<Project>;

    async fn get_by_name(&self, owner: &Account, name: &ProjName) -> RepositoryResult<Project>;

    /// Lists an owner's projects. No match is an empty list, not an error.
    async fn list(&self, owner: &Account, option: &ResourceListOption)
    -> RepositoryResult<Vec<Project>>;

    async fn find_user_projects(
        &self,
        options: &[UserResourceListOption],
    ) -> RepositoryResult<Vec<Project>>;

    async fn increase_fork(&self, owner: &Account, id: &str) -> RepositoryResult<()>;

    async fn add_like(&self, owner: &Account, id: &str) -> RepositoryResult<()>;

    async fn remove_like(&self, owner: &Account, id: &str) -> RepositoryResult<()>;

    async fn add_related_model(&self, info: &RelatedResourceInfo) -> RepositoryResult<()>;

    async fn remove_related_model(&self, info: &RelatedResourceInfo) -> RepositoryResult<()>;

    async fn add_related_dataset(&self, info: &RelatedResourceInfo) -> RepositoryResult<()>;

    async fn remove_related_dataset(&self, info: &RelatedResourceInfo) -> RepositoryResult<()>;

    /// Replaces the modifiable property and returns the new version.
    async fn update_property(&self, info: &ProjectPropertyUpdateInfo) -> RepositoryResult<u64>;
}

/// Append-only audit sink.
#[async_trait]
pub trait ActivityRepository: Send + Sync {
    async fn save(&self, activity: &Activity) -> RepositoryResult<()>;
}
