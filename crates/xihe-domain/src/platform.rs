//! Code-hosting provider port.

use async_trait::async_trait;

use crate::error::ProviderError;
use crate::values::{ProjName, RepoType};

/// Options for creating or reconfiguring a backing repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoOption {
    pub name: ProjName,
    pub repo_type: RepoType,
}

/// External version-control hosting integration.
#[async_trait]
pub trait RepoProvider: Send + Sync {
    /// Creates a repository and returns its external id.
    async fn new_repo(&self, option: &RepoOption) -> Result<String, ProviderError>;

    /// Renames or changes the visibility of an existing repository.
    async fn update_repo(&self, repo_id: &str, option: &RepoOption) -> Result<(), ProviderError>;
}
