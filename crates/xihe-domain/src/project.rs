//! Project aggregate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::values::{
    Account, CoverId, ProjName, ProjType, ProtocolName, RepoType, ResourceDesc, TrainingPlatform,
};

/// Reference to a resource (model, dataset, project) owned by some user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceIndex {
    pub owner: Account,
    pub id: String,
}

impl ResourceIndex {
    pub fn new(owner: Account, id: impl Into<String>) -> DomainResult<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(DomainError::InvalidValue("ResourceIndex: id is required".to_string()));
        }
        Ok(Self { owner, id })
    }
}

/// Ordered, duplicate-free set of resource references.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelatedResources(Vec<ResourceIndex>);

impl RelatedResources {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `index` unless already present. Returns whether the set changed.
    pub fn insert(&mut self, index: ResourceIndex) -> bool {
        if self.contains(&index) {
            return false;
        }
        self.0.push(index);
        true
    }

    /// Removes `index` if present. Returns whether the set changed.
    pub fn remove(&mut self, index: &ResourceIndex) -> bool {
        let before = self.0.len();
        self.0.retain(|v| v != index);
        before != self.0.len()
    }

    #[must_use]
    pub fn contains(&self, index: &ResourceIndex) -> bool {
        self.0.contains(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourceIndex> {
        self.0.iter()
    }
}

impl FromIterator<ResourceIndex> for RelatedResources {
    fn from_iter<I: IntoIterator<Item = ResourceIndex>>(iter: I) -> Self {
        let mut set = Self::new();
        for index in iter {
            set.insert(index);
        }
        set
    }
}

/// The part of a project its owner may change after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectModifiableProperty {
    pub name: ProjName,
    pub desc: ResourceDesc,
    pub proj_type: ProjType,
    pub cover_id: CoverId,
    pub repo_type: RepoType,
    pub tags: Vec<String>,
}

/// A user's ML workspace backed by an external code repository.
///
/// An empty `id` means the project has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub owner: Account,
    pub protocol: ProtocolName,
    pub training: TrainingPlatform,
    pub property: ProjectModifiableProperty,
    pub repo_id: String,
    pub related_models: RelatedResources,
    pub related_datasets: RelatedResources,
    pub like_count: u64,
    pub fork_count: u64,
    /// Optimistic-lock token, bumped by the repository on every versioned write.
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Creates a project that has not been persisted yet.
    #[must_use]
    pub fn new(
        owner: Account,
        protocol: ProtocolName,
        training: TrainingPlatform,
        property: ProjectModifiableProperty,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: String::new(),
            owner,
            protocol,
            training,
            property,
            repo_id: String::new(),
            related_models: RelatedResources::new(),
            related_datasets: RelatedResources::new(),
            like_count: 0,
            fork_count: 0,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[must_use]
    pub fn is_new(&self) -> bool {
        self.id.is_empty()
    }

    #[must_use]
    pub fn name(&self) -> &ProjName {
        &self.property.name
    }

    #[must_use]
    pub fn index(&self) -> ResourceIndex {
        ResourceIndex { owner: self.owner.clone(), id: self.id.clone() }
    }
}
