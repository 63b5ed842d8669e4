//! Project application service and its commands.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, info, warn};
use xihe_domain::{
    Account, Activity, ActivityRepository, ActivityType, CoverId, ProjName, ProjType, Project,
    ProjectModifiableProperty, ProjectPropertyUpdateInfo, ProjectRepository, ProtocolName,
    RelatedResourceInfo, RepoOption, RepoProvider, RepoType, ResourceDesc, ResourceIndex,
    ResourceListOption, ResourceObject, ResourceToUpdate, ResourceType, TrainingPlatform,
};

use crate::app::dto::ProjectDTO;
use crate::error::{ServiceError, ServiceResult};

const INVALID_PROJECT_CMD: &str = "invalid cmd of creating project";

/// Request to create a project. Every field is required.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProjectCreateCmd {
    pub owner: Option<Account>,
    pub name: Option<ProjName>,
    pub desc: Option<ResourceDesc>,
    #[serde(rename = "type")]
    pub proj_type: Option<ProjType>,
    pub cover_id: Option<CoverId>,
    pub repo_type: Option<RepoType>,
    pub protocol: Option<ProtocolName>,
    pub training: Option<TrainingPlatform>,
}

impl ProjectCreateCmd {
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` if any field is missing.
    pub fn validate(&self) -> ServiceResult<()> {
        let complete = self.owner.is_some()
            && self.name.is_some()
            && self.desc.is_some()
            && self.proj_type.is_some()
            && self.cover_id.is_some()
            && self.repo_type.is_some()
            && self.protocol.is_some()
            && self.training.is_some();
        if complete {
            Ok(())
        } else {
            Err(ServiceError::Validation(INVALID_PROJECT_CMD.to_string()))
        }
    }

    fn into_project(self) -> ServiceResult<Project> {
        let (
            Some(owner),
            Some(name),
            Some(desc),
            Some(proj_type),
            Some(cover_id),
            Some(repo_type),
            Some(protocol),
            Some(training),
        ) = (
            self.owner,
            self.name,
            self.desc,
            self.proj_type,
            self.cover_id,
            self.repo_type,
            self.protocol,
            self.training,
        )
        else {
            return Err(ServiceError::Validation(INVALID_PROJECT_CMD.to_string()));
        };

        let property =
            ProjectModifiableProperty { name, desc, proj_type, cover_id, repo_type, tags: vec![] };
        Ok(Project::new(owner, protocol, training, property))
    }
}

/// What applying a `ProjectUpdateCmd` changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyChange {
    None,
    /// Only fields stored by this service changed.
    Local,
    /// The name or repo type changed, so the backing repository must follow.
    Repo,
}

/// Partial update of a project's modifiable property.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProjectUpdateCmd {
    pub name: Option<ProjName>,
    pub desc: Option<ResourceDesc>,
    #[serde(rename = "type")]
    pub proj_type: Option<ProjType>,
    pub cover_id: Option<CoverId>,
    pub repo_type: Option<RepoType>,
}

fn replace<T: PartialEq + Clone>(field: &mut T, value: Option<&T>) -> bool {
    match value {
        Some(v) if v != field => {
            *field = v.clone();
            true
        }
        _ => false,
    }
}

impl ProjectUpdateCmd {
    pub fn apply(&self, property: &mut ProjectModifiableProperty) -> PropertyChange {
        let repo = replace(&mut property.name, self.name.as_ref())
            | replace(&mut property.repo_type, self.repo_type.as_ref());
        let local = replace(&mut property.desc, self.desc.as_ref())
            | replace(&mut property.proj_type, self.proj_type.as_ref())
            | replace(&mut property.cover_id, self.cover_id.as_ref());

        if repo {
            PropertyChange::Repo
        } else if local {
            PropertyChange::Local
        } else {
            PropertyChange::None
        }
    }
}

/// Copy `from` into a new project owned by `owner`.
#[derive(Debug, Clone)]
pub struct ProjectForkCmd {
    pub owner: Account,
    pub name: ProjName,
    pub desc: ResourceDesc,
    pub from: Project,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ResourceTagsUpdateCmd {
    pub to_add: Vec<String>,
    pub to_remove: Vec<String>,
}

impl ResourceTagsUpdateCmd {
    /// Applies the command to `old`, or returns `None` when nothing changes.
    ///
    /// Surviving tags keep their order; new tags are appended in the order given.
    #[must_use]
    pub fn to_new_tags(&self, old: &[String]) -> Option<Vec<String>> {
        let mut tags: Vec<String> =
            old.iter().filter(|t| !self.to_remove.contains(t)).cloned().collect();
        for tag in &self.to_add {
            if !tags.contains(tag) {
                tags.push(tag.clone());
            }
        }
        (tags.as_slice() != old).then_some(tags)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ResourceListCmd {
    pub name: Option<String>,
    pub repo_type: Option<RepoType>,
}

impl From<&ResourceListCmd> for ResourceListOption {
    fn from(cmd: &ResourceListCmd) -> Self {
        Self {
            name: cmd.name.clone().filter(|n| !n.is_empty()),
            repo_type: cmd.repo_type.clone(),
        }
    }
}

/// Orchestrates project use cases over the repository port, the activity
/// log and the code-hosting provider.
pub struct ProjectService {
    repo: Arc<dyn ProjectRepository>,
    activity: Arc<dyn ActivityRepository>,
    provider: Arc<dyn RepoProvider>,
}

impl ProjectService {
    pub fn new(
        repo: Arc<dyn ProjectRepository>,
        activity: Arc<dyn ActivityRepository>,
        provider: Arc<dyn RepoProvider>,
    ) -> Self {
        Self { repo, activity, provider }
    }

    /// Writes an activity record. Failures are logged and dropped.
    async fn record(&self, activity: Activity) {
        if let Err(e) = self.activity.save(&activity).await {
            warn!(
                owner = %activity.owner,
                resource_id = %activity.resource.id,
                error = %e,
                "Failed to record activity"
            );
        }
    }

    /// Creates the backing repository, then persists the project.
    ///
    /// A repository created before a failed save is left in place.
    ///
    /// # Errors
    ///
    /// Fails on an incomplete command, a provider failure (nothing persisted)
    /// or a repository failure.
    pub async fn create(&self, cmd: ProjectCreateCmd) -> ServiceResult<ProjectDTO> {
        cmd.validate()?;
        let mut project = cmd.into_project()?;

        let option = RepoOption {
            name: project.property.name.clone(),
            repo_type: project.property.repo_type.clone(),
        };
        project.repo_id = self.provider.new_repo(&option).await?;

        let project = self.repo.save(&project).await?;
        info!(project_id = %project.id, owner = %project.owner, "Project created");

        self.record(Activity::for_creating_resource(
            &project.owner,
            ResourceType::project(),
            &project.id,
        ))
        .await;

        Ok(ProjectDTO::from(&project))
    }

    pub async fn get_by_name(&self, owner: &Account, name: &ProjName) -> ServiceResult<ProjectDTO> {
        let project = self.repo.get_by_name(owner, name).await?;
        Ok(ProjectDTO::from(&project))
    }

    pub async fn list(
        &self,
        owner: &Account,
        cmd: &ResourceListCmd,
    ) -> ServiceResult<Vec<ProjectDTO>> {
        let projects = self.repo.list(owner, &ResourceListOption::from(cmd)).await?;
        debug!(owner = %owner, count = projects.len(), "Listed projects");
        Ok(projects.iter().map(ProjectDTO::from).collect())
    }

    /// Applies `cmd` to `project`, renaming or re-typing the backing
    /// repository when needed. An empty update is a no-op.
    pub async fn update(
        &self,
        project: &Project,
        cmd: &ProjectUpdateCmd,
    ) -> ServiceResult<ProjectDTO> {
        let mut property = project.property.clone();
        let change = cmd.apply(&mut property);
        if change == PropertyChange::None {
            return Ok(ProjectDTO::from(project));
        }

        if change == PropertyChange::Repo {
            let option =
                RepoOption { name: property.name.clone(), repo_type: property.repo_type.clone() };
            self.provider.update_repo(&project.repo_id, &option).await?;
        }

        let info = ProjectPropertyUpdateInfo { target: ResourceToUpdate::from(project), property };
        let version = self.repo.update_property(&info).await?;
        debug!(project_id = %project.id, version, "Project updated");

        let mut updated = project.clone();
        updated.property = info.property;
        updated.version = version;
        Ok(ProjectDTO::from(&updated))
    }

    /// Creates a copy of `cmd.from` owned by `cmd.owner`.
    ///
    /// The copy takes its type, cover, repo type, protocol, platform and tags
    /// from the source; the source's fork count is then incremented.
    pub async fn fork(&self, cmd: ProjectForkCmd) -> ServiceResult<ProjectDTO> {
        let from = &cmd.from;
        let property = ProjectModifiableProperty {
            name: cmd.name.clone(),
            desc: cmd.desc.clone(),
            proj_type: from.property.proj_type.clone(),
            cover_id: from.property.cover_id.clone(),
            repo_type: from.property.repo_type.clone(),
            tags: from.property.tags.clone(),
        };
        let option =
            RepoOption { name: property.name.clone(), repo_type: property.repo_type.clone() };
        let repo_id = self.provider.new_repo(&option).await?;

        let mut project =
            Project::new(cmd.owner.clone(), from.protocol.clone(), from.training.clone(), property);
        project.repo_id = repo_id;
        let project = self.repo.save(&project).await?;

        self.repo.increase_fork(&from.owner, &from.id).await?;
        info!(project_id = %project.id, from = %from.id, "Project forked");

        self.record(Activity::new(
            cmd.owner,
            ActivityType::Fork,
            ResourceObject {
                resource_type: ResourceType::project(),
                owner: from.owner.clone(),
                id: from.id.clone(),
            },
        ))
        .await;

        Ok(ProjectDTO::from(&project))
    }

    pub async fn add_like(&self, owner: &Account, project_id: &str) -> ServiceResult<()> {
        Ok(self.repo.add_like(owner, project_id).await?)
    }

    pub async fn remove_like(&self, owner: &Account, project_id: &str) -> ServiceResult<()> {
        Ok(self.repo.remove_like(owner, project_id).await?)
    }

    fn related(project: &Project, index: &ResourceIndex) -> RelatedResourceInfo {
        RelatedResourceInfo { target: ResourceToUpdate::from(project), resource: index.clone() }
    }

    pub async fn add_related_model(
        &self,
        project: &Project,
        index: &ResourceIndex,
    ) -> ServiceResult<()> {
        Ok(self.repo.add_related_model(&Self::related(project, index)).await?)
    }

    pub async fn remove_related_model(
        &self,
        project: &Project,
        index: &ResourceIndex,
    ) -> ServiceResult<()> {
        Ok(self.repo.remove_related_model(&Self::related(project, index)).await?)
    }

    pub async fn add_related_dataset(
        &self,
        project: &Project,
        index: &ResourceIndex,
    ) -> ServiceResult<()> {
        Ok(self.repo.add_related_dataset(&Self::related(project, index)).await?)
    }

    pub async fn remove_related_dataset(
        &self,
        project: &Project,
        index: &ResourceIndex,
    ) -> ServiceResult<()> {
        Ok(self.repo.remove_related_dataset(&Self::related(project, index)).await?)
    }

    /// Replaces the project's tags. An unchanged tag list is a no-op.
    pub async fn set_tags(
        &self,
        project: &Project,
        cmd: &ResourceTagsUpdateCmd,
    ) -> ServiceResult<()> {
        let Some(tags) = cmd.to_new_tags(&project.property.tags) else {
            return Ok(());
        };
        let mut property = project.property.clone();
        property.tags = tags;

        let info = ProjectPropertyUpdateInfo { target: ResourceToUpdate::from(project), property };
        self.repo.update_property(&info).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    fn property() -> ProjectModifiableProperty {
        ProjectModifiableProperty {
            name: ProjName::new("proj").unwrap(),
            desc: ResourceDesc::new("demo").unwrap(),
            proj_type: ProjType::new("cv").unwrap(),
            cover_id: CoverId::new("1").unwrap(),
            repo_type: RepoType::new("public").unwrap(),
            tags: vec![],
        }
    }

    #[test]
    fn test_create_cmd_requires_every_field() {
        let err = ProjectCreateCmd::default().validate().unwrap_err();
        assert_eq!(err.to_string(), "invalid cmd of creating project");

        let cmd = ProjectCreateCmd {
            owner: Some(Account::new("alice").unwrap()),
            name: Some(ProjName::new("proj").unwrap()),
            desc: Some(ResourceDesc::new("").unwrap()),
            proj_type: Some(ProjType::new("cv").unwrap()),
            cover_id: Some(CoverId::new("1").unwrap()),
            repo_type: Some(RepoType::new("private").unwrap()),
            protocol: Some(ProtocolName::new("MIT").unwrap()),
            training: None,
        };
        assert!(cmd.validate().is_err());
    }

    #[test]
    fn test_create_cmd_deserializes_type_field() {
        let cmd: ProjectCreateCmd = serde_json::from_str(
            r#"{"owner":"alice","name":"proj","desc":"","type":"cv","cover_id":"1",
                "repo_type":"public","protocol":"MIT","training":"ModelArts"}"#,
        )
        .unwrap();
        cmd.validate().unwrap();
        let project = cmd.into_project().unwrap();
        assert!(project.is_new());
        assert_eq!(project.property.proj_type.proj_type(), "cv");
    }

    #[test]
    fn test_update_cmd_classifies_change() {
        let mut p = property();
        assert_eq!(ProjectUpdateCmd::default().apply(&mut p), PropertyChange::None);

        let same_name =
            ProjectUpdateCmd { name: Some(ProjName::new("proj").unwrap()), ..Default::default() };
        assert_eq!(same_name.apply(&mut p), PropertyChange::None);

        let desc = ProjectUpdateCmd {
            desc: Some(ResourceDesc::new("new").unwrap()),
            ..Default::default()
        };
        assert_eq!(desc.apply(&mut p), PropertyChange::Local);
        assert_eq!(p.desc.resource_desc(), "new");

        let repo_type = ProjectUpdateCmd {
            repo_type: Some(RepoType::new("private").unwrap()),
            ..Default::default()
        };
        assert_eq!(repo_type.apply(&mut p), PropertyChange::Repo);
        assert!(p.repo_type.is_private());
    }

    #[test]
    fn test_tags_update_preserves_order() {
        let cmd = ResourceTagsUpdateCmd { to_add: tags(&["d", "b"]), to_remove: tags(&["a"]) };
        assert_eq!(cmd.to_new_tags(&tags(&["a", "b", "c"])), Some(tags(&["b", "c", "d"])));
    }

    #[test]
    fn test_tags_update_unchanged_is_none() {
        let cmd = ResourceTagsUpdateCmd { to_add: tags(&["b"]), to_remove: tags(&["z"]) };
        assert_eq!(cmd.to_new_tags(&tags(&["a", "b"])), None);
        assert_eq!(ResourceTagsUpdateCmd::default().to_new_tags(&[]), None);
    }

    #[test]
    fn test_list_cmd_ignores_empty_name() {
        let cmd = ResourceListCmd { name: Some(String::new()), repo_type: None };
        assert!(ResourceListOption::from(&cmd).name.is_none());
    }
}
