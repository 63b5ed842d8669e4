//! SQLite implementation of `ProjectRepository`.

use async_trait::async_trait;
use chrono::{SubsecRound, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, info};
use uuid::Uuid;
use xihe_domain::{
    Account, ProjName, Project, ProjectPropertyUpdateInfo, ProjectRepository, RelatedResourceInfo,
    RelatedResources, RepositoryError, RepositoryResult, ResourceListOption, ResourceToUpdate,
    UserResourceListOption,
};

use crate::storage::database::{SharedDatabase, lock};
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::records::{PROJECT_COLUMNS, ProjectRecord, from_sql_int, to_sql_int};

/// Which related-resource set a mutation targets.
#[derive(Debug, Clone, Copy)]
enum RelatedSet {
    Models,
    Datasets,
}

impl RelatedSet {
    fn column(self) -> &'static str {
        match self {
            Self::Models => "related_models_json",
            Self::Datasets => "related_datasets_json",
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Membership {
    Add,
    Remove,
}

fn not_found(owner: &Account, id: &str) -> StorageError {
    StorageError::NotFound(format!("project {owner}/{id}"))
}

/// Explains why a version-guarded write touched no row.
fn version_miss(conn: &Connection, target: &ResourceToUpdate) -> StorageError {
    let exists = conn
        .query_row(
            "SELECT 1 FROM projects WHERE owner = ?1 AND id = ?2",
            params![target.owner.account(), target.id],
            |_| Ok(()),
        )
        .optional();
    match exists {
        Ok(Some(())) => StorageError::Conflict,
        Ok(None) => not_found(&target.owner, &target.id),
        Err(e) => e.into(),
    }
}

pub struct SqliteProjectRepository {
    db: SharedDatabase,
}

impl SqliteProjectRepository {
    pub fn new(db: SharedDatabase) -> Self {
        Self { db }
    }

    fn insert(&self, project: &Project) -> StorageResult<Project> {
        let mut saved = project.clone();
        saved.id = Uuid::new_v4().to_string();
        saved.version = 0;
        // Stored timestamps have second precision.
        let now = Utc::now().trunc_subsecs(0);
        saved.created_at = now;
        saved.updated_at = now;

        let r = ProjectRecord::from_project(&saved)?;
        let db = lock(&self.db)?;
        db.conn().execute(
            &format!(
                "INSERT INTO projects ({PROJECT_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)"
            ),
            params![
                r.id,
                r.owner,
                r.name,
                r.description,
                r.proj_type,
                r.cover_id,
                r.repo_type,
                r.tags_json,
                r.protocol,
                r.training,
                r.repo_id,
                r.related_models_json,
                r.related_datasets_json,
                r.like_count,
                r.fork_count,
                r.version,
                r.created_at,
                r.updated_at
            ],
        )?;
        info!(project_id = %saved.id, owner = %saved.owner, "Created project");
        Ok(saved)
    }

    fn find_one(&self, owner: &Account, column: &str, key: &str) -> StorageResult<Option<Project>> {
        let db = lock(&self.db)?;
        let record = db
            .conn()
            .query_row(
                &format!(
                    "SELECT {PROJECT_COLUMNS} FROM projects WHERE owner = ?1 AND {column} = ?2"
                ),
                params![owner.account(), key],
                ProjectRecord::from_row,
            )
            .optional()?;
        record.map(ProjectRecord::into_project).transpose()
    }

    fn select_list(
        &self,
        owner: &Account,
        option: &ResourceListOption,
    ) -> StorageResult<Vec<Project>> {
        let db = lock(&self.db)?;
        let mut stmt = db.conn().prepare(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE owner = ?1 AND (?2 IS NULL OR instr(name, ?2) > 0) AND (?3 IS NULL OR repo_type = ?3) ORDER BY updated_at DESC, name"
        ))?;
        let records = stmt
            .query_map(
                params![
                    owner.account(),
                    option.name.as_deref(),
                    option.repo_type.as_ref().map(|t| t.repo_type())
                ],
                ProjectRecord::from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        records.into_iter().map(ProjectRecord::into_project).collect()
    }

    fn select_many(&self, options: &[UserResourceListOption]) -> StorageResult<Vec<Project>> {
        let db = lock(&self.db)?;
        let mut stmt = db.conn().prepare(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE owner = ?1 AND id = ?2"
        ))?;
        let mut projects = Vec::new();
        for option in options {
            for id in &option.ids {
                let record = stmt
                    .query_row(params![option.owner.account(), id], ProjectRecord::from_row)
                    .optional()?;
                if let Some(record) = record {
                    projects.push(record.into_project()?);
                }
            }
        }
        Ok(projects)
    }

    /// Runs a single-statement counter update on one project.
    fn bump_counter(&self, owner: &Account, id: &str, set: &str) -> StorageResult<()> {
        let db = lock(&self.db)?;
        let rows = db.conn().execute(
            &format!("UPDATE projects SET {set} WHERE owner = ?1 AND id = ?2"),
            params![owner.account(), id],
        )?;
        if rows == 0 {
            return Err(not_found(owner, id));
        }
        Ok(())
    }

    fn change_related(
        &self,
        info: &RelatedResourceInfo,
        set: RelatedSet,
        membership: Membership,
    ) -> StorageResult<()> {
        let target = &info.target;
        let column = set.column();
        let mut db = lock(&self.db)?;
        db.transaction(|tx| {
            let row: Option<(i64, String)> = tx
                .query_row(
                    &format!("SELECT version, {column} FROM projects WHERE owner = ?1 AND id = ?2"),
                    params![target.owner.account(), target.id],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;
            let Some((version, json)) = row else {
                return Err(not_found(&target.owner, &target.id));
            };
            if from_sql_int(version, "version")? != target.version {
                return Err(StorageError::Conflict);
            }

            let mut resources: RelatedResources = serde_json::from_str(&json)?;
            match membership {
                Membership::Add => resources.insert(info.resource.clone()),
                Membership::Remove => resources.remove(&info.resource),
            };
            tx.execute(
                &format!(
                    "UPDATE projects SET {column} = ?3, version = version + 1, updated_at = ?4 WHERE owner = ?1 AND id = ?2"
                ),
                params![
                    target.owner.account(),
                    target.id,
                    serde_json::to_string(&resources)?,
                    Utc::now().timestamp()
                ],
            )?;
            Ok(())
        })?;
        debug!(project_id = %target.id, column, ?membership, "Updated related resources");
        Ok(())
    }

    fn write_property(&self, info: &ProjectPropertyUpdateInfo) -> StorageResult<u64> {
        let target = &info.target;
        let p = &info.property;
        let db = lock(&self.db)?;
        let rows = db.conn().execute(
            "UPDATE projects SET name = ?4, description = ?5, proj_type = ?6, cover_id = ?7, repo_type = ?8, tags_json = ?9, version = version + 1, updated_at = ?10 WHERE owner = ?1 AND id = ?2 AND version = ?3",
            params![
                target.owner.account(),
                target.id,
                to_sql_int(target.version, "version")?,
                p.name.proj_name(),
                p.desc.resource_desc(),
                p.proj_type.proj_type(),
                p.cover_id.cover_id(),
                p.repo_type.repo_type(),
                serde_json::to_string(&p.tags)?,
                Utc::now().timestamp()
            ],
        )?;
        if rows == 0 {
            return Err(version_miss(db.conn(), target));
        }
        debug!(project_id = %target.id, version = target.version + 1, "Updated project property");
        Ok(target.version + 1)
    }
}

#[async_trait]
impl ProjectRepository for SqliteProjectRepository {
    async fn save(&self, project: &Project) -> RepositoryResult<Project> {
        if !project.is_new() {
            return Err(RepositoryError::NotNew("project"));
        }
        Ok(self.insert(project)?)
    }

    async fn get(&self, owner: &Account, id: &str) -> RepositoryResult<Project> {
        self.find_one(owner, "id", id)?.ok_or_else(|| not_found(owner, id).into())
    }

    async fn get_by_name(&self, owner: &Account, name: &ProjName) -> RepositoryResult<Project> {
        self.find_one(owner, "name", name.proj_name())?
            .ok_or_else(|| not_found(owner, name.proj_name()).into())
    }

    async fn list(
        &self,
        owner: &Account,
        option: &ResourceListOption,
    ) -> RepositoryResult<Vec<Project>> {
        Ok(self.select_list(owner, option)?)
    }

    async fn find_user_projects(
        &self,
        options: &[UserResourceListOption],
    ) -> RepositoryResult<Vec<Project>> {
        Ok(self.select_many(options)?)
    }

    async fn increase_fork(&self, owner: &Account, id: &str) -> RepositoryResult<()> {
        Ok(self.bump_counter(owner, id, "fork_count = fork_count + 1")?)
    }

    async fn add_like(&self, owner: &Account, id: &str) -> RepositoryResult<()> {
        Ok(self.bump_counter(owner, id, "like_count = like_count + 1")?)
    }

    async fn remove_like(&self, owner: &Account, id: &str) -> RepositoryResult<()> {
        Ok(self.bump_counter(owner, id, "like_count = MAX(like_count - 1, 0)")?)
    }

    async fn add_related_model(&self, info: &RelatedResourceInfo) -> RepositoryResult<()> {
        Ok(self.change_related(info, RelatedSet::Models, Membership::Add)?)
    }

    async fn remove_related_model(&self, info: &RelatedResourceInfo) -> RepositoryResult<()> {
        Ok(self.change_related(info, RelatedSet::Models, Membership::Remove)?)
    }

    async fn add_related_dataset(&self, info: &RelatedResourceInfo) -> RepositoryResult<()> {
        Ok(self.change_related(info, RelatedSet::Datasets, Membership::Add)?)
    }

    async fn remove_related_dataset(&self, info: &RelatedResourceInfo) -> RepositoryResult<()> {
        Ok(self.change_related(info, RelatedSet::Datasets, Membership::Remove)?)
    }

    async fn update_property(&self, info: &ProjectPropertyUpdateInfo) -> RepositoryResult<u64> {
        Ok(self.write_property(info)?)
    }
}
