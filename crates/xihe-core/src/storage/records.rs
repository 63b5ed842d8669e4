//! Storage representations of the aggregates.
//!
//! Records hold only primitives. Converting a record back into its domain
//! type re-runs every value constructor, so corrupt rows surface as
//! `StorageError::InvalidData` instead of leaking illegal values.

use chrono::{DateTime, Utc};
use rusqlite::Row;
use xihe_domain::{
    Account, CoverId, ProjName, ProjType, Project, ProjectModifiableProperty, ProtocolName,
    RelatedResources, RepoType, ResourceDesc, TrainingPlatform,
};
use xihe_training::{JobDetail, TrainingDesc, TrainingName, TrainingSummary, UserTraining};

use crate::storage::error::{StorageError, StorageResult};

pub(crate) const PROJECT_COLUMNS: &str = "id, owner, name, description, proj_type, cover_id, repo_type, tags_json, protocol, training, repo_id, related_models_json, related_datasets_json, like_count, fork_count, version, created_at, updated_at";

pub(crate) const TRAINING_COLUMNS: &str = "id, owner, project_id, name, description, config_json, job_json, status, error, duration, aim_path, created_at";

pub(crate) fn to_sql_int(value: u64, column: &str) -> StorageResult<i64> {
    i64::try_from(value).map_err(|_| StorageError::InvalidData(format!("{column} out of range")))
}

pub(crate) fn from_sql_int(value: i64, column: &str) -> StorageResult<u64> {
    u64::try_from(value).map_err(|_| StorageError::InvalidData(format!("negative {column}")))
}

pub(crate) fn from_timestamp(secs: i64, column: &str) -> StorageResult<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| StorageError::InvalidData(format!("invalid {column}: {secs}")))
}

#[derive(Debug, Clone)]
pub(crate) struct ProjectRecord {
    pub id: String,
    pub owner: String,
    pub name: String,
    pub description: String,
    pub proj_type: String,
    pub cover_id: String,
    pub repo_type: String,
    pub tags_json: String,
    pub protocol: String,
    pub training: String,
    pub repo_id: String,
    pub related_models_json: String,
    pub related_datasets_json: String,
    pub like_count: i64,
    pub fork_count: i64,
    pub version: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl ProjectRecord {
    /// Reads a row selected with `PROJECT_COLUMNS`.
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            owner: row.get(1)?,
            name: row.get(2)?,
            description: row.get(3)?,
            proj_type: row.get(4)?,
            cover_id: row.get(5)?,
            repo_type: row.get(6)?,
            tags_json: row.get(7)?,
            protocol: row.get(8)?,
            training: row.get(9)?,
            repo_id: row.get(10)?,
            related_models_json: row.get(11)?,
            related_datasets_json: row.get(12)?,
            like_count: row.get(13)?,
            fork_count: row.get(14)?,
            version: row.get(15)?,
            created_at: row.get(16)?,
            updated_at: row.get(17)?,
        })
    }

    pub fn from_project(project: &Project) -> StorageResult<Self> {
        let property = &project.property;
        Ok(Self {
            id: project.id.clone(),
            owner: project.owner.to_string(),
            name: property.name.to_string(),
            description: property.desc.to_string(),
            proj_type: property.proj_type.to_string(),
            cover_id: property.cover_id.to_string(),
            repo_type: property.repo_type.to_string(),
            tags_json: serde_json::to_string(&property.tags)?,
            protocol: project.protocol.to_string(),
            training: project.training.to_string(),
            repo_id: project.repo_id.clone(),
            related_models_json: serde_json::to_string(&project.related_models)?,
            related_datasets_json: serde_json::to_string(&project.related_datasets)?,
            like_count: to_sql_int(project.like_count, "like_count")?,
            fork_count: to_sql_int(project.fork_count, "fork_count")?,
            version: to_sql_int(project.version, "version")?,
            created_at: project.created_at.timestamp(),
            updated_at: project.updated_at.timestamp(),
        })
    }

    pub fn into_project(self) -> StorageResult<Project> {
        let property = ProjectModifiableProperty {
            name: ProjName::new(self.name)?,
            desc: ResourceDesc::new(self.description)?,
            proj_type: ProjType::new(self.proj_type)?,
            cover_id: CoverId::new(self.cover_id)?,
            repo_type: RepoType::new(self.repo_type)?,
            tags: serde_json::from_str(&self.tags_json)?,
        };
        let related_models: RelatedResources = serde_json::from_str(&self.related_models_json)?;
        let related_datasets: RelatedResources =
            serde_json::from_str(&self.related_datasets_json)?;

        Ok(Project {
            id: self.id,
            owner: Account::new(self.owner)?,
            protocol: ProtocolName::new(self.protocol)?,
            training: TrainingPlatform::new(self.training)?,
            property,
            repo_id: self.repo_id,
            related_models,
            related_datasets,
            like_count: from_sql_int(self.like_count, "like_count")?,
            fork_count: from_sql_int(self.fork_count, "fork_count")?,
            version: from_sql_int(self.version, "version")?,
            created_at: from_timestamp(self.created_at, "created_at")?,
            updated_at: from_timestamp(self.updated_at, "updated_at")?,
        })
    }
}

#[derive(Debug, Clone)]
pub(crate) struct TrainingRecord {
    pub id: String,
    pub owner: String,
    pub project_id: String,
    pub name: String,
    pub description: Option<String>,
    pub config_json: String,
    pub job_json: String,
    pub status: String,
    pub error: String,
    pub duration: i64,
    pub aim_path: String,
    pub created_at: i64,
}

impl TrainingRecord {
    /// Reads a row selected with `TRAINING_COLUMNS`.
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            owner: row.get(1)?,
            project_id: row.get(2)?,
            name: row.get(3)?,
            description: row.get(4)?,
            config_json: row.get(5)?,
            job_json: row.get(6)?,
            status: row.get(7)?,
            error: row.get(8)?,
            duration: row.get(9)?,
            aim_path: row.get(10)?,
            created_at: row.get(11)?,
        })
    }

    pub fn from_training(training: &UserTraining) -> StorageResult<Self> {
        let detail = &training.job_detail;
        Ok(Self {
            id: training.id.clone(),
            owner: training.owner.to_string(),
            project_id: training.project_id.clone(),
            name: training.config.name.to_string(),
            description: training.config.desc.as_ref().map(ToString::to_string),
            config_json: serde_json::to_string(&training.config)?,
            job_json: serde_json::to_string(&training.job)?,
            status: detail.status.clone(),
            error: detail.error.clone(),
            duration: to_sql_int(detail.duration, "duration")?,
            aim_path: detail.aim_path.clone(),
            created_at: training.created_at.timestamp(),
        })
    }

    fn job_detail(&self) -> StorageResult<JobDetail> {
        Ok(JobDetail {
            status: self.status.clone(),
            error: self.error.clone(),
            duration: from_sql_int(self.duration, "duration")?,
            aim_path: self.aim_path.clone(),
        })
    }

    pub fn into_training(self) -> StorageResult<UserTraining> {
        let job_detail = self.job_detail()?;
        Ok(UserTraining {
            owner: Account::new(self.owner)?,
            config: serde_json::from_str(&self.config_json)?,
            job: serde_json::from_str(&self.job_json)?,
            created_at: from_timestamp(self.created_at, "created_at")?,
            id: self.id,
            project_id: self.project_id,
            job_detail,
        })
    }

    pub fn into_summary(self) -> StorageResult<TrainingSummary> {
        let job_detail = self.job_detail()?;
        Ok(TrainingSummary {
            name: TrainingName::new(self.name)?,
            desc: self.description.map(TrainingDesc::new).transpose()?,
            created_at: from_timestamp(self.created_at, "created_at")?,
            id: self.id,
            error: job_detail.error,
            status: job_detail.status,
            duration: job_detail.duration,
        })
    }
}
