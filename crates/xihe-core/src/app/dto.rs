//! Transport DTOs: the JSON shapes returned to callers.

use chrono::{DateTime, Utc};
use serde::Serialize;
use xihe_domain::Project;
use xihe_training::{JobStatusRules, TrainingSummary, UserTraining};

/// Renders a timestamp as `YYYY-MM-DD` (UTC).
#[must_use]
pub fn to_date(time: &DateTime<Utc>) -> String {
    time.format("%Y-%m-%d").to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectDTO {
    pub id: String,
    pub owner: String,
    pub name: String,
    pub desc: String,
    #[serde(rename = "type")]
    pub proj_type: String,
    pub cover_id: String,
    pub protocol: String,
    pub training: String,
    pub repo_type: String,
    pub repo_id: String,
    pub tags: Vec<String>,
}

impl From<&Project> for ProjectDTO {
    fn from(p: &Project) -> Self {
        let property = &p.property;
        Self {
            id: p.id.clone(),
            owner: p.owner.to_string(),
            name: property.name.to_string(),
            desc: property.desc.to_string(),
            proj_type: property.proj_type.to_string(),
            cover_id: property.cover_id.to_string(),
            protocol: p.protocol.to_string(),
            training: p.training.to_string(),
            repo_type: property.repo_type.to_string(),
            repo_id: p.repo_id.clone(),
            tags: property.tags.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComputeDTO {
    #[serde(rename = "type")]
    pub compute_type: String,
    pub version: String,
    pub flavor: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrainingSummaryDTO {
    pub id: String,
    pub name: String,
    pub desc: String,
    pub error: String,
    pub status: String,
    pub created_at: String,
    pub is_done: bool,
    pub duration: u64,
}

impl TrainingSummaryDTO {
    #[must_use]
    pub fn new(summary: &TrainingSummary, rules: &JobStatusRules) -> Self {
        Self {
            id: summary.id.clone(),
            name: summary.name.to_string(),
            desc: summary.desc.as_ref().map(ToString::to_string).unwrap_or_default(),
            error: summary.error.clone(),
            status: JobStatusRules::display_status(&summary.status).to_string(),
            created_at: to_date(&summary.created_at),
            is_done: rules.is_job_done(&summary.status),
            duration: summary.duration,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrainingDTO {
    pub id: String,
    pub project_id: String,
    pub name: String,
    pub desc: String,
    pub is_done: bool,
    pub error: String,
    pub status: String,
    pub duration: u64,
    pub created_at: String,
    pub compute: ComputeDTO,
    pub aim_path: String,
    pub enable_aim: bool,
    /// Link to the job's live log; handed out separately, never serialized.
    #[serde(skip)]
    pub log_preview_url: String,
}

impl TrainingDTO {
    #[must_use]
    pub fn new(training: &UserTraining, rules: &JobStatusRules, log_preview_url: String) -> Self {
        let config = &training.config;
        let detail = &training.job_detail;
        let compute = &config.compute;
        Self {
            id: training.id.clone(),
            project_id: training.project_id.clone(),
            name: config.name.to_string(),
            desc: config.desc.as_ref().map(ToString::to_string).unwrap_or_default(),
            is_done: rules.is_job_done(&detail.status),
            error: detail.error.clone(),
            status: JobStatusRules::display_status(&detail.status).to_string(),
            duration: detail.duration,
            created_at: to_date(&training.created_at),
            compute: ComputeDTO {
                compute_type: compute.compute_type.to_string(),
                version: compute.version.to_string(),
                flavor: compute.flavor.to_string(),
            },
            aim_path: detail.aim_path.clone(),
            enable_aim: config.enable_aim,
            log_preview_url,
        }
    }
}
