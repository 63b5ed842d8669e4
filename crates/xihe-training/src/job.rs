use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use xihe_domain::Account;

use crate::config::{TrainingConfig, TrainingDesc, TrainingName};

/// Locates one training of one project of one user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrainingIndex {
    pub owner: Account,
    pub project_id: String,
    pub training_id: String,
}

/// Handle of the job on the compute platform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobInfo {
    pub endpoint: String,
    pub job_id: String,
    pub log_dir: String,
    pub output_dir: String,
}

impl JobInfo {
    #[must_use]
    pub fn is_submitted(&self) -> bool {
        !self.job_id.is_empty()
    }
}

/// Execution state reported asynchronously by the compute platform.
///
/// An empty `status` means the platform has not reported yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDetail {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub error: String,
    /// Seconds, as reported by the platform.
    #[serde(default)]
    pub duration: u64,
    #[serde(default)]
    pub aim_path: String,
}

/// A training job. The config is immutable after creation; only `job_detail`
/// changes, and only through platform status updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserTraining {
    pub id: String,
    pub owner: Account,
    pub project_id: String,
    pub config: TrainingConfig,
    pub job: JobInfo,
    pub job_detail: JobDetail,
    pub created_at: DateTime<Utc>,
}

impl UserTraining {
    /// Creates an unpersisted training for a job already accepted by the platform.
    #[must_use]
    pub fn new(owner: Account, project_id: String, config: TrainingConfig, job: JobInfo) -> Self {
        Self {
            id: String::new(),
            owner,
            project_id,
            config,
            job,
            job_detail: JobDetail::default(),
            created_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn is_new(&self) -> bool {
        self.id.is_empty()
    }

    #[must_use]
    pub fn index(&self) -> TrainingIndex {
        TrainingIndex {
            owner: self.owner.clone(),
            project_id: self.project_id.clone(),
            training_id: self.id.clone(),
        }
    }

    #[must_use]
    pub fn summary(&self) -> TrainingSummary {
        TrainingSummary {
            id: self.id.clone(),
            name: self.config.name.clone(),
            desc: self.config.desc.clone(),
            error: self.job_detail.error.clone(),
            status: self.job_detail.status.clone(),
            duration: self.job_detail.duration,
            created_at: self.created_at,
        }
    }
}

/// Listing projection of a `UserTraining`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingSummary {
    pub id: String,
    pub name: TrainingName,
    pub desc: Option<TrainingDesc>,
    pub error: String,
    pub status: String,
    pub duration: u64,
    pub created_at: DateTime<Utc>,
}
