use async_trait::async_trait;
use xihe_domain::{Account, ProviderError};

use crate::config::TrainingConfig;
use crate::job::JobInfo;

/// A validated training request handed to the compute platform.
#[derive(Debug, Clone)]
pub struct TrainingSubmission {
    pub owner: Account,
    pub project_id: String,
    pub config: TrainingConfig,
}

/// External compute platform that runs training jobs.
///
/// Status, error and duration come back later through the platform's own
/// callback path and are applied with `JobStatusRules::reconcile`.
#[async_trait]
pub trait Trainer: Send + Sync {
    fn id(&self) -> &'static str;

    async fn create_job(&self, submission: &TrainingSubmission) -> Result<JobInfo, ProviderError>;

    async fn terminate_job(&self, job: &JobInfo) -> Result<(), ProviderError>;

    async fn delete_job(&self, job: &JobInfo) -> Result<(), ProviderError>;

    async fn log_preview_url(&self, job: &JobInfo) -> Result<String, ProviderError>;
}
