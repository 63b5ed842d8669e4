//! Persistence port for trainings.

use async_trait::async_trait;
use xihe_domain::{Account, RepositoryResult};

use crate::job::{JobDetail, JobInfo, TrainingIndex, TrainingSummary, UserTraining};

#[async_trait]
pub trait TrainingRepository: Send + Sync {
    /// Persists a new training and returns its assigned id.
    ///
    /// Fails with `NotNew` when the training already has an id, and with
    /// `LimitReached` when its project already holds `max_per_project`
    /// trainings. The limit is checked by the same write that inserts.
    async fn save(&self, training: &UserTraining, max_per_project: usize)
    -> RepositoryResult<String>;

    async fn get(&self, index: &TrainingIndex) -> RepositoryResult<UserTraining>;

    /// Summaries of a project's trainings, newest first.
    async fn list(&self, owner: &Account, project_id: &str)
    -> RepositoryResult<Vec<TrainingSummary>>;

    async fn count(&self, owner: &Account, project_id: &str) -> RepositoryResult<usize>;

    async fn delete(&self, index: &TrainingIndex) -> RepositoryResult<()>;

    /// Replaces the job detail, provided the stored one still equals
    /// `expected`. Fails with `ConcurrentModification` otherwise.
    async fn update_job_detail(
        &self,
        index: &TrainingIndex,
        expected: &JobDetail,
        detail: &JobDetail,
    ) -> RepositoryResult<()>;

    async fn get_job(&self, index: &TrainingIndex) -> RepositoryResult<JobInfo>;
}
