//! Training application service.

use std::sync::Arc;

use tracing::{debug, info, warn};
use xihe_domain::{Account, RepositoryError};
use xihe_training::{
    JobDetail, JobStatusRules, Trainer, TrainingCreateCmd, TrainingError, TrainingIndex,
    TrainingRepository, TrainingSubmission, UserTraining,
};

use crate::app::dto::{TrainingDTO, TrainingSummaryDTO};
use crate::config::TrainingServiceConfig;
use crate::error::ServiceResult;

/// Reads before giving up on a status report that keeps losing races.
const RECONCILE_ATTEMPTS: usize = 3;

/// Orchestrates the training lifecycle over the repository port and the
/// compute platform.
pub struct TrainingService {
    repo: Arc<dyn TrainingRepository>,
    trainer: Arc<dyn Trainer>,
    rules: JobStatusRules,
    max_training_records: usize,
}

impl TrainingService {
    pub fn new(
        repo: Arc<dyn TrainingRepository>,
        trainer: Arc<dyn Trainer>,
        config: &TrainingServiceConfig,
    ) -> Self {
        Self {
            repo,
            trainer,
            rules: JobStatusRules::new(&config.done_statuses),
            max_training_records: config.max_training_records,
        }
    }

    /// Validates `cmd`, submits the job and persists the training.
    ///
    /// Returns the new training id. Nothing is persisted when validation or
    /// submission fails.
    ///
    /// # Errors
    ///
    /// `Validation` for a malformed command, `Conflict` when the project is
    /// full, `ExternalProvider` when the platform rejects the job.
    pub async fn create(&self, cmd: TrainingCreateCmd) -> ServiceResult<String> {
        let (owner, project_id, config) = cmd.into_parts()?;

        let count = self.repo.count(&owner, &project_id).await?;
        if count >= self.max_training_records {
            return Err(TrainingError::TooManyTrainings(self.max_training_records).into());
        }

        let submission = TrainingSubmission { owner, project_id, config };
        let job = self.trainer.create_job(&submission).await?;
        debug!(platform = self.trainer.id(), job_id = %job.job_id, "Job submitted");

        let TrainingSubmission { owner, project_id, config } = submission;
        let training = UserTraining::new(owner, project_id, config, job);
        match self.repo.save(&training, self.max_training_records).await {
            Ok(id) => {
                info!(training_id = %id, project_id = %training.project_id, "Training created");
                Ok(id)
            }
            Err(RepositoryError::LimitReached(max)) => {
                // Another create filled the project while this job was submitted.
                if let Err(e) = self.trainer.delete_job(&training.job).await {
                    warn!(
                        job_id = %training.job.job_id,
                        error = %e,
                        "Failed to delete orphaned job"
                    );
                }
                Err(TrainingError::TooManyTrainings(max).into())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn list(
        &self,
        owner: &Account,
        project_id: &str,
    ) -> ServiceResult<Vec<TrainingSummaryDTO>> {
        let summaries = self.repo.list(owner, project_id).await?;
        Ok(summaries.iter().map(|s| TrainingSummaryDTO::new(s, &self.rules)).collect())
    }

    /// Loads one training. The log preview link is looked up on the platform
    /// when the job was submitted; a failed lookup leaves it empty.
    pub async fn get(&self, index: &TrainingIndex) -> ServiceResult<TrainingDTO> {
        let training = self.repo.get(index).await?;

        let mut link = String::new();
        if training.job.is_submitted() {
            match self.trainer.log_preview_url(&training.job).await {
                Ok(url) => link = url,
                Err(e) => {
                    warn!(
                        training_id = %index.training_id,
                        error = %e,
                        "Failed to get log preview url"
                    );
                }
            }
        }

        Ok(TrainingDTO::new(&training, &self.rules, link))
    }

    pub async fn terminate(&self, index: &TrainingIndex) -> ServiceResult<()> {
        let job = self.repo.get_job(index).await?;
        self.trainer.terminate_job(&job).await?;
        info!(training_id = %index.training_id, "Training terminated");
        Ok(())
    }

    /// Deletes the platform job (when one was submitted), then the training.
    pub async fn delete(&self, index: &TrainingIndex) -> ServiceResult<()> {
        let job = self.repo.get_job(index).await?;
        if job.is_submitted() {
            self.trainer.delete_job(&job).await?;
        }
        self.repo.delete(index).await?;
        Ok(())
    }

    /// Applies a platform status report.
    ///
    /// The merge is written only over the detail it was computed from. When
    /// another report got there first, the stored detail is read again and
    /// the report is reconciled against it.
    ///
    /// # Errors
    ///
    /// `Conflict` when the report would change the status of a finished job,
    /// `ConcurrencyConflict` when every attempt lost a race.
    pub async fn update_job_detail(
        &self,
        index: &TrainingIndex,
        detail: &JobDetail,
    ) -> ServiceResult<()> {
        for attempt in 1..=RECONCILE_ATTEMPTS {
            let current = self.repo.get(index).await?.job_detail;
            let merged = self.rules.reconcile(&current, detail)?;
            if merged == current {
                return Ok(());
            }
            match self.repo.update_job_detail(index, &current, &merged).await {
                Ok(()) => {
                    debug!(
                        training_id = %index.training_id,
                        status = %merged.status,
                        "Job detail reconciled"
                    );
                    return Ok(());
                }
                Err(RepositoryError::ConcurrentModification) => {
                    debug!(
                        training_id = %index.training_id,
                        attempt,
                        "Job detail changed, retrying"
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(RepositoryError::ConcurrentModification.into())
    }
}
