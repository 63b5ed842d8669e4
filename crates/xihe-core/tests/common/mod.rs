//! Shared fakes for Xihe Core integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use xihe_core::app::{ProjectCreateCmd, ProjectService, TrainingService};
use xihe_core::config::TrainingServiceConfig;
use xihe_core::storage::{
    Database, SharedDatabase, SqliteActivityRepository, SqliteProjectRepository,
    SqliteTrainingRepository,
};
use xihe_domain::{
    Account, Activity, ActivityRepository, CoverId, ProjName, ProjType, ProtocolName,
    ProviderError, RepoOption, RepoProvider, RepoType, RepositoryError, RepositoryResult,
    ResourceDesc, TrainingPlatform,
};
use xihe_training::{
    ComputeCmd, ComputeFlavor, ComputeType, ComputeVersion, Directory, FilePath, JobInfo, Trainer,
    TrainingCreateCmd, TrainingName, TrainingSubmission,
};

/// Code-hosting fake that hands out sequential repo ids.
#[derive(Default)]
pub struct FakeRepoProvider {
    pub fail: bool,
    pub created: Mutex<Vec<RepoOption>>,
    pub updated: Mutex<Vec<(String, RepoOption)>>,
}

impl FakeRepoProvider {
    pub fn failing() -> Self {
        Self { fail: true, ..Default::default() }
    }
}

#[async_trait]
impl RepoProvider for FakeRepoProvider {
    async fn new_repo(&self, option: &RepoOption) -> Result<String, ProviderError> {
        if self.fail {
            return Err(ProviderError::new("gitlab unavailable"));
        }
        let mut created = self.created.lock().unwrap();
        created.push(option.clone());
        Ok(format!("repo-{}", created.len()))
    }

    async fn update_repo(&self, repo_id: &str, option: &RepoOption) -> Result<(), ProviderError> {
        if self.fail {
            return Err(ProviderError::new("gitlab unavailable"));
        }
        self.updated.lock().unwrap().push((repo_id.to_string(), option.clone()));
        Ok(())
    }
}

/// Compute-platform fake recording every call.
#[derive(Default)]
pub struct FakeTrainer {
    pub fail_create: bool,
    pub fail_log_preview: bool,
    pub submitted: Mutex<Vec<TrainingSubmission>>,
    pub terminated: Mutex<Vec<String>>,
    pub deleted: Mutex<Vec<String>>,
}

#[async_trait]
impl Trainer for FakeTrainer {
    fn id(&self) -> &'static str {
        "fake"
    }

    async fn create_job(&self, submission: &TrainingSubmission) -> Result<JobInfo, ProviderError> {
        if self.fail_create {
            return Err(ProviderError::new("no quota"));
        }
        let mut submitted = self.submitted.lock().unwrap();
        submitted.push(submission.clone());
        Ok(JobInfo {
            endpoint: "fake-endpoint".to_string(),
            job_id: format!("job-{}", submitted.len()),
            log_dir: "logs/".to_string(),
            output_dir: "output/".to_string(),
        })
    }

    async fn terminate_job(&self, job: &JobInfo) -> Result<(), ProviderError> {
        self.terminated.lock().unwrap().push(job.job_id.clone());
        Ok(())
    }

    async fn delete_job(&self, job: &JobInfo) -> Result<(), ProviderError> {
        self.deleted.lock().unwrap().push(job.job_id.clone());
        Ok(())
    }

    async fn log_preview_url(&self, job: &JobInfo) -> Result<String, ProviderError> {
        if self.fail_log_preview {
            return Err(ProviderError::new("log service down"));
        }
        Ok(format!("https://logs.example.com/{}", job.job_id))
    }
}

/// Activity sink that always fails.
pub struct FailingActivityRepository;

#[async_trait]
impl ActivityRepository for FailingActivityRepository {
    async fn save(&self, _activity: &Activity) -> RepositoryResult<()> {
        Err(RepositoryError::Backend("activity store offline".to_string()))
    }
}

pub fn shared_db() -> SharedDatabase {
    Database::open_in_memory().unwrap().into_shared()
}

pub fn project_service(db: &SharedDatabase, provider: Arc<FakeRepoProvider>) -> ProjectService {
    ProjectService::new(
        Arc::new(SqliteProjectRepository::new(Arc::clone(db))),
        Arc::new(SqliteActivityRepository::new(Arc::clone(db))),
        provider,
    )
}

pub fn training_service(db: &SharedDatabase, trainer: Arc<FakeTrainer>) -> TrainingService {
    TrainingService::new(
        Arc::new(SqliteTrainingRepository::new(Arc::clone(db))),
        trainer,
        &TrainingServiceConfig::default(),
    )
}

pub fn account(name: &str) -> Account {
    Account::new(name).unwrap()
}

pub fn create_cmd(owner: &str, name: &str) -> ProjectCreateCmd {
    ProjectCreateCmd {
        owner: Some(account(owner)),
        name: Some(ProjName::new(name).unwrap()),
        desc: Some(ResourceDesc::new("a demo project").unwrap()),
        proj_type: Some(ProjType::new("cv").unwrap()),
        cover_id: Some(CoverId::new("7").unwrap()),
        repo_type: Some(RepoType::new("public").unwrap()),
        protocol: Some(ProtocolName::new("MIT").unwrap()),
        training: Some(TrainingPlatform::new("ModelArts").unwrap()),
    }
}

/// A complete training command with no hyperparameters, env or inputs.
pub fn training_cmd(owner: &str, project_id: &str, name: &str) -> TrainingCreateCmd {
    TrainingCreateCmd {
        user: Some(account(owner)),
        project_id: project_id.to_string(),
        project_name: Some(ProjName::new("proj").unwrap()),
        project_repo_id: "r1".to_string(),
        name: Some(TrainingName::new(name).unwrap()),
        code_dir: Some(Directory::new("/code").unwrap()),
        boot_file: Some(FilePath::new("main.py").unwrap()),
        compute: ComputeCmd {
            compute_type: Some(ComputeType::new("npu").unwrap()),
            flavor: Some(ComputeFlavor::new("f1").unwrap()),
            version: Some(ComputeVersion::new("v1").unwrap()),
        },
        ..Default::default()
    }
}

pub fn activity_count(db: &SharedDatabase) -> i64 {
    db.lock()
        .unwrap()
        .conn()
        .query_row("SELECT COUNT(*) FROM activities", [], |row| row.get(0))
        .unwrap()
}
