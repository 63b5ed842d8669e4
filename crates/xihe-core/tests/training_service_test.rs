//! Integration tests for `TrainingService` over the SQLite repository.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use common::{FakeRepoProvider, FakeTrainer, account, shared_db, training_cmd, training_service};
use tokio::sync::Barrier;
use xihe_core::app::TrainingService;
use xihe_core::config::{Config, TrainingServiceConfig};
use xihe_core::storage::{SharedDatabase, SqliteTrainingRepository};
use xihe_core::{AppContext, ServiceError};
use xihe_domain::{Account, ProviderError, RepositoryResult};
use xihe_training::{
    InputCmd, JobDetail, JobInfo, KeyValueCmd, Trainer, TrainingIndex, TrainingRepository,
    TrainingSubmission, TrainingSummary, UserTraining,
};

/// Holds the first two reads at a barrier so two reports reconcile against
/// the same stored detail. Writes of `Running` yield first so that the
/// `Completed` write lands before them.
struct RacingTrainingRepository {
    inner: SqliteTrainingRepository,
    barrier: Barrier,
    reads: AtomicUsize,
}

impl RacingTrainingRepository {
    fn new(db: &SharedDatabase) -> Self {
        Self {
            inner: SqliteTrainingRepository::new(Arc::clone(db)),
            barrier: Barrier::new(2),
            reads: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl TrainingRepository for RacingTrainingRepository {
    async fn save(&self, training: &UserTraining, max: usize) -> RepositoryResult<String> {
        self.inner.save(training, max).await
    }

    async fn get(&self, index: &TrainingIndex) -> RepositoryResult<UserTraining> {
        let training = self.inner.get(index).await;
        if self.reads.fetch_add(1, Ordering::SeqCst) < 2 {
            self.barrier.wait().await;
        }
        training
    }

    async fn list(
        &self,
        owner: &Account,
        project_id: &str,
    ) -> RepositoryResult<Vec<TrainingSummary>> {
        self.inner.list(owner, project_id).await
    }

    async fn count(&self, owner: &Account, project_id: &str) -> RepositoryResult<usize> {
        self.inner.count(owner, project_id).await
    }

    async fn delete(&self, index: &TrainingIndex) -> RepositoryResult<()> {
        self.inner.delete(index).await
    }

    async fn update_job_detail(
        &self,
        index: &TrainingIndex,
        expected: &JobDetail,
        detail: &JobDetail,
    ) -> RepositoryResult<()> {
        if detail.status == "Running" {
            for _ in 0..5 {
                tokio::task::yield_now().await;
            }
        }
        self.inner.update_job_detail(index, expected, detail).await
    }

    async fn get_job(&self, index: &TrainingIndex) -> RepositoryResult<JobInfo> {
        self.inner.get_job(index).await
    }
}

/// Holds two submissions at a barrier so both creates pass the early
/// limit check before either training is saved.
struct RacingTrainer {
    inner: Arc<FakeTrainer>,
    barrier: Barrier,
}

#[async_trait]
impl Trainer for RacingTrainer {
    fn id(&self) -> &'static str {
        self.inner.id()
    }

    async fn create_job(&self, submission: &TrainingSubmission) -> Result<JobInfo, ProviderError> {
        let job = self.inner.create_job(submission).await;
        self.barrier.wait().await;
        job
    }

    async fn terminate_job(&self, job: &JobInfo) -> Result<(), ProviderError> {
        self.inner.terminate_job(job).await
    }

    async fn delete_job(&self, job: &JobInfo) -> Result<(), ProviderError> {
        self.inner.delete_job(job).await
    }

    async fn log_preview_url(&self, job: &JobInfo) -> Result<String, ProviderError> {
        self.inner.log_preview_url(job).await
    }
}

fn index(training_id: &str) -> TrainingIndex {
    TrainingIndex {
        owner: account("alice"),
        project_id: "p1".to_string(),
        training_id: training_id.to_string(),
    }
}

#[tokio::test]
async fn test_create_and_get_training() {
    let trainer = Arc::new(FakeTrainer::default());
    let service = training_service(&shared_db(), Arc::clone(&trainer));

    let id = service.create(training_cmd("alice", "p1", "train1")).await.unwrap();
    assert_eq!(trainer.submitted.lock().unwrap().len(), 1);

    let dto = service.get(&index(&id)).await.unwrap();
    assert_eq!(dto.id, id);
    assert_eq!(dto.project_id, "p1");
    assert_eq!(dto.name, "train1");
    assert_eq!(dto.status, "scheduling");
    assert!(!dto.is_done);
    assert_eq!(dto.compute.flavor, "f1");
    assert_eq!(dto.log_preview_url, "https://logs.example.com/job-1");
    assert_eq!(dto.created_at.len(), "YYYY-MM-DD".len());
}

#[tokio::test]
async fn test_invalid_cmd_is_never_submitted() {
    let trainer = Arc::new(FakeTrainer::default());
    let service = training_service(&shared_db(), Arc::clone(&trainer));

    let mut cmd = training_cmd("alice", "p1", "train1");
    cmd.boot_file = None;
    let err = service.create(cmd).await.unwrap_err();
    assert_eq!(err.to_string(), "invalid cmd of creating training");

    let mut cmd = training_cmd("alice", "p1", "train1");
    cmd.hyperparameters = vec![KeyValueCmd::default()];
    assert!(matches!(service.create(cmd).await, Err(ServiceError::Validation(_))));

    let mut cmd = training_cmd("alice", "p1", "train1");
    cmd.inputs = vec![InputCmd::default()];
    let err = service.create(cmd).await.unwrap_err();
    assert_eq!(err.to_string(), "invalid input");

    assert!(trainer.submitted.lock().unwrap().is_empty());
    assert!(service.list(&account("alice"), "p1").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_platform_failure_persists_nothing() {
    let trainer = Arc::new(FakeTrainer { fail_create: true, ..Default::default() });
    let service = training_service(&shared_db(), trainer);

    let err = service.create(training_cmd("alice", "p1", "train1")).await.unwrap_err();
    assert!(matches!(err, ServiceError::ExternalProvider(_)));
    assert!(service.list(&account("alice"), "p1").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_training_limit_per_project() {
    let db = shared_db();
    let trainer = Arc::new(FakeTrainer::default());
    let config = TrainingServiceConfig { max_training_records: 2, ..Default::default() };
    let service = TrainingService::new(
        Arc::new(SqliteTrainingRepository::new(Arc::clone(&db))),
        Arc::clone(&trainer) as Arc<dyn Trainer>,
        &config,
    );

    service.create(training_cmd("alice", "p1", "t1")).await.unwrap();
    service.create(training_cmd("alice", "p1", "t2")).await.unwrap();
    let err = service.create(training_cmd("alice", "p1", "t3")).await.unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));
    assert_eq!(trainer.submitted.lock().unwrap().len(), 2);

    service.create(training_cmd("alice", "p2", "t1")).await.unwrap();
}

#[tokio::test]
async fn test_log_preview_failure_leaves_url_empty() {
    let trainer = Arc::new(FakeTrainer { fail_log_preview: true, ..Default::default() });
    let service = training_service(&shared_db(), trainer);

    let id = service.create(training_cmd("alice", "p1", "train1")).await.unwrap();
    let dto = service.get(&index(&id)).await.unwrap();
    assert!(dto.log_preview_url.is_empty());
}

#[tokio::test]
async fn test_list_newest_first() {
    let service = training_service(&shared_db(), Arc::new(FakeTrainer::default()));
    let first = service.create(training_cmd("alice", "p1", "t1")).await.unwrap();
    let second = service.create(training_cmd("alice", "p1", "t2")).await.unwrap();

    let list = service.list(&account("alice"), "p1").await.unwrap();
    let ids: Vec<_> = list.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec![second.as_str(), first.as_str()]);
    assert!(list.iter().all(|s| s.status == "scheduling" && !s.is_done));
}

#[tokio::test]
async fn test_status_reconciliation_is_append_only() {
    let service = training_service(&shared_db(), Arc::new(FakeTrainer::default()));
    let id = service.create(training_cmd("alice", "p1", "train1")).await.unwrap();

    let running = JobDetail { status: "Running".to_string(), ..Default::default() };
    service.update_job_detail(&index(&id), &running).await.unwrap();
    assert_eq!(service.get(&index(&id)).await.unwrap().status, "Running");

    let done = JobDetail { status: "Completed".to_string(), duration: 300, ..Default::default() };
    service.update_job_detail(&index(&id), &done).await.unwrap();

    let err = service.update_job_detail(&index(&id), &running).await.unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));

    let dto = service.get(&index(&id)).await.unwrap();
    assert_eq!(dto.status, "Completed");
    assert!(dto.is_done);
    assert_eq!(dto.duration, 300);
}

#[tokio::test]
async fn test_simultaneous_reports_never_roll_back_terminal_status() {
    let db = shared_db();
    let id = training_service(&db, Arc::new(FakeTrainer::default()))
        .create(training_cmd("alice", "p1", "train1"))
        .await
        .unwrap();

    let service = TrainingService::new(
        Arc::new(RacingTrainingRepository::new(&db)),
        Arc::new(FakeTrainer::default()),
        &TrainingServiceConfig::default(),
    );
    let completed = JobDetail { status: "Completed".to_string(), ..Default::default() };
    let running = JobDetail { status: "Running".to_string(), ..Default::default() };

    let idx = index(&id);
    let (completed_result, running_result) = tokio::join!(
        service.update_job_detail(&idx, &completed),
        service.update_job_detail(&idx, &running),
    );
    completed_result.unwrap();
    assert!(matches!(running_result, Err(ServiceError::Conflict(_))));

    let dto = service.get(&index(&id)).await.unwrap();
    assert_eq!(dto.status, "Completed");
    assert!(dto.is_done);
}

#[tokio::test]
async fn test_concurrent_creates_respect_training_limit() {
    let db = shared_db();
    let trainer = Arc::new(FakeTrainer::default());
    let config = TrainingServiceConfig { max_training_records: 1, ..Default::default() };
    let racing = RacingTrainer { inner: Arc::clone(&trainer), barrier: Barrier::new(2) };
    let service = TrainingService::new(
        Arc::new(SqliteTrainingRepository::new(Arc::clone(&db))),
        Arc::new(racing),
        &config,
    );

    let (first, second) = tokio::join!(
        service.create(training_cmd("alice", "p1", "t1")),
        service.create(training_cmd("alice", "p1", "t2")),
    );
    let results = [first, second];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results.iter().any(|r| matches!(r, Err(ServiceError::Conflict(_)))));
    assert_eq!(service.list(&account("alice"), "p1").await.unwrap().len(), 1);
    assert_eq!(trainer.submitted.lock().unwrap().len(), 2);
    // The job submitted for the refused training is cleaned up.
    assert_eq!(trainer.deleted.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_terminate_and_delete() {
    let trainer = Arc::new(FakeTrainer::default());
    let service = training_service(&shared_db(), Arc::clone(&trainer));
    let id = service.create(training_cmd("alice", "p1", "train1")).await.unwrap();

    service.terminate(&index(&id)).await.unwrap();
    assert_eq!(trainer.terminated.lock().unwrap().clone(), vec!["job-1".to_string()]);

    service.delete(&index(&id)).await.unwrap();
    assert_eq!(trainer.deleted.lock().unwrap().clone(), vec!["job-1".to_string()]);
    assert!(matches!(service.get(&index(&id)).await, Err(ServiceError::NotFound(_))));
}

#[tokio::test]
async fn test_app_context_wires_services() {
    let mut config = Config::default();
    config.database.path = ":memory:".to_string();

    let ctx = AppContext::open(
        &config,
        Arc::new(FakeRepoProvider::default()),
        Arc::new(FakeTrainer::default()),
    )
    .unwrap();

    let project = ctx.projects.create(common::create_cmd("alice", "proj")).await.unwrap();
    let id = ctx.trainings.create(training_cmd("alice", &project.id, "train1")).await.unwrap();
    let list = ctx.trainings.list(&account("alice"), &project.id).await.unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].id, id);
}

#[tokio::test]
async fn test_app_context_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.database.path = dir.path().join("xihe.db").to_str().unwrap().to_string();

    let ctx = AppContext::open(
        &config,
        Arc::new(FakeRepoProvider::default()),
        Arc::new(FakeTrainer::default()),
    )
    .unwrap();
    ctx.projects.create(common::create_cmd("alice", "proj")).await.unwrap();
    assert!(dir.path().join("xihe.db").exists());
}
