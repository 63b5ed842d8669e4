//! SQLite implementation of `TrainingRepository`.

use async_trait::async_trait;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, info};
use uuid::Uuid;
use xihe_domain::{Account, RepositoryError, RepositoryResult};
use xihe_training::{
    JobDetail, JobInfo, TrainingIndex, TrainingRepository, TrainingSummary, UserTraining,
};

use crate::storage::database::{SharedDatabase, lock};
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::records::{TRAINING_COLUMNS, TrainingRecord, to_sql_int};

fn not_found(index: &TrainingIndex) -> StorageError {
    StorageError::NotFound(format!(
        "training {}/{}/{}",
        index.owner, index.project_id, index.training_id
    ))
}

/// Explains why a guarded job detail write touched no row.
fn detail_miss(conn: &Connection, index: &TrainingIndex) -> StorageError {
    let exists = conn
        .query_row(
            "SELECT 1 FROM trainings WHERE owner = ?1 AND project_id = ?2 AND id = ?3",
            params![index.owner.account(), index.project_id, index.training_id],
            |_| Ok(()),
        )
        .optional();
    match exists {
        Ok(Some(())) => StorageError::Conflict,
        Ok(None) => not_found(index),
        Err(e) => e.into(),
    }
}

pub struct SqliteTrainingRepository {
    db: SharedDatabase,
}

impl SqliteTrainingRepository {
    pub fn new(db: SharedDatabase) -> Self {
        Self { db }
    }

    /// Inserts unless the project already holds `max` trainings.
    fn insert(&self, training: &UserTraining, max: usize) -> StorageResult<String> {
        let mut r = TrainingRecord::from_training(training)?;
        r.id = Uuid::new_v4().to_string();
        let limit = i64::try_from(max)
            .map_err(|_| StorageError::InvalidData(format!("training limit {max}")))?;

        let db = lock(&self.db)?;
        let rows = db.conn().execute(
            &format!(
                "INSERT INTO trainings ({TRAINING_COLUMNS}) \
                 SELECT ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12 \
                 WHERE (SELECT COUNT(*) FROM trainings WHERE owner = ?2 AND project_id = ?3) < ?13"
            ),
            params![
                r.id,
                r.owner,
                r.project_id,
                r.name,
                r.description,
                r.config_json,
                r.job_json,
                r.status,
                r.error,
                r.duration,
                r.aim_path,
                r.created_at,
                limit
            ],
        )?;
        if rows == 0 {
            return Err(StorageError::LimitReached(max));
        }
        info!(training_id = %r.id, project_id = %r.project_id, "Created training");
        Ok(r.id)
    }

    fn select_one(&self, index: &TrainingIndex) -> StorageResult<TrainingRecord> {
        let db = lock(&self.db)?;
        db.conn()
            .query_row(
                &format!(
                    "SELECT {TRAINING_COLUMNS} FROM trainings \
                     WHERE owner = ?1 AND project_id = ?2 AND id = ?3"
                ),
                params![index.owner.account(), index.project_id, index.training_id],
                TrainingRecord::from_row,
            )
            .optional()?
            .ok_or_else(|| not_found(index))
    }

    fn select_summaries(
        &self,
        owner: &Account,
        project_id: &str,
    ) -> StorageResult<Vec<TrainingSummary>> {
        let db = lock(&self.db)?;
        let mut stmt = db.conn().prepare(&format!(
            "SELECT {TRAINING_COLUMNS} FROM trainings WHERE owner = ?1 AND project_id = ?2 \
             ORDER BY created_at DESC, rowid DESC"
        ))?;
        let records = stmt
            .query_map(params![owner.account(), project_id], TrainingRecord::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        records.into_iter().map(TrainingRecord::into_summary).collect()
    }

    fn count_rows(&self, owner: &Account, project_id: &str) -> StorageResult<usize> {
        let db = lock(&self.db)?;
        let count: i64 = db.conn().query_row(
            "SELECT COUNT(*) FROM trainings WHERE owner = ?1 AND project_id = ?2",
            params![owner.account(), project_id],
            |row| row.get(0),
        )?;
        usize::try_from(count).map_err(|_| StorageError::InvalidData(format!("row count {count}")))
    }

    fn delete_row(&self, index: &TrainingIndex) -> StorageResult<()> {
        let db = lock(&self.db)?;
        let rows = db.conn().execute(
            "DELETE FROM trainings WHERE owner = ?1 AND project_id = ?2 AND id = ?3",
            params![index.owner.account(), index.project_id, index.training_id],
        )?;
        if rows == 0 {
            return Err(not_found(index));
        }
        info!(training_id = %index.training_id, "Deleted training");
        Ok(())
    }

    /// Compare-and-set on the four job detail columns.
    fn write_job_detail(
        &self,
        index: &TrainingIndex,
        expected: &JobDetail,
        detail: &JobDetail,
    ) -> StorageResult<()> {
        let db = lock(&self.db)?;
        let rows = db.conn().execute(
            "UPDATE trainings SET status = ?4, error = ?5, duration = ?6, aim_path = ?7 \
             WHERE owner = ?1 AND project_id = ?2 AND id = ?3 \
             AND status = ?8 AND error = ?9 AND duration = ?10 AND aim_path = ?11",
            params![
                index.owner.account(),
                index.project_id,
                index.training_id,
                detail.status,
                detail.error,
                to_sql_int(detail.duration, "duration")?,
                detail.aim_path,
                expected.status,
                expected.error,
                to_sql_int(expected.duration, "duration")?,
                expected.aim_path
            ],
        )?;
        if rows == 0 {
            return Err(detail_miss(db.conn(), index));
        }
        debug!(training_id = %index.training_id, status = %detail.status, "Updated job detail");
        Ok(())
    }
}

#[async_trait]
impl TrainingRepository for SqliteTrainingRepository {
    async fn save(
        &self,
        training: &UserTraining,
        max_per_project: usize,
    ) -> RepositoryResult<String> {
        if !training.is_new() {
            return Err(RepositoryError::NotNew("training"));
        }
        Ok(self.insert(training, max_per_project)?)
    }

    async fn get(&self, index: &TrainingIndex) -> RepositoryResult<UserTraining> {
        Ok(self.select_one(index)?.into_training()?)
    }

    async fn list(
        &self,
        owner: &Account,
        project_id: &str,
    ) -> RepositoryResult<Vec<TrainingSummary>> {
        Ok(self.select_summaries(owner, project_id)?)
    }

    async fn count(&self, owner: &Account, project_id: &str) -> RepositoryResult<usize> {
        Ok(self.count_rows(owner, project_id)?)
    }

    async fn delete(&self, index: &TrainingIndex) -> RepositoryResult<()> {
        Ok(self.delete_row(index)?)
    }

    async fn update_job_detail(
        &self,
        index: &TrainingIndex,
        expected: &JobDetail,
        detail: &JobDetail,
    ) -> RepositoryResult<()> {
        Ok(self.write_job_detail(index, expected, detail)?)
    }

    async fn get_job(&self, index: &TrainingIndex) -> RepositoryResult<JobInfo> {
        let record = self.select_one(index)?;
        Ok(serde_json::from_str(&record.job_json).map_err(StorageError::from)?)
    }
}
