//! SQLite implementation of `ActivityRepository`.

use async_trait::async_trait;
use rusqlite::params;
use tracing::debug;
use xihe_domain::{Activity, ActivityRepository, RepositoryResult};

use crate::storage::database::{SharedDatabase, lock};
use crate::storage::error::StorageResult;

pub struct SqliteActivityRepository {
    db: SharedDatabase,
}

impl SqliteActivityRepository {
    pub fn new(db: SharedDatabase) -> Self {
        Self { db }
    }

    fn append(&self, activity: &Activity) -> StorageResult<()> {
        let db = lock(&self.db)?;
        db.conn().execute(
            "INSERT INTO activities (owner, activity_type, time, resource_type, resource_owner, resource_id) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                activity.owner.account(),
                activity.activity_type.as_str(),
                activity.time.timestamp(),
                activity.resource.resource_type.resource_type(),
                activity.resource.owner.account(),
                activity.resource.id
            ],
        )?;
        debug!(
            owner = %activity.owner,
            activity_type = activity.activity_type.as_str(),
            resource_id = %activity.resource.id,
            "Recorded activity"
        );
        Ok(())
    }
}

#[async_trait]
impl ActivityRepository for SqliteActivityRepository {
    async fn save(&self, activity: &Activity) -> RepositoryResult<()> {
        Ok(self.append(activity)?)
    }
}
