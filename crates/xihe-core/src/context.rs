//! Composition root.

use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use xihe_domain::RepoProvider;
use xihe_training::Trainer;

use crate::app::{ProjectService, TrainingService};
use crate::config::Config;
use crate::storage::{
    Database, SharedDatabase, SqliteActivityRepository, SqliteProjectRepository,
    SqliteTrainingRepository,
};

/// Services wired to one database.
pub struct AppContext {
    pub db: SharedDatabase,
    pub projects: ProjectService,
    pub trainings: TrainingService,
}

impl AppContext {
    /// Opens the configured database and builds both services.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    pub fn open(
        config: &Config,
        provider: Arc<dyn RepoProvider>,
        trainer: Arc<dyn Trainer>,
    ) -> anyhow::Result<Self> {
        let database = if config.database.is_in_memory() {
            Database::open_in_memory()
        } else {
            Database::open(&config.database.path)
        }
        .with_context(|| format!("failed to open database at {}", config.database.path))?;
        info!(path = %config.database.path, "Database opened");

        let db = database.into_shared();
        let projects = ProjectService::new(
            Arc::new(SqliteProjectRepository::new(Arc::clone(&db))),
            Arc::new(SqliteActivityRepository::new(Arc::clone(&db))),
            provider,
        );
        let trainings = TrainingService::new(
            Arc::new(SqliteTrainingRepository::new(Arc::clone(&db))),
            trainer,
            &config.training,
        );

        Ok(Self { db, projects, trainings })
    }
}
