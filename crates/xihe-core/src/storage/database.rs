//! Database connection and schema management.

use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;
use tracing::info;

use crate::storage::error::{StorageError, StorageResult};

/// Connection shared by every repository of one application context.
pub type SharedDatabase = Arc<Mutex<Database>>;

/// Database connection wrapper.
///
/// Manages the SQLite connection and schema initialization.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens a database at `path`, creating the schema if needed.
    ///
    /// # Errors
    /// * `StorageError::Connection` - If the database connection fails
    pub fn open(path: &str) -> StorageResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// # Errors
    /// * `StorageError::Connection` - If the database connection fails
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Wraps the database for sharing between repositories.
    #[must_use]
    pub fn into_shared(self) -> SharedDatabase {
        Arc::new(Mutex::new(self))
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    fn init_schema(&self) -> StorageResult<()> {
        info!("Initializing database schema");

        self.conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS projects (
                id TEXT PRIMARY KEY,
                owner TEXT NOT NULL,
                name TEXT NOT NULL,
                description TEXT NOT NULL,
                proj_type TEXT NOT NULL,
                cover_id TEXT NOT NULL,
                repo_type TEXT NOT NULL,
                tags_json TEXT NOT NULL,
                protocol TEXT NOT NULL,
                training TEXT NOT NULL,
                repo_id TEXT NOT NULL,
                related_models_json TEXT NOT NULL,
                related_datasets_json TEXT NOT NULL,
                like_count INTEGER NOT NULL DEFAULT 0,
                fork_count INTEGER NOT NULL DEFAULT 0,
                version INTEGER NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL,
                UNIQUE (owner, name)
            )
            "#,
            [],
        )?;

        self.conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS trainings (
                id TEXT PRIMARY KEY,
                owner TEXT NOT NULL,
                project_id TEXT NOT NULL,
                name TEXT NOT NULL,
                description TEXT,
                config_json TEXT NOT NULL,
                job_json TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT '',
                error TEXT NOT NULL DEFAULT '',
                duration INTEGER NOT NULL DEFAULT 0,
                aim_path TEXT NOT NULL DEFAULT '',
                created_at INTEGER NOT NULL
            )
            "#,
            [],
        )?;

        self.conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS activities (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                owner TEXT NOT NULL,
                activity_type TEXT NOT NULL,
                time INTEGER NOT NULL,
                resource_type TEXT NOT NULL,
                resource_owner TEXT NOT NULL,
                resource_id TEXT NOT NULL
            )
            "#,
            [],
        )?;

        self.conn
            .execute("CREATE INDEX IF NOT EXISTS idx_projects_owner ON projects(owner)", [])?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_trainings_owner_project ON trainings(owner, project_id)",
            [],
        )?;

        self.conn
            .execute("CREATE INDEX IF NOT EXISTS idx_activities_owner ON activities(owner)", [])?;

        info!("Database schema initialized successfully");
        Ok(())
    }

    /// Runs `f` inside a transaction, committing on success and rolling back on error.
    ///
    /// # Errors
    /// * `StorageError::Connection` - If the transaction fails
    pub fn transaction<F, R>(&mut self, f: F) -> StorageResult<R>
    where
        F: FnOnce(&rusqlite::Transaction) -> StorageResult<R>,
    {
        let tx = self.conn.transaction()?;
        match f(&tx) {
            Ok(result) => {
                tx.commit()?;
                Ok(result)
            }
            Err(e) => {
                tx.rollback()?;
                Err(e)
            }
        }
    }
}

/// Locks the shared connection.
pub(crate) fn lock(db: &SharedDatabase) -> StorageResult<MutexGuard<'_, Database>> {
    db.lock().map_err(|_| StorageError::Poisoned)
}
