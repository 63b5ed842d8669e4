//! Configuration for Xihe Core.
//!
//! Every section and field has a default, so an empty file (or no file at
//! all) yields a working configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use xihe_training::DEFAULT_DONE_STATUSES;

/// Environment variable naming the TOML config file.
pub const CONFIG_PATH_ENV: &str = "XIHE_CONFIG";

/// Environment variable overriding `database.path`.
pub const DATABASE_PATH_ENV: &str = "XIHE_DATABASE_PATH";

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("Config file not found: {0}")]
    NotFound(String),

    /// Failed to read config file.
    #[error("Failed to read config file: {0}")]
    ReadError(String),

    /// Failed to parse config file.
    #[error("Failed to parse config file: {0}")]
    ParseError(String),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Database configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite file path; `:memory:` selects an in-memory database.
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: "xihe.db".to_string() }
    }
}

impl DatabaseConfig {
    #[must_use]
    pub fn is_in_memory(&self) -> bool {
        self.path == ":memory:"
    }
}

/// Training service configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingServiceConfig {
    /// Maximum number of trainings one project may hold.
    pub max_training_records: usize,
    /// Platform statuses after which a job is finished.
    pub done_statuses: Vec<String>,
}

impl Default for TrainingServiceConfig {
    fn default() -> Self {
        Self {
            max_training_records: 5,
            done_statuses: DEFAULT_DONE_STATUSES.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub filter: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { filter: "xihe_core=info,info".to_string(), json: false }
    }
}

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub training: TrainingServiceConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, unreadable or malformed.
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))
    }

    /// Loads configuration from the process environment.
    ///
    /// Reads the file named by `XIHE_CONFIG` when set, then applies
    /// `XIHE_DATABASE_PATH`.
    ///
    /// # Errors
    ///
    /// Returns an error if the named config file cannot be loaded.
    pub fn load() -> ConfigResult<Self> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Like [`Config::load`], with variables resolved through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns an error if the named config file cannot be loaded.
    pub fn load_with<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup(CONFIG_PATH_ENV) {
            Some(path) => Self::load_from_file(Path::new(&path))?,
            None => Self::default(),
        };
        if let Some(path) = lookup(DATABASE_PATH_ENV) {
            config.database.path = path;
        }
        Ok(config)
    }
}
