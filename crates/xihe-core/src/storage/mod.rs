//! Storage layer for Xihe Core.
//!
//! SQLite-backed implementations of the repository ports. All repositories of
//! one application share a single connection.

// SQL strings don't need hash-less raw strings
#![allow(clippy::needless_raw_string_hashes)]

pub mod activity_repository;
pub mod database;
pub mod error;
pub mod project_repository;
mod records;
pub mod training_repository;

pub use activity_repository::SqliteActivityRepository;
pub use database::{Database, SharedDatabase};
pub use error::{StorageError, StorageResult};
pub use project_repository::SqliteProjectRepository;
pub use training_repository::SqliteTrainingRepository;
