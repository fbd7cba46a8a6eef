//! # Timed Stats - schema and store for timed word-game attempts
//!
//! Timed Stats provides:
//! - The `timed` table definition as a versioned migration
//! - A migration runner backed by a `schema_migrations` ledger
//! - A SQLite-backed store for inserting and aggregating attempts

pub mod attempt;
pub mod storage;
pub mod config;
pub mod ui;

// Re-exports for convenient access
pub use attempt::{NewTimedAttempt, TimedAttempt};
pub use storage::{Migrator, SqliteStore};

/// Result type alias for Timed Stats operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Timed Stats operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Migration {migration} failed: {source}")]
    Migration {
        migration: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Migration already applied: {0}")]
    AlreadyApplied(String),

    #[error("Migration not applied: {0}")]
    NotApplied(String),

    #[error("Unknown migration: {0}")]
    UnknownMigration(String),

    #[error("Migration {migration} depends on unapplied {dependency}")]
    MissingDependency { migration: String, dependency: String },

    #[error("Migration {0} is part of a dependency cycle")]
    DependencyCycle(String),

    #[error("Migration {migration} is required by applied {dependent}")]
    HasDependents { migration: String, dependent: String },

    #[error("Invalid migration key '{0}' (expected <app>.<name>)")]
    InvalidMigrationKey(String),

    #[error("Field '{field}' is {actual} characters long (max {max})")]
    FieldTooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },
}
