//! Storage Layer - SQLite-backed persistence
//!
//! System of record is SQLite with tables:
//! - timed(timed_id, word, word_length, attempts, win, difficulty)
//! - schema_migrations(app, name, applied_at)

pub mod schema;
pub mod migrate;
pub mod sqlite;

pub use migrate::{AppliedMigration, MigrationStatus, Migrator};
pub use schema::{Migration, MIGRATIONS};
pub use sqlite::{AttemptStats, DifficultyStats, SqliteStore};
