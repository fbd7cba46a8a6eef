//! Migration runner
//!
//! Applied migrations are recorded in `schema_migrations`. Each migration is
//! checked and applied inside one immediate transaction, so two runners on the
//! same file cannot both apply it and a failed migration leaves no ledger row.

use std::collections::HashSet;
use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};
use serde::Serialize;
use crate::{Error, Result};
use super::schema::{self, Migration};

/// A row of the migration ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedMigration {
    pub app: String,
    pub name: String,
    pub applied_at: String,
}

impl AppliedMigration {
    pub fn key(&self) -> String {
        format!("{}.{}", self.app, self.name)
    }
}

/// A known migration and whether the store has it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationStatus {
    pub key: String,
    pub applied: bool,
    pub applied_at: Option<String>,
}

/// Applies and reverts a set of migrations against a connection
#[derive(Debug, Clone)]
pub struct Migrator {
    migrations: Vec<Migration>,
}

impl Default for Migrator {
    fn default() -> Self {
        Self::new(schema::MIGRATIONS)
    }
}

impl Migrator {
    pub fn new(migrations: &[Migration]) -> Self {
        Self {
            migrations: migrations.to_vec(),
        }
    }

    /// Look up a migration by its `app.name` key
    pub fn find(&self, key: &str) -> Result<&Migration> {
        let Some((app, name)) = key.split_once('.') else {
            return Err(Error::InvalidMigrationKey(key.to_string()));
        };
        if app.is_empty() || name.is_empty() {
            return Err(Error::InvalidMigrationKey(key.to_string()));
        }

        self.migrations
            .iter()
            .find(|m| m.app == app && m.name == name)
            .ok_or_else(|| Error::UnknownMigration(key.to_string()))
    }

    /// Forward SQL for one migration
    pub fn sql_for(&self, key: &str) -> Result<String> {
        Ok(self.find(key)?.up_sql())
    }

    /// SQL `revert` would run for one migration
    pub fn reverse_sql_for(&self, key: &str) -> Result<String> {
        Ok(self.find(key)?.down_sql())
    }

    /// Create the ledger table if it is missing
    pub fn ensure_ledger(&self, conn: &Connection) -> Result<()> {
        conn.execute(schema::CREATE_MIGRATIONS_TABLE, [])?;
        Ok(())
    }

    /// All ledger rows in the order they were applied.
    ///
    /// Read-only: a store without a ledger has nothing applied.
    pub fn applied(&self, conn: &Connection) -> Result<Vec<AppliedMigration>> {
        if !ledger_exists(conn)? {
            return Ok(Vec::new());
        }

        let mut stmt = conn.prepare(
            "SELECT app, name, applied_at FROM schema_migrations ORDER BY id"
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok(AppliedMigration {
                    app: row.get(0)?,
                    name: row.get(1)?,
                    applied_at: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
    }

    /// Every known migration with its applied state
    pub fn status(&self, conn: &Connection) -> Result<Vec<MigrationStatus>> {
        let applied = self.applied(conn)?;

        Ok(self
            .migrations
            .iter()
            .map(|m| {
                let row = applied.iter().find(|a| a.app == m.app && a.name == m.name);
                MigrationStatus {
                    key: m.key(),
                    applied: row.is_some(),
                    applied_at: row.map(|a| a.applied_at.clone()),
                }
            })
            .collect())
    }

    /// Unapplied migrations in the order `migrate` would run them.
    ///
    /// Every migration comes after its dependencies; otherwise the declared
    /// order is kept.
    pub fn plan(&self, conn: &Connection) -> Result<Vec<Migration>> {
        self.check_dependencies_known()?;

        let mut done: HashSet<String> = self
            .applied(conn)?
            .iter()
            .map(AppliedMigration::key)
            .collect();
        let mut remaining: Vec<Migration> = self
            .migrations
            .iter()
            .filter(|m| !done.contains(&m.key()))
            .copied()
            .collect();

        let mut ordered = Vec::with_capacity(remaining.len());
        while !remaining.is_empty() {
            let ready = remaining
                .iter()
                .position(|m| m.dependencies.iter().all(|d| done.contains(*d)));
            let Some(pos) = ready else {
                return Err(Error::DependencyCycle(remaining[0].key()));
            };

            let m = remaining.remove(pos);
            done.insert(m.key());
            ordered.push(m);
        }
        Ok(ordered)
    }

    /// Apply every pending migration. Returns the keys applied by this call;
    /// an already migrated store yields an empty list.
    pub fn migrate(&self, conn: &mut Connection) -> Result<Vec<String>> {
        self.ensure_ledger(conn)?;
        let pending = self.plan(conn)?;
        if pending.is_empty() {
            tracing::debug!("No migrations to apply");
            return Ok(Vec::new());
        }

        let mut applied = Vec::with_capacity(pending.len());
        for m in &pending {
            if self.apply_migration(conn, m)? {
                applied.push(m.key());
            }
        }
        Ok(applied)
    }

    /// Apply one migration by key. Unlike `migrate`, re-applying is an error.
    pub fn apply(&self, conn: &mut Connection, key: &str) -> Result<()> {
        self.ensure_ledger(conn)?;
        self.check_dependencies_known()?;
        let m = *self.find(key)?;

        if !self.apply_migration(conn, &m)? {
            return Err(Error::AlreadyApplied(key.to_string()));
        }
        Ok(())
    }

    /// Run a migration's reverse statements and drop its ledger row
    pub fn revert(&self, conn: &mut Connection, key: &str) -> Result<()> {
        self.ensure_ledger(conn)?;
        let m = *self.find(key)?;
        let key = m.key();

        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        if !ledger_contains(&tx, &m)? {
            return Err(Error::NotApplied(key));
        }

        for other in &self.migrations {
            if other.dependencies.contains(&key.as_str()) && ledger_contains(&tx, other)? {
                return Err(Error::HasDependents {
                    migration: key,
                    dependent: other.key(),
                });
            }
        }

        tracing::info!("Reverting {}", key);
        for stmt in m.down {
            tracing::debug!("{}", stmt.trim());
            tx.execute_batch(stmt).map_err(|source| Error::Migration {
                migration: key.clone(),
                source,
            })?;
        }
        tx.execute(
            "DELETE FROM schema_migrations WHERE app = ?1 AND name = ?2",
            params![m.app, m.name],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Check-then-apply under one transaction. Returns false when the ledger
    /// already had the migration.
    fn apply_migration(&self, conn: &mut Connection, m: &Migration) -> Result<bool> {
        let key = m.key();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if ledger_contains(&tx, m)? {
            return Ok(false);
        }

        for dep in m.dependencies {
            let dep_migration = self.find(dep)?;
            if !ledger_contains(&tx, dep_migration)? {
                return Err(Error::MissingDependency {
                    migration: key,
                    dependency: dep.to_string(),
                });
            }
        }

        tracing::info!("Applying {}", key);
        for stmt in m.up {
            tracing::debug!("{}", stmt.trim());
            tx.execute_batch(stmt).map_err(|source| Error::Migration {
                migration: key.clone(),
                source,
            })?;
        }

        tx.execute(
            "INSERT INTO schema_migrations (app, name) VALUES (?1, ?2)",
            params![m.app, m.name],
        )
        .map_err(|source| Error::Migration {
            migration: key.clone(),
            source,
        })?;

        tx.commit()?;
        Ok(true)
    }

    fn check_dependencies_known(&self) -> Result<()> {
        for m in &self.migrations {
            for dep in m.dependencies {
                self.find(dep)?;
            }
        }
        Ok(())
    }
}

fn ledger_exists(conn: &Connection) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'schema_migrations'",
        [],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

fn ledger_contains(conn: &Connection, m: &Migration) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT id FROM schema_migrations WHERE app = ?1 AND name = ?2",
            params![m.app, m.name],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

#[cfg(test)]
mod tests {
    use super::*;

    const INITIAL: &str = "timed_stats.0001_initial";

    const ADD_INDEX: Migration = Migration {
        app: "timed_stats",
        name: "0002_difficulty_index",
        dependencies: &[INITIAL],
        up: &["CREATE INDEX idx_timed_difficulty ON timed(difficulty)"],
        down: &["DROP INDEX idx_timed_difficulty"],
    };

    fn table_exists(conn: &Connection, name: &str) -> bool {
        conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [name],
            |row| row.get::<_, i64>(0),
        )
        .unwrap()
            == 1
    }

    #[test]
    fn test_migrate_creates_timed_table() {
        let mut conn = Connection::open_in_memory().unwrap();
        let migrator = Migrator::default();

        let applied = migrator.migrate(&mut conn).unwrap();
        assert_eq!(applied, vec![INITIAL.to_string()]);
        assert!(table_exists(&conn, "timed"));

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM timed", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_timed_columns_match_definition() {
        let mut conn = Connection::open_in_memory().unwrap();
        Migrator::default().migrate(&mut conn).unwrap();

        let mut stmt = conn.prepare("PRAGMA table_info(timed)").unwrap();
        let columns: Vec<(String, String)> = stmt
            .query_map([], |row| Ok((row.get(1)?, row.get(2)?)))
            .unwrap()
            .collect::<rusqlite::Result<_>>()
            .unwrap();

        let expected: Vec<(String, String)> = schema::TIMED_COLUMNS
            .iter()
            .map(|(n, t)| (n.to_string(), t.to_string()))
            .collect();
        assert_eq!(columns, expected);
    }

    #[test]
    fn test_migrate_twice_is_noop() {
        let mut conn = Connection::open_in_memory().unwrap();
        let migrator = Migrator::default();

        migrator.migrate(&mut conn).unwrap();
        let second = migrator.migrate(&mut conn).unwrap();
        assert!(second.is_empty());
        assert_eq!(migrator.applied(&conn).unwrap().len(), 1);
    }

    #[test]
    fn test_apply_twice_is_rejected() {
        let mut conn = Connection::open_in_memory().unwrap();
        let migrator = Migrator::default();

        migrator.apply(&mut conn, INITIAL).unwrap();
        let err = migrator.apply(&mut conn, INITIAL).unwrap_err();
        assert!(matches!(err, Error::AlreadyApplied(k) if k == INITIAL));
    }

    #[test]
    fn test_unrecorded_table_is_a_collision() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.execute("CREATE TABLE timed (id INTEGER)", []).unwrap();
        let migrator = Migrator::default();

        let err = migrator.migrate(&mut conn).unwrap_err();
        assert!(matches!(err, Error::Migration { ref migration, .. } if migration == INITIAL));
        assert!(migrator.applied(&conn).unwrap().is_empty());
    }

    #[test]
    fn test_status_and_plan() {
        let mut conn = Connection::open_in_memory().unwrap();
        let migrator = Migrator::new(&[schema::MIGRATIONS[0], ADD_INDEX]);

        let plan = migrator.plan(&conn).unwrap();
        assert_eq!(plan.len(), 2);

        migrator.apply(&mut conn, INITIAL).unwrap();
        let status = migrator.status(&conn).unwrap();
        assert!(status[0].applied);
        assert!(status[0].applied_at.is_some());
        assert!(!status[1].applied);

        let plan = migrator.plan(&conn).unwrap();
        assert_eq!(plan, vec![ADD_INDEX]);
    }

    #[test]
    fn test_missing_dependency() {
        let mut conn = Connection::open_in_memory().unwrap();
        let migrator = Migrator::new(&[schema::MIGRATIONS[0], ADD_INDEX]);

        let err = migrator.apply(&mut conn, "timed_stats.0002_difficulty_index").unwrap_err();
        assert!(matches!(err, Error::MissingDependency { ref dependency, .. } if dependency == INITIAL));
    }

    #[test]
    fn test_unknown_dependency() {
        let conn = Connection::open_in_memory().unwrap();
        let migrator = Migrator::new(&[ADD_INDEX]);

        let err = migrator.plan(&conn).unwrap_err();
        assert!(matches!(err, Error::UnknownMigration(k) if k == INITIAL));
    }

    #[test]
    fn test_revert_then_migrate_again() {
        let mut conn = Connection::open_in_memory().unwrap();
        let migrator = Migrator::default();

        migrator.migrate(&mut conn).unwrap();
        migrator.revert(&mut conn, INITIAL).unwrap();
        assert!(!table_exists(&conn, "timed"));
        assert!(migrator.applied(&conn).unwrap().is_empty());

        let err = migrator.revert(&mut conn, INITIAL).unwrap_err();
        assert!(matches!(err, Error::NotApplied(_)));

        assert_eq!(migrator.migrate(&mut conn).unwrap().len(), 1);
        assert!(table_exists(&conn, "timed"));
    }

    #[test]
    fn test_revert_blocked_by_dependent() {
        let mut conn = Connection::open_in_memory().unwrap();
        let migrator = Migrator::new(&[schema::MIGRATIONS[0], ADD_INDEX]);

        migrator.migrate(&mut conn).unwrap();
        let err = migrator.revert(&mut conn, INITIAL).unwrap_err();
        assert!(matches!(err, Error::HasDependents { .. }));
    }

    #[test]
    fn test_find_rejects_bad_keys() {
        let migrator = Migrator::default();
        assert!(matches!(migrator.find("initial"), Err(Error::InvalidMigrationKey(_))));
        assert!(matches!(migrator.find("timed_stats.9999_nope"), Err(Error::UnknownMigration(_))));
        assert!(migrator.sql_for(INITIAL).unwrap().contains("CREATE TABLE timed"));
        assert_eq!(migrator.reverse_sql_for(INITIAL).unwrap(), "DROP TABLE timed;");
    }

    #[test]
    fn test_plan_puts_dependencies_first() {
        let mut conn = Connection::open_in_memory().unwrap();
        let migrator = Migrator::new(&[ADD_INDEX, schema::MIGRATIONS[0]]);

        let plan: Vec<String> = migrator.plan(&conn).unwrap().iter().map(Migration::key).collect();
        assert_eq!(plan, vec![INITIAL.to_string(), ADD_INDEX.key()]);

        let applied = migrator.migrate(&mut conn).unwrap();
        assert_eq!(applied, vec![INITIAL.to_string(), ADD_INDEX.key()]);
        assert!(migrator.plan(&conn).unwrap().is_empty());
    }

    #[test]
    fn test_dependency_cycle_is_rejected() {
        const FIRST: Migration = Migration {
            app: "cycle",
            name: "0001_first",
            dependencies: &["cycle.0002_second"],
            up: &["CREATE TABLE first (id INTEGER)"],
            down: &["DROP TABLE first"],
        };
        const SECOND: Migration = Migration {
            app: "cycle",
            name: "0002_second",
            dependencies: &["cycle.0001_first"],
            up: &["CREATE TABLE second (id INTEGER)"],
            down: &["DROP TABLE second"],
        };

        let mut conn = Connection::open_in_memory().unwrap();
        let err = Migrator::new(&[FIRST, SECOND]).migrate(&mut conn).unwrap_err();
        assert!(matches!(err, Error::DependencyCycle(_)));
        assert!(!table_exists(&conn, "first"));
    }

    #[test]
    fn test_status_does_not_create_ledger() {
        let conn = Connection::open_in_memory().unwrap();
        let migrator = Migrator::default();

        let status = migrator.status(&conn).unwrap();
        assert_eq!(status.len(), 1);
        assert!(!status[0].applied);
        assert!(migrator.plan(&conn).unwrap().len() == 1);
        assert!(!table_exists(&conn, "schema_migrations"));
    }

    #[test]
    fn test_applied_rows_carry_keys() {
        let mut conn = Connection::open_in_memory().unwrap();
        let migrator = Migrator::default();
        migrator.migrate(&mut conn).unwrap();

        let applied = migrator.applied(&conn).unwrap();
        assert_eq!(applied[0].key(), INITIAL);
    }
}
