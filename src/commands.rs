use crate::{OutputMode, emit_success};
use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use timed_stats::config::{self, TimedStatsConfig};
use timed_stats::storage::{Migrator, SqliteStore};
use timed_stats::ui::{self, Icons};
use timed_stats::NewTimedAttempt;

fn open_connection(database: &Path) -> anyhow::Result<Connection> {
    config::ensure_db_dir(database)?;
    Ok(Connection::open(database)?)
}

/// Read-only view of the store; a missing file reads as an empty store
fn open_for_inspection(database: &Path) -> anyhow::Result<Connection> {
    if !database.exists() {
        return Ok(Connection::open_in_memory()?);
    }
    Ok(Connection::open_with_flags(database, OpenFlags::SQLITE_OPEN_READ_ONLY)?)
}

fn open_store(database: &Path) -> anyhow::Result<SqliteStore> {
    config::ensure_db_dir(database)?;
    Ok(SqliteStore::open(database)?)
}

pub fn run_init(output_mode: OutputMode, config_path: &Path, force: bool) -> anyhow::Result<()> {
    let cfg = TimedStatsConfig::with_default_database(Path::new("."));
    cfg.save(config_path, force)?;
    let database = config::resolve_database_path(None, Some(&cfg));

    if output_mode.is_human() {
        ui::success(&format!("Wrote {}", config_path.display()));
        ui::info("Database", &database.display().to_string());
    } else {
        emit_success(output_mode, "init", serde_json::json!({
            "config": config_path.display().to_string(),
            "database": database.display().to_string(),
        }))?;
    }
    Ok(())
}

pub fn run_migrate(
    output_mode: OutputMode,
    database: &Path,
    migration: Option<&str>,
    revert: bool,
) -> anyhow::Result<()> {
    let mut conn = open_connection(database)?;
    let migrator = Migrator::default();

    if output_mode.is_human() {
        ui::header(&format!("Database: {}", database.display()));
    }

    let (action, keys) = match (migration, revert) {
        (Some(key), true) => {
            migrator.revert(&mut conn, key)?;
            ("reverted", vec![key.to_string()])
        }
        (Some(key), false) => {
            migrator.apply(&mut conn, key)?;
            ("applied", vec![key.to_string()])
        }
        (None, _) => ("applied", migrator.migrate(&mut conn)?),
    };

    if output_mode.is_human() {
        if keys.is_empty() {
            println!("{} No migrations to apply.", Icons::EMPTY);
        }
        for key in &keys {
            ui::success(&format!("{} {}", action, key));
        }
    } else {
        emit_success(output_mode, "migrate", serde_json::json!({
            "action": action,
            "migrations": keys,
        }))?;
    }
    Ok(())
}

pub fn run_showmigrations(output_mode: OutputMode, database: &Path) -> anyhow::Result<()> {
    let conn = open_for_inspection(database)?;
    let status = Migrator::default().status(&conn)?;

    if output_mode.is_human() {
        ui::section("timed_stats");
        for s in &status {
            println!(" {}", ui::migration_line(s));
        }
    } else {
        emit_success(output_mode, "showmigrations", serde_json::to_value(&status)?)?;
    }
    Ok(())
}

pub fn run_sqlmigrate(output_mode: OutputMode, migration: &str, backwards: bool) -> anyhow::Result<()> {
    let migrator = Migrator::default();
    let sql = if backwards {
        migrator.reverse_sql_for(migration)?
    } else {
        migrator.sql_for(migration)?
    };

    if output_mode.is_human() {
        println!("{}", sql);
    } else {
        emit_success(output_mode, "sqlmigrate", serde_json::json!({
            "migration": migration,
            "backwards": backwards,
            "sql": sql,
        }))?;
    }
    Ok(())
}

pub fn run_record(output_mode: OutputMode, database: &Path, attempt: &NewTimedAttempt) -> anyhow::Result<()> {
    let store = open_store(database)?;
    let stored = store.insert_attempt(attempt)?;

    if output_mode.is_human() {
        ui::success(&format!("Recorded attempt #{}", stored.timed_id));
        ui::summary_row("Word:", &format!("{} ({} letters)", stored.word, stored.word_length));
        ui::summary_row("Attempts:", &stored.attempts.to_string());
        ui::summary_row("Result:", &ui::outcome(stored.win));
        ui::summary_row("Difficulty:", &stored.difficulty);
        if stored.word_length != stored.word.chars().count() as i64 {
            ui::warn("Recorded word length differs from the word itself");
        }
    } else {
        emit_success(output_mode, "record", serde_json::to_value(&stored)?)?;
    }
    Ok(())
}

pub fn run_list(
    output_mode: OutputMode,
    database: &Path,
    difficulty: Option<&str>,
    limit: usize,
) -> anyhow::Result<()> {
    let store = open_store(database)?;
    let attempts = store.list_attempts(difficulty, limit)?;

    if output_mode.is_human() {
        if attempts.is_empty() {
            println!("{} No attempts recorded.", Icons::EMPTY);
        } else {
            println!("{}", ui::attempts_table(&attempts));
        }
    } else {
        emit_success(output_mode, "list", serde_json::to_value(&attempts)?)?;
    }
    Ok(())
}

pub fn run_stats(output_mode: OutputMode, database: &Path) -> anyhow::Result<()> {
    let store = open_store(database)?;
    let stats = store.stats()?;

    if output_mode.is_human() {
        ui::header(&format!("Timed Stats ({})", database.display()));
        println!("{} Attempts", Icons::STATS);
        println!("{}", ui::stats_table(&stats));
        if !stats.by_difficulty.is_empty() {
            ui::section("By difficulty");
            println!("{}", ui::difficulty_table(&stats.by_difficulty));
        }
    } else {
        let mut data = serde_json::to_value(&stats)?;
        data["losses"] = stats.losses().into();
        data["win_rate"] = stats.win_rate().into();
        emit_success(output_mode, "stats", data)?;
    }
    Ok(())
}
