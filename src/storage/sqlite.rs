//! SQLite storage implementation

use std::path::Path;
use rusqlite::{Connection, params, OptionalExtension};
use serde::Serialize;
use crate::Result;
use crate::attempt::{NewTimedAttempt, TimedAttempt};
use super::migrate::Migrator;

const SELECT_ATTEMPT: &str =
    "SELECT timed_id, word, word_length, attempts, win, difficulty FROM timed";

/// SQLite-backed storage for timed attempts
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open a database file (creates if doesn't exist) and apply pending migrations
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    fn from_connection(mut conn: Connection) -> Result<Self> {
        Migrator::default().migrate(&mut conn)?;
        Ok(Self { conn })
    }

    /// Borrow the underlying connection
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    // ========== Attempt Operations ==========

    /// Insert an attempt and return it with its generated id
    pub fn insert_attempt(&self, attempt: &NewTimedAttempt) -> Result<TimedAttempt> {
        attempt.validate()?;

        match attempt.win {
            Some(win) => self.conn.execute(
                r#"
                INSERT INTO timed (word, word_length, attempts, win, difficulty)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
                params![
                    attempt.word,
                    attempt.word_length,
                    attempt.attempts,
                    win,
                    attempt.difficulty,
                ],
            )?,
            // Leave `win` out so the column default applies
            None => self.conn.execute(
                r#"
                INSERT INTO timed (word, word_length, attempts, difficulty)
                VALUES (?1, ?2, ?3, ?4)
                "#,
                params![
                    attempt.word,
                    attempt.word_length,
                    attempt.attempts,
                    attempt.difficulty,
                ],
            )?,
        };

        let id = self.conn.last_insert_rowid();
        tracing::debug!("Inserted timed attempt {} ({})", id, attempt.word);
        Ok(self.get_attempt(id)?.unwrap_or_else(|| attempt.clone().into_attempt(id)))
    }

    /// Get an attempt by id
    pub fn get_attempt(&self, timed_id: i64) -> Result<Option<TimedAttempt>> {
        self.conn
            .query_row(
                &format!("{SELECT_ATTEMPT} WHERE timed_id = ?1"),
                [timed_id],
                |row| self.row_to_attempt(row),
            )
            .optional()
            .map_err(Into::into)
    }

    /// List attempts in insertion order, optionally filtered by difficulty
    pub fn list_attempts(&self, difficulty: Option<&str>, limit: usize) -> Result<Vec<TimedAttempt>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let attempts = if let Some(d) = difficulty {
            let mut stmt = self.conn.prepare(&format!(
                "{SELECT_ATTEMPT} WHERE difficulty = ?1 ORDER BY timed_id LIMIT ?2"
            ))?;
            let rows = stmt
                .query_map(params![d, limit], |row| self.row_to_attempt(row))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows
        } else {
            let mut stmt = self.conn.prepare(&format!(
                "{SELECT_ATTEMPT} ORDER BY timed_id LIMIT ?1"
            ))?;
            let rows = stmt
                .query_map(params![limit], |row| self.row_to_attempt(row))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows
        };

        Ok(attempts)
    }

    /// Count all attempts
    pub fn count_attempts(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row("SELECT COUNT(*) FROM timed", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Helper to convert a row to a TimedAttempt
    fn row_to_attempt(&self, row: &rusqlite::Row) -> rusqlite::Result<TimedAttempt> {
        Ok(TimedAttempt {
            timed_id: row.get(0)?,
            word: row.get(1)?,
            word_length: row.get(2)?,
            attempts: row.get(3)?,
            win: row.get(4)?,
            difficulty: row.get(5)?,
        })
    }

    // ========== Aggregates ==========

    /// Aggregate statistics over all attempts
    pub fn stats(&self) -> Result<AttemptStats> {
        let (games, wins, average_attempts) = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(win <> 0), 0), COALESCE(AVG(attempts), 0.0) FROM timed",
            [],
            |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?, row.get::<_, f64>(2)?)),
        )?;

        let mut stmt = self.conn.prepare(
            r#"
            SELECT difficulty, COUNT(*), SUM(win <> 0), AVG(attempts)
            FROM timed
            GROUP BY difficulty
            ORDER BY difficulty
            "#,
        )?;
        let by_difficulty = stmt
            .query_map([], |row| {
                let games: i64 = row.get(1)?;
                let wins: i64 = row.get(2)?;
                Ok(DifficultyStats {
                    difficulty: row.get(0)?,
                    games: games as usize,
                    wins: wins as usize,
                    average_attempts: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(AttemptStats {
            games: games as usize,
            wins: wins as usize,
            average_attempts,
            by_difficulty,
        })
    }
}

/// Per-difficulty breakdown
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DifficultyStats {
    pub difficulty: String,
    pub games: usize,
    pub wins: usize,
    pub average_attempts: f64,
}

/// Aggregate statistics over the `timed` table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttemptStats {
    pub games: usize,
    pub wins: usize,
    pub average_attempts: f64,
    pub by_difficulty: Vec<DifficultyStats>,
}

impl AttemptStats {
    pub fn losses(&self) -> usize {
        self.games.saturating_sub(self.wins)
    }

    /// Fraction of games won, 0.0 when nothing was played
    pub fn win_rate(&self) -> f64 {
        if self.games == 0 {
            0.0
        } else {
            self.wins as f64 / self.games as f64
        }
    }
}

impl std::fmt::Display for AttemptStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Attempt Statistics:")?;
        writeln!(f, "  Games: {}", self.games)?;
        writeln!(f, "  Wins: {}", self.wins)?;
        writeln!(f, "  Losses: {}", self.losses())?;
        writeln!(f, "  Win rate: {:.1}%", self.win_rate() * 100.0)?;
        write!(f, "  Average attempts: {:.2}", self.average_attempts)
    }
}
