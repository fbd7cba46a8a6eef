//! Record types for timed game attempts
//!
//! A `TimedAttempt` is one play-through of the timed word game as stored in
//! the `timed` table. `NewTimedAttempt` is the insert shape: it has no id and
//! leaves `win` unset so the column default applies.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Maximum characters allowed in `word`
pub const MAX_WORD_CHARS: usize = 11;

/// Maximum characters allowed in `difficulty`
pub const MAX_DIFFICULTY_CHARS: usize = 100;

/// A stored attempt, as read back from the `timed` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimedAttempt {
    /// Auto-generated primary key
    pub timed_id: i64,
    /// The word that had to be guessed
    pub word: String,
    /// Length recorded by the caller; not tied to `word` by the store
    pub word_length: i64,
    /// Number of guesses made
    pub attempts: i64,
    /// Whether the word was found
    pub win: bool,
    /// Free-text difficulty label
    pub difficulty: String,
}

/// An attempt that has not been inserted yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTimedAttempt {
    pub word: String,
    pub word_length: i64,
    pub attempts: i64,
    /// `None` leaves the column default (false) in place
    pub win: Option<bool>,
    pub difficulty: String,
}

impl NewTimedAttempt {
    /// Create an attempt whose `word_length` is derived from `word`.
    pub fn new(word: impl Into<String>, attempts: i64, difficulty: impl Into<String>) -> Self {
        let word = word.into();
        let word_length = word.chars().count() as i64;
        Self {
            word,
            word_length,
            attempts,
            win: None,
            difficulty: difficulty.into(),
        }
    }

    /// Set the outcome explicitly
    pub fn with_win(mut self, win: bool) -> Self {
        self.win = Some(win);
        self
    }

    /// Record a length other than the one derived from the word.
    ///
    /// The store keeps whatever the caller reports here.
    pub fn with_word_length(mut self, word_length: i64) -> Self {
        self.word_length = word_length;
        self
    }

    /// Check the declared text limits. Lengths are counted in characters.
    pub fn validate(&self) -> Result<()> {
        check_len("word", &self.word, MAX_WORD_CHARS)?;
        check_len("difficulty", &self.difficulty, MAX_DIFFICULTY_CHARS)?;
        Ok(())
    }

    /// Turn into a stored record once the id is known
    pub fn into_attempt(self, timed_id: i64) -> TimedAttempt {
        TimedAttempt {
            timed_id,
            word: self.word,
            word_length: self.word_length,
            attempts: self.attempts,
            win: self.win.unwrap_or(false),
            difficulty: self.difficulty,
        }
    }
}

fn check_len(field: &'static str, value: &str, max: usize) -> Result<()> {
    let actual = value.chars().count();
    if actual > max {
        return Err(Error::FieldTooLong { field, max, actual });
    }
    Ok(())
}
