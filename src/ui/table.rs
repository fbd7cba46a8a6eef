use crate::attempt::TimedAttempt;
use crate::storage::{AttemptStats, DifficultyStats};
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

#[derive(Tabled)]
struct AttemptRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Word")]
    word: String,
    #[tabled(rename = "Length")]
    word_length: i64,
    #[tabled(rename = "Attempts")]
    attempts: i64,
    #[tabled(rename = "Result")]
    result: &'static str,
    #[tabled(rename = "Difficulty")]
    difficulty: String,
}

#[derive(Tabled)]
struct DifficultyRow {
    #[tabled(rename = "Difficulty")]
    difficulty: String,
    #[tabled(rename = "Games")]
    games: usize,
    #[tabled(rename = "Wins")]
    wins: usize,
    #[tabled(rename = "Avg attempts")]
    average_attempts: String,
}

#[derive(Default)]
pub struct TableBuilder {
    rows: Vec<TableRow>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_row(&mut self, label: &str, value: &str) {
        self.rows.push(TableRow {
            metric: label.to_string(),
            value: value.to_string(),
        });
    }

    pub fn build(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }

        Table::new(&self.rows).with(Style::rounded()).to_string()
    }
}

pub fn stats_table(stats: &AttemptStats) -> String {
    let mut builder = TableBuilder::new();
    builder.add_row("Games", &stats.games.to_string());
    builder.add_row("Wins", &stats.wins.to_string());
    builder.add_row("Losses", &stats.losses().to_string());
    builder.add_row("Win rate", &format!("{:.1}%", stats.win_rate() * 100.0));
    builder.add_row("Average attempts", &format!("{:.2}", stats.average_attempts));
    builder.build()
}

pub fn difficulty_table(rows: &[DifficultyStats]) -> String {
    if rows.is_empty() {
        return String::new();
    }

    let rows: Vec<DifficultyRow> = rows
        .iter()
        .map(|d| DifficultyRow {
            difficulty: d.difficulty.clone(),
            games: d.games,
            wins: d.wins,
            average_attempts: format!("{:.2}", d.average_attempts),
        })
        .collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

pub fn attempts_table(attempts: &[TimedAttempt]) -> String {
    if attempts.is_empty() {
        return String::new();
    }

    let rows: Vec<AttemptRow> = attempts
        .iter()
        .map(|a| AttemptRow {
            id: a.timed_id,
            word: a.word.clone(),
            word_length: a.word_length,
            attempts: a.attempts,
            result: if a.win { "win" } else { "loss" },
            difficulty: a.difficulty.clone(),
        })
        .collect();
    Table::new(rows).with(Style::rounded()).to_string()
}
