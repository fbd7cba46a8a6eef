//! Timed Stats CLI - manage the timed attempts schema and inspect recorded games

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "timed-stats")]
#[command(version)]
#[command(about = "Versioned SQLite schema and record store for timed word-game attempts")]
#[command(long_about = r#"
Timed Stats owns the `timed` table: it applies its migrations, records
attempts and reports aggregate statistics.

Example usage:
  timed-stats migrate
  timed-stats showmigrations
  timed-stats record --word CRANE --attempts 4 --win --difficulty normal
  timed-stats stats
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit machine-readable JSON instead of human output
    #[arg(long, global = true)]
    json: bool,

    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to the database file (overrides the config file)
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a config file with the default database location
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Apply pending migrations, or a single one
    Migrate {
        /// Migration key (<app>.<name>); all pending when omitted
        migration: Option<String>,

        /// Revert the named migration instead of applying it
        #[arg(long, requires = "migration")]
        revert: bool,
    },

    /// List known migrations and whether they are applied
    Showmigrations,

    /// Print the SQL a migration runs
    Sqlmigrate {
        /// Migration key (<app>.<name>)
        migration: String,

        /// Print the SQL that reverts the migration
        #[arg(long)]
        backwards: bool,
    },

    /// Record one attempt
    Record {
        /// The word that had to be guessed
        #[arg(short, long)]
        word: String,

        /// Number of guesses made
        #[arg(short, long)]
        attempts: i64,

        /// The word was found
        #[arg(long, conflicts_with = "loss")]
        win: bool,

        /// The word was not found
        #[arg(long)]
        loss: bool,

        /// Difficulty label
        #[arg(short = 'D', long)]
        difficulty: String,

        /// Length to record (defaults to the word's length)
        #[arg(long)]
        word_length: Option<i64>,
    },

    /// List recorded attempts
    List {
        /// Only show this difficulty
        #[arg(short = 'D', long)]
        difficulty: Option<String>,

        /// Maximum number of rows
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Show aggregate statistics
    Stats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

impl OutputMode {
    pub fn is_human(self) -> bool {
        self == OutputMode::Human
    }
}

/// Print a `{"ok": true, "command": ..., "data": ...}` envelope in JSON mode
pub fn emit_success(output_mode: OutputMode, command: &str, data: serde_json::Value) -> anyhow::Result<()> {
    if output_mode == OutputMode::Json {
        let envelope = serde_json::json!({
            "ok": true,
            "command": command,
            "data": data,
        });
        println!("{}", serde_json::to_string_pretty(&envelope)?);
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    if let Err(e) = run(cli) {
        timed_stats::ui::error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let output_mode = if cli.json { OutputMode::Json } else { OutputMode::Human };
    let config_path = cli.config.clone().unwrap_or_else(timed_stats::config::default_config_path);
    let config = timed_stats::config::TimedStatsConfig::load(&config_path)?;
    let database = timed_stats::config::resolve_database_path(cli.database, config.as_ref());

    match cli.command {
        Commands::Init { force } => commands::run_init(output_mode, &config_path, force),
        Commands::Migrate { migration, revert } => {
            commands::run_migrate(output_mode, &database, migration.as_deref(), revert)
        }
        Commands::Showmigrations => commands::run_showmigrations(output_mode, &database),
        Commands::Sqlmigrate { migration, backwards } => {
            commands::run_sqlmigrate(output_mode, &migration, backwards)
        }
        Commands::Record { word, attempts, win, loss, difficulty, word_length } => {
            let outcome = match (win, loss) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };
            let mut attempt = timed_stats::NewTimedAttempt::new(word, attempts, difficulty);
            attempt.win = outcome;
            if let Some(len) = word_length {
                attempt = attempt.with_word_length(len);
            }
            commands::run_record(output_mode, &database, &attempt)
        }
        Commands::List { difficulty, limit } => {
            commands::run_list(output_mode, &database, difficulty.as_deref(), limit)
        }
        Commands::Stats => commands::run_stats(output_mode, &database),
    }
}
