//! Database schema definitions

/// SQL to create the migration ledger
pub const CREATE_MIGRATIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    app TEXT NOT NULL,
    name TEXT NOT NULL,
    applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    UNIQUE(app, name)
)
"#;

/// SQL to create the timed attempts table.
///
/// No `IF NOT EXISTS`: an unrecorded table with this name is a collision.
pub const CREATE_TIMED_TABLE: &str = r#"
CREATE TABLE timed (
    timed_id INTEGER PRIMARY KEY AUTOINCREMENT,
    word TEXT NOT NULL CHECK (length(word) <= 11),
    word_length INTEGER NOT NULL,
    attempts INTEGER NOT NULL,
    win BOOLEAN NOT NULL DEFAULT 0 CHECK (win IN (0, 1)),
    difficulty TEXT NOT NULL CHECK (length(difficulty) <= 100)
)
"#;

/// SQL to drop the timed attempts table
pub const DROP_TIMED_TABLE: &str = "DROP TABLE timed";

/// Columns of `timed` in declaration order, with their declared SQL types
pub const TIMED_COLUMNS: &[(&str, &str)] = &[
    ("timed_id", "INTEGER"),
    ("word", "TEXT"),
    ("word_length", "INTEGER"),
    ("attempts", "INTEGER"),
    ("win", "BOOLEAN"),
    ("difficulty", "TEXT"),
];

/// One versioned structural change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Migration {
    /// Owning application label
    pub app: &'static str,
    /// Ordered name within the app, e.g. `0001_initial`
    pub name: &'static str,
    /// Keys (`app.name`) that must be applied first
    pub dependencies: &'static [&'static str],
    /// Forward statements
    pub up: &'static [&'static str],
    /// Reverse statements
    pub down: &'static [&'static str],
}

impl Migration {
    /// Ledger key in `app.name` form
    pub fn key(&self) -> String {
        format!("{}.{}", self.app, self.name)
    }

    /// Forward SQL as one script
    pub fn up_sql(&self) -> String {
        join_statements(self.up)
    }

    /// Reverse SQL as one script
    pub fn down_sql(&self) -> String {
        join_statements(self.down)
    }
}

fn join_statements(stmts: &[&str]) -> String {
    stmts
        .iter()
        .map(|s| format!("{};", s.trim()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// All known migrations, in application order
pub const MIGRATIONS: &[Migration] = &[Migration {
    app: "timed_stats",
    name: "0001_initial",
    dependencies: &[],
    up: &[CREATE_TIMED_TABLE],
    down: &[DROP_TIMED_TABLE],
}];
