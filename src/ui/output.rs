use crate::storage::MigrationStatus;
use crate::ui::{theme, Icons};
use owo_colors::OwoColorize;

pub fn header(text: &str) {
    println!("{} {}", Icons::DATABASE, text.style(theme().header.clone()));
}

pub fn success(label: &str) {
    println!("{} {}", Icons::CHECK, label.style(theme().success.clone()));
}

pub fn error(label: &str) {
    eprintln!("{} {}", Icons::CROSS, label.style(theme().error.clone()));
}

pub fn warn(label: &str) {
    eprintln!("{} {}", Icons::WARN, label.style(theme().warn.clone()));
}

pub fn info(label: &str, value: &str) {
    println!(
        "{} {}: {}",
        Icons::INFO.style(theme().info.clone()),
        label.style(theme().dim.clone()),
        value
    );
}

pub fn section(title: &str) {
    println!();
    println!("━{}━", title.style(theme().header.clone()));
}

pub fn summary_row(label: &str, value: &str) {
    println!("  {} {}", label.style(theme().dim.clone()), value);
}

/// `[X] app.name` / `[ ] app.name`, as showmigrations prints them
pub fn migration_line(status: &MigrationStatus) -> String {
    if status.applied {
        format!("[X] {}", status.key).style(theme().applied.clone()).to_string()
    } else {
        format!("[ ] {}", status.key).style(theme().pending.clone()).to_string()
    }
}

pub fn outcome(win: bool) -> String {
    if win {
        "win".style(theme().applied.clone()).to_string()
    } else {
        "loss".style(theme().pending.clone()).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_line_markers() {
        let applied = MigrationStatus {
            key: "timed_stats.0001_initial".to_string(),
            applied: true,
            applied_at: Some("2024-01-01 00:00:00".to_string()),
        };
        let pending = MigrationStatus { applied: false, applied_at: None, ..applied.clone() };

        // Styling may wrap the text, the marker and key are always present
        assert!(migration_line(&applied).contains("[X] timed_stats.0001_initial"));
        assert!(migration_line(&pending).contains("[ ] timed_stats.0001_initial"));
    }
}
