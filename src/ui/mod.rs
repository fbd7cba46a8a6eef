pub mod icons;
pub mod output;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{error, header, info, migration_line, outcome, section, success, summary_row, warn};
pub use table::{attempts_table, difficulty_table, stats_table, TableBuilder};
pub use theme::{theme, Theme};
