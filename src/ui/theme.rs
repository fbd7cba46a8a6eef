use owo_colors::Style;
use std::sync::OnceLock;

static THEME: OnceLock<Theme> = OnceLock::new();

#[derive(Debug, Clone)]
pub struct Theme {
    pub header: Style,
    pub success: Style,
    pub error: Style,
    pub warn: Style,
    pub info: Style,
    pub dim: Style,
    /// Applied migrations and won games
    pub applied: Style,
    /// Pending migrations and lost games
    pub pending: Style,
}

impl Theme {
    /// Without color every role falls back to the unstyled `Style::new()`.
    pub fn new(colored: bool) -> Self {
        let role = |style: Style| if colored { style } else { Style::new() };
        Self {
            header: role(Style::new().cyan().bold()),
            success: role(Style::new().green().bold()),
            error: role(Style::new().red().bold()),
            warn: role(Style::new().yellow().bold()),
            info: role(Style::new().magenta()),
            dim: role(Style::new().dimmed()),
            applied: role(Style::new().green()),
            pending: role(Style::new().bright_black()),
        }
    }

    /// Follows `console`'s color detection (terminal, `NO_COLOR`, `CLICOLOR_FORCE`)
    pub fn detect() -> Self {
        Self::new(console::colors_enabled())
    }
}

pub fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::detect)
}
