use owo_colors::Style;
use std::sync::OnceLock;

static THEME: OnceLock<Theme> = OnceLock::new();

/// Styles keyed by what is being shown rather than by color
#[derive(Debug, Clone)]
pub struct Theme {
    pub label: Style,
    pub package: Style,
    pub written: Style,
    pub unchanged: Style,
    pub drift: Style,
    pub clean: Style,
    pub error: Style,
}

impl Theme {
    /// Colors only for an interactive stdout without `NO_COLOR`
    pub fn detect() -> Self {
        let no_color = std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty());
        if no_color || !console::Term::stdout().is_term() {
            return Self::plain();
        }
        Self::colored()
    }

    pub fn colored() -> Self {
        Self {
            label: Style::new().white().dimmed(),
            package: Style::new().cyan().bold(),
            written: Style::new().green().bold(),
            unchanged: Style::new().bright_black(),
            drift: Style::new().yellow().bold(),
            clean: Style::new().green(),
            error: Style::new().red().bold(),
        }
    }

    pub fn plain() -> Self {
        let none = Style::new();
        Self {
            label: none,
            package: none,
            written: none,
            unchanged: none,
            drift: none,
            clean: none,
            error: none,
        }
    }
}

pub fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::detect)
}
