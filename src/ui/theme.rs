//! Terminal styles for outcome statuses.

use console::Style;

use crate::runner::OutcomeStatus;

/// Styles used for the run summary.
#[derive(Debug, Clone)]
pub struct RevdepTheme {
    /// Style for PASS (green).
    pub pass: Style,
    /// Style for WARN (orange).
    pub warn: Style,
    /// Style for FAIL (red bold).
    pub fail: Style,
    /// Style for SKIP and UNKNOWN (dim).
    pub skip: Style,
    /// Style for counters (bold).
    pub highlight: Style,
}

impl Default for RevdepTheme {
    fn default() -> Self {
        Self::new()
    }
}

impl RevdepTheme {
    /// Create the default theme.
    pub fn new() -> Self {
        Self {
            pass: Style::new().green(),
            warn: Style::new().color256(208),
            fail: Style::new().red().bold(),
            skip: Style::new().dim(),
            highlight: Style::new().bold(),
        }
    }

    /// Create a theme without colors (for non-TTY or --no-color).
    pub fn plain() -> Self {
        Self {
            pass: Style::new(),
            warn: Style::new(),
            fail: Style::new(),
            skip: Style::new(),
            highlight: Style::new(),
        }
    }

    /// Style for a given status.
    pub fn for_status(&self, status: OutcomeStatus) -> &Style {
        match status {
            OutcomeStatus::Pass => &self.pass,
            OutcomeStatus::Warn => &self.warn,
            OutcomeStatus::Fail => &self.fail,
            OutcomeStatus::Skip | OutcomeStatus::Unknown => &self.skip,
        }
    }

    /// Format a status label with its colour.
    pub fn format_status(&self, status: OutcomeStatus) -> String {
        format!("{}", self.for_status(status).apply_to(status.label()))
    }
}

/// Check if colors should be enabled.
pub fn should_use_colors() -> bool {
    // Check NO_COLOR env var (https://no-color.org/)
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }
    console::colors_enabled_stderr() && console::Term::stderr().features().colors_supported()
}
