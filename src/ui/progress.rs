//! Run progress indicator.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::runner::Outcome;

use super::theme::RevdepTheme;

/// Progress bar counting reported distributions, drawn on stderr.
pub struct RunProgress {
    bar: ProgressBar,
    theme: RevdepTheme,
}

impl RunProgress {
    /// Create a progress bar for `total` distributions.
    pub fn new(total: usize, theme: RevdepTheme) -> Self {
        let bar = ProgressBar::with_draw_target(Some(total as u64), ProgressDrawTarget::stderr());
        if let Ok(style) =
            ProgressStyle::with_template("{spinner:.magenta} [{pos}/{len}] {wide_msg}")
        {
            bar.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ "));
        }
        Self { bar, theme }
    }

    /// A progress bar that never draws (quiet and verbose modes).
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
            theme: RevdepTheme::plain(),
        }
    }

    /// Record one finished distribution.
    pub fn record(&self, outcome: &Outcome) {
        self.bar.set_message(format!(
            "{} {}",
            self.theme.format_status(outcome.status),
            outcome.name
        ));
        self.bar.inc(1);
    }

    /// Remove the bar once the run is over.
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }

    /// Number of outcomes recorded so far.
    pub fn position(&self) -> u64 {
        self.bar.position()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hidden_progress_still_counts() {
        let progress = RunProgress::hidden();
        progress.record(&Outcome::unknown("Missing::Dist", "not found"));
        progress.record(&Outcome::unknown("Other::Dist", "not found"));
        assert_eq!(progress.position(), 2);
        progress.finish();
    }
}
