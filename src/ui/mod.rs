//! Terminal output.
//!
//! This module provides:
//! - [`ToolOutput`] - the injectable sink for upstream tool output
//! - [`OutputMode`] - verbosity selection
//! - [`RunProgress`] - an indicatif progress bar over the run
//! - [`RevdepTheme`] - colours for outcome statuses

pub mod output;
pub mod progress;
pub mod theme;

pub use output::{tool_output_for, EchoOutput, OutputMode, SilentOutput, ToolOutput};
pub use progress::RunProgress;
pub use theme::{should_use_colors, RevdepTheme};
