//! revdep CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use revdep::cli::{Cli, CommandDispatcher};
use revdep::RevdepError;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Exit code for configuration errors.
const CONFIG_ERROR_EXIT: u8 = 2;

/// Initialize the tracing subscriber for logging.
///
/// Log level is controlled by:
/// 1. `--debug` flag sets level to DEBUG
/// 2. `RUST_LOG` environment variable (if set)
/// 3. Default is INFO
///
/// Logs go to stderr; stdout carries the test plan.
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("revdep=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("revdep=info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    tracing::debug!("revdep starting with args: {:?}", cli);

    if cli.no_color {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }

    let cwd = std::env::current_dir().unwrap_or_default();
    let dispatcher = CommandDispatcher::new(cwd);
    let mut stdout = std::io::stdout().lock();

    match dispatcher.dispatch(&cli, &mut stdout) {
        Ok(result) => ExitCode::from(result.exit_code as u8),
        Err(e) => {
            eprintln!("Error: {}", e);
            match e {
                RevdepError::ConfigNotFound { .. }
                | RevdepError::ConfigParseError { .. }
                | RevdepError::ConfigValidationError { .. } => ExitCode::from(CONFIG_ERROR_EXIT),
                _ => ExitCode::from(1),
            }
        }
    }
}
