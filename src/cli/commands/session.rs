//! Setup shared by the commands that query the index or test distributions.

use chrono::Local;
use console::Term;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use crate::config::{load_config, validate, ConfigOverrides, RunConfig};
use crate::error::Result;
use crate::index::{metacpan, FixtureIndex, MetaCpanIndex, PackageIndex};
use crate::report::{run_id, Reporter, RunLogs};
use crate::requirements::InstallRoot;
use crate::runner::{DependentFilter, Orchestrator, RunContext};
use crate::shell::ShellRunner;
use crate::ui::{should_use_colors, tool_output_for, OutputMode, RevdepTheme, RunProgress};

use super::dispatcher::CommandResult;

/// Where a command runs and how loud it is.
#[derive(Debug, Clone, Copy)]
pub struct Session<'a> {
    /// Directory `revdep.yml` is discovered in.
    pub cwd: &'a Path,
    /// Explicit `--config`.
    pub config_path: Option<&'a Path>,
    /// Verbosity from the global flags.
    pub mode: OutputMode,
}

impl Session<'_> {
    /// Load the config file, layer `overrides` on top and validate.
    pub fn config(&self, overrides: ConfigOverrides) -> Result<RunConfig> {
        let mut config = load_config(self.config_path, self.cwd)?;
        config.apply(overrides);
        validate(&config)?;
        Ok(config)
    }

    /// Output mode once the config file had its say.
    pub fn mode_for(&self, config: &RunConfig) -> OutputMode {
        if config.verbose && self.mode == OutputMode::Normal {
            OutputMode::Verbose
        } else {
            self.mode
        }
    }

    /// Open the configured index.
    pub fn index(&self, config: &RunConfig) -> Result<Arc<dyn PackageIndex>> {
        if let Some(fixture) = &config.index.fixture {
            tracing::debug!("Using fixture index {}", fixture.display());
            return Ok(Arc::new(FixtureIndex::load(fixture)?));
        }
        let url = config
            .index
            .metacpan
            .as_deref()
            .unwrap_or(metacpan::DEFAULT_URL);
        let output = tool_output_for(self.mode_for(config));
        Ok(Arc::new(MetaCpanIndex::new(url, config.index_timeout(), output)?))
    }

    /// Dependent filter from the configured patterns.
    pub fn filter(&self, config: &RunConfig) -> Result<DependentFilter> {
        DependentFilter::new(config.include.as_deref(), config.exclude.as_deref())
    }

    /// Test `names`, writing the plan to `out`. `target` names the run's logs.
    pub fn test_names(
        &self,
        names: Vec<String>,
        target: &str,
        config: &RunConfig,
        index: Arc<dyn PackageIndex>,
        out: &mut dyn Write,
    ) -> Result<CommandResult> {
        let mode = self.mode_for(config);
        let workers = config.workers();

        let root = InstallRoot::create(config.install_root.as_deref(), config.keep_install_root)?;
        let runner = Arc::new(ShellRunner::new(tool_output_for(mode)));
        let ctx = RunContext::new(index, runner, root, config.work_dir.clone())?;

        let id = run_id(target, Local::now(), std::process::id());
        let logs = RunLogs::open(config.log_dir.as_deref(), &id, workers > 1)?;
        if let Some(path) = logs.status.path() {
            tracing::info!("Logging to {}", path.display());
        }

        let theme = if should_use_colors() {
            RevdepTheme::new()
        } else {
            RevdepTheme::plain()
        };
        let progress = if mode.shows_progress() {
            RunProgress::new(names.len(), theme.clone())
        } else {
            RunProgress::hidden()
        };

        let mut reporter = Reporter::new(out, logs);
        reporter.plan(names.len())?;
        Orchestrator::new(&ctx, workers).run(&names, |outcome| {
            progress.record(&outcome);
            reporter.report(&outcome)
        })?;
        progress.finish();
        let summary = reporter.finish()?;

        if mode.shows_summary() {
            let style = if summary.is_success() {
                &theme.pass
            } else {
                &theme.fail
            };
            let _ = Term::stderr().write_line(&format!(
                "{} {}",
                style.apply_to(if summary.is_success() { "OK" } else { "FAILED" }),
                theme.highlight.apply_to(summary)
            ));
        }

        if summary.is_success() {
            Ok(CommandResult::success())
        } else {
            Ok(CommandResult::failure(1))
        }
    }
}
