//! Processing a single name end to end.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use crate::build::run_tests;
use crate::error::{RevdepError, Result};
use crate::index::PackageIndex;
use crate::requirements::{InstallRoot, InstallerContext, PrereqInstaller};
use crate::shell::CommandRunner;

use super::Outcome;

/// Everything a run shares, created once per invocation.
///
/// Workers only ever see this by reference; nothing about a run lives in
/// process-wide state.
pub struct RunContext {
    /// Package index all resolution goes through.
    pub index: Arc<dyn PackageIndex>,
    /// Runner for every external command.
    pub runner: Arc<dyn CommandRunner>,
    /// Where prerequisites are installed.
    pub root: InstallRoot,
    work_dir: PathBuf,
    _scratch: Option<TempDir>,
}

impl RunContext {
    /// Create a context. Without a `work_dir`, fetched sources go into a
    /// temporary directory removed with the context.
    pub fn new(
        index: Arc<dyn PackageIndex>,
        runner: Arc<dyn CommandRunner>,
        root: InstallRoot,
        work_dir: Option<PathBuf>,
    ) -> Result<Self> {
        let (work_dir, scratch) = match work_dir {
            Some(dir) => {
                std::fs::create_dir_all(&dir)?;
                (dir, None)
            }
            None => {
                let scratch = tempfile::Builder::new().prefix("revdep-work-").tempdir()?;
                (scratch.path().to_path_buf(), Some(scratch))
            }
        };
        Ok(Self {
            index,
            runner,
            root,
            work_dir,
            _scratch: scratch,
        })
    }

    /// Directory fetched sources are unpacked into.
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    fn installer_context(&self) -> InstallerContext<'_> {
        InstallerContext {
            index: self.index.as_ref(),
            runner: self.runner.as_ref(),
            root: &self.root,
            work_dir: &self.work_dir,
        }
    }
}

/// Resolves, installs prerequisites for and tests one name at a time.
///
/// A worker keeps its installer, and with it the visited set, across
/// every name it processes.
pub struct Worker<'a> {
    ctx: &'a RunContext,
    installer: PrereqInstaller<'a>,
}

impl<'a> Worker<'a> {
    /// Create a worker with a fresh visited set.
    pub fn new(ctx: &'a RunContext) -> Self {
        Self {
            ctx,
            installer: PrereqInstaller::new(ctx.installer_context()),
        }
    }

    /// Take `name` all the way to an [`Outcome`]. Never fails: every
    /// problem is folded into the outcome's status.
    pub fn process(&mut self, name: &str) -> Outcome {
        let mut dist = match self.ctx.index.resolve(name) {
            Ok(dist) => dist,
            Err(e) => {
                tracing::info!("{} not resolvable: {}", name, e);
                return Outcome::unknown(name, e.to_string());
            }
        };
        tracing::info!("Testing {} ({})", name, dist.base_id);

        let installed = self.installer.ensure_installed(&mut dist);
        let events = self.installer.take_events();
        match installed {
            Ok(()) => {}
            Err(RevdepError::BuildFailure { dist: id, message }) if id == dist.base_id => {
                return Outcome::build_failed(&dist, message).with_events(events);
            }
            Err(e) => {
                tracing::warn!("Skipping {}: {}", name, e);
                return Outcome::skipped(&dist, e.to_string()).with_events(events);
            }
        }

        let source = match dist.ensure_source(self.ctx.index.as_ref(), &self.ctx.work_dir) {
            Ok(source) => source.to_path_buf(),
            Err(e) => return Outcome::skipped(&dist, e.to_string()).with_events(events),
        };

        let run = run_tests(self.ctx.runner.as_ref(), &source, self.ctx.root.env());
        Outcome::tested(&dist, run).with_events(events)
    }
}
