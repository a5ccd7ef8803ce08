//! Recursive prerequisite installation.
//!
//! Makes a distribution's declared prerequisites available by resolving
//! each unsatisfied one through the index, recursing into its own
//! prerequisites, and installing it (without running its tests) into the
//! run's [`InstallRoot`].
//!
//! The visited set lives in the installer and spans every call made on
//! it, so a distribution reachable along several paths is installed once
//! and circular declarations terminate. A prerequisite that failed leaves
//! the visited set and is remembered as failed, so every later dependent
//! needing it fails the same way instead of building without it.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;

use crate::build::BuildKind;
use crate::error::{RevdepError, Result};
use crate::index::{Distribution, PackageIndex};
use crate::shell::{CommandOptions, CommandRunner};

use super::{InstallRoot, Phase, PrereqRequirement};

/// Collaborators the installer works through.
#[derive(Clone, Copy)]
pub struct InstallerContext<'a> {
    /// Resolves prerequisite names and fetches their source.
    pub index: &'a dyn PackageIndex,
    /// Runs the build tools.
    pub runner: &'a dyn CommandRunner,
    /// Where everything gets installed.
    pub root: &'a InstallRoot,
    /// Scratch space for fetched sources.
    pub work_dir: &'a Path,
}

/// Something the installer did, destined for the prereq log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrereqEvent {
    /// `prereq` was installed on behalf of `for_dist`.
    Installed { prereq: String, for_dist: String },
    /// `prereq` could not be resolved for `for_dist`.
    Unresolved {
        prereq: String,
        for_dist: String,
        reason: String,
    },
}

impl fmt::Display for PrereqEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Installed { prereq, for_dist } => {
                write!(f, "Installed {} for {}", prereq, for_dist)
            }
            Self::Unresolved {
                prereq,
                for_dist,
                reason,
            } => write!(f, "Could not resolve {} for {}: {}", prereq, for_dist, reason),
        }
    }
}

/// Depth-first prerequisite installer.
pub struct PrereqInstaller<'a> {
    ctx: InstallerContext<'a>,
    visited: HashSet<String>,
    failed: HashMap<String, String>,
    events: Vec<PrereqEvent>,
}

impl<'a> PrereqInstaller<'a> {
    /// Create an installer with an empty visited set.
    pub fn new(ctx: InstallerContext<'a>) -> Self {
        Self {
            ctx,
            visited: HashSet::new(),
            failed: HashMap::new(),
            events: Vec::new(),
        }
    }

    /// Make every prerequisite of `dist` available.
    ///
    /// `dist` itself is not installed: it is about to be tested. Its id is
    /// held in the visited set only while its subtree is in progress, so
    /// a later distribution that needs it still gets it installed.
    pub fn ensure_installed(&mut self, dist: &mut Distribution) -> Result<()> {
        let fresh = !self.visited.contains(dist.id());
        let result = self.install_subtree(dist);
        if fresh {
            self.visited.remove(dist.id());
        }
        result
    }

    /// Whether `id` has been installed (or is being installed) by this installer.
    pub fn is_visited(&self, id: &str) -> bool {
        self.visited.contains(id)
    }

    /// Why `id` could not be installed, if an earlier attempt failed.
    pub fn failure(&self, id: &str) -> Option<&str> {
        self.failed.get(id).map(String::as_str)
    }

    /// Drain the events recorded since the last call.
    pub fn take_events(&mut self) -> Vec<PrereqEvent> {
        std::mem::take(&mut self.events)
    }

    fn install_subtree(&mut self, dist: &mut Distribution) -> Result<()> {
        if !self.visited.insert(dist.id().to_string()) {
            tracing::debug!("{} already handled", dist.id());
            return Ok(());
        }

        let source = dist
            .ensure_source(self.ctx.index, self.ctx.work_dir)?
            .to_path_buf();

        // Configure requirements are what the generator itself needs. For
        // the distribution under test this generation runs again before its
        // tests; the first run only has to prove the build files can be made.
        self.install_phase(dist, Phase::Configure)?;
        self.generate(dist, &source)?;
        self.install_phase(dist, Phase::BuildTest)?;
        Ok(())
    }

    fn install_phase(&mut self, dist: &Distribution, phase: Phase) -> Result<()> {
        for req in self.ctx.index.declared_prereqs(dist, phase) {
            if req.is_runtime() {
                continue;
            }
            if req.is_satisfied(self.ctx.runner, self.ctx.root.env()) {
                tracing::debug!("{} already satisfied for {}", req, dist.id());
                continue;
            }
            self.install_prereq(&req, dist)?;
        }
        Ok(())
    }

    fn install_prereq(&mut self, req: &PrereqRequirement, for_dist: &Distribution) -> Result<()> {
        let mut prereq = match self.ctx.index.resolve(&req.name) {
            Ok(prereq) => prereq,
            Err(e) => {
                tracing::warn!("Cannot resolve {} for {}: {}", req.name, for_dist.name, e);
                self.events.push(PrereqEvent::Unresolved {
                    prereq: req.name.clone(),
                    for_dist: for_dist.name.clone(),
                    reason: e.to_string(),
                });
                return Err(RevdepError::PrereqInstallFailure {
                    prereq: req.name.clone(),
                    dist: for_dist.base_id.clone(),
                    message: e.to_string(),
                });
            }
        };

        if let Some(reason) = self.failed.get(prereq.id()) {
            tracing::debug!("{} failed earlier, not retrying", prereq.id());
            return Err(RevdepError::PrereqInstallFailure {
                prereq: req.name.clone(),
                dist: for_dist.base_id.clone(),
                message: reason.clone(),
            });
        }
        if self.visited.contains(prereq.id()) {
            return Ok(());
        }

        let installed = self
            .install_subtree(&mut prereq)
            .and_then(|()| self.install(&prereq));
        if let Err(e) = installed {
            self.visited.remove(prereq.id());
            self.failed.insert(prereq.id().to_string(), e.to_string());
            return Err(match e {
                RevdepError::PrereqInstallFailure { .. } => e,
                other => RevdepError::PrereqInstallFailure {
                    prereq: req.name.clone(),
                    dist: for_dist.base_id.clone(),
                    message: other.to_string(),
                },
            });
        }

        tracing::info!("Installed {} for {}", req.name, for_dist.name);
        self.events.push(PrereqEvent::Installed {
            prereq: req.name.clone(),
            for_dist: for_dist.name.clone(),
        });
        Ok(())
    }

    /// Run the build-file generator with installs pointed at the root.
    fn generate(&self, dist: &Distribution, source: &Path) -> Result<()> {
        let kind = BuildKind::detect(source);
        self.run_step(dist, source, kind.configure_command())
    }

    /// Build and install an already generated prerequisite, skipping its tests.
    fn install(&self, dist: &Distribution) -> Result<()> {
        let Some(source) = dist.source_dir() else {
            return Err(RevdepError::SourceUnavailable {
                dist: dist.base_id.clone(),
                message: "source was never fetched".to_string(),
            });
        };
        let kind = BuildKind::detect(source);
        self.run_step(dist, source, kind.build_command())?;
        self.run_step(dist, source, kind.install_command())
    }

    fn run_step(&self, dist: &Distribution, source: &Path, command: &str) -> Result<()> {
        let options = CommandOptions::in_dir(source, self.ctx.root.env());
        let result = self
            .ctx
            .runner
            .run(command, &options)
            .map_err(|e| RevdepError::BuildFailure {
                dist: dist.base_id.clone(),
                message: e.to_string(),
            })?;
        if result.success {
            return Ok(());
        }
        Err(RevdepError::BuildFailure {
            dist: dist.base_id.clone(),
            message: format!(
                "'{}' exited with code {:?}\n{}",
                command, result.exit_code, result.combined
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{FixtureDistribution, FixtureIndex};
    use crate::shell::{CommandResult, MockRunner};
    use std::fs;
    use tempfile::TempDir;

    struct Fixture {
        dir: TempDir,
        root: InstallRoot,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                dir: TempDir::new().unwrap(),
                root: InstallRoot::create(None, false).unwrap(),
            }
        }

        fn source(&self, base_id: &str) -> std::path::PathBuf {
            let dir = self.dir.path().join(base_id);
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join("Makefile.PL"), "").unwrap();
            dir
        }

        fn dist(&self, name: &str, base_id: &str) -> FixtureDistribution {
            FixtureDistribution::new(name, base_id, "AUTHORID").source(self.source(base_id))
        }

        fn ctx<'a>(&'a self, index: &'a FixtureIndex, runner: &'a MockRunner) -> InstallerContext<'a> {
            InstallerContext {
                index,
                runner,
                root: &self.root,
                work_dir: self.dir.path(),
            }
        }
    }

    #[test]
    fn installs_unsatisfied_prereqs_without_testing_them() {
        let fx = Fixture::new();
        let index = FixtureIndex::new()
            .with_distribution(fx.dist("Top", "Top-1.0").requires(Phase::BuildTest, "Dep"))
            .with_distribution(fx.dist("Dep", "Dep-1.0"));
        let runner = MockRunner::new();

        let mut installer = PrereqInstaller::new(fx.ctx(&index, &runner));
        let mut top = index.resolve("Top").unwrap();
        installer.ensure_installed(&mut top).unwrap();

        assert_eq!(runner.count_in("Dep-1.0", "make install"), 1);
        assert_eq!(runner.count_in("Dep-1.0", "make test"), 0);
        assert_eq!(runner.count_in("Top-1.0", "make install"), 0);
        assert_eq!(
            installer.take_events(),
            [PrereqEvent::Installed {
                prereq: "Dep".into(),
                for_dist: "Top".into()
            }]
        );
    }

    #[test]
    fn runtime_and_satisfied_prereqs_are_skipped() {
        let fx = Fixture::new();
        let index = FixtureIndex::new()
            .with_distribution(
                fx.dist("Top", "Top-1.0")
                    .requires(Phase::BuildTest, "perl")
                    .requires(Phase::BuildTest, "Test::More"),
            )
            .with_distribution(fx.dist("Test::More", "Test-Simple-1.3"));
        let runner = MockRunner::new();
        runner.mark_installed("Test::More");

        let mut installer = PrereqInstaller::new(fx.ctx(&index, &runner));
        let mut top = index.resolve("Top").unwrap();
        installer.ensure_installed(&mut top).unwrap();

        assert_eq!(runner.count_matching("install"), 0);
        assert_eq!(runner.count_matching("perl -Mperl"), 0);
        assert!(installer.take_events().is_empty());
    }

    #[test]
    fn shared_prereq_is_installed_once() {
        let fx = Fixture::new();
        let index = FixtureIndex::new()
            .with_distribution(fx.dist("A", "A-1.0").requires(Phase::BuildTest, "Shared"))
            .with_distribution(fx.dist("B", "B-1.0").requires(Phase::BuildTest, "Shared"))
            .with_distribution(fx.dist("Shared", "Shared-1.0"));
        let runner = MockRunner::new();

        let mut installer = PrereqInstaller::new(fx.ctx(&index, &runner));
        for name in ["A", "B"] {
            let mut dist = index.resolve(name).unwrap();
            installer.ensure_installed(&mut dist).unwrap();
        }

        assert_eq!(runner.count_in("Shared-1.0", "make install"), 1);
        assert_eq!(installer.take_events().len(), 1);
        assert!(installer.is_visited("Shared-1.0"));
    }

    #[test]
    fn circular_prereqs_terminate() {
        let fx = Fixture::new();
        let index = FixtureIndex::new()
            .with_distribution(fx.dist("A", "A-1.0").requires(Phase::BuildTest, "B"))
            .with_distribution(fx.dist("B", "B-1.0").requires(Phase::BuildTest, "A"));
        let runner = MockRunner::new();

        let mut installer = PrereqInstaller::new(fx.ctx(&index, &runner));
        let mut a = index.resolve("A").unwrap();
        installer.ensure_installed(&mut a).unwrap();

        assert_eq!(runner.count_in("B-1.0", "make install"), 1);
        assert_eq!(runner.count_in("A-1.0", "make install"), 0);
        assert_eq!(runner.count_in("A-1.0", "perl Makefile.PL"), 1);
        assert!(!installer.is_visited("A-1.0"));
    }

    #[test]
    fn top_level_dist_is_installed_when_later_needed() {
        let fx = Fixture::new();
        let index = FixtureIndex::new()
            .with_distribution(fx.dist("A", "A-1.0"))
            .with_distribution(fx.dist("C", "C-1.0").requires(Phase::BuildTest, "A"));
        let runner = MockRunner::new();

        let mut installer = PrereqInstaller::new(fx.ctx(&index, &runner));
        for name in ["A", "C"] {
            let mut dist = index.resolve(name).unwrap();
            installer.ensure_installed(&mut dist).unwrap();
        }

        assert_eq!(runner.count_in("A-1.0", "make install"), 1);
    }

    #[test]
    fn configure_prereqs_install_before_generation() {
        let fx = Fixture::new();
        let index = FixtureIndex::new()
            .with_distribution(
                fx.dist("Top", "Top-1.0")
                    .requires(Phase::Configure, "Gen")
                    .requires(Phase::BuildTest, "Dep"),
            )
            .with_distribution(fx.dist("Gen", "Gen-1.0"))
            .with_distribution(fx.dist("Dep", "Dep-1.0"));
        let runner = MockRunner::new();

        let mut installer = PrereqInstaller::new(fx.ctx(&index, &runner));
        let mut top = index.resolve("Top").unwrap();
        installer.ensure_installed(&mut top).unwrap();

        let calls = runner.calls();
        let position = |dir: &str, cmd: &str| {
            calls
                .iter()
                .position(|c| {
                    c.command == cmd
                        && c.cwd.as_ref().is_some_and(|d| d.to_string_lossy().contains(dir))
                })
                .unwrap()
        };
        assert!(position("Gen-1.0", "make install") < position("Top-1.0", "perl Makefile.PL"));
        assert!(position("Top-1.0", "perl Makefile.PL") < position("Dep-1.0", "make install"));
    }

    #[test]
    fn unresolvable_prereq_fails_and_is_recorded() {
        let fx = Fixture::new();
        let index = FixtureIndex::new()
            .with_distribution(fx.dist("Top", "Top-1.0").requires(Phase::BuildTest, "Ghost"));
        let runner = MockRunner::new();

        let mut installer = PrereqInstaller::new(fx.ctx(&index, &runner));
        let mut top = index.resolve("Top").unwrap();
        let err = installer.ensure_installed(&mut top).unwrap_err();

        assert!(matches!(err, RevdepError::PrereqInstallFailure { ref prereq, .. } if prereq == "Ghost"));
        assert!(matches!(
            installer.take_events().as_slice(),
            [PrereqEvent::Unresolved { prereq, .. }] if prereq == "Ghost"
        ));
    }

    #[test]
    fn deep_failure_aborts_the_whole_subtree() {
        let fx = Fixture::new();
        let index = FixtureIndex::new()
            .with_distribution(
                fx.dist("Top", "Top-1.0")
                    .requires(Phase::BuildTest, "Mid")
                    .requires(Phase::BuildTest, "Other"),
            )
            .with_distribution(fx.dist("Mid", "Mid-1.0").requires(Phase::BuildTest, "Leaf"))
            .with_distribution(fx.dist("Leaf", "Leaf-1.0"))
            .with_distribution(fx.dist("Other", "Other-1.0"));
        let runner = MockRunner::new();
        runner.respond_in(
            "Leaf-1.0",
            "perl Makefile.PL",
            CommandResult::failure(Some(1), "OS unsupported"),
        );

        let mut installer = PrereqInstaller::new(fx.ctx(&index, &runner));
        let mut top = index.resolve("Top").unwrap();
        let err = installer.ensure_installed(&mut top).unwrap_err();

        match err {
            RevdepError::PrereqInstallFailure { prereq, message, .. } => {
                assert_eq!(prereq, "Leaf");
                assert!(message.contains("OS unsupported"));
            }
            other => panic!("expected PrereqInstallFailure, got {other:?}"),
        }
        assert_eq!(runner.count_in("Mid-1.0", "make install"), 0);
        assert_eq!(runner.count_in("Other-1.0", "perl Makefile.PL"), 0);
    }

    #[test]
    fn failed_prereq_fails_every_later_dependent() {
        let fx = Fixture::new();
        let index = FixtureIndex::new()
            .with_distribution(fx.dist("A", "A-1.0").requires(Phase::BuildTest, "Broken"))
            .with_distribution(fx.dist("B", "B-1.0").requires(Phase::Configure, "Broken"))
            .with_distribution(fx.dist("Broken", "Broken-1.0"));
        let runner = MockRunner::new();
        runner.respond_in("Broken-1.0", "make install", CommandResult::failure(Some(2), "denied"));

        let mut installer = PrereqInstaller::new(fx.ctx(&index, &runner));
        for name in ["A", "B"] {
            let mut dist = index.resolve(name).unwrap();
            let err = installer.ensure_installed(&mut dist).unwrap_err();
            match err {
                RevdepError::PrereqInstallFailure { prereq, dist, message } => {
                    assert_eq!(prereq, "Broken");
                    assert_eq!(dist, format!("{}-1.0", name));
                    assert!(message.contains("denied"), "{}", message);
                }
                other => panic!("expected PrereqInstallFailure, got {other:?}"),
            }
        }

        assert_eq!(runner.count_in("Broken-1.0", "make install"), 1);
        assert!(!installer.is_visited("Broken-1.0"));
        assert!(installer.failure("Broken-1.0").is_some());
        assert!(installer.take_events().is_empty());
    }

    #[test]
    fn failure_is_remembered_for_every_failed_ancestor() {
        let fx = Fixture::new();
        let index = FixtureIndex::new()
            .with_distribution(fx.dist("Top", "Top-1.0").requires(Phase::BuildTest, "Mid"))
            .with_distribution(fx.dist("Mid", "Mid-1.0").requires(Phase::BuildTest, "Leaf"))
            .with_distribution(fx.dist("Leaf", "Leaf-1.0"));
        let runner = MockRunner::new();
        runner.respond_in("Leaf-1.0", "make", CommandResult::failure(Some(2), "no cc"));

        let mut installer = PrereqInstaller::new(fx.ctx(&index, &runner));
        let mut top = index.resolve("Top").unwrap();
        installer.ensure_installed(&mut top).unwrap_err();

        assert!(installer.failure("Leaf-1.0").is_some());
        assert!(installer.failure("Mid-1.0").is_some());
        assert!(installer.failure("Top-1.0").is_none());
        assert!(!installer.is_visited("Mid-1.0"));
    }

    #[test]
    fn generator_that_cannot_start_is_build_failure() {
        let fx = Fixture::new();
        let index = FixtureIndex::new().with_distribution(fx.dist("Top", "Top-1.0"));
        let runner = MockRunner::new();
        runner.fail_to_start("perl Makefile.PL");

        let mut installer = PrereqInstaller::new(fx.ctx(&index, &runner));
        let mut top = index.resolve("Top").unwrap();
        let err = installer.ensure_installed(&mut top).unwrap_err();

        match err {
            RevdepError::BuildFailure { dist, message } => {
                assert_eq!(dist, "Top-1.0");
                assert!(message.contains("os error"), "{}", message);
            }
            other => panic!("expected BuildFailure, got {other:?}"),
        }
    }

    #[test]
    fn top_level_generation_failure_is_build_failure() {
        let fx = Fixture::new();
        let index = FixtureIndex::new().with_distribution(fx.dist("Top", "Top-1.0"));
        let runner = MockRunner::new();
        runner.respond("perl Makefile.PL", CommandResult::failure(Some(1), "bad"));

        let mut installer = PrereqInstaller::new(fx.ctx(&index, &runner));
        let mut top = index.resolve("Top").unwrap();
        let err = installer.ensure_installed(&mut top).unwrap_err();

        assert!(matches!(err, RevdepError::BuildFailure { .. }));
    }

    #[test]
    fn installs_use_root_environment() {
        let fx = Fixture::new();
        let index = FixtureIndex::new()
            .with_distribution(fx.dist("Top", "Top-1.0").requires(Phase::BuildTest, "Dep"))
            .with_distribution(fx.dist("Dep", "Dep-1.0"));
        let runner = MockRunner::new();

        let mut installer = PrereqInstaller::new(fx.ctx(&index, &runner));
        let mut top = index.resolve("Top").unwrap();
        installer.ensure_installed(&mut top).unwrap();

        let install = runner
            .calls()
            .into_iter()
            .find(|c| c.command == "make install")
            .unwrap();
        assert_eq!(install.cwd.as_deref(), Some(fx.dir.path().join("Dep-1.0").as_path()));
        assert!(fx.root.env()["PERL_MM_OPT"].contains(&fx.root.path().display().to_string()));
    }

    #[test]
    fn event_lines_name_prereq_and_dependent() {
        let installed = PrereqEvent::Installed {
            prereq: "Shared::Prereq".into(),
            for_dist: "Good::Dist".into(),
        };
        assert_eq!(installed.to_string(), "Installed Shared::Prereq for Good::Dist");

        let unresolved = PrereqEvent::Unresolved {
            prereq: "Ghost".into(),
            for_dist: "Good::Dist".into(),
            reason: "not found".into(),
        };
        assert_eq!(
            unresolved.to_string(),
            "Could not resolve Ghost for Good::Dist: not found"
        );
    }
}
