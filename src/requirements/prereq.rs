//! Declared prerequisites and their satisfaction check.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use crate::shell::{CommandOptions, CommandRunner};

/// Module names that are safe to interpolate into a probe command.
static MODULE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(?:(?:::|')[A-Za-z0-9_]+)*$")
        .expect("MODULE_NAME must compile")
});

/// Name of the runtime pseudo-dependency.
pub const RUNTIME: &str = "perl";

/// Point in the build lifecycle a requirement must be satisfied by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Needed to run the build-script generator.
    Configure,
    /// Needed to build and run the test suite.
    #[serde(alias = "build", alias = "test")]
    BuildTest,
}

impl Phase {
    /// Phases in the order their requirements are installed.
    pub const ALL: [Phase; 2] = [Phase::Configure, Phase::BuildTest];

    /// Map a metadata phase name onto a phase.
    ///
    /// Runtime requirements are needed to load the distribution in its
    /// tests, so they count as build/test. `develop` requirements are
    /// never installed.
    pub fn from_metadata(phase: &str) -> Option<Self> {
        match phase {
            "configure" => Some(Self::Configure),
            "build" | "test" | "runtime" => Some(Self::BuildTest),
            _ => None,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Configure => write!(f, "configure"),
            Phase::BuildTest => write!(f, "build/test"),
        }
    }
}

/// A requirement a distribution declares for one phase.
///
/// Whether it is satisfied is computed on demand by [`is_satisfied`](Self::is_satisfied);
/// it is never stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PrereqRequirement {
    /// Module name.
    pub name: String,
    /// Phase that needs it.
    pub phase: Phase,
}

impl PrereqRequirement {
    /// Create a requirement.
    pub fn new(name: impl Into<String>, phase: Phase) -> Self {
        Self {
            name: name.into(),
            phase,
        }
    }

    /// Whether this is the dependency on the runtime itself.
    pub fn is_runtime(&self) -> bool {
        self.name == RUNTIME
    }

    /// Command that exits zero when the module can be loaded.
    ///
    /// `None` for names that are not plain module names.
    pub fn probe_command(&self) -> Option<String> {
        MODULE_NAME
            .is_match(&self.name)
            .then(|| format!("perl -M{} -e 1", self.name))
    }

    /// Whether the requirement is already available under `env`.
    ///
    /// The runtime is always satisfied. A probe that cannot even be run
    /// counts as unsatisfied.
    pub fn is_satisfied(&self, runner: &dyn CommandRunner, env: &HashMap<String, String>) -> bool {
        if self.is_runtime() {
            return true;
        }
        let Some(probe) = self.probe_command() else {
            return false;
        };
        let options = CommandOptions {
            cwd: None,
            env: env.clone(),
        };
        runner
            .run(&probe, &options)
            .map(|result| result.success)
            .unwrap_or(false)
    }
}

impl fmt::Display for PrereqRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.phase)
    }
}
