//! Per-distribution results.

use std::fmt;

use crate::build::TestRun;
use crate::index::Distribution;
use crate::requirements::PrereqEvent;

/// Classification of one tested distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutcomeStatus {
    /// Tests passed quietly.
    Pass,
    /// Tests passed but wrote to stderr.
    Warn,
    /// Generation or tests failed.
    Fail,
    /// Could not be attempted, e.g. a prerequisite failed.
    Skip,
    /// The name did not resolve against the index.
    Unknown,
}

impl OutcomeStatus {
    /// Upper-case label used in logs and the test plan.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Warn => "WARN",
            Self::Fail => "FAIL",
            Self::Skip => "SKIP",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Whether the test plan records this as a passing assertion.
    pub fn is_ok(&self) -> bool {
        !matches!(self, Self::Fail)
    }

    /// Whether the test plan records this as a skipped assertion.
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skip | Self::Unknown)
    }
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What happened to one requested name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// The requested name.
    pub name: String,
    /// Classification.
    pub status: OutcomeStatus,
    /// Base id of the resolved distribution.
    pub base_id: Option<String>,
    /// Releasing author of the resolved distribution.
    pub author: Option<String>,
    /// Why it was skipped, unknown or failed before testing.
    pub reason: Option<String>,
    /// Combined stdout and stderr of the last step run.
    pub output: String,
    /// Stderr of the test step, noise filtered.
    pub stderr: String,
    /// Prerequisite activity on behalf of this name.
    pub events: Vec<PrereqEvent>,
}

impl Outcome {
    fn bare(name: impl Into<String>, status: OutcomeStatus) -> Self {
        Self {
            name: name.into(),
            status,
            base_id: None,
            author: None,
            reason: None,
            output: String::new(),
            stderr: String::new(),
            events: Vec::new(),
        }
    }

    fn for_dist(dist: &Distribution, status: OutcomeStatus) -> Self {
        Self {
            base_id: Some(dist.base_id.clone()),
            author: Some(dist.author.clone()),
            ..Self::bare(&dist.name, status)
        }
    }

    /// Classify a finished build and test run.
    pub fn tested(dist: &Distribution, run: TestRun) -> Self {
        let status = if !run.passed {
            OutcomeStatus::Fail
        } else if run.is_noisy() {
            OutcomeStatus::Warn
        } else {
            OutcomeStatus::Pass
        };
        Self {
            output: run.output,
            stderr: run.stderr,
            ..Self::for_dist(dist, status)
        }
    }

    /// A distribution whose build files could not be generated.
    pub fn build_failed(dist: &Distribution, output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            ..Self::for_dist(dist, OutcomeStatus::Fail)
        }
    }

    /// A resolved distribution that could not be attempted.
    pub fn skipped(dist: &Distribution, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self {
            output: reason.clone(),
            reason: Some(reason),
            ..Self::for_dist(dist, OutcomeStatus::Skip)
        }
    }

    /// A name the index could not resolve.
    pub fn unknown(name: impl Into<String>, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self {
            output: reason.clone(),
            reason: Some(reason),
            ..Self::bare(name, OutcomeStatus::Unknown)
        }
    }

    /// A name that was never processed to completion.
    pub fn failed(name: impl Into<String>, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self {
            output: reason.clone(),
            reason: Some(reason),
            ..Self::bare(name, OutcomeStatus::Fail)
        }
    }

    /// Attach prerequisite events.
    pub fn with_events(mut self, events: Vec<PrereqEvent>) -> Self {
        self.events = events;
        self
    }

    /// `name - base_id - author` once resolved, just the name otherwise.
    pub fn summary(&self) -> String {
        match (&self.base_id, &self.author) {
            (Some(base_id), Some(author)) => format!("{} - {} - {}", self.name, base_id, author),
            _ => self.name.clone(),
        }
    }

    /// Line for the status log.
    pub fn status_line(&self) -> String {
        match (&self.reason, self.status) {
            (Some(reason), OutcomeStatus::Skip | OutcomeStatus::Unknown) => {
                format!("{}: {} ({})", self.status, self.summary(), reason)
            }
            _ => format!("{}: {}", self.status, self.summary()),
        }
    }
}
