//! Test plan output and log writing.

use std::fmt;
use std::io::Write;

use crate::error::Result;
use crate::runner::{Outcome, OutcomeStatus};

use super::RunLogs;

/// Width of the rule separating a failure's summary from its output.
const SEPARATOR_WIDTH: usize = 50;

/// Tally of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Assertions announced in the plan.
    pub planned: usize,
    /// PASS outcomes.
    pub passed: usize,
    /// WARN outcomes.
    pub warned: usize,
    /// FAIL outcomes.
    pub failed: usize,
    /// SKIP and UNKNOWN outcomes.
    pub skipped: usize,
}

impl RunSummary {
    fn record(&mut self, status: OutcomeStatus) {
        match status {
            OutcomeStatus::Pass => self.passed += 1,
            OutcomeStatus::Warn => self.warned += 1,
            OutcomeStatus::Fail => self.failed += 1,
            OutcomeStatus::Skip | OutcomeStatus::Unknown => self.skipped += 1,
        }
    }

    /// Outcomes recorded so far.
    pub fn reported(&self) -> usize {
        self.passed + self.warned + self.failed + self.skipped
    }

    /// No assertion failed.
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} planned: {} passed, {} warned, {} failed, {} skipped",
            self.planned, self.passed, self.warned, self.failed, self.skipped
        )
    }
}

/// Turns outcomes into test plan assertions and log lines.
///
/// There is one reporter per run, owned by whoever consumes outcomes,
/// so every sink has exactly one writer.
pub struct Reporter<W: Write> {
    out: W,
    logs: RunLogs,
    summary: RunSummary,
}

impl<W: Write> Reporter<W> {
    /// Create a reporter writing the plan to `out`.
    pub fn new(out: W, logs: RunLogs) -> Self {
        Self {
            out,
            logs,
            summary: RunSummary::default(),
        }
    }

    /// Announce how many assertions follow.
    pub fn plan(&mut self, count: usize) -> Result<()> {
        self.summary.planned = count;
        writeln!(self.out, "1..{}", count)?;
        self.out.flush()?;
        Ok(())
    }

    /// Record one outcome: one assertion, one status line, one error log
    /// entry and any prerequisite lines.
    pub fn report(&mut self, outcome: &Outcome) -> Result<()> {
        self.summary.record(outcome.status);
        let number = self.summary.reported();

        let assertion = match outcome.status {
            OutcomeStatus::Pass | OutcomeStatus::Warn => {
                format!("ok {} - {}", number, outcome.summary())
            }
            OutcomeStatus::Fail => format!("not ok {} - {}", number, outcome.summary()),
            OutcomeStatus::Skip | OutcomeStatus::Unknown => format!(
                "ok {} # skip {}: {} ({})",
                number,
                outcome.status,
                outcome.name,
                outcome.reason.as_deref().unwrap_or("no reason given")
            ),
        };
        writeln!(self.out, "{}", assertion)?;
        self.out.flush()?;

        self.logs.status.write_line(&outcome.status_line())?;

        match outcome.status {
            OutcomeStatus::Pass | OutcomeStatus::Warn => self.logs.error.write_line("")?,
            _ => {
                let entry = format!(
                    "{}\n{}\n{}",
                    outcome.status_line(),
                    "-".repeat(SEPARATOR_WIDTH),
                    outcome.output.trim_end()
                );
                self.logs.error.write_line(&entry)?;
            }
        }

        for event in &outcome.events {
            self.logs.prereq.write_line(&event.to_string())?;
        }
        Ok(())
    }

    /// Close the plan with a summary comment.
    pub fn finish(&mut self) -> Result<RunSummary> {
        writeln!(self.out, "# {}", self.summary)?;
        self.out.flush()?;
        Ok(self.summary)
    }

    /// Tally so far.
    pub fn summary(&self) -> RunSummary {
        self.summary
    }

    /// Give back the plan writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}
