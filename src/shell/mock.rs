//! Scripted command runner for testing.
//!
//! `MockRunner` implements [`CommandRunner`] without spawning anything. It
//! records every command together with its working directory and answers
//! from a list of rules, so installer and orchestrator behaviour can be
//! asserted on precisely.
//!
//! # Example
//!
//! ```
//! use revdep::shell::{CommandOptions, CommandResult, CommandRunner, MockRunner};
//!
//! let runner = MockRunner::new();
//! runner.respond("make test", CommandResult::failure(Some(2), "t/basic.t fails"));
//!
//! let result = runner.run("make test", &CommandOptions::default()).unwrap();
//! assert!(!result.success);
//! assert_eq!(runner.count_matching("make test"), 1);
//! ```

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::{RevdepError, Result};

use super::{CommandOptions, CommandResult, CommandRunner};

/// Prefix of the command used to probe whether a module is loadable.
const PROBE_PREFIX: &str = "perl -M";

/// One command seen by the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    /// The command string.
    pub command: String,
    /// Working directory it was run in.
    pub cwd: Option<PathBuf>,
}

#[derive(Debug, Clone)]
struct Rule {
    dir_fragment: Option<String>,
    command_fragment: String,
    response: Option<CommandResult>,
}

impl Rule {
    fn matches(&self, command: &str, cwd: Option<&PathBuf>) -> bool {
        if !command.contains(&self.command_fragment) {
            return false;
        }
        match &self.dir_fragment {
            Some(fragment) => cwd.is_some_and(|dir| dir.to_string_lossy().contains(fragment)),
            None => true,
        }
    }
}

/// Mock command runner.
///
/// Later rules take precedence over earlier ones. Commands without a
/// matching rule succeed with empty output, except module probes
/// (`perl -M<Name> -e 1`), which fail unless the module was registered
/// with [`mark_installed`](Self::mark_installed).
#[derive(Debug, Default)]
pub struct MockRunner {
    rules: Mutex<Vec<Rule>>,
    calls: Mutex<Vec<RecordedCall>>,
    installed: Mutex<HashSet<String>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockRunner {
    /// Create a mock where every command succeeds silently.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer commands containing `command_fragment` with `response`.
    pub fn respond(&self, command_fragment: &str, response: CommandResult) {
        lock(&self.rules).push(Rule {
            dir_fragment: None,
            command_fragment: command_fragment.to_string(),
            response: Some(response),
        });
    }

    /// Answer commands containing `command_fragment` run in a directory
    /// whose path contains `dir_fragment`.
    pub fn respond_in(&self, dir_fragment: &str, command_fragment: &str, response: CommandResult) {
        lock(&self.rules).push(Rule {
            dir_fragment: Some(dir_fragment.to_string()),
            command_fragment: command_fragment.to_string(),
            response: Some(response),
        });
    }

    /// Make matching commands fail to start, as if the binary were missing.
    pub fn fail_to_start(&self, command_fragment: &str) {
        lock(&self.rules).push(Rule {
            dir_fragment: None,
            command_fragment: command_fragment.to_string(),
            response: None,
        });
    }

    /// Report `module` as loadable from now on.
    pub fn mark_installed(&self, module: &str) {
        lock(&self.installed).insert(module.to_string());
    }

    /// Every command run so far, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.calls).clone()
    }

    /// Number of recorded commands containing `fragment`.
    pub fn count_matching(&self, fragment: &str) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|call| call.command.contains(fragment))
            .count()
    }

    /// Number of recorded commands containing `fragment` run in a
    /// directory whose path contains `dir_fragment`.
    pub fn count_in(&self, dir_fragment: &str, fragment: &str) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|call| {
                call.command.contains(fragment)
                    && call
                        .cwd
                        .as_ref()
                        .is_some_and(|dir| dir.to_string_lossy().contains(dir_fragment))
            })
            .count()
    }

    fn probe(&self, command: &str) -> CommandResult {
        let module = command
            .trim_start_matches(PROBE_PREFIX)
            .split_whitespace()
            .next()
            .unwrap_or_default();
        if lock(&self.installed).contains(module) {
            CommandResult::success("")
        } else {
            CommandResult::failure(Some(2), format!("Can't locate {} in @INC", module))
        }
    }
}

impl CommandRunner for MockRunner {
    fn run(&self, command: &str, options: &CommandOptions) -> Result<CommandResult> {
        lock(&self.calls).push(RecordedCall {
            command: command.to_string(),
            cwd: options.cwd.clone(),
        });

        let rule = lock(&self.rules)
            .iter()
            .rev()
            .find(|rule| rule.matches(command, options.cwd.as_ref()))
            .cloned();

        match rule {
            Some(Rule {
                response: Some(response),
                ..
            }) => Ok(response),
            Some(Rule { response: None, .. }) => Err(RevdepError::CommandFailed {
                command: command.to_string(),
                code: None,
                message: "No such file or directory (os error 2)".to_string(),
            }),
            None if command.starts_with(PROBE_PREFIX) => Ok(self.probe(command)),
            None => Ok(CommandResult::success("")),
        }
    }
}
