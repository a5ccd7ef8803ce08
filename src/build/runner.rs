//! Build and test a distribution's source.

use regex::Regex;
use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

use crate::shell::{CommandOptions, CommandResult, CommandRunner};

use super::BuildKind;

/// Markers a test harness prints when everything passed, or when there
/// was nothing to test.
static SUCCESS_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^Result: (?:PASS|NOTESTS)\b|^All tests successful|No tests defined")
        .expect("SUCCESS_MARKER must compile")
});

/// The diagnostic banner many test suites print to stderr on every run.
static TESTING_BANNER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\A#\s*Testing \S+ \S+, [Pp]erl \S+, [^\n]+\n?\z")
        .expect("TESTING_BANNER must compile")
});

/// Result of building and testing one source directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestRun {
    /// Whether the tests passed.
    pub passed: bool,
    /// Stdout and stderr of the failing or final step, interleaved.
    pub output: String,
    /// Stderr of the test step, with the testing banner filtered out.
    pub stderr: String,
    /// Build system that was used.
    pub kind: BuildKind,
    /// Whether the test step ran at all.
    pub tests_ran: bool,
}

impl TestRun {
    fn not_run(kind: BuildKind, output: String) -> Self {
        Self {
            passed: false,
            output,
            stderr: String::new(),
            kind,
            tests_ran: false,
        }
    }

    /// Passed, but wrote something to stderr.
    pub fn is_noisy(&self) -> bool {
        self.passed && !self.stderr.trim().is_empty()
    }
}

/// Generate build files, then run the test suite in `source_dir`.
///
/// Every command runs with its working directory set to `source_dir`;
/// the caller's directory is untouched. Commands that fail to start are
/// reported as a failed run with the error as output, never as an `Err`.
pub fn run_tests(
    runner: &dyn CommandRunner,
    source_dir: &Path,
    env: &HashMap<String, String>,
) -> TestRun {
    let kind = BuildKind::detect(source_dir);
    let options = CommandOptions::in_dir(source_dir, env);

    let configure = kind.configure_command();
    match runner.run(configure, &options) {
        Ok(result) if result.success => {}
        Ok(result) => return TestRun::not_run(kind, failure_output(configure, &result)),
        Err(e) => return TestRun::not_run(kind, e.to_string()),
    }

    let test = kind.test_command();
    let result = match runner.run(test, &options) {
        Ok(result) => result,
        Err(e) => return TestRun::not_run(kind, e.to_string()),
    };

    let passed = result.success && looks_successful(&result.combined);
    tracing::debug!(
        "{} in {} exited {:?} after {:.1?}, passed={}",
        test,
        source_dir.display(),
        result.exit_code,
        result.duration,
        passed
    );

    TestRun {
        passed,
        stderr: filter_noise(&result.stderr),
        output: result.combined,
        kind,
        tests_ran: true,
    }
}

/// Whether clean-exit output reads as a pass.
///
/// A harness that exits zero without a recognised marker is not trusted.
pub fn looks_successful(output: &str) -> bool {
    output.trim().is_empty() || SUCCESS_MARKER.is_match(output)
}

/// Drop stderr that consists of nothing but the testing banner.
pub fn filter_noise(stderr: &str) -> String {
    if TESTING_BANNER.is_match(stderr) {
        String::new()
    } else {
        stderr.to_string()
    }
}

fn failure_output(command: &str, result: &CommandResult) -> String {
    if result.combined.trim().is_empty() {
        format!("{} exited with code {:?}", command, result.exit_code)
    } else {
        result.combined.clone()
    }
}
