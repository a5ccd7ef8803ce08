//! Shell command execution.

use crate::error::{RevdepError, Result};
use crate::ui::ToolOutput;
use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Result of executing a shell command.
#[derive(Debug, Clone, Default)]
pub struct CommandResult {
    /// Exit code (None if killed by signal).
    pub exit_code: Option<i32>,

    /// Standard output.
    pub stdout: String,

    /// Standard error.
    pub stderr: String,

    /// Stdout and stderr interleaved in the order lines arrived.
    pub combined: String,

    /// Execution duration.
    pub duration: Duration,

    /// Whether command succeeded (exit code 0).
    pub success: bool,
}

impl CommandResult {
    /// Create a success result with only stdout.
    pub fn success(stdout: impl Into<String>) -> Self {
        let stdout = stdout.into();
        Self {
            exit_code: Some(0),
            combined: stdout.clone(),
            stdout,
            success: true,
            ..Default::default()
        }
    }

    /// Create a failure result with the given exit code and stderr.
    pub fn failure(exit_code: Option<i32>, stderr: impl Into<String>) -> Self {
        let stderr = stderr.into();
        Self {
            exit_code,
            combined: stderr.clone(),
            stderr,
            success: false,
            ..Default::default()
        }
    }
}

/// Options for command execution.
#[derive(Debug, Clone, Default)]
pub struct CommandOptions {
    /// Working directory of the child. The parent's directory is never changed.
    pub cwd: Option<PathBuf>,

    /// Environment variables (merged with the inherited environment).
    pub env: HashMap<String, String>,
}

impl CommandOptions {
    /// Options running in `cwd` with the given environment overrides.
    pub fn in_dir(cwd: impl Into<PathBuf>, env: &HashMap<String, String>) -> Self {
        Self {
            cwd: Some(cwd.into()),
            env: env.clone(),
        }
    }
}

/// Output line from command execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputLine {
    Stdout(String),
    Stderr(String),
}

impl OutputLine {
    /// The text of the line without its stream tag.
    pub fn text(&self) -> &str {
        match self {
            Self::Stdout(s) | Self::Stderr(s) => s,
        }
    }
}

/// Something that can run a shell command to completion.
///
/// The build/test runner and the prerequisite installer only ever talk to
/// this trait, so tests can script results with [`MockRunner`](super::MockRunner).
pub trait CommandRunner: Send + Sync {
    /// Run `command` and capture its output. An `Err` means the command
    /// could not be started at all; a non-zero exit is an `Ok` result.
    fn run(&self, command: &str, options: &CommandOptions) -> Result<CommandResult>;
}

/// Runs commands through the platform shell and forwards their output
/// to a [`ToolOutput`] sink.
pub struct ShellRunner {
    output: Arc<dyn ToolOutput>,
}

impl ShellRunner {
    /// Create a runner that reports tool output to `output`.
    pub fn new(output: Arc<dyn ToolOutput>) -> Self {
        Self { output }
    }
}

impl CommandRunner for ShellRunner {
    fn run(&self, command: &str, options: &CommandOptions) -> Result<CommandResult> {
        self.output.command_started(command, options.cwd.as_deref());
        execute(command, options, &|line| self.output.line(line))
    }
}

/// Execute a shell command, streaming each output line to `on_line`.
///
/// Stdin is closed so that configure scripts asking questions take their
/// defaults instead of blocking.
pub fn execute(
    command: &str,
    options: &CommandOptions,
    on_line: &dyn Fn(&OutputLine),
) -> Result<CommandResult> {
    let start = Instant::now();

    let (shell, flag) = shell_invocation();
    let mut cmd = Command::new(shell);
    cmd.arg(flag).arg(command);

    if let Some(cwd) = &options.cwd {
        cmd.current_dir(cwd);
    }
    cmd.envs(&options.env);

    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    let spawn_failed = |message: String| RevdepError::CommandFailed {
        command: command.to_string(),
        code: None,
        message,
    };

    let mut child = cmd.spawn().map_err(|e| {
        tracing::debug!("Failed to spawn '{}': {}", command, e);
        spawn_failed(e.to_string())
    })?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| spawn_failed("stdout was not captured".to_string()))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| spawn_failed("stderr was not captured".to_string()))?;

    let (tx, rx) = mpsc::channel();
    let tx_stderr = tx.clone();

    let stdout_handle = thread::spawn(move || forward_lines(stdout, &tx, OutputLine::Stdout));
    let stderr_handle =
        thread::spawn(move || forward_lines(stderr, &tx_stderr, OutputLine::Stderr));

    let mut result = CommandResult::default();
    for line in rx {
        on_line(&line);
        let target = match &line {
            OutputLine::Stdout(_) => &mut result.stdout,
            OutputLine::Stderr(_) => &mut result.stderr,
        };
        target.push_str(line.text());
        target.push('\n');
        result.combined.push_str(line.text());
        result.combined.push('\n');
    }

    let _ = stdout_handle.join();
    let _ = stderr_handle.join();

    let status = child.wait().map_err(|e| spawn_failed(e.to_string()))?;

    result.duration = start.elapsed();
    result.exit_code = status.code();
    result.success = status.success();
    Ok(result)
}

/// Read `reader` line by line, sending each line tagged by `wrap`.
///
/// Invalid UTF-8 is replaced rather than ending the stream early.
fn forward_lines<R: Read>(reader: R, tx: &mpsc::Sender<OutputLine>, wrap: fn(String) -> OutputLine) {
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) | Err(_) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                let line = line.trim_end_matches(['\n', '\r']).to_string();
                if tx.send(wrap(line)).is_err() {
                    break;
                }
            }
        }
    }
}

/// Shell binary and the flag that passes it a command string.
///
/// Build tools run through a plain non-login shell: a login shell would
/// source user profiles that can override `PERL5LIB` and `PATH`.
fn shell_invocation() -> (String, &'static str) {
    if cfg!(target_os = "windows") {
        (
            std::env::var("COMSPEC").unwrap_or_else(|_| "cmd.exe".to_string()),
            "/C",
        )
    } else {
        ("/bin/sh".to_string(), "-c")
    }
}
