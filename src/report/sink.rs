//! Append-only log files.

use chrono::{DateTime, Local};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// One log destination.
#[derive(Debug)]
pub enum LogSink {
    /// No log directory configured: lines are dropped, not buffered.
    Discard,
    /// Lines are appended to a file.
    File {
        path: PathBuf,
        file: File,
        /// Hold an exclusive lock around every write.
        locked: bool,
    },
}

impl LogSink {
    /// Open `path` for appending, creating it if needed.
    pub fn append(path: PathBuf, locked: bool) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self::File { path, file, locked })
    }

    /// Where the lines go, if anywhere.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Discard => None,
            Self::File { path, .. } => Some(path),
        }
    }

    /// Append `line` plus a newline in a single write.
    pub fn write_line(&mut self, line: &str) -> Result<()> {
        let Self::File { file, locked, .. } = self else {
            return Ok(());
        };
        let mut buf = String::with_capacity(line.len() + 1);
        buf.push_str(line);
        buf.push('\n');

        if *locked {
            file.lock_exclusive()?;
            let written = file.write_all(buf.as_bytes());
            FileExt::unlock(file)?;
            written?;
        } else {
            file.write_all(buf.as_bytes())?;
        }
        Ok(())
    }
}

/// The three logs of a run.
#[derive(Debug)]
pub struct RunLogs {
    /// One line per outcome.
    pub status: LogSink,
    /// Full output of failures.
    pub error: LogSink,
    /// Prerequisites installed or left unresolved.
    pub prereq: LogSink,
}

impl RunLogs {
    /// Logs that go nowhere.
    pub fn discard() -> Self {
        Self {
            status: LogSink::Discard,
            error: LogSink::Discard,
            prereq: LogSink::Discard,
        }
    }

    /// Open `<dir>/<run_id>-{status,error,prereq}.log`, or discard
    /// everything when no directory is given.
    pub fn open(dir: Option<&Path>, run_id: &str, locked: bool) -> Result<Self> {
        let Some(dir) = dir else {
            return Ok(Self::discard());
        };
        fs::create_dir_all(dir)?;
        let sink = |kind: &str| LogSink::append(dir.join(format!("{}-{}.log", run_id, kind)), locked);
        Ok(Self {
            status: sink("status")?,
            error: sink("error")?,
            prereq: sink("prereq")?,
        })
    }
}

/// Identifier naming a run's log files: sanitised target, timestamp and pid.
pub fn run_id(target: &str, started: DateTime<Local>, pid: u32) -> String {
    let mut safe = String::with_capacity(target.len());
    for c in target.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            safe.push(c);
        } else if !safe.is_empty() && !safe.ends_with('-') {
            safe.push('-');
        }
    }
    let target = safe.trim_end_matches('-');
    let target = if target.is_empty() { "run" } else { target };
    format!("{}-{}-{}", target, started.format("%Y%m%d-%H%M%S"), pid)
}
