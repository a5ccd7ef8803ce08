//! Output mode and the sink for upstream tool output.

use std::io::Write;
use std::path::Path;
use std::str::FromStr;
use std::sync::Mutex;

use crate::shell::OutputLine;

/// Output verbosity mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Echo everything the build tools and the index client print.
    Verbose,
    /// Show progress and the final summary.
    #[default]
    Normal,
    /// Show only the test plan.
    Quiet,
}

impl FromStr for OutputMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "verbose" => Ok(Self::Verbose),
            "normal" => Ok(Self::Normal),
            "quiet" => Ok(Self::Quiet),
            _ => Err(format!("unknown output mode: {}", s)),
        }
    }
}

impl OutputMode {
    /// Check if this mode shows upstream tool output.
    pub fn shows_tool_output(&self) -> bool {
        matches!(self, Self::Verbose)
    }

    /// Check if this mode shows a progress bar.
    pub fn shows_progress(&self) -> bool {
        matches!(self, Self::Normal)
    }

    /// Check if this mode shows the coloured summary.
    pub fn shows_summary(&self) -> bool {
        !matches!(self, Self::Quiet)
    }
}

/// Receives everything upstream tools would print.
///
/// The shell runner and the index client are handed one of these instead of
/// writing to the terminal themselves; which one is chosen by the verbosity
/// option.
pub trait ToolOutput: Send + Sync {
    /// A command is about to run.
    fn command_started(&self, command: &str, cwd: Option<&Path>);

    /// A line of output from a running command.
    fn line(&self, line: &OutputLine);

    /// The index client is about to make a request.
    fn index_request(&self, url: &str);
}

/// Discards all tool output.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentOutput;

impl ToolOutput for SilentOutput {
    fn command_started(&self, _command: &str, _cwd: Option<&Path>) {}

    fn line(&self, _line: &OutputLine) {}

    fn index_request(&self, _url: &str) {}
}

/// Echoes tool output to a writer, one whole line per write.
pub struct EchoOutput<W: Write + Send> {
    writer: Mutex<W>,
}

impl EchoOutput<std::io::Stderr> {
    /// Echo to stderr so the test plan on stdout stays clean.
    pub fn stderr() -> Self {
        Self::new(std::io::stderr())
    }
}

impl<W: Write + Send> EchoOutput<W> {
    /// Echo to an arbitrary writer.
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Consume the sink, returning the writer.
    pub fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn write_line(&self, text: &str) {
        let mut writer = self
            .writer
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let _ = writeln!(writer, "{}", text);
    }
}

impl<W: Write + Send> ToolOutput for EchoOutput<W> {
    fn command_started(&self, command: &str, cwd: Option<&Path>) {
        match cwd {
            Some(dir) => self.write_line(&format!("$ {} (in {})", command, dir.display())),
            None => self.write_line(&format!("$ {}", command)),
        }
    }

    fn line(&self, line: &OutputLine) {
        self.write_line(line.text());
    }

    fn index_request(&self, url: &str) {
        self.write_line(&format!("GET {}", url));
    }
}

/// Pick the tool output sink for an output mode.
pub fn tool_output_for(mode: OutputMode) -> std::sync::Arc<dyn ToolOutput> {
    if mode.shows_tool_output() {
        std::sync::Arc::new(EchoOutput::stderr())
    } else {
        std::sync::Arc::new(SilentOutput)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_mode_parses_case_insensitively() {
        assert_eq!("VERBOSE".parse::<OutputMode>(), Ok(OutputMode::Verbose));
        assert!("loud".parse::<OutputMode>().is_err());
    }

    #[test]
    fn only_verbose_shows_tool_output() {
        assert!(OutputMode::Verbose.shows_tool_output());
        assert!(!OutputMode::Normal.shows_tool_output());
        assert!(!OutputMode::Quiet.shows_tool_output());
    }

    #[test]
    fn quiet_hides_summary_and_progress() {
        assert!(!OutputMode::Quiet.shows_summary());
        assert!(!OutputMode::Quiet.shows_progress());
    }

    #[test]
    fn echo_output_writes_commands_and_lines() {
        let sink = EchoOutput::new(Vec::new());
        sink.command_started("make test", Some(Path::new("/work/Foo-1.0")));
        sink.line(&OutputLine::Stderr("t/01.t .. ok".into()));
        sink.index_request("https://index.test/module/Foo");

        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(
            text,
            "$ make test (in /work/Foo-1.0)\nt/01.t .. ok\nGET https://index.test/module/Foo\n"
        );
    }
}
