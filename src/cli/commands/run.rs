//! Run command implementation.
//!
//! The `revdep run` command tests an explicit list of distributions.
//! Named distributions are taken as given: the dependent filter only
//! applies to lists discovered through the index.

use std::io::Write;

use crate::cli::args::RunArgs;
use crate::error::Result;
use crate::ui::OutputMode;

use super::dispatcher::{Command, CommandResult};
use super::session::Session;

/// The run command implementation.
pub struct RunCommand<'a> {
    session: Session<'a>,
    args: RunArgs,
}

impl<'a> RunCommand<'a> {
    /// Create a new run command.
    pub fn new(session: Session<'a>, args: RunArgs) -> Self {
        Self { session, args }
    }

    /// Get the command arguments.
    pub fn args(&self) -> &RunArgs {
        &self.args
    }
}

impl Command for RunCommand<'_> {
    fn execute(&self, out: &mut dyn Write) -> Result<CommandResult> {
        let verbose = self.session.mode == OutputMode::Verbose;
        let config = self.session.config(self.args.options.overrides(verbose))?;
        let index = self.session.index(&config)?;
        let names = self.args.names.clone();

        let target = match names.as_slice() {
            [only] => only.clone(),
            _ => "run".to_string(),
        };
        self.session.test_names(names, &target, &config, index, out)
    }
}
