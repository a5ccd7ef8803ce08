//! List command implementation.
//!
//! The `revdep list` command prints the dependents `revdep test` would
//! test, one per line.

use std::io::Write;

use crate::cli::args::ListArgs;
use crate::error::Result;

use super::dispatcher::{Command, CommandResult};
use super::session::Session;

/// The list command implementation.
pub struct ListCommand<'a> {
    session: Session<'a>,
    args: ListArgs,
}

impl<'a> ListCommand<'a> {
    /// Create a new list command.
    pub fn new(session: Session<'a>, args: ListArgs) -> Self {
        Self { session, args }
    }

    /// Get the command arguments.
    pub fn args(&self) -> &ListArgs {
        &self.args
    }
}

impl Command for ListCommand<'_> {
    fn execute(&self, out: &mut dyn Write) -> Result<CommandResult> {
        let config = self.session.config(self.args.index.overrides())?;
        let index = self.session.index(&config)?;
        let filter = self.session.filter(&config)?;

        let dependents = filter.apply(index.reverse_dependents(&self.args.package)?);
        for name in &dependents {
            writeln!(out, "{}", name)?;
        }
        tracing::debug!("{} dependents of {}", dependents.len(), self.args.package);
        Ok(CommandResult::success())
    }
}
