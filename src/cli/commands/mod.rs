//! CLI command implementations.
//!
//! Each command implements the [`Command`] trait, which provides a uniform
//! interface for executing commands and reporting results.
//!
//! # Architecture
//!
//! Commands are dispatched via [`CommandDispatcher`], which routes CLI
//! subcommands to their implementations. [`Session`] carries what they
//! share: config discovery, index selection and the test run itself.

pub mod completions;
pub mod dispatcher;
pub mod list;
pub mod run;
pub mod session;

pub use dispatcher::{Command, CommandDispatcher, CommandResult};
pub use session::Session;
