//! Run reporting.
//!
//! - [`sink`] - append-only status, error and prereq logs
//! - [`reporter`] - TAP assertions, log lines and the final tally

pub mod reporter;
pub mod sink;

pub use reporter::{Reporter, RunSummary};
pub use sink::{run_id, LogSink, RunLogs};
