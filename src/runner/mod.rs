//! Testing dependents.
//!
//! - [`outcome`] - per-name results and their classification
//! - [`filter`] - which dependents are worth testing
//! - [`worker`] - the shared run context and single-name processing
//! - [`orchestrator`] - sequential and pooled execution

pub mod filter;
pub mod orchestrator;
pub mod outcome;
pub mod worker;

pub use filter::DependentFilter;
pub use orchestrator::{Orchestrator, LOST_WORKER_REASON};
pub use outcome::{Outcome, OutcomeStatus};
pub use worker::{RunContext, Worker};
