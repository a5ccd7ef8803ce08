//! revdep - Test the dependents of a package against your changes.
//!
//! Given a package, revdep asks the package index which distributions
//! depend on it, installs each dependent's missing prerequisites into an
//! isolated root, builds and tests the dependent, and reports every result
//! as one assertion of a TAP test plan.
//!
//! # Modules
//!
//! - [`build`] - Build system detection, test execution and classification
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Configuration loading, overlaying and validation
//! - [`error`] - Error types and result aliases
//! - [`index`] - Package index clients
//! - [`report`] - TAP output and run logs
//! - [`requirements`] - Prerequisites, the install root and the installer
//! - [`runner`] - Per-name workers and the orchestrator
//! - [`shell`] - Shell command execution
//! - [`ui`] - Output modes, progress and colours
//!
//! # Example
//!
//! ```
//! use revdep::runner::DependentFilter;
//!
//! let filter = DependentFilter::new(None, Some("^Acme::")).unwrap();
//! let names = filter.apply(["Good::Dist", "Task::Kensho", "Acme::Foo"]);
//! assert_eq!(names, ["Good::Dist"]);
//! ```
//!
//! For end-to-end runs against a fixture index, see the integration tests.

pub mod build;
pub mod cli;
pub mod config;
pub mod error;
pub mod index;
pub mod report;
pub mod requirements;
pub mod runner;
pub mod shell;
pub mod ui;

pub use error::{Result, RevdepError};
