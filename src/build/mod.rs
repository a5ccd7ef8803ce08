//! Building and testing distributions.
//!
//! - [`kind`] - detect whether a source tree uses `Build.PL` or `Makefile.PL`
//! - [`runner`] - generate, test and classify the result

pub mod kind;
pub mod runner;

pub use kind::BuildKind;
pub use runner::{filter_noise, looks_successful, run_tests, TestRun};
