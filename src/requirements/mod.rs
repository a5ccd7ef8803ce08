//! Prerequisites and where they get installed.
//!
//! - [`prereq`] - phases, declared requirements and satisfaction probes
//! - [`root`] - the per-run install root and the environment pointing at it
//! - [`installer`] - recursive, deduplicating prerequisite installation

pub mod installer;
pub mod prereq;
pub mod root;

pub use installer::{InstallerContext, PrereqEvent, PrereqInstaller};
pub use prereq::{Phase, PrereqRequirement, RUNTIME};
pub use root::InstallRoot;
