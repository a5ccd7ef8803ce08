//! Build system detection.

use std::fmt;
use std::path::Path;

/// Generator file for script-based builds.
pub const BUILD_SCRIPT_GENERATOR: &str = "Build.PL";

/// Generator file for makefile-based builds.
pub const MAKEFILE_GENERATOR: &str = "Makefile.PL";

/// How a distribution is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildKind {
    /// `Build.PL` generates a `Build` script.
    Script,
    /// `Makefile.PL` generates a `Makefile`.
    Make,
}

impl BuildKind {
    /// Detect the build system of a source directory.
    ///
    /// A build-script generator wins; anything else is assumed to be a
    /// makefile build.
    pub fn detect(source_dir: &Path) -> Self {
        if source_dir.join(BUILD_SCRIPT_GENERATOR).is_file() {
            Self::Script
        } else {
            Self::Make
        }
    }

    /// Command generating the build files.
    pub fn configure_command(&self) -> &'static str {
        match self {
            Self::Script => "perl Build.PL",
            Self::Make => "perl Makefile.PL",
        }
    }

    /// Command building the distribution.
    pub fn build_command(&self) -> &'static str {
        match self {
            Self::Script => "perl Build",
            Self::Make => "make",
        }
    }

    /// Command running the test suite.
    pub fn test_command(&self) -> &'static str {
        match self {
            Self::Script => "perl Build test",
            Self::Make => "make test",
        }
    }

    /// Command installing into the configured install base.
    pub fn install_command(&self) -> &'static str {
        match self {
            Self::Script => "perl Build install",
            Self::Make => "make install",
        }
    }
}

impl fmt::Display for BuildKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Script => write!(f, "{}", BUILD_SCRIPT_GENERATOR),
            Self::Make => write!(f, "{}", MAKEFILE_GENERATOR),
        }
    }
}
