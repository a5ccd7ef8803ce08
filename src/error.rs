//! Error types for revdep operations.
//!
//! This module defines [`RevdepError`], the primary error type used throughout
//! the application, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Use `RevdepError` for failures that callers branch on (an unresolvable
//!   name becomes an UNKNOWN outcome, a prerequisite failure becomes a SKIP)
//! - Use `anyhow::Error` (via `RevdepError::Other`) inside adapters
//! - Test failures are outcomes, not errors: they never cross a worker as `Err`

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for revdep operations.
#[derive(Debug, Error)]
pub enum RevdepError {
    /// Name does not map to any current distribution in the index.
    #[error("Cannot resolve '{name}' to a distribution")]
    NotResolvable { name: String },

    /// Name maps to more than one distribution.
    #[error("'{name}' is ambiguous: matches {candidates}")]
    Ambiguous { name: String, candidates: String },

    /// A recursive prerequisite could not be resolved, configured or installed.
    #[error("Prerequisite '{prereq}' of {dist} failed: {message}")]
    PrereqInstallFailure {
        prereq: String,
        dist: String,
        message: String,
    },

    /// Build-script generation failed before anything could be installed or tested.
    #[error("Build of {dist} failed: {message}")]
    BuildFailure { dist: String, message: String },

    /// Source for a distribution could not be fetched or unpacked.
    #[error("Source for {dist} unavailable: {message}")]
    SourceUnavailable { dist: String, message: String },

    /// A request to the package index failed.
    #[error("Index request to {url} failed: {message}")]
    IndexRequest { url: String, message: String },

    /// External command could not be executed.
    #[error("Command failed with exit code {code:?}: {command}: {message}")]
    CommandFailed {
        command: String,
        code: Option<i32>,
        message: String,
    },

    /// A worker thread could not be started.
    #[error("Failed to start worker: {message}")]
    WorkerSpawn { message: String },

    /// Configuration file not found at expected location.
    #[error("Configuration not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Failed to parse configuration file.
    #[error("Failed to parse config at {path}: {message}")]
    ConfigParseError { path: PathBuf, message: String },

    /// Invalid configuration structure or values.
    #[error("Invalid configuration: {message}")]
    ConfigValidationError { message: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RevdepError {
    /// Whether this error means the name itself could not be resolved.
    pub fn is_unresolved(&self) -> bool {
        matches!(self, Self::NotResolvable { .. } | Self::Ambiguous { .. })
    }
}

/// Result type alias for revdep operations.
pub type Result<T> = std::result::Result<T, RevdepError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_resolvable_displays_name() {
        let err = RevdepError::NotResolvable {
            name: "Missing::Dist".into(),
        };
        assert!(err.to_string().contains("Missing::Dist"));
        assert!(err.is_unresolved());
    }

    #[test]
    fn ambiguous_displays_candidates() {
        let err = RevdepError::Ambiguous {
            name: "Foo".into(),
            candidates: "Foo-1.0, Foo-Fork-2.0".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Foo-Fork-2.0"));
        assert!(err.is_unresolved());
    }

    #[test]
    fn prereq_failure_displays_prereq_and_dist() {
        let err = RevdepError::PrereqInstallFailure {
            prereq: "Shared::Prereq".into(),
            dist: "Good-Dist-1.00".into(),
            message: "make install exited with code 2".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Shared::Prereq"));
        assert!(msg.contains("Good-Dist-1.00"));
        assert!(!err.is_unresolved());
    }

    #[test]
    fn command_failed_displays_command_and_code() {
        let err = RevdepError::CommandFailed {
            command: "make test".into(),
            code: Some(2),
            message: "killed".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("make test"));
        assert!(msg.contains('2'));
        assert!(msg.contains("killed"));
    }

    #[test]
    fn config_parse_error_displays_path_and_message() {
        let err = RevdepError::ConfigParseError {
            path: PathBuf::from("/revdep.yml"),
            message: "invalid syntax".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("/revdep.yml"));
        assert!(msg.contains("invalid syntax"));
    }

    #[test]
    fn io_error_converts_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: RevdepError = io_err.into();
        assert!(matches!(err, RevdepError::Io(_)));
    }
}
