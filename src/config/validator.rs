//! Configuration validation rules.
//!
//! - At least one worker
//! - `include` and `exclude` must compile as regular expressions
//! - MetaCPAN and fixture indexes are mutually exclusive

use regex::Regex;

use crate::config::schema::RunConfig;
use crate::error::{RevdepError, Result};

/// Validation error with context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Rule identifier
    pub rule: &'static str,
    /// Human-readable error message
    pub message: String,
}

/// Validate a configuration and return all errors.
pub fn validate_config(config: &RunConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if config.workers == Some(0) {
        errors.push(ValidationError {
            rule: "workers",
            message: "workers must be at least 1".to_string(),
        });
    }

    for (field, pattern) in [("include", &config.include), ("exclude", &config.exclude)] {
        if let Some(pattern) = pattern {
            if let Err(e) = Regex::new(pattern) {
                errors.push(ValidationError {
                    rule: "pattern",
                    message: format!("{} pattern '{}' is invalid: {}", field, pattern, e),
                });
            }
        }
    }

    if config.index.metacpan.is_some() && config.index.fixture.is_some() {
        errors.push(ValidationError {
            rule: "index",
            message: "index.metacpan and index.fixture cannot both be set".to_string(),
        });
    }

    errors
}

/// Validate a configuration, failing on the first batch of errors.
pub fn validate(config: &RunConfig) -> Result<()> {
    let errors = validate_config(config);
    if errors.is_empty() {
        return Ok(());
    }
    Err(RevdepError::ConfigValidationError {
        message: errors
            .into_iter()
            .map(|e| e.message)
            .collect::<Vec<_>>()
            .join("; "),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn default_config_is_valid() {
        assert!(validate(&RunConfig::default()).is_ok());
    }

    #[test]
    fn zero_workers_rejected() {
        let config = RunConfig {
            workers: Some(0),
            ..Default::default()
        };
        let errors = validate_config(&config);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].rule, "workers");
    }

    #[test]
    fn bad_patterns_rejected() {
        let config = RunConfig {
            include: Some("(".to_string()),
            exclude: Some("[".to_string()),
            ..Default::default()
        };
        assert_eq!(validate_config(&config).len(), 2);
    }

    #[test]
    fn both_indexes_rejected() {
        let mut config = RunConfig::default();
        config.index.metacpan = Some("http://localhost".to_string());
        config.index.fixture = Some(PathBuf::from("index.yml"));

        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("cannot both be set"));
    }
}
