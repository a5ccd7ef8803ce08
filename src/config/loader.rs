//! Configuration file discovery and loading.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::schema::RunConfig;
use crate::error::{RevdepError, Result};

/// File picked up from the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "revdep.yml";

/// Find the config file to use, if any.
///
/// An explicit path must exist. Otherwise `revdep.yml` in `cwd` is used
/// when present.
pub fn find_config(explicit: Option<&Path>, cwd: &Path) -> Result<Option<PathBuf>> {
    match explicit {
        Some(path) if path.is_file() => Ok(Some(path.to_path_buf())),
        Some(path) => Err(RevdepError::ConfigNotFound {
            path: path.to_path_buf(),
        }),
        None => {
            let default = cwd.join(DEFAULT_CONFIG_FILE);
            Ok(default.is_file().then_some(default))
        }
    }
}

/// Load a single config file, resolving its relative paths against the
/// file's directory.
///
/// # Errors
///
/// Returns `ConfigNotFound` if the file doesn't exist.
/// Returns `ConfigParseError` if the YAML is invalid.
pub fn load_config_file(path: &Path) -> Result<RunConfig> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            RevdepError::ConfigNotFound {
                path: path.to_path_buf(),
            }
        } else {
            RevdepError::Io(e)
        }
    })?;

    let mut config = parse_config(&content, path)?;
    if let Some(base) = path.parent() {
        config.rebase(base);
    }
    Ok(config)
}

/// Parse YAML content into a [`RunConfig`]. An empty document is the
/// default configuration.
pub fn parse_config(content: &str, source_path: &Path) -> Result<RunConfig> {
    if content.trim().is_empty() {
        return Ok(RunConfig::default());
    }
    serde_yaml::from_str(content).map_err(|e| RevdepError::ConfigParseError {
        path: source_path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Load the file layer: the explicit or discovered file, else defaults.
pub fn load_config(explicit: Option<&Path>, cwd: &Path) -> Result<RunConfig> {
    match find_config(explicit, cwd)? {
        Some(path) => {
            tracing::debug!("Loading config from {}", path.display());
            load_config_file(&path)
        }
        None => Ok(RunConfig::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn no_file_means_defaults() {
        let temp = TempDir::new().unwrap();
        assert_eq!(load_config(None, temp.path()).unwrap(), RunConfig::default());
    }

    #[test]
    fn discovers_file_in_cwd() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(DEFAULT_CONFIG_FILE), "workers: 3\nlog_dir: logs\n").unwrap();

        let config = load_config(None, temp.path()).unwrap();
        assert_eq!(config.workers(), 3);
        assert_eq!(config.log_dir, Some(temp.path().join("logs")));
    }

    #[test]
    fn explicit_file_must_exist() {
        let temp = TempDir::new().unwrap();
        let err = load_config(Some(&temp.path().join("missing.yml")), temp.path()).unwrap_err();
        assert!(matches!(err, RevdepError::ConfigNotFound { .. }));
    }

    #[test]
    fn parse_errors_carry_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bad.yml");
        fs::write(&path, "workers: [nope").unwrap();

        match load_config(Some(&path), temp.path()).unwrap_err() {
            RevdepError::ConfigParseError { path: reported, .. } => assert_eq!(reported, path),
            other => panic!("expected ConfigParseError, got {other:?}"),
        }
    }

    #[test]
    fn empty_file_is_default() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("empty.yml");
        fs::write(&path, "\n").unwrap();
        assert_eq!(load_config(Some(&path), temp.path()).unwrap(), RunConfig::default());
    }
}
