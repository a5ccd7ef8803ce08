//! Configuration schema.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default number of workers: one, i.e. sequential.
pub const DEFAULT_WORKERS: usize = 1;

/// Default timeout for index requests.
pub const DEFAULT_INDEX_TIMEOUT: Duration = Duration::from_secs(30);

/// Options for one run.
///
/// ```yaml
/// workers: 4
/// log_dir: logs
/// exclude: "^Acme::"
/// keep_install_root: true
/// index:
///   metacpan: https://fastapi.metacpan.org/v1
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Worker count; more than one enables the pool.
    pub workers: Option<usize>,

    /// Directory for the status, error and prereq logs. Absent means
    /// logs are discarded.
    pub log_dir: Option<PathBuf>,

    /// Echo upstream tool output.
    pub verbose: bool,

    /// Dependents matching this pattern are not tested.
    pub exclude: Option<String>,

    /// When set, only dependents matching this pattern are tested.
    pub include: Option<String>,

    /// Leave the installation root behind after the run.
    pub keep_install_root: bool,

    /// Use this directory as the installation root instead of a temporary one.
    pub install_root: Option<PathBuf>,

    /// Unpack fetched sources here instead of a temporary directory.
    pub work_dir: Option<PathBuf>,

    /// Which package index to query.
    pub index: IndexConfig,
}

/// Package index selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IndexConfig {
    /// Base URL of a MetaCPAN API.
    pub metacpan: Option<String>,

    /// YAML fixture describing an offline index.
    pub fixture: Option<PathBuf>,

    /// Request timeout in seconds.
    pub timeout_secs: Option<u64>,
}

impl RunConfig {
    /// Effective worker count.
    pub fn workers(&self) -> usize {
        self.workers.unwrap_or(DEFAULT_WORKERS)
    }

    /// Resolve relative paths against `base` (the config file's directory).
    pub fn rebase(&mut self, base: &Path) {
        for path in [
            &mut self.log_dir,
            &mut self.install_root,
            &mut self.work_dir,
            &mut self.index.fixture,
        ]
        .into_iter()
        .flatten()
        {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }

    /// Layer `overrides` on top, overrides winning.
    pub fn apply(&mut self, overrides: ConfigOverrides) {
        if overrides.workers.is_some() {
            self.workers = overrides.workers;
        }
        if overrides.log_dir.is_some() {
            self.log_dir = overrides.log_dir;
        }
        self.verbose |= overrides.verbose;
        if overrides.exclude.is_some() {
            self.exclude = overrides.exclude;
        }
        if overrides.include.is_some() {
            self.include = overrides.include;
        }
        self.keep_install_root |= overrides.keep_install_root;
        if overrides.install_root.is_some() {
            self.install_root = overrides.install_root;
        }
        if overrides.work_dir.is_some() {
            self.work_dir = overrides.work_dir;
        }
        // A higher layer picking an index replaces the lower layer's choice.
        if let Some(url) = overrides.index_url {
            self.index.metacpan = Some(url);
            self.index.fixture = None;
        }
        if let Some(fixture) = overrides.fixture {
            self.index.fixture = Some(fixture);
            self.index.metacpan = None;
        }
    }

    /// Index timeout.
    pub fn index_timeout(&self) -> Duration {
        self.index
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_INDEX_TIMEOUT)
    }
}

/// Values from the environment and command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub workers: Option<usize>,
    pub log_dir: Option<PathBuf>,
    pub verbose: bool,
    pub exclude: Option<String>,
    pub include: Option<String>,
    pub keep_install_root: bool,
    pub install_root: Option<PathBuf>,
    pub work_dir: Option<PathBuf>,
    pub index_url: Option<String>,
    pub fixture: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sequential_and_discarding() {
        let config = RunConfig::default();
        assert_eq!(config.workers(), 1);
        assert!(config.log_dir.is_none());
        assert!(!config.keep_install_root);
        assert_eq!(config.index_timeout(), DEFAULT_INDEX_TIMEOUT);
    }

    #[test]
    fn parses_yaml() {
        let yaml = r#"
workers: 4
log_dir: logs
exclude: "^Acme::"
index:
  fixture: index.yml
  timeout_secs: 5
"#;
        let config: RunConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.workers(), 4);
        assert_eq!(config.exclude.as_deref(), Some("^Acme::"));
        assert_eq!(config.index.fixture, Some(PathBuf::from("index.yml")));
        assert_eq!(config.index_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(serde_yaml::from_str::<RunConfig>("wrokers: 2").is_err());
    }

    #[test]
    fn rebase_only_touches_relative_paths() {
        let mut config = RunConfig {
            log_dir: Some(PathBuf::from("logs")),
            install_root: Some(PathBuf::from("/opt/root")),
            ..Default::default()
        };
        config.rebase(Path::new("/etc/revdep"));
        assert_eq!(config.log_dir, Some(PathBuf::from("/etc/revdep/logs")));
        assert_eq!(config.install_root, Some(PathBuf::from("/opt/root")));
    }

    #[test]
    fn overrides_win() {
        let mut config = RunConfig {
            workers: Some(2),
            exclude: Some("Old".to_string()),
            ..Default::default()
        };
        config.index.metacpan = Some("http://file".to_string());

        config.apply(ConfigOverrides {
            workers: Some(8),
            fixture: Some(PathBuf::from("index.yml")),
            ..Default::default()
        });

        assert_eq!(config.workers(), 8);
        assert_eq!(config.exclude.as_deref(), Some("Old"));
        assert_eq!(config.index.fixture, Some(PathBuf::from("index.yml")));
        assert!(config.index.metacpan.is_none());
    }
}
