//! Index described by a YAML file.
//!
//! Used for offline runs against local source trees and throughout the
//! tests.
//!
//! # Example
//!
//! ```
//! use revdep::index::{FixtureIndex, PackageIndex};
//!
//! let yaml = r#"
//! dependents:
//!   Foo::Bar: [Good::Dist]
//! distributions:
//!   - name: Good::Dist
//!     base_id: Good-Dist-1.00
//!     author: AUTHORID
//!     prereqs:
//!       build_test: [Test::More]
//! "#;
//! let index = FixtureIndex::from_yaml(yaml, std::path::Path::new(".")).unwrap();
//!
//! assert_eq!(index.reverse_dependents("Foo::Bar").unwrap(), ["Good::Dist"]);
//! assert_eq!(index.resolve("Good::Dist").unwrap().base_id, "Good-Dist-1.00");
//! ```

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{RevdepError, Result};
use crate::requirements::Phase;

use super::{Distribution, PackageIndex};

/// One distribution in a fixture.
#[derive(Debug, Clone, Deserialize)]
pub struct FixtureDistribution {
    /// Name the distribution resolves from.
    pub name: String,
    /// Canonical base id.
    pub base_id: String,
    /// Releasing author.
    pub author: String,
    /// Source directory, relative to the fixture file.
    #[serde(default)]
    pub source: Option<PathBuf>,
    /// Other module names that resolve to this distribution.
    #[serde(default)]
    pub provides: Vec<String>,
    /// Declared prerequisites by phase.
    #[serde(default)]
    pub prereqs: BTreeMap<Phase, Vec<String>>,
}

impl FixtureDistribution {
    /// Describe a distribution.
    pub fn new(
        name: impl Into<String>,
        base_id: impl Into<String>,
        author: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            base_id: base_id.into(),
            author: author.into(),
            source: None,
            provides: Vec::new(),
            prereqs: BTreeMap::new(),
        }
    }

    /// Set the source directory.
    pub fn source(mut self, dir: impl Into<PathBuf>) -> Self {
        self.source = Some(dir.into());
        self
    }

    /// Add another module name that resolves here.
    pub fn provides(mut self, module: impl Into<String>) -> Self {
        self.provides.push(module.into());
        self
    }

    /// Declare a prerequisite.
    pub fn requires(mut self, phase: Phase, module: impl Into<String>) -> Self {
        self.prereqs.entry(phase).or_default().push(module.into());
        self
    }

    fn answers_to(&self, name: &str) -> bool {
        self.name == name || self.provides.iter().any(|p| p == name)
    }

    fn to_distribution(&self, requested: &str) -> Distribution {
        let mut dist = Distribution::new(requested, &self.base_id, &self.author);
        for (phase, modules) in &self.prereqs {
            for module in modules {
                dist = dist.with_prereq(*phase, module.clone());
            }
        }
        dist
    }
}

#[derive(Debug, Default, Deserialize)]
struct FixtureFile {
    #[serde(default)]
    dependents: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    distributions: Vec<FixtureDistribution>,
}

/// In-memory index, optionally loaded from YAML.
#[derive(Debug, Default, Clone)]
pub struct FixtureIndex {
    dependents: BTreeMap<String, Vec<String>>,
    distributions: Vec<FixtureDistribution>,
}

impl FixtureIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a fixture file. Relative source paths are resolved against
    /// the file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(RevdepError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = fs::read_to_string(path)?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_yaml(&content, base).map_err(|e| match e {
            RevdepError::ConfigParseError { message, .. } => RevdepError::ConfigParseError {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        })
    }

    /// Parse fixture YAML, resolving relative sources against `base`.
    pub fn from_yaml(content: &str, base: &Path) -> Result<Self> {
        let file: FixtureFile =
            serde_yaml::from_str(content).map_err(|e| RevdepError::ConfigParseError {
                path: PathBuf::from("<fixture>"),
                message: e.to_string(),
            })?;

        let distributions = file
            .distributions
            .into_iter()
            .map(|mut dist| {
                dist.source = dist.source.map(|s| if s.is_relative() { base.join(s) } else { s });
                dist
            })
            .collect();

        Ok(Self {
            dependents: file.dependents,
            distributions,
        })
    }

    /// Add a distribution.
    pub fn with_distribution(mut self, dist: FixtureDistribution) -> Self {
        self.distributions.push(dist);
        self
    }

    /// Record `names` as dependents of `package`.
    pub fn with_dependents<I, S>(mut self, package: &str, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependents
            .entry(package.to_string())
            .or_default()
            .extend(names.into_iter().map(Into::into));
        self
    }

    fn entry_for(&self, base_id: &str) -> Option<&FixtureDistribution> {
        self.distributions.iter().find(|d| d.base_id == base_id)
    }
}

impl PackageIndex for FixtureIndex {
    fn reverse_dependents(&self, package: &str) -> Result<Vec<String>> {
        Ok(self.dependents.get(package).cloned().unwrap_or_default())
    }

    fn resolve(&self, name: &str) -> Result<Distribution> {
        let mut matches: Vec<&FixtureDistribution> = self
            .distributions
            .iter()
            .filter(|d| d.answers_to(name))
            .collect();
        matches.dedup_by(|a, b| a.base_id == b.base_id);

        match matches.as_slice() {
            [] => Err(RevdepError::NotResolvable {
                name: name.to_string(),
            }),
            [only] => Ok(only.to_distribution(name)),
            many => Err(RevdepError::Ambiguous {
                name: name.to_string(),
                candidates: many
                    .iter()
                    .map(|d| d.base_id.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            }),
        }
    }

    fn fetch_source(&self, dist: &Distribution, _work_dir: &Path) -> Result<PathBuf> {
        let unavailable = |message: String| RevdepError::SourceUnavailable {
            dist: dist.base_id.clone(),
            message,
        };
        let entry = self
            .entry_for(&dist.base_id)
            .ok_or_else(|| unavailable("not in fixture".to_string()))?;
        let source = entry
            .source
            .clone()
            .ok_or_else(|| unavailable("fixture has no source directory".to_string()))?;
        if !source.is_dir() {
            return Err(unavailable(format!("{} is not a directory", source.display())));
        }
        Ok(source)
    }
}
