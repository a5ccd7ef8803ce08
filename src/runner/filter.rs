//! Which dependents get tested.

use regex::Regex;
use std::sync::LazyLock;

use crate::error::{RevdepError, Result};

/// Meta-distributions that only bundle others and are never worth testing.
static ALWAYS_EXCLUDED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:Task|Bundle)").expect("ALWAYS_EXCLUDED must compile"));

/// Name filter applied to dependent lists.
///
/// `Task*` and `Bundle*` names are always dropped. An include pattern,
/// when set, keeps only matching names; an exclude pattern then drops
/// matching ones.
#[derive(Debug, Clone, Default)]
pub struct DependentFilter {
    include: Option<Regex>,
    exclude: Option<Regex>,
}

impl DependentFilter {
    /// Compile the optional patterns.
    pub fn new(include: Option<&str>, exclude: Option<&str>) -> Result<Self> {
        Ok(Self {
            include: include.map(compile).transpose()?,
            exclude: exclude.map(compile).transpose()?,
        })
    }

    /// Whether `name` should be tested.
    pub fn accepts(&self, name: &str) -> bool {
        if ALWAYS_EXCLUDED.is_match(name) {
            return false;
        }
        if let Some(include) = &self.include {
            if !include.is_match(name) {
                return false;
            }
        }
        !self.exclude.as_ref().is_some_and(|re| re.is_match(name))
    }

    /// Keep the accepted names, in order.
    pub fn apply<I, S>(&self, names: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        names
            .into_iter()
            .map(Into::into)
            .filter(|name| {
                let keep = self.accepts(name);
                if !keep {
                    tracing::debug!("Filtered out {}", name);
                }
                keep
            })
            .collect()
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| RevdepError::ConfigValidationError {
        message: format!("invalid pattern '{}': {}", pattern, e),
    })
}
