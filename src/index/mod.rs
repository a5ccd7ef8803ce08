//! Package index clients.
//!
//! The index answers three questions: which distributions depend on a
//! package, which distribution a name resolves to, and what a distribution
//! declares as prerequisites. It also fetches a distribution's source on
//! demand.
//!
//! - [`metacpan`] - HTTP client for the MetaCPAN API
//! - [`fixture`] - YAML-described index for offline runs and tests

pub mod fixture;
pub mod metacpan;

pub use fixture::{FixtureDistribution, FixtureIndex};
pub use metacpan::MetaCpanIndex;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::requirements::{Phase, PrereqRequirement};

/// Queryable package index.
///
/// Implementations are shared by every worker of a run, so they must be
/// `Send + Sync`; any caching they do is their own business.
pub trait PackageIndex: Send + Sync {
    /// Names of the distributions that declare `package` as a prerequisite.
    fn reverse_dependents(&self, package: &str) -> Result<Vec<String>>;

    /// Resolve a name to exactly one current distribution.
    ///
    /// Fails with `NotResolvable` when nothing matches and `Ambiguous`
    /// when more than one distribution does.
    fn resolve(&self, name: &str) -> Result<Distribution>;

    /// Prerequisites `dist` declares for `phase`.
    fn declared_prereqs(&self, dist: &Distribution, phase: Phase) -> Vec<PrereqRequirement> {
        dist.prereqs(phase)
    }

    /// Make the source of `dist` available, returning its directory.
    ///
    /// `work_dir` is scratch space the index may unpack into.
    fn fetch_source(&self, dist: &Distribution, work_dir: &Path) -> Result<PathBuf>;
}

/// A releasable unit of source resolved from one name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Distribution {
    /// The name it was resolved from (e.g. `Good::Dist`).
    pub name: String,
    /// Canonical base id (e.g. `Good-Dist-1.00`). Identifies the
    /// distribution within a run.
    pub base_id: String,
    /// Id of the releasing author.
    pub author: String,
    prereqs: BTreeMap<Phase, Vec<String>>,
    source_dir: Option<PathBuf>,
}

impl Distribution {
    /// Create a distribution with no declared prerequisites.
    pub fn new(
        name: impl Into<String>,
        base_id: impl Into<String>,
        author: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            base_id: base_id.into(),
            author: author.into(),
            prereqs: BTreeMap::new(),
            source_dir: None,
        }
    }

    /// Declare a prerequisite.
    pub fn with_prereq(mut self, phase: Phase, module: impl Into<String>) -> Self {
        self.prereqs.entry(phase).or_default().push(module.into());
        self
    }

    /// Identity used to deduplicate installs.
    pub fn id(&self) -> &str {
        &self.base_id
    }

    /// Declared prerequisites for one phase, in declaration order.
    pub fn prereqs(&self, phase: Phase) -> Vec<PrereqRequirement> {
        self.prereqs
            .get(&phase)
            .map(|names| {
                names
                    .iter()
                    .map(|name| PrereqRequirement::new(name.clone(), phase))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Source directory, once attached.
    pub fn source_dir(&self) -> Option<&Path> {
        self.source_dir.as_deref()
    }

    /// Attach the directory the source was fetched to.
    pub fn attach_source(&mut self, dir: PathBuf) {
        self.source_dir = Some(dir);
    }

    /// Fetch the source through `index` unless it is already attached.
    pub fn ensure_source(&mut self, index: &dyn PackageIndex, work_dir: &Path) -> Result<&Path> {
        let dir = match self.source_dir.take() {
            Some(dir) => dir,
            None => {
                let dir = index.fetch_source(self, work_dir)?;
                tracing::debug!("Fetched {} into {}", self.base_id, dir.display());
                dir
            }
        };
        Ok(self.source_dir.insert(dir).as_path())
    }
}

/// Turn a distribution name (`Foo-Bar`) into its main module name (`Foo::Bar`).
pub fn module_name_for(distribution: &str) -> String {
    distribution.replace('-', "::")
}
