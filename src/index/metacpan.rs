//! MetaCPAN API client.
//!
//! Uses three endpoints of the v1 API:
//!
//! - `GET /module/{name}` - which release currently provides a module
//! - `GET /release/{author}/{release}` - declared dependencies and download URL
//! - `GET /reverse_dependencies/dist/{distribution}` - who depends on a distribution
//!
//! Release documents are cached for the lifetime of the client, which is
//! one run.

use anyhow::{anyhow, Context};
use flate2::read::GzDecoder;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::error::{RevdepError, Result};
use crate::requirements::Phase;
use crate::ui::ToolOutput;

use super::{module_name_for, Distribution, PackageIndex};

/// Public MetaCPAN API root.
pub const DEFAULT_URL: &str = "https://fastapi.metacpan.org/v1";

#[derive(Debug, Deserialize)]
struct ModuleDoc {
    release: Option<String>,
    author: Option<String>,
    distribution: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReleaseResponse {
    release: ReleaseDoc,
}

#[derive(Debug, Clone, Deserialize)]
struct ReleaseDoc {
    name: String,
    author: String,
    #[serde(default)]
    download_url: Option<String>,
    #[serde(default)]
    dependency: Vec<DependencyDoc>,
}

#[derive(Debug, Clone, Deserialize)]
struct DependencyDoc {
    module: String,
    phase: String,
    relationship: String,
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    #[serde(default)]
    data: Vec<ReverseEntry>,
}

#[derive(Debug, Deserialize)]
struct ReverseEntry {
    distribution: String,
    #[serde(default)]
    main_module: Option<String>,
}

/// Blocking MetaCPAN client.
pub struct MetaCpanIndex {
    base_url: String,
    client: reqwest::blocking::Client,
    output: Arc<dyn ToolOutput>,
    releases: Mutex<HashMap<String, ReleaseDoc>>,
}

impl MetaCpanIndex {
    /// Create a client for the API rooted at `base_url`.
    pub fn new(base_url: &str, timeout: Duration, output: Arc<dyn ToolOutput>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("revdep/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            output,
            releases: Mutex::new(HashMap::new()),
        })
    }

    /// API root this client talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET a JSON document. A 404 is `Ok(None)`.
    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>> {
        let url = format!("{}/{}", self.base_url, path);
        self.output.index_request(&url);

        let request_failed = |message: String| RevdepError::IndexRequest {
            url: url.clone(),
            message,
        };

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| request_failed(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(request_failed(format!("HTTP {}", response.status())));
        }

        response
            .json::<T>()
            .map(Some)
            .map_err(|e| request_failed(format!("invalid response: {}", e)))
    }

    fn module(&self, name: &str) -> Result<ModuleDoc> {
        let doc: ModuleDoc =
            self.get_json(&format!("module/{}", name))?
                .ok_or_else(|| RevdepError::NotResolvable {
                    name: name.to_string(),
                })?;

        if doc.status.as_deref().is_some_and(|status| status != "latest") {
            tracing::debug!("{} is only provided by a superseded release", name);
            return Err(RevdepError::NotResolvable {
                name: name.to_string(),
            });
        }
        Ok(doc)
    }

    fn release(&self, author: &str, release: &str) -> Result<ReleaseDoc> {
        let key = format!("{}/{}", author, release);
        if let Some(doc) = self
            .releases
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return Ok(doc.clone());
        }

        let response: ReleaseResponse = self
            .get_json(&format!("release/{}", key))?
            .ok_or_else(|| RevdepError::NotResolvable {
                name: release.to_string(),
            })?;

        self.releases
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, response.release.clone());
        Ok(response.release)
    }
}

impl PackageIndex for MetaCpanIndex {
    fn reverse_dependents(&self, package: &str) -> Result<Vec<String>> {
        let module = self.module(package)?;
        let distribution = module
            .distribution
            .ok_or_else(|| RevdepError::NotResolvable {
                name: package.to_string(),
            })?;

        let response: ReverseResponse = self
            .get_json(&format!(
                "reverse_dependencies/dist/{}?page_size=5000",
                distribution
            ))?
            .unwrap_or(ReverseResponse { data: Vec::new() });

        let names: BTreeSet<String> = response
            .data
            .into_iter()
            .map(|entry| {
                entry
                    .main_module
                    .unwrap_or_else(|| module_name_for(&entry.distribution))
            })
            .collect();
        Ok(names.into_iter().collect())
    }

    fn resolve(&self, name: &str) -> Result<Distribution> {
        let module = self.module(name)?;
        let (Some(release), Some(author)) = (module.release, module.author) else {
            return Err(RevdepError::NotResolvable {
                name: name.to_string(),
            });
        };

        let doc = self.release(&author, &release)?;
        let mut dist = Distribution::new(name, &doc.name, &doc.author);
        for dep in doc.dependency.iter().filter(|d| d.relationship == "requires") {
            if let Some(phase) = Phase::from_metadata(&dep.phase) {
                dist = dist.with_prereq(phase, dep.module.clone());
            }
        }
        Ok(dist)
    }

    fn fetch_source(&self, dist: &Distribution, work_dir: &Path) -> Result<PathBuf> {
        let unavailable = |e: anyhow::Error| RevdepError::SourceUnavailable {
            dist: dist.base_id.clone(),
            message: format!("{:#}", e),
        };

        let doc = self.release(&dist.author, &dist.base_id)?;
        let url = doc
            .download_url
            .ok_or_else(|| unavailable(anyhow!("release has no download URL")))?;

        self.output.index_request(&url);
        let bytes = self
            .client
            .get(&url)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.bytes())
            .map_err(|e| RevdepError::IndexRequest {
                url: url.clone(),
                message: e.to_string(),
            })?;

        fs::create_dir_all(work_dir)?;
        unpack_tarball(&bytes, &dist.base_id, work_dir).map_err(unavailable)
    }
}

/// Unpack a gzipped tarball into a fresh directory under `work_dir`.
///
/// Returns the single top-level directory of the archive when there is
/// one (the usual layout), else the extraction directory itself.
fn unpack_tarball(bytes: &[u8], base_id: &str, work_dir: &Path) -> anyhow::Result<PathBuf> {
    let dest = tempfile::Builder::new()
        .prefix(&format!("{}-", base_id))
        .tempdir_in(work_dir)
        .with_context(|| format!("Failed to create extraction dir in {}", work_dir.display()))?
        .keep();

    let mut archive = tar::Archive::new(GzDecoder::new(bytes));
    archive
        .unpack(&dest)
        .with_context(|| format!("Failed to unpack {}", base_id))?;

    let entries = fs::read_dir(&dest)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .collect::<Vec<_>>();

    match entries.as_slice() {
        [only] if only.is_dir() => Ok(only.clone()),
        _ => Ok(dest),
    }
}
