//! Configuration loading, overlaying and validation.
//!
//! - Schema definitions in [`schema`]
//! - File discovery and loading in [`loader`]
//! - Validation in [`validator`]
//!
//! # Example
//!
//! ```
//! use revdep::config::{load_config, validate, ConfigOverrides};
//! use tempfile::TempDir;
//! use std::fs;
//!
//! let temp = TempDir::new().unwrap();
//! fs::write(temp.path().join("revdep.yml"), "workers: 2").unwrap();
//!
//! let mut config = load_config(None, temp.path()).unwrap();
//! config.apply(ConfigOverrides { workers: Some(4), ..Default::default() });
//! validate(&config).unwrap();
//! assert_eq!(config.workers(), 4);
//! ```
//!
//! Sources, lowest priority first: defaults, the YAML file (`--config`
//! or `./revdep.yml`), `REVDEP_*` environment variables, then flags.

pub mod loader;
pub mod schema;
pub mod validator;

pub use loader::{find_config, load_config, load_config_file, parse_config, DEFAULT_CONFIG_FILE};
pub use schema::{ConfigOverrides, IndexConfig, RunConfig, DEFAULT_WORKERS};
pub use validator::{validate, validate_config, ValidationError};
