//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::config::ConfigOverrides;
use crate::ui::OutputMode;

/// revdep - Test the dependents of a package against your changes.
#[derive(Debug, Parser)]
#[command(name = "revdep")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to config file (overrides ./revdep.yml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Echo the output of the build tools
    #[arg(short, long, global = true, env = "REVDEP_VERBOSE")]
    pub verbose: bool,

    /// Minimal output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Output mode selected by the global flags.
    pub fn output_mode(&self) -> OutputMode {
        if self.quiet {
            OutputMode::Quiet
        } else if self.verbose {
            OutputMode::Verbose
        } else {
            OutputMode::Normal
        }
    }
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Find the dependents of a package and test them
    Test(TestArgs),

    /// Test the named distributions
    Run(RunArgs),

    /// List the dependents of a package that would be tested
    List(ListArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Options shared by every command that talks to the index.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct IndexArgs {
    /// MetaCPAN API base URL
    #[arg(long, env = "REVDEP_INDEX_URL", conflicts_with = "fixture")]
    pub index_url: Option<String>,

    /// Offline index fixture (YAML)
    #[arg(long, env = "REVDEP_FIXTURE")]
    pub fixture: Option<PathBuf>,

    /// Only consider dependents matching this pattern
    #[arg(long, env = "REVDEP_INCLUDE")]
    pub include: Option<String>,

    /// Skip dependents matching this pattern
    #[arg(short = 'x', long, env = "REVDEP_EXCLUDE")]
    pub exclude: Option<String>,
}

/// Options controlling how distributions are tested.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct RunOptions {
    #[command(flatten)]
    pub index: IndexArgs,

    /// Number of parallel workers (1 = sequential)
    #[arg(short = 'j', long, env = "REVDEP_WORKERS")]
    pub workers: Option<usize>,

    /// Write status, error and prereq logs into this directory
    #[arg(long, env = "REVDEP_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// Install prerequisites here instead of a temporary directory
    #[arg(long)]
    pub install_root: Option<PathBuf>,

    /// Leave the installation root behind after the run
    #[arg(long, env = "REVDEP_KEEP_INSTALL_ROOT")]
    pub keep_install_root: bool,

    /// Unpack fetched sources here instead of a temporary directory
    #[arg(long)]
    pub work_dir: Option<PathBuf>,
}

impl IndexArgs {
    /// Overrides these flags contribute.
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            index_url: self.index_url.clone(),
            fixture: self.fixture.clone(),
            include: self.include.clone(),
            exclude: self.exclude.clone(),
            ..Default::default()
        }
    }
}

impl RunOptions {
    /// Overrides these flags contribute.
    pub fn overrides(&self, verbose: bool) -> ConfigOverrides {
        ConfigOverrides {
            workers: self.workers,
            log_dir: self.log_dir.clone(),
            verbose,
            keep_install_root: self.keep_install_root,
            install_root: self.install_root.clone(),
            work_dir: self.work_dir.clone(),
            ..self.index.overrides()
        }
    }
}

/// Arguments for the `test` command.
#[derive(Debug, Clone, clap::Args)]
pub struct TestArgs {
    /// Package whose dependents are tested
    pub package: String,

    #[command(flatten)]
    pub options: RunOptions,
}

/// Arguments for the `run` command.
#[derive(Debug, Clone, clap::Args)]
pub struct RunArgs {
    /// Distributions to test
    #[arg(required = true)]
    pub names: Vec<String>,

    #[command(flatten)]
    pub options: RunOptions,
}

/// Arguments for the `list` command.
#[derive(Debug, Clone, clap::Args)]
pub struct ListArgs {
    /// Package whose dependents are listed
    pub package: String,

    #[command(flatten)]
    pub index: IndexArgs,
}

/// Arguments for the `completions` command.
#[derive(Debug, Clone, clap::Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
