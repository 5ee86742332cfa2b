//! Fhirtab CLI Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Command-line interface for the fhirtab pipeline.
//!
//! # Overview
//!
//! One invocation is one pipeline run over a single bundle source:
//!
//! - **Local directory**: flatten every bundle file in a directory
//!   (`fhirtab local-dir`)
//! - **Remote file**: fetch and flatten one hosted bundle (`fhirtab url-file`)
//! - **Remote folder**: walk a hosted folder listing (`fhirtab url-dir`)
//!
//! Flattened rows land in Postgres, one table per resource type. The
//! destination database is configured through `POSTGRES_*` environment
//! variables, read by [`fhirtab_pipeline::DbConfig`].

pub mod run;

// Re-export commonly used types
pub use run::execute;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use fhirtab_common::logging::{LogConfig, LogLevel, LogOutput};
use fhirtab_common::DEFAULT_QUEUE_CAPACITY;
use fhirtab_ingest::BundleSource;

/// Fhirtab - FHIR bundles to Postgres tables
#[derive(Parser, Debug)]
#[command(name = "fhirtab")]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Mirror logs to a file under the log directory
    #[arg(long, global = true)]
    pub log_file: bool,

    /// HTTP timeout for remote sources, in seconds
    #[arg(
        long,
        env = "FHIRTAB_HTTP_TIMEOUT_SECS",
        default_value_t = 30,
        global = true
    )]
    pub http_timeout_secs: u64,

    /// Capacity of the bundle and batch queues
    #[arg(
        long,
        env = "FHIRTAB_QUEUE_CAPACITY",
        default_value_t = DEFAULT_QUEUE_CAPACITY,
        global = true
    )]
    pub queue_capacity: usize,
}

impl Cli {
    /// Logging configuration for this invocation.
    ///
    /// The `LOG_*` environment variables form the base; `--verbose` and
    /// `--log-file` are laid over it. An unparsable environment value is an
    /// error.
    pub fn log_config(&self) -> Result<LogConfig> {
        let mut config = LogConfig::from_env()?;
        if self.verbose {
            config = config.with_level(LogLevel::Debug);
        }
        if self.log_file {
            config = config.with_output(LogOutput::Both);
        }
        Ok(config)
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ingest every bundle file in a local directory
    LocalDir {
        /// Directory holding FHIR bundle JSON files
        dir: PathBuf,
    },

    /// Ingest a single bundle from a URL
    UrlFile {
        /// URL of one FHIR bundle JSON document
        url: String,
    },

    /// Ingest every bundle listed under a hosted folder URL
    UrlDir {
        /// URL of a folder listing, e.g. a GitHub tree page
        url: String,
    },
}

impl Commands {
    /// The bundle source this command ingests from.
    pub fn source(&self) -> BundleSource {
        match self {
            Commands::LocalDir { dir } => BundleSource::LocalDir(dir.clone()),
            Commands::UrlFile { url } => BundleSource::FileUrl(url.clone()),
            Commands::UrlDir { url } => BundleSource::FolderUrl(url.clone()),
        }
    }
}
