//! Command-line interface definitions for collcheck.
//!
//! This module defines all CLI arguments and options using the clap derive API.
//! Options left unset fall through to the layered configuration
//! (see [`crate::config`]).
//!
//! # Example
//!
//! ```bash
//! # Audit a local tree against a collection below the working collection
//! collcheck ./survey-2024 survey-2024
//!
//! # Audit against an absolute collection and record the result remotely
//! collcheck --annotate ./survey-2024 /tempZone/home/alice/survey-2024
//!
//! # Machine-readable report with eight hashing workers
//! collcheck -j 8 --output json ./survey-2024 survey-2024
//! ```

use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Reconcile a local directory tree against checksums in a remote collection.
///
/// collcheck hashes every regular file below LOCAL_DIR (SHA-256, cached
/// across runs by size and mtime), asks the data-management service to
/// register digests for COLLECTION, and reports every path that is missing
/// on one side or whose digests disagree.
///
/// Exit status: 0 = match, 1 = mismatch, 2 = execution error.
#[derive(Debug, Parser)]
#[command(name = "collcheck")]
#[command(author, version, about, long_about)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Local directory to audit
    #[arg(value_name = "LOCAL_DIR")]
    pub local_dir: PathBuf,

    /// Remote collection, relative to the working collection or absolute
    #[arg(value_name = "COLLECTION")]
    pub collection: String,

    /// Write the verified digest and check time onto each remote object
    #[arg(long)]
    pub annotate: bool,

    /// Number of hashing workers (default: available CPUs)
    #[arg(short, long, value_name = "N", value_parser = parse_jobs)]
    pub jobs: Option<usize>,

    /// Path to the digest cache document
    ///
    /// Relative paths are resolved against the invocation directory.
    #[arg(long, value_name = "PATH")]
    pub cache: Option<PathBuf>,

    /// Report format
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Skip hidden files and directories (starting with .)
    #[arg(long)]
    pub skip_hidden: bool,

    /// Glob patterns to exclude from the local scan (repeatable)
    #[arg(long = "ignore", value_name = "PATTERN")]
    pub ignore_patterns: Vec<String>,

    /// Disable the progress bar
    #[arg(long)]
    pub no_progress: bool,

    /// Read configuration from FILE instead of ./collcheck.toml
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print fatal errors as JSON on stderr
    #[arg(long)]
    pub json_errors: bool,
}

/// Output format for the discrepancy report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One tagged line per discrepancy
    #[default]
    Text,
    /// JSON document with summary and discrepancies
    Json,
    /// CSV rows for spreadsheets
    Csv,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}

/// Parse a worker count; zero is rejected.
///
/// # Examples
///
/// ```
/// use collcheck::cli::parse_jobs;
///
/// assert_eq!(parse_jobs("8").unwrap(), 8);
/// assert!(parse_jobs("0").is_err());
/// ```
///
/// # Errors
///
/// Returns an error if the string is not a positive integer.
pub fn parse_jobs(s: &str) -> Result<usize, String> {
    let jobs: usize = s
        .trim()
        .parse()
        .map_err(|_| format!("Invalid number: '{s}'"))?;
    if jobs == 0 {
        return Err("Job count must be at least 1".to_string());
    }
    Ok(jobs)
}
