//! Structured error handling and exit codes.

use serde::Serialize;

use crate::cache::CacheError;
use crate::config::ConfigError;
use crate::remote::RemoteError;

/// Exit codes for the collcheck application.
///
/// - 0: Match (every path agrees on both sides)
/// - 1: Mismatch (the discrepancy report is non-empty)
/// - 2: Execution error (invalid input, corrupt cache, remote failure)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitCode {
    /// Local and remote manifests are identical.
    Match = 0,
    /// At least one discrepancy was found.
    Mismatch = 1,
    /// The audit could not be completed.
    ExecutionError = 2,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Match => "CC000",
            Self::Mismatch => "CC001",
            Self::ExecutionError => "CC002",
        }
    }

    /// Get the snake_case name used in JSON reports.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Match => "match",
            Self::Mismatch => "mismatch",
            Self::ExecutionError => "execution_error",
        }
    }
}

/// Errors that stop an audit run.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    /// Invalid input or configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The cache document exists but is malformed. It is left in place.
    #[error("{0}; refusing to continue (move the file aside to rebuild it)")]
    CorruptCache(#[source] CacheError),

    /// The cache could not be read or written.
    #[error(transparent)]
    Cache(CacheError),

    /// Registration or the remote query failed.
    #[error("Remote catalog error: {0}")]
    Remote(#[from] RemoteError),

    /// The remote side reported no objects for the collection.
    #[error("Remote query returned no objects under {collection}")]
    RemoteQueryEmpty {
        /// Resolved absolute collection path
        collection: String,
    },
}

impl From<CacheError> for AuditError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::Corrupt { .. } => Self::CorruptCache(err),
            other => Self::Cache(other),
        }
    }
}

impl AuditError {
    /// Every audit error ends the process with [`ExitCode::ExecutionError`].
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        ExitCode::ExecutionError
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "CC002")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message
    pub message: String,
    /// Underlying causes, outermost first
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub causes: Vec<String>,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: err.to_string(),
            causes: err.chain().skip(1).map(ToString::to_string).collect(),
        }
    }
}
