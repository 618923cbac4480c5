//! JSON output formatter for audit results.
//!
//! Provides machine-readable JSON output for scripting and automation.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "status": "mismatch",
//!   "exit_code": 1,
//!   "exit_code_name": "CC001",
//!   "collection": "/tempZone/home/alice/survey",
//!   "summary": {
//!     "local_files": 2,
//!     "remote_objects": 3,
//!     "matched": 2,
//!     "local_only": 0,
//!     "remote_only": 1,
//!     "digest_mismatch": 0,
//!     "hashed": 1,
//!     "cached": 1,
//!     "hash_failures": 0,
//!     "scan_errors": 0
//!   },
//!   "discrepancies": [
//!     { "kind": "remote-only", "path": "./c.txt", "remote_digest": "..." }
//!   ]
//! }
//! ```
//!
//! An `annotation` object (`written`, `failures`) is added when the
//! annotation step ran.

use std::io::Write;

use serde::Serialize;

use crate::annotate::AnnotationReport;
use crate::audit::AuditReport;
use crate::reconcile::{Discrepancy, DiscrepancyKind, Outcome};

/// Summary statistics in JSON format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JsonSummary {
    /// Records in the local manifest
    pub local_files: usize,
    /// Records in the remote manifest
    pub remote_objects: usize,
    /// Paths with equal digests on both sides
    pub matched: usize,
    /// Paths present only locally
    pub local_only: usize,
    /// Paths present only remotely
    pub remote_only: usize,
    /// Paths whose digests differ
    pub digest_mismatch: usize,
    /// Digests computed in this run
    pub hashed: usize,
    /// Digests reused from the cache
    pub cached: usize,
    /// Files that could not be hashed
    pub hash_failures: usize,
    /// Entries the scanner could not read
    pub scan_errors: usize,
}

impl JsonSummary {
    /// Create a JSON summary from an audit report.
    #[must_use]
    pub fn from_report(report: &AuditReport) -> Self {
        let r = &report.reconciliation;
        Self {
            local_files: report.local_files,
            remote_objects: report.remote_objects,
            matched: r.matched,
            local_only: r.count(DiscrepancyKind::LocalOnly),
            remote_only: r.count(DiscrepancyKind::RemoteOnly),
            digest_mismatch: r.count(DiscrepancyKind::DigestMismatch),
            hashed: report.hashing.hashed,
            cached: report.hashing.cached,
            hash_failures: report.hashing.failed,
            scan_errors: report.scan_errors,
        }
    }
}

/// Complete JSON output structure.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    /// Overall verdict
    pub status: Outcome,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g., "CC001")
    pub exit_code_name: String,
    /// Resolved absolute collection path
    pub collection: String,
    /// Counts
    pub summary: JsonSummary,
    /// Discrepancies in path order
    pub discrepancies: Vec<Discrepancy>,
    /// Annotation result, when annotation ran
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotation: Option<AnnotationReport>,
}

impl JsonOutput {
    /// Create a JSON output from an audit report.
    #[must_use]
    pub fn new(report: &AuditReport) -> Self {
        let exit_code = report.exit_code();
        Self {
            status: report.outcome(),
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix().to_string(),
            collection: report.collection.clone(),
            summary: JsonSummary::from_report(report),
            discrepancies: report.reconciliation.discrepancies.clone(),
            annotation: report.annotation.clone(),
        }
    }

    /// Serialize to compact JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (unlikely for valid data).
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (unlikely for valid data).
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write JSON followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W, pretty: bool) -> Result<(), JsonOutputError> {
        let json = if pretty {
            self.to_json_pretty()?
        } else {
            self.to_json()?
        };
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

/// Errors that can occur during JSON output.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error during writing
    #[error("I/O error during JSON generation: {0}")]
    Io(#[from] std::io::Error),
}
