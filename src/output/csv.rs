//! CSV output formatter for audit results.
//!
//! One row per discrepancy, in path order, with a header row.
//!
//! # Columns
//!
//! - `kind`: `local-only`, `remote-only` or `digest-mismatch`
//! - `path`: canonical relative path
//! - `local_digest`: empty when the path is absent locally
//! - `remote_digest`: empty when the path is absent remotely

use std::io;

use serde::Serialize;
use thiserror::Error;

use crate::audit::AuditReport;
use crate::reconcile::Discrepancy;

/// Errors that can occur during CSV output generation.
#[derive(Debug, Error)]
pub enum CsvOutputError {
    /// I/O error during writing.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error during CSV serialization.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    kind: &'static str,
    path: &'a str,
    local_digest: &'a str,
    remote_digest: &'a str,
}

impl<'a> From<&'a Discrepancy> for CsvRow<'a> {
    fn from(d: &'a Discrepancy) -> Self {
        Self {
            kind: d.kind.tag(),
            path: &d.path,
            local_digest: d.local_digest.as_deref().unwrap_or(""),
            remote_digest: d.remote_digest.as_deref().unwrap_or(""),
        }
    }
}

/// CSV output formatter.
pub struct CsvOutput<'a> {
    discrepancies: &'a [Discrepancy],
}

impl<'a> CsvOutput<'a> {
    /// Create a new CSV output formatter.
    #[must_use]
    pub fn new(report: &'a AuditReport) -> Self {
        Self {
            discrepancies: &report.reconciliation.discrepancies,
        }
    }

    /// Write the CSV output to the given writer.
    ///
    /// The header row is written even when there are no discrepancies.
    ///
    /// # Errors
    ///
    /// Returns `CsvOutputError` if writing or serialization fails.
    pub fn write_to<W: io::Write>(&self, writer: W) -> Result<(), CsvOutputError> {
        let mut csv_writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);
        csv_writer.write_record(["kind", "path", "local_digest", "remote_digest"])?;
        for discrepancy in self.discrepancies {
            csv_writer.serialize(CsvRow::from(discrepancy))?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    /// Generate CSV output as a string.
    ///
    /// # Errors
    ///
    /// Returns `CsvOutputError` if serialization fails.
    pub fn to_string(&self) -> Result<String, CsvOutputError> {
        let mut buffer = Vec::new();
        self.write_to(&mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).to_string())
    }
}
