//! Report formatters for audit results.
//!
//! This module renders an [`AuditReport`] in one of three formats:
//! - Text: one tagged line per discrepancy, in path order
//! - JSON for automation and scripting
//! - CSV for spreadsheet import
//!
//! # Example
//!
//! ```no_run
//! use collcheck::audit::{AuditConfig, Auditor};
//! use collcheck::cli::OutputFormat;
//! use collcheck::output::write_report;
//! use collcheck::remote::IcommandsCatalog;
//! use std::path::Path;
//!
//! let catalog = IcommandsCatalog::locate().unwrap();
//! let report = Auditor::new(AuditConfig::default())
//!     .run(Path::new("data"), "data", &catalog)
//!     .unwrap();
//! write_report(&report, OutputFormat::Json, false, &mut std::io::stdout()).unwrap();
//! ```

pub mod csv;
pub mod json;
pub mod text;

use std::io::Write;

use crate::audit::AuditReport;
use crate::cli::OutputFormat;

// Re-export main types
pub use csv::{CsvOutput, CsvOutputError};
pub use json::{JsonOutput, JsonOutputError};
pub use text::TextOutput;

/// Errors that can occur while writing a report.
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// Writing the text report failed.
    #[error("Failed to write report: {0}")]
    Io(#[from] std::io::Error),

    /// Writing the JSON report failed.
    #[error(transparent)]
    Json(#[from] JsonOutputError),

    /// Writing the CSV report failed.
    #[error(transparent)]
    Csv(#[from] CsvOutputError),
}

/// Render `report` to `writer` in the requested format.
///
/// `color` only affects the text format.
///
/// # Errors
///
/// Returns [`OutputError`] if serialization or writing fails.
pub fn write_report<W: Write>(
    report: &AuditReport,
    format: OutputFormat,
    color: bool,
    writer: &mut W,
) -> Result<(), OutputError> {
    match format {
        OutputFormat::Text => TextOutput::new(report, color).write_to(writer)?,
        OutputFormat::Json => JsonOutput::new(report).write_to(writer, true)?,
        OutputFormat::Csv => CsvOutput::new(report).write_to(writer)?,
    }
    Ok(())
}
