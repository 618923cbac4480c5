//! Human-readable discrepancy report.
//!
//! One line per discrepancy, in path order:
//!
//! ```text
//! local-only	./new.txt	local=Zm9v...
//! digest-mismatch	./data.csv	local=YmFy...	remote=cXV4...
//! remote-only	./old.txt	remote=YmF6...
//! ```
//!
//! A matching audit produces no lines at all.

use std::io::{self, Write};

use yansi::{Paint, Style};

use crate::audit::AuditReport;
use crate::reconcile::{Discrepancy, DiscrepancyKind};

/// Text report formatter.
pub struct TextOutput<'a> {
    report: &'a AuditReport,
    color: bool,
}

impl<'a> TextOutput<'a> {
    /// Create a text formatter. With `color`, tags are styled by kind.
    #[must_use]
    pub fn new(report: &'a AuditReport, color: bool) -> Self {
        Self { report, color }
    }

    /// Write every discrepancy line to `writer`.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        for discrepancy in &self.report.reconciliation.discrepancies {
            writeln!(writer, "{}", self.line(discrepancy))?;
        }
        writer.flush()
    }

    fn line(&self, discrepancy: &Discrepancy) -> String {
        let tag = discrepancy.kind.tag();
        let mut line = if self.color {
            format!("{}\t{}", tag.paint(style_for(discrepancy.kind)), discrepancy.path)
        } else {
            format!("{tag}\t{}", discrepancy.path)
        };
        if let Some(ref digest) = discrepancy.local_digest {
            line.push_str("\tlocal=");
            line.push_str(digest);
        }
        if let Some(ref digest) = discrepancy.remote_digest {
            line.push_str("\tremote=");
            line.push_str(digest);
        }
        line
    }
}

fn style_for(kind: DiscrepancyKind) -> Style {
    match kind {
        DiscrepancyKind::LocalOnly => Style::new().yellow(),
        DiscrepancyKind::RemoteOnly => Style::new().cyan(),
        DiscrepancyKind::DigestMismatch => Style::new().red().bold(),
    }
}

/// One-line summary of a report, for the log.
#[must_use]
pub fn summary_line(report: &AuditReport) -> String {
    let r = &report.reconciliation;
    format!(
        "{} local, {} remote: {} matched, {} local-only, {} remote-only, {} digest-mismatch",
        report.local_files,
        report.remote_objects,
        r.matched,
        r.count(DiscrepancyKind::LocalOnly),
        r.count(DiscrepancyKind::RemoteOnly),
        r.count(DiscrepancyKind::DigestMismatch)
    )
}
