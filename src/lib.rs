//! collcheck - local tree vs. remote collection checksum reconciliation
//!
//! Hashes every regular file below a local root (SHA-256, base64, cached
//! across runs by size and mtime), fetches the digests a remote
//! data-management service holds for a collection, and reports every path
//! that is missing on one side or whose digests disagree. Optionally
//! writes the verified digest and check time back onto each remote object.
//!
//! The library entry point is [`audit::Auditor`]; [`run_app`] wires it to
//! the command line, configuration, logging and report rendering.

pub mod annotate;
pub mod audit;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod manifest;
pub mod output;
pub mod progress;
pub mod reconcile;
pub mod remote;
pub mod scanner;

use std::io::{IsTerminal, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;

use crate::audit::{validate_root, Auditor};
use crate::cli::Cli;
use crate::config::Config;
use crate::error::ExitCode;
use crate::output::text::summary_line;
use crate::output::write_report;
use crate::progress::{Progress, ProgressCallback};
use crate::remote::{Catalog, IcommandsCatalog};

/// Run the application for parsed command-line arguments.
///
/// Returns the exit code for a completed audit (match or mismatch).
///
/// # Errors
///
/// Any error means the audit could not be completed and maps to
/// [`ExitCode::ExecutionError`].
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet, !cli.no_color);
    let color = report_color(cli.no_color, std::io::stdout().is_terminal());
    if !color {
        yansi::disable();
    }

    let mut config =
        Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    config.apply_cli(&cli)?;
    log::debug!("Effective configuration: {:?}", config);

    validate_root(&cli.local_dir)?;
    let catalog = IcommandsCatalog::locate().context("Missing remote client dependency")?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    run_with_catalog(&config, &cli.local_dir, &cli.collection, &catalog, color, &mut out)
}

/// Whether the report on stdout is colored.
///
/// Redirected output never carries ANSI escapes.
#[must_use]
pub fn report_color(no_color: bool, stdout_is_terminal: bool) -> bool {
    !no_color && stdout_is_terminal
}

/// Audit `root` against `collection` in `catalog` and render the report.
///
/// # Errors
///
/// Returns an error if the audit fails or the report cannot be written.
pub fn run_with_catalog<W: Write>(
    config: &Config,
    root: &Path,
    collection: &str,
    catalog: &dyn Catalog,
    color: bool,
    writer: &mut W,
) -> anyhow::Result<ExitCode> {
    let progress = config
        .progress
        .then(|| Arc::new(Progress::new(false)) as Arc<dyn ProgressCallback>);
    let auditor = Auditor::new(config.audit_config(progress));

    let report = auditor.run(root, collection, catalog).with_context(|| {
        format!(
            "Audit of {} against '{}' failed",
            root.display(),
            collection
        )
    })?;

    if report.hashing.failed > 0 {
        log::warn!(
            "{} files could not be hashed and were left out of the local manifest",
            report.hashing.failed
        );
    }
    if let Some(ref annotation) = report.annotation {
        if annotation.is_clean() {
            log::info!("Annotated {} attributes", annotation.written);
        } else {
            log::warn!(
                "Annotation: {} attributes written, {} failed",
                annotation.written,
                annotation.failures.len()
            );
        }
    }

    write_report(&report, config.output, color, writer).context("Failed to write report")?;
    log::info!("{}", summary_line(&report));

    Ok(report.exit_code())
}
