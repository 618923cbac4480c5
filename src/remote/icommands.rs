//! [`Catalog`] implementation backed by the iRODS icommands.
//!
//! All text handling of icommand output is confined to this file. Queries
//! use a GenQuery format string with an ASCII unit separator (0x1F) between
//! columns, so names containing spaces, tabs, or `|` survive intact.

use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use super::{Catalog, RawRecord, RemoteError};
use crate::scanner::path_utils::normalize_collection_path;

/// Column separator used in `iquest` format strings.
const FIELD_SEPARATOR: char = '\u{1f}';

/// Marker printed by `iquest` when a query matches nothing.
const NO_ROWS_MARKER: &str = "CAT_NO_ROWS_FOUND";

/// Catalog client that shells out to the icommands.
#[derive(Debug, Clone)]
pub struct IcommandsCatalog {
    ipwd: PathBuf,
    ichksum: PathBuf,
    iquest: PathBuf,
    imeta: PathBuf,
}

impl IcommandsCatalog {
    /// Locate all required icommands on `PATH`.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::MissingTool`] naming the first tool not found.
    pub fn locate() -> Result<Self, RemoteError> {
        let find = |tool: &str| {
            which::which(tool).map_err(|_| RemoteError::MissingTool {
                tool: tool.to_string(),
            })
        };
        let catalog = Self {
            ipwd: find("ipwd")?,
            ichksum: find("ichksum")?,
            iquest: find("iquest")?,
            imeta: find("imeta")?,
        };
        log::debug!("Using icommands from {}", catalog.iquest.display());
        Ok(catalog)
    }

    fn run(&self, program: &Path, args: &[&str]) -> Result<Output, RemoteError> {
        log::trace!("Running {} {:?}", program.display(), args);
        Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|source| RemoteError::Spawn {
                command: program.to_path_buf(),
                source,
            })
    }

    fn run_checked(&self, program: &Path, args: &[&str]) -> Result<String, RemoteError> {
        let output = self.run(program, args)?;
        if !output.status.success() {
            return Err(command_failed(program, args, &output));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn iquest(&self, condition: &str) -> Result<Vec<RawRecord>, RemoteError> {
        let format = format!("%s{FIELD_SEPARATOR}%s{FIELD_SEPARATOR}%s");
        let query = format!("select COLL_NAME, DATA_NAME, DATA_CHECKSUM where {condition}");
        let args = ["--no-page", format.as_str(), query.as_str()];
        let output = self.run(&self.iquest, &args)?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        if stdout.contains(NO_ROWS_MARKER) || stderr.contains(NO_ROWS_MARKER) {
            log::debug!("No rows for condition {}", condition);
            return Ok(Vec::new());
        }
        if !output.status.success() {
            return Err(command_failed(&self.iquest, &args, &output));
        }
        parse_rows(&stdout)
    }
}

impl Catalog for IcommandsCatalog {
    fn resolve(&self, collection: &str) -> Result<String, RemoteError> {
        if collection.starts_with('/') {
            return Ok(normalize_collection_path(collection));
        }
        let cwd = self.run_checked(&self.ipwd, &[])?;
        let cwd = cwd.trim();
        if !cwd.starts_with('/') {
            return Err(RemoteError::Output(format!(
                "ipwd returned a non-absolute collection: '{cwd}'"
            )));
        }
        Ok(normalize_collection_path(&format!("{cwd}/{collection}")))
    }

    fn register(&self, collection: &str) -> Result<(), RemoteError> {
        log::info!("Requesting checksum registration for {}", collection);
        self.run_checked(&self.ichksum, &["-r", collection])?;
        Ok(())
    }

    fn query(&self, collection: &str) -> Result<Vec<RawRecord>, RemoteError> {
        let collection = quote_collection(collection)?;
        // LIKE '<c>/%' does not match <c> itself, so the direct children
        // need their own exact-match query.
        let mut records = self.iquest(&format!("COLL_NAME = '{collection}'"))?;
        let nested_pattern = if collection == "/" {
            "/%".to_string()
        } else {
            format!("{collection}/%")
        };
        records.extend(self.iquest(&format!("COLL_NAME like '{nested_pattern}'"))?);
        log::debug!("Catalog returned {} rows for {}", records.len(), collection);
        Ok(records)
    }

    fn annotate(&self, object: &str, key: &str, value: &str) -> Result<(), RemoteError> {
        let args = ["set", "-d", object, key, value];
        let output = self.run(&self.imeta, &args)?;
        if output.status.success() {
            Ok(())
        } else {
            Err(RemoteError::Rejected {
                object: object.to_string(),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}

/// Validate a collection path for embedding in a GenQuery literal.
fn quote_collection(collection: &str) -> Result<&str, RemoteError> {
    if collection.contains('\'') || collection.contains('\n') {
        return Err(RemoteError::InvalidCollection(collection.to_string()));
    }
    Ok(collection)
}

/// Parse `iquest` output produced with the unit-separator format.
fn parse_rows(stdout: &str) -> Result<Vec<RawRecord>, RemoteError> {
    let mut records = Vec::new();
    for line in stdout.lines() {
        if line.is_empty() {
            continue;
        }
        let mut fields = line.splitn(3, FIELD_SEPARATOR);
        match (fields.next(), fields.next(), fields.next()) {
            (Some(parent), Some(name), Some(digest)) => {
                records.push(RawRecord::new(parent, name, digest.trim_end()));
            }
            _ => {
                return Err(RemoteError::Output(format!(
                    "malformed iquest row: '{}'",
                    line.replace(FIELD_SEPARATOR, "\\x1f")
                )))
            }
        }
    }
    Ok(records)
}

fn command_failed(program: &Path, args: &[&str], output: &Output) -> RemoteError {
    let name = program
        .file_name()
        .map_or_else(|| program.display().to_string(), |n| n.to_string_lossy().into_owned());
    let leading = args.first().map(|a| format!(" {a}")).unwrap_or_default();
    RemoteError::CommandFailed {
        command: format!("{name}{leading}"),
        status: output.status.to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    }
}
