//! Remote catalog access.
//!
//! The core never talks to the data-management service directly; it goes
//! through the [`Catalog`] capability set:
//!
//! * [`Catalog::resolve`] turns a user-supplied collection into an absolute path
//! * [`Catalog::register`] asks the service to (re)compute digests recursively
//! * [`Catalog::query`] lists `(parent, name, digest)` for every object below
//! * [`Catalog::annotate`] sets one key/value attribute on one object
//!
//! # Implementations
//!
//! * [`icommands::IcommandsCatalog`]: drives the iRODS icommands
//!   (`ipwd`, `ichksum`, `iquest`, `imeta`).
//! * [`memory::MemoryCatalog`]: in-process catalog for tests and benches.

pub mod icommands;
pub mod memory;

use std::path::PathBuf;

pub use icommands::IcommandsCatalog;
pub use memory::MemoryCatalog;

/// One object as reported by the catalog, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    /// Absolute path of the collection holding the object
    pub parent: String,
    /// Object name within `parent`
    pub name: String,
    /// Stored digest, possibly carrying an algorithm prefix such as `sha2:`
    pub digest: String,
}

impl RawRecord {
    /// Create a new raw record.
    #[must_use]
    pub fn new(
        parent: impl Into<String>,
        name: impl Into<String>,
        digest: impl Into<String>,
    ) -> Self {
        Self {
            parent: parent.into(),
            name: name.into(),
            digest: digest.into(),
        }
    }

    /// `parent/name` as reported, without separator cleanup.
    #[must_use]
    pub fn full_path(&self) -> String {
        format!("{}/{}", self.parent, self.name)
    }
}

/// Errors raised by catalog implementations.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// A required client tool is not installed.
    #[error("Required command '{tool}' not found on PATH")]
    MissingTool {
        /// Name of the missing executable
        tool: String,
    },

    /// A client tool could not be started.
    #[error("Failed to run {command}: {source}")]
    Spawn {
        /// Program that failed to start
        command: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A client tool exited unsuccessfully.
    #[error("{command} failed ({status}): {stderr}")]
    CommandFailed {
        /// Program and leading arguments
        command: String,
        /// Exit status description
        status: String,
        /// Trimmed standard error output
        stderr: String,
    },

    /// The collection name cannot be expressed safely in a query.
    #[error("Invalid collection name '{0}'")]
    InvalidCollection(String),

    /// The tool produced output that could not be understood.
    #[error("Unexpected catalog output: {0}")]
    Output(String),

    /// The service rejected an operation on an object.
    #[error("Catalog rejected operation on {object}: {reason}")]
    Rejected {
        /// Absolute object path
        object: String,
        /// Reason reported by the service
        reason: String,
    },
}

/// Typed access to the remote data-management service.
///
/// Calls are blocking and issued at most once per run (annotation aside,
/// which is once per object). Implementations must not retry on their own.
pub trait Catalog {
    /// Resolve a collection name to an absolute, normalized collection path.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] if the working collection cannot be determined.
    fn resolve(&self, collection: &str) -> Result<String, RemoteError>;

    /// Idempotently request digest (re)computation for every object below
    /// `collection`, recursively.
    ///
    /// # Errors
    ///
    /// Any failure is fatal to the run: later queries would report stale
    /// or missing digests.
    fn register(&self, collection: &str) -> Result<(), RemoteError>;

    /// List every object whose parent equals or is nested below `collection`.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] if the query cannot be executed.
    fn query(&self, collection: &str) -> Result<Vec<RawRecord>, RemoteError>;

    /// Set `key = value` on the object at absolute path `object`.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] if the attribute cannot be written.
    fn annotate(&self, object: &str, key: &str, value: &str) -> Result<(), RemoteError>;
}
