//! Scanner module for directory traversal and file hashing.
//!
//! This module provides functionality for:
//! - Parallel directory walking using jwalk
//! - Content hashing with SHA-256
//! - Canonical relative paths (the join key between local and remote)
//! - Cache freshness classification
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Directory traversal and file discovery
//! - [`hasher`]: SHA-256 file hashing (streaming)
//! - [`path_utils`]: Canonical path forms and Unicode normalization
//!
//! # Example
//!
//! ```no_run
//! use collcheck::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("."), WalkerConfig::default());
//! for entry in walker.walk() {
//!     match entry {
//!         Ok(file) => println!("{}: {} bytes", file.relative, file.size),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

pub mod hasher;
pub mod path_utils;
pub mod walker;

use std::fs::Metadata;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::cache::DigestCache;

// Re-export main types
pub use hasher::{digest_bytes, Hasher, StatDigest};
pub use walker::Walker;

/// Metadata for a discovered regular file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Absolute (root-joined) path to the file
    pub path: PathBuf,
    /// Canonical relative path, e.g. `./sub/file.txt`
    pub relative: String,
    /// File size in bytes
    pub size: u64,
    /// Modification time in whole seconds since the Unix epoch
    pub mtime: i64,
}

impl FileEntry {
    /// Create a new FileEntry.
    #[must_use]
    pub fn new(path: PathBuf, relative: impl Into<String>, size: u64, mtime: i64) -> Self {
        Self {
            path,
            relative: relative.into(),
            size,
            mtime,
        }
    }
}

/// Modification time of `metadata` in whole seconds since the epoch.
///
/// Times before the epoch are negative; an unavailable mtime maps to 0.
#[must_use]
pub fn mtime_secs(metadata: &Metadata) -> i64 {
    match metadata.modified() {
        Ok(modified) => system_time_secs(modified),
        Err(_) => 0,
    }
}

/// Convert a `SystemTime` to whole seconds since the epoch.
#[must_use]
pub fn system_time_secs(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) => i64::try_from(d.as_secs()).unwrap_or(i64::MAX),
        Err(e) => {
            let before = e.duration();
            let secs = i64::try_from(before.as_secs()).unwrap_or(i64::MAX);
            // Round toward negative infinity like a filesystem stat would.
            if before.subsec_nanos() > 0 {
                -secs - 1
            } else {
                -secs
            }
        }
    }
}

/// Configuration for directory walking.
#[derive(Debug, Clone, Default)]
pub struct WalkerConfig {
    /// Skip hidden files and directories (names starting with `.`).
    pub skip_hidden: bool,

    /// Glob patterns to ignore (gitignore-style).
    pub ignore_patterns: Vec<String>,
}

impl WalkerConfig {
    /// Create a new configuration.
    #[must_use]
    pub fn new(skip_hidden: bool, ignore_patterns: Vec<String>) -> Self {
        Self {
            skip_hidden,
            ignore_patterns,
        }
    }
}

/// Result of checking a scanned file against the digest cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Freshness {
    /// Cache entry exists with matching size and mtime; carries its digest.
    Fresh(String),
    /// No usable cache entry; the file must be hashed.
    NeedsHash,
}

/// Decide whether `entry` can reuse its cached digest.
///
/// Fresh iff the cache holds an entry for the canonical relative path
/// whose size and mtime both equal the values stat'ed during the walk.
#[must_use]
pub fn classify(entry: &FileEntry, cache: &DigestCache) -> Freshness {
    match cache.get(&entry.relative) {
        Some(cached) if cached.is_fresh(entry.size, entry.mtime) => {
            Freshness::Fresh(cached.digest.clone())
        }
        _ => Freshness::NeedsHash,
    }
}

/// Errors that can occur during directory scanning.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Errors that can occur during file hashing.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The specified file was not found.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl HashError {
    /// Path of the file that failed.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::NotFound(path) | Self::PermissionDenied(path) => path,
            Self::Io { path, .. } => path,
        }
    }
}
