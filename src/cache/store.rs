//! JSON-backed digest cache document.
//!
//! The whole cache is one JSON object mapping canonical relative path to
//! the stat and digest recorded for it:
//!
//! ```json
//! {
//!   "./a.txt": { "size": 5, "mtime": 1700000000, "digest": "..." }
//! }
//! ```
//!
//! Entries live in a `BTreeMap`, so serialization order is the byte order
//! of the paths and two persists of the same mapping are byte-identical.

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tempfile::NamedTempFile;

use super::entry::CacheEntry;

/// Errors that can occur while loading or persisting the cache.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The cache document exists but cannot be understood.
    #[error("Corrupt cache at {path}: {reason}")]
    Corrupt {
        /// Location of the cache document
        path: PathBuf,
        /// What was wrong with it
        reason: String,
    },

    /// Reading or writing the cache failed.
    #[error("Cache I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The advisory lock around the persist step could not be taken.
    #[error("Failed to lock cache {path}: {source}")]
    Lock {
        /// Path of the lock file
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Serializing the cache failed.
    #[error("Failed to serialize cache: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result type alias for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Persistent mapping from canonical relative path to [`CacheEntry`].
///
/// Loaded once per run, mutated while hashing, and persisted once at the
/// end of the hashing phase. Entries for files that no longer exist are
/// kept; they are simply never looked up.
#[derive(Debug)]
pub struct DigestCache {
    path: Option<PathBuf>,
    entries: BTreeMap<String, CacheEntry>,
    dirty: bool,
}

impl DigestCache {
    /// Load the cache document at `path`, or start empty if it is absent.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Corrupt`] when the file exists but is not a
    /// valid cache document. The file is left untouched so nothing is lost.
    pub fn load(path: &Path) -> CacheResult<Self> {
        let content = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::debug!("No cache at {}, starting empty", path.display());
                return Ok(Self {
                    path: Some(path.to_path_buf()),
                    entries: BTreeMap::new(),
                    dirty: false,
                });
            }
            Err(e) => {
                return Err(CacheError::Io {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
        };

        let entries: BTreeMap<String, CacheEntry> =
            serde_json::from_slice(&content).map_err(|e| CacheError::Corrupt {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        log::debug!(
            "Loaded {} cache entries from {}",
            entries.len(),
            path.display()
        );

        Ok(Self {
            path: Some(path.to_path_buf()),
            entries,
            dirty: false,
        })
    }

    /// An empty cache that is never written anywhere.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            path: None,
            entries: BTreeMap::new(),
            dirty: false,
        }
    }

    /// Location of the persisted document, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Look up the entry for a canonical relative path.
    #[must_use]
    pub fn get(&self, relative: &str) -> Option<&CacheEntry> {
        self.entries.get(relative)
    }

    /// Insert or overwrite an entry.
    pub fn put(&mut self, relative: impl Into<String>, entry: CacheEntry) {
        let relative = relative.into();
        if self.entries.get(&relative) != Some(&entry) {
            self.entries.insert(relative, entry);
            self.dirty = true;
        }
    }

    /// Number of entries, including stale ones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether entries changed since load or the last persist.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Iterate entries in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &CacheEntry)> {
        self.entries.iter()
    }

    /// Serialize the cache document.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Serialize`] if JSON encoding fails.
    pub fn to_json(&self) -> CacheResult<String> {
        let mut json = serde_json::to_string_pretty(&self.entries)?;
        json.push('\n');
        Ok(json)
    }

    /// Write the full mapping atomically.
    ///
    /// Takes an advisory lock on `<cache>.lock`, writes a temporary file in
    /// the same directory, syncs it, and renames it over the cache path. A
    /// reader never sees a half-written document. Nothing is written when
    /// the cache is unchanged or in-memory; returns whether a write happened.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Io`] or [`CacheError::Lock`] on filesystem failure.
    pub fn persist(&mut self) -> CacheResult<bool> {
        let Some(path) = self.path.clone() else {
            return Ok(false);
        };
        if !self.dirty && path.exists() {
            log::debug!("Cache unchanged, skipping write to {}", path.display());
            return Ok(false);
        }

        let json = self.to_json()?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|e| CacheError::Io {
            path: dir.clone(),
            source: e,
        })?;

        let lock_path = lock_path_for(&path);
        let lock_file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| CacheError::Io {
                path: lock_path.clone(),
                source: e,
            })?;
        lock_file.lock_exclusive().map_err(|e| CacheError::Lock {
            path: lock_path.clone(),
            source: e,
        })?;

        let io_err = |source: std::io::Error| CacheError::Io {
            path: path.clone(),
            source,
        };

        let mut temp = NamedTempFile::new_in(&dir).map_err(io_err)?;
        temp.write_all(json.as_bytes()).map_err(io_err)?;
        temp.as_file().sync_all().map_err(io_err)?;
        temp.persist(&path).map_err(|e| io_err(e.error))?;

        // Lock released when lock_file is dropped
        drop(lock_file);

        self.dirty = false;
        log::debug!(
            "Persisted {} cache entries to {}",
            self.entries.len(),
            path.display()
        );
        Ok(true)
    }
}

fn lock_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".lock");
    path.with_file_name(name)
}
