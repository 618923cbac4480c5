//! Cache entry definitions.

use serde::{Deserialize, Serialize};

/// Cached digest of one file, keyed by its canonical relative path.
///
/// The entry is only trusted while both `size` and `mtime` still match
/// the file on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// File size in bytes when the digest was computed
    pub size: u64,
    /// Modification time (seconds since epoch) when the digest was computed
    pub mtime: i64,
    /// Base64 SHA-256 digest of the content
    pub digest: String,
}

impl CacheEntry {
    /// Create a new entry.
    #[must_use]
    pub fn new(size: u64, mtime: i64, digest: impl Into<String>) -> Self {
        Self {
            size,
            mtime,
            digest: digest.into(),
        }
    }

    /// Whether this entry still describes a file with the given stat values.
    #[must_use]
    pub fn is_fresh(&self, size: u64, mtime: i64) -> bool {
        self.size == size && self.mtime == mtime
    }
}
