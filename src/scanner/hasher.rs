//! SHA-256 file hasher with streaming support.
//!
//! # Overview
//!
//! The catalog registers checksums as `sha2:<base64(sha256)>`. [`Hasher`]
//! produces the same base64 payload (without the algorithm prefix) by
//! streaming file content through a fixed-size buffer, so memory use does
//! not grow with file size.
//!
//! # Example
//!
//! ```no_run
//! use collcheck::scanner::Hasher;
//! use std::path::Path;
//!
//! let hasher = Hasher::new();
//! let digest = hasher.digest_file(Path::new("Cargo.toml")).unwrap();
//! assert_eq!(digest.len(), 44);
//! ```

use std::fs::{self, File, Metadata};
use std::io::{ErrorKind, Read};
use std::path::Path;
use std::time::SystemTime;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use sha2::{Digest, Sha256};

use super::{mtime_secs, HashError};

/// Read buffer size used while streaming file content.
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// A digest together with the stat that was current when it was taken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatDigest {
    /// Base64 SHA-256 digest
    pub digest: String,
    /// Size when the file was opened
    pub size: u64,
    /// Modification time (whole seconds) when the file was opened
    pub mtime: i64,
    /// False if size or modification time moved while the file was read
    pub stable: bool,
}

/// Streaming content hasher.
#[derive(Debug, Clone)]
pub struct Hasher {
    buffer_size: usize,
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher {
    /// Create a hasher with the default buffer size.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }

    /// Create a hasher with a custom read buffer size (minimum 1 byte).
    #[must_use]
    pub fn with_buffer_size(buffer_size: usize) -> Self {
        Self {
            buffer_size: buffer_size.max(1),
        }
    }

    /// Hash the full content of a file.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file cannot be opened or read. The
    /// error kind is preserved so callers can tell a vanished file from a
    /// permission problem.
    pub fn digest_file(&self, path: &Path) -> Result<String, HashError> {
        let mut file = File::open(path).map_err(|e| map_io_error(path, e))?;
        self.digest_reader(&mut file, path)
    }

    /// Hash a file and report the stat it was hashed under.
    ///
    /// The stat is read from the open handle before hashing and from the
    /// path afterwards, at full timestamp precision. Only a
    /// [`StatDigest::stable`] result may be paired with its stat in a cache.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file cannot be opened, read, or stat'ed.
    pub fn digest_file_with_stat(&self, path: &Path) -> Result<StatDigest, HashError> {
        let mut file = File::open(path).map_err(|e| map_io_error(path, e))?;
        let before = file.metadata().map_err(|e| map_io_error(path, e))?;
        let digest = self.digest_reader(&mut file, path)?;
        let after = fs::metadata(path).map_err(|e| map_io_error(path, e))?;

        Ok(StatDigest {
            digest,
            size: before.len(),
            mtime: mtime_secs(&before),
            stable: stat_key(&before) == stat_key(&after),
        })
    }

    fn digest_reader(&self, file: &mut File, path: &Path) -> Result<String, HashError> {
        let mut hasher = Sha256::new();
        let mut buffer = vec![0u8; self.buffer_size];

        loop {
            let read = match file.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(map_io_error(path, e)),
            };
            hasher.update(&buffer[..read]);
        }

        Ok(STANDARD.encode(hasher.finalize()))
    }
}

/// Size and full-precision modification time.
fn stat_key(metadata: &Metadata) -> (u64, Option<SystemTime>) {
    (metadata.len(), metadata.modified().ok())
}

/// Hash an in-memory buffer the same way [`Hasher::digest_file`] hashes a file.
#[must_use]
pub fn digest_bytes(data: &[u8]) -> String {
    STANDARD.encode(Sha256::digest(data))
}

fn map_io_error(path: &Path, error: std::io::Error) -> HashError {
    match error.kind() {
        ErrorKind::NotFound => HashError::NotFound(path.to_path_buf()),
        ErrorKind::PermissionDenied => HashError::PermissionDenied(path.to_path_buf()),
        _ => HashError::Io {
            path: path.to_path_buf(),
            source: error,
        },
    }
}
