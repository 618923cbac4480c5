//! Parallel digest computation over a bounded rayon pool.
//!
//! Each file is read and hashed independently. A file that cannot be read
//! (permission denied, removed mid-run) is logged and reported in
//! [`HashingStats::errors`]; it produces no cache entry and never aborts
//! the batch. Each cache entry carries the stat read when its file was
//! opened; a file whose stat moves while it is read still yields a digest
//! for this run but is marked not cacheable. Completion order across
//! workers is unspecified, and the
//! results are keyed by unique relative path, so merging them into the
//! cache is order-independent.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rayon::prelude::*;

use crate::cache::CacheEntry;
use crate::progress::{ProgressCallback, PHASE_HASH};
use crate::scanner::{FileEntry, HashError, Hasher};

/// Files above this size are logged at debug level when hashed.
const LARGE_FILE_THRESHOLD: u64 = 100 * 1024 * 1024;

/// Configuration for the hashing phase.
#[derive(Clone)]
pub struct HashingConfig {
    /// Worker pool size.
    pub jobs: usize,
    /// Optional progress callback.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for HashingConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HashingConfig")
            .field("jobs", &self.jobs)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for HashingConfig {
    fn default() -> Self {
        Self {
            jobs: default_jobs(),
            progress_callback: None,
        }
    }
}

impl HashingConfig {
    /// Set the worker pool size (minimum 1).
    #[must_use]
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }
}

/// Number of available processing units, or 4 if unknown.
#[must_use]
pub fn default_jobs() -> usize {
    std::thread::available_parallelism()
        .map(std::num::NonZeroUsize::get)
        .unwrap_or(4)
}

/// A freshly computed digest for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashedFile {
    /// Canonical relative path
    pub relative: String,
    /// Cache entry built from the hash-time stat and the new digest
    pub entry: CacheEntry,
    /// False when the file changed while it was read
    pub cacheable: bool,
}

/// Statistics from the hashing phase.
#[derive(Debug, Default)]
pub struct HashingStats {
    /// Files scanned in this run
    pub candidates: usize,
    /// Files whose cached digest was reused
    pub cached: usize,
    /// Files whose digest was computed in this run
    pub hashed: usize,
    /// Files that could not be hashed
    pub failed: usize,
    /// Hashed files left out of the cache because they changed mid-read
    pub unstable: usize,
    /// Bytes read while hashing
    pub bytes_hashed: u64,
    /// Per-file hashing errors
    pub errors: Vec<HashError>,
}

/// Compute digests for `files` using a pool of `config.jobs` workers.
///
/// Returns one [`HashedFile`] per successfully hashed input plus the
/// per-file errors. `stats.candidates` and `stats.cached` are left for the
/// caller, which knows how many files were classified fresh.
#[must_use]
pub fn compute_digests(
    files: Vec<FileEntry>,
    hasher: &Hasher,
    config: &HashingConfig,
) -> (Vec<HashedFile>, HashingStats) {
    let mut stats = HashingStats::default();

    if files.is_empty() {
        log::debug!("Hashing: nothing to do");
        return (Vec::new(), stats);
    }

    if let Some(ref callback) = config.progress_callback {
        callback.on_phase_start(PHASE_HASH, files.len());
    }

    log::info!(
        "Hashing {} files with {} workers",
        files.len(),
        config.jobs
    );

    let completed = AtomicUsize::new(0);
    let hash_one = |file: FileEntry| -> Result<HashedFile, HashError> {
        if file.size > LARGE_FILE_THRESHOLD {
            log::debug!(
                "Hashing large file ({}): {}",
                bytesize::ByteSize(file.size),
                file.path.display()
            );
        }

        let result = hasher.digest_file_with_stat(&file.path);

        let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
        if let Some(ref callback) = config.progress_callback {
            callback.on_progress(done, &file.relative);
        }

        match result {
            Ok(hashed) => {
                log::trace!("Digest computed: {}", file.relative);
                if !hashed.stable {
                    log::warn!(
                        "{} changed while it was hashed; digest not cached",
                        file.path.display()
                    );
                }
                if let Some(ref callback) = config.progress_callback {
                    callback.on_item_completed(hashed.size);
                }
                Ok(HashedFile {
                    entry: CacheEntry::new(hashed.size, hashed.mtime, hashed.digest),
                    relative: file.relative,
                    cacheable: hashed.stable,
                })
            }
            Err(e) => {
                log::warn!("Failed to hash {}: {}", file.path.display(), e);
                Err(e)
            }
        }
    };

    let results: Vec<Result<HashedFile, HashError>> =
        match rayon::ThreadPoolBuilder::new().num_threads(config.jobs).build() {
            Ok(pool) => pool.install(|| files.into_par_iter().map(hash_one).collect()),
            Err(e) => {
                log::warn!(
                    "Failed to create hashing pool ({}), using global pool with {} threads",
                    e,
                    rayon::current_num_threads()
                );
                files.into_par_iter().map(hash_one).collect()
            }
        };

    let mut hashed = Vec::with_capacity(results.len());
    for result in results {
        match result {
            Ok(file) => {
                stats.hashed += 1;
                if !file.cacheable {
                    stats.unstable += 1;
                }
                stats.bytes_hashed += file.entry.size;
                hashed.push(file);
            }
            Err(e) => {
                stats.failed += 1;
                stats.errors.push(e);
            }
        }
    }

    if let Some(ref callback) = config.progress_callback {
        callback.on_phase_end(PHASE_HASH);
    }

    log::info!(
        "Hashing complete: {} hashed ({}), {} failed",
        stats.hashed,
        bytesize::ByteSize(stats.bytes_hashed),
        stats.failed
    );

    (hashed, stats)
}
