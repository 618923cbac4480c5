//! Audit pipeline orchestration.
//!
//! # Overview
//!
//! [`Auditor::run`] drives one complete reconciliation, strictly in order:
//! 1. **Cache load**: read the digest cache (corrupt documents abort the run)
//! 2. **Scan**: enumerate regular files and classify them against the cache
//! 3. **Hash**: compute digests for stale and new files (see [`hashing`])
//! 4. **Persist**: merge new digests into the cache and write it atomically
//! 5. **Remote**: resolve, register and query the collection
//! 6. **Reconcile**: merge-join the two manifests
//! 7. **Annotate** (optional): write verification attributes back
//!
//! Only step 3 is parallel.
//!
//! # Example
//!
//! ```no_run
//! use collcheck::audit::{AuditConfig, Auditor};
//! use collcheck::remote::IcommandsCatalog;
//! use std::path::Path;
//!
//! let catalog = IcommandsCatalog::locate().unwrap();
//! let auditor = Auditor::new(AuditConfig::default().with_jobs(4));
//! let report = auditor.run(Path::new("data"), "projects/data", &catalog).unwrap();
//! println!("{:?}: {} discrepancies", report.outcome(), report.reconciliation.discrepancies.len());
//! ```

pub mod hashing;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;

use crate::annotate::{AnnotationReport, Annotator};
use crate::cache::DigestCache;
use crate::config::ConfigError;
use crate::error::{AuditError, ExitCode};
use crate::manifest::{local_manifest, remote_manifest, ManifestRecord};
use crate::progress::{ProgressCallback, PHASE_SCAN};
use crate::reconcile::{reconcile, Outcome, Reconciliation};
use crate::remote::Catalog;
use crate::scanner::{classify, FileEntry, Freshness, Hasher, Walker, WalkerConfig};

pub use hashing::{compute_digests, default_jobs, HashedFile, HashingConfig, HashingStats};

/// Default cache document location, relative to the invocation directory.
pub const DEFAULT_CACHE_PATH: &str = ".collcheck_cache.json";

/// Configuration for a full audit run.
#[derive(Clone)]
pub struct AuditConfig {
    /// Worker pool size for hashing.
    pub jobs: usize,
    /// Location of the persisted digest cache.
    pub cache_path: PathBuf,
    /// Whether to annotate remote objects after reconciling.
    pub annotate: bool,
    /// Attribute writer used when `annotate` is set.
    pub annotator: Annotator,
    /// Local scan options.
    pub walker_config: WalkerConfig,
    /// Optional progress callback.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for AuditConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditConfig")
            .field("jobs", &self.jobs)
            .field("cache_path", &self.cache_path)
            .field("annotate", &self.annotate)
            .field("annotator", &self.annotator)
            .field("walker_config", &self.walker_config)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            jobs: default_jobs(),
            cache_path: PathBuf::from(DEFAULT_CACHE_PATH),
            annotate: false,
            annotator: Annotator::default(),
            walker_config: WalkerConfig::default(),
            progress_callback: None,
        }
    }
}

impl AuditConfig {
    /// Set the hashing worker count (minimum 1).
    #[must_use]
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    /// Set the cache document path.
    #[must_use]
    pub fn with_cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_path = path.into();
        self
    }

    /// Enable or disable the annotation step.
    #[must_use]
    pub fn with_annotate(mut self, annotate: bool) -> Self {
        self.annotate = annotate;
        self
    }

    /// Set the attribute writer.
    #[must_use]
    pub fn with_annotator(mut self, annotator: Annotator) -> Self {
        self.annotator = annotator;
        self
    }

    /// Set the local scan options.
    #[must_use]
    pub fn with_walker_config(mut self, config: WalkerConfig) -> Self {
        self.walker_config = config;
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    fn hashing_config(&self) -> HashingConfig {
        let config = HashingConfig::default().with_jobs(self.jobs);
        match self.progress_callback {
            Some(ref callback) => config.with_progress_callback(callback.clone()),
            None => config,
        }
    }
}

/// Everything one audit run produced.
#[derive(Debug)]
pub struct AuditReport {
    /// Resolved absolute collection path
    pub collection: String,
    /// Records in the local manifest
    pub local_files: usize,
    /// Records in the remote manifest
    pub remote_objects: usize,
    /// Entries the walker could not read
    pub scan_errors: usize,
    /// Whether the cache document was rewritten
    pub cache_written: bool,
    /// Comparison result
    pub reconciliation: Reconciliation,
    /// Hashing phase statistics
    pub hashing: HashingStats,
    /// Annotation result, when annotation ran
    pub annotation: Option<AnnotationReport>,
}

impl AuditReport {
    /// Overall verdict.
    #[must_use]
    pub fn outcome(&self) -> Outcome {
        self.reconciliation.outcome()
    }

    /// Process exit code for this verdict.
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        match self.outcome() {
            Outcome::Match => ExitCode::Match,
            Outcome::Mismatch => ExitCode::Mismatch,
        }
    }
}

/// Runs the audit pipeline.
#[derive(Debug, Default)]
pub struct Auditor {
    config: AuditConfig,
    hasher: Hasher,
}

impl Auditor {
    /// Create an auditor with the given configuration.
    #[must_use]
    pub fn new(config: AuditConfig) -> Self {
        Self {
            config,
            hasher: Hasher::new(),
        }
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &AuditConfig {
        &self.config
    }

    /// Reconcile the tree at `root` against `collection` in `catalog`.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError`] if:
    /// - `root` does not exist or is not a directory
    /// - the cache document is corrupt, or cannot be read or written
    /// - registration or the remote query fails
    /// - the remote query returns no objects
    ///
    /// A mismatch is not an error; it is reported through
    /// [`AuditReport::outcome`].
    pub fn run(
        &self,
        root: &Path,
        collection: &str,
        catalog: &dyn Catalog,
    ) -> Result<AuditReport, AuditError> {
        validate_root(root)?;

        let mut cache = DigestCache::load(&self.config.cache_path)?;
        log::debug!(
            "Loaded {} cache entries from {}",
            cache.len(),
            self.config.cache_path.display()
        );

        log::info!("Scanning {}", root.display());
        let (fresh, stale, scan_errors) = self.scan(root, &cache);

        let mut present: BTreeSet<String> = fresh.into_iter().collect();
        let cached = present.len();

        let (hashed, mut hashing) =
            compute_digests(stale, &self.hasher, &self.config.hashing_config());
        hashing.candidates = cached + hashing.hashed + hashing.failed;
        hashing.cached = cached;

        let mut uncached = Vec::new();
        for file in hashed {
            if file.cacheable {
                present.insert(file.relative.clone());
                cache.put(file.relative, file.entry);
            } else {
                uncached.push(ManifestRecord::new(file.relative, file.entry.digest));
            }
        }
        let cache_written = cache.persist()?;

        let mut local = local_manifest(&cache, &present);
        local.extend(uncached);
        log::info!(
            "Local manifest: {} files ({} cached, {} hashed, {} failed)",
            local.len(),
            hashing.cached,
            hashing.hashed,
            hashing.failed
        );

        let resolved = catalog.resolve(collection)?;
        log::info!("Registering digests under {}", resolved);
        catalog.register(&resolved)?;

        let records = catalog.query(&resolved)?;
        if records.is_empty() {
            return Err(AuditError::RemoteQueryEmpty {
                collection: resolved,
            });
        }
        let remote = remote_manifest(&records, &resolved);
        if remote.is_empty() {
            return Err(AuditError::RemoteQueryEmpty {
                collection: resolved,
            });
        }
        log::info!("Remote manifest: {} objects", remote.len());

        let reconciliation = reconcile(&local, &remote);

        let annotation = self.config.annotate.then(|| {
            self.config
                .annotator
                .annotate(catalog, &resolved, &local, Utc::now())
        });

        Ok(AuditReport {
            collection: resolved,
            local_files: local.len(),
            remote_objects: remote.len(),
            scan_errors,
            cache_written,
            reconciliation,
            hashing,
            annotation,
        })
    }

    /// Walk `root`, splitting files into cache hits and files to hash.
    fn scan(&self, root: &Path, cache: &DigestCache) -> (Vec<String>, Vec<FileEntry>, usize) {
        let callback = self.config.progress_callback.as_ref();
        if let Some(callback) = callback {
            callback.on_phase_start(PHASE_SCAN, 0);
        }

        let walker = Walker::new(root, self.config.walker_config.clone());
        let mut fresh = Vec::new();
        let mut stale = Vec::new();
        let mut errors = 0usize;

        for (seen, result) in walker.walk().enumerate() {
            match result {
                Ok(file) => {
                    if let Some(callback) = callback {
                        callback.on_progress(seen + 1, &file.relative);
                    }
                    match classify(&file, cache) {
                        Freshness::Fresh(_) => fresh.push(file.relative),
                        Freshness::NeedsHash => {
                            log::trace!("Needs hash: {}", file.relative);
                            stale.push(file);
                        }
                    }
                }
                Err(e) => {
                    log::warn!("Skipping unreadable entry: {}", e);
                    errors += 1;
                }
            }
        }

        if let Some(callback) = callback {
            callback.on_phase_end(PHASE_SCAN);
        }
        log::debug!(
            "Scan complete: {} fresh, {} to hash, {} errors",
            fresh.len(),
            stale.len(),
            errors
        );
        (fresh, stale, errors)
    }
}

/// Check that `root` exists and is a directory.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidRoot`] otherwise.
pub fn validate_root(root: &Path) -> Result<(), ConfigError> {
    match std::fs::metadata(root) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(ConfigError::InvalidRoot {
            path: root.to_path_buf(),
            reason: "not a directory".to_string(),
        }),
        Err(e) => Err(ConfigError::InvalidRoot {
            path: root.to_path_buf(),
            reason: e.to_string(),
        }),
    }
}
