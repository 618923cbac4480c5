//! Manifests: sorted `(canonical relative path, digest)` sequences.
//!
//! Two manifests are built each run and never persisted:
//!
//! * [`local::local_manifest`] derives the local side from the digest cache,
//!   restricted to files present (and successfully digested) in this run.
//! * [`normalize::remote_manifest`] derives the remote side from raw
//!   catalog records.
//!
//! Both are sorted with `String`'s byte-wise ordering, which is locale
//! independent. The reconciler relies on both sides using the same order.

pub mod local;
pub mod normalize;

use serde::Serialize;

pub use local::local_manifest;
pub use normalize::{remote_manifest, strip_digest_prefix, DIGEST_PREFIXES};

/// One `(path, digest)` pair.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct ManifestRecord {
    /// Canonical relative path (`./a/b`)
    pub path: String,
    /// Digest without algorithm prefix
    pub digest: String,
}

impl ManifestRecord {
    /// Create a new record.
    #[must_use]
    pub fn new(path: impl Into<String>, digest: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            digest: digest.into(),
        }
    }
}

/// A manifest sorted by `(path, digest)` with no repeated pair.
///
/// A path normally carries one record. The remote side can report several
/// distinct digests for one path (diverging replicas); those are all kept
/// so the reconciler sees every one of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    records: Vec<ManifestRecord>,
}

impl Manifest {
    /// Build a manifest from records in any order.
    ///
    /// Records are sorted by `(path, digest)` and identical pairs collapse
    /// to one. Distinct digests for the same path are kept and logged.
    #[must_use]
    pub fn from_records(mut records: Vec<ManifestRecord>) -> Self {
        records.sort();
        records.dedup();
        for pair in records.windows(2) {
            if pair[0].path == pair[1].path {
                log::warn!(
                    "Conflicting digests for {}: {} and {}",
                    pair[0].path,
                    pair[0].digest,
                    pair[1].digest
                );
            }
        }
        Self { records }
    }

    /// Records grouped by path, in path order.
    pub fn by_path(&self) -> impl Iterator<Item = &[ManifestRecord]> + '_ {
        self.records.chunk_by(|a, b| a.path == b.path)
    }

    /// Records in path order.
    #[must_use]
    pub fn records(&self) -> &[ManifestRecord] {
        &self.records
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the manifest is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate records in path order.
    pub fn iter(&self) -> std::slice::Iter<'_, ManifestRecord> {
        self.records.iter()
    }
}


impl<'a> IntoIterator for &'a Manifest {
    type Item = &'a ManifestRecord;
    type IntoIter = std::slice::Iter<'a, ManifestRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl Extend<ManifestRecord> for Manifest {
    fn extend<T: IntoIterator<Item = ManifestRecord>>(&mut self, iter: T) {
        let before = self.records.len();
        self.records.extend(iter);
        if self.records.len() > before {
            let records = std::mem::take(&mut self.records);
            *self = Self::from_records(records);
        }
    }
}

impl FromIterator<ManifestRecord> for Manifest {
    fn from_iter<T: IntoIterator<Item = ManifestRecord>>(iter: T) -> Self {
        Self::from_records(iter.into_iter().collect())
    }
}
