//! Manifest reconciliation.
//!
//! [`compare`] performs an ordered merge-join over two path-sorted
//! manifests and classifies every disagreement. It does no I/O and
//! depends only on its inputs, so `compare(m, m)` is always empty.
//!
//! # Example
//!
//! ```
//! use collcheck::manifest::{Manifest, ManifestRecord};
//! use collcheck::reconcile::{compare, DiscrepancyKind};
//!
//! let local = Manifest::from_records(vec![ManifestRecord::new("./a.txt", "D1")]);
//! let remote = Manifest::from_records(vec![
//!     ManifestRecord::new("./a.txt", "D1"),
//!     ManifestRecord::new("./c.txt", "D3"),
//! ]);
//!
//! let found = compare(&local, &remote);
//! assert_eq!(found.len(), 1);
//! assert_eq!(found[0].kind, DiscrepancyKind::RemoteOnly);
//! assert_eq!(found[0].path, "./c.txt");
//! ```

use std::cmp::Ordering;
use std::fmt;

use serde::Serialize;

use crate::manifest::{Manifest, ManifestRecord};

/// How a path disagrees between the two manifests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiscrepancyKind {
    /// Present locally, absent remotely.
    LocalOnly,
    /// Present remotely, absent locally.
    RemoteOnly,
    /// Present on both sides with different digests.
    DigestMismatch,
}

impl DiscrepancyKind {
    /// Report tag for this kind.
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::LocalOnly => "local-only",
            Self::RemoteOnly => "remote-only",
            Self::DigestMismatch => "digest-mismatch",
        }
    }
}

impl fmt::Display for DiscrepancyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A single path-level disagreement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Discrepancy {
    /// Classification
    pub kind: DiscrepancyKind,
    /// Canonical relative path
    pub path: String,
    /// Local digest, when the path exists locally
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_digest: Option<String>,
    /// Remote digest, when the path exists remotely
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_digest: Option<String>,
}

impl Discrepancy {
    fn local_only(record: &ManifestRecord) -> Self {
        Self {
            kind: DiscrepancyKind::LocalOnly,
            path: record.path.clone(),
            local_digest: Some(record.digest.clone()),
            remote_digest: None,
        }
    }

    fn remote_only(record: &ManifestRecord) -> Self {
        Self {
            kind: DiscrepancyKind::RemoteOnly,
            path: record.path.clone(),
            local_digest: None,
            remote_digest: Some(record.digest.clone()),
        }
    }

    fn mismatch(local: &ManifestRecord, remote: &ManifestRecord) -> Self {
        Self {
            kind: DiscrepancyKind::DigestMismatch,
            path: local.path.clone(),
            local_digest: Some(local.digest.clone()),
            remote_digest: Some(remote.digest.clone()),
        }
    }
}

/// Overall verdict of a comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// No discrepancies.
    Match,
    /// At least one discrepancy.
    Mismatch,
}

/// Result of reconciling two manifests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// Discrepancies in path order
    pub discrepancies: Vec<Discrepancy>,
    /// Paths present on both sides with equal digests
    pub matched: usize,
}

impl Reconciliation {
    /// Overall verdict.
    #[must_use]
    pub fn outcome(&self) -> Outcome {
        if self.discrepancies.is_empty() {
            Outcome::Match
        } else {
            Outcome::Mismatch
        }
    }

    /// Number of discrepancies of the given kind.
    #[must_use]
    pub fn count(&self, kind: DiscrepancyKind) -> usize {
        self.discrepancies.iter().filter(|d| d.kind == kind).count()
    }
}

/// Merge-join two sorted manifests, returning discrepancies and match count.
///
/// Records are joined per path. A shared path matches only when every
/// digest on both sides agrees, so a remote path carrying several
/// distinct digests is always a [`DiscrepancyKind::DigestMismatch`].
#[must_use]
pub fn reconcile(local: &Manifest, remote: &Manifest) -> Reconciliation {
    let mut left = local.by_path().peekable();
    let mut right = remote.by_path().peekable();
    let mut result = Reconciliation::default();

    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (Some(l), Some(r)) => match l[0].path.cmp(&r[0].path) {
                Ordering::Less => {
                    result.discrepancies.push(Discrepancy::local_only(&l[0]));
                    left.next();
                }
                Ordering::Greater => {
                    result.discrepancies.push(Discrepancy::remote_only(&r[0]));
                    right.next();
                }
                Ordering::Equal => {
                    match first_disagreement(l, r) {
                        Some((lr, rr)) => {
                            result.discrepancies.push(Discrepancy::mismatch(lr, rr));
                        }
                        None => result.matched += 1,
                    }
                    left.next();
                    right.next();
                }
            },
            (Some(l), None) => {
                result.discrepancies.push(Discrepancy::local_only(&l[0]));
                left.next();
            }
            (None, Some(r)) => {
                result.discrepancies.push(Discrepancy::remote_only(&r[0]));
                right.next();
            }
            (None, None) => break,
        }
    }

    result
}

/// First `(local, remote)` pair for one path whose digests differ.
fn first_disagreement<'a>(
    local: &'a [ManifestRecord],
    remote: &'a [ManifestRecord],
) -> Option<(&'a ManifestRecord, &'a ManifestRecord)> {
    local.iter().find_map(|l| {
        remote
            .iter()
            .find(|r| r.digest != l.digest)
            .map(|r| (l, r))
    })
}

/// Discrepancies between two sorted manifests, in path order.
#[must_use]
pub fn compare(local: &Manifest, remote: &Manifest) -> Vec<Discrepancy> {
    reconcile(local, remote).discrepancies
}
