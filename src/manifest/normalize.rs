//! Remote record normalization.

use super::{Manifest, ManifestRecord};
use crate::remote::RawRecord;
use crate::scanner::path_utils::relative_to_collection;

/// Digest algorithm markers stripped from catalog digests.
///
/// `sha2:` prefixes SHA-256 checksums; `m:` is a legacy marker.
pub const DIGEST_PREFIXES: [&str; 2] = ["sha2:", "m:"];

/// Remove a known algorithm prefix and surrounding whitespace.
///
/// ```
/// use collcheck::manifest::strip_digest_prefix;
///
/// assert_eq!(strip_digest_prefix("sha2:abc="), "abc=");
/// assert_eq!(strip_digest_prefix("abc="), "abc=");
/// ```
#[must_use]
pub fn strip_digest_prefix(digest: &str) -> &str {
    let digest = digest.trim();
    DIGEST_PREFIXES
        .iter()
        .find_map(|prefix| digest.strip_prefix(prefix))
        .unwrap_or(digest)
}

/// Build the remote manifest from raw catalog records.
///
/// Each record's `parent/name` is rewritten relative to `collection`
/// (the resolved absolute collection path). Records outside the
/// collection, which a `LIKE` query can return for names containing `_`,
/// are dropped.
#[must_use]
pub fn remote_manifest(records: &[RawRecord], collection: &str) -> Manifest {
    let mut outside = 0usize;
    let normalized: Vec<ManifestRecord> = records
        .iter()
        .filter_map(|record| {
            match relative_to_collection(&record.full_path(), collection) {
                Some(path) => Some(ManifestRecord::new(
                    path,
                    strip_digest_prefix(&record.digest),
                )),
                None => {
                    outside += 1;
                    log::debug!("Ignoring object outside {}: {}", collection, record.full_path());
                    None
                }
            }
        })
        .collect();

    if outside > 0 {
        log::debug!("Dropped {} records outside {}", outside, collection);
    }
    Manifest::from_records(normalized)
}
