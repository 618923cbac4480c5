//! Local manifest derivation from the digest cache.

use std::collections::BTreeSet;

use super::{Manifest, ManifestRecord};
use crate::cache::DigestCache;

/// Build the local manifest from `cache`, restricted to `present` paths.
///
/// `present` holds the canonical relative paths that exist on disk in
/// this run and have a current digest in the cache. Cache entries for
/// other paths (deleted files, files that failed to hash) are ignored.
#[must_use]
pub fn local_manifest(cache: &DigestCache, present: &BTreeSet<String>) -> Manifest {
    let records = present
        .iter()
        .filter_map(|path| match cache.get(path) {
            Some(entry) => Some(ManifestRecord::new(path.clone(), entry.digest.clone())),
            None => {
                log::warn!("No cached digest for present file {}", path);
                None
            }
        })
        .collect();
    Manifest::from_records(records)
}
