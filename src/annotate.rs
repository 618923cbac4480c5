//! Verification audit trail written back onto catalog objects.
//!
//! For every local manifest record the annotator sets two attributes on the
//! matching remote object: the locally verified digest and the time of the
//! check. Every write is independent; a failure is logged, collected, and
//! the loop moves on. Results never feed back into the comparison.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::manifest::Manifest;
use crate::remote::Catalog;
use crate::scanner::path_utils::object_path;

/// Default attribute name for the verified digest.
pub const DEFAULT_DIGEST_KEY: &str = "collcheck::verified_digest";

/// Default attribute name for the last-checked timestamp.
pub const DEFAULT_CHECKED_KEY: &str = "collcheck::last_checked";

/// One failed attribute write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnotationFailure {
    /// Absolute object path
    pub object: String,
    /// Attribute that could not be written
    pub key: String,
    /// Error message
    pub error: String,
}

/// Outcome of an annotation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnnotationReport {
    /// Attribute writes that succeeded
    pub written: usize,
    /// Attribute writes that failed
    pub failures: Vec<AnnotationFailure>,
}

impl AnnotationReport {
    /// Whether every write succeeded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Writes verification attributes through a [`Catalog`].
#[derive(Debug, Clone)]
pub struct Annotator {
    digest_key: String,
    checked_key: String,
}

impl Default for Annotator {
    fn default() -> Self {
        Self::new(DEFAULT_DIGEST_KEY, DEFAULT_CHECKED_KEY)
    }
}

impl Annotator {
    /// Create an annotator with custom attribute names.
    #[must_use]
    pub fn new(digest_key: impl Into<String>, checked_key: impl Into<String>) -> Self {
        Self {
            digest_key: digest_key.into(),
            checked_key: checked_key.into(),
        }
    }

    /// Annotate every object in `manifest` below `collection`.
    pub fn annotate(
        &self,
        catalog: &dyn Catalog,
        collection: &str,
        manifest: &Manifest,
        checked_at: DateTime<Utc>,
    ) -> AnnotationReport {
        let timestamp = checked_at.to_rfc3339_opts(SecondsFormat::Secs, true);
        let mut report = AnnotationReport::default();

        log::info!(
            "Annotating {} objects in {}",
            manifest.len(),
            collection
        );

        for record in manifest {
            let object = object_path(collection, &record.path);
            for (key, value) in [
                (self.digest_key.as_str(), record.digest.as_str()),
                (self.checked_key.as_str(), timestamp.as_str()),
            ] {
                match catalog.annotate(&object, key, value) {
                    Ok(()) => report.written += 1,
                    Err(e) => {
                        log::warn!("Failed to set {} on {}: {}", key, object, e);
                        report.failures.push(AnnotationFailure {
                            object: object.clone(),
                            key: key.to_string(),
                            error: e.to_string(),
                        });
                    }
                }
            }
        }

        if !report.is_clean() {
            log::warn!(
                "{} of {} attribute writes failed",
                report.failures.len(),
                report.written + report.failures.len()
            );
        }
        report
    }
}
