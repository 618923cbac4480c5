//! In-process [`Catalog`] holding objects in a map.
//!
//! Mirrors the query semantics of the real catalog: registration is
//! recorded, queries return every object whose parent equals or is nested
//! below the collection, and annotations are appended to a log. Individual
//! objects can be made to reject annotation.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use super::{Catalog, RawRecord, RemoteError};
use crate::scanner::path_utils::normalize_collection_path;

/// One recorded attribute write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    /// Absolute object path
    pub object: String,
    /// Attribute name
    pub key: String,
    /// Attribute value
    pub value: String,
}

/// In-memory catalog.
#[derive(Debug)]
pub struct MemoryCatalog {
    home: String,
    objects: BTreeMap<String, Vec<String>>,
    reject_annotations: BTreeSet<String>,
    fail_register: bool,
    registrations: Mutex<Vec<String>>,
    annotations: Mutex<Vec<Annotation>>,
}

impl MemoryCatalog {
    /// Create an empty catalog whose working collection is `home`.
    #[must_use]
    pub fn new(home: &str) -> Self {
        Self {
            home: normalize_collection_path(home),
            objects: BTreeMap::new(),
            reject_annotations: BTreeSet::new(),
            fail_register: false,
            registrations: Mutex::new(Vec::new()),
            annotations: Mutex::new(Vec::new()),
        }
    }

    /// Add (or replace) an object at absolute path `object` with a stored digest.
    #[must_use]
    pub fn with_object(mut self, object: &str, digest: &str) -> Self {
        self.objects
            .insert(normalize_collection_path(object), vec![digest.to_string()]);
        self
    }

    /// Add another replica of `object` whose stored digest is `digest`.
    ///
    /// Queries then report one row per replica, as the real catalog does.
    #[must_use]
    pub fn with_replica(mut self, object: &str, digest: &str) -> Self {
        self.objects
            .entry(normalize_collection_path(object))
            .or_default()
            .push(digest.to_string());
        self
    }

    /// Make annotation of `object` fail.
    #[must_use]
    pub fn with_rejected_annotation(mut self, object: &str) -> Self {
        self.reject_annotations
            .insert(normalize_collection_path(object));
        self
    }

    /// Make [`Catalog::register`] fail.
    #[must_use]
    pub fn with_failing_register(mut self) -> Self {
        self.fail_register = true;
        self
    }

    /// Collections passed to [`Catalog::register`] so far.
    #[must_use]
    pub fn registrations(&self) -> Vec<String> {
        self.registrations
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    /// Successful annotations so far, in call order.
    #[must_use]
    pub fn annotations(&self) -> Vec<Annotation> {
        self.annotations
            .lock()
            .map(|a| a.clone())
            .unwrap_or_default()
    }
}

impl Catalog for MemoryCatalog {
    fn resolve(&self, collection: &str) -> Result<String, RemoteError> {
        if collection.starts_with('/') {
            Ok(normalize_collection_path(collection))
        } else {
            Ok(normalize_collection_path(&format!(
                "{}/{}",
                self.home, collection
            )))
        }
    }

    fn register(&self, collection: &str) -> Result<(), RemoteError> {
        if self.fail_register {
            return Err(RemoteError::CommandFailed {
                command: "register".to_string(),
                status: "simulated".to_string(),
                stderr: format!("cannot register {collection}"),
            });
        }
        if let Ok(mut registrations) = self.registrations.lock() {
            registrations.push(collection.to_string());
        }
        Ok(())
    }

    fn query(&self, collection: &str) -> Result<Vec<RawRecord>, RemoteError> {
        let collection = normalize_collection_path(collection);
        let nested_prefix = if collection == "/" {
            "/".to_string()
        } else {
            format!("{collection}/")
        };

        Ok(self
            .objects
            .iter()
            .filter_map(|(path, digests)| {
                let (parent, name) = path.rsplit_once('/')?;
                let parent = if parent.is_empty() { "/" } else { parent };
                let included = parent == collection || parent.starts_with(&nested_prefix);
                included.then(|| {
                    digests
                        .iter()
                        .map(move |digest| RawRecord::new(parent, name, digest.as_str()))
                })
            })
            .flatten()
            .collect())
    }

    fn annotate(&self, object: &str, key: &str, value: &str) -> Result<(), RemoteError> {
        let object = normalize_collection_path(object);
        if self.reject_annotations.contains(&object) || !self.objects.contains_key(&object) {
            return Err(RemoteError::Rejected {
                object,
                reason: "CAT_NO_ACCESS_PERMISSION".to_string(),
            });
        }
        if let Ok(mut annotations) = self.annotations.lock() {
            annotations.push(Annotation {
                object,
                key: key.to_string(),
                value: value.to_string(),
            });
        }
        Ok(())
    }
}
