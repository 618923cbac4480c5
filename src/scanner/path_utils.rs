//! Canonical path forms shared by the local and remote manifests.
//!
//! Both sides of a comparison are keyed by a *canonical relative path*:
//! the path below the comparison root, separators normalized to `/`,
//! runs of separators collapsed, Unicode normalized to NFC, and prefixed
//! with `./`. A file at `X/sub/file.txt` under root `X` is `./sub/file.txt`.
//!
//! # Unicode
//!
//! macOS stores file names in NFD (decomposed) form, while the catalog
//! usually receives NFC (composed) names from Linux clients:
//!
//! - NFC: `café.txt` - 'é' is U+00E9 (single code point)
//! - NFD: `café.txt` - 'e' U+0065 + combining acute accent U+0301
//!
//! Without normalization, these would compare as different paths and show
//! up as a local-only / remote-only pair.
//!
//! # Example
//!
//! ```
//! use collcheck::scanner::path_utils::{canonical_relative, relative_to_collection};
//! use std::path::Path;
//!
//! let local = canonical_relative(Path::new("/data/X"), Path::new("/data/X/sub/file.txt"));
//! assert_eq!(local.as_deref(), Some("./sub/file.txt"));
//!
//! let remote = relative_to_collection("/zone/home/u/X//sub/file.txt", "/zone/home/u/X");
//! assert_eq!(remote.as_deref(), Some("./sub/file.txt"));
//! ```

use std::path::Path;
use unicode_normalization::UnicodeNormalization;

/// Prefix carried by every canonical relative path.
pub const RELATIVE_PREFIX: &str = "./";

/// Normalize a path string to NFC (Composed) form.
///
/// # Example
///
/// ```
/// use collcheck::scanner::path_utils::normalize_path_str;
///
/// let nfd = "cafe\u{0301}.txt"; // NFD form
/// assert_eq!(normalize_path_str(nfd), "café.txt");
/// ```
#[must_use]
pub fn normalize_path_str(s: &str) -> String {
    s.nfc().collect()
}

/// Collapse runs of `/` into a single separator.
///
/// ```
/// use collcheck::scanner::path_utils::collapse_separators;
///
/// assert_eq!(collapse_separators("/zone//home///u"), "/zone/home/u");
/// ```
#[must_use]
pub fn collapse_separators(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut previous_slash = false;
    for c in s.chars() {
        if c == '/' {
            if !previous_slash {
                out.push(c);
            }
            previous_slash = true;
        } else {
            out.push(c);
            previous_slash = false;
        }
    }
    out
}

/// Build the canonical relative path of `path` below `root`.
///
/// Returns `None` when `path` is not inside `root` or is the root itself.
#[must_use]
pub fn canonical_relative(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let relative = relative.to_string_lossy();
    if relative.is_empty() {
        return None;
    }
    Some(canonical_from_relative_str(&relative))
}

/// Turn an already-relative path string into canonical form.
///
/// Backslashes become `/`, separators collapse, a leading `./` or `/` is
/// dropped before the canonical `./` is prepended.
#[must_use]
pub fn canonical_from_relative_str(relative: &str) -> String {
    let forward = if relative.contains('\\') {
        relative.replace('\\', "/")
    } else {
        relative.to_string()
    };
    let collapsed = collapse_separators(&forward);
    let mut trimmed = collapsed.as_str();
    loop {
        if let Some(rest) = trimmed.strip_prefix(RELATIVE_PREFIX) {
            trimmed = rest;
        } else if let Some(rest) = trimmed.strip_prefix('/') {
            trimmed = rest;
        } else {
            break;
        }
    }
    format!("{RELATIVE_PREFIX}{}", normalize_path_str(trimmed))
}

/// Rewrite an absolute catalog path relative to the collection root.
///
/// Returns `None` when `full` is not strictly below `collection`.
#[must_use]
pub fn relative_to_collection(full: &str, collection: &str) -> Option<String> {
    let full = collapse_separators(full);
    let collection = collapse_separators(collection);
    let collection = collection.trim_end_matches('/');
    let rest = full.strip_prefix(collection)?.strip_prefix('/')?;
    if rest.is_empty() {
        return None;
    }
    Some(canonical_from_relative_str(rest))
}

/// Absolute catalog path of a canonical relative path below `collection`.
///
/// ```
/// use collcheck::scanner::path_utils::object_path;
///
/// assert_eq!(object_path("/zone/home/u/X", "./sub/a.txt"), "/zone/home/u/X/sub/a.txt");
/// ```
#[must_use]
pub fn object_path(collection: &str, relative: &str) -> String {
    let rest = relative.strip_prefix(RELATIVE_PREFIX).unwrap_or(relative);
    collapse_separators(&format!("{}/{}", collection.trim_end_matches('/'), rest))
}

/// Resolve `.` and `..` segments of an absolute catalog path.
///
/// The result always starts with `/` and never ends with one (except for
/// the bare root). `..` above the root is clamped to the root.
#[must_use]
pub fn normalize_collection_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    format!("/{}", segments.join("/"))
}
