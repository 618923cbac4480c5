//! Digest caching module.
//!
//! This module provides persistent storage for file digests so that
//! subsequent runs avoid re-hashing unchanged files.
//!
//! # Architecture
//!
//! * [`store`]: The [`DigestCache`] document: load, lookup, atomic persist.
//! * [`entry`]: The per-file [`CacheEntry`] and its freshness rule.
//!
//! # Cache Invalidation
//!
//! Entries are keyed by canonical relative path and validated using:
//! * File size
//! * Modification time (whole seconds)
//!
//! If either attribute changes, the entry is stale and the file is
//! re-hashed. A stale digest is never reused.

pub mod entry;
pub mod store;

pub use entry::CacheEntry;
pub use store::{CacheError, CacheResult, DigestCache};
