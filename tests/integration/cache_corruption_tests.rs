use collcheck::audit::{AuditConfig, Auditor};
use collcheck::cache::{CacheError, DigestCache};
use collcheck::error::AuditError;
use collcheck::remote::MemoryCatalog;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_garbage_is_corrupt() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cache.json");
    fs::write(&path, b"not a cache document").unwrap();

    let err = DigestCache::load(&path).unwrap_err();
    assert!(matches!(err, CacheError::Corrupt { .. }));
}

#[test]
fn test_non_entry_value_is_corrupt() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cache.json");
    fs::write(&path, r#"{"./a.txt": 99}"#).unwrap();

    match DigestCache::load(&path) {
        Err(CacheError::Corrupt { reason, .. }) => assert!(reason.contains("99")),
        other => panic!("Expected Corrupt error, got {:?}", other),
    }
}

#[test]
fn test_top_level_array_is_corrupt() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cache.json");
    fs::write(&path, r#"[{"size": 1, "mtime": 2, "digest": "D"}]"#).unwrap();

    assert!(matches!(
        DigestCache::load(&path),
        Err(CacheError::Corrupt { .. })
    ));
}

#[test]
fn test_truncated_document_is_corrupt() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cache.json");
    fs::write(
        &path,
        r#"{"./a.txt": {"size": 1, "mtime": 2, "dig"#,
    )
    .unwrap();

    assert!(matches!(
        DigestCache::load(&path),
        Err(CacheError::Corrupt { .. })
    ));
}

#[test]
fn test_negative_size_is_corrupt() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cache.json");
    fs::write(
        &path,
        r#"{"./a": {"size": -1, "mtime": 0, "digest": "D"}}"#,
    )
    .unwrap();

    assert!(DigestCache::load(&path).is_err());
}

#[test]
fn test_audit_aborts_and_preserves_corrupt_cache() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("X");
    fs::create_dir(&root).unwrap();
    fs::write(root.join("a.txt"), b"alpha").unwrap();
    let path = dir.path().join("cache.json");
    fs::write(&path, b"{{{{").unwrap();
    let catalog = MemoryCatalog::new("/zone").with_object("/zone/X/a.txt", "sha2:x");

    let err = Auditor::new(AuditConfig::default().with_cache_path(&path))
        .run(&root, "/zone/X", &catalog)
        .unwrap_err();

    assert!(matches!(err, AuditError::CorruptCache(_)));
    assert_eq!(fs::read(&path).unwrap(), b"{{{{");
    assert!(catalog.registrations().is_empty());
}
