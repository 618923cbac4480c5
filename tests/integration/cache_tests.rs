use collcheck::cache::{CacheEntry, DigestCache};
use std::fs;
use tempfile::tempdir;

#[test]
fn test_missing_cache_loads_empty() {
    let dir = tempdir().unwrap();
    let cache = DigestCache::load(&dir.path().join("absent.json")).unwrap();
    assert!(cache.is_empty());
    assert!(!cache.is_dirty());
}

#[test]
fn test_persist_and_reload() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cache.json");

    let mut cache = DigestCache::load(&path).unwrap();
    cache.put("./b.txt", CacheEntry::new(2, 200, "DB"));
    cache.put("./a.txt", CacheEntry::new(1, 100, "DA"));
    assert!(cache.persist().unwrap());

    let reloaded = DigestCache::load(&path).unwrap();
    assert_eq!(reloaded.len(), 2);
    assert_eq!(reloaded.get("./a.txt"), Some(&CacheEntry::new(1, 100, "DA")));
    let keys: Vec<_> = reloaded.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(keys, vec!["./a.txt", "./b.txt"]);
}

#[test]
fn test_document_format() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cache.json");

    let mut cache = DigestCache::load(&path).unwrap();
    cache.put("./a.txt", CacheEntry::new(5, -3, "abc="));
    cache.persist().unwrap();

    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    let object = value.as_object().unwrap();
    assert_eq!(object.len(), 1);
    assert_eq!(value["./a.txt"]["size"], 5);
    assert_eq!(value["./a.txt"]["mtime"], -3);
    assert_eq!(value["./a.txt"]["digest"], "abc=");
}

#[test]
fn test_loads_externally_written_mapping() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cache.json");
    fs::write(
        &path,
        r#"{"./a.txt": {"size": 1, "mtime": 2, "digest": "D"}, "./sub/b.txt": {"size": 3, "mtime": 4, "digest": "E"}}"#,
    )
    .unwrap();

    let cache = DigestCache::load(&path).unwrap();
    assert_eq!(cache.len(), 2);
    assert_eq!(cache.get("./sub/b.txt"), Some(&CacheEntry::new(3, 4, "E")));
}

#[test]
fn test_unchanged_cache_is_not_rewritten() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cache.json");

    let mut cache = DigestCache::load(&path).unwrap();
    cache.put("./a.txt", CacheEntry::new(1, 1, "D"));
    cache.persist().unwrap();
    let before = fs::read(&path).unwrap();

    let mut again = DigestCache::load(&path).unwrap();
    again.put("./a.txt", CacheEntry::new(1, 1, "D"));
    assert!(!again.is_dirty());
    assert!(!again.persist().unwrap());
    assert_eq!(fs::read(&path).unwrap(), before);
}

#[test]
fn test_persist_leaves_no_temporary_files() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cache.json");

    let mut cache = DigestCache::load(&path).unwrap();
    for i in 0..50 {
        cache.put(format!("./f{i}"), CacheEntry::new(i, i as i64, "D"));
    }
    cache.persist().unwrap();

    let mut names: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names, vec!["cache.json", "cache.json.lock"]);
}

#[test]
fn test_persist_creates_parent_directory() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested/state/cache.json");

    let mut cache = DigestCache::load(&path).unwrap();
    cache.put("./a", CacheEntry::new(1, 1, "D"));
    assert!(cache.persist().unwrap());
    assert!(path.exists());
}

#[test]
fn test_in_memory_cache_never_writes() {
    let mut cache = DigestCache::in_memory();
    cache.put("./a", CacheEntry::new(1, 1, "D"));
    assert!(cache.is_dirty());
    assert!(!cache.persist().unwrap());
    assert!(cache.path().is_none());
}
