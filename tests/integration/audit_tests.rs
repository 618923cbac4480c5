use collcheck::audit::{AuditConfig, Auditor};
use collcheck::error::{AuditError, ExitCode};
use collcheck::reconcile::{DiscrepancyKind, Outcome};
use collcheck::remote::MemoryCatalog;
use collcheck::scanner::digest_bytes;
use filetime::{set_file_mtime, FileTime};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

struct Fixture {
    _dir: TempDir,
    root: PathBuf,
    cache: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempdir().unwrap();
        let root = dir.path().join("X");
        fs::create_dir(&root).unwrap();
        let cache = dir.path().join(".collcheck_cache.json");
        Self {
            _dir: dir,
            root,
            cache,
        }
    }

    fn write(&self, relative: &str, content: &[u8]) -> PathBuf {
        let path = self.root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        File::create(&path).unwrap().write_all(content).unwrap();
        path
    }

    fn auditor(&self) -> Auditor {
        Auditor::new(AuditConfig::default().with_jobs(2).with_cache_path(&self.cache))
    }
}

fn sha2(content: &[u8]) -> String {
    format!("sha2:{}", digest_bytes(content))
}

fn set_mtime(path: &Path, secs: i64) {
    set_file_mtime(path, FileTime::from_unix_time(secs, 0)).unwrap();
}

#[test]
fn test_identical_sides_match() {
    let fx = Fixture::new();
    fx.write("a.txt", b"alpha");
    fx.write("b.txt", b"bravo");
    let catalog = MemoryCatalog::new("/zone/home/u")
        .with_object("/zone/home/u/X/a.txt", &sha2(b"alpha"))
        .with_object("/zone/home/u/X/b.txt", &sha2(b"bravo"));

    let report = fx.auditor().run(&fx.root, "X", &catalog).unwrap();

    assert_eq!(report.exit_code(), ExitCode::Match);
    assert!(report.reconciliation.discrepancies.is_empty());
    assert_eq!(report.reconciliation.matched, 2);
}

#[test]
fn test_remote_only_object_reported() {
    let fx = Fixture::new();
    fx.write("a.txt", b"alpha");
    let catalog = MemoryCatalog::new("/zone")
        .with_object("/zone/X/a.txt", &sha2(b"alpha"))
        .with_object("/zone/X/c.txt", &sha2(b"charlie"));

    let report = fx.auditor().run(&fx.root, "/zone/X", &catalog).unwrap();

    assert_eq!(report.exit_code(), ExitCode::Mismatch);
    let found = &report.reconciliation.discrepancies;
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].kind, DiscrepancyKind::RemoteOnly);
    assert_eq!(found[0].path, "./c.txt");
    assert_eq!(found[0].remote_digest.as_deref(), Some(digest_bytes(b"charlie").as_str()));
}

#[test]
fn test_changed_mtime_same_size_is_rehashed() {
    let fx = Fixture::new();
    let path = fx.write("a.txt", b"old-content");
    set_mtime(&path, 1_600_000_000);
    let catalog = MemoryCatalog::new("/zone").with_object("/zone/X/a.txt", &sha2(b"new-content"));

    let first = fx.auditor().run(&fx.root, "/zone/X", &catalog).unwrap();
    assert_eq!(first.reconciliation.count(DiscrepancyKind::DigestMismatch), 1);

    // Same length, new mtime
    File::create(&path).unwrap().write_all(b"new-content").unwrap();
    set_mtime(&path, 1_600_000_100);

    let second = fx.auditor().run(&fx.root, "/zone/X", &catalog).unwrap();
    assert_eq!(second.hashing.hashed, 1);
    assert_eq!(second.hashing.cached, 0);
    assert_eq!(second.outcome(), Outcome::Match);
}

#[test]
fn test_unchanged_stat_reuses_cached_digest() {
    let fx = Fixture::new();
    let path = fx.write("a.txt", b"aaaa");
    set_mtime(&path, 1_500_000_000);
    let catalog = MemoryCatalog::new("/zone").with_object("/zone/X/a.txt", &sha2(b"aaaa"));

    fx.auditor().run(&fx.root, "/zone/X", &catalog).unwrap();

    // Content changes but size and mtime are restored
    File::create(&path).unwrap().write_all(b"bbbb").unwrap();
    set_mtime(&path, 1_500_000_000);

    let report = fx.auditor().run(&fx.root, "/zone/X", &catalog).unwrap();
    assert_eq!(report.hashing.hashed, 0);
    assert_eq!(report.hashing.cached, 1);
    assert_eq!(report.outcome(), Outcome::Match);
}

#[test]
fn test_empty_remote_fails_regardless_of_local_files() {
    let fx = Fixture::new();
    for i in 0..5 {
        fx.write(&format!("f{i}.txt"), format!("{i}").as_bytes());
    }
    let catalog = MemoryCatalog::new("/zone").with_object("/zone/Other/f0.txt", "sha2:x");

    let err = fx.auditor().run(&fx.root, "/zone/X", &catalog).unwrap_err();
    assert!(matches!(err, AuditError::RemoteQueryEmpty { ref collection } if collection == "/zone/X"));
    assert_eq!(err.exit_code(), ExitCode::ExecutionError);
}

#[test]
fn test_empty_remote_fails_for_empty_local_tree() {
    let fx = Fixture::new();
    let err = fx
        .auditor()
        .run(&fx.root, "/zone/X", &MemoryCatalog::new("/zone"))
        .unwrap_err();
    assert!(matches!(err, AuditError::RemoteQueryEmpty { .. }));
}

#[test]
fn test_second_run_leaves_cache_byte_identical() {
    let fx = Fixture::new();
    fx.write("a.txt", b"alpha");
    fx.write("deep/er/b.txt", b"bravo");
    let catalog = MemoryCatalog::new("/zone")
        .with_object("/zone/X/a.txt", &sha2(b"alpha"))
        .with_object("/zone/X/deep/er/b.txt", &sha2(b"bravo"));

    fx.auditor().run(&fx.root, "/zone/X", &catalog).unwrap();
    let before = fs::read(&fx.cache).unwrap();

    let report = fx.auditor().run(&fx.root, "/zone/X", &catalog).unwrap();
    let after = fs::read(&fx.cache).unwrap();

    assert!(!report.cache_written);
    assert_eq!(report.hashing.hashed, 0);
    assert_eq!(before, after);
}

#[test]
fn test_deleted_file_leaves_stale_entry_but_not_manifest() {
    let fx = Fixture::new();
    fx.write("a.txt", b"alpha");
    let gone = fx.write("gone.txt", b"gone");
    let catalog = MemoryCatalog::new("/zone").with_object("/zone/X/a.txt", &sha2(b"alpha"));

    fx.auditor().run(&fx.root, "/zone/X", &catalog).unwrap();
    fs::remove_file(gone).unwrap();

    let report = fx.auditor().run(&fx.root, "/zone/X", &catalog).unwrap();
    assert_eq!(report.outcome(), Outcome::Match);
    assert_eq!(report.local_files, 1);

    let cache = fs::read_to_string(&fx.cache).unwrap();
    assert!(cache.contains("./gone.txt"));
}

#[test]
fn test_nested_collection_paths_align() {
    let fx = Fixture::new();
    fx.write("sub/one.txt", b"1");
    fx.write("sub/inner/two.txt", b"2");
    let catalog = MemoryCatalog::new("/zone")
        .with_object("/zone/X/sub/one.txt", &sha2(b"1"))
        .with_object("/zone/X/sub/inner/two.txt", &format!("m:{}", digest_bytes(b"2")));

    let report = fx.auditor().run(&fx.root, "/zone/X/", &catalog).unwrap();
    assert_eq!(report.collection, "/zone/X");
    assert_eq!(report.outcome(), Outcome::Match);
}

#[test]
fn test_nfd_local_name_matches_nfc_remote_name() {
    let fx = Fixture::new();
    fx.write("cafe\u{0301}.txt", b"coffee");
    let catalog =
        MemoryCatalog::new("/zone").with_object("/zone/X/caf\u{e9}.txt", &sha2(b"coffee"));

    let report = fx.auditor().run(&fx.root, "/zone/X", &catalog).unwrap();
    assert_eq!(report.outcome(), Outcome::Match);
}

#[test]
fn test_sibling_collection_with_shared_prefix_is_ignored() {
    let fx = Fixture::new();
    fx.write("a.txt", b"alpha");
    let catalog = MemoryCatalog::new("/zone")
        .with_object("/zone/X/a.txt", &sha2(b"alpha"))
        .with_object("/zone/X2/b.txt", &sha2(b"bravo"));

    let report = fx.auditor().run(&fx.root, "/zone/X", &catalog).unwrap();
    assert_eq!(report.outcome(), Outcome::Match);
    assert_eq!(report.remote_objects, 1);
}

#[test]
fn test_unregistered_remote_object_is_digest_mismatch() {
    let fx = Fixture::new();
    fx.write("a.txt", b"alpha");
    let catalog = MemoryCatalog::new("/zone").with_object("/zone/X/a.txt", "");

    let report = fx.auditor().run(&fx.root, "/zone/X", &catalog).unwrap();
    let found = &report.reconciliation.discrepancies;
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].kind, DiscrepancyKind::DigestMismatch);
    assert_eq!(found[0].remote_digest.as_deref(), Some(""));
}

#[test]
fn test_root_that_is_a_file_is_rejected() {
    let fx = Fixture::new();
    let file = fx.write("plain.txt", b"x");
    let catalog = MemoryCatalog::new("/zone").with_object("/zone/X/plain.txt", &sha2(b"x"));

    let err = fx.auditor().run(&file, "/zone/X", &catalog).unwrap_err();
    assert!(matches!(err, AuditError::Config(_)));
    assert!(!fx.cache.exists());
}

#[test]
fn test_diverging_replica_is_mismatch_even_when_one_agrees() {
    let fx = Fixture::new();
    fx.write("a.txt", b"alpha");
    fx.write("b.txt", b"bravo");
    // The local digest equals one replica; the other replica disagrees
    let catalog = MemoryCatalog::new("/zone")
        .with_object("/zone/X/a.txt", &sha2(b"alpha"))
        .with_replica("/zone/X/a.txt", "sha2:ZZZZ")
        .with_object("/zone/X/b.txt", &sha2(b"bravo"))
        .with_replica("/zone/X/b.txt", &sha2(b"bravo"));

    let report = fx.auditor().run(&fx.root, "/zone/X", &catalog).unwrap();

    assert_eq!(report.exit_code(), ExitCode::Mismatch);
    assert_eq!(report.reconciliation.matched, 1);
    let found = &report.reconciliation.discrepancies;
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].kind, DiscrepancyKind::DigestMismatch);
    assert_eq!(found[0].path, "./a.txt");
    assert_eq!(found[0].remote_digest.as_deref(), Some("ZZZZ"));
}

#[cfg(unix)]
#[test]
fn test_unreadable_file_is_skipped_and_not_cached() {
    use collcheck::cache::DigestCache;
    use std::os::unix::fs::PermissionsExt;

    let fx = Fixture::new();
    fx.write("a.txt", b"alpha");
    let locked = fx.write("locked.txt", b"secret");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
    if File::open(&locked).is_ok() {
        // Permission bits are not enforced (running as root)
        return;
    }
    let catalog = MemoryCatalog::new("/zone")
        .with_object("/zone/X/a.txt", &sha2(b"alpha"))
        .with_object("/zone/X/locked.txt", &sha2(b"secret"));

    let report = fx.auditor().run(&fx.root, "/zone/X", &catalog).unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();

    assert_eq!(report.hashing.failed, 1);
    assert_eq!(report.hashing.hashed, 1);
    assert_eq!(report.local_files, 1);
    assert_eq!(report.reconciliation.matched, 1);
    let found = &report.reconciliation.discrepancies;
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].kind, DiscrepancyKind::RemoteOnly);
    assert_eq!(found[0].path, "./locked.txt");

    let cache = DigestCache::load(&fx.cache).unwrap();
    assert!(cache.get("./a.txt").is_some());
    assert!(cache.get("./locked.txt").is_none());
}
