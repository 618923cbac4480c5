use collcheck::scanner::{Walker, WalkerConfig};
use std::fs::{self, File};
use std::io::Write;
use tempfile::tempdir;

fn relative_paths(walker: &Walker) -> Vec<String> {
    let mut paths: Vec<_> = walker
        .walk()
        .filter_map(Result::ok)
        .map(|f| f.relative)
        .collect();
    paths.sort();
    paths
}

#[test]
fn test_scan_empty_directory() {
    let dir = tempdir().unwrap();
    let walker = Walker::new(dir.path(), WalkerConfig::default());
    assert!(relative_paths(&walker).is_empty());
}

#[test]
fn test_scan_nested_canonical_paths() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("X");
    fs::create_dir_all(root.join("sub/deeper")).unwrap();
    File::create(root.join("top.txt"))
        .unwrap()
        .write_all(b"t")
        .unwrap();
    File::create(root.join("sub/file.txt"))
        .unwrap()
        .write_all(b"f")
        .unwrap();
    File::create(root.join("sub/deeper/z.bin"))
        .unwrap()
        .write_all(b"z")
        .unwrap();

    let walker = Walker::new(&root, WalkerConfig::default());
    assert_eq!(
        relative_paths(&walker),
        vec!["./sub/deeper/z.bin", "./sub/file.txt", "./top.txt"]
    );
    // Stable across runs
    assert_eq!(relative_paths(&walker), relative_paths(&walker));
}

#[test]
fn test_scan_includes_empty_files_with_size() {
    let dir = tempdir().unwrap();
    File::create(dir.path().join("empty")).unwrap();
    File::create(dir.path().join("five"))
        .unwrap()
        .write_all(b"12345")
        .unwrap();

    let walker = Walker::new(dir.path(), WalkerConfig::default());
    let mut files: Vec<_> = walker.walk().filter_map(Result::ok).collect();
    files.sort_by(|a, b| a.relative.cmp(&b.relative));

    assert_eq!(files.len(), 2);
    assert_eq!(files[0].relative, "./empty");
    assert_eq!(files[0].size, 0);
    assert_eq!(files[1].size, 5);
}

#[test]
fn test_scan_skip_hidden() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("root");
    fs::create_dir_all(root.join(".git")).unwrap();
    fs::write(root.join(".git/config"), b"x").unwrap();
    fs::write(root.join(".env"), b"x").unwrap();
    fs::write(root.join("visible.txt"), b"x").unwrap();

    let all = Walker::new(&root, WalkerConfig::default());
    assert_eq!(relative_paths(&all).len(), 3);

    let visible = Walker::new(&root, WalkerConfig::new(true, Vec::new()));
    assert_eq!(relative_paths(&visible), vec!["./visible.txt"]);
}

#[test]
fn test_scan_ignore_patterns() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("scratch")).unwrap();
    fs::write(dir.path().join("scratch/tmp.dat"), b"x").unwrap();
    fs::write(dir.path().join("keep.txt"), b"x").unwrap();
    fs::write(dir.path().join("drop.tmp"), b"x").unwrap();

    let walker = Walker::new(
        dir.path(),
        WalkerConfig::new(false, vec!["*.tmp".to_string(), "scratch/".to_string()]),
    );
    assert_eq!(relative_paths(&walker), vec!["./keep.txt"]);
}

#[cfg(unix)]
#[test]
fn test_scan_excludes_symlinks() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("real.txt"), b"x").unwrap();
    fs::create_dir(dir.path().join("realdir")).unwrap();
    fs::write(dir.path().join("realdir/inner.txt"), b"x").unwrap();
    std::os::unix::fs::symlink(dir.path().join("real.txt"), dir.path().join("link.txt")).unwrap();
    std::os::unix::fs::symlink(dir.path().join("realdir"), dir.path().join("linkdir")).unwrap();

    let walker = Walker::new(dir.path(), WalkerConfig::default());
    assert_eq!(
        relative_paths(&walker),
        vec!["./real.txt", "./realdir/inner.txt"]
    );
}

#[test]
fn test_scan_special_characters_in_names() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("with space.txt"), b"x").unwrap();
    fs::write(dir.path().join("quote'd.txt"), b"x").unwrap();
    fs::write(dir.path().join("under_score.txt"), b"x").unwrap();

    let walker = Walker::new(dir.path(), WalkerConfig::default());
    assert_eq!(
        relative_paths(&walker),
        vec!["./quote'd.txt", "./under_score.txt", "./with space.txt"]
    );
}
