use collcheck::cli::OutputFormat;
use collcheck::config::Config;
use collcheck::error::ExitCode;
use collcheck::remote::MemoryCatalog;
use collcheck::run_with_catalog;
use collcheck::scanner::digest_bytes;
use std::fs;
use std::path::PathBuf;
use tempfile::{tempdir, TempDir};

fn setup() -> (TempDir, PathBuf, Config) {
    let dir = tempdir().unwrap();
    let root = dir.path().join("X");
    fs::create_dir(&root).unwrap();
    fs::write(root.join("a.txt"), b"alpha").unwrap();
    fs::write(root.join("b.txt"), b"bravo").unwrap();
    let config = Config {
        cache_path: dir.path().join("cache.json"),
        jobs: 2,
        progress: false,
        ..Config::default()
    };
    (dir, root, config)
}

fn catalog() -> MemoryCatalog {
    MemoryCatalog::new("/zone")
        .with_object("/zone/X/a.txt", &format!("sha2:{}", digest_bytes(b"alpha")))
        .with_object("/zone/X/c.txt", &format!("sha2:{}", digest_bytes(b"charlie")))
}

#[test]
fn test_text_report() {
    let (_dir, root, config) = setup();
    let mut out = Vec::new();

    let code = run_with_catalog(&config, &root, "/zone/X", &catalog(), false, &mut out).unwrap();

    assert_eq!(code, ExitCode::Mismatch);
    let text = String::from_utf8(out).unwrap();
    let lines: Vec<_> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("local-only\t./b.txt\tlocal="));
    assert!(lines[1].starts_with("remote-only\t./c.txt\tremote="));
}

#[test]
fn test_json_report() {
    let (_dir, root, config) = setup();
    let config = Config {
        output: OutputFormat::Json,
        ..config
    };
    let mut out = Vec::new();

    let code = run_with_catalog(&config, &root, "/zone/X", &catalog(), false, &mut out).unwrap();

    assert_eq!(code, ExitCode::Mismatch);
    let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(value["status"], "mismatch");
    assert_eq!(value["exit_code"], 1);
    assert_eq!(value["summary"]["matched"], 1);
    assert_eq!(value["summary"]["local_only"], 1);
    assert_eq!(value["summary"]["remote_only"], 1);
    assert_eq!(value["summary"]["hashed"], 2);
    assert_eq!(value["discrepancies"][0]["path"], "./b.txt");
}

#[test]
fn test_csv_report() {
    let (_dir, root, config) = setup();
    let config = Config {
        output: OutputFormat::Csv,
        ..config
    };
    let mut out = Vec::new();

    run_with_catalog(&config, &root, "/zone/X", &catalog(), false, &mut out).unwrap();

    let text = String::from_utf8(out).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("kind,path,local_digest,remote_digest"));
    assert!(lines.next().unwrap().starts_with("local-only,./b.txt,"));
    assert!(lines.next().unwrap().starts_with("remote-only,./c.txt,,"));
    assert_eq!(lines.next(), None);
}

#[test]
fn test_match_prints_nothing() {
    let (_dir, root, config) = setup();
    let catalog = MemoryCatalog::new("/zone")
        .with_object("/zone/X/a.txt", &format!("sha2:{}", digest_bytes(b"alpha")))
        .with_object("/zone/X/b.txt", &format!("sha2:{}", digest_bytes(b"bravo")));
    let mut out = Vec::new();

    let code = run_with_catalog(&config, &root, "X", &catalog, false, &mut out).unwrap();

    assert_eq!(code, ExitCode::Match);
    assert!(out.is_empty());
}

#[test]
fn test_failure_carries_context() {
    let (_dir, root, config) = setup();
    let mut out = Vec::new();

    let err = run_with_catalog(&config, &root, "/zone/X", &MemoryCatalog::new("/zone"), false, &mut out)
        .unwrap_err();

    assert!(err.to_string().contains("Audit of"));
    assert!(format!("{err:#}").contains("no objects"));
    assert!(out.is_empty());
}

#[test]
fn test_redirected_text_report_has_no_escapes() {
    let (_dir, root, config) = setup();
    let color = collcheck::report_color(false, false);
    let mut out = Vec::new();

    run_with_catalog(&config, &root, "/zone/X", &catalog(), color, &mut out).unwrap();

    let text = String::from_utf8(out).unwrap();
    assert!(!text.is_empty());
    assert!(!text.contains('\u{1b}'));
}
