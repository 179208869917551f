//! Cache file: write/read, corruption handling, atomic replacement.

use partcat::engine::cache::{RECORD_LINES, parse_cache, read_cache};
use partcat::engine::{load_cache, save_cache};
use partcat::{CacheError, Catalog, PartMetadata, PartRecord};
use std::fs;
use tempfile::TempDir;

fn part(lib: &str, name: &str, desc: &str, kw: &str, order: i32, pads: u32) -> PartMetadata {
    PartMetadata::new(
        lib.to_string(),
        name.to_string(),
        PartRecord {
            description: desc.to_string(),
            keywords: kw.to_string(),
            pad_count: pads,
            unique_pad_count: pads.saturating_sub(1),
        },
        order,
    )
}

fn sample_catalog() -> Catalog {
    Catalog::new(
        vec![
            part("Connector", "USB_C", "USB type C\nreceptacle", "usb c", 0, 24),
            part("Device", "R", "Resistor, 1%\t(0603)", "r res", 2, 2),
            part("device", "r_small", "C:\\parts\\r", "", 1, 2),
        ],
        -8_123_456_789,
    )
}

#[test]
fn test_save_then_load_reproduces_catalog() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("cache");
    let catalog = sample_catalog();

    save_cache(&catalog, &path).unwrap();
    let loaded = load_cache(&path);

    assert_eq!(loaded, catalog);
    assert_eq!(loaded.timestamp, -8_123_456_789);
    assert_eq!(loaded.parts[0].description(), "USB type C\nreceptacle");
    assert_eq!(loaded.parts[2].description(), "C:\\parts\\r");
}

#[test]
fn test_each_record_is_seven_lines() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("cache");
    save_cache(&sample_catalog(), &path).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    assert_eq!(text.lines().count(), 1 + 3 * RECORD_LINES);
    assert_eq!(text.lines().next(), Some("-8123456789"));
}

#[test]
fn test_missing_file_is_stale() {
    let tmp = TempDir::new().unwrap();
    let loaded = load_cache(&tmp.path().join("nope"));
    assert!(loaded.is_stale());
    assert!(loaded.is_empty());
}

#[test]
fn test_truncated_file_is_stale_and_empty() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("cache");
    save_cache(&sample_catalog(), &path).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    let keep: Vec<&str> = text.lines().take(1 + RECORD_LINES + 3).collect();
    fs::write(&path, keep.join("\n")).unwrap();

    assert!(matches!(read_cache(&path), Err(CacheError::Corrupt { .. })));
    let loaded = load_cache(&path);
    assert!(loaded.is_stale());
    assert!(loaded.is_empty());
}

#[test]
fn test_bad_number_rejects_whole_file() {
    let text = "42\nLib\nPart\ndesc\nkw\n0\ntwo\n2\n";
    match parse_cache(text) {
        Err(CacheError::Corrupt { line, .. }) => assert_eq!(line, 7),
        other => panic!("expected corrupt, got {:?}", other.map(|c| c.len())),
    }
}

#[test]
fn test_zero_timestamp_and_empty_body_are_rejected() {
    assert!(parse_cache("0\nLib\nPart\nd\nk\n0\n1\n1\n").is_err());
    assert!(parse_cache("17\n").is_err());
    assert!(parse_cache("").is_err());
}

#[test]
fn test_failed_rename_keeps_existing_destination() {
    let tmp = TempDir::new().unwrap();
    // A non-empty directory at the cache path: the rename cannot replace it.
    let path = tmp.path().join("cache");
    fs::create_dir(&path).unwrap();
    fs::write(path.join("keep.txt"), "keep").unwrap();

    assert!(save_cache(&sample_catalog(), &path).is_err());

    assert!(path.is_dir());
    assert_eq!(fs::read_to_string(path.join("keep.txt")).unwrap(), "keep");
    assert!(!tmp.path().join("cache.tmp").exists());
}

#[test]
fn test_overwrite_replaces_previous_cache() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("cache");
    save_cache(&sample_catalog(), &path).unwrap();

    let newer = Catalog::new(vec![part("Only", "One", "", "", 0, 1)], 99);
    save_cache(&newer, &path).unwrap();

    let loaded = load_cache(&path);
    assert_eq!(loaded.timestamp, 99);
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded.parts[0].full_id(), "Only:One");
}
