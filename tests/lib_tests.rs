use clap::Parser;
use partcat::engine::Cli;
use partcat::engine::cli::build_opts;
use partcat::pipeline::PipelineTuning;
use partcat::utils::partcat_toml::parse_partcat_toml;
use partcat::utils::{WorkerThreadLimits, apply_file_to_opts};
use partcat::{
    Catalog, ErrorKind, LoadError, LoadOpts, Opts, PartMetadata, PartRecord, cmp_key_parts,
};
use std::cmp::Ordering;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

fn part(lib: &str, name: &str, desc: &str, kw: &str) -> PartMetadata {
    PartMetadata::new(
        lib.to_string(),
        name.to_string(),
        PartRecord {
            description: desc.to_string(),
            keywords: kw.to_string(),
            ..PartRecord::default()
        },
        0,
    )
}

fn sorted_catalog() -> Catalog {
    let mut parts = vec![
        part("Resistor", "R_0805", "Resistor 0805", "r res"),
        part("capacitor", "C_0603", "Capacitor 0603", "cap"),
        part("Resistor", "r_0603", "Resistor 0603", "r res"),
        part("Capacitor", "C_0402", "Capacitor 0402", "cap"),
        part("Device", "LED", "Light emitting diode", "led diode"),
    ];
    parts.sort_by(|a, b| a.cmp_key(b));
    Catalog::new(parts, 7)
}

// --- ordering ---

#[test]
fn test_cmp_ignores_case() {
    assert_eq!(cmp_key_parts("abc", "x", "ABC", "X"), Ordering::Equal);
    assert_eq!(cmp_key_parts("a", "zzz", "B", "aaa"), Ordering::Less);
    assert_eq!(cmp_key_parts("Lib", "b", "lib", "A"), Ordering::Greater);
}

#[test]
fn test_library_compared_before_name() {
    assert_eq!(cmp_key_parts("A", "Z", "B", "A"), Ordering::Less);
    // Prefix sorts first.
    assert_eq!(cmp_key_parts("Lib", "R", "Lib_Extra", "A"), Ordering::Less);
}

// --- Catalog ---

#[test]
fn test_catalog_sorted_order() {
    let catalog = sorted_catalog();
    let ids: Vec<String> = catalog.iter().map(|p| p.full_id()).collect();
    assert_eq!(
        ids,
        vec![
            "Capacitor:C_0402",
            "capacitor:C_0603",
            "Device:LED",
            "Resistor:r_0603",
            "Resistor:R_0805",
        ]
    );
}

#[test]
fn test_find_is_caseless_but_prefers_exact() {
    let catalog = sorted_catalog();
    let p = catalog.find("resistor", "R_0603").unwrap();
    assert_eq!(p.full_id(), "Resistor:r_0603");
    assert_eq!(catalog.find("Device", "LED").unwrap().description(), "Light emitting diode");
    assert!(catalog.find("Device", "LEDS").is_none());

    let mut parts = vec![part("Lib", "a", "lower", ""), part("Lib", "A", "upper", "")];
    parts.sort_by(|a, b| a.cmp_key(b));
    let dupes = Catalog::new(parts, 1);
    assert_eq!(dupes.find("Lib", "A").unwrap().description(), "upper");
    assert_eq!(dupes.find("Lib", "a").unwrap().description(), "lower");
}

#[test]
fn test_find_by_id() {
    let catalog = sorted_catalog();
    assert_eq!(
        catalog.find_by_id("capacitor:C_0603").unwrap().name(),
        "C_0603"
    );
    assert!(catalog.find_by_id("no-colon").is_none());
    assert!(catalog.find_by_id("Device:").is_none());
}

#[test]
fn test_libraries_in_catalog_order() {
    let catalog = sorted_catalog();
    assert_eq!(
        catalog.libraries(),
        vec!["Capacitor", "capacitor", "Device", "Resistor"]
    );
}

#[test]
fn test_search_matches_name_description_keywords() {
    let catalog = sorted_catalog();
    let hits = |t: &str| catalog.search(t).map(|p| p.name().to_string()).collect::<Vec<_>>();
    assert_eq!(hits("DIODE"), vec!["LED"]);
    assert_eq!(hits("0603"), vec!["C_0603", "r_0603"]);
    assert_eq!(hits("cap"), vec!["C_0402", "C_0603"]);
    assert_eq!(hits("").len(), catalog.len());
    assert!(hits("transistor").is_empty());
}

#[test]
fn test_stale_catalog() {
    let stale = Catalog::stale();
    assert!(stale.is_stale());
    assert!(stale.is_empty());
    assert!(!sorted_catalog().is_stale());
}

// --- errors ---

#[test]
fn test_load_error_record() {
    let rec = LoadError::format("Lib", "bad pad").into_record("Lib");
    assert_eq!(rec.kind, ErrorKind::Format);
    assert_eq!(rec.origin.as_deref(), Some("Lib"));
    assert_eq!(rec.to_string(), "[Lib] malformed data in Lib: bad pad");
    assert_eq!(LoadError::Unexpected("x".into()).kind(), ErrorKind::Unexpected);
}

// --- thread limits ---

#[test]
fn test_prefetch_threads_capped() {
    let limits = WorkerThreadLimits {
        all_threads: 8,
        prefetch_max: 32,
    };
    assert_eq!(limits.prefetch_threads(3), 3);
    assert_eq!(limits.prefetch_threads(100), 8);
    assert_eq!(limits.prefetch_threads(0), 1);
    assert_eq!(limits.parse_threads(), 9);

    let wide = WorkerThreadLimits {
        all_threads: 64,
        prefetch_max: 32,
    };
    assert_eq!(wide.prefetch_threads(100), 32);
}

#[test]
fn test_tuning_explicit_counts_win() {
    let limits = WorkerThreadLimits {
        all_threads: 4,
        prefetch_max: 32,
    };
    let opts = LoadOpts {
        prefetch_threads: Some(2),
        parse_threads: Some(0),
        ..LoadOpts::default()
    };
    let tuning = PipelineTuning::resolve_with(&opts, 10, limits);
    assert_eq!(tuning.prefetch_threads, 2);
    assert_eq!(tuning.parse_threads, 1);

    let tuning = PipelineTuning::resolve_with(&LoadOpts::default(), 10, limits);
    assert_eq!(tuning.prefetch_threads, 4);
    assert_eq!(tuning.parse_threads, 5);
}

// --- config ---

#[test]
fn test_toml_settings_applied() {
    let file = parse_partcat_toml(
        "[settings]\ncache = \"out/cat\"\nparse_threads = 3\npoll_ms = 5\nlist = true\n",
    )
    .unwrap();
    let mut opts = Opts {
        root: PathBuf::from("/libs"),
        ..Opts::default()
    };
    apply_file_to_opts(&file, &mut opts);
    assert_eq!(opts.cache_path, Some(PathBuf::from("/libs/out/cat")));
    assert_eq!(opts.parse_threads, Some(3));
    assert_eq!(opts.prefetch_threads, None);
    assert!(opts.list);
    assert!(!opts.verbose);

    let load = LoadOpts::from(&opts);
    assert_eq!(load.parse_poll, Duration::from_millis(5));
    assert_eq!(load.prefetch_poll, Duration::from_millis(5));
}

#[test]
fn test_toml_rejects_unknown_setting() {
    assert!(parse_partcat_toml("[settings]\nthreads = 3\n").is_err());
    assert!(parse_partcat_toml("").is_ok());
}

#[test]
fn test_cli_overrides_config_file() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(
        tmp.path().join(".partcat.toml"),
        "[settings]\nparse_threads = 3\nverbose = true\nlist = true\n",
    )
    .unwrap();
    let dir = tmp.path().to_str().unwrap();

    let cli = Cli::try_parse_from(["partcat", dir, "-t", "6", "--list", "false"]).unwrap();
    let opts = build_opts(&cli);
    assert_eq!(opts.parse_threads, Some(6));
    assert!(opts.verbose);
    assert!(!opts.list);
    assert!(opts.cache_path.is_none());

    let cli = Cli::try_parse_from(["partcat", dir, "-s", "res"]).unwrap();
    let opts = build_opts(&cli);
    assert_eq!(opts.parse_threads, Some(3));
    assert_eq!(opts.search.as_deref(), Some("res"));
}
