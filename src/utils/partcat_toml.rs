//! Load `.partcat.toml` from the library root (CLI only). Lib callers pass `LoadOpts` directly.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::Opts;
use crate::utils::config::PackagePaths;

#[derive(Debug, Default, Deserialize)]
pub struct PartcatToml {
    #[serde(default)]
    settings: Settings,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct Settings {
    cache: Option<String>,
    no_cache: Option<bool>,
    prefetch_threads: Option<usize>,
    parse_threads: Option<usize>,
    poll_ms: Option<u64>,
    verbose: Option<bool>,
    list: Option<bool>,
}

/// Load the config file from `dir` if present. None if missing or unreadable.
pub fn load_partcat_toml(dir: &Path) -> Option<PartcatToml> {
    let path = dir.join(PackagePaths::get().config_filename());
    let s = std::fs::read_to_string(&path).ok()?;
    parse_partcat_toml(&s)
        .map_err(|e| log::warn!("{}: {}", path.display(), e))
        .ok()
}

pub fn parse_partcat_toml(s: &str) -> Result<PartcatToml, toml::de::Error> {
    toml::from_str(s)
}

/// Overwrite opts field from file when present.
macro_rules! apply_file_opt {
    ($set:expr, $opts:expr, $set_field:ident => $opts_field:ident) => {
        if let Some(v) = $set.$set_field {
            $opts.$opts_field = v;
        }
    };
}

/// Apply file config to opts (only fields present in the file). Call before applying CLI.
pub fn apply_file_to_opts(file: &PartcatToml, opts: &mut Opts) {
    let set = &file.settings;
    if let Some(ref p) = set.cache {
        let p = PathBuf::from(p);
        // Relative cache paths are relative to the library root.
        opts.cache_path = Some(if p.is_relative() { opts.root.join(p) } else { p });
    }
    apply_file_opt!(set, opts, no_cache => no_cache);
    if set.prefetch_threads.is_some() {
        opts.prefetch_threads = set.prefetch_threads;
    }
    if set.parse_threads.is_some() {
        opts.parse_threads = set.parse_threads;
    }
    if set.poll_ms.is_some() {
        opts.poll_ms = set.poll_ms;
    }
    apply_file_opt!(set, opts, verbose => verbose);
    apply_file_opt!(set, opts, list => list);
}
