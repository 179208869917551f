//! Application configuration constants.
//! Tuning and thresholds in one place.

use std::sync::OnceLock;
use std::time::Duration;

// ---- Package / paths (from CARGO_PKG_NAME, cached) ----

/// Package-derived file names: built once from `CARGO_PKG_NAME`, then cached.
pub struct PackagePaths {
    pkg_name: &'static str,
    cache_filename: String,
    config_filename: String,
}

static PACKAGE_PATHS: OnceLock<PackagePaths> = OnceLock::new();

impl PackagePaths {
    /// Build and cache names from `CARGO_PKG_NAME`. Called once on first use.
    pub fn get() -> &'static PackagePaths {
        PACKAGE_PATHS.get_or_init(|| {
            let pkg = env!("CARGO_PKG_NAME");
            PackagePaths {
                pkg_name: pkg,
                cache_filename: format!(".{pkg}_cache"),
                config_filename: format!(".{pkg}.toml"),
            }
        })
    }

    pub fn pkg_name(&self) -> &str {
        self.pkg_name
    }

    /// Default catalog cache file, placed in the library root.
    pub fn cache_filename(&self) -> &str {
        &self.cache_filename
    }

    pub fn config_filename(&self) -> &str {
        &self.config_filename
    }
}

// ---- Worker threads ----

/// Thread limits for the two pools.
/// Use [`WorkerThreadLimits::current()`] to fill `all_threads` from rayon; the rest are const.
#[derive(Clone, Copy, Debug)]
pub struct WorkerThreadLimits {
    /// Available threads (from rayon); set by [`WorkerThreadLimits::current()`].
    pub all_threads: usize,
    /// Max prefetch workers regardless of library count.
    pub prefetch_max: usize,
}

impl Default for WorkerThreadLimits {
    fn default() -> Self {
        Self {
            all_threads: 0, // use current() to set from rayon
            prefetch_max: Self::PREFETCH_MAX_THREADS,
        }
    }
}

impl WorkerThreadLimits {
    pub const PREFETCH_MAX_THREADS: usize = 32;

    /// Build limits with `all_threads` set from `rayon::current_num_threads()`.
    pub fn current() -> Self {
        Self {
            all_threads: rayon::current_num_threads(),
            ..Self::default()
        }
    }

    /// Phase 1: one worker per library, capped by available threads and `prefetch_max`.
    pub fn prefetch_threads(&self, library_count: usize) -> usize {
        library_count
            .min(self.all_threads)
            .min(self.prefetch_max)
            .max(1)
    }

    /// Phase 2: one more than the available threads; enumeration mixes I/O and CPU.
    pub fn parse_threads(&self) -> usize {
        self.all_threads.max(1) + 1
    }
}

// ---- Coordinator polling ----

/// How often the coordinator checks completion and asks the progress sink to keep going.
pub struct PollConsts;

impl PollConsts {
    pub const PREFETCH: Duration = Duration::from_millis(20);
    pub const PARSE: Duration = Duration::from_millis(30);
}

// ---- Part files ----

/// Extension of part files in a [`DirLibraryTable`](crate::dir_table::DirLibraryTable) library.
pub const PART_FILE_EXTENSION: &str = "toml";
