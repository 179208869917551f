//! Public and internal types for the partcat API and pipeline.

use std::cmp::Ordering;
use std::path::PathBuf;
use std::time::Duration;

use crate::utils::config::PollConsts;

/// Opaque library nickname, e.g. `Resistor_SMD`.
pub type LibraryId = String;

/// Opaque part name inside one library.
pub type PartName = String;

/// What the library table reports for one part. The pipeline turns it into [`PartMetadata`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PartRecord {
    pub description: String,
    pub keywords: String,
    /// Numbered pads (unnumbered / non-plated pads excluded).
    pub pad_count: u32,
    /// Distinct numbered pad names.
    pub unique_pad_count: u32,
}

/// Lightweight metadata for one part. Immutable once built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PartMetadata {
    lib_id: LibraryId,
    name: PartName,
    description: String,
    keywords: String,
    order_num: i32,
    pad_count: u32,
    unique_pad_count: u32,
}

impl PartMetadata {
    pub fn new(lib_id: LibraryId, name: PartName, record: PartRecord, order_num: i32) -> Self {
        Self {
            lib_id,
            name,
            description: record.description,
            keywords: record.keywords,
            order_num,
            pad_count: record.pad_count,
            unique_pad_count: record.unique_pad_count,
        }
    }

    pub fn lib_id(&self) -> &str {
        &self.lib_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn keywords(&self) -> &str {
        &self.keywords
    }

    /// Insertion/display order: arrival order during a load, or the value read back from the cache.
    pub fn order_num(&self) -> i32 {
        self.order_num
    }

    pub fn pad_count(&self) -> u32 {
        self.pad_count
    }

    pub fn unique_pad_count(&self) -> u32 {
        self.unique_pad_count
    }

    /// `LIB:PART` form used by [`Catalog::find_by_id`].
    pub fn full_id(&self) -> String {
        format!("{}:{}", self.lib_id, self.name)
    }

    /// Case-insensitive ordering on (library, name). Used for the catalog sort.
    pub fn cmp_key(&self, other: &Self) -> Ordering {
        cmp_key_parts(&self.lib_id, &self.name, &other.lib_id, &other.name)
    }

    /// Case-insensitive substring match against name, description and keywords.
    pub fn matches(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        if term.is_empty() {
            return true;
        }
        self.name.to_lowercase().contains(&term)
            || self.description.to_lowercase().contains(&term)
            || self.keywords.to_lowercase().contains(&term)
    }
}

/// Compare two (library, name) pairs case-insensitively. Library first, then name.
pub fn cmp_key_parts(lib_a: &str, name_a: &str, lib_b: &str, name_b: &str) -> Ordering {
    cmp_caseless(lib_a, lib_b).then_with(|| cmp_caseless(name_a, name_b))
}

fn cmp_caseless(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}

/// Sorted set of parts across all scanned libraries plus its freshness signature.
///
/// `timestamp == 0` means "stale, must reload"; it is never a real signature.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Catalog {
    pub parts: Vec<PartMetadata>,
    pub timestamp: i64,
}

impl Catalog {
    pub fn new(parts: Vec<PartMetadata>, timestamp: i64) -> Self {
        Self { parts, timestamp }
    }

    /// Empty catalog with the stale sentinel.
    pub fn stale() -> Self {
        Self::default()
    }

    pub fn is_stale(&self) -> bool {
        self.timestamp == 0
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PartMetadata> {
        self.parts.iter()
    }

    /// Binary search on the sorted list. An exact-case match wins over a caseless one.
    pub fn find(&self, lib_id: &str, name: &str) -> Option<&PartMetadata> {
        let key = |p: &PartMetadata| cmp_key_parts(&p.lib_id, &p.name, lib_id, name);
        let start = self.parts.partition_point(|p| key(p).is_lt());
        let mut same = self.parts[start..].iter().take_while(|p| key(p).is_eq());
        let first = same.clone().next();
        same.find(|p| p.lib_id == lib_id && p.name == name).or(first)
    }

    /// Look up a part by `LIB:PART`. Returns None when the id has no `:`.
    pub fn find_by_id(&self, full_id: &str) -> Option<&PartMetadata> {
        let (lib, name) = full_id.split_once(':')?;
        self.find(lib, name)
    }

    /// Distinct library ids in catalog order.
    pub fn libraries(&self) -> Vec<&str> {
        let mut libs: Vec<&str> = Vec::new();
        for p in &self.parts {
            if libs.last() != Some(&p.lib_id()) {
                libs.push(p.lib_id());
            }
        }
        libs
    }

    pub fn search<'a>(&'a self, term: &'a str) -> impl Iterator<Item = &'a PartMetadata> + 'a {
        self.parts.iter().filter(move |p| p.matches(term))
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a PartMetadata;
    type IntoIter = std::slice::Iter<'a, PartMetadata>;

    fn into_iter(self) -> Self::IntoIter {
        self.parts.iter()
    }
}

/// Closed set of failure kinds surfaced by the library table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Library or part not found / not openable.
    Lookup,
    /// Library or part malformed.
    Format,
    /// Anything else (worker panic, unanticipated collaborator failure).
    Unexpected,
}

/// One collected failure. Never thrown across the pipeline boundary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ErrorRecord {
    pub kind: ErrorKind,
    pub message: String,
    pub origin: Option<LibraryId>,
}

impl std::fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.origin {
            Some(lib) => write!(f, "[{}] {}", lib, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Lib-only options for [`CatalogLoader`](crate::pipeline::CatalogLoader).
#[derive(Clone, Debug)]
pub struct LoadOpts {
    /// Phase 1 (prefetch) worker count. When None, `min(libraries, available threads)`.
    pub prefetch_threads: Option<usize>,
    /// Phase 2 (enumerate) worker count. When None, available threads + 1.
    pub parse_threads: Option<usize>,
    /// Poll interval of the coordinator while phase 1 runs.
    pub prefetch_poll: Duration,
    /// Poll interval of the coordinator while phase 2 runs.
    pub parse_poll: Duration,
}

impl Default for LoadOpts {
    fn default() -> Self {
        Self {
            prefetch_threads: None,
            parse_threads: None,
            prefetch_poll: PollConsts::PREFETCH,
            parse_poll: PollConsts::PARSE,
        }
    }
}

impl From<&Opts> for LoadOpts {
    fn from(o: &Opts) -> Self {
        let mut opts = LoadOpts {
            prefetch_threads: o.prefetch_threads,
            parse_threads: o.parse_threads,
            ..LoadOpts::default()
        };
        if let Some(ms) = o.poll_ms {
            opts.prefetch_poll = Duration::from_millis(ms);
            opts.parse_poll = Duration::from_millis(ms);
        }
        opts
    }
}

/// Full options (CLI). Use [`LoadOpts`] for lib.
#[derive(Clone, Debug, Default)]
pub struct Opts {
    /// Library root directory.
    pub root: PathBuf,
    /// Cache file path. When None, uses `root.join(<package cache filename>)`.
    pub cache_path: Option<PathBuf>,
    /// Skip reading and writing the cache file.
    pub no_cache: bool,
    /// Only rescan this library.
    pub lib: Option<LibraryId>,
    pub prefetch_threads: Option<usize>,
    pub parse_threads: Option<usize>,
    /// Override both poll intervals (milliseconds).
    pub poll_ms: Option<u64>,
    /// Show progress bar and debug logging.
    pub verbose: bool,
    /// Print every part in the catalog.
    pub list: bool,
    /// Print only parts matching this term.
    pub search: Option<String>,
}
