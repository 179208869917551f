use clap::Parser;
use std::path::PathBuf;

struct DefaultArgs;

impl DefaultArgs {
    pub const DIR: &'static str = ".";
}

/// Concurrent part-library catalog loader with a freshness-gated cache.
#[derive(Clone, Parser)]
#[command(name = "partcat")]
#[command(about = "Scan every part library under DIR and print the catalog summary.")]
pub struct Cli {
    /// Library root: each sub-directory is a library. Default: current directory.
    #[arg(value_name = "DIR", default_value = DefaultArgs::DIR)]
    pub dir: PathBuf,

    /// Only rescan this library.
    #[arg(long)]
    pub lib: Option<String>,

    /// Path to the catalog cache. Default: `.partcat_cache` in DIR.
    #[arg(long, short)]
    pub cache: Option<PathBuf>,

    /// Neither read nor write the cache.
    #[arg(long)]
    pub no_cache: bool,

    /// Enumerate (phase 2) worker threads. Default: available threads + 1.
    #[arg(long, short = 't')]
    pub threads: Option<usize>,

    /// Prefetch (phase 1) worker threads. Default: one per library, capped.
    #[arg(long)]
    pub prefetch_threads: Option<usize>,

    /// Coordinator poll interval in milliseconds.
    #[arg(long)]
    pub poll_ms: Option<u64>,

    /// Print every part in the catalog.
    #[arg(long, short = 'l', num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub list: Option<bool>,

    /// Print parts whose name, description or keywords contain TERM.
    #[arg(long, short = 's', value_name = "TERM")]
    pub search: Option<String>,

    /// Verbose output (progress bar and debug logs).
    #[arg(long, short = 'v', num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub verbose: Option<bool>,
}
