//! CLI command handler: load the cache, run the loader, print the catalog, save the cache.

use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::Ordering;

use crate::Opts;
use crate::dir_table::DirLibraryTable;
use crate::engine::arg_parser::Cli;
use crate::engine::cache::{load_cache, save_cache};
use crate::engine::progress::{KdamProgress, SharedProgress};
use crate::pipeline::CatalogLoader;
use crate::types::{Catalog, LoadOpts, PartMetadata};
use crate::utils::config::PackagePaths;
use crate::utils::{apply_file_to_opts, load_partcat_toml, setup_logging};

/// Defaults, then `.partcat.toml` in DIR, then CLI flags.
pub fn build_opts(cli: &Cli) -> Opts {
    let mut opts = Opts {
        root: cli.dir.clone(),
        ..Opts::default()
    };
    if let Some(file) = load_partcat_toml(&cli.dir) {
        apply_file_to_opts(&file, &mut opts);
    }
    if cli.cache.is_some() {
        opts.cache_path = cli.cache.clone();
    }
    opts.no_cache |= cli.no_cache;
    opts.lib = cli.lib.clone();
    if cli.threads.is_some() {
        opts.parse_threads = cli.threads;
    }
    if cli.prefetch_threads.is_some() {
        opts.prefetch_threads = cli.prefetch_threads;
    }
    if cli.poll_ms.is_some() {
        opts.poll_ms = cli.poll_ms;
    }
    if let Some(v) = cli.verbose {
        opts.verbose = v;
    }
    if let Some(l) = cli.list {
        opts.list = l;
    }
    opts.search = cli.search.clone();
    opts
}

fn cache_path(opts: &Opts) -> PathBuf {
    opts.cache_path
        .clone()
        .unwrap_or_else(|| opts.root.join(PackagePaths::get().cache_filename()))
}

/// Run one load over the libraries in `cli.dir`.
pub fn handle_run(cli: &Cli) -> Result<()> {
    let opts = build_opts(cli);
    setup_logging(opts.verbose);
    debug!("{} CONFIG:{:#?}", PackagePaths::get().pkg_name().to_uppercase(), opts);

    let table = Arc::new(DirLibraryTable::open(&opts.root)?);
    let mut loader = CatalogLoader::new(LoadOpts::from(&opts));
    let cache_path = cache_path(&opts);
    if !opts.no_cache {
        loader.install_cached(load_cache(&cache_path));
    }

    let cancel = loader.cancel_handle();
    let cancel_handler = Arc::clone(&cancel);
    ctrlc::set_handler(move || {
        cancel_handler.store(true, Ordering::Relaxed);
    })
    .context("set Ctrl+C handler")?;

    let progress: Option<SharedProgress> = opts
        .verbose
        .then(|| Arc::new(KdamProgress::new(Arc::clone(&cancel))) as SharedProgress);

    let ok = loader.load(&table, opts.lib.as_deref(), progress);
    if opts.verbose {
        eprintln!();
    }
    while let Some(err) = loader.pop_error() {
        eprintln!("  error: {}", err);
    }
    if loader.was_cancelled() {
        anyhow::bail!("Loading cancelled by user; catalog not cached");
    }
    if !ok {
        warn!("Some libraries or parts failed to load; catalog is partial");
    }

    let catalog = loader.catalog();
    print_catalog(catalog, &opts);

    if !opts.no_cache && !catalog.is_stale() {
        save_cache(catalog, &cache_path)?;
    }
    Ok(())
}

fn print_catalog(catalog: &Catalog, opts: &Opts) {
    info!(
        "{} parts in {} libraries",
        catalog.len(),
        catalog.libraries().len()
    );
    if let Some(term) = &opts.search {
        for part in catalog.search(term) {
            println!("{}", format_part(part));
        }
    } else if opts.list {
        for part in catalog {
            println!("{}", format_part(part));
        }
    }
}

fn format_part(part: &PartMetadata) -> String {
    format!(
        "{}\t{} pads ({} unique)\t{}",
        part.full_id(),
        part.pad_count(),
        part.unique_pad_count(),
        part.description()
    )
}
