//! partcat: concurrent part-library catalog loader with a freshness-gated disk cache.

pub mod dir_table;
pub mod engine;
pub mod error;
pub mod pipeline;
pub mod table;
pub mod types;
pub mod utils;

/// Re-export types for API
pub use types::*;

pub use error::{CacheError, LoadError, LoadResult};
pub use pipeline::CatalogLoader;
pub use table::LibraryTable;

use log::debug;
use std::path::Path;
use std::sync::Arc;

/// Result alias used by public partcat API
pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// One-shot load of every library under `root` (directory layout, see
/// [`DirLibraryTable`](crate::dir_table::DirLibraryTable)).
///
/// Pass the catalog from a previous call as `existing` to skip the scan when nothing changed.
/// Returns the catalog and the errors collected along the way; errors do not fail the call.
pub fn load_dir(
    root: &Path,
    opts: &LoadOpts,
    existing: Option<Catalog>,
) -> Result<(Catalog, Vec<ErrorRecord>)> {
    debug!(
        "{} CONFIG:{:#?}",
        env!("CARGO_PKG_NAME").to_string().to_uppercase(),
        opts
    );
    let table = Arc::new(dir_table::DirLibraryTable::open(root)?);
    let mut loader = CatalogLoader::new(opts.clone());
    if let Some(catalog) = existing {
        loader.install_cached(catalog);
    }
    loader.load(&table, None, None);
    let errors = loader.errors();
    Ok((loader.into_catalog(), errors))
}
