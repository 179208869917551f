//! Coordinator: runs the two worker pools, polls for cancellation, sorts and installs the catalog.

use log::debug;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::engine::locale::LocaleLease;
use crate::engine::progress::SharedProgress;
use crate::table::LibraryTable;
use crate::types::{Catalog, ErrorRecord, LoadOpts, PartMetadata};

use super::collector::ErrorCollector;
use super::context::{PipelineState, PipelineTuning};
use super::enumerate::spawn_enumerate_workers;
use super::error_handler::join_workers;
use super::prefetch::spawn_prefetch_workers;

/// Owns the current catalog across loads and runs the prefetch → enumerate pipeline.
pub struct CatalogLoader {
    opts: LoadOpts,
    catalog: Catalog,
    errors: Arc<ErrorCollector>,
    cancelled: Arc<AtomicBool>,
    last_cancelled: bool,
}

impl CatalogLoader {
    pub fn new(opts: LoadOpts) -> Self {
        Self {
            opts,
            catalog: Catalog::stale(),
            errors: Arc::new(ErrorCollector::new()),
            cancelled: Arc::new(AtomicBool::new(false)),
            last_cancelled: false,
        }
    }

    /// (Re)scan `lib`, or every library in `table` when None. Returns true when no error was
    /// collected. A false return still installs whatever parsed correctly.
    ///
    /// When the table's freshness signature equals the held timestamp nothing is called and
    /// the current catalog is kept.
    pub fn load<T>(
        &mut self,
        table: &Arc<T>,
        lib: Option<&str>,
        progress: Option<SharedProgress>,
    ) -> bool
    where
        T: LibraryTable + ?Sized + 'static,
    {
        let signature = table.freshness_signature(lib);
        if signature != 0 && signature == self.catalog.timestamp {
            debug!("catalog is fresh (signature {}), skipping load", signature);
            self.last_cancelled = false;
            return true;
        }

        let start = Instant::now();
        self.cancelled.store(false, Ordering::Relaxed);
        self.errors = Arc::new(ErrorCollector::new());

        let libraries = match lib {
            Some(l) => vec![l.to_string()],
            None => table.enumerate_library_ids(),
        };
        let tuning = PipelineTuning::resolve(&self.opts, libraries.len());
        debug!(
            "loading {} libraries ({} prefetch / {} parse threads)",
            libraries.len(),
            tuning.prefetch_threads,
            tuning.parse_threads
        );
        let state = Arc::new(PipelineState::new(
            libraries,
            Arc::clone(&self.errors),
            Arc::clone(&self.cancelled),
        ));

        if let Some(p) = &progress {
            p.set_max_progress(state.enqueued);
            p.set_message("Fetching part libraries...");
        }

        let handles = spawn_prefetch_workers(table, &state, &progress, tuning.prefetch_threads);
        self.wait_for_phase(&state, state.enqueued, &handles, &progress, self.opts.prefetch_poll);
        join_workers(handles, &self.errors, "prefetch");
        state.warmed.close();
        debug!(
            "prefetch phase done: {} of {} libraries warmed",
            state.warmed.len(),
            state.enqueued
        );

        if !state.is_cancelled() {
            self.run_enumerate_phase(table, &state, &progress, tuning.parse_threads);
        }

        let cancelled = state.is_cancelled();
        let mut parts: Vec<PartMetadata> = state.parsed.drain();
        drop(state);
        parts.sort_by(PartMetadata::cmp_key);

        // A cancelled load is never trusted as fresh.
        let timestamp = if cancelled { 0 } else { signature };
        debug!(
            "installed {} parts in {:?} (cancelled: {}, errors: {})",
            parts.len(),
            start.elapsed(),
            cancelled,
            self.errors.len()
        );
        self.catalog = Catalog::new(parts, timestamp);
        self.last_cancelled = cancelled;

        self.errors.is_empty()
    }

    /// Phase 2 under the locale lease: acquired before the first worker starts, released after
    /// the last one is joined, also on cancellation.
    fn run_enumerate_phase<T>(
        &self,
        table: &Arc<T>,
        state: &Arc<PipelineState>,
        progress: &Option<SharedProgress>,
        num_threads: usize,
    ) where
        T: LibraryTable + ?Sized + 'static,
    {
        let total = state.warmed.len();
        state.reset_finished();
        if let Some(p) = progress {
            p.set_max_progress(total);
            p.advance_phase();
            p.set_message("Loading parts...");
        }

        let _lease = LocaleLease::acquire();
        let handles = spawn_enumerate_workers(table, state, progress, num_threads);
        self.wait_for_phase(state, total, &handles, progress, self.opts.parse_poll);
        join_workers(handles, &self.errors, "enumerate");

        if let Some(p) = progress {
            p.advance_phase();
        }
    }

    /// Sleep-poll until `total` items are finished, every worker exited, or the load was
    /// cancelled. The progress sink's `keep_going` is asked once per tick.
    fn wait_for_phase(
        &self,
        state: &PipelineState,
        total: usize,
        handles: &[JoinHandle<()>],
        progress: &Option<SharedProgress>,
        poll: Duration,
    ) {
        while !state.is_cancelled() && state.finished() < total {
            if let Some(p) = progress
                && !p.keep_going()
            {
                debug!("progress sink asked to stop, cancelling");
                state.cancel();
                break;
            }
            if handles.iter().all(JoinHandle::is_finished) {
                break;
            }
            thread::sleep(poll);
        }
    }

    /// Ask running workers to stop after their current library. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Shared flag for cancelling from another thread (e.g. a Ctrl+C handler) while `load` runs.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    /// True when the most recent `load` stopped early.
    pub fn was_cancelled(&self) -> bool {
        self.last_cancelled
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn into_catalog(self) -> Catalog {
        self.catalog
    }

    pub fn timestamp(&self) -> i64 {
        self.catalog.timestamp
    }

    /// Install a catalog read from the disk cache so the next `load` can hit the fast path.
    pub fn install_cached(&mut self, catalog: Catalog) {
        debug!(
            "installing cached catalog: {} parts, timestamp {}",
            catalog.len(),
            catalog.timestamp
        );
        self.catalog = catalog;
    }

    /// Errors from the most recent load, oldest first.
    pub fn errors(&self) -> Vec<ErrorRecord> {
        self.errors.snapshot()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn pop_error(&self) -> Option<ErrorRecord> {
        self.errors.pop()
    }
}

impl Default for CatalogLoader {
    fn default() -> Self {
        Self::new(LoadOpts::default())
    }
}
