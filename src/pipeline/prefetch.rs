//! Phase 1: warm every library so phase 2 can enumerate it quickly.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::engine::progress::SharedProgress;
use crate::table::LibraryTable;

use super::context::PipelineState;
use super::error_handler::catch_errors;

/// Single prefetch worker: pop a library, warm it, forward it to `warmed` on success.
/// Every popped library counts as finished, failed or not.
fn prefetch_worker_loop<T>(table: Arc<T>, state: Arc<PipelineState>, progress: Option<SharedProgress>)
where
    T: LibraryTable + ?Sized,
{
    while !state.is_cancelled() {
        let Some(lib) = state.input.pop() else {
            break;
        };
        match catch_errors(|| table.warm(&lib)) {
            Ok(()) => {
                if let Err(lib) = state.warmed.push(lib) {
                    state
                        .errors
                        .push_unexpected(Some(&lib), "warmed queue closed early");
                }
            }
            Err(e) => state.errors.push_load_error(&lib, e),
        }
        state.mark_finished();
        if let Some(p) = &progress {
            p.tick();
        }
    }
}

/// Spawn `num_threads` prefetch workers. Extra workers find the closed input queue empty and exit.
pub fn spawn_prefetch_workers<T>(
    table: &Arc<T>,
    state: &Arc<PipelineState>,
    progress: &Option<SharedProgress>,
    num_threads: usize,
) -> Vec<JoinHandle<()>>
where
    T: LibraryTable + ?Sized + 'static,
{
    (0..num_threads)
        .map(|_| {
            let table = Arc::clone(table);
            let state = Arc::clone(state);
            let progress = progress.clone();
            thread::spawn(move || prefetch_worker_loop(table, state, progress))
        })
        .collect()
}
