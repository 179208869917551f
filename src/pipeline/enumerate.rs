//! Phase 2: enumerate each warmed library and build one [`PartMetadata`] per part.
//!
//! Runs while the coordinator holds the [`LocaleLease`](crate::engine::locale::LocaleLease).

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::engine::progress::SharedProgress;
use crate::table::LibraryTable;
use crate::types::PartMetadata;

use super::context::PipelineState;
use super::error_handler::catch_errors;

/// Enumerate and look up every part of `lib`. A failing part is recorded and skipped.
fn enumerate_library<T>(table: &T, state: &PipelineState, lib: &str)
where
    T: LibraryTable + ?Sized,
{
    let names = match catch_errors(|| table.enumerate_parts(lib)) {
        Ok(names) => names,
        Err(e) => {
            state.errors.push_load_error(lib, e);
            return;
        }
    };
    for name in names {
        match catch_errors(|| table.lookup_part(lib, &name)) {
            Ok(record) => {
                let part = PartMetadata::new(lib.to_string(), name, record, state.next_order());
                if state.parsed.push(part).is_err() {
                    state
                        .errors
                        .push_unexpected(Some(lib), "results queue closed early");
                    return;
                }
            }
            Err(e) => state.errors.push_load_error(lib, e),
        }
    }
}

/// Single enumerate worker. The flag is only checked between libraries.
fn enumerate_worker_loop<T>(table: Arc<T>, state: Arc<PipelineState>, progress: Option<SharedProgress>)
where
    T: LibraryTable + ?Sized,
{
    while !state.is_cancelled() {
        let Some(lib) = state.warmed.pop() else {
            break;
        };
        enumerate_library(table.as_ref(), &state, &lib);
        state.mark_finished();
        if let Some(p) = &progress {
            p.tick();
        }
    }
}

/// Spawn `num_threads` enumerate workers. `warmed` must already be closed.
pub fn spawn_enumerate_workers<T>(
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
            thread::spawn(move || enumerate_worker_loop(table, state, progress))
        })
        .collect()
}
