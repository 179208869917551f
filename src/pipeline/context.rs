//! Per-load pipeline state shared by the coordinator and both worker pools, plus pool tuning.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicUsize, Ordering};

use crate::types::{LibraryId, LoadOpts, PartMetadata};
use crate::utils::config::WorkerThreadLimits;

use super::collector::ErrorCollector;
use super::queue::SyncQueue;

/// Worker counts for the two phases.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipelineTuning {
    pub prefetch_threads: usize,
    pub parse_threads: usize,
}

impl PipelineTuning {
    /// Resolve thread counts for `library_count` libraries: explicit options win, otherwise
    /// phase 1 gets `min(libraries, available)` and phase 2 gets `available + 1`.
    pub fn resolve(opts: &LoadOpts, library_count: usize) -> Self {
        Self::resolve_with(opts, library_count, WorkerThreadLimits::current())
    }

    pub fn resolve_with(opts: &LoadOpts, library_count: usize, limits: WorkerThreadLimits) -> Self {
        let prefetch_threads = opts
            .prefetch_threads
            .unwrap_or_else(|| limits.prefetch_threads(library_count))
            .max(1);
        let parse_threads = opts
            .parse_threads
            .unwrap_or_else(|| limits.parse_threads())
            .max(1);
        Self {
            prefetch_threads,
            parse_threads,
        }
    }
}

/// State for one load. Built fresh by the coordinator, handed to workers as `Arc`, dropped
/// once the pools are joined and the results drained.
pub struct PipelineState {
    /// Phase 1 input, seeded and closed before any worker starts.
    pub input: SyncQueue<LibraryId>,
    /// Phase 1 output / phase 2 input. Closed after phase 1 is joined.
    pub warmed: SyncQueue<LibraryId>,
    /// Phase 2 output.
    pub parsed: SyncQueue<PartMetadata>,
    pub errors: Arc<ErrorCollector>,
    /// Libraries seeded into `input`.
    pub enqueued: usize,
    finished: AtomicUsize,
    next_order: AtomicI32,
    cancelled: Arc<AtomicBool>,
}

impl PipelineState {
    pub fn new(
        libraries: Vec<LibraryId>,
        errors: Arc<ErrorCollector>,
        cancelled: Arc<AtomicBool>,
    ) -> Self {
        let enqueued = libraries.len();
        Self {
            input: libraries.into_iter().collect(),
            warmed: SyncQueue::new(),
            parsed: SyncQueue::new(),
            errors,
            enqueued,
            finished: AtomicUsize::new(0),
            next_order: AtomicI32::new(0),
            cancelled,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn finished(&self) -> usize {
        self.finished.load(Ordering::Relaxed)
    }

    pub fn mark_finished(&self) {
        self.finished.fetch_add(1, Ordering::Relaxed);
    }

    /// Only between phases, with no worker running.
    pub fn reset_finished(&self) {
        self.finished.store(0, Ordering::Relaxed);
    }

    /// Arrival counter used as `order_num` for parsed parts.
    pub fn next_order(&self) -> i32 {
        self.next_order.fetch_add(1, Ordering::Relaxed)
    }
}
