//! Progress reporting: the sink trait the pipeline reports to, and a kdam-backed terminal bar.

use kdam::{Animation, Bar, BarExt};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Receives progress from the coordinator and from worker threads.
///
/// `tick` is called concurrently by workers; everything else comes from the coordinator.
/// `keep_going` is polled by the coordinator and returning false cancels the load.
pub trait ProgressSink: Send + Sync {
    fn set_max_progress(&self, max: usize);
    fn set_message(&self, message: &str);
    fn advance_phase(&self);
    /// One library processed.
    fn tick(&self);
    fn keep_going(&self) -> bool;
}

/// Shared handle passed into worker threads.
pub type SharedProgress = Arc<dyn ProgressSink>;

// Progress bar type alias
pub type ProgressBar = Arc<Mutex<Bar>>;

/// Configuration for creating a progress bar
pub struct ProgressBarConfig {
    pub total: usize,
    pub desc: &'static str,
    pub animation: Animation,
}

impl ProgressBarConfig {
    /// Create a new progress bar configuration
    pub fn new(total: usize, desc: &'static str, animation: Animation) -> Self {
        Self {
            total,
            desc,
            animation,
        }
    }
}

/// Create a progress bar with the given configuration
pub fn create_progress_bar(config: ProgressBarConfig) -> ProgressBar {
    Arc::new(Mutex::new(kdam::tqdm!(
        total = config.total,
        desc = config.desc,
        animation = config.animation,
        unit = " libs"
    )))
}

/// Update progress bar by `n`. Blocks on the lock: ticks are per library, so contention is low
/// and a dropped tick would leave the bar short.
pub fn update_progress_bar(pb: &ProgressBar, n: usize) {
    let mut bar = pb.lock().unwrap_or_else(PoisonError::into_inner);
    let _ = bar.update(n);
}

/// Terminal progress for the CLI. Cancellation comes from a shared flag (set by Ctrl+C).
pub struct KdamProgress {
    bar: ProgressBar,
    phase: AtomicUsize,
    cancel: Arc<AtomicBool>,
}

impl KdamProgress {
    pub fn new(cancel: Arc<AtomicBool>) -> Self {
        Self {
            bar: create_progress_bar(ProgressBarConfig::new(0, "Loading", Animation::Classic)),
            phase: AtomicUsize::new(0),
            cancel,
        }
    }

    pub fn phase(&self) -> usize {
        self.phase.load(Ordering::Relaxed)
    }
}

impl ProgressSink for KdamProgress {
    fn set_max_progress(&self, max: usize) {
        let mut bar = self.bar.lock().unwrap_or_else(PoisonError::into_inner);
        bar.reset(Some(max));
    }

    fn set_message(&self, message: &str) {
        let mut bar = self.bar.lock().unwrap_or_else(PoisonError::into_inner);
        bar.set_description(message);
        let _ = bar.refresh();
    }

    fn advance_phase(&self) {
        let phase = self.phase.fetch_add(1, Ordering::Relaxed) + 1;
        log::debug!("progress phase {}", phase);
        let mut bar = self.bar.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = bar.refresh();
    }

    fn tick(&self) {
        update_progress_bar(&self.bar, 1);
    }

    fn keep_going(&self) -> bool {
        !self.cancel.load(Ordering::Relaxed)
    }
}
