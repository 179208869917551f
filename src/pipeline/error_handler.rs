use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::thread::JoinHandle;

use crate::error::{LoadError, LoadResult};

use super::collector::ErrorCollector;

/// Run one table call, turning a panic into [`LoadError::Unexpected`] so the worker loop keeps
/// going and the finished count still advances.
pub fn catch_errors<R>(f: impl FnOnce() -> LoadResult<R>) -> LoadResult<R> {
    catch_unwind(AssertUnwindSafe(f))
        .unwrap_or_else(|payload| Err(LoadError::Unexpected(panic_message(payload.as_ref()))))
}

pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}

/// Join every worker. A worker that died anyway is recorded, not propagated.
pub fn join_workers(handles: Vec<JoinHandle<()>>, errors: &ErrorCollector, phase: &str) {
    for h in handles {
        if let Err(payload) = h.join() {
            errors.push_unexpected(
                None,
                format!("{} worker panicked: {}", phase, panic_message(payload.as_ref())),
            );
        }
    }
}
