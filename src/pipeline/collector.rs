//! Thread-safe sink for per-library and per-part failures.

use log::warn;
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use crate::error::LoadError;
use crate::types::{ErrorKind, ErrorRecord};

/// Accumulates failures from any worker without stopping the pipeline.
#[derive(Default)]
pub struct ErrorCollector {
    errors: Mutex<VecDeque<ErrorRecord>>,
}

impl ErrorCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, record: ErrorRecord) {
        warn!("{}", record);
        self.errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(record);
    }

    /// Record a table failure against `origin`.
    pub fn push_load_error(&self, origin: &str, err: LoadError) {
        self.push(err.into_record(origin));
    }

    /// Record something that is not a table failure (e.g. a worker panic).
    pub fn push_unexpected(&self, origin: Option<&str>, message: impl Into<String>) {
        self.push(ErrorRecord {
            kind: ErrorKind::Unexpected,
            message: message.into(),
            origin: origin.map(str::to_string),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn len(&self) -> usize {
        self.errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Oldest error first.
    pub fn pop(&self) -> Option<ErrorRecord> {
        self.errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }

    pub fn snapshot(&self) -> Vec<ErrorRecord> {
        self.errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    /// Only from the coordinator, with no workers running.
    pub fn clear(&mut self) {
        self.errors
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
