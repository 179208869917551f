//! Multi-producer / multi-consumer blocking queue over an unbounded crossbeam channel.

use crossbeam_channel::{Receiver, Sender, unbounded};
use std::sync::{Mutex, PoisonError};

/// Work-distribution queue. Each item is delivered to exactly one consumer.
///
/// `pop` blocks until an item arrives or the queue is closed and drained. Closing drops the
/// queue's only sender, so waiting consumers wake up and see the channel disconnect.
pub struct SyncQueue<T> {
    tx: Mutex<Option<Sender<T>>>,
    rx: Receiver<T>,
}

impl<T> SyncQueue<T> {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self {
            tx: Mutex::new(Some(tx)),
            rx,
        }
    }

    /// Append and wake one waiting consumer. Returns the item back if the queue is closed.
    pub fn push(&self, item: T) -> Result<(), T> {
        let guard = self.tx.lock().unwrap_or_else(PoisonError::into_inner);
        match guard.as_ref() {
            Some(tx) => tx.send(item).map_err(|e| e.into_inner()),
            None => Err(item),
        }
    }

    /// Block until an item is available. None once the queue is closed and empty.
    pub fn pop(&self) -> Option<T> {
        self.rx.recv().ok()
    }

    /// Non-blocking pop.
    pub fn try_pop(&self) -> Option<T> {
        self.rx.try_recv().ok()
    }

    /// No more pushes. Pending items stay poppable.
    pub fn close(&self) {
        self.tx.lock().unwrap_or_else(PoisonError::into_inner).take();
    }

    pub fn is_closed(&self) -> bool {
        self.tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    /// Snapshot of pending items; not a synchronization point.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Discard everything pending. `&mut` so no producer or consumer can be active.
    pub fn clear(&mut self) {
        while self.rx.try_recv().is_ok() {}
    }

    /// Close and take whatever is left, in arrival order.
    pub fn drain(&self) -> Vec<T> {
        self.close();
        self.rx.try_iter().collect()
    }
}

impl<T> Default for SyncQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<T> for SyncQueue<T> {
    /// Seeded and already closed: consumers stop once the items run out.
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let queue = SyncQueue::new();
        for item in iter {
            let _ = queue.push(item);
        }
        queue.close();
        queue
    }
}
