//! Single-slot "latest result" cell shared between a worker thread and the
//! frame loop.  Writers overwrite, the reader takes; only the newest value
//! is ever seen.

use std::sync::{Arc, Mutex};

#[derive(Debug)]
pub struct LatestCell<T> {
    slot: Arc<Mutex<Option<T>>>,
}

impl<T> Clone for LatestCell<T> {
    fn clone(&self) -> Self {
        LatestCell { slot: Arc::clone(&self.slot) }
    }
}

impl<T> Default for LatestCell<T> {
    fn default() -> Self {
        LatestCell { slot: Arc::new(Mutex::new(None)) }
    }
}

impl<T> LatestCell<T> {
    pub fn new() -> Self { Self::default() }

    /// Store `value`, discarding whatever was not yet taken.
    pub fn put(&self, value: T) {
        // A poisoned slot only means a writer panicked mid-store; the
        // Option inside is still valid.
        let mut guard = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        *guard = Some(value);
    }

    /// Remove and return the pending value, if any.
    pub fn take(&self) -> Option<T> {
        let mut guard = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        guard.take()
    }

    pub fn is_empty(&self) -> bool {
        self.slot.lock().map(|g| g.is_none()).unwrap_or(true)
    }
}
