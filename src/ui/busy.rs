//! Reference-counted busy indicator.
//!
//! Each operation holds a [`BusyGuard`] while it runs. The indicator shows
//! while at least one guard is alive, so overlapping operations can't hide
//! each other's loading state.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Clone, Default)]
pub struct BusyIndicator {
    pending: Arc<AtomicUsize>,
}

impl BusyIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark one operation as in flight until the guard drops.
    pub fn begin(&self) -> BusyGuard {
        self.pending.fetch_add(1, Ordering::SeqCst);
        BusyGuard {
            pending: Arc::clone(&self.pending),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.pending() > 0
    }

    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
#[must_use = "the indicator clears as soon as the guard is dropped"]
pub struct BusyGuard {
    pending: Arc<AtomicUsize>,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.pending.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlapping_operations_keep_indicator_on() {
        let busy = BusyIndicator::new();
        assert!(!busy.is_busy());

        let first = busy.begin();
        let second = busy.begin();
        drop(first);
        assert!(busy.is_busy(), "second operation is still running");

        drop(second);
        assert!(!busy.is_busy());
    }

    #[test]
    fn clones_share_the_count() {
        let busy = BusyIndicator::new();
        let worker_view = busy.clone();
        let _guard = busy.begin();
        assert_eq!(worker_view.pending(), 1);
    }

    #[test]
    fn guard_released_on_panic_unwind() {
        let busy = BusyIndicator::new();
        let inner = busy.clone();
        let result = std::panic::catch_unwind(move || {
            let _guard = inner.begin();
            panic!("handler failed");
        });
        assert!(result.is_err());
        assert!(!busy.is_busy());
    }
}
