//! Ingestion progress reporting
//!
//! Per-list fetches run concurrently but all report into one
//! [`ProgressCounter`]. The count and the observer callback sit behind a
//! single lock: an atomic counter alone would allow two increments to
//! invoke the observer in inverted order, breaking the monotonicity
//! guarantee the callback carries.

use std::sync::{Arc, Mutex};

/// Observer invoked with the cumulative accepted-task count each time it grows
///
/// Observers run under the counter's internal lock and must not call back
/// into the [`ProgressCounter`] that invoked them (`std::sync::Mutex` is
/// not reentrant; doing so deadlocks). The new total is passed as the
/// argument precisely so observers never need to query the counter.
pub type ProgressFn = Arc<dyn Fn(u64) + Send + Sync>;

/// Running total of tasks accepted across all lists during one ingestion run
///
/// Cheap to clone; all clones share the same count. The total is
/// monotonically non-decreasing for the duration of a run and starts at
/// zero. Observers see every increment exactly once, in non-decreasing
/// order.
#[derive(Clone)]
pub struct ProgressCounter {
    inner: Arc<Inner>,
}

struct Inner {
    count: Mutex<u64>,
    observer: Option<ProgressFn>,
}

impl ProgressCounter {
    /// Create a counter at zero, with an optional observer
    pub fn new(observer: Option<ProgressFn>) -> Self {
        Self {
            inner: Arc::new(Inner {
                count: Mutex::new(0),
                observer,
            }),
        }
    }

    /// Record `n` newly accepted tasks and notify the observer with the new
    /// cumulative total. Recording zero is a no-op and does not notify.
    ///
    /// The observer runs while the internal lock is held (see
    /// [`ProgressFn`]): it must be fast, non-blocking, and must not
    /// re-enter this counter, e.g. via [`ProgressCounter::total`].
    pub fn record(&self, n: usize) {
        if n == 0 {
            return;
        }
        // The lock is held across the observer call so observed totals are
        // strictly ordered; the re-entrancy ban above is the price.
        let mut count = match self.inner.count.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *count += n as u64;
        if let Some(observer) = &self.inner.observer {
            observer(*count);
        }
    }

    /// Current cumulative total
    pub fn total(&self) -> u64 {
        match self.inner.count.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}
