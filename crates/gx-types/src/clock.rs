use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::temporal::Timestamp;

/// Source of the current time.
///
/// Components that reason about expiration take a clock as an injected
/// dependency instead of reading the wall clock directly, so tests can
/// drive time deterministically.
pub trait Clock: Send + Sync {
    /// The current time.
    fn now(&self) -> Timestamp;
}

/// Clock backed by the system wall clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// Manually driven clock for tests and simulations.
///
/// Starts at the given instant and only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    ms: AtomicU64,
}

impl ManualClock {
    /// Create a clock frozen at `start`.
    pub fn new(start: Timestamp) -> Self {
        Self {
            ms: AtomicU64::new(start.as_millis()),
        }
    }

    /// Jump to an absolute instant.
    pub fn set(&self, at: Timestamp) {
        self.ms.store(at.as_millis(), Ordering::SeqCst);
    }

    /// Move forward by `d`.
    pub fn advance(&self, d: Duration) {
        let step = u64::try_from(d.as_millis()).unwrap_or(u64::MAX);
        self.ms
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |ms| {
                Some(ms.saturating_add(step))
            })
            .ok();
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_millis(self.ms.load(Ordering::SeqCst))
    }
}
