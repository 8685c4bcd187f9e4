//! # Clock: Injectable Time Source
//!
//! Lifecycle operations never read the system time directly. They ask a
//! [`Clock`], which production wires to [`SystemClock`] and tests (or the
//! CLI `--now` override) wire to a [`ManualClock`].

use std::sync::atomic::{AtomicI64, Ordering};

use crate::temporal::Timestamp;

/// A synchronous source of the current time.
///
/// Implementations must be cheap to call; the lifecycle service reads the
/// clock while holding its registry lock.
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> Timestamp;
}

/// Wall-clock UTC time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    secs: AtomicI64,
}

impl ManualClock {
    /// Create a clock pinned at `start`.
    pub fn new(start: Timestamp) -> Self {
        Self {
            secs: AtomicI64::new(start.epoch_secs()),
        }
    }

    /// Pin the clock at `at`.
    pub fn set(&self, at: Timestamp) {
        self.secs.store(at.epoch_secs(), Ordering::SeqCst);
    }

    /// Move the clock forward by `secs` (saturating).
    pub fn advance(&self, secs: i64) {
        let _ = self
            .secs
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |cur| {
                Some(cur.saturating_add(secs))
            });
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_epoch_secs(self.secs.load(Ordering::SeqCst))
    }
}
