//! Deadlines and the stall watchdog.
//!
//! Every blocking wait in the referee (screen polls, keyboard acknowledgments,
//! engine searches) takes a [`Deadline`] and checks it cooperatively. Expiry
//! surfaces as [`BridgeError::StallTimeout`] at the point of the wait, so the
//! teardown of both subprocesses happens in exactly one place: the match driver.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::error::{BridgeError, Result};

/// Longest single sleep while waiting, so cancellation is noticed promptly.
pub const MAX_SLICE: Duration = Duration::from_millis(100);

/// Upper bound for one blocking wait.
///
/// Cheap to clone; clones share the cancellation flag, so a deadline handed to
/// a reader can be tripped from the owner.
#[derive(Debug, Clone)]
pub struct Deadline {
    /// Label used in the stall error ("opponent move", "engine search", ...)
    what: &'static str,
    started: Instant,
    /// None = unbounded, only cancellation ends the wait
    budget: Option<Duration>,
    cancelled: Arc<AtomicBool>,
}

impl Deadline {
    /// A deadline that expires `budget` from now.
    pub fn after(what: &'static str, budget: Duration) -> Self {
        Self {
            what,
            started: Instant::now(),
            budget: Some(budget),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// A deadline that only expires when cancelled.
    pub fn unbounded(what: &'static str) -> Self {
        Self {
            what,
            started: Instant::now(),
            budget: None,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn what(&self) -> &'static str {
        self.what
    }

    pub fn budget(&self) -> Option<Duration> {
        self.budget
    }

    /// Force the deadline to expire immediately.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Remaining time (None if unbounded). Zero once expired.
    pub fn remaining(&self) -> Option<Duration> {
        if self.cancelled.load(Ordering::Relaxed) {
            return Some(Duration::ZERO);
        }
        let budget = self.budget?;
        Some(budget.saturating_sub(self.elapsed()))
    }

    pub fn is_expired(&self) -> bool {
        self.remaining() == Some(Duration::ZERO)
    }

    /// The error this deadline reports when it fires.
    pub fn stall_error(&self) -> BridgeError {
        BridgeError::StallTimeout {
            what: self.what,
            budget: self.budget.unwrap_or_else(|| self.elapsed()),
        }
    }

    /// Fail with [`BridgeError::StallTimeout`] if the deadline has passed.
    pub fn check(&self) -> Result<()> {
        if self.is_expired() {
            Err(self.stall_error())
        } else {
            Ok(())
        }
    }

    /// Length of the next wait slice: at most `interval`, at most
    /// [`MAX_SLICE`], never past the deadline.
    pub fn slice(&self, interval: Duration) -> Duration {
        let slice = interval.min(MAX_SLICE);
        match self.remaining() {
            Some(remaining) => slice.min(remaining),
            None => slice,
        }
    }

    /// Sleep for `interval` (cut short at the deadline), then check it.
    pub fn sleep(&self, interval: Duration) -> Result<()> {
        self.check()?;
        let wake_at = Instant::now() + interval;
        loop {
            let now = Instant::now();
            if now >= wake_at {
                break;
            }
            thread::sleep(self.slice(wake_at - now));
            self.check()?;
        }
        Ok(())
    }
}

/// Arms one [`Deadline`] per blocking wait with a fixed budget.
///
/// The budget is the configured search time scaled by a safety factor; a
/// peer that misses it is considered deadlocked and the match is aborted.
#[derive(Debug, Clone)]
pub struct Watchdog {
    budget: Duration,
}

impl Watchdog {
    pub fn new(budget: Duration) -> Self {
        Self { budget }
    }

    /// Budget of `search_time * factor`.
    pub fn for_search_time(search_time: Duration, factor: f64) -> Self {
        Self::new(search_time.mul_f64(factor.max(1.0)))
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// Arm the watchdog for one wait. Dropping the deadline disarms it.
    pub fn arm(&self, what: &'static str) -> Deadline {
        tracing::trace!(what, budget_ms = self.budget.as_millis() as u64, "watchdog armed");
        Deadline::after(what, self.budget)
    }
}

#[cfg(test)]
#[path = "deadline_tests.rs"]
mod deadline_tests;
