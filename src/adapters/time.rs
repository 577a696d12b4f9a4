//! Host time adapter.
//!
//! Provides the monotonic millisecond clock the control loop runs on,
//! backed by `std::time::Instant`.  The value is truncated to `u32` and
//! wraps after ~49 days; the scheduler compares with `wrapping_sub`.

use std::time::Instant;

use crate::app::ports::MonotonicClock;

/// Milliseconds since the adapter was created.
pub struct SystemClock {
    start: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Seconds since start (monotonic).
    pub fn uptime_secs(&self) -> u64 {
        self.start.elapsed().as_secs()
    }
}

impl MonotonicClock for SystemClock {
    fn now_ms(&self) -> u32 {
        self.start.elapsed().as_millis() as u32
    }
}
