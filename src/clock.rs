//! Second-resolution time base.
//!
//! The seconds counter is not derived from wall-clock time.  It advances
//! only when the scheduler's seconds task calls [`SecondsCounter::advance`],
//! so every second-resolution deadline (inactivity timeout, work window)
//! moves in lock-step with the control loop.

/// Explicitly advanced seconds counter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SecondsCounter {
    seconds: u32,
}

impl SecondsCounter {
    pub const fn new() -> Self {
        Self { seconds: 0 }
    }

    /// Current value.
    pub fn now(&self) -> u32 {
        self.seconds
    }

    /// Advance one second.  Saturates instead of wrapping so deadlines
    /// never move backwards.
    pub fn advance(&mut self) -> u32 {
        self.seconds = self.seconds.saturating_add(1);
        self.seconds
    }
}
