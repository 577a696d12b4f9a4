//! Progress indicator: elapsed fraction of the work window mapped onto
//! three binary lamps.
//!
//! | Lamp | On when elapsed ≥ |
//! |------|-------------------|
//! | 1    | 0 %               |
//! | 2    | 33 %              |
//! | 3    | 66 %              |
//!
//! State is recomputed from scratch on every refresh; there is no
//! hysteresis.

use serde::Serialize;

const SECOND_LAMP_PERCENT: u8 = 33;
const THIRD_LAMP_PERCENT: u8 = 66;

/// Desired state of the three indicator outputs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProgressLevels {
    pub first: bool,
    pub second: bool,
    pub third: bool,
}

impl ProgressLevels {
    /// All lamps dark.
    pub const OFF: Self = Self {
        first: false,
        second: false,
        third: false,
    };

    /// Lamp states for an elapsed percentage.
    pub fn for_percent(percent: u8) -> Self {
        Self {
            first: true,
            second: percent >= SECOND_LAMP_PERCENT,
            third: percent >= THIRD_LAMP_PERCENT,
        }
    }

    /// Lamp states for `elapsed_s` of a `total_s` window.
    pub fn for_elapsed(elapsed_s: u32, total_s: u32) -> Self {
        Self::for_percent(percent_elapsed(elapsed_s, total_s))
    }

    pub fn as_array(&self) -> [bool; 3] {
        [self.first, self.second, self.third]
    }

    /// Number of lit lamps.
    pub fn lit(&self) -> usize {
        self.as_array().iter().filter(|on| **on).count()
    }
}

/// `elapsed * 100 / total`, integer division, clamped to 100.
///
/// A zero `total` counts as complete.
pub fn percent_elapsed(elapsed_s: u32, total_s: u32) -> u8 {
    if total_s == 0 {
        return 100;
    }
    let percent = (u64::from(elapsed_s) * 100) / u64::from(total_s);
    percent.min(100) as u8
}
