//! Three-lamp progress indicator bank.
//!
//! Each lamp is a plain push-pull output, active high.

use embedded_hal::digital::{OutputPin, PinState};

use crate::error::ActuatorError;
use crate::progress::ProgressLevels;

pub struct IndicatorBank<P> {
    lamps: [P; 3],
    current: ProgressLevels,
}

impl<P: OutputPin> IndicatorBank<P> {
    pub fn new(first: P, second: P, third: P) -> Self {
        Self {
            lamps: [first, second, third],
            current: ProgressLevels::OFF,
        }
    }

    /// Drive every lamp.  Stops at the first failed write.
    pub fn apply(&mut self, levels: ProgressLevels) -> Result<(), ActuatorError> {
        for (lamp, on) in self.lamps.iter_mut().zip(levels.as_array()) {
            lamp.set_state(PinState::from(on))
                .map_err(|_| ActuatorError::GpioWriteFailed)?;
        }
        self.current = levels;
        Ok(())
    }

    pub fn current(&self) -> ProgressLevels {
        self.current
    }
}
