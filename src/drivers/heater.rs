//! Heater driver.
//!
//! Two wirings are supported:
//!
//! - **PWM**: a MOSFET gate on a PWM channel; the 0–255 duty maps onto
//!   the channel's full range.
//! - **Digital**: a relay or SSR on a plain output; any non-zero duty
//!   switches it on.
//!
//! ## Safety contract
//!
//! The heater is forced off when the driver is dropped.  Mode-based
//! shutdown is the service's job; this driver is a dumb actuator.

use embedded_hal::digital::OutputPin;
use embedded_hal::pwm::SetDutyCycle;
use log::warn;

use crate::error::ActuatorError;

const DUTY_FULL_SCALE: u16 = 255;

/// Output stage the heater is wired to.
pub enum HeaterOutput<P, D> {
    Pwm(P),
    Digital(D),
}

pub struct HeaterDriver<P: SetDutyCycle, D: OutputPin> {
    output: HeaterOutput<P, D>,
    duty: u8,
}

impl<P: SetDutyCycle, D: OutputPin> HeaterDriver<P, D> {
    pub fn pwm(channel: P) -> Self {
        Self {
            output: HeaterOutput::Pwm(channel),
            duty: 0,
        }
    }

    pub fn digital(pin: D) -> Self {
        Self {
            output: HeaterOutput::Digital(pin),
            duty: 0,
        }
    }

    /// Command a duty (0–255).  The stored duty only changes if the
    /// write succeeded.
    pub fn set_duty(&mut self, duty: u8) -> Result<(), ActuatorError> {
        match &mut self.output {
            HeaterOutput::Pwm(channel) => channel
                .set_duty_cycle_fraction(u16::from(duty), DUTY_FULL_SCALE)
                .map_err(|_| ActuatorError::PwmWriteFailed)?,
            HeaterOutput::Digital(pin) => {
                let result = if duty > 0 { pin.set_high() } else { pin.set_low() };
                result.map_err(|_| ActuatorError::GpioWriteFailed)?;
            }
        }
        self.duty = duty;
        Ok(())
    }

    pub fn off(&mut self) -> Result<(), ActuatorError> {
        self.set_duty(0)
    }

    pub fn current_duty(&self) -> u8 {
        self.duty
    }

    pub fn is_on(&self) -> bool {
        self.duty > 0
    }
}

impl<P: SetDutyCycle, D: OutputPin> Drop for HeaterDriver<P, D> {
    fn drop(&mut self) {
        if let Err(e) = self.off() {
            warn!("Heater shutdown on drop failed: {}", e);
        }
    }
}
