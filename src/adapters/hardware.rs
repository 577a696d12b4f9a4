//! Hardware adapter — bridges real peripherals to domain port traits.
//!
//! Owns the button, the temperature sensor, and every actuator driver,
//! exposing them through [`InputPort`], [`SensorPort`] and
//! [`ActuatorPort`].  This is the only module in the system that touches
//! actual hardware.
//!
//! Driver write failures are logged here.  Heater and lamp failures are
//! also handed back to the service, which retries them; strip failures
//! are dropped.

use embedded_hal::digital::OutputPin;
use embedded_hal::pwm::SetDutyCycle;
use log::warn;

use crate::app::ports::{ActuatorPort, InputPort, SensorPort};
use crate::drivers::heater::HeaterDriver;
use crate::drivers::indicators::IndicatorBank;
use crate::drivers::led_effects::{Rgb, COLOUR_OFF};
use crate::error::{ActuatorError, SensorError};
use crate::events::Gesture;
use crate::progress::ProgressLevels;

/// Pixels on the addressable strip.
pub const STRIP_LEN: usize = 3;

/// Addressable LED strip that latches a whole frame at once.
pub trait LedStrip {
    fn write(&mut self, frame: &[Rgb; STRIP_LEN]) -> Result<(), ActuatorError>;
}

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter<I, T, P, D, L, S>
where
    P: SetDutyCycle,
    D: OutputPin,
{
    input: I,
    sensor: T,
    heater: HeaterDriver<P, D>,
    indicators: IndicatorBank<L>,
    strip: S,
    /// Staged frame, flushed by `show_pixels`.
    pixels: [Rgb; STRIP_LEN],
}

impl<I, T, P, D, L, S> HardwareAdapter<I, T, P, D, L, S>
where
    P: SetDutyCycle,
    D: OutputPin,
{
    pub fn new(
        input: I,
        sensor: T,
        heater: HeaterDriver<P, D>,
        indicators: IndicatorBank<L>,
        strip: S,
    ) -> Self {
        Self {
            input,
            sensor,
            heater,
            indicators,
            strip,
            pixels: [COLOUR_OFF; STRIP_LEN],
        }
    }

    pub fn heater(&self) -> &HeaterDriver<P, D> {
        &self.heater
    }

    /// Frame staged for the next `show_pixels`.
    pub fn pixels(&self) -> &[Rgb; STRIP_LEN] {
        &self.pixels
    }
}

// ── InputPort implementation ──────────────────────────────────

impl<I, T, P, D, L, S> InputPort for HardwareAdapter<I, T, P, D, L, S>
where
    I: InputPort,
    P: SetDutyCycle,
    D: OutputPin,
{
    fn poll_gestures(&mut self, now_ms: u32, on_gesture: &mut dyn FnMut(Gesture)) {
        self.input.poll_gestures(now_ms, on_gesture);
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl<I, T, P, D, L, S> SensorPort for HardwareAdapter<I, T, P, D, L, S>
where
    T: SensorPort,
    P: SetDutyCycle,
    D: OutputPin,
{
    fn set_resolution(&mut self, bits: u8) -> Result<(), SensorError> {
        self.sensor.set_resolution(bits)
    }

    fn read_temperature(&mut self) -> Result<f32, SensorError> {
        self.sensor.read_temperature()
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl<I, T, P, D, L, S> ActuatorPort for HardwareAdapter<I, T, P, D, L, S>
where
    P: SetDutyCycle,
    D: OutputPin,
    L: OutputPin,
    S: LedStrip,
{
    fn set_heater_duty(&mut self, duty: u8) -> Result<(), ActuatorError> {
        self.heater.set_duty(duty).inspect_err(|e| {
            warn!("Heater write failed (duty {}): {}", duty, e);
        })
    }

    fn set_indicators(&mut self, levels: ProgressLevels) -> Result<(), ActuatorError> {
        self.indicators.apply(levels).inspect_err(|e| {
            warn!("Indicator write failed: {}", e);
        })
    }

    fn set_pixel(&mut self, index: usize, colour: Rgb) {
        match self.pixels.get_mut(index) {
            Some(pixel) => *pixel = colour,
            None => warn!("Pixel {} outside strip of {}", index, STRIP_LEN),
        }
    }

    fn show_pixels(&mut self) {
        if let Err(e) = self.strip.write(&self.pixels) {
            warn!("LED strip write failed: {}", e);
        }
    }
}
