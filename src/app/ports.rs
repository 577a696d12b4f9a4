//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (button, sensor, heater, lamps, pixel strip, event
//! sinks) implement these traits.  The [`AppService`](super::service::AppService)
//! consumes them via generics, so the domain core never touches hardware
//! directly.
//!
//! All port errors are typed; callers must handle every variant explicitly.

use core::ops::Range;

use crate::drivers::led_effects::Rgb;
use crate::error::{ActuatorError, SensorError};
use crate::events::Gesture;
use crate::progress::ProgressLevels;
use crate::scheduler::{NextDue, TaskId};

// ───────────────────────────────────────────────────────────────
// Input port (driving adapter: button → domain)
// ───────────────────────────────────────────────────────────────

/// Polled button input.
///
/// The debouncer delivers each recognised gesture to `on_gesture`
/// during the poll.  The callback lives only for the duration of the
/// call, so the adapter never holds a reference into the domain.
pub trait InputPort {
    fn poll_gestures(&mut self, now_ms: u32, on_gesture: &mut dyn FnMut(Gesture));
}

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the domain calls this to obtain the temperature.
pub trait SensorPort {
    /// Configure the conversion resolution (9–12 bits).
    fn set_resolution(&mut self, bits: u8) -> Result<(), SensorError>;

    /// Read the current temperature in degrees Celsius.
    fn read_temperature(&mut self) -> Result<f32, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the domain calls this to command actuators.
///
/// Heater and lamp writes report failure so the service can retry them on
/// the next pass.  Pixel writes are fire-and-forget; adapters log their
/// own failures.
pub trait ActuatorPort {
    /// Set heater duty (0–255).
    fn set_heater_duty(&mut self, duty: u8) -> Result<(), ActuatorError>;

    /// Drive the three progress lamps.
    fn set_indicators(&mut self, levels: ProgressLevels) -> Result<(), ActuatorError>;

    /// Stage a colour for one pixel of the strip.
    fn set_pixel(&mut self, index: usize, colour: Rgb);

    /// Latch the staged pixel colours onto the strip.
    fn show_pixels(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Regulator and randomness (pure collaborators)
// ───────────────────────────────────────────────────────────────

/// Closed-loop temperature regulator.
///
/// The sensor task feeds the measured value; the output is sampled when
/// the heater is driven.  Output is on the heater's 0–255 duty scale.
pub trait Regulator {
    fn set_input(&mut self, measured: f32);
    fn output(&mut self) -> f32;
    /// Forget integral and derivative history.
    fn reset(&mut self);
}

/// Uniform random integers for the flame effect.
pub trait RandomSource {
    /// A value in the half-open `range`.
    fn next_in(&mut self, range: Range<u32>) -> u32;
}

// ───────────────────────────────────────────────────────────────
// Clock
// ───────────────────────────────────────────────────────────────

/// Monotonic millisecond clock.  Wraps at `u32::MAX`.
pub trait MonotonicClock {
    fn now_ms(&self) -> u32;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Scheduler delegate (decouples scheduler from the tasks it runs)
// ───────────────────────────────────────────────────────────────

/// Callback trait that the scheduler invokes when a task is due.
///
/// This decouples the [`Scheduler`](crate::scheduler::Scheduler) from the
/// sensor, the mode machine, and the LEDs: the scheduler only tracks
/// periods and last-fired marks.
pub trait TaskDelegate {
    /// Whether `task` takes part in this pass.  A disabled task keeps its
    /// last-fired mark untouched.
    fn is_enabled(&self, task: TaskId) -> bool {
        let _ = task;
        true
    }

    /// Run `task` and report when it wants to run next.
    fn run_task(&mut self, task: TaskId, now_ms: u32) -> NextDue;
}
