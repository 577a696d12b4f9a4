//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them.

use serde::Serialize;

use crate::error::SensorError;
use crate::fsm::{DurationSelection, ModeId, OperatingMode};

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The application service has started (carries initial mode).
    Started(OperatingMode),

    /// The mode machine transitioned.
    ModeChanged {
        from: OperatingMode,
        to: OperatingMode,
    },

    /// The temperature sensor could not be read.
    SensorFault(SensorError),

    /// Periodic telemetry snapshot.
    Telemetry(TelemetryData),
}

/// A point-in-time telemetry snapshot suitable for logging or transmission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetryData {
    pub mode: ModeId,
    pub selection: DurationSelection,
    pub uptime_secs: u32,
    /// Last good reading; `None` until the first read or after a failure.
    pub temperature_c: Option<f32>,
    pub heater_duty: u8,
    /// Elapsed share of the work window; `None` outside `Working`.
    pub progress_percent: Option<u8>,
    pub fault_latched: bool,
}
