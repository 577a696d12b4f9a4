//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events
//! through the `log` facade (UART on the device, `env_logger` on the host).
//! A telemetry uplink would implement the same trait.

use log::{error, info};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] as one line.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Telemetry(t) => {
                let temperature = t
                    .temperature_c
                    .map_or_else(|| "--".to_string(), |c| format!("{:.1}\u{00b0}C", c));
                let progress = t
                    .progress_percent
                    .map_or_else(|| "--".to_string(), |p| format!("{}%", p));
                info!(
                    "TELEM | mode={:?} sel={:?} | up={}s | T={} | heater={} | progress={} | latched={}",
                    t.mode,
                    t.selection,
                    t.uptime_secs,
                    temperature,
                    t.heater_duty,
                    progress,
                    t.fault_latched,
                );
            }
            AppEvent::ModeChanged { from, to } => {
                info!("STATE | {} -> {}", from, to);
            }
            AppEvent::SensorFault(e) => {
                error!("FAULT | sensor: {}", e);
            }
            AppEvent::Started(mode) => {
                info!("START | initial_mode={}", mode);
            }
        }
    }
}
