//! System configuration parameters
//!
//! All tunable parameters for the Heatkeeper appliance.  The configuration
//! is fixed once the service is constructed; nothing here changes at
//! runtime.  The work-duration policy (2 h / 4 h / 6 h) is deliberately
//! not a field: it lives on [`DurationSelection`](crate::fsm::DurationSelection).

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Regulation ---
    /// Regulator setpoint (Celsius)
    pub target_temperature_c: f32,
    /// Proportional gain
    pub pid_kp: f32,
    /// Integral gain
    pub pid_ki: f32,
    /// Derivative gain
    pub pid_kd: f32,
    /// Upper bound of the heater duty cycle (0-255 scale)
    pub heater_duty_max: u8,
    /// Temperature sensor resolution in bits (9-12)
    pub sensor_resolution_bits: u8,

    // --- Timing ---
    /// Sensor read and regulate interval (milliseconds)
    pub sensor_read_interval_ms: u32,
    /// Seconds counter increment interval (milliseconds)
    pub second_interval_ms: u32,
    /// Progress indicator refresh interval (milliseconds)
    pub progress_refresh_interval_ms: u32,
    /// Inactivity timeout re-armed by every gesture (seconds)
    pub config_timeout_secs: u32,
    /// Telemetry report interval (seconds, 0 = disabled)
    pub telemetry_interval_secs: u32,

    // --- Input ---
    /// Minimum stable press before a gesture is considered (milliseconds)
    pub debounce_ms: u32,
    /// Hold time that turns a press into a long press (milliseconds)
    pub hold_ms: u32,

    // --- Feedback ---
    /// Index of the strip pixel that carries the visual feedback
    pub status_pixel_index: usize,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Regulation
            target_temperature_c: 50.0,
            pid_kp: 0.1,
            pid_ki: 0.05,
            pid_kd: 0.0,
            heater_duty_max: 255,
            sensor_resolution_bits: 12,

            // Timing
            sensor_read_interval_ms: 100,     // 10 Hz
            second_interval_ms: 1000,         // 1 Hz
            progress_refresh_interval_ms: 5000,
            config_timeout_secs: 5,
            telemetry_interval_secs: 60,

            // Input
            debounce_ms: 50,
            hold_ms: 600,

            // Feedback
            status_pixel_index: 1,
        }
    }
}

impl SystemConfig {
    /// Range-check every field.  Invalid values are rejected, never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.target_temperature_c.is_finite() {
            return Err(ConfigError::Invalid("target_temperature_c"));
        }
        if ![self.pid_kp, self.pid_ki, self.pid_kd]
            .iter()
            .all(|g| g.is_finite() && *g >= 0.0)
        {
            return Err(ConfigError::Invalid("pid gains"));
        }
        if self.heater_duty_max == 0 {
            return Err(ConfigError::Invalid("heater_duty_max"));
        }
        if !(9..=12).contains(&self.sensor_resolution_bits) {
            return Err(ConfigError::Invalid("sensor_resolution_bits"));
        }
        if self.sensor_read_interval_ms == 0 {
            return Err(ConfigError::Invalid("sensor_read_interval_ms"));
        }
        if self.second_interval_ms == 0 {
            return Err(ConfigError::Invalid("second_interval_ms"));
        }
        if self.progress_refresh_interval_ms == 0 {
            return Err(ConfigError::Invalid("progress_refresh_interval_ms"));
        }
        if self.config_timeout_secs == 0 {
            return Err(ConfigError::Invalid("config_timeout_secs"));
        }
        if self.hold_ms <= self.debounce_ms {
            return Err(ConfigError::Invalid("hold_ms"));
        }
        Ok(())
    }

    /// Regulator sample period in seconds (one sensor interval).
    pub fn regulator_dt_secs(&self) -> f32 {
        self.sensor_read_interval_ms as f32 / 1000.0
    }
}
