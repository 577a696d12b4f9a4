//! PID controller for heater temperature
//!
//! Simple proportional-integral-derivative controller
//! for holding the chamber at the target temperature.
//! Output is on the heater's 0–255 duty scale.

use crate::app::ports::Regulator;
use crate::config::SystemConfig;

/// PID controller
pub struct PidController {
    kp: f32,
    ki: f32,
    kd: f32,
    setpoint: f32,
    integral: f32,
    prev_error: f32,
    output_min: f32,
    output_max: f32,
    /// Sample period used by the [`Regulator`] interface.
    dt: f32,
    /// Output of the most recent sample.
    last_output: f32,
}

impl PidController {
    pub fn new(kp: f32, ki: f32, kd: f32, setpoint: f32) -> Self {
        Self {
            kp,
            ki,
            kd,
            setpoint,
            integral: 0.0,
            prev_error: 0.0,
            output_min: 0.0,
            output_max: 255.0,
            dt: 0.1,
            last_output: 0.0,
        }
    }

    /// Gains, setpoint, limits, and sample period from configuration.
    pub fn from_config(config: &SystemConfig) -> Self {
        let mut pid = Self::new(
            config.pid_kp,
            config.pid_ki,
            config.pid_kd,
            config.target_temperature_c,
        );
        pid.set_limits(0.0, f32::from(config.heater_duty_max));
        pid.dt = config.regulator_dt_secs();
        pid
    }

    /// Set output limits
    pub fn set_limits(&mut self, min: f32, max: f32) {
        self.output_min = min;
        self.output_max = max;
    }

    pub fn target(&self) -> f32 {
        self.setpoint
    }

    /// Compute PID output given current measurement
    pub fn compute(&mut self, measurement: f32, dt: f32) -> f32 {
        let error = self.setpoint - measurement;

        let p = self.kp * error;

        self.integral += error * dt;
        let i = self.ki * self.integral;

        let derivative = if dt > 0.0 {
            (error - self.prev_error) / dt
        } else {
            0.0
        };
        let d = self.kd * derivative;

        self.prev_error = error;

        let output = (p + i + d).clamp(self.output_min, self.output_max);

        // Anti-windup: if output is saturated, stop integrating
        if output >= self.output_max || output <= self.output_min {
            self.integral -= error * dt;
        }

        output
    }

    /// Reset controller state
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.prev_error = 0.0;
        self.last_output = 0.0;
    }
}

impl Regulator for PidController {
    /// One sample: the sensor task calls this once per read.
    fn set_input(&mut self, measured: f32) {
        self.last_output = self.compute(measured, self.dt);
    }

    fn output(&mut self) -> f32 {
        self.last_output
    }

    fn reset(&mut self) {
        PidController::reset(self);
    }
}
