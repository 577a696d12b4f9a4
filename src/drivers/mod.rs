//! Actuator drivers, input debouncing, and the visual effect engine.

pub mod button;
pub mod heater;
pub mod indicators;
pub mod led_effects;
