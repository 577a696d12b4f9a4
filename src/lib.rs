//! Heatkeeper control core.
//!
//! Exposes the pure-logic modules for integration testing and the host
//! simulator.  Hardware is reached only through the port traits in
//! [`app::ports`] and the `embedded-hal` traits in [`drivers`].

#![deny(unused_must_use)]

pub mod app;
pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod fsm;
pub mod progress;
pub mod scheduler;

pub mod adapters;
pub mod control;
pub mod drivers;
