//! Closed-loop control.

pub mod pid;
