//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements      | Connects to                      |
//! |------------|-----------------|----------------------------------|
//! | `hardware` | InputPort       | Debounced button                 |
//! |            | SensorPort      | Temperature sensor               |
//! |            | ActuatorPort    | Heater, lamps, addressable strip |
//! | `log_sink` | EventSink       | `log` facade                     |
//! | `rng`      | RandomSource    | `oorandom` PCG                   |
//! | `time`     | MonotonicClock  | `std::time::Instant`             |

pub mod hardware;
pub mod log_sink;
pub mod rng;
pub mod time;
