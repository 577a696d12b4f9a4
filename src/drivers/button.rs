//! Polled, debounced button driver with short and long press detection.
//!
//! ## Hardware
//!
//! Active-low momentary switch with pull-up.  The pin is sampled from
//! the main loop on every pass; there is no interrupt.
//!
//! ## Gesture detection
//!
//! | Gesture     | Condition                                  | Gesture emitted        |
//! |-------------|--------------------------------------------|------------------------|
//! | Short press | Stable for `debounce_ms`, released before `hold_ms` | `Gesture::ShortPress` |
//! | Long press  | Held for `hold_ms`                         | `Gesture::LongPress`   |
//!
//! A long press fires while the button is still down; the release that
//! follows is swallowed.

use embedded_hal::digital::InputPin;
use log::warn;

use crate::app::ports::InputPort;
use crate::config::SystemConfig;
use crate::events::Gesture;

/// Internal state machine for gesture detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GestureState {
    Idle,
    DebounceWait { since_ms: u32 },
    Pressed { since_ms: u32 },
    /// Long press already reported; waiting for release.
    Held,
}

pub struct ButtonDriver<P> {
    pin: P,
    state: GestureState,
    debounce_ms: u32,
    hold_ms: u32,
}

impl<P: InputPin> ButtonDriver<P> {
    pub fn new(pin: P, config: &SystemConfig) -> Self {
        Self {
            pin,
            state: GestureState::Idle,
            debounce_ms: config.debounce_ms,
            hold_ms: config.hold_ms,
        }
    }

    /// Sample the pin and advance the gesture state machine.
    /// `now_ms` is the current monotonic time in milliseconds.
    pub fn tick(&mut self, now_ms: u32) -> Option<Gesture> {
        let pressed = self.is_pressed();

        match self.state {
            GestureState::Idle => {
                if pressed {
                    self.state = GestureState::DebounceWait { since_ms: now_ms };
                }
                None
            }

            GestureState::DebounceWait { since_ms } => {
                if !pressed {
                    // Bounce.
                    self.state = GestureState::Idle;
                } else if now_ms.wrapping_sub(since_ms) >= self.debounce_ms {
                    self.state = GestureState::Pressed { since_ms };
                }
                None
            }

            GestureState::Pressed { since_ms } => {
                if !pressed {
                    self.state = GestureState::Idle;
                    return Some(Gesture::ShortPress);
                }
                if now_ms.wrapping_sub(since_ms) >= self.hold_ms {
                    self.state = GestureState::Held;
                    return Some(Gesture::LongPress);
                }
                None
            }

            GestureState::Held => {
                if !pressed {
                    self.state = GestureState::Idle;
                }
                None
            }
        }
    }

    /// Active low.  A failed read counts as released.
    fn is_pressed(&mut self) -> bool {
        match self.pin.is_low() {
            Ok(low) => low,
            Err(e) => {
                warn!("Button read failed: {:?}", e);
                false
            }
        }
    }
}

impl<P: InputPin> InputPort for ButtonDriver<P> {
    fn poll_gestures(&mut self, now_ms: u32, on_gesture: &mut dyn FnMut(Gesture)) {
        if let Some(gesture) = self.tick(now_ms) {
            on_gesture(gesture);
        }
    }
}
