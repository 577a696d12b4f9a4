//! Event vocabulary and the pass-local event queue.
//!
//! Events are produced by:
//! - the button debouncer (short / long press gestures)
//! - the scheduler's time checks (configuration timeout, work time elapsed)
//! - the sensor task (unreadable temperature sensor)
//!
//! Everything that changes the operating mode enters through
//! [`ModeMachine::handle_event`](crate::fsm::ModeMachine::handle_event).
//!
//! ```text
//! ┌──────────────┐  callback  ┌──────────────┐     ┌──────────────┐
//! │ Debouncer    │───────────▶│  EventQueue  │────▶│ ModeMachine  │
//! └──────────────┘            │  (FIFO)      │     └──────────────┘
//!                             └──────────────┘            ▲
//! Scheduler time checks / sensor task ────────────────────┘
//! ```

use heapless::Deque;
use log::warn;

/// Capacity of the gesture queue.  A human cannot produce more than a
/// couple of gestures between two loop passes.
pub const EVENT_QUEUE_CAP: usize = 8;

/// The only vocabulary the state machine accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Debounced short press.
    ShortPress,
    /// Debounced long press (hold).
    LongPress,
    /// Inactivity deadline passed while configuring the duration.
    ConfigTimeout,
    /// The work window has run out.
    WorkTimeElapsed,
    /// The temperature sensor could not be read.
    SensorFault,
}

/// Button gestures delivered by the debouncer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    ShortPress,
    LongPress,
}

impl From<Gesture> for Event {
    fn from(g: Gesture) -> Self {
        match g {
            Gesture::ShortPress => Self::ShortPress,
            Gesture::LongPress => Self::LongPress,
        }
    }
}

/// Fixed-capacity FIFO of pending events, owned by the service.
pub struct EventQueue {
    pending: Deque<Event, EVENT_QUEUE_CAP>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self {
            pending: Deque::new(),
        }
    }

    /// Push an event.  Returns `false` if the queue is full (event dropped).
    pub fn push(&mut self, event: Event) -> bool {
        if self.pending.push_back(event).is_err() {
            warn!("Event queue full, dropping {:?}", event);
            return false;
        }
        true
    }

    /// Pop the oldest event.
    pub fn pop(&mut self) -> Option<Event> {
        self.pending.pop_front()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}
