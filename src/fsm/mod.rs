//! Operating-mode state machine.
//!
//! The mode is a sum type: each variant carries only the data that is
//! valid while it is active.  `Working` owns the [`WorkWindow`]; no other
//! variant can observe a stale one.
//!
//! ```text
//!  SLEEP ──[short]──▶ CONFIGURE(Short) ─[short]─▶ (Medium) ─[short]─▶ (Long)
//!    ▲                     │    ▲                                       │
//!    │               [timeout]  └──────────────[short]──────────────────┘
//!    │◀────────────────────┘
//!    │                     │ [long, no fault latched]
//!    │                     ▼
//!    │                  WORKING ──[sensor fault]──▶ FAULTED (terminal)
//!    │                     │
//!    │          [long | work time elapsed]
//!    │                     ▼
//!    └──────(same pass)── DISABLING
//! ```
//!
//! Events with no matching row are dropped silently: "no rule" means
//! "no-op", not an error.

use core::fmt;

use log::{debug, error, info, warn};
use serde::Serialize;

use crate::events::Event;

// ---------------------------------------------------------------------------
// Duration selection
// ---------------------------------------------------------------------------

/// Run length chosen while configuring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DurationSelection {
    Short,
    Medium,
    Long,
}

impl DurationSelection {
    /// Fixed run length in whole seconds.
    pub const fn duration_secs(self) -> u32 {
        match self {
            Self::Short => 2 * 60 * 60,
            Self::Medium => 4 * 60 * 60,
            Self::Long => 6 * 60 * 60,
        }
    }

    /// Next selection in the Short → Medium → Long → Short cycle.
    pub const fn next(self) -> Self {
        match self {
            Self::Short => Self::Medium,
            Self::Medium => Self::Long,
            Self::Long => Self::Short,
        }
    }
}

// ---------------------------------------------------------------------------
// Work window
// ---------------------------------------------------------------------------

/// Second-resolution bounds of a heating session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkWindow {
    pub start_s: u32,
    pub stop_s: u32,
}

impl WorkWindow {
    pub fn starting_at(now_s: u32, selection: DurationSelection) -> Self {
        Self {
            start_s: now_s,
            stop_s: now_s.saturating_add(selection.duration_secs()),
        }
    }

    pub fn duration_secs(&self) -> u32 {
        self.stop_s - self.start_s
    }

    pub fn elapsed_secs(&self, now_s: u32) -> u32 {
        now_s.saturating_sub(self.start_s)
    }

    pub fn is_expired(&self, now_s: u32) -> bool {
        now_s >= self.stop_s
    }
}

// ---------------------------------------------------------------------------
// Operating mode
// ---------------------------------------------------------------------------

/// The device's top-level mode.  Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatingMode {
    Sleep,
    ConfigureDuration(DurationSelection),
    Working {
        selection: DurationSelection,
        window: WorkWindow,
    },
    /// Transient: shut the heater down, then drop to `Sleep` in the same pass.
    Disabling,
    /// Terminal until an external reset.
    Faulted,
}

/// Field-less discriminant of [`OperatingMode`] for telemetry and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ModeId {
    Sleep,
    ConfigureDuration,
    Working,
    Disabling,
    Faulted,
}

impl OperatingMode {
    pub fn id(&self) -> ModeId {
        match self {
            Self::Sleep => ModeId::Sleep,
            Self::ConfigureDuration(_) => ModeId::ConfigureDuration,
            Self::Working { .. } => ModeId::Working,
            Self::Disabling => ModeId::Disabling,
            Self::Faulted => ModeId::Faulted,
        }
    }

    /// The current selection.  Outside configuring and working the
    /// selection is back at its reset value, `Short`.
    pub fn selection(&self) -> DurationSelection {
        match self {
            Self::ConfigureDuration(selection) | Self::Working { selection, .. } => *selection,
            _ => DurationSelection::Short,
        }
    }

    /// The active work window.  `Some` if and only if the mode is `Working`.
    pub fn work_window(&self) -> Option<WorkWindow> {
        match self {
            Self::Working { window, .. } => Some(*window),
            _ => None,
        }
    }
}

impl fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sleep => write!(f, "Sleep"),
            Self::ConfigureDuration(sel) => write!(f, "ConfigureDuration({sel:?})"),
            Self::Working { selection, window } => write!(
                f,
                "Working({selection:?}, {}s..{}s)",
                window.start_s, window.stop_s
            ),
            Self::Disabling => write!(f, "Disabling"),
            Self::Faulted => write!(f, "Faulted"),
        }
    }
}

/// A transition that actually happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeChange {
    pub from: OperatingMode,
    pub to: OperatingMode,
}

// ---------------------------------------------------------------------------
// Machine
// ---------------------------------------------------------------------------

/// Owns the operating mode, the inactivity deadline, and the fault latch.
pub struct ModeMachine {
    mode: OperatingMode,
    /// Seconds-counter value at which configuring times out.
    inactivity_deadline_s: u32,
    /// Set by any `SensorFault`; blocks starting work until restart.
    fault_latched: bool,
}

impl ModeMachine {
    pub fn new() -> Self {
        Self {
            mode: OperatingMode::Sleep,
            inactivity_deadline_s: 0,
            fault_latched: false,
        }
    }

    pub fn mode(&self) -> OperatingMode {
        self.mode
    }

    pub fn is_fault_latched(&self) -> bool {
        self.fault_latched
    }

    pub fn inactivity_deadline(&self) -> u32 {
        self.inactivity_deadline_s
    }

    /// Push the inactivity deadline to `now_s + timeout_s`.  Called on
    /// every gesture, whatever the mode.
    pub fn rearm_timeout(&mut self, now_s: u32, timeout_s: u32) {
        self.inactivity_deadline_s = now_s.saturating_add(timeout_s);
    }

    /// The single entry point for mode changes.
    pub fn handle_event(&mut self, event: Event, now_s: u32) -> Option<ModeChange> {
        use DurationSelection::Short;
        use OperatingMode::*;

        if event == Event::SensorFault && !self.fault_latched {
            warn!("Sensor fault latched in {}", self.mode);
            self.fault_latched = true;
        }

        let next = match (self.mode, event) {
            (Sleep, Event::ShortPress) => Some(ConfigureDuration(Short)),

            (ConfigureDuration(selection), Event::ShortPress) => {
                Some(ConfigureDuration(selection.next()))
            }
            (ConfigureDuration(_), Event::ConfigTimeout) => Some(Sleep),
            (ConfigureDuration(selection), Event::LongPress) if !self.fault_latched => {
                Some(Working {
                    selection,
                    window: WorkWindow::starting_at(now_s, selection),
                })
            }

            (Working { .. }, Event::LongPress | Event::WorkTimeElapsed) => Some(Disabling),
            (Working { .. }, Event::SensorFault) => Some(Faulted),

            _ => None,
        };

        match next {
            Some(to) => Some(self.transition(to)),
            None => {
                debug!("FSM: {:?} ignored in {}", event, self.mode);
                None
            }
        }
    }

    /// Time-driven event due at `now_s`, if any: work-window expiry while
    /// working, inactivity timeout while configuring.
    pub fn due_time_event(&self, now_s: u32) -> Option<Event> {
        match self.mode {
            OperatingMode::Working { window, .. } if window.is_expired(now_s) => {
                Some(Event::WorkTimeElapsed)
            }
            OperatingMode::ConfigureDuration(_) if now_s >= self.inactivity_deadline_s => {
                Some(Event::ConfigTimeout)
            }
            _ => None,
        }
    }

    /// Finish the epsilon transition out of `Disabling`.  The caller has
    /// already shut the actuators down.
    pub fn complete_disabling(&mut self) -> Option<ModeChange> {
        if self.mode == OperatingMode::Disabling {
            Some(self.transition(OperatingMode::Sleep))
        } else {
            None
        }
    }

    fn transition(&mut self, to: OperatingMode) -> ModeChange {
        let from = self.mode;
        self.mode = to;
        if to == OperatingMode::Faulted {
            error!("FSM transition: {} -> {} (terminal)", from, to);
        } else {
            info!("FSM transition: {} -> {}", from, to);
        }
        ModeChange { from, to }
    }
}

impl Default for ModeMachine {
    fn default() -> Self {
        Self::new()
    }
}
