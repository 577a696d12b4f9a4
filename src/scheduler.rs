//! Cooperative multi-rate scheduler.
//!
//! One non-blocking pass per loop iteration.  Each periodic task keeps a
//! last-fired mark and a period; a task runs when
//! `now - last_fired >= period` and at most once per pass.  The scheduler
//! notifies a [`TaskDelegate`] when a task is due.  The delegate does the
//! work and returns the delay until the next run, so a task can keep a
//! fixed period or report a new one on every invocation.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  poll(now_ms)                                                │
//! │                                                              │
//! │  SensorRead ─▶ SecondsTick ─▶ VisualEffect ─▶ ProgressRefresh│
//! │     100 ms        1000 ms      self-reported      5000 ms    │
//! │        │             │              │                │       │
//! │        ▼             ▼              ▼                ▼       │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │      TaskDelegate::run_task(task, now) -> NextDue      │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Comparisons use `wrapping_sub`, so the 32-bit millisecond clock may roll
//! over without stalling any task.

use crate::app::ports::TaskDelegate;
use crate::config::SystemConfig;

// ═══════════════════════════════════════════════════════════════
//  Task identity
// ═══════════════════════════════════════════════════════════════

/// Periodic tasks, in the fixed order they are serviced within a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TaskId {
    SensorRead = 0,
    SecondsTick = 1,
    VisualEffect = 2,
    ProgressRefresh = 3,
}

impl TaskId {
    pub const COUNT: usize = 4;

    /// Pass order.  Changing it changes which event wins when two fire in
    /// the same pass.
    pub const ALL: [TaskId; TaskId::COUNT] = [
        TaskId::SensorRead,
        TaskId::SecondsTick,
        TaskId::VisualEffect,
        TaskId::ProgressRefresh,
    ];
}

/// Delay a task asks for before its next run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NextDue {
    pub delay_ms: u32,
}

impl NextDue {
    pub const fn after_ms(delay_ms: u32) -> Self {
        Self { delay_ms }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler engine
// ═══════════════════════════════════════════════════════════════

/// Bookkeeping for one periodic task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ScheduleEntry {
    last_fired_ms: u32,
    period_ms: u32,
}

impl ScheduleEntry {
    fn is_due(&self, now_ms: u32) -> bool {
        now_ms.wrapping_sub(self.last_fired_ms) >= self.period_ms
    }
}

/// The scheduler engine.
///
/// Knows nothing about sensors, modes, or LEDs: it only decides *when*
/// and hands the *what* to the delegate.
pub struct Scheduler {
    entries: [ScheduleEntry; TaskId::COUNT],
}

impl Scheduler {
    /// Seed the schedule from configuration.  The visual effect starts with
    /// a zero period so the first pass paints the pixel.
    pub fn new(config: &SystemConfig) -> Self {
        let entry = |period_ms| ScheduleEntry {
            last_fired_ms: 0,
            period_ms,
        };
        Self {
            entries: [
                entry(config.sensor_read_interval_ms),
                entry(config.second_interval_ms),
                entry(0),
                entry(config.progress_refresh_interval_ms),
            ],
        }
    }

    /// Whether `task` would fire at `now_ms`.
    pub fn is_due(&self, task: TaskId, now_ms: u32) -> bool {
        self.entries[task as usize].is_due(now_ms)
    }

    /// Current period of `task` (fixed, or last self-reported delay).
    pub fn period_ms(&self, task: TaskId) -> u32 {
        self.entries[task as usize].period_ms
    }

    /// Timestamp of the last run of `task`.
    pub fn last_fired_ms(&self, task: TaskId) -> u32 {
        self.entries[task as usize].last_fired_ms
    }

    /// Make `task` due on the next pass regardless of its period.  The
    /// task's own reply then sets its cadence again.
    pub fn make_due(&mut self, task: TaskId) {
        self.entries[task as usize].period_ms = 0;
    }

    /// Run one pass.  Every enabled, due task runs exactly once, in
    /// [`TaskId::ALL`] order.  Returns the number of tasks that ran.
    pub fn poll(&mut self, now_ms: u32, delegate: &mut dyn TaskDelegate) -> usize {
        let mut fired = 0;
        for task in TaskId::ALL {
            if !delegate.is_enabled(task) {
                continue;
            }
            let entry = &mut self.entries[task as usize];
            if !entry.is_due(now_ms) {
                continue;
            }
            let next = delegate.run_task(task, now_ms);
            entry.last_fired_ms = now_ms;
            entry.period_ms = next.delay_ms;
            fired += 1;
        }
        fired
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
