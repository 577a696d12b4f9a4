//! Application service — the hexagonal core.
//!
//! [`AppService`] owns the mode machine, scheduler, effect engine, and
//! regulator.  It exposes a clean, hardware-agnostic API.  All I/O flows
//! through port traits injected at call sites, making the entire service
//! testable with mock adapters.
//!
//! ```text
//!   InputPort ──▶ ┌────────────────────────────┐ ──▶ EventSink
//!  SensorPort ──▶ │         AppService         │
//! ActuatorPort ◀──│ Modes · Scheduler · Effects│
//!                 └────────────────────────────┘
//! ```
//!
//! ## One pass
//!
//! 1. Drain gestures into the event queue and dispatch them.
//! 2. Scheduler: sensor, seconds, visual effect, progress.
//! 3. Time-driven events (work window expiry, configuration timeout).
//! 4. Mode-dependent actuator writes; `Disabling` falls through to `Sleep`.
//!    Outside `Working` the heater and lamps are held off, and a write the
//!    hardware did not acknowledge is repeated on the next pass.
//!
//! The order is fixed: a sensor fault raised in step 2 wins over a window
//! expiry in step 3, because `Faulted` no longer matches `Working`.

use log::{info, warn};

use crate::clock::SecondsCounter;
use crate::config::SystemConfig;
use crate::drivers::led_effects::{EffectEngine, VisualEffect};
use crate::error::Result;
use crate::events::{Event, EventQueue};
use crate::fsm::{ModeChange, ModeId, ModeMachine, OperatingMode};
use crate::progress::{percent_elapsed, ProgressLevels};
use crate::scheduler::{NextDue, Scheduler, TaskId};

use super::events::{AppEvent, TelemetryData};
use super::ports::{
    ActuatorPort, EventSink, InputPort, MonotonicClock, RandomSource, Regulator, SensorPort,
    TaskDelegate,
};

// ───────────────────────────────────────────────────────────────
// Control core (state shared by the periodic tasks)
// ───────────────────────────────────────────────────────────────

struct ControlCore<R, G> {
    machine: ModeMachine,
    seconds: SecondsCounter,
    regulator: R,
    effects: EffectEngine<G>,
    /// Effect rendered last; a change restarts the engine's sub-state.
    effect: VisualEffect,
    /// Last good reading.
    temperature_c: Option<f32>,
    /// Last duty the heater acknowledged; `None` until known.
    heater_duty: Option<u8>,
    /// Last levels the lamps acknowledged; `None` until known.
    indicators: Option<ProgressLevels>,
    /// Set once the sensor has failed; cleared by the next good read.
    sensor_failed: bool,
    last_telemetry_s: u32,
}

impl<R: Regulator, G: RandomSource> ControlCore<R, G> {
    /// Feed one event to the machine and publish the result.
    fn dispatch(&mut self, event: Event, sink: &mut impl EventSink) -> Option<ModeChange> {
        let change = self.machine.handle_event(event, self.seconds.now())?;
        if change.to.id() == ModeId::Working {
            self.regulator.reset();
        }
        sink.emit(&AppEvent::ModeChanged {
            from: change.from,
            to: change.to,
        });
        Some(change)
    }

    /// Write `duty` unless the heater already acknowledged it.  A failed
    /// write leaves the duty unknown, so the next call writes again.
    fn drive_heater(&mut self, duty: u8, hw: &mut impl ActuatorPort) {
        if self.heater_duty != Some(duty) {
            self.heater_duty = hw.set_heater_duty(duty).ok().map(|()| duty);
        }
    }

    fn drive_indicators(&mut self, levels: ProgressLevels, hw: &mut impl ActuatorPort) {
        if self.indicators != Some(levels) {
            self.indicators = hw.set_indicators(levels).ok().map(|()| levels);
        }
    }

    /// Unconditional heater-off and lamps-off.
    fn shutdown(&mut self, hw: &mut impl ActuatorPort) {
        self.heater_duty = hw.set_heater_duty(0).ok().map(|()| 0);
        self.indicators = hw
            .set_indicators(ProgressLevels::OFF)
            .ok()
            .map(|()| ProgressLevels::OFF);
    }

    fn telemetry(&self) -> TelemetryData {
        let mode = self.machine.mode();
        let now_s = self.seconds.now();
        TelemetryData {
            mode: mode.id(),
            selection: mode.selection(),
            uptime_secs: now_s,
            temperature_c: self.temperature_c,
            heater_duty: self.heater_duty.unwrap_or(0),
            progress_percent: mode
                .work_window()
                .map(|w| percent_elapsed(w.elapsed_secs(now_s), w.duration_secs())),
            fault_latched: self.machine.is_fault_latched(),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Task runner (scheduler delegate for one pass)
// ───────────────────────────────────────────────────────────────

struct TaskRunner<'a, R, G, H, S> {
    config: &'a SystemConfig,
    core: &'a mut ControlCore<R, G>,
    hw: &'a mut H,
    sink: &'a mut S,
}

impl<R, G, H, S> TaskRunner<'_, R, G, H, S>
where
    R: Regulator,
    G: RandomSource,
    H: SensorPort + ActuatorPort,
    S: EventSink,
{
    fn read_sensor(&mut self) {
        match self.hw.read_temperature() {
            Ok(celsius) => {
                if self.core.sensor_failed {
                    info!("Sensor readings restored ({:.1}\u{00b0}C)", celsius);
                    self.core.sensor_failed = false;
                }
                self.core.temperature_c = Some(celsius);
                self.core.regulator.set_input(celsius);
            }
            Err(e) => {
                if !self.core.sensor_failed {
                    warn!("Temperature read failed: {}", e);
                    self.core.sensor_failed = true;
                    self.sink.emit(&AppEvent::SensorFault(e));
                }
                self.core.temperature_c = None;
                self.core.regulator.set_input(0.0);
                let change = self.core.dispatch(Event::SensorFault, &mut *self.sink);
                if change.is_some_and(|c| c.to == OperatingMode::Faulted) {
                    self.core.shutdown(&mut *self.hw);
                }
            }
        }
    }

    fn tick_second(&mut self) {
        let now_s = self.core.seconds.advance();
        let every = self.config.telemetry_interval_secs;
        if every > 0 && now_s.saturating_sub(self.core.last_telemetry_s) >= every {
            self.core.last_telemetry_s = now_s;
            self.sink.emit(&AppEvent::Telemetry(self.core.telemetry()));
        }
    }

    fn render_effect(&mut self) -> NextDue {
        let effect = VisualEffect::for_mode(self.core.machine.mode());
        if effect != self.core.effect {
            self.core.effects.reset();
            self.core.effect = effect;
        }
        let frame = self.core.effects.render(effect);
        self.hw.set_pixel(self.config.status_pixel_index, frame.colour);
        self.hw.show_pixels();
        NextDue::after_ms(frame.next_delay_ms)
    }

    fn refresh_progress(&mut self) {
        let now_s = self.core.seconds.now();
        if let Some(window) = self.core.machine.mode().work_window() {
            let levels =
                ProgressLevels::for_elapsed(window.elapsed_secs(now_s), window.duration_secs());
            self.core.drive_indicators(levels, &mut *self.hw);
        }
    }
}

impl<R, G, H, S> TaskDelegate for TaskRunner<'_, R, G, H, S>
where
    R: Regulator,
    G: RandomSource,
    H: SensorPort + ActuatorPort,
    S: EventSink,
{
    fn is_enabled(&self, task: TaskId) -> bool {
        match task {
            TaskId::ProgressRefresh => self.core.machine.mode().id() == ModeId::Working,
            _ => true,
        }
    }

    fn run_task(&mut self, task: TaskId, _now_ms: u32) -> NextDue {
        match task {
            TaskId::SensorRead => {
                self.read_sensor();
                NextDue::after_ms(self.config.sensor_read_interval_ms)
            }
            TaskId::SecondsTick => {
                self.tick_second();
                NextDue::after_ms(self.config.second_interval_ms)
            }
            TaskId::VisualEffect => self.render_effect(),
            TaskId::ProgressRefresh => {
                self.refresh_progress();
                NextDue::after_ms(self.config.progress_refresh_interval_ms)
            }
        }
    }
}

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct AppService<R, G> {
    config: SystemConfig,
    core: ControlCore<R, G>,
    scheduler: Scheduler,
    queue: EventQueue,
    pass_count: u64,
}

impl<R: Regulator, G: RandomSource> AppService<R, G> {
    /// Construct the service from a validated configuration.
    ///
    /// Does **not** touch hardware; call [`start`](Self::start) next.
    pub fn new(config: SystemConfig, regulator: R, rng: G) -> Result<Self> {
        config.validate()?;
        let scheduler = Scheduler::new(&config);
        Ok(Self {
            core: ControlCore {
                machine: ModeMachine::new(),
                seconds: SecondsCounter::new(),
                regulator,
                effects: EffectEngine::new(rng),
                effect: VisualEffect::SleepBreathe,
                temperature_c: None,
                heater_duty: None,
                indicators: None,
                sensor_failed: false,
                last_telemetry_s: 0,
            },
            config,
            scheduler,
            queue: EventQueue::new(),
            pass_count: 0,
        })
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Put the outputs in a known state and configure the sensor.
    pub fn start(
        &mut self,
        hw: &mut (impl SensorPort + ActuatorPort),
        sink: &mut impl EventSink,
    ) -> Result<()> {
        self.core.shutdown(hw);
        if let Err(e) = hw.set_resolution(self.config.sensor_resolution_bits) {
            warn!(
                "Sensor rejected {}-bit resolution: {}",
                self.config.sensor_resolution_bits, e
            );
            sink.emit(&AppEvent::SensorFault(e));
            return Err(e.into());
        }
        let mode = self.core.machine.mode();
        sink.emit(&AppEvent::Started(mode));
        info!("AppService started in {}", mode);
        Ok(())
    }

    // ── Per-pass orchestration ────────────────────────────────

    /// Run one pass at `now_ms`.
    ///
    /// The `hw` parameter satisfies **all three** hardware ports, so one
    /// mutable borrow covers input, sensor and actuators.
    pub fn run<H, S>(&mut self, now_ms: u32, hw: &mut H, sink: &mut S)
    where
        H: InputPort + SensorPort + ActuatorPort,
        S: EventSink,
    {
        self.pass_count += 1;

        // 1. Gestures
        let queue = &mut self.queue;
        hw.poll_gestures(now_ms, &mut |gesture| {
            queue.push(gesture.into());
        });
        while let Some(event) = self.queue.pop() {
            self.core
                .machine
                .rearm_timeout(self.core.seconds.now(), self.config.config_timeout_secs);
            let change = self.core.dispatch(event, sink);
            if change.is_some_and(|c| c.to.id() == ModeId::Working) {
                self.scheduler.make_due(TaskId::ProgressRefresh);
            }
        }

        // 2. Periodic tasks
        let mut runner = TaskRunner {
            config: &self.config,
            core: &mut self.core,
            hw: &mut *hw,
            sink: &mut *sink,
        };
        self.scheduler.poll(now_ms, &mut runner);

        // 3. Time-driven events
        if let Some(event) = self.core.machine.due_time_event(self.core.seconds.now()) {
            self.core.dispatch(event, sink);
        }

        // 4. Actuators
        self.apply_mode(hw, sink);
    }

    /// Run one pass at the clock's current time.
    pub fn poll<H, S>(&mut self, clock: &impl MonotonicClock, hw: &mut H, sink: &mut S)
    where
        H: InputPort + SensorPort + ActuatorPort,
        S: EventSink,
    {
        self.run(clock.now_ms(), hw, sink);
    }

    // ── Queries ───────────────────────────────────────────────

    /// Build a telemetry snapshot from the current state.
    pub fn build_telemetry(&self) -> TelemetryData {
        self.core.telemetry()
    }

    /// Current operating mode.
    pub fn mode(&self) -> OperatingMode {
        self.core.machine.mode()
    }

    /// Seconds counter value.
    pub fn seconds(&self) -> u32 {
        self.core.seconds.now()
    }

    pub fn is_fault_latched(&self) -> bool {
        self.core.machine.is_fault_latched()
    }

    /// Effect currently shown on the status pixel.
    pub fn visual_effect(&self) -> VisualEffect {
        VisualEffect::for_mode(self.mode())
    }

    /// Last duty the heater acknowledged (0 while unknown).
    pub fn heater_duty(&self) -> u8 {
        self.core.heater_duty.unwrap_or(0)
    }

    /// Last levels the progress lamps acknowledged (all off while unknown).
    pub fn indicators(&self) -> ProgressLevels {
        self.core.indicators.unwrap_or(ProgressLevels::OFF)
    }

    /// Passes executed since construction.
    pub fn pass_count(&self) -> u64 {
        self.pass_count
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    // ── Internal ──────────────────────────────────────────────

    /// Translate the current mode into actuator writes.
    fn apply_mode(&mut self, hw: &mut impl ActuatorPort, sink: &mut impl EventSink) {
        match self.core.machine.mode() {
            OperatingMode::Working { .. } => {
                let max = f32::from(self.config.heater_duty_max);
                let duty = self.core.regulator.output().clamp(0.0, max) as u8;
                self.core.drive_heater(duty, hw);
            }
            OperatingMode::Disabling => {
                self.core.shutdown(hw);
                if let Some(change) = self.core.machine.complete_disabling() {
                    sink.emit(&AppEvent::ModeChanged {
                        from: change.from,
                        to: change.to,
                    });
                }
            }
            OperatingMode::Faulted
            | OperatingMode::Sleep
            | OperatingMode::ConfigureDuration(_) => {
                self.core.drive_heater(0, hw);
                self.core.drive_indicators(ProgressLevels::OFF, hw);
            }
        }
    }
}
