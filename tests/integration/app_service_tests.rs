//! Integration tests for the AppService → modes → actuators pipeline.
//!
//! These run on the host (x86_64) and drive whole scheduler passes
//! against a recording mock, with time advanced explicitly.

use std::cell::Cell;
use std::rc::Rc;

use super::mock_hw::{ActuatorCall, LowRng, MockHardware, RecordingSink, StubRegulator};

use heatkeeper::app::events::AppEvent;
use heatkeeper::app::service::AppService;
use heatkeeper::config::SystemConfig;
use heatkeeper::drivers::led_effects::{VisualEffect, COLOUR_GREEN, COLOUR_OFF, COLOUR_RED, COLOUR_YELLOW};
use heatkeeper::error::{Error, SensorError};
use heatkeeper::events::Gesture;
use heatkeeper::fsm::{DurationSelection, ModeId, OperatingMode};
use heatkeeper::progress::ProgressLevels;

use DurationSelection::{Long, Medium, Short};

/// Fine loop period used by most tests.
const STEP_MS: u32 = 10;
/// Coarse period for fast-forwarding through hours of work.
const COARSE_STEP_MS: u32 = 100;

struct Rig {
    app: AppService<StubRegulator, LowRng>,
    hw: MockHardware,
    sink: RecordingSink,
    now_ms: u32,
    resets: Rc<Cell<u32>>,
    regulator_input: Rc<Cell<Option<f32>>>,
}

impl Rig {
    fn new() -> Self {
        Self::with(SystemConfig::default(), 300.0)
    }

    fn with(config: SystemConfig, regulator_output: f32) -> Self {
        let regulator = StubRegulator::new(regulator_output);
        let resets = regulator.resets.clone();
        let regulator_input = regulator.last_input.clone();
        let mut app = AppService::new(config, regulator, LowRng).unwrap();
        let mut hw = MockHardware::new();
        let mut sink = RecordingSink::new();
        app.start(&mut hw, &mut sink).unwrap();
        Self {
            app,
            hw,
            sink,
            now_ms: 0,
            resets,
            regulator_input,
        }
    }

    /// One pass at the current time.
    fn pass(&mut self) {
        self.app.run(self.now_ms, &mut self.hw, &mut self.sink);
    }

    /// Deliver a gesture on a pass at the current time.
    fn gesture(&mut self, gesture: Gesture) {
        self.hw.press(gesture);
        self.pass();
    }

    fn advance(&mut self, ms: u32, step: u32) {
        let target = self.now_ms + ms;
        while self.now_ms < target {
            self.now_ms += step;
            self.pass();
        }
    }

    fn run_for(&mut self, ms: u32) {
        self.advance(ms, STEP_MS);
    }

    fn fast_forward_to(&mut self, at_ms: u32) {
        self.advance(at_ms - self.now_ms, COARSE_STEP_MS);
    }

    /// Enter `Working` with `selection` at the current time.
    fn start_work(&mut self, selection: DurationSelection) {
        self.gesture(Gesture::ShortPress);
        while self.app.mode().selection() != selection {
            self.gesture(Gesture::ShortPress);
        }
        self.gesture(Gesture::LongPress);
        assert_eq!(self.app.mode().id(), ModeId::Working);
    }
}

// ── Startup ───────────────────────────────────────────────────

#[test]
fn start_puts_outputs_in_known_state() {
    let rig = Rig::new();
    assert_eq!(rig.app.mode(), OperatingMode::Sleep);
    assert_eq!(rig.hw.resolution_bits, Some(12));
    assert_eq!(
        rig.hw.calls,
        vec![
            ActuatorCall::SetHeater(0),
            ActuatorCall::SetIndicators(ProgressLevels::OFF),
        ]
    );
    assert_eq!(rig.sink.events, vec![AppEvent::Started(OperatingMode::Sleep)]);
}

#[test]
fn start_reports_rejected_resolution() -> anyhow::Result<()> {
    let mut app = AppService::new(SystemConfig::default(), StubRegulator::new(0.0), LowRng)?;
    let mut hw = MockHardware::new();
    hw.reject_resolution = true;
    let mut sink = RecordingSink::new();

    let err = app.start(&mut hw, &mut sink).unwrap_err();
    assert_eq!(err, Error::Sensor(SensorError::ResolutionRejected));
    assert_eq!(sink.sensor_faults(), 1);
    Ok(())
}

#[test]
fn first_pass_paints_status_pixel() {
    let mut rig = Rig::new();
    rig.pass();
    assert_eq!(rig.hw.pixel(1), Some((0, 1, 254)));
    assert_eq!(rig.hw.calls.last(), Some(&ActuatorCall::ShowPixels));
}

// ── Scenario A: wake ──────────────────────────────────────────

#[test]
fn short_press_wakes_into_configure_short() {
    let mut rig = Rig::new();
    rig.gesture(Gesture::ShortPress);

    assert_eq!(rig.app.mode(), OperatingMode::ConfigureDuration(Short));
    assert_eq!(
        rig.sink.mode_changes(),
        vec![(OperatingMode::Sleep, OperatingMode::ConfigureDuration(Short))]
    );
    assert_eq!(rig.app.visual_effect(), VisualEffect::ConfigGreen);
    assert_eq!(rig.hw.pixel(1), Some(COLOUR_GREEN));
}

// ── Scenario B: cycle, then time out ──────────────────────────

#[test]
fn configure_times_out_after_five_idle_seconds() {
    let mut rig = Rig::new();
    rig.gesture(Gesture::ShortPress);
    rig.gesture(Gesture::ShortPress);
    rig.gesture(Gesture::ShortPress);
    assert_eq!(rig.app.mode(), OperatingMode::ConfigureDuration(Long));

    rig.run_for(4_990);
    assert_eq!(rig.app.mode(), OperatingMode::ConfigureDuration(Long));

    rig.run_for(10);
    assert_eq!(rig.app.seconds(), 5);
    assert_eq!(rig.app.mode(), OperatingMode::Sleep);
    assert_eq!(rig.app.mode().selection(), Short);
}

#[test]
fn every_gesture_rearms_the_timeout() {
    let mut rig = Rig::new();
    rig.gesture(Gesture::ShortPress);
    rig.run_for(3_000);
    rig.gesture(Gesture::ShortPress);
    assert_eq!(rig.app.mode(), OperatingMode::ConfigureDuration(Medium));

    rig.run_for(4_990);
    assert_eq!(rig.app.mode(), OperatingMode::ConfigureDuration(Medium));
    assert_eq!(rig.hw.pixel(1), Some(COLOUR_YELLOW));

    rig.run_for(10);
    assert_eq!(rig.app.mode(), OperatingMode::Sleep);
}

#[test]
fn gestures_in_one_pass_are_handled_in_order() {
    let mut rig = Rig::new();
    rig.hw.press(Gesture::ShortPress);
    rig.hw.press(Gesture::ShortPress);
    rig.hw.press(Gesture::LongPress);
    rig.pass();

    let window = rig.app.mode().work_window().unwrap();
    assert_eq!(rig.app.mode().selection(), Medium);
    assert_eq!(window.stop_s - window.start_s, 14_400);
}

// ── Scenario C: start work ────────────────────────────────────

#[test]
fn long_press_starts_work_with_exact_window() -> anyhow::Result<()> {
    let mut rig = Rig::new();
    rig.run_for(2_000);
    rig.gesture(Gesture::ShortPress);
    rig.gesture(Gesture::ShortPress);
    rig.gesture(Gesture::LongPress);

    let window = rig
        .app
        .mode()
        .work_window()
        .ok_or_else(|| anyhow::anyhow!("not working"))?;
    assert_eq!(window.start_s, 2);
    assert_eq!(window.stop_s, 2 + 14_400);
    assert_eq!(rig.resets.get(), 1, "regulator starts clean");
    assert_eq!(rig.hw.heater_duty(), 255, "output clamped to duty max");
    assert_eq!(rig.app.visual_effect(), VisualEffect::WorkingFlame);
    Ok(())
}

#[test]
fn heater_duty_respects_configured_max() {
    let config = SystemConfig {
        heater_duty_max: 100,
        ..SystemConfig::default()
    };
    let mut rig = Rig::with(config, 300.0);
    rig.start_work(Short);
    assert_eq!(rig.hw.heater_duty(), 100);
}

#[test]
fn negative_regulator_output_means_heater_off() {
    let mut rig = Rig::with(SystemConfig::default(), -12.0);
    rig.start_work(Short);
    rig.run_for(500);
    assert_eq!(rig.hw.heater_duty(), 0);
}

#[test]
fn first_lamp_lights_as_work_begins() {
    let mut rig = Rig::new();
    rig.run_for(20);
    rig.start_work(Medium);
    assert_eq!(rig.hw.indicators().as_array(), [true, false, false]);

    rig.run_for(3_000);
    assert_eq!(rig.hw.indicators().as_array(), [true, false, false]);
}

#[test]
fn progress_lamps_follow_thresholds_monotonically() {
    let mut rig = Rig::new();
    rig.start_work(Short);

    rig.fast_forward_to(2_375_000);
    assert_eq!(rig.hw.indicators().lit(), 1);
    rig.fast_forward_to(2_380_000);
    assert_eq!(rig.hw.indicators().lit(), 2);
    rig.fast_forward_to(4_750_000);
    assert_eq!(rig.hw.indicators().lit(), 2);
    rig.fast_forward_to(4_755_000);
    assert_eq!(rig.hw.indicators().lit(), 3);

    let lit: Vec<usize> = rig
        .hw
        .calls
        .iter()
        .filter_map(|c| match c {
            ActuatorCall::SetIndicators(levels) => Some(levels.lit()),
            _ => None,
        })
        .skip(1) // startup reset
        .collect();
    assert!(lit.windows(2).all(|w| w[0] <= w[1]), "lamps went backwards: {:?}", lit);
}

// ── Scenario D: sensor fault while working ────────────────────

#[test]
fn sensor_fault_while_working_is_immediate_and_terminal() {
    let mut rig = Rig::new();
    rig.start_work(Short);
    rig.run_for(1_000);
    assert!(rig.hw.heater_duty() > 0);

    rig.hw.reading = Err(SensorError::Disconnected);
    while rig.app.mode().id() == ModeId::Working {
        rig.run_for(STEP_MS);
    }
    assert_eq!(rig.app.mode(), OperatingMode::Faulted);
    assert_eq!(rig.hw.heater_duty(), 0, "heater forced off in the fault pass");
    assert_eq!(rig.hw.indicators(), ProgressLevels::OFF);
    assert_eq!(rig.app.visual_effect(), VisualEffect::FaultBlink);
    assert_eq!(rig.sink.sensor_faults(), 1);
    assert_eq!(
        rig.sink.mode_changes().last().map(|(_, to)| *to),
        Some(OperatingMode::Faulted)
    );

    let mark = rig.hw.calls.len();
    let changes = rig.sink.mode_changes().len();
    rig.gesture(Gesture::ShortPress);
    rig.gesture(Gesture::LongPress);
    rig.run_for(1_000);
    rig.gesture(Gesture::LongPress);

    assert_eq!(rig.app.mode(), OperatingMode::Faulted);
    assert_eq!(rig.sink.mode_changes().len(), changes);
    assert_eq!(rig.sink.sensor_faults(), 1, "fault reported once");

    let after = &rig.hw.calls[mark..];
    assert!(after
        .iter()
        .all(|c| !matches!(c, ActuatorCall::SetHeater(d) if *d > 0)));
    let colours: Vec<_> = after
        .iter()
        .filter_map(|c| match c {
            ActuatorCall::SetPixel { colour, .. } => Some(*colour),
            _ => None,
        })
        .collect();
    assert!(colours.contains(&COLOUR_RED) && colours.contains(&COLOUR_OFF));
    assert!(colours.iter().all(|c| *c == COLOUR_RED || *c == COLOUR_OFF));
}

#[test]
fn failed_read_feeds_regulator_zero() {
    let mut rig = Rig::new();
    rig.run_for(200);
    assert_eq!(rig.regulator_input.get(), Some(20.0));

    rig.start_work(Short);
    rig.hw.reading = Err(SensorError::Disconnected);
    rig.run_for(200);
    assert_eq!(rig.app.mode(), OperatingMode::Faulted);
    assert_eq!(rig.regulator_input.get(), Some(0.0));
}

#[test]
fn failed_read_outside_work_also_feeds_zero() {
    let mut rig = Rig::new();
    rig.run_for(200);
    rig.hw.reading = Err(SensorError::ReadFailed);
    rig.run_for(100);
    assert_eq!(rig.app.mode(), OperatingMode::Sleep);
    assert_eq!(rig.regulator_input.get(), Some(0.0));
}

#[test]
fn lost_heater_off_write_is_retried_in_faulted() {
    let mut rig = Rig::new();
    rig.start_work(Short);
    rig.run_for(1_000);
    assert_eq!(rig.hw.heater_duty(), 255);

    rig.hw.lost_heater_writes = 1;
    rig.hw.lost_indicator_writes = 1;
    rig.hw.reading = Err(SensorError::Disconnected);
    while rig.app.mode().id() == ModeId::Working {
        rig.run_for(STEP_MS);
    }
    assert_eq!(rig.app.mode(), OperatingMode::Faulted);
    assert_eq!(rig.hw.lost_heater_writes, 0, "shutdown write was attempted");
    assert_eq!(rig.hw.heater_duty(), 0, "off write repeated in the fault pass");
    assert_eq!(rig.hw.indicators(), ProgressLevels::OFF);

    let writes = rig.hw.heater_writes().len();
    rig.run_for(10_000);
    assert_eq!(rig.hw.heater_writes().len(), writes, "no writes once acknowledged");
    assert_eq!(rig.app.heater_duty(), 0);
}

#[test]
fn lost_heater_off_write_is_retried_after_stop() {
    let mut rig = Rig::new();
    rig.start_work(Long);
    rig.run_for(1_000);
    assert_eq!(rig.hw.heater_duty(), 255);

    rig.hw.lost_heater_writes = 1;
    rig.gesture(Gesture::LongPress);
    assert_eq!(rig.app.mode(), OperatingMode::Sleep);
    assert_eq!(rig.hw.heater_duty(), 255, "off write lost");
    assert_eq!(rig.app.heater_duty(), 0);

    rig.pass();
    assert_eq!(rig.hw.heater_duty(), 0);
}

#[test]
fn fault_wins_over_expiry_in_the_same_pass() {
    let mut rig = Rig::new();
    rig.start_work(Short);

    rig.fast_forward_to(7_199_900);
    rig.run_for(10);
    assert_eq!(rig.app.mode().id(), ModeId::Working);

    // Next sensor read and the 7200th second land on the same pass.
    rig.hw.reading = Err(SensorError::ReadFailed);
    rig.run_for(90);

    assert_eq!(rig.app.seconds(), 7_200);
    assert_eq!(rig.app.mode(), OperatingMode::Faulted);
    assert!(rig
        .sink
        .mode_changes()
        .iter()
        .all(|(_, to)| *to != OperatingMode::Disabling));
}

#[test]
fn sensor_fault_outside_work_latches_and_blocks_start() {
    let mut rig = Rig::new();
    rig.hw.reading = Err(SensorError::OutOfRange);
    rig.run_for(100);
    assert_eq!(rig.app.mode(), OperatingMode::Sleep);
    assert!(rig.app.is_fault_latched());

    rig.gesture(Gesture::ShortPress);
    rig.gesture(Gesture::LongPress);
    assert_eq!(rig.app.mode(), OperatingMode::ConfigureDuration(Short));

    rig.run_for(1_000);
    assert_eq!(rig.sink.sensor_faults(), 1);
    assert!(rig.app.build_telemetry().fault_latched);
}

// ── Scenario E: work window runs out ──────────────────────────

#[test]
fn expiry_passes_through_disabling_to_sleep_in_one_pass() {
    let mut rig = Rig::new();
    rig.start_work(Short);

    rig.fast_forward_to(7_199_900);
    assert_eq!(rig.app.mode().id(), ModeId::Working);
    assert_eq!(rig.hw.indicators().lit(), 3);

    rig.run_for(90);
    let mark = rig.sink.events.len();
    rig.run_for(10);

    let working = rig.sink.mode_changes().iter().rev().nth(1).map(|(from, _)| *from);
    assert!(matches!(working, Some(OperatingMode::Working { .. })));
    assert_eq!(
        rig.sink.events[mark..]
            .iter()
            .filter(|e| matches!(e, AppEvent::ModeChanged { .. }))
            .count(),
        2
    );
    assert_eq!(
        rig.sink.mode_changes().last(),
        Some(&(OperatingMode::Disabling, OperatingMode::Sleep))
    );
    assert_eq!(rig.app.mode(), OperatingMode::Sleep);
    assert_eq!(rig.app.mode().selection(), Short);
    assert_eq!(rig.hw.heater_duty(), 0);
    assert_eq!(rig.hw.indicators(), ProgressLevels::OFF);
}

#[test]
fn long_press_stops_work() {
    let mut rig = Rig::new();
    rig.start_work(Long);
    rig.run_for(2_000);
    rig.gesture(Gesture::LongPress);

    assert_eq!(rig.app.mode(), OperatingMode::Sleep);
    assert_eq!(rig.hw.heater_duty(), 0);
    assert_eq!(rig.hw.heater_writes().last(), Some(&0));
}

#[test]
fn regulator_resets_on_every_work_session() {
    let mut rig = Rig::new();
    rig.start_work(Short);
    rig.gesture(Gesture::LongPress);
    rig.start_work(Medium);
    assert_eq!(rig.resets.get(), 2);
}

// ── Telemetry ─────────────────────────────────────────────────

#[test]
fn telemetry_every_minute() {
    let mut rig = Rig::new();
    rig.fast_forward_to(59_900);
    let telemetry = |sink: &RecordingSink| {
        sink.events
            .iter()
            .filter_map(|e| match e {
                AppEvent::Telemetry(t) => Some(t.clone()),
                _ => None,
            })
            .collect::<Vec<_>>()
    };
    assert!(telemetry(&rig.sink).is_empty());

    rig.fast_forward_to(60_000);
    let reports = telemetry(&rig.sink);
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].uptime_secs, 60);
    assert_eq!(reports[0].mode, ModeId::Sleep);
    assert_eq!(reports[0].temperature_c, Some(20.0));
    assert_eq!(reports[0].progress_percent, None);
}

#[test]
fn telemetry_reports_progress_while_working() {
    let mut rig = Rig::new();
    rig.start_work(Short);
    rig.fast_forward_to(3_600_000);
    let t = rig.app.build_telemetry();
    assert_eq!(t.mode, ModeId::Working);
    assert_eq!(t.progress_percent, Some(50));
    assert_eq!(t.heater_duty, 255);
    assert!(serde_json::to_string(&t).unwrap().contains("\"progress_percent\":50"));
}
