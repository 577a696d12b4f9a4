//! Heatkeeper host simulator — Main Entry Point
//!
//! Runs the control core against simulated peripherals: a scripted
//! button, a first-order thermal model behind the sensor port, a PWM
//! heater feeding that model, three lamps, and a 3-pixel strip.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter          LogEventSink     SimClock/SystemClock│
//! │  (Input+Sensor+Actuator)  (EventSink)      (MonotonicClock)    │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  Modes · Scheduler · Effects · Progress · PID          │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Usage: `heatkeeper-sim [normal|fault|timeout] [--realtime]`
#![deny(unused_must_use)]

use std::cell::Cell;
use std::convert::Infallible;
use std::rc::Rc;
use std::time::Duration;

use anyhow::{bail, Result};
use embedded_hal::digital::{ErrorType, InputPin, OutputPin};
use embedded_hal::pwm::{ErrorType as PwmErrorType, SetDutyCycle};
use log::{debug, info, trace};

use heatkeeper::adapters::hardware::{HardwareAdapter, LedStrip, STRIP_LEN};
use heatkeeper::adapters::log_sink::LogEventSink;
use heatkeeper::adapters::rng::SeededRng;
use heatkeeper::adapters::time::SystemClock;
use heatkeeper::app::ports::{MonotonicClock, SensorPort};
use heatkeeper::app::service::AppService;
use heatkeeper::config::SystemConfig;
use heatkeeper::control::pid::PidController;
use heatkeeper::drivers::button::ButtonDriver;
use heatkeeper::drivers::heater::HeaterDriver;
use heatkeeper::drivers::indicators::IndicatorBank;
use heatkeeper::drivers::led_effects::Rgb;
use heatkeeper::error::{ActuatorError, SensorError};

/// Simulated loop period.
const STEP_MS: u32 = 10;
const AMBIENT_C: f32 = 21.0;
/// Heating rate at full duty (°C per second).
const HEAT_RATE_C_PER_S: f32 = 0.8;
/// Newtonian loss coefficient (per second).
const LOSS_PER_S: f32 = 0.01;

// ── Scenarios ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
struct Press {
    at_ms: u32,
    hold_ms: u32,
}

const fn tap(at_ms: u32) -> Press {
    Press { at_ms, hold_ms: 120 }
}

const fn hold(at_ms: u32) -> Press {
    Press { at_ms, hold_ms: 900 }
}

struct Scenario {
    name: &'static str,
    presses: Vec<Press>,
    sensor_fails_at_ms: Option<u32>,
    end_ms: u32,
}

impl Scenario {
    fn named(name: &str) -> Result<Self> {
        let scenario = match name {
            // Select Medium, heat for 20 minutes, stop by hand.
            "normal" => Self {
                name: "normal",
                presses: vec![tap(1_000), tap(2_000), hold(3_000), hold(1_203_000)],
                sensor_fails_at_ms: None,
                end_ms: 1_210_000,
            },
            // Sensor disconnects a minute into a Short run.
            "fault" => Self {
                name: "fault",
                presses: vec![tap(1_000), hold(2_000), tap(70_000), hold(75_000)],
                sensor_fails_at_ms: Some(62_000),
                end_ms: 80_000,
            },
            // Wake, then walk away.
            "timeout" => Self {
                name: "timeout",
                presses: vec![tap(1_000), tap(2_000), tap(3_000)],
                sensor_fails_at_ms: None,
                end_ms: 12_000,
            },
            other => bail!("unknown scenario '{}' (normal, fault, timeout)", other),
        };
        Ok(scenario)
    }
}

// ── Simulated peripherals ─────────────────────────────────────

/// Simulated monotonic clock, stepped by the main loop.
#[derive(Default)]
struct SimClock {
    now: Cell<u32>,
}

impl SimClock {
    fn advance(&self, ms: u32) {
        self.now.set(self.now.get().wrapping_add(ms));
    }
}

impl MonotonicClock for SimClock {
    fn now_ms(&self) -> u32 {
        self.now.get()
    }
}

/// Active-low button driven by the scenario script.
struct ScriptedButton {
    time: Rc<Cell<u32>>,
    presses: Vec<Press>,
}

impl ScriptedButton {
    fn is_pressed(&self) -> bool {
        let now = self.time.get();
        self.presses
            .iter()
            .any(|p| now >= p.at_ms && now < p.at_ms + p.hold_ms)
    }
}

impl ErrorType for ScriptedButton {
    type Error = Infallible;
}

impl InputPin for ScriptedButton {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.is_pressed())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(self.is_pressed())
    }
}

/// First-order thermal model read through the sensor port.
struct ThermalSensor {
    time: Rc<Cell<u32>>,
    heater_duty: Rc<Cell<u8>>,
    temperature_c: f32,
    resolution_c: f32,
    dt_secs: f32,
    fails_at_ms: Option<u32>,
}

impl SensorPort for ThermalSensor {
    fn set_resolution(&mut self, bits: u8) -> Result<(), SensorError> {
        if !(9..=12).contains(&bits) {
            return Err(SensorError::ResolutionRejected);
        }
        self.resolution_c = 0.5 / f32::from(1u16 << (bits - 9));
        Ok(())
    }

    fn read_temperature(&mut self) -> Result<f32, SensorError> {
        if self.fails_at_ms.is_some_and(|t| self.time.get() >= t) {
            return Err(SensorError::Disconnected);
        }
        let drive = f32::from(self.heater_duty.get()) / 255.0;
        let loss = (self.temperature_c - AMBIENT_C) * LOSS_PER_S;
        self.temperature_c += (drive * HEAT_RATE_C_PER_S - loss) * self.dt_secs;
        Ok((self.temperature_c / self.resolution_c).round() * self.resolution_c)
    }
}

/// 8-bit PWM channel whose duty feeds the thermal model.
struct SimPwm {
    duty: Rc<Cell<u8>>,
}

impl PwmErrorType for SimPwm {
    type Error = Infallible;
}

impl SetDutyCycle for SimPwm {
    fn max_duty_cycle(&self) -> u16 {
        255
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        self.duty.set(duty.min(255) as u8);
        Ok(())
    }
}

/// Push-pull output that logs level changes.
struct SimPin {
    label: &'static str,
    high: bool,
}

impl SimPin {
    const fn new(label: &'static str) -> Self {
        Self { label, high: false }
    }

    fn set(&mut self, high: bool) {
        if high != self.high {
            debug!("{} -> {}", self.label, if high { "ON" } else { "off" });
            self.high = high;
        }
    }
}

impl ErrorType for SimPin {
    type Error = Infallible;
}

impl OutputPin for SimPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.set(true);
        Ok(())
    }
}

/// Strip that traces every latched frame.
#[derive(Default)]
struct ConsoleStrip {
    frames: u64,
}

impl LedStrip for ConsoleStrip {
    fn write(&mut self, frame: &[Rgb; STRIP_LEN]) -> Result<(), ActuatorError> {
        self.frames += 1;
        trace!("strip #{} {:?}", self.frames, frame);
        Ok(())
    }
}

// ── Main loop ─────────────────────────────────────────────────

fn run_scenario(
    scenario: &Scenario,
    clock: &impl MonotonicClock,
    advance: &mut dyn FnMut(),
) -> Result<()> {
    let config = SystemConfig::default();
    let time = Rc::new(Cell::new(clock.now_ms()));
    let heater_duty = Rc::new(Cell::new(0u8));

    let button = ButtonDriver::new(
        ScriptedButton {
            time: time.clone(),
            presses: scenario.presses.clone(),
        },
        &config,
    );
    let sensor = ThermalSensor {
        time: time.clone(),
        heater_duty: heater_duty.clone(),
        temperature_c: AMBIENT_C,
        resolution_c: 0.5,
        dt_secs: config.regulator_dt_secs(),
        fails_at_ms: scenario.sensor_fails_at_ms,
    };
    let heater: HeaterDriver<SimPwm, SimPin> = HeaterDriver::pwm(SimPwm {
        duty: heater_duty.clone(),
    });
    let lamps = IndicatorBank::new(
        SimPin::new("lamp 1"),
        SimPin::new("lamp 2"),
        SimPin::new("lamp 3"),
    );
    let mut hw = HardwareAdapter::new(button, sensor, heater, lamps, ConsoleStrip::default());
    let mut sink = LogEventSink::new();

    let mut app = AppService::new(
        config.clone(),
        PidController::from_config(&config),
        SeededRng::new(0x4845_4154),
    )?;
    app.start(&mut hw, &mut sink)?;
    info!("Scenario '{}' running to {} ms", scenario.name, scenario.end_ms);

    loop {
        time.set(clock.now_ms());
        app.poll(clock, &mut hw, &mut sink);
        if clock.now_ms() >= scenario.end_ms {
            break;
        }
        advance();
    }

    let t = app.build_telemetry();
    info!(
        "Scenario '{}' done after {} passes: mode={} heater={} lamps={:?} T={:?}",
        scenario.name,
        app.pass_count(),
        app.mode(),
        t.heater_duty,
        app.indicators().as_array(),
        t.temperature_c,
    );
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("╔══════════════════════════════════════╗");
    info!("║  Heatkeeper simulator v{}         ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let realtime = args.iter().any(|a| a == "--realtime");
    let name = args
        .iter()
        .find(|a| !a.starts_with("--"))
        .map_or("normal", String::as_str);
    let scenario = Scenario::named(name)?;

    if realtime {
        let clock = SystemClock::new();
        run_scenario(&scenario, &clock, &mut || {
            std::thread::sleep(Duration::from_millis(u64::from(STEP_MS)));
        })
    } else {
        let clock = SimClock::default();
        run_scenario(&scenario, &clock, &mut || clock.advance(STEP_MS))
    }
}
