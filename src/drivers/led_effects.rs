//! Visual feedback engine for the addressable status pixel.
//!
//! Each call to [`EffectEngine::render`] produces one frame for the active
//! effect and the number of milliseconds to wait before the next call.
//! The scheduler stores that delay, so effects pace themselves.
//!
//! ## Effects
//!
//! | Effect        | Description                               | Next delay  |
//! |---------------|-------------------------------------------|-------------|
//! | SleepBreathe  | Triangle cross-fade green ⇄ blue, ±1/tick | 50 ms       |
//! | ConfigGreen   | Solid green                               | 200 ms      |
//! | ConfigYellow  | Solid yellow                              | 200 ms      |
//! | ConfigRed     | Solid red                                 | 200 ms      |
//! | WorkingFlame  | Random warm colour                        | 30–149 ms   |
//! | FaultBlink    | Red on/off toggle                         | 300 ms      |
//!
//! The breathe level and blink phase are plain fields on the engine, so
//! the engine can be built, reset, and tested on its own.

use core::ops::Range;

use crate::app::ports::RandomSource;
use crate::fsm::{DurationSelection, OperatingMode};

/// Colour as (R, G, B) tuple, each 0–255.
pub type Rgb = (u8, u8, u8);

pub const COLOUR_OFF: Rgb = (0, 0, 0);
pub const COLOUR_GREEN: Rgb = (0, 255, 0);
pub const COLOUR_YELLOW: Rgb = (255, 255, 0);
pub const COLOUR_RED: Rgb = (255, 0, 0);

const BREATHE_DELAY_MS: u32 = 50;
const STATIC_DELAY_MS: u32 = 200;
const BLINK_DELAY_MS: u32 = 300;

// Half-open ranges.
const FLAME_RED: Range<u32> = 200..255;
const FLAME_GREEN: Range<u32> = 50..151;
const FLAME_BLUE: Range<u32> = 0..51;
const FLAME_DELAY_MS: Range<u32> = 30..150;

/// Effect identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisualEffect {
    SleepBreathe,
    ConfigGreen,
    ConfigYellow,
    ConfigRed,
    WorkingFlame,
    FaultBlink,
}

impl VisualEffect {
    /// Pure projection of the operating mode onto an effect.
    pub fn for_mode(mode: OperatingMode) -> Self {
        match mode {
            OperatingMode::Sleep | OperatingMode::Disabling => Self::SleepBreathe,
            OperatingMode::ConfigureDuration(DurationSelection::Short) => Self::ConfigGreen,
            OperatingMode::ConfigureDuration(DurationSelection::Medium) => Self::ConfigYellow,
            OperatingMode::ConfigureDuration(DurationSelection::Long) => Self::ConfigRed,
            OperatingMode::Working { .. } => Self::WorkingFlame,
            OperatingMode::Faulted => Self::FaultBlink,
        }
    }
}

/// One rendered frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub colour: Rgb,
    pub next_delay_ms: u32,
}

/// Breathe ramp position and direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BreatheState {
    level: u8,
    rising: bool,
}

impl BreatheState {
    const START: Self = Self {
        level: 0,
        rising: true,
    };

    fn step(&mut self) -> u8 {
        if self.rising {
            self.level = self.level.saturating_add(1);
            if self.level == u8::MAX {
                self.rising = false;
            }
        } else {
            self.level = self.level.saturating_sub(1);
            if self.level == 0 {
                self.rising = true;
            }
        }
        self.level
    }
}

/// Visual feedback engine.  Stack-allocated, no heap.
pub struct EffectEngine<G> {
    rng: G,
    breathe: BreatheState,
    blink_lit: bool,
}

impl<G: RandomSource> EffectEngine<G> {
    pub fn new(rng: G) -> Self {
        Self {
            rng,
            breathe: BreatheState::START,
            blink_lit: true,
        }
    }

    /// Return every effect to its initial sub-state.
    pub fn reset(&mut self) {
        self.breathe = BreatheState::START;
        self.blink_lit = true;
    }

    /// Advance `effect` by one tick.
    pub fn render(&mut self, effect: VisualEffect) -> Frame {
        match effect {
            VisualEffect::SleepBreathe => {
                let level = self.breathe.step();
                Frame {
                    colour: (0, level, u8::MAX - level),
                    next_delay_ms: BREATHE_DELAY_MS,
                }
            }
            VisualEffect::ConfigGreen => Self::solid(COLOUR_GREEN),
            VisualEffect::ConfigYellow => Self::solid(COLOUR_YELLOW),
            VisualEffect::ConfigRed => Self::solid(COLOUR_RED),
            VisualEffect::WorkingFlame => {
                let r = self.rng.next_in(FLAME_RED) as u8;
                let g = self.rng.next_in(FLAME_GREEN) as u8;
                let b = self.rng.next_in(FLAME_BLUE) as u8;
                Frame {
                    colour: (r, g, b),
                    next_delay_ms: self.rng.next_in(FLAME_DELAY_MS),
                }
            }
            VisualEffect::FaultBlink => {
                let colour = if self.blink_lit { COLOUR_RED } else { COLOUR_OFF };
                self.blink_lit = !self.blink_lit;
                Frame {
                    colour,
                    next_delay_ms: BLINK_DELAY_MS,
                }
            }
        }
    }

    fn solid(colour: Rgb) -> Frame {
        Frame {
            colour,
            next_delay_ms: STATIC_DELAY_MS,
        }
    }
}
