//! Mode controller - Reverb → Delay → Loop, cycling in both directions
//!
//! The mode lives in a single `AtomicU8` so the audio thread can read it once
//! per block without locking. It is changed only by the encoder or the MIDI
//! mode-change CC.
//!
//! The controller also routes surface input to what it means in the current
//! mode:
//!
//! | Mode   | Knob 1                     | Knob 2    | Buttons                 |
//! |--------|----------------------------|-----------|-------------------------|
//! | Reverb | dry/wet                    | feedback  | -                       |
//! | Delay  | delay = (1 - k) × 2500 ms  | feedback  | -                       |
//! | Loop   | speed = 0.5 + k            | crossfade | transport of track A/B  |
//!
//! Mode changes come from the encoder only; both buttons stay reserved for
//! per-track transport.

use std::sync::atomic::{AtomicU8, Ordering};

use super::arbiter::{Param, MAX_DELAY_MS};
use crate::engine::EngineCommand;
use crate::types::TrackId;

/// Operating mode of the unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Mode {
    #[default]
    Reverb = 0,
    Delay = 1,
    Loop = 2,
}

impl From<u8> for Mode {
    fn from(value: u8) -> Self {
        match value % Mode::COUNT as u8 {
            1 => Mode::Delay,
            2 => Mode::Loop,
            _ => Mode::Reverb,
        }
    }
}

impl Mode {
    pub const COUNT: usize = 3;

    pub const ALL: [Mode; Mode::COUNT] = [Mode::Reverb, Mode::Delay, Mode::Loop];

    /// Move `delta` steps around the cycle, wrapping both ways
    pub fn step(self, delta: i32) -> Mode {
        let count = Mode::COUNT as i32;
        let index = (self as i32 + delta.rem_euclid(count)) % count;
        Mode::from(index as u8)
    }

    pub fn name(self) -> &'static str {
        match self {
            Mode::Reverb => "Reverb",
            Mode::Delay => "Delay",
            Mode::Loop => "Loop",
        }
    }

    /// Parameters the audio thread resolves while this mode is active
    pub fn params(self) -> &'static [Param] {
        match self {
            Mode::Reverb => &[Param::DryWet, Param::Feedback],
            Mode::Delay => &[Param::Feedback, Param::DelayMs],
            Mode::Loop => &[Param::Crossfade, Param::PlaybackSpeed],
        }
    }
}

/// Physical knobs on the surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum Knob {
    One = 0,
    Two = 1,
}

impl Knob {
    pub const ALL: [Knob; 2] = [Knob::One, Knob::Two];
}

/// Physical buttons on the surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum Button {
    One = 0,
    Two = 1,
}

impl Button {
    pub const ALL: [Button; 2] = [Button::One, Button::Two];

    /// Loop track driven by this button
    pub fn track(self) -> TrackId {
        match self {
            Button::One => TrackId::A,
            Button::Two => TrackId::B,
        }
    }
}

/// Step requested by a mode-change CC value
///
/// Below 63 steps back, above 64 steps forward, 63 and 64 are a dead band.
#[inline]
pub fn mode_cc_step(value: u8) -> i32 {
    if value < 63 {
        -1
    } else if value > 64 {
        1
    } else {
        0
    }
}

/// Map a knob reading in [0, 1] to the parameter it drives in `mode`
pub fn knob_target(mode: Mode, knob: Knob, reading: f32) -> (Param, f32) {
    let k = reading.clamp(0.0, 1.0);
    match (mode, knob) {
        (Mode::Reverb, Knob::One) => (Param::DryWet, k),
        (Mode::Delay, Knob::One) => (Param::DelayMs, (1.0 - k) * MAX_DELAY_MS),
        (Mode::Loop, Knob::One) => (Param::PlaybackSpeed, 0.5 + k),
        (Mode::Reverb | Mode::Delay, Knob::Two) => (Param::Feedback, k),
        (Mode::Loop, Knob::Two) => (Param::Crossfade, k),
    }
}

/// Shared, lock-free mode state
pub struct ModeController {
    mode: AtomicU8,
}

impl ModeController {
    pub fn new(initial: Mode) -> Self {
        Self {
            mode: AtomicU8::new(initial as u8),
        }
    }

    #[inline]
    pub fn mode(&self) -> Mode {
        Mode::from(self.mode.load(Ordering::Acquire))
    }

    pub fn set_mode(&self, mode: Mode) {
        self.mode.store(mode as u8, Ordering::Release);
    }

    /// Apply an encoder increment; returns the new mode
    pub fn step(&self, delta: i32) -> Mode {
        if delta == 0 {
            return self.mode();
        }
        let previous = self
            .mode
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |raw| {
                Some(Mode::from(raw).step(delta) as u8)
            })
            .unwrap_or_else(|raw| raw);
        Mode::from(previous).step(delta)
    }

    /// Apply a MIDI mode-change CC value; returns the new mode
    pub fn apply_mode_cc(&self, value: u8) -> Mode {
        self.step(mode_cc_step(value))
    }

    /// Parameter and value a knob reading drives in the current mode
    pub fn route_knob(&self, knob: Knob, reading: f32) -> (Param, f32) {
        knob_target(self.mode(), knob, reading)
    }

    /// Transport command for a button press, only meaningful in Loop mode
    pub fn route_button(&self, button: Button) -> Option<EngineCommand> {
        match self.mode() {
            Mode::Loop => Some(EngineCommand::Transport {
                track: button.track(),
            }),
            Mode::Reverb | Mode::Delay => None,
        }
    }
}

impl Default for ModeController {
    fn default() -> Self {
        Self::new(Mode::Reverb)
    }
}
