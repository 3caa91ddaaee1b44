//! Parameter arbiter - last writer wins between the knobs and MIDI
//!
//! Every continuous parameter keeps two candidates, one per source. Each
//! candidate is a value plus the timestamp of its last update, packed into a
//! single `AtomicU64` so a reader can never pair a new value with an old
//! timestamp (or the reverse).
//!
//! ```text
//!   63                32 31                 0
//!  ┌────────────────────┬────────────────────┐
//!  │  timestamp (u32)   │  f32 value bits    │
//!  └────────────────────┴────────────────────┘
//! ```
//!
//! Resolution is recomputed on every call, nothing is cached. Timestamp 0
//! means "never written": MIDI only takes over once it has a non-zero
//! timestamp that is strictly newer than the manual one, so at boot (both 0)
//! the manual candidate wins.

use std::sync::atomic::{AtomicU64, Ordering};

use super::clock::Timestamp;
use crate::looper::{MAX_PLAYBACK_SPEED, MIN_PLAYBACK_SPEED};
use crate::types::{MAX_DELAY_SAMPLES, SAMPLE_RATE};

/// Longest delay time reachable from the knob, in milliseconds (2500ms)
pub const MAX_DELAY_MS: f32 = MAX_DELAY_SAMPLES as f32 / SAMPLE_RATE as f32 * 1000.0;

/// Continuous parameters governed by the arbiter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum Param {
    /// Reverb dry/wet balance (0.0 = dry)
    DryWet = 0,
    /// Reverb tail feedback / delay feedback
    Feedback = 1,
    /// Delay time in milliseconds
    DelayMs = 2,
    /// Looper crossfade (0.0 = track A)
    Crossfade = 3,
    /// Looper playback speed multiplier
    PlaybackSpeed = 4,
}

impl Param {
    pub const COUNT: usize = 5;

    pub const ALL: [Param; Param::COUNT] = [
        Param::DryWet,
        Param::Feedback,
        Param::DelayMs,
        Param::Crossfade,
        Param::PlaybackSpeed,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Param::DryWet => "dry/wet",
            Param::Feedback => "feedback",
            Param::DelayMs => "delay",
            Param::Crossfade => "crossfade",
            Param::PlaybackSpeed => "speed",
        }
    }

    /// Value at power-on, before either source has written
    pub fn default_value(self) -> f32 {
        match self {
            Param::DryWet => 0.5,
            Param::Feedback => 0.5,
            Param::DelayMs => 750.0,
            Param::Crossfade => 0.0,
            Param::PlaybackSpeed => 1.0,
        }
    }

    /// Inclusive value range
    pub fn range(self) -> (f32, f32) {
        match self {
            Param::DelayMs => (0.0, MAX_DELAY_MS),
            Param::PlaybackSpeed => (MIN_PLAYBACK_SPEED, MAX_PLAYBACK_SPEED),
            _ => (0.0, 1.0),
        }
    }

    #[inline]
    pub fn clamp(self, value: f32) -> f32 {
        let (min, max) = self.range();
        value.clamp(min, max)
    }
}

/// Which source a resolved value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Manual,
    Midi,
}

/// One source's candidate: value and timestamp updated as a unit
struct Candidate(AtomicU64);

impl Candidate {
    fn new(value: f32) -> Self {
        Self(AtomicU64::new(Self::pack(value, 0)))
    }

    #[inline]
    fn pack(value: f32, stamp: Timestamp) -> u64 {
        ((stamp as u64) << 32) | value.to_bits() as u64
    }

    #[inline]
    fn store(&self, value: f32, stamp: Timestamp) {
        self.0.store(Self::pack(value, stamp), Ordering::Release);
    }

    #[inline]
    fn load(&self) -> (f32, Timestamp) {
        let packed = self.0.load(Ordering::Acquire);
        (f32::from_bits(packed as u32), (packed >> 32) as Timestamp)
    }
}

/// Lock-free store of manual and MIDI candidates for every [`Param`]
///
/// Writers (control thread, MIDI bridge) and the reader (audio thread) never
/// block each other.
pub struct ParameterArbiter {
    manual: [Candidate; Param::COUNT],
    midi: [Candidate; Param::COUNT],
}

impl ParameterArbiter {
    /// Both sources start at the parameter defaults with timestamp 0
    pub fn new() -> Self {
        Self {
            manual: Param::ALL.map(|p| Candidate::new(p.default_value())),
            midi: Param::ALL.map(|p| Candidate::new(p.default_value())),
        }
    }

    /// Record a knob update
    ///
    /// Non-finite values are ignored, others are clamped to the parameter range.
    pub fn record_manual(&self, param: Param, value: f32, now: Timestamp) {
        if value.is_finite() {
            self.manual[param as usize].store(param.clamp(value), now);
        }
    }

    /// Record a MIDI update
    pub fn record_midi(&self, param: Param, value: f32, now: Timestamp) {
        if value.is_finite() {
            self.midi[param as usize].store(param.clamp(value), now);
        }
    }

    /// Current value of `param`: the fresher of the two candidates
    #[inline]
    pub fn resolve(&self, param: Param) -> f32 {
        self.resolve_with_source(param).0
    }

    /// Like [`resolve`](Self::resolve), also reporting which source won
    #[inline]
    pub fn resolve_with_source(&self, param: Param) -> (f32, Source) {
        let (manual_value, manual_stamp) = self.manual[param as usize].load();
        let (midi_value, midi_stamp) = self.midi[param as usize].load();

        if midi_stamp != 0 && midi_stamp > manual_stamp {
            (midi_value, Source::Midi)
        } else {
            (manual_value, Source::Manual)
        }
    }

    /// Raw manual candidate (value, timestamp)
    pub fn manual(&self, param: Param) -> (f32, Timestamp) {
        self.manual[param as usize].load()
    }

    /// Raw MIDI candidate (value, timestamp)
    pub fn midi(&self, param: Param) -> (f32, Timestamp) {
        self.midi[param as usize].load()
    }
}

impl Default for ParameterArbiter {
    fn default() -> Self {
        Self::new()
    }
}
