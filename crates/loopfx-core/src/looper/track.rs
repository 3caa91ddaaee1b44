//! Loop track - one stereo loop buffer with its own transport state machine
//!
//! ```text
//!            start_recording            stop_recording
//!   Idle ─────────────────► Recording ─────────────────► Playing ◄──┐
//!                              ▲                            │        │ toggle_overdub
//!                              │ start_recording            ▼        │
//!                              └──────────────────────  Overdubbing ─┘
//! ```
//!
//! The buffer is allocated once at construction and never resized. Re-recording
//! does not clear it: old content past the new length is simply never read,
//! because the read cursor always stays inside `[0, length)`.

use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

use crate::types::{StereoSample, MAX_LOOP_SAMPLES};

/// Transport state of a loop track
///
/// Only the playing states carry a read cursor and a length; a recording track
/// only needs its write cursor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrackState {
    /// Nothing recorded, output is silence
    Idle,
    /// Capturing input at `write_cursor`, output is silence
    Recording { write_cursor: usize },
    /// Looping `length` frames
    Playing { length: usize, read_cursor: f64 },
    /// Looping while blending input into the loop at the read position
    Overdubbing { length: usize, read_cursor: f64 },
}

/// Flat transport status, published to the control thread via atomics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum TrackStatus {
    #[default]
    Idle = 0,
    Recording = 1,
    Playing = 2,
    Overdubbing = 3,
}

impl From<u8> for TrackStatus {
    fn from(value: u8) -> Self {
        match value {
            1 => TrackStatus::Recording,
            2 => TrackStatus::Playing,
            3 => TrackStatus::Overdubbing,
            _ => TrackStatus::Idle,
        }
    }
}

impl TrackState {
    pub fn status(&self) -> TrackStatus {
        match self {
            TrackState::Idle => TrackStatus::Idle,
            TrackState::Recording { .. } => TrackStatus::Recording,
            TrackState::Playing { .. } => TrackStatus::Playing,
            TrackState::Overdubbing { .. } => TrackStatus::Overdubbing,
        }
    }

    /// Number of valid loop frames (0 while idle or recording)
    pub fn length(&self) -> usize {
        match *self {
            TrackState::Playing { length, .. } | TrackState::Overdubbing { length, .. } => length,
            _ => 0,
        }
    }
}

/// A single loop track
///
/// Owns its left/right buffers exclusively. Transport transitions return
/// `true` when they changed the state and `false` when they were not valid
/// from the current state.
pub struct LoopTrack {
    left: Box<[f32]>,
    right: Box<[f32]>,
    state: TrackState,
    /// Output gain applied after interpolation
    gain: f32,
    /// External gate for all buffer writes
    write_enabled: bool,
}

impl LoopTrack {
    /// Create a track with the standard 10 second capacity
    pub fn new() -> Self {
        Self::with_capacity(MAX_LOOP_SAMPLES)
    }

    /// Create a track with a custom capacity (frames per channel)
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            left: vec![0.0; capacity].into_boxed_slice(),
            right: vec![0.0; capacity].into_boxed_slice(),
            state: TrackState::Idle,
            gain: 1.0,
            write_enabled: true,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.left.len()
    }

    #[inline]
    pub fn state(&self) -> TrackState {
        self.state
    }

    #[inline]
    pub fn status(&self) -> TrackStatus {
        self.state.status()
    }

    #[inline]
    pub fn length(&self) -> usize {
        self.state.length()
    }

    /// Frames captured so far while recording
    pub fn recorded_frames(&self) -> usize {
        match self.state {
            TrackState::Recording { write_cursor } => write_cursor,
            _ => 0,
        }
    }

    /// Current read position (0.0 unless playing or overdubbing)
    pub fn read_cursor(&self) -> f64 {
        match self.state {
            TrackState::Playing { read_cursor, .. }
            | TrackState::Overdubbing { read_cursor, .. } => read_cursor,
            _ => 0.0,
        }
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }

    pub fn set_gain(&mut self, gain: f32) {
        if gain.is_finite() {
            self.gain = gain.max(0.0);
        }
    }

    pub fn write_enabled(&self) -> bool {
        self.write_enabled
    }

    pub fn set_write_enabled(&mut self, enabled: bool) {
        self.write_enabled = enabled;
    }

    // ─────────────────────────────────────────────────────────────
    // Transport
    // ─────────────────────────────────────────────────────────────

    /// Begin (re-)recording from the start of the buffer
    ///
    /// Valid from Idle, Playing and Overdubbing. The buffer keeps its old
    /// content until it is overwritten.
    pub fn start_recording(&mut self) -> bool {
        match self.state {
            TrackState::Recording { .. } => false,
            _ => {
                self.state = TrackState::Recording { write_cursor: 0 };
                true
            }
        }
    }

    /// Close the recording; the loop length becomes the number of frames captured
    ///
    /// A zero-length recording leaves the track playing silence until it is
    /// recorded again.
    pub fn stop_recording(&mut self) -> bool {
        match self.state {
            TrackState::Recording { write_cursor } => {
                self.state = TrackState::Playing {
                    length: write_cursor,
                    read_cursor: 0.0,
                };
                true
            }
            _ => false,
        }
    }

    /// Playing ⇄ Overdubbing
    pub fn toggle_overdub(&mut self) -> bool {
        match self.state {
            TrackState::Playing { length, read_cursor } => {
                self.state = TrackState::Overdubbing { length, read_cursor };
                true
            }
            TrackState::Overdubbing { length, read_cursor } => {
                self.state = TrackState::Playing { length, read_cursor };
                true
            }
            _ => false,
        }
    }

    /// Single-button transport: Idle → record, Recording → play, otherwise
    /// toggle overdub
    pub fn advance_transport(&mut self) -> bool {
        match self.state {
            TrackState::Idle => self.start_recording(),
            TrackState::Recording { .. } => self.stop_recording(),
            TrackState::Playing { .. } | TrackState::Overdubbing { .. } => self.toggle_overdub(),
        }
    }

    /// Back to Idle; buffer content is left in place
    pub fn reset(&mut self) {
        self.state = TrackState::Idle;
    }

    // ─────────────────────────────────────────────────────────────
    // Audio rate
    // ─────────────────────────────────────────────────────────────

    /// Feed one input frame to the track
    ///
    /// - Recording: stored at the write cursor until capacity is reached,
    ///   further frames are dropped.
    /// - Overdubbing: averaged with the frame under the read cursor and
    ///   stored back in place.
    /// - Idle / Playing, or writes disabled: no effect.
    #[inline]
    pub fn write(&mut self, input: StereoSample) {
        if !self.write_enabled {
            return;
        }

        match &mut self.state {
            TrackState::Recording { write_cursor } => {
                let pos = *write_cursor;
                if pos < self.left.len() {
                    self.left[pos] = input.left;
                    self.right[pos] = input.right;
                    *write_cursor = pos + 1;
                }
            }
            TrackState::Overdubbing { length, read_cursor } if *length > 0 => {
                let pos = (*read_cursor as usize).min(*length - 1);
                self.left[pos] = 0.5 * (self.left[pos] + input.left);
                self.right[pos] = 0.5 * (self.right[pos] + input.right);
            }
            _ => {}
        }
    }

    /// Produce the next output frame and advance the read cursor by `speed`
    ///
    /// Silence while Idle, Recording, or with an empty loop. The cursor wraps
    /// by subtraction so it always stays in `[0, length)`.
    #[inline]
    pub fn read_sample(&mut self, speed: f32) -> StereoSample {
        let (length, read_cursor) = match &mut self.state {
            TrackState::Playing { length, read_cursor }
            | TrackState::Overdubbing { length, read_cursor } => (*length, read_cursor),
            _ => return StereoSample::silence(),
        };
        if length == 0 {
            return StereoSample::silence();
        }

        let idx1 = (*read_cursor as usize).min(length - 1);
        let idx2 = if idx1 + 1 >= length { 0 } else { idx1 + 1 };
        let frac = (*read_cursor - idx1 as f64) as f32;

        let out = StereoSample::new(
            self.left[idx1] * (1.0 - frac) + self.left[idx2] * frac,
            self.right[idx1] * (1.0 - frac) + self.right[idx2] * frac,
        ) * self.gain;

        let len = length as f64;
        *read_cursor += speed as f64;
        while *read_cursor >= len {
            *read_cursor -= len;
        }

        out
    }
}

impl Default for LoopTrack {
    fn default() -> Self {
        Self::new()
    }
}

/// Lock-free track status for the control thread
///
/// The audio thread stores these once per block; the control thread reads
/// them for LED feedback. `Ordering::Relaxed` throughout, only visibility is
/// needed.
pub struct TrackAtomics {
    /// TrackStatus as u8
    pub status: AtomicU8,
    /// Loop length in frames (frames captured so far while recording)
    pub length: AtomicUsize,
}

impl TrackAtomics {
    pub fn new() -> Self {
        Self {
            status: AtomicU8::new(TrackStatus::Idle as u8),
            length: AtomicUsize::new(0),
        }
    }

    #[inline]
    pub fn status(&self) -> TrackStatus {
        TrackStatus::from(self.status.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn length(&self) -> usize {
        self.length.load(Ordering::Relaxed)
    }

    /// Publish a track's current state (audio thread)
    #[inline]
    pub fn sync_from(&self, track: &LoopTrack) {
        let length = match track.state() {
            TrackState::Recording { write_cursor } => write_cursor,
            state => state.length(),
        };
        self.status.store(track.status() as u8, Ordering::Relaxed);
        self.length.store(length, Ordering::Relaxed);
    }
}

impl Default for TrackAtomics {
    fn default() -> Self {
        Self::new()
    }
}
