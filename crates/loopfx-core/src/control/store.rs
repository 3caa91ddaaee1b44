//! Shared control store
//!
//! The one piece of state both execution contexts see. It is created by the
//! top-level driver and handed out as `Arc<SharedControls>`; every field is
//! atomic, so neither side ever takes a lock.

use super::arbiter::ParameterArbiter;
use super::clock::{ControlClock, Timestamp};
use super::mode::{Mode, ModeController};
use crate::looper::TrackAtomics;
use crate::types::{TrackId, NUM_TRACKS};

pub struct SharedControls {
    /// Manual / MIDI candidates for every continuous parameter
    pub arbiter: ParameterArbiter,
    /// Current operating mode
    pub mode: ModeController,
    /// Track status published by the audio thread
    pub tracks: [TrackAtomics; NUM_TRACKS],
    clock: ControlClock,
}

impl SharedControls {
    pub fn new() -> Self {
        Self::with_mode(Mode::default())
    }

    pub fn with_mode(mode: Mode) -> Self {
        Self {
            arbiter: ParameterArbiter::new(),
            mode: ModeController::new(mode),
            tracks: [TrackAtomics::new(), TrackAtomics::new()],
            clock: ControlClock::new(),
        }
    }

    /// Next freshness stamp for a parameter write
    #[inline]
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    #[inline]
    pub fn track(&self, id: TrackId) -> &TrackAtomics {
        &self.tracks[id.index()]
    }
}

impl Default for SharedControls {
    fn default() -> Self {
        Self::new()
    }
}
