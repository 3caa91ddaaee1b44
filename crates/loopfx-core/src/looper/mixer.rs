//! Loop mixer - two tracks behind a crossfader
//!
//! Both tracks always receive the live input. Whether a track actually keeps
//! it is decided by its own state and write gate, so an idle track can be
//! armed and recorded while the other one is audible.

use crate::types::{StereoSample, TrackId, NUM_TRACKS};

use super::track::LoopTrack;

/// Slowest accepted playback speed
pub const MIN_PLAYBACK_SPEED: f32 = 0.125;
/// Fastest accepted playback speed
pub const MAX_PLAYBACK_SPEED: f32 = 4.0;

/// Two loop tracks, a crossfade and a shared playback speed
///
/// Crossfade and speed are set once per control-rate tick; every frame of a
/// block sees the same values.
pub struct LoopMixer {
    tracks: [LoopTrack; NUM_TRACKS],
    /// 0.0 = all A, 1.0 = all B
    crossfade: f32,
    /// Read cursor advance per output frame, shared by both tracks
    playback_speed: f32,
}

impl LoopMixer {
    /// Create a mixer with two full-capacity tracks
    pub fn new() -> Self {
        Self::from_tracks([LoopTrack::new(), LoopTrack::new()])
    }

    /// Create a mixer around pre-built tracks (custom capacities)
    pub fn from_tracks(tracks: [LoopTrack; NUM_TRACKS]) -> Self {
        Self {
            tracks,
            crossfade: 0.0,
            playback_speed: 1.0,
        }
    }

    #[inline]
    pub fn track(&self, id: TrackId) -> &LoopTrack {
        &self.tracks[id.index()]
    }

    #[inline]
    pub fn track_mut(&mut self, id: TrackId) -> &mut LoopTrack {
        &mut self.tracks[id.index()]
    }

    pub fn tracks(&self) -> &[LoopTrack; NUM_TRACKS] {
        &self.tracks
    }

    pub fn crossfade(&self) -> f32 {
        self.crossfade
    }

    /// Set the crossfade, clamped to [0, 1]
    pub fn set_crossfade(&mut self, crossfade: f32) {
        if crossfade.is_finite() {
            self.crossfade = crossfade.clamp(0.0, 1.0);
        }
    }

    pub fn playback_speed(&self) -> f32 {
        self.playback_speed
    }

    /// Set the shared playback speed, clamped to a positive range
    pub fn set_playback_speed(&mut self, speed: f32) {
        if speed.is_finite() {
            self.playback_speed = speed.clamp(MIN_PLAYBACK_SPEED, MAX_PLAYBACK_SPEED);
        }
    }

    /// Process one frame: read both tracks, crossfade, then feed the input to both
    #[inline]
    pub fn process(&mut self, input: StereoSample) -> StereoSample {
        let speed = self.playback_speed;
        let [a, b] = &mut self.tracks;

        let out_a = a.read_sample(speed);
        let out_b = b.read_sample(speed);
        let out = out_a.lerp(out_b, self.crossfade);

        a.write(input);
        b.write(input);

        out
    }

    /// Return both tracks to Idle and the controls to their defaults
    pub fn reset(&mut self) {
        for track in &mut self.tracks {
            track.reset();
        }
        self.crossfade = 0.0;
        self.playback_speed = 1.0;
    }
}

impl Default for LoopMixer {
    fn default() -> Self {
        Self::new()
    }
}
