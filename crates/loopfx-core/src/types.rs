//! Common types for loopfx
//!
//! Fundamental audio types and the fixed capacities shared by the looper,
//! the delay line and the audio callback.

/// Nominal sample rate of the unit (48kHz)
///
/// Buffer capacities are sized against this rate. The actual device rate is
/// negotiated at stream start and handed to the engine.
pub const SAMPLE_RATE: u32 = 48000;

/// Frames processed between two control-rate updates inside the audio callback
pub const BLOCK_SIZE: usize = 4;

/// Number of loop tracks (A and B)
pub const NUM_TRACKS: usize = 2;

/// Loop track capacity per channel: 10 seconds at [`SAMPLE_RATE`]
pub const MAX_LOOP_SAMPLES: usize = SAMPLE_RATE as usize * 10;

/// Delay line capacity per channel: 2.5 seconds at [`SAMPLE_RATE`]
pub const MAX_DELAY_SAMPLES: usize = SAMPLE_RATE as usize * 5 / 2;

/// Audio sample type
pub type Sample = f32;

/// Loop track identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum TrackId {
    A = 0,
    B = 1,
}

impl TrackId {
    /// Both tracks in mixer order
    pub const ALL: [TrackId; NUM_TRACKS] = [TrackId::A, TrackId::B];

    /// Convert from index (0-1) to TrackId
    pub fn from_index(idx: usize) -> Option<Self> {
        match idx {
            0 => Some(TrackId::A),
            1 => Some(TrackId::B),
            _ => None,
        }
    }

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            TrackId::A => "A",
            TrackId::B => "B",
        }
    }
}

/// A single stereo sample (left and right channels)
///
/// Uses `#[repr(C)]` to ensure predictable memory layout: [left, right].
/// Interleaved stereo `&[f32]` can be viewed as `&[StereoSample]` with
/// bytemuck without copying.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct StereoSample {
    pub left: Sample,
    pub right: Sample,
}

impl StereoSample {
    #[inline]
    pub fn new(left: Sample, right: Sample) -> Self {
        Self { left, right }
    }

    #[inline]
    pub fn silence() -> Self {
        Self::default()
    }

    /// Same value in both channels
    #[inline]
    pub fn mono(value: Sample) -> Self {
        Self { left: value, right: value }
    }

    /// Linear blend: `self * (1 - t) + other * t`
    #[inline]
    pub fn lerp(self, other: Self, t: Sample) -> Self {
        self * (1.0 - t) + other * t
    }
}

impl std::ops::Add for StereoSample {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Self {
            left: self.left + other.left,
            right: self.right + other.right,
        }
    }
}

impl std::ops::AddAssign for StereoSample {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.left += other.left;
        self.right += other.right;
    }
}

impl std::ops::Mul<Sample> for StereoSample {
    type Output = Self;

    #[inline]
    fn mul(self, factor: Sample) -> Self {
        Self {
            left: self.left * factor,
            right: self.right * factor,
        }
    }
}

/// View an interleaved stereo buffer `[L, R, L, R, ...]` as frames
///
/// A trailing odd sample is ignored.
#[inline]
pub fn as_frames(interleaved: &[Sample]) -> &[StereoSample] {
    let even = interleaved.len() & !1;
    bytemuck::cast_slice(&interleaved[..even])
}

/// Mutable variant of [`as_frames`]
#[inline]
pub fn as_frames_mut(interleaved: &mut [Sample]) -> &mut [StereoSample] {
    let even = interleaved.len() & !1;
    bytemuck::cast_slice_mut(&mut interleaved[..even])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacities() {
        assert_eq!(MAX_LOOP_SAMPLES, 480_000);
        assert_eq!(MAX_DELAY_SAMPLES, 120_000);
    }

    #[test]
    fn test_track_id_roundtrip() {
        for track in TrackId::ALL {
            assert_eq!(TrackId::from_index(track.index()), Some(track));
        }
        assert_eq!(TrackId::from_index(2), None);
    }

    #[test]
    fn test_lerp() {
        let a = StereoSample::mono(1.0);
        let b = StereoSample::mono(-1.0);
        let mixed = a.lerp(b, 0.25);
        assert!((mixed.left - 0.5).abs() < 1e-6);
        assert!((mixed.right - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_interleaved_view() {
        let mut data = [0.1, 0.2, 0.3, 0.4, 0.5];
        let frames = as_frames(&data);
        assert_eq!(frames.len(), 2, "odd trailing sample is dropped");
        assert_eq!(frames[1], StereoSample::new(0.3, 0.4));

        as_frames_mut(&mut data)[0] = StereoSample::new(1.0, -1.0);
        assert_eq!(data[0], 1.0);
        assert_eq!(data[1], -1.0);
    }
}
