//! Value scaling between MIDI's 0-127 and parameter ranges

use crate::config::EncoderMode;

/// Delay time at CC value 0, in milliseconds
pub const DELAY_CC_MIN_MS: f32 = 10.0;
/// Delay span covered by the full CC range, in milliseconds
pub const DELAY_CC_SPAN_MS: f32 = 2490.0;

/// Target value range for a control
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlRange {
    /// 0.0 to 1.0
    Unit,
    Custom { min: f32, max: f32 },
}

impl ControlRange {
    pub fn min(&self) -> f32 {
        match self {
            Self::Unit => 0.0,
            Self::Custom { min, .. } => *min,
        }
    }

    pub fn max(&self) -> f32 {
        match self {
            Self::Unit => 1.0,
            Self::Custom { max, .. } => *max,
        }
    }
}

/// Map a CC value (0-127) linearly onto `range`
pub fn normalize_cc_value(midi_value: u8, range: ControlRange) -> f32 {
    let normalized = midi_value.min(127) as f32 / 127.0;
    range.min() + normalized * (range.max() - range.min())
}

/// Delay time for a CC value: 10ms at 0, 2500ms at 127
pub fn cc_to_delay_ms(midi_value: u8) -> f32 {
    normalize_cc_value(
        midi_value,
        ControlRange::Custom {
            min: DELAY_CC_MIN_MS,
            max: DELAY_CC_MIN_MS + DELAY_CC_SPAN_MS,
        },
    )
}

/// Encoder detents encoded in a relative CC value
///
/// Absolute encoders have no meaningful delta in a single value; the
/// caller diffs consecutive values instead (see [`absolute_delta`]).
pub fn encoder_to_delta(midi_value: u8, mode: EncoderMode) -> i32 {
    match mode {
        EncoderMode::Absolute => 0,
        EncoderMode::Relative => match midi_value {
            1..=63 => midi_value as i32,
            65..=127 => -((midi_value as i32) - 64),
            _ => 0,
        },
        EncoderMode::RelativeSigned => (midi_value as i32) - 64,
    }
}

/// Delta between two absolute encoder values, unwrapped across 127 → 0
pub fn absolute_delta(previous: u8, current: u8) -> i32 {
    let diff = current as i32 - previous as i32;
    if diff > 64 {
        diff - 128
    } else if diff < -64 {
        diff + 128
    } else {
        diff
    }
}

/// Map a value in `range` back to 0-127 (for LED output)
pub fn denormalize_to_midi(value: f32, range: ControlRange) -> u8 {
    let (min, max) = (range.min(), range.max());
    if !value.is_finite() || max <= min {
        return 0;
    }
    let normalized = (value.clamp(min, max) - min) / (max - min);
    (normalized * 127.0).round() as u8
}
