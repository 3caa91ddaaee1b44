//! Effect primitives
//!
//! The reverb is driven through the [`StereoEffect`] trait so the engine only
//! depends on the per-sample contract. The delay line is a plain primitive;
//! the delay *mode* (feedback routing, time smoothing) lives in the engine.

pub mod native;

pub use native::{DelayLine, Reverb};

use crate::types::StereoSample;

/// A stateful stereo processor with a feedback control
pub trait StereoEffect: Send {
    /// Process one frame and return the wet signal
    fn process(&mut self, input: StereoSample) -> StereoSample;

    /// Set the feedback / decay amount (0.0-1.0)
    fn set_feedback(&mut self, feedback: f32);

    /// Clear all internal state
    fn reset(&mut self);

    /// Display name
    fn name(&self) -> &str;
}
