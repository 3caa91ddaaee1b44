//! Two-track looper
//!
//! - [`LoopTrack`]: one stereo loop buffer and its record/play/overdub state
//! - [`LoopMixer`]: both tracks behind a crossfader with a shared playback speed
//!
//! Everything here runs on the audio thread and never allocates after
//! construction.

mod mixer;
mod track;

pub use mixer::*;
pub use track::*;
