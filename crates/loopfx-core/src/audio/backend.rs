//! Audio system entry point
//!
//! The backend owns the engine on the audio thread and hands the caller the
//! command sender plus stream facts. The shared control store stays with the
//! caller, who created it.

use super::cpal_backend::CpalAudioHandle;

/// Handle to the running streams (drop to stop audio)
pub type AudioHandle = CpalAudioHandle;

pub use super::cpal_backend::start_audio_system;

/// Result of starting the audio system
pub struct AudioSystemResult {
    /// Handle to keep audio alive (drop to stop)
    pub handle: AudioHandle,
    /// Transport command sender for the control thread (lock-free)
    pub command_sender: crate::engine::CommandSender,
    /// Sample rate of the audio system
    pub sample_rate: u32,
    /// Buffer size in frames
    pub buffer_size: u32,
    /// Audio latency in milliseconds (one-way, output only)
    pub latency_ms: f32,
}
