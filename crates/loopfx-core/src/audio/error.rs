//! Audio backend error types

use thiserror::Error;

/// Why the capture or playback side could not be opened
#[derive(Error, Debug)]
pub enum AudioError {
    /// Nothing to open in this direction on any host
    #[error("No audio {0} devices found")]
    NoDevices(&'static str),

    #[error("No default audio {0} device")]
    NoDefaultDevice(&'static str),

    /// A configured device is not present
    #[error("Audio device not found: {0}")]
    DeviceNotFound(String),

    #[error("Could not query device configurations: {0}")]
    SupportedConfigs(#[from] cpal::SupportedStreamConfigsError),

    /// The device offers no configuration the unit can run with
    #[error("No usable {direction} configuration: {reason}")]
    NoUsableConfig {
        direction: &'static str,
        reason: &'static str,
    },

    #[error("Failed to build audio stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("Failed to start audio stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    /// Capture and playback must share one clock rate
    #[error("Input runs at {input}Hz but output at {output}Hz")]
    SampleRateMismatch { input: u32, output: u32 },
}

/// Result type for audio operations
pub type AudioResult<T> = Result<T, AudioError>;
