//! Audio backend configuration
//!
//! Device selection, buffer size and sample rate for the duplex stream.

use serde::{Deserialize, Serialize};

use crate::types::SAMPLE_RATE;

/// Largest host buffer handled in one pass (frames)
///
/// Scratch buffers are pre-allocated to this size; larger host buffers are
/// processed in several passes.
pub const MAX_BUFFER_SIZE: usize = 8192;

/// Default host buffer size (frames)
///
/// 128 frames @ 48kHz = ~2.7ms
pub const DEFAULT_BUFFER_SIZE: u32 = 128;

/// Smallest buffer requested from the host (frames)
pub const MIN_BUFFER_SIZE: u32 = 32;

/// Default sample rate for the audio system (48kHz)
pub const DEFAULT_SAMPLE_RATE: u32 = SAMPLE_RATE;

/// Preferred buffer size for audio streams
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BufferSize {
    /// `DEFAULT_BUFFER_SIZE` frames
    #[default]
    Default,
    /// Request a specific buffer size in frames (clamped to sane bounds)
    Fixed(u32),
}

impl BufferSize {
    /// Buffer size in frames to request from the host
    pub fn as_frames(&self) -> u32 {
        match self {
            BufferSize::Default => DEFAULT_BUFFER_SIZE,
            BufferSize::Fixed(frames) => (*frames).clamp(MIN_BUFFER_SIZE, MAX_BUFFER_SIZE as u32),
        }
    }

    /// Latency in milliseconds for a given sample rate
    pub fn latency_ms(&self, sample_rate: u32) -> f32 {
        (self.as_frames() as f32 / sample_rate.max(1) as f32) * 1000.0
    }
}

/// Audio device identifier
///
/// Includes both the device name and the host backend (ALSA, CoreAudio, ...)
/// so a device can be picked from a non-default host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceId {
    /// Device name as reported by the system
    pub name: String,
    /// Audio host identifier; None searches every host
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
}

impl DeviceId {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            host: None,
        }
    }

    pub fn with_host(name: &str, host: &str) -> Self {
        Self {
            name: name.to_string(),
            host: Some(host.to_string()),
        }
    }

    /// Display label that includes the host if known
    pub fn display_label(&self) -> String {
        match &self.host {
            Some(host) => format!("[{}] {}", host, self.name),
            None => self.name.clone(),
        }
    }
}

/// Configuration for the duplex audio stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Capture device (None = system default)
    pub input_device: Option<DeviceId>,
    /// Playback device (None = system default)
    pub output_device: Option<DeviceId>,
    /// Run without capture; the effects then process silence
    pub disable_input: bool,
    /// Preferred buffer size
    pub buffer_size: BufferSize,
    /// Preferred sample rate (None = 48kHz)
    pub sample_rate: Option<u32>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            input_device: None,
            output_device: None,
            disable_input: false,
            buffer_size: BufferSize::default(),
            sample_rate: None,
        }
    }
}

impl AudioConfig {
    pub fn with_input_device(mut self, device: DeviceId) -> Self {
        self.input_device = Some(device);
        self
    }

    pub fn with_output_device(mut self, device: DeviceId) -> Self {
        self.output_device = Some(device);
        self
    }

    /// Set a fixed buffer size in frames
    pub fn with_buffer_frames(mut self, frames: u32) -> Self {
        self.buffer_size = BufferSize::Fixed(frames);
        self
    }

    pub fn with_sample_rate(mut self, rate: u32) -> Self {
        self.sample_rate = Some(rate);
        self
    }

    /// Sample rate to ask the devices for
    pub fn target_sample_rate(&self) -> u32 {
        self.sample_rate.unwrap_or(DEFAULT_SAMPLE_RATE)
    }
}
