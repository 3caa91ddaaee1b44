//! Audio I/O for the effects unit
//!
//! A duplex CPAL stream pair:
//!
//! - **Input thread**: pushes captured frames into a lock-free ring
//! - **Output thread**: owns the [`AudioCallback`](crate::engine::AudioCallback)
//!   exclusively, pops capture frames and renders the effect output
//! - **Control thread**: sends transport commands through the lock-free queue
//!   and reads track status through relaxed atomics
//!
//! ```ignore
//! use loopfx_core::audio::{start_audio_system, AudioConfig};
//!
//! let controls = Arc::new(SharedControls::new());
//! let mut audio = start_audio_system(&AudioConfig::default(), Arc::clone(&controls))?;
//! audio.command_sender.send(EngineCommand::Transport { track: TrackId::A })?;
//! ```

mod backend;
mod config;
mod cpal_backend;
mod device;
mod error;

pub use backend::{start_audio_system, AudioHandle, AudioSystemResult};
pub use config::{
    AudioConfig, BufferSize, DeviceId, DEFAULT_BUFFER_SIZE, DEFAULT_SAMPLE_RATE, MAX_BUFFER_SIZE,
    MIN_BUFFER_SIZE,
};
pub use device::{
    find_device_by_id, get_devices, get_input_devices, get_output_devices, open_device,
    AudioDevice, Direction,
};
pub use error::{AudioError, AudioResult};
