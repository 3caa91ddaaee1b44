//! CPAL duplex backend
//!
//! ```text
//! ┌──────────────────┐  push()   ┌─────────────────────┐  pop()   ┌─────────────────────┐
//! │  Input Stream    │──────────►│  Input Frame Ring   │─────────►│   Output Stream     │
//! │ (capture thread) │           │  (lock-free SPSC)   │          │ (owns AudioCallback)│
//! └──────────────────┘           └─────────────────────┘          └──────────┬──────────┘
//!                                                                            │
//! ┌──────────────────┐  push()   ┌─────────────────────┐  pop()              │
//! │  Control Thread  │──────────►│   Command Queue     │─────────────────────┘
//! └──────────────────┘           └─────────────────────┘
//!          ▲                                                                 │
//!          │                Relaxed atomics (TrackAtomics)                   │
//!          └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The output callback owns the engine outright; nothing on either audio
//! thread takes a lock. Capture underruns are padded with silence and
//! overruns drop the newest frames.

use std::sync::Arc;

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{BufferSize as CpalBufferSize, SampleFormat, Stream, StreamConfig};

use super::backend::AudioSystemResult;
use super::config::{AudioConfig, MAX_BUFFER_SIZE};
use super::device::{open_device, Direction};
use super::error::{AudioError, AudioResult};
use crate::control::SharedControls;
use crate::engine::{command_channel, AudioCallback, CommandSender, FxEngine};
use crate::types::{as_frames_mut, StereoSample};

/// Input ring capacity in host buffers
const INPUT_RING_BUFFERS: usize = 4;

/// CPAL-specific audio handle
///
/// Keeps the streams alive. Drop this to stop audio.
pub struct CpalAudioHandle {
    _input_stream: Option<Stream>,
    _output_stream: Stream,
    sample_rate: u32,
    /// Actual buffer size in frames (as requested from the device)
    buffer_size: u32,
}

impl CpalAudioHandle {
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn buffer_size(&self) -> u32 {
        self.buffer_size
    }

    /// One-way output latency in milliseconds
    pub fn latency_ms(&self) -> f32 {
        (self.buffer_size as f32 / self.sample_rate as f32) * 1000.0
    }

    /// Whether a capture stream is running
    pub fn has_input(&self) -> bool {
        self._input_stream.is_some()
    }
}

/// Open the devices, build the streams and start processing
///
/// Without a usable capture device the unit still starts; the effects then
/// run on silence (loops already recorded keep playing).
pub fn start_audio_system(
    config: &AudioConfig,
    controls: Arc<SharedControls>,
) -> AudioResult<AudioSystemResult> {
    let output_device = open_device(config.output_device.as_ref(), Direction::Output)?;
    let (output_config, buffer_size) = get_stream_config(
        &output_device,
        Direction::Output,
        config.target_sample_rate(),
        config.buffer_size.as_frames(),
    )?;
    let sample_rate = output_config.sample_rate.0;

    let (input_tx, input_rx) =
        rtrb::RingBuffer::<StereoSample>::new(buffer_size as usize * INPUT_RING_BUFFERS);

    let input_stream = if config.disable_input {
        log::info!("Audio input disabled by configuration");
        None
    } else {
        match open_input(config, sample_rate, buffer_size, input_tx) {
            Ok(stream) => Some(stream),
            Err(e) => {
                log::warn!("No audio input ({}), processing silence", e);
                None
            }
        }
    };

    let (command_tx, command_rx) = command_channel();
    let engine = FxEngine::new(sample_rate, controls);
    let state = OutputState::new(AudioCallback::new(engine, command_rx), input_rx);

    let output_stream = build_output_stream(&output_device, &output_config, state)?;

    if let Some(stream) = &input_stream {
        stream.play()?;
    }
    output_stream.play()?;

    log::info!(
        "Audio started: {}Hz, {} frames, {} output channels, input {}",
        sample_rate,
        buffer_size,
        output_config.channels,
        if input_stream.is_some() { "on" } else { "off" }
    );

    let handle = CpalAudioHandle {
        _input_stream: input_stream,
        _output_stream: output_stream,
        sample_rate,
        buffer_size,
    };
    let latency_ms = handle.latency_ms();

    Ok(AudioSystemResult {
        handle,
        command_sender: CommandSender::new(command_tx),
        sample_rate,
        buffer_size,
        latency_ms,
    })
}

fn open_input(
    config: &AudioConfig,
    sample_rate: u32,
    buffer_size: u32,
    producer: rtrb::Producer<StereoSample>,
) -> AudioResult<Stream> {
    let device = open_device(config.input_device.as_ref(), Direction::Input)?;
    let (input_config, _) = get_stream_config(&device, Direction::Input, sample_rate, buffer_size)?;

    if input_config.sample_rate.0 != sample_rate {
        return Err(AudioError::SampleRateMismatch {
            input: input_config.sample_rate.0,
            output: sample_rate,
        });
    }

    build_input_stream(&device, &input_config, producer)
}

/// Pick the best stream configuration for a device
///
/// Prefers f32 samples, at least two channels and the target sample rate,
/// then falls back to any stereo configuration, then to anything at all.
/// Returns the stream config and the buffer size requested.
fn get_stream_config(
    device: &cpal::Device,
    direction: Direction,
    target_sample_rate: u32,
    buffer_size: u32,
) -> AudioResult<(StreamConfig, u32)> {
    let supported_configs: Vec<cpal::SupportedStreamConfigRange> = match direction {
        Direction::Input => device
            .supported_input_configs()?
            .collect(),
        Direction::Output => device
            .supported_output_configs()?
            .collect(),
    };

    let in_range = |c: &&cpal::SupportedStreamConfigRange| {
        target_sample_rate >= c.min_sample_rate().0 && target_sample_rate <= c.max_sample_rate().0
    };

    let best_config = supported_configs
        .iter()
        .filter(|c| c.sample_format() == SampleFormat::F32)
        .filter(|c| c.channels() >= 2)
        .find(in_range)
        .or_else(|| {
            supported_configs
                .iter()
                .filter(|c| c.sample_format() == SampleFormat::F32)
                .find(in_range)
        })
        .or_else(|| {
            supported_configs
                .iter()
                .find(|c| c.sample_format() == SampleFormat::F32)
        })
        .ok_or(AudioError::NoUsableConfig {
            direction: direction.name(),
            reason: if supported_configs.is_empty() {
                "device reports no configurations"
            } else {
                "no f32 sample format"
            },
        })?;

    let sample_rate = if in_range(&best_config) {
        cpal::SampleRate(target_sample_rate)
    } else {
        let fallback = best_config.max_sample_rate();
        log::warn!(
            "Audio {} device doesn't support {}Hz, falling back to {}Hz",
            direction.name(),
            target_sample_rate,
            fallback.0
        );
        fallback
    };

    let supported = best_config.clone().with_sample_rate(sample_rate);
    let stream_config = StreamConfig {
        channels: supported.channels(),
        sample_rate,
        buffer_size: CpalBufferSize::Fixed(buffer_size),
    };

    log::debug!(
        "Selected {} config: {} channels, {}Hz, {} frames",
        direction.name(),
        stream_config.channels,
        sample_rate.0,
        buffer_size
    );

    Ok((stream_config, buffer_size))
}

/// Everything the output callback owns
struct OutputState {
    callback: AudioCallback,
    input_rx: rtrb::Consumer<StereoSample>,
    /// Capture frames for the current pass
    input_scratch: Vec<StereoSample>,
    /// Rendered frames when the device is not plain stereo
    output_scratch: Vec<StereoSample>,
}

impl OutputState {
    fn new(callback: AudioCallback, input_rx: rtrb::Consumer<StereoSample>) -> Self {
        Self {
            callback,
            input_rx,
            input_scratch: vec![StereoSample::silence(); MAX_BUFFER_SIZE],
            output_scratch: vec![StereoSample::silence(); MAX_BUFFER_SIZE],
        }
    }

    /// Fill an interleaved device buffer
    fn render(&mut self, data: &mut [f32], channels: usize) {
        if channels == 0 {
            return;
        }
        for chunk in data.chunks_mut(MAX_BUFFER_SIZE * channels) {
            let n_frames = chunk.len() / channels;
            let input = &mut self.input_scratch[..n_frames];
            for frame in input.iter_mut() {
                *frame = self.input_rx.pop().unwrap_or_default();
            }

            if channels == 2 {
                self.callback.process(input, as_frames_mut(chunk));
            } else {
                let output = &mut self.output_scratch[..n_frames];
                self.callback.process(input, output);
                for (frame, sample) in chunk.chunks_mut(channels).zip(output.iter()) {
                    frame[0] = if channels == 1 {
                        (sample.left + sample.right) * 0.5
                    } else {
                        sample.left
                    };
                    if channels > 1 {
                        frame[1] = sample.right;
                    }
                    for ch in frame.iter_mut().skip(2) {
                        *ch = 0.0;
                    }
                }
            }
        }
    }
}

fn build_output_stream(
    device: &cpal::Device,
    config: &StreamConfig,
    mut state: OutputState,
) -> AudioResult<Stream> {
    let channels = config.channels as usize;

    device
        .build_output_stream(
            config,
            move |data: &mut [f32], _info: &cpal::OutputCallbackInfo| {
                state.render(data, channels);
            },
            move |err| {
                log::error!("Output audio stream error: {}", err);
            },
            None,
        )
        .map_err(AudioError::from)
}

/// Push one interleaved capture buffer into the ring
///
/// Mono input is copied to both channels. Frames that don't fit are dropped.
fn push_input(data: &[f32], channels: usize, producer: &mut rtrb::Producer<StereoSample>) {
    if channels == 0 {
        return;
    }
    for frame in data.chunks_exact(channels) {
        let sample = if channels == 1 {
            StereoSample::mono(frame[0])
        } else {
            StereoSample::new(frame[0], frame[1])
        };
        if producer.push(sample).is_err() {
            break;
        }
    }
}

fn build_input_stream(
    device: &cpal::Device,
    config: &StreamConfig,
    mut producer: rtrb::Producer<StereoSample>,
) -> AudioResult<Stream> {
    let channels = config.channels as usize;

    device
        .build_input_stream(
            config,
            move |data: &[f32], _info: &cpal::InputCallbackInfo| {
                push_input(data, channels, &mut producer);
            },
            move |err| {
                log::error!("Input audio stream error: {}", err);
            },
            None,
        )
        .map_err(AudioError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::{Mode, Param};
    use crate::types::SAMPLE_RATE;

    fn dry_state(ring: usize) -> (OutputState, rtrb::Producer<StereoSample>) {
        let controls = Arc::new(SharedControls::with_mode(Mode::Reverb));
        controls.arbiter.record_manual(Param::DryWet, 0.0, controls.now());
        let (_tx, rx) = command_channel();
        let engine = FxEngine::new(SAMPLE_RATE, controls);
        let (input_tx, input_rx) = rtrb::RingBuffer::new(ring);
        (OutputState::new(AudioCallback::new(engine, rx), input_rx), input_tx)
    }

    #[test]
    fn test_stereo_passthrough() {
        let (mut state, mut input) = dry_state(64);
        push_input(&[0.1, 0.2, 0.3, 0.4], 2, &mut input);

        let mut data = [9.0f32; 4];
        state.render(&mut data, 2);
        assert_eq!(data, [0.1, 0.2, 0.3, 0.4]);
    }

    #[test]
    fn test_underrun_pads_silence() {
        let (mut state, mut input) = dry_state(64);
        push_input(&[0.5, 0.5], 2, &mut input);

        let mut data = [9.0f32; 8];
        state.render(&mut data, 2);
        assert_eq!(&data[..2], &[0.5, 0.5]);
        assert!(data[2..].iter().all(|&s| s == 0.0), "missing input renders as silence");
    }

    #[test]
    fn test_overrun_drops_newest() {
        let (_state, mut input) = dry_state(2);
        push_input(&[1.0, 1.0, 2.0, 2.0, 3.0, 3.0], 2, &mut input);
        assert_eq!(input.slots(), 0, "ring full, third frame dropped");
    }

    #[test]
    fn test_mono_input_duplicated() {
        let (mut state, mut input) = dry_state(64);
        push_input(&[0.25, -0.25], 1, &mut input);

        let mut data = [0.0f32; 4];
        state.render(&mut data, 2);
        assert_eq!(data, [0.25, 0.25, -0.25, -0.25]);
    }

    #[test]
    fn test_multichannel_output_silences_extra_channels() {
        let (mut state, mut input) = dry_state(64);
        push_input(&[0.1, 0.2, 0.3, 0.4], 2, &mut input);

        let mut data = [9.0f32; 8];
        state.render(&mut data, 4);
        assert_eq!(data, [0.1, 0.2, 0.0, 0.0, 0.3, 0.4, 0.0, 0.0]);
    }

    #[test]
    fn test_mono_output_downmixes() {
        let (mut state, mut input) = dry_state(64);
        push_input(&[0.2, 0.4], 2, &mut input);

        let mut data = [9.0f32; 1];
        state.render(&mut data, 1);
        assert!((data[0] - 0.3).abs() < 1e-6);
    }
}
