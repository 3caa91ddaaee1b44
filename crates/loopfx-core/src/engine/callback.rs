//! Fixed-block audio callback driver
//!
//! The host hands us buffers of whatever size the device runs at. The
//! callback cuts them into `BLOCK_SIZE`-frame blocks and, per block:
//!
//! 1. drains pending transport commands (bounded)
//! 2. latches the mode and resolves its parameters once
//! 3. renders every frame of the block in that mode
//! 4. publishes track status for the control thread
//!
//! Mode switches and transport therefore take effect at the next block
//! boundary, never in the middle of one.

use crate::types::{StereoSample, BLOCK_SIZE};

use super::command::EngineCommand;
use super::engine::FxEngine;

/// Real-time entry point; owned outright by the audio stream closure
pub struct AudioCallback {
    engine: FxEngine,
    command_rx: rtrb::Consumer<EngineCommand>,
}

impl AudioCallback {
    pub fn new(engine: FxEngine, command_rx: rtrb::Consumer<EngineCommand>) -> Self {
        Self { engine, command_rx }
    }

    pub fn engine(&self) -> &FxEngine {
        &self.engine
    }

    /// Render `output` from `input`
    ///
    /// Missing input frames (input shorter than output) are treated as
    /// silence.
    pub fn process(&mut self, input: &[StereoSample], output: &mut [StereoSample]) {
        for (block_idx, block) in output.chunks_mut(BLOCK_SIZE).enumerate() {
            let offset = block_idx * BLOCK_SIZE;
            self.process_block(input.get(offset..).unwrap_or(&[]), block);
        }
    }

    #[inline]
    fn process_block(&mut self, input: &[StereoSample], output: &mut [StereoSample]) {
        self.engine.process_commands(&mut self.command_rx);
        self.engine.update_controls();

        for (i, out) in output.iter_mut().enumerate() {
            let frame = input.get(i).copied().unwrap_or_default();
            *out = self.engine.process_frame(frame);
        }

        self.engine.publish_status();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::control::{Mode, Param, SharedControls};
    use crate::engine::{command_channel, CommandSender};
    use crate::looper::TrackStatus;
    use crate::types::{TrackId, SAMPLE_RATE};

    fn setup(mode: Mode) -> (AudioCallback, CommandSender, Arc<SharedControls>) {
        let controls = Arc::new(SharedControls::with_mode(mode));
        let (tx, rx) = command_channel();
        let engine = FxEngine::new(SAMPLE_RATE, Arc::clone(&controls));
        (AudioCallback::new(engine, rx), CommandSender::new(tx), controls)
    }

    #[test]
    fn test_fully_dry_reverb_passes_input() {
        let (mut callback, _tx, controls) = setup(Mode::Reverb);
        controls.arbiter.record_manual(Param::DryWet, 0.0, controls.now());

        let input: Vec<_> = (0..10).map(|i| StereoSample::new(i as f32 * 0.1, -(i as f32) * 0.1)).collect();
        let mut output = vec![StereoSample::silence(); 10];
        callback.process(&input, &mut output);

        assert_eq!(output, input, "dry/wet 0 is a straight passthrough");
    }

    #[test]
    fn test_short_input_padded_with_silence() {
        let (mut callback, _tx, controls) = setup(Mode::Reverb);
        controls.arbiter.record_manual(Param::DryWet, 0.0, controls.now());

        let input = vec![StereoSample::mono(1.0); 3];
        let mut output = vec![StereoSample::mono(9.0); 8];
        callback.process(&input, &mut output);

        assert_eq!(&output[..3], &input[..]);
        assert!(output[3..].iter().all(|s| *s == StereoSample::silence()));
    }

    #[test]
    fn test_transport_applies_at_block_boundary() {
        let (mut callback, mut tx, controls) = setup(Mode::Loop);
        tx.send(EngineCommand::Transport { track: TrackId::A }).unwrap();

        let input = vec![StereoSample::mono(0.5); BLOCK_SIZE * 3];
        let mut output = vec![StereoSample::silence(); BLOCK_SIZE * 3];
        callback.process(&input, &mut output);

        let a = controls.track(TrackId::A);
        assert_eq!(a.status(), TrackStatus::Recording);
        assert_eq!(a.length(), BLOCK_SIZE * 3, "every frame of every block recorded");
        assert_eq!(controls.track(TrackId::B).status(), TrackStatus::Idle);
    }

    #[test]
    fn test_mode_latched_per_block() {
        let (mut callback, _tx, controls) = setup(Mode::Reverb);
        let mut output = vec![StereoSample::silence(); BLOCK_SIZE];
        callback.process(&[], &mut output);
        assert_eq!(callback.engine().mode(), Mode::Reverb);

        controls.mode.step(1);
        assert_eq!(callback.engine().mode(), Mode::Reverb, "not applied until the next block");
        callback.process(&[], &mut output);
        assert_eq!(callback.engine().mode(), Mode::Delay);
    }

    #[test]
    fn test_loop_roundtrip_through_callback() {
        let (mut callback, mut tx, _controls) = setup(Mode::Loop);
        let take: Vec<_> = (0..BLOCK_SIZE * 2).map(|i| StereoSample::mono(i as f32 / 10.0)).collect();
        let mut output = vec![StereoSample::silence(); take.len()];

        tx.send(EngineCommand::StartRecording { track: TrackId::A }).unwrap();
        callback.process(&take, &mut output);
        tx.send(EngineCommand::StopRecording { track: TrackId::A }).unwrap();

        let silence = vec![StereoSample::silence(); take.len()];
        callback.process(&silence, &mut output);
        for (i, (out, expected)) in output.iter().zip(&take).enumerate() {
            assert!((out.left - expected.left).abs() < 1e-6, "frame {}: {} != {}", i, out.left, expected.left);
        }
    }
}
