//! Effects engine - mode dispatch for the audio thread
//!
//! Owns everything that runs at audio rate: the loop mixer, the reverb and
//! the two delay lines. Once per block it drains transport commands, pulls
//! the active mode's parameters out of the shared store, and after the block
//! publishes track status back.

use std::sync::Arc;

use crate::control::{Mode, Param, SharedControls};
use crate::effect::{DelayLine, Reverb, StereoEffect};
use crate::looper::LoopMixer;
use crate::types::{StereoSample, TrackId};

use super::command::{EngineCommand, COMMAND_QUEUE_CAPACITY};
use super::smoothing::{OnePole, DELAY_SMOOTHING_COEFFICIENT};

/// Delay time at power-on, in seconds
pub const INITIAL_DELAY_SECONDS: f32 = 0.75;

/// The audio-rate half of the unit
pub struct FxEngine {
    sample_rate: f32,
    controls: Arc<SharedControls>,
    /// Mode latched for the current block
    mode: Mode,

    mixer: LoopMixer,
    reverb: Box<dyn StereoEffect>,
    delay_l: DelayLine,
    delay_r: DelayLine,
    /// Smoothed delay time in samples
    delay_time: OnePole,

    // Resolved once per block
    drywet: f32,
    feedback: f32,
    delay_target: f32,
}

impl FxEngine {
    /// Create an engine with full-size loop and delay buffers
    ///
    /// Allocates every buffer the engine will ever use; call this before the
    /// audio stream starts.
    pub fn new(sample_rate: u32, controls: Arc<SharedControls>) -> Self {
        Self::with_parts(
            sample_rate,
            controls,
            LoopMixer::new(),
            Box::new(Reverb::new(sample_rate)),
        )
    }

    /// Create an engine around a given mixer and reverb
    pub fn with_parts(
        sample_rate: u32,
        controls: Arc<SharedControls>,
        mixer: LoopMixer,
        reverb: Box<dyn StereoEffect>,
    ) -> Self {
        let sample_rate = sample_rate.max(1) as f32;
        let initial_delay = sample_rate * INITIAL_DELAY_SECONDS;
        let mode = controls.mode.mode();

        Self {
            sample_rate,
            controls,
            mode,
            mixer,
            reverb,
            delay_l: DelayLine::new(),
            delay_r: DelayLine::new(),
            delay_time: OnePole::new(initial_delay, DELAY_SMOOTHING_COEFFICIENT),
            drywet: Param::DryWet.default_value(),
            feedback: Param::Feedback.default_value(),
            delay_target: initial_delay,
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn mixer(&self) -> &LoopMixer {
        &self.mixer
    }

    pub fn controls(&self) -> &Arc<SharedControls> {
        &self.controls
    }

    /// Current smoothed delay time in samples
    pub fn delay_samples(&self) -> f32 {
        self.delay_time.value()
    }

    // ─────────────────────────────────────────────────────────────
    // Block boundary
    // ─────────────────────────────────────────────────────────────

    /// Drain pending transport commands
    ///
    /// Bounded to the queue capacity so a flooding producer can never stall
    /// the callback.
    pub fn process_commands(&mut self, rx: &mut rtrb::Consumer<EngineCommand>) {
        for _ in 0..COMMAND_QUEUE_CAPACITY {
            match rx.pop() {
                Ok(cmd) => self.handle_command(cmd),
                Err(_) => break,
            }
        }
    }

    /// Apply a single command
    pub fn handle_command(&mut self, cmd: EngineCommand) {
        match cmd {
            EngineCommand::Transport { track } => {
                self.mixer.track_mut(track).advance_transport();
            }
            EngineCommand::StartRecording { track } => {
                self.mixer.track_mut(track).start_recording();
            }
            EngineCommand::StopRecording { track } => {
                self.mixer.track_mut(track).stop_recording();
            }
            EngineCommand::ToggleOverdub { track } => {
                self.mixer.track_mut(track).toggle_overdub();
            }
            EngineCommand::Reset { track } => {
                self.mixer.track_mut(track).reset();
            }
            EngineCommand::SetWriteEnabled { track, enabled } => {
                self.mixer.track_mut(track).set_write_enabled(enabled);
            }
            EngineCommand::SetGain { track, gain } => {
                self.mixer.track_mut(track).set_gain(gain);
            }
            EngineCommand::ResetAll => {
                for id in TrackId::ALL {
                    self.mixer.track_mut(id).reset();
                }
            }
        }
    }

    /// Latch the mode and resolve its parameters for the coming block
    pub fn update_controls(&mut self) {
        self.mode = self.controls.mode.mode();
        for &param in self.mode.params() {
            let value = self.controls.arbiter.resolve(param);
            self.apply_param(param, value);
        }
    }

    fn apply_param(&mut self, param: Param, value: f32) {
        match param {
            Param::DryWet => self.drywet = value,
            Param::Feedback => {
                self.feedback = value;
                self.reverb.set_feedback(value);
            }
            Param::DelayMs => self.delay_target = self.sample_rate * value / 1000.0,
            Param::Crossfade => self.mixer.set_crossfade(value),
            Param::PlaybackSpeed => self.mixer.set_playback_speed(value),
        }
    }

    /// Store each track's state where the control thread can see it
    pub fn publish_status(&self) {
        for id in TrackId::ALL {
            self.controls.track(id).sync_from(self.mixer.track(id));
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Audio rate
    // ─────────────────────────────────────────────────────────────

    /// Process one frame in the latched mode
    #[inline]
    pub fn process_frame(&mut self, input: StereoSample) -> StereoSample {
        match self.mode {
            Mode::Reverb => self.reverb_frame(input),
            Mode::Delay => self.delay_frame(input),
            Mode::Loop => self.mixer.process(input),
        }
    }

    #[inline]
    fn reverb_frame(&mut self, dry: StereoSample) -> StereoSample {
        let wet = self.reverb.process(dry);
        dry.lerp(wet, self.drywet)
    }

    #[inline]
    fn delay_frame(&mut self, input: StereoSample) -> StereoSample {
        let delay = self.delay_time.process(self.delay_target);
        self.delay_l.set_delay(delay);
        self.delay_r.set_delay(delay);

        let fb = self.feedback;
        let y_l = self.delay_l.read();
        let y_r = self.delay_r.read();

        self.delay_l.write(fb * y_l + input.left);
        self.delay_r.write(fb * y_r + input.right);

        StereoSample::new(
            fb * y_l + (1.0 - fb) * input.left,
            fb * y_r + (1.0 - fb) * input.right,
        )
    }
}
