//! Control-rate router
//!
//! Turns one tick of surface input and any drained MIDI events into writes on
//! the shared store and transport commands for the audio thread.
//!
//! A knob only counts as a manual update when it actually moves. The first
//! reading seeds a baseline; after that a reading must leave the dead band
//! around the baseline to be recorded. An untouched knob therefore never
//! takes a parameter back from MIDI just by being polled.

use std::sync::Arc;

use super::mode::{Button, Knob, Mode};
use super::store::SharedControls;
use super::surface::SurfaceFrame;
use super::ControlEvent;
use crate::engine::CommandSender;

/// Default knob dead band (fraction of full travel)
pub const DEFAULT_KNOB_DEADBAND: f32 = 0.01;

pub struct ControlRouter {
    controls: Arc<SharedControls>,
    /// Last recorded reading per physical knob
    knob_baseline: [Option<f32>; 2],
    deadband: f32,
    /// Commands dropped because the queue was full
    dropped_commands: u64,
}

impl ControlRouter {
    pub fn new(controls: Arc<SharedControls>, deadband: f32) -> Self {
        Self {
            controls,
            knob_baseline: [None; 2],
            deadband: deadband.max(0.0),
            dropped_commands: 0,
        }
    }

    pub fn controls(&self) -> &Arc<SharedControls> {
        &self.controls
    }

    pub fn dropped_commands(&self) -> u64 {
        self.dropped_commands
    }

    /// Apply one polled surface frame
    ///
    /// Order matters: the encoder is applied first so knobs and buttons are
    /// routed against the mode the user just selected.
    pub fn apply_surface(&mut self, frame: &SurfaceFrame, commands: &mut CommandSender) {
        if frame.encoder != 0 {
            let mode = self.controls.mode.step(frame.encoder);
            log::info!("Mode -> {} (encoder {:+})", mode.name(), frame.encoder);
        }

        for knob in Knob::ALL {
            self.apply_knob(knob, frame.knob(knob));
        }

        for button in Button::ALL {
            if !frame.button(button).rising {
                continue;
            }
            if let Some(cmd) = self.controls.mode.route_button(button) {
                log::debug!("Button {:?} -> {:?}", button, cmd);
                if commands.send(cmd).is_err() {
                    self.dropped_commands += 1;
                    log::warn!("Command queue full, dropped transport for {:?}", button.track());
                }
            }
        }
    }

    fn apply_knob(&mut self, knob: Knob, reading: f32) {
        if !reading.is_finite() {
            return;
        }
        let reading = reading.clamp(0.0, 1.0);
        let deadband = self.deadband;
        let baseline = &mut self.knob_baseline[knob as usize];

        match *baseline {
            None => *baseline = Some(reading),
            Some(previous) if knob_moved(previous, reading, deadband) => {
                *baseline = Some(reading);
                let (param, value) = self.controls.mode.route_knob(knob, reading);
                let now = self.controls.now();
                self.controls.arbiter.record_manual(param, value, now);
                log::trace!("Knob {:?} -> {} = {:.3}", knob, param.name(), value);
            }
            Some(_) => {}
        }
    }

    /// Apply one decoded MIDI event
    pub fn apply_midi(&mut self, event: ControlEvent) {
        match event {
            ControlEvent::SetParam { param, value } => {
                let now = self.controls.now();
                self.controls.arbiter.record_midi(param, value, now);
                log::trace!("MIDI -> {} = {:.3}", param.name(), value);
            }
            ControlEvent::StepMode(delta) => {
                if delta != 0 {
                    let mode = self.controls.mode.step(delta);
                    log::info!("Mode -> {} (MIDI)", mode.name());
                }
            }
        }
    }

    pub fn mode(&self) -> Mode {
        self.controls.mode.mode()
    }
}

/// Movement past the dead band, or arrival on an end stop
///
/// A slow sweep would otherwise stall up to one dead band short of 0.0 or
/// 1.0.
fn knob_moved(previous: f32, reading: f32, deadband: f32) -> bool {
    let on_rail = reading == 0.0 || reading == 1.0;
    (reading - previous).abs() > deadband || (on_rail && reading != previous)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::{ButtonState, Param, Source};
    use crate::engine::{command_channel, EngineCommand};
    use crate::types::TrackId;

    fn setup() -> (ControlRouter, CommandSender, rtrb::Consumer<EngineCommand>) {
        let controls = Arc::new(SharedControls::new());
        let (tx, rx) = command_channel();
        (
            ControlRouter::new(controls, DEFAULT_KNOB_DEADBAND),
            CommandSender::new(tx),
            rx,
        )
    }

    fn frame(knobs: [f32; 2]) -> SurfaceFrame {
        SurfaceFrame {
            knobs,
            ..SurfaceFrame::resting()
        }
    }

    #[test]
    fn test_first_reading_only_seeds() {
        let (mut router, mut tx, _rx) = setup();
        router.apply_surface(&frame([0.9, 0.1]), &mut tx);

        let arbiter = &router.controls().arbiter;
        assert_eq!(arbiter.manual(Param::DryWet), (0.5, 0), "untouched knob must not record");
        assert_eq!(arbiter.manual(Param::Feedback), (0.5, 0));
    }

    #[test]
    fn test_knob_motion_records_manual() {
        let (mut router, mut tx, _rx) = setup();
        router.apply_surface(&frame([0.5, 0.5]), &mut tx);
        router.apply_surface(&frame([0.8, 0.5]), &mut tx);

        let (value, source) = router.controls().arbiter.resolve_with_source(Param::DryWet);
        assert_eq!(source, Source::Manual);
        assert!((value - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_jitter_inside_deadband_ignored() {
        let (mut router, mut tx, _rx) = setup();
        router.apply_midi(ControlEvent::SetParam {
            param: Param::Feedback,
            value: 0.9,
        });
        router.apply_surface(&frame([0.5, 0.5]), &mut tx);
        router.apply_surface(&frame([0.5, 0.505]), &mut tx);

        assert_eq!(
            router.controls().arbiter.resolve_with_source(Param::Feedback),
            (0.9, Source::Midi),
            "knob noise must not steal the parameter back"
        );
    }

    #[test]
    fn test_slow_sweep_reaches_end_stops() {
        let (mut router, mut tx, _rx) = setup();
        router.controls().mode.set_mode(Mode::Loop);

        for step in 0..=500 {
            let reading = 0.5 - step as f32 * 0.001;
            router.apply_surface(&frame([0.5, reading.max(0.0)]), &mut tx);
        }
        for _ in 0..100 {
            router.apply_surface(&frame([0.5, 0.0]), &mut tx);
        }
        assert_eq!(
            router.controls().arbiter.resolve(Param::Crossfade),
            0.0,
            "crossfade must reach track A exactly"
        );

        for step in 0..=1000 {
            let reading = step as f32 * 0.001;
            router.apply_surface(&frame([0.5, reading.min(1.0)]), &mut tx);
        }
        router.apply_surface(&frame([0.5, 1.0]), &mut tx);
        assert_eq!(router.controls().arbiter.resolve(Param::Crossfade), 1.0);
    }

    #[test]
    fn test_resting_on_end_stop_records_once() {
        let (mut router, mut tx, _rx) = setup();
        router.apply_surface(&frame([0.005, 0.5]), &mut tx);
        router.apply_surface(&frame([0.0, 0.5]), &mut tx);
        assert_eq!(router.controls().arbiter.resolve(Param::DryWet), 0.0);

        router.apply_midi(ControlEvent::SetParam {
            param: Param::DryWet,
            value: 0.7,
        });
        router.apply_surface(&frame([0.0, 0.5]), &mut tx);
        assert_eq!(
            router.controls().arbiter.resolve(Param::DryWet),
            0.7,
            "a knob parked on its end stop must not reclaim the parameter"
        );
    }

    #[test]
    fn test_last_writer_wins_across_sources() {
        let (mut router, mut tx, _rx) = setup();
        router.apply_surface(&frame([0.5, 0.5]), &mut tx);
        router.apply_surface(&frame([0.2, 0.5]), &mut tx);
        router.apply_midi(ControlEvent::SetParam {
            param: Param::DryWet,
            value: 1.0,
        });
        assert_eq!(router.controls().arbiter.resolve(Param::DryWet), 1.0);

        router.apply_surface(&frame([0.4, 0.5]), &mut tx);
        assert!((router.controls().arbiter.resolve(Param::DryWet) - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_encoder_changes_mode_before_knobs_route() {
        let (mut router, mut tx, _rx) = setup();
        router.apply_surface(&frame([0.5, 0.5]), &mut tx);

        let mut tick = frame([0.5, 0.75]);
        tick.encoder = 2;
        router.apply_surface(&tick, &mut tx);

        assert_eq!(router.mode(), Mode::Loop);
        assert_eq!(router.controls().arbiter.resolve(Param::Crossfade), 0.75);
    }

    #[test]
    fn test_button_edge_sends_transport_in_loop_mode() {
        let (mut router, mut tx, mut rx) = setup();
        router.controls().mode.set_mode(Mode::Loop);

        let mut tick = SurfaceFrame::resting();
        tick.buttons[1] = ButtonState {
            pressed: true,
            rising: true,
        };
        router.apply_surface(&tick, &mut tx);
        assert!(matches!(rx.pop(), Ok(EngineCommand::Transport { track: TrackId::B })));

        // Held without a new edge: nothing more
        tick.buttons[1].rising = false;
        router.apply_surface(&tick, &mut tx);
        assert!(rx.pop().is_err());
    }

    #[test]
    fn test_buttons_ignored_outside_loop_mode() {
        let (mut router, mut tx, mut rx) = setup();
        let mut tick = SurfaceFrame::resting();
        tick.buttons[0] = ButtonState {
            pressed: true,
            rising: true,
        };
        router.apply_surface(&tick, &mut tx);
        assert!(rx.pop().is_err());
    }

    #[test]
    fn test_midi_mode_step() {
        let (mut router, _tx, _rx) = setup();
        router.apply_midi(ControlEvent::StepMode(-1));
        assert_eq!(router.mode(), Mode::Loop);
        router.apply_midi(ControlEvent::StepMode(0));
        assert_eq!(router.mode(), Mode::Loop);
    }

    #[test]
    fn test_full_queue_counts_drops() {
        let (mut router, mut tx, _rx) = setup();
        router.controls().mode.set_mode(Mode::Loop);
        let mut tick = SurfaceFrame::resting();
        tick.buttons[0] = ButtonState {
            pressed: true,
            rising: true,
        };
        for _ in 0..crate::engine::COMMAND_QUEUE_CAPACITY + 3 {
            router.apply_surface(&tick, &mut tx);
        }
        assert_eq!(router.dropped_commands(), 3);
    }
}
