//! MIDI controller as the control surface
//!
//! The controller's events arrive on the midir thread and are folded into a
//! [`SurfaceState`] once per control tick. Knobs are absolute CCs, the
//! encoder is a (usually relative) CC and each button is a note or a CC
//! press.

use loopfx_core::control::{ButtonTracker, ControlSurface, SurfaceFrame};
use loopfx_midi::{
    absolute_delta, encoder_to_delta, normalize_cc_value, ControlRange, EncoderMode, MidiInputEvent,
    MidiInputHandler, CLIENT_NAME,
};

use crate::config::SurfaceConfig;

const SURFACE_CHANNEL_CAPACITY: usize = 256;

/// Surface state accumulated from raw controller events
#[derive(Debug, Clone)]
pub struct SurfaceState {
    config: SurfaceConfig,
    knobs: [f32; 2],
    encoder_delta: i32,
    /// Last absolute encoder value (absolute mode only)
    encoder_last: Option<u8>,
    button_level: [bool; 2],
    /// A press was seen since the last poll, even if already released
    button_latch: [bool; 2],
    trackers: [ButtonTracker; 2],
}

impl SurfaceState {
    pub fn new(config: SurfaceConfig) -> Self {
        Self {
            config,
            knobs: SurfaceFrame::resting().knobs,
            encoder_delta: 0,
            encoder_last: None,
            button_level: [false; 2],
            button_latch: [false; 2],
            trackers: [ButtonTracker::default(); 2],
        }
    }

    /// Fold one controller event into the state
    pub fn handle_event(&mut self, event: &MidiInputEvent) {
        let knob_addrs = [self.config.knob1, self.config.knob2];
        for (i, addr) in knob_addrs.iter().enumerate() {
            if event.matches(addr) {
                if let MidiInputEvent::ControlChange { value, .. } = *event {
                    self.knobs[i] = normalize_cc_value(value, ControlRange::Unit);
                }
                return;
            }
        }

        if event.matches(&self.config.encoder) {
            if let MidiInputEvent::ControlChange { value, .. } = *event {
                self.encoder_delta += match self.config.encoder_mode {
                    EncoderMode::Absolute => {
                        let delta = self.encoder_last.map_or(0, |prev| absolute_delta(prev, value));
                        self.encoder_last = Some(value);
                        delta
                    }
                    mode => encoder_to_delta(value, mode),
                };
            }
            return;
        }

        let button_addrs = [self.config.button1, self.config.button2];
        for (i, addr) in button_addrs.iter().enumerate() {
            if event.matches(addr) {
                let pressed = event.is_press();
                self.button_level[i] = pressed;
                self.button_latch[i] |= pressed;
                return;
            }
        }
    }

    /// Produce this tick's frame and reset per-tick accumulators
    ///
    /// A press released before the poll still yields one rising edge.
    pub fn take_frame(&mut self) -> SurfaceFrame {
        let mut frame = SurfaceFrame {
            knobs: self.knobs,
            encoder: std::mem::take(&mut self.encoder_delta),
            ..SurfaceFrame::resting()
        };
        for i in 0..2 {
            let seen = self.button_level[i] || std::mem::take(&mut self.button_latch[i]);
            frame.buttons[i] = self.trackers[i].update(seen);
            // Let a tap that was already released read as up next tick
            if !self.button_level[i] {
                self.trackers[i].update(false);
            }
        }
        frame
    }
}

/// A controller surface fed from a MIDI input port
pub struct MidiSurface {
    rx: flume::Receiver<MidiInputEvent>,
    state: SurfaceState,
    name: String,
}

impl MidiSurface {
    /// Surface over an existing event channel
    pub fn new(config: SurfaceConfig, rx: flume::Receiver<MidiInputEvent>, name: impl Into<String>) -> Self {
        Self {
            rx,
            state: SurfaceState::new(config),
            name: name.into(),
        }
    }

    /// Connect to the configured controller
    ///
    /// The returned handler owns the port; the surface stops receiving when
    /// it is dropped.
    pub fn connect(config: &SurfaceConfig) -> Option<(Self, MidiInputHandler)> {
        if !config.enabled {
            return None;
        }

        let (tx, rx) = flume::bounded(SURFACE_CHANNEL_CAPACITY);
        let handler = MidiInputHandler::connect(&config.port_match, CLIENT_NAME, move |event| {
            if tx.try_send(event).is_err() {
                log::warn!("Surface: event channel full, dropping {:?}", event);
            }
        });

        match handler {
            Ok(handler) => {
                let surface = Self::new(config.clone(), rx, handler.port_name());
                log::info!("Surface: using {}", surface.name);
                Some((surface, handler))
            }
            Err(e) => {
                log::warn!("Surface: {}, knobs stay parked", e);
                None
            }
        }
    }
}

impl ControlSurface for MidiSurface {
    fn poll(&mut self) -> SurfaceFrame {
        for event in self.rx.try_iter() {
            self.state.handle_event(&event);
        }
        self.state.take_frame()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loopfx_core::control::ButtonState;

    fn cc(cc: u8, value: u8) -> MidiInputEvent {
        MidiInputEvent::ControlChange { channel: 0, cc, value }
    }

    fn note_on(note: u8) -> MidiInputEvent {
        MidiInputEvent::NoteOn {
            channel: 0,
            note,
            velocity: 100,
        }
    }

    fn note_off(note: u8) -> MidiInputEvent {
        MidiInputEvent::NoteOff {
            channel: 0,
            note,
            velocity: 0,
        }
    }

    fn surface() -> (MidiSurface, flume::Sender<MidiInputEvent>) {
        let (tx, rx) = flume::unbounded();
        (MidiSurface::new(SurfaceConfig::default(), rx, "test"), tx)
    }

    #[test]
    fn test_knobs_start_parked() {
        let (mut surface, _tx) = surface();
        assert_eq!(surface.poll(), SurfaceFrame::resting());
        assert_eq!(surface.name(), "test");
    }

    #[test]
    fn test_knobs_follow_cc() {
        let (mut surface, tx) = surface();
        tx.send(cc(21, 127)).unwrap();
        tx.send(cc(22, 0)).unwrap();
        let frame = surface.poll();
        assert_eq!(frame.knobs, [1.0, 0.0]);
        assert_eq!(surface.poll().knobs, [1.0, 0.0], "knob position persists");
    }

    #[test]
    fn test_relative_encoder_accumulates_per_tick() {
        let (mut surface, tx) = surface();
        tx.send(cc(23, 1)).unwrap();
        tx.send(cc(23, 1)).unwrap();
        tx.send(cc(23, 65)).unwrap();
        assert_eq!(surface.poll().encoder, 1);
        assert_eq!(surface.poll().encoder, 0, "delta resets every tick");
    }

    #[test]
    fn test_absolute_encoder_diffs() {
        let (tx, rx) = flume::unbounded();
        let config = SurfaceConfig {
            encoder_mode: EncoderMode::Absolute,
            ..SurfaceConfig::default()
        };
        let mut surface = MidiSurface::new(config, rx, "abs");
        tx.send(cc(23, 10)).unwrap();
        assert_eq!(surface.poll().encoder, 0, "first value only seeds");
        tx.send(cc(23, 12)).unwrap();
        assert_eq!(surface.poll().encoder, 2);
        tx.send(cc(23, 127)).unwrap();
        tx.send(cc(23, 0)).unwrap();
        assert_eq!(surface.poll().encoder, -12, "wraps across 127 -> 0");
    }

    #[test]
    fn test_button_hold_edges() {
        let (mut surface, tx) = surface();
        tx.send(note_on(36)).unwrap();
        let frame = surface.poll();
        assert_eq!(frame.buttons[0], ButtonState { pressed: true, rising: true });
        assert_eq!(frame.buttons[1], ButtonState::default());

        let frame = surface.poll();
        assert_eq!(frame.buttons[0], ButtonState { pressed: true, rising: false }, "held, no new edge");

        tx.send(note_off(36)).unwrap();
        assert_eq!(surface.poll().buttons[0], ButtonState::default());
    }

    #[test]
    fn test_tap_within_one_tick_still_fires() {
        let (mut surface, tx) = surface();
        tx.send(note_on(37)).unwrap();
        tx.send(note_off(37)).unwrap();
        assert!(surface.poll().buttons[1].rising, "a fast tap must not be lost");
        assert_eq!(surface.poll().buttons[1], ButtonState::default());

        tx.send(note_on(37)).unwrap();
        assert!(surface.poll().buttons[1].rising, "the next press is a fresh edge");
    }

    #[test]
    fn test_unmapped_events_ignored() {
        let (mut surface, tx) = surface();
        tx.send(cc(1, 127)).unwrap();
        tx.send(note_on(60)).unwrap();
        assert_eq!(surface.poll(), SurfaceFrame::resting());
    }

    #[test]
    fn test_disabled_surface_does_not_connect() {
        assert!(MidiSurface::connect(&SurfaceConfig::default()).is_none());
    }
}
