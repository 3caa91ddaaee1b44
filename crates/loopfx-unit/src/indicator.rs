//! LED indicator state
//!
//! Two RGB LEDs show the mode and its knob positions, or in Loop mode each
//! track's transport state. While a transport button is held the held
//! button's LED blinks white, faster as the loop gets longer.

use loopfx_core::control::Mode;
use loopfx_core::looper::TrackStatus;
use loopfx_core::MAX_LOOP_SAMPLES;
use loopfx_midi::{denormalize_to_midi, ControlRange, MidiOutputHandler};

use crate::config::LedOutputConfig;

/// Duration of the all-white flash at startup
pub const STARTUP_FLASH_MS: u64 = 500;

/// One LED colour, channels in [0, 1]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const OFF: Rgb = Rgb::new(0.0, 0.0, 0.0);
    pub const WHITE: Rgb = Rgb::new(1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub fn channels(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }
}

/// Both LEDs for one tick
pub type LedFrame = [Rgb; 2];

/// Colour for a track's transport state
pub fn track_colour(status: TrackStatus) -> Rgb {
    match status {
        TrackStatus::Idle => Rgb::new(0.2, 0.2, 0.2),
        TrackStatus::Recording => Rgb::new(1.0, 0.0, 0.0),
        TrackStatus::Playing => Rgb::new(0.0, 1.0, 0.0),
        TrackStatus::Overdubbing => Rgb::new(0.8, 0.4, 0.0),
    }
}

/// Everything the LEDs depend on
#[derive(Debug, Clone, Copy)]
pub struct IndicatorInput {
    pub mode: Mode,
    /// Raw knob readings
    pub knobs: [f32; 2],
    pub tracks: [TrackStatus; 2],
    /// Transport buttons currently held
    pub held: [bool; 2],
    /// Current blink phase
    pub blink_on: bool,
}

pub fn led_frame(input: &IndicatorInput) -> LedFrame {
    let [k1, k2] = input.knobs.map(|k| k.clamp(0.0, 1.0));
    match input.mode {
        Mode::Reverb => [Rgb::new(0.0, 0.0, k1), Rgb::new(0.0, 0.0, k2)],
        Mode::Delay => [Rgb::new(0.0, k1, 0.0), Rgb::new(0.0, k2, 0.0)],
        Mode::Loop if input.held.iter().any(|&h| h) => input
            .held
            .map(|held| if held && input.blink_on { Rgb::WHITE } else { Rgb::OFF }),
        Mode::Loop => input.tracks.map(track_colour),
    }
}

/// Blink interval for a loop (or recording) of `length` frames
///
/// 150ms for an empty track down to 30ms at full capacity.
pub fn blink_interval_ms(length: usize) -> u64 {
    let fill = (length as f32 / MAX_LOOP_SAMPLES as f32).clamp(0.0, 1.0);
    (30.0 + 120.0 * (1.0 - fill)).round() as u64
}

/// Blink phase generator driven by a millisecond clock
#[derive(Debug, Clone, Copy, Default)]
pub struct BlinkState {
    /// Time of the last toggle, None while not blinking
    last_toggle_ms: Option<u64>,
    on: bool,
}

impl BlinkState {
    /// Advance to `now_ms`; blinking starts in the "on" phase
    pub fn update(&mut self, now_ms: u64, interval_ms: u64) -> bool {
        match self.last_toggle_ms {
            None => {
                self.last_toggle_ms = Some(now_ms);
                self.on = true;
            }
            Some(last) if now_ms.saturating_sub(last) >= interval_ms => {
                self.last_toggle_ms = Some(now_ms);
                self.on = !self.on;
            }
            Some(_) => {}
        }
        self.on
    }

    pub fn stop(&mut self) {
        *self = Self::default();
    }
}

/// Something that can display the LED frame
pub trait Indicator {
    fn show(&mut self, leds: &LedFrame);
}

/// Logs LED changes at debug level
#[derive(Debug, Default)]
pub struct LogIndicator {
    last: Option<LedFrame>,
}

impl Indicator for LogIndicator {
    fn show(&mut self, leds: &LedFrame) {
        if self.last.as_ref() == Some(leds) {
            return;
        }
        self.last = Some(*leds);
        log::debug!(
            "LEDs: ({:.2}, {:.2}, {:.2}) ({:.2}, {:.2}, {:.2})",
            leds[0].r,
            leds[0].g,
            leds[0].b,
            leds[1].r,
            leds[1].g,
            leds[1].b
        );
    }
}

/// Sends each LED channel as a CC on the surface's output port
pub struct MidiIndicator {
    output: MidiOutputHandler,
    config: LedOutputConfig,
    failed: bool,
}

impl MidiIndicator {
    pub fn new(output: MidiOutputHandler, config: LedOutputConfig) -> Self {
        Self {
            output,
            config,
            failed: false,
        }
    }
}

/// CC messages (cc, value) for one LED frame
pub fn led_messages(config: &LedOutputConfig, leds: &LedFrame) -> [(u8, u8); 6] {
    let mut messages = [(0u8, 0u8); 6];
    let ccs = config.led1.iter().chain(config.led2.iter());
    let values = leds.iter().flat_map(|led| led.channels());
    for (slot, (&cc, value)) in messages.iter_mut().zip(ccs.zip(values)) {
        *slot = (cc, denormalize_to_midi(value, ControlRange::Unit));
    }
    messages
}

impl Indicator for MidiIndicator {
    fn show(&mut self, leds: &LedFrame) {
        for (cc, value) in led_messages(&self.config, leds) {
            match self.output.send_cc_if_changed(self.config.channel, cc, value) {
                Ok(()) => self.failed = false,
                Err(e) => {
                    // Log the first failure of a streak only
                    if !self.failed {
                        log::warn!("LED output: {}", e);
                    }
                    self.failed = true;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(mode: Mode) -> IndicatorInput {
        IndicatorInput {
            mode,
            knobs: [0.25, 0.75],
            tracks: [TrackStatus::Idle, TrackStatus::Idle],
            held: [false, false],
            blink_on: false,
        }
    }

    #[test]
    fn test_effect_modes_show_knobs() {
        assert_eq!(
            led_frame(&input(Mode::Reverb)),
            [Rgb::new(0.0, 0.0, 0.25), Rgb::new(0.0, 0.0, 0.75)]
        );
        assert_eq!(
            led_frame(&input(Mode::Delay)),
            [Rgb::new(0.0, 0.25, 0.0), Rgb::new(0.0, 0.75, 0.0)]
        );
    }

    #[test]
    fn test_loop_mode_shows_track_state() {
        let mut state = input(Mode::Loop);
        state.tracks = [TrackStatus::Recording, TrackStatus::Overdubbing];
        assert_eq!(
            led_frame(&state),
            [Rgb::new(1.0, 0.0, 0.0), Rgb::new(0.8, 0.4, 0.0)]
        );
        state.tracks = [TrackStatus::Playing, TrackStatus::Idle];
        assert_eq!(
            led_frame(&state),
            [Rgb::new(0.0, 1.0, 0.0), Rgb::new(0.2, 0.2, 0.2)]
        );
    }

    #[test]
    fn test_held_button_blinks_white() {
        let mut state = input(Mode::Loop);
        state.tracks = [TrackStatus::Playing, TrackStatus::Playing];
        state.held = [false, true];

        state.blink_on = true;
        assert_eq!(led_frame(&state), [Rgb::OFF, Rgb::WHITE]);
        state.blink_on = false;
        assert_eq!(led_frame(&state), [Rgb::OFF, Rgb::OFF]);
    }

    #[test]
    fn test_held_ignored_outside_loop_mode() {
        let mut state = input(Mode::Reverb);
        state.held = [true, true];
        state.blink_on = true;
        assert_eq!(led_frame(&state)[0], Rgb::new(0.0, 0.0, 0.25));
    }

    #[test]
    fn test_blink_interval_speeds_up_with_length() {
        assert_eq!(blink_interval_ms(0), 150);
        assert_eq!(blink_interval_ms(MAX_LOOP_SAMPLES / 2), 90);
        assert_eq!(blink_interval_ms(MAX_LOOP_SAMPLES), 30);
        assert_eq!(blink_interval_ms(usize::MAX), 30);
    }

    #[test]
    fn test_blink_state_toggles() {
        let mut blink = BlinkState::default();
        assert!(blink.update(1000, 100), "starts on");
        assert!(blink.update(1099, 100));
        assert!(!blink.update(1100, 100));
        assert!(!blink.update(1150, 100));
        assert!(blink.update(1200, 100));

        blink.stop();
        assert!(blink.update(5000, 100), "restarts on");
    }

    #[test]
    fn test_log_indicator_tracks_changes() {
        let mut indicator = LogIndicator::default();
        let frame = [Rgb::WHITE, Rgb::OFF];
        indicator.show(&frame);
        assert_eq!(indicator.last, Some(frame));
        indicator.show(&[Rgb::OFF, Rgb::OFF]);
        assert_eq!(indicator.last, Some([Rgb::OFF, Rgb::OFF]));
    }

    #[test]
    fn test_led_messages() {
        let config = LedOutputConfig::default();
        let messages = led_messages(&config, &[Rgb::new(1.0, 0.0, 0.5), Rgb::WHITE]);
        assert_eq!(
            messages,
            [(40, 127), (41, 0), (42, 64), (43, 127), (44, 127), (45, 127)]
        );
    }
}
