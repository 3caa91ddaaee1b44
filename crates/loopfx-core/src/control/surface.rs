//! Control surface boundary
//!
//! A surface is polled once per control-rate tick and reports two knob
//! readings, the encoder movement since the last poll, and level plus
//! rising-edge state of the two buttons. ADC smoothing and debouncing happen
//! behind this trait.

use super::mode::{Button, Knob};

/// Level and edge state of one button for a single tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonState {
    /// Currently held down
    pub pressed: bool,
    /// Went down since the previous tick
    pub rising: bool,
}

/// Everything a surface reports for one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceFrame {
    /// Knob readings in [0, 1]
    pub knobs: [f32; 2],
    /// Signed encoder detents since the previous tick
    pub encoder: i32,
    pub buttons: [ButtonState; 2],
}

impl SurfaceFrame {
    /// Knobs centered, nothing moved or pressed
    pub fn resting() -> Self {
        Self {
            knobs: [0.5, 0.5],
            encoder: 0,
            buttons: [ButtonState::default(); 2],
        }
    }

    #[inline]
    pub fn knob(&self, knob: Knob) -> f32 {
        self.knobs[knob as usize]
    }

    #[inline]
    pub fn button(&self, button: Button) -> ButtonState {
        self.buttons[button as usize]
    }

    /// Whether any transport button is held
    pub fn any_held(&self) -> bool {
        self.buttons.iter().any(|b| b.pressed)
    }
}

impl Default for SurfaceFrame {
    fn default() -> Self {
        Self::resting()
    }
}

/// A pollable source of knob, encoder and button state
pub trait ControlSurface: Send {
    /// Read the surface for this tick
    fn poll(&mut self) -> SurfaceFrame;

    /// Human-readable name for logging
    fn name(&self) -> &str;
}

/// Derives rising edges from a level-only button reading
#[derive(Debug, Clone, Copy, Default)]
pub struct ButtonTracker {
    was_pressed: bool,
}

impl ButtonTracker {
    /// Feed this tick's level, get level + edge
    pub fn update(&mut self, pressed: bool) -> ButtonState {
        let rising = pressed && !self.was_pressed;
        self.was_pressed = pressed;
        ButtonState { pressed, rising }
    }
}

/// A surface with nothing attached: knobs parked, no input ever
///
/// Used when no surface device is found, so the unit runs on MIDI alone.
#[derive(Debug, Clone, Copy)]
pub struct ParkedSurface {
    knobs: [f32; 2],
}

impl ParkedSurface {
    pub fn new(knobs: [f32; 2]) -> Self {
        Self { knobs }
    }
}

impl Default for ParkedSurface {
    fn default() -> Self {
        Self::new([0.5, 0.5])
    }
}

impl ControlSurface for ParkedSurface {
    fn poll(&mut self) -> SurfaceFrame {
        SurfaceFrame {
            knobs: self.knobs,
            ..SurfaceFrame::resting()
        }
    }

    fn name(&self) -> &str {
        "parked"
    }
}
