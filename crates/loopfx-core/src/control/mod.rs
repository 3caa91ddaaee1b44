//! Control-rate side of the unit
//!
//! - [`ParameterArbiter`]: manual vs MIDI candidates, last writer wins
//! - [`ModeController`]: Reverb / Delay / Loop cycle and input routing
//! - [`SharedControls`]: the atomic store shared with the audio thread
//! - [`ControlRouter`]: applies surface frames and MIDI events to the store
//! - [`ControlSurface`]: the polling boundary to knobs, encoder and buttons

mod arbiter;
mod clock;
mod mode;
mod router;
mod store;
mod surface;

pub use arbiter::{Param, ParameterArbiter, Source, MAX_DELAY_MS};
pub use clock::{ControlClock, Timestamp};
pub use mode::{knob_target, mode_cc_step, Button, Knob, Mode, ModeController};
pub use router::{ControlRouter, DEFAULT_KNOB_DEADBAND};
pub use store::SharedControls;
pub use surface::{ButtonState, ButtonTracker, ControlSurface, ParkedSurface, SurfaceFrame};

/// A decoded MIDI control event, ready for the router
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlEvent {
    /// Set a continuous parameter (already scaled to its range)
    SetParam { param: Param, value: f32 },
    /// Move the mode by a signed number of steps
    StepMode(i32),
}
