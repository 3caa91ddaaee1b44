//! loopfx Core - real-time engine for the reverb / delay / looper effects unit
//!
//! The crate is split along the two execution contexts of the unit:
//!
//! - **Control rate**: [`control`] holds the shared parameter store, the
//!   last-writer-wins [`control::ParameterArbiter`] and the
//!   [`control::ModeController`]. A lower-priority thread feeds it from the
//!   control surface and MIDI.
//! - **Audio rate**: [`engine`] owns the [`looper::LoopMixer`] and the effect
//!   primitives and runs once per fixed-size block inside the audio callback.
//!
//! The two sides only meet through atomics and the lock-free transport
//! command queue.

pub mod audio;
pub mod config;
pub mod control;
pub mod effect;
pub mod engine;
pub mod looper;
pub mod types;

pub use types::*;
