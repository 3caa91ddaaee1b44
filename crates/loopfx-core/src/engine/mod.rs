//! Audio-thread engine: transport commands, parameter smoothing, mode dispatch
//! and the fixed-block callback driver

mod callback;
mod command;
#[allow(clippy::module_inception)]
mod engine;
mod smoothing;

pub use callback::*;
pub use command::*;
pub use engine::*;
pub use smoothing::*;
