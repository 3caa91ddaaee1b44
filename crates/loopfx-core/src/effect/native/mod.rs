//! Native Rust effect primitives

mod delay;
mod reverb;

pub use delay::DelayLine;
pub use reverb::Reverb;
