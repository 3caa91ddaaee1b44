//! loopfx MIDI - control-change input and LED feedback
//!
//! # Architecture
//!
//! ```text
//! MIDI port ─► midir callback ─► MidiInputEvent::parse ─► CcMapper
//!                                                            │
//!                                      flume::bounded(256)  ◄┘
//!                                                            │
//!                              control loop: MidiCcSource::drain ─► ControlRouter
//! ```
//!
//! The midir callback runs on the MIDI driver's thread and never blocks: it
//! `try_send`s into a bounded channel and drops events when the control loop
//! falls behind.
//!
//! # Example
//!
//! ```ignore
//! let midi = MidiCcSource::connect(&config.midi);
//! // in the control loop:
//! for event in midi.drain() {
//!     router.apply_midi(event);
//! }
//! ```

pub mod config;
mod connection;
mod input;
mod mapping;
mod normalize;
mod output;

pub use config::{CcMap, CcTarget, ControlAddress, EncoderMode, MidiConfig};
pub use connection::{list_input_ports, list_output_ports, port_matches, MidiConnectionError};
pub use input::{MidiInputEvent, MidiInputHandler};
pub use mapping::CcMapper;
pub use normalize::{
    absolute_delta, cc_to_delay_ms, denormalize_to_midi, encoder_to_delta, normalize_cc_value,
    ControlRange,
};
pub use output::{encode_cc, MidiOutputHandler};

use loopfx_core::control::ControlEvent;

/// Capacity of the callback-to-control-loop channel
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// MIDI client name announced to the OS
pub const CLIENT_NAME: &str = "loopfx";

/// Error type for MIDI operations
#[derive(Debug, thiserror::Error)]
pub enum MidiError {
    #[error("MIDI connection error: {0}")]
    ConnectionError(#[from] MidiConnectionError),

    #[error("MIDI output error: {0}")]
    OutputError(String),
}

/// Mapped CC events from a MIDI input port
///
/// Always constructible: with no port (or MIDI disabled) it simply never
/// yields anything, and the unit runs on the surface alone.
pub struct MidiCcSource {
    rx: flume::Receiver<ControlEvent>,
    input: Option<MidiInputHandler>,
}

impl MidiCcSource {
    /// Connect according to `config`, degrading to a silent source on failure
    pub fn connect(config: &MidiConfig) -> Self {
        if !config.enabled {
            log::info!("MIDI: Disabled in config");
            return Self::disconnected();
        }

        match Self::try_connect(config) {
            Ok(source) => source,
            Err(e) => {
                log::info!("MIDI: {}, running without MIDI support", e);
                Self::disconnected()
            }
        }
    }

    /// Connect according to `config`, reporting why it failed
    pub fn try_connect(config: &MidiConfig) -> Result<Self, MidiError> {
        let (tx, rx) = flume::bounded(EVENT_CHANNEL_CAPACITY);
        let mapper = CcMapper::from_config(config);

        let handler = MidiInputHandler::connect(&config.port_match, CLIENT_NAME, move |event| {
            let Some(mapped) = mapper.map_event(&event) else {
                return;
            };
            if tx.try_send(mapped).is_err() {
                log::warn!("MIDI: Event channel full, dropping {:?}", mapped);
            }
        })?;

        Ok(Self {
            rx,
            input: Some(handler),
        })
    }

    /// A source with no port behind it
    pub fn disconnected() -> Self {
        let (_tx, rx) = flume::bounded(1);
        Self { rx, input: None }
    }

    /// Build a source from an existing channel (tests and virtual inputs)
    pub fn from_receiver(rx: flume::Receiver<ControlEvent>) -> Self {
        Self { rx, input: None }
    }

    pub fn is_connected(&self) -> bool {
        self.input.is_some()
    }

    pub fn port_name(&self) -> Option<&str> {
        self.input.as_ref().map(|input| input.port_name())
    }

    pub fn try_recv(&self) -> Option<ControlEvent> {
        self.rx.try_recv().ok()
    }

    /// Everything received since the last call, oldest first
    pub fn drain(&self) -> impl Iterator<Item = ControlEvent> + '_ {
        self.rx.try_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loopfx_core::control::Param;

    #[test]
    fn test_disconnected_source_is_empty() {
        let source = MidiCcSource::disconnected();
        assert!(!source.is_connected());
        assert_eq!(source.port_name(), None);
        assert_eq!(source.try_recv(), None);
        assert_eq!(source.drain().count(), 0);
    }

    #[test]
    fn test_disabled_config_never_connects() {
        let config = MidiConfig {
            enabled: false,
            ..MidiConfig::default()
        };
        assert!(!MidiCcSource::connect(&config).is_connected());
    }

    #[test]
    fn test_drain_preserves_order() {
        let (tx, rx) = flume::bounded(EVENT_CHANNEL_CAPACITY);
        let source = MidiCcSource::from_receiver(rx);
        let mapper = CcMapper::from_config(&MidiConfig::default());

        for value in [0u8, 64, 127] {
            let event = MidiInputEvent::ControlChange {
                channel: 0,
                cc: 10,
                value,
            };
            tx.send(mapper.map_event(&event).unwrap()).unwrap();
        }

        let values: Vec<f32> = source
            .drain()
            .map(|e| match e {
                ControlEvent::SetParam {
                    param: Param::DryWet,
                    value,
                } => value,
                other => panic!("unexpected event {:?}", other),
            })
            .collect();
        assert_eq!(values.len(), 3);
        assert_eq!(values[0], 0.0);
        assert_eq!(values[2], 1.0);
        assert_eq!(source.drain().count(), 0);
    }
}
