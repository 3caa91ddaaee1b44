//! MIDI input handling
//!
//! Receives raw bytes from the midir callback thread, parses them with midly
//! and hands the resulting [`MidiInputEvent`] to a caller-supplied closure.
//! The closure runs on the driver thread and must not block; callers forward
//! into a bounded flume channel.

use midir::MidiInputConnection;
use midly::live::LiveEvent;
use midly::MidiMessage;

use crate::config::ControlAddress;
use crate::connection::{find_input_port, MidiConnectionError};

/// Raw MIDI input event (before mapping)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiInputEvent {
    NoteOn { channel: u8, note: u8, velocity: u8 },
    NoteOff { channel: u8, note: u8, velocity: u8 },
    ControlChange { channel: u8, cc: u8, value: u8 },
}

impl MidiInputEvent {
    /// Parse raw MIDI bytes into an event
    ///
    /// Note On with velocity 0 is reported as Note Off. Anything other than
    /// notes and control changes is ignored.
    pub fn parse(data: &[u8]) -> Option<Self> {
        let LiveEvent::Midi { channel, message } = LiveEvent::parse(data).ok()? else {
            return None;
        };
        let channel = channel.as_int();

        match message {
            MidiMessage::NoteOn { key, vel } if vel.as_int() == 0 => Some(Self::NoteOff {
                channel,
                note: key.as_int(),
                velocity: 0,
            }),
            MidiMessage::NoteOn { key, vel } => Some(Self::NoteOn {
                channel,
                note: key.as_int(),
                velocity: vel.as_int(),
            }),
            MidiMessage::NoteOff { key, vel } => Some(Self::NoteOff {
                channel,
                note: key.as_int(),
                velocity: vel.as_int(),
            }),
            MidiMessage::Controller { controller, value } => Some(Self::ControlChange {
                channel,
                cc: controller.as_int(),
                value: value.as_int(),
            }),
            _ => None,
        }
    }

    pub fn channel(&self) -> u8 {
        match *self {
            Self::NoteOn { channel, .. }
            | Self::NoteOff { channel, .. }
            | Self::ControlChange { channel, .. } => channel,
        }
    }

    /// Whether this event comes from the given control
    pub fn matches(&self, address: &ControlAddress) -> bool {
        match (*self, *address) {
            (
                Self::NoteOn { channel, note, .. } | Self::NoteOff { channel, note, .. },
                ControlAddress::Note {
                    channel: ch,
                    note: n,
                },
            ) => channel == ch && note == n,
            (
                Self::ControlChange { channel, cc, .. },
                ControlAddress::Cc {
                    channel: ch,
                    cc: c,
                },
            ) => channel == ch && cc == c,
            _ => false,
        }
    }

    /// "Down" event: Note On, or CC above the midpoint
    pub fn is_press(&self) -> bool {
        match *self {
            Self::NoteOn { velocity, .. } => velocity > 0,
            Self::ControlChange { value, .. } => value > 63,
            Self::NoteOff { .. } => false,
        }
    }

    /// Velocity for notes, value for CC
    pub fn value(&self) -> u8 {
        match *self {
            Self::NoteOn { velocity, .. } | Self::NoteOff { velocity, .. } => velocity,
            Self::ControlChange { value, .. } => value,
        }
    }
}

type EventSink = Box<dyn FnMut(MidiInputEvent) + Send>;

/// Owns a midir input connection; dropping it disconnects
pub struct MidiInputHandler {
    _connection: MidiInputConnection<EventSink>,
    port_name: String,
}

impl MidiInputHandler {
    /// Connect to the first input port matching `port_match`
    ///
    /// `on_event` is called on the MIDI driver thread for every parsed
    /// event.
    pub fn connect<F>(port_match: &str, client_name: &str, on_event: F) -> Result<Self, MidiConnectionError>
    where
        F: FnMut(MidiInputEvent) + Send + 'static,
    {
        let (midi_in, port, port_name) = find_input_port(port_match, client_name)?;

        let sink: EventSink = Box::new(on_event);
        let connection = midi_in
            .connect(&port, client_name, Self::midi_callback, sink)
            .map_err(|e| MidiConnectionError::ConnectionError {
                port: port_name.clone(),
                reason: e.to_string(),
            })?;

        log::info!("MIDI: Input handler connected to {}", port_name);
        Ok(Self {
            _connection: connection,
            port_name,
        })
    }

    fn midi_callback(_timestamp: u64, data: &[u8], sink: &mut EventSink) {
        if let Some(event) = MidiInputEvent::parse(data) {
            sink(event);
        }
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cc() {
        let event = MidiInputEvent::parse(&[0xB2, 0x0C, 0x64]).unwrap();
        assert_eq!(
            event,
            MidiInputEvent::ControlChange {
                channel: 2,
                cc: 12,
                value: 100
            }
        );
        assert_eq!(event.channel(), 2);
    }

    #[test]
    fn test_parse_notes() {
        assert_eq!(
            MidiInputEvent::parse(&[0x90, 0x24, 0x7F]),
            Some(MidiInputEvent::NoteOn {
                channel: 0,
                note: 36,
                velocity: 127
            })
        );
        assert_eq!(
            MidiInputEvent::parse(&[0x80, 0x24, 0x40]),
            Some(MidiInputEvent::NoteOff {
                channel: 0,
                note: 36,
                velocity: 64
            })
        );
    }

    #[test]
    fn test_note_on_zero_velocity_is_note_off() {
        let event = MidiInputEvent::parse(&[0x91, 0x3C, 0x00]).unwrap();
        assert!(matches!(event, MidiInputEvent::NoteOff { channel: 1, note: 0x3C, .. }));
        assert!(!event.is_press());
    }

    #[test]
    fn test_ignores_other_messages() {
        assert_eq!(MidiInputEvent::parse(&[0xE0, 0x00, 0x40]), None, "pitch bend");
        assert_eq!(MidiInputEvent::parse(&[0xF8]), None, "clock");
        assert_eq!(MidiInputEvent::parse(&[]), None);
        assert_eq!(MidiInputEvent::parse(&[0xB0, 0x0A]), None, "truncated");
    }

    #[test]
    fn test_matches_address() {
        let note = MidiInputEvent::NoteOn {
            channel: 0,
            note: 36,
            velocity: 100,
        };
        assert!(note.matches(&ControlAddress::note(0, 36)));
        assert!(!note.matches(&ControlAddress::note(1, 36)));
        assert!(!note.matches(&ControlAddress::cc(0, 36)));

        let cc = MidiInputEvent::ControlChange {
            channel: 0,
            cc: 21,
            value: 5,
        };
        assert!(cc.matches(&ControlAddress::cc(0, 21)));
        assert!(!cc.is_press());
        assert_eq!(cc.value(), 5);
    }
}
