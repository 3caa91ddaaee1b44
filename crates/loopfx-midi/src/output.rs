//! MIDI output for LED feedback
//!
//! Only control changes are sent. [`MidiOutputHandler::send_cc_if_changed`]
//! keeps a per-(channel, cc) cache so a steady LED state costs no traffic.

use std::collections::HashMap;

use midir::MidiOutputConnection;
use midly::live::LiveEvent;
use midly::num::{u4, u7};
use midly::MidiMessage;

use crate::connection::connect_output;
use crate::MidiError;

/// Encode a control change message
pub fn encode_cc(channel: u8, cc: u8, value: u8) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(3);
    write_cc(&mut bytes, channel, cc, value);
    bytes
}

fn write_cc(buffer: &mut Vec<u8>, channel: u8, cc: u8, value: u8) {
    let event = LiveEvent::Midi {
        channel: u4::from(channel & 0x0F),
        message: MidiMessage::Controller {
            controller: u7::from(cc & 0x7F),
            value: u7::from(value & 0x7F),
        },
    };
    // Writing into a Vec cannot fail
    let _ = event.write_std(buffer);
}

pub struct MidiOutputHandler {
    connection: MidiOutputConnection,
    last_values: HashMap<(u8, u8), u8>,
    buffer: Vec<u8>,
}

impl MidiOutputHandler {
    /// Connect to the first output port matching `port_match`
    pub fn connect(port_match: &str, client_name: &str) -> Option<Self> {
        let connection = connect_output(port_match, client_name)?;
        Some(Self {
            connection,
            last_values: HashMap::new(),
            buffer: Vec::with_capacity(3),
        })
    }

    pub fn send_cc(&mut self, channel: u8, cc: u8, value: u8) -> Result<(), MidiError> {
        self.buffer.clear();
        write_cc(&mut self.buffer, channel, cc, value);
        self.connection
            .send(&self.buffer)
            .map_err(|e| MidiError::OutputError(e.to_string()))?;
        self.last_values.insert((channel, cc), value & 0x7F);
        Ok(())
    }

    /// Send only if the value differs from the last one sent
    pub fn send_cc_if_changed(&mut self, channel: u8, cc: u8, value: u8) -> Result<(), MidiError> {
        if self.last_values.get(&(channel, cc)) == Some(&(value & 0x7F)) {
            return Ok(());
        }
        self.send_cc(channel, cc, value)
    }

    /// Forget cached values so the next update resends everything
    pub fn invalidate(&mut self) {
        self.last_values.clear();
    }
}
