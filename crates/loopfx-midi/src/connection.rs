//! MIDI port discovery and connection
//!
//! Uses midir for cross-platform MIDI I/O (ALSA on Linux, CoreMIDI on macOS,
//! WinMM on Windows). Ports are picked by a case-insensitive substring of
//! their name.

use midir::{MidiInput, MidiInputPort, MidiOutput, MidiOutputConnection};

/// Why a MIDI port could not be opened
#[derive(Debug, thiserror::Error)]
pub enum MidiConnectionError {
    #[error("MIDI input unavailable: {0}")]
    InputInitError(#[from] midir::InitError),

    #[error("MIDI output unavailable: {0}")]
    OutputInitError(midir::InitError),

    #[error("No MIDI input ports available")]
    NoInputPorts,

    /// Ports exist but none contains the configured pattern
    #[error("No MIDI port matches \"{0}\"")]
    PortNotFound(String),

    #[error("Could not connect to {port}: {reason}")]
    ConnectionError { port: String, reason: String },
}

/// Whether a port name matches a user pattern
///
/// Case-insensitive substring match; an empty pattern matches any port.
pub fn port_matches(port_name: &str, pattern: &str) -> bool {
    port_name.to_lowercase().contains(&pattern.to_lowercase())
}

/// Find the first input port matching `port_match`
///
/// Returns the midir input (needed to connect), the port and its name.
pub fn find_input_port(
    port_match: &str,
    client_name: &str,
) -> Result<(MidiInput, MidiInputPort, String), MidiConnectionError> {
    let midi_in = MidiInput::new(client_name)?;

    let in_ports = midi_in.ports();
    if in_ports.is_empty() {
        return Err(MidiConnectionError::NoInputPorts);
    }

    let (port, name) = in_ports
        .into_iter()
        .filter_map(|port| midi_in.port_name(&port).ok().map(|name| (port, name)))
        .find(|(_, name)| port_matches(name, port_match))
        .ok_or_else(|| MidiConnectionError::PortNotFound(port_match.to_string()))?;

    log::info!("MIDI: Found input port: {}", name);
    Ok((midi_in, port, name))
}

/// Connect to the first output port matching `port_match`
///
/// Returns None (and logs why) if there is no such port.
pub fn connect_output(port_match: &str, client_name: &str) -> Option<MidiOutputConnection> {
    let midi_out = match MidiOutput::new(client_name) {
        Ok(out) => out,
        Err(e) => {
            log::warn!("MIDI: Failed to initialize output: {}", e);
            return None;
        }
    };

    let (port, name) = midi_out
        .ports()
        .into_iter()
        .filter_map(|port| midi_out.port_name(&port).ok().map(|name| (port, name)))
        .find(|(_, name)| port_matches(name, port_match))?;

    match midi_out.connect(&port, client_name) {
        Ok(conn) => {
            log::info!("MIDI: Connected to output port: {}", name);
            Some(conn)
        }
        Err(e) => {
            log::warn!("MIDI: Failed to connect to output {}: {}", name, e);
            None
        }
    }
}

/// Names of all MIDI input ports
pub fn list_input_ports() -> Result<Vec<String>, MidiConnectionError> {
    let midi_in = MidiInput::new("loopfx-list")?;

    Ok(midi_in
        .ports()
        .iter()
        .filter_map(|port| midi_in.port_name(port).ok())
        .collect())
}

/// Names of all MIDI output ports
pub fn list_output_ports() -> Result<Vec<String>, MidiConnectionError> {
    let midi_out = MidiOutput::new("loopfx-list").map_err(MidiConnectionError::OutputInitError)?;

    Ok(midi_out
        .ports()
        .iter()
        .filter_map(|port| midi_out.port_name(port).ok())
        .collect())
}
