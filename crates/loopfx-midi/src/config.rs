//! MIDI configuration
//!
//! ```yaml
//! midi:
//!   enabled: true
//!   port_match: "Daisy"
//!   channel: null        # accept every channel
//!   cc_map:
//!     drywet: 10
//!     feedback: 11
//!     delay: 12
//!     mode: 13
//!     crossfade: 14
//! ```

use serde::{Deserialize, Serialize};

/// CC input settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MidiConfig {
    /// Connect to a MIDI input at all
    pub enabled: bool,
    /// Case-insensitive substring of the input port name; empty takes the
    /// first port
    pub port_match: String,
    /// Only accept messages on this channel (0-15); None accepts all
    pub channel: Option<u8>,
    /// Controller numbers for each target
    pub cc_map: CcMap,
}

impl Default for MidiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port_match: String::new(),
            channel: None,
            cc_map: CcMap::default(),
        }
    }
}

/// What a mapped controller drives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CcTarget {
    DryWet,
    Feedback,
    DelayMs,
    Mode,
    Crossfade,
}

/// Controller number per target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CcMap {
    pub drywet: u8,
    pub feedback: u8,
    pub delay: u8,
    pub mode: u8,
    pub crossfade: u8,
}

impl Default for CcMap {
    fn default() -> Self {
        Self {
            drywet: 10,
            feedback: 11,
            delay: 12,
            mode: 13,
            crossfade: 14,
        }
    }
}

impl CcMap {
    /// Target driven by a controller number
    ///
    /// If two targets share a number the first in declaration order wins.
    pub fn lookup(&self, cc: u8) -> Option<CcTarget> {
        [
            (self.drywet, CcTarget::DryWet),
            (self.feedback, CcTarget::Feedback),
            (self.delay, CcTarget::DelayMs),
            (self.mode, CcTarget::Mode),
            (self.crossfade, CcTarget::Crossfade),
        ]
        .into_iter()
        .find_map(|(number, target)| (number == cc).then_some(target))
    }
}

/// A physical control on a MIDI controller (Note or CC)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlAddress {
    Note {
        /// MIDI channel (0-15)
        channel: u8,
        note: u8,
    },
    Cc {
        /// MIDI channel (0-15)
        channel: u8,
        cc: u8,
    },
}

impl ControlAddress {
    pub fn note(channel: u8, note: u8) -> Self {
        Self::Note { channel, note }
    }

    pub fn cc(channel: u8, cc: u8) -> Self {
        Self::Cc { channel, cc }
    }
}

/// Encoder interpretation mode
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EncoderMode {
    /// Absolute value (0-127), change relative to the previous value
    Absolute,
    /// Relative: 1-63 = clockwise, 65-127 = counter-clockwise
    #[default]
    Relative,
    /// Relative with 64 as center: <64 = CCW, >64 = CW
    RelativeSigned,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_cc_map() {
        let map = CcMap::default();
        assert_eq!(map.lookup(10), Some(CcTarget::DryWet));
        assert_eq!(map.lookup(11), Some(CcTarget::Feedback));
        assert_eq!(map.lookup(12), Some(CcTarget::DelayMs));
        assert_eq!(map.lookup(13), Some(CcTarget::Mode));
        assert_eq!(map.lookup(14), Some(CcTarget::Crossfade));
        assert_eq!(map.lookup(7), None);
    }

    #[test]
    fn test_control_address_yaml() {
        let yaml = "type: note\nchannel: 0\nnote: 36\n";
        let address: ControlAddress = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(address, ControlAddress::note(0, 36));

        let yaml = serde_yaml::to_string(&ControlAddress::cc(2, 21)).unwrap();
        assert!(yaml.contains("type: cc"), "got {}", yaml);
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: MidiConfig = serde_yaml::from_str("port_match: Daisy\ncc_map:\n  mode: 20\n").unwrap();
        assert_eq!(config.port_match, "Daisy");
        assert!(config.enabled);
        assert_eq!(config.cc_map.mode, 20);
        assert_eq!(config.cc_map.drywet, 10);
    }
}
