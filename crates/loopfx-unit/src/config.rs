//! Unit configuration
//!
//! Stored as YAML in the user's config directory.
//! Default location: ~/.config/loopfx/config.yaml

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use loopfx_core::audio::AudioConfig;
use loopfx_core::config::default_config_path;
use loopfx_core::control::DEFAULT_KNOB_DEADBAND;
use loopfx_midi::{ControlAddress, EncoderMode, MidiConfig};

pub const CONFIG_FILENAME: &str = "config.yaml";

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitConfig {
    /// Capture/playback devices and stream settings
    pub audio: AudioConfig,
    /// CC input (external sequencer, DAW, ...)
    pub midi: MidiConfig,
    /// Controller standing in for the knobs, encoder and buttons
    pub surface: SurfaceConfig,
    pub control: ControlConfig,
}

/// A MIDI controller acting as the physical surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    pub enabled: bool,
    /// Case-insensitive substring of the controller's port name
    pub port_match: String,
    /// Absolute CC knobs
    pub knob1: ControlAddress,
    pub knob2: ControlAddress,
    pub encoder: ControlAddress,
    pub encoder_mode: EncoderMode,
    /// Transport buttons (note or CC press)
    pub button1: ControlAddress,
    pub button2: ControlAddress,
    /// RGB feedback on the controller's output port
    pub leds: Option<LedOutputConfig>,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port_match: String::new(),
            knob1: ControlAddress::cc(0, 21),
            knob2: ControlAddress::cc(0, 22),
            encoder: ControlAddress::cc(0, 23),
            encoder_mode: EncoderMode::default(),
            button1: ControlAddress::note(0, 36),
            button2: ControlAddress::note(0, 37),
            leds: None,
        }
    }
}

/// CC numbers carrying each LED's red, green and blue channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedOutputConfig {
    pub channel: u8,
    pub led1: [u8; 3],
    pub led2: [u8; 3],
}

impl Default for LedOutputConfig {
    fn default() -> Self {
        Self {
            channel: 0,
            led1: [40, 41, 42],
            led2: [43, 44, 45],
        }
    }
}

/// Control-rate thread settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    /// Surface poll interval
    pub tick_interval_ms: u64,
    /// Knob movement (fraction of travel) needed to count as a manual update
    pub knob_deadband: f32,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1,
            knob_deadband: DEFAULT_KNOB_DEADBAND,
        }
    }
}

/// ~/.config/loopfx/config.yaml
pub fn default_path() -> PathBuf {
    default_config_path(CONFIG_FILENAME)
}

#[cfg(test)]
mod tests {
    use super::*;
    use loopfx_core::audio::BufferSize;
    use loopfx_core::config::{load_config, save_config};

    #[test]
    fn test_defaults() {
        let config = UnitConfig::default();
        assert!(config.midi.enabled);
        assert!(!config.surface.enabled, "surface must be opted into");
        assert_eq!(config.control.tick_interval_ms, 1);
        assert_eq!(config.control.knob_deadband, 0.01);
        assert_eq!(config.midi.cc_map.mode, 13);
    }

    #[test]
    fn test_roundtrip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILENAME);

        let mut config = UnitConfig::default();
        config.audio.buffer_size = BufferSize::Fixed(64);
        config.midi.channel = Some(2);
        config.surface.enabled = true;
        config.surface.port_match = "Launch Control".to_string();
        config.surface.leds = Some(LedOutputConfig::default());
        config.control.tick_interval_ms = 2;

        save_config(&config, &path).unwrap();
        let loaded: UnitConfig = load_config(&path);
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let yaml = r#"
midi:
  port_match: "Daisy"
  cc_map:
    drywet: 20
surface:
  enabled: true
  button1:
    type: cc
    channel: 0
    cc: 64
"#;
        let config: UnitConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.midi.port_match, "Daisy");
        assert_eq!(config.midi.cc_map.drywet, 20);
        assert_eq!(config.midi.cc_map.feedback, 11, "unset CCs keep their defaults");
        assert_eq!(config.surface.button1, ControlAddress::cc(0, 64));
        assert_eq!(config.surface.button2, ControlAddress::note(0, 37));
        assert_eq!(config.control, ControlConfig::default());
    }
}
