//! Audio device enumeration
//!
//! Devices are listed from ALL available audio hosts (ALSA, PulseAudio,
//! CoreAudio, ...) so the capture and playback side can be picked from any
//! of them.

use cpal::traits::{DeviceTrait, HostTrait};
use cpal::{Host, HostId};

use super::config::DeviceId;
use super::error::{AudioError, AudioResult};

/// Stream direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
}

impl Direction {
    pub fn name(self) -> &'static str {
        match self {
            Direction::Input => "input",
            Direction::Output => "output",
        }
    }
}

/// Human-readable name for a host ID
fn host_name(host_id: HostId) -> String {
    let name = format!("{:?}", host_id);
    match name.as_str() {
        "Alsa" => "ALSA".to_string(),
        "Jack" => "JACK".to_string(),
        "Wasapi" => "WASAPI".to_string(),
        _ => name,
    }
}

fn get_host_by_name(name: &str) -> Option<Host> {
    cpal::available_hosts()
        .into_iter()
        .find(|&host_id| host_name(host_id) == name)
        .and_then(|host_id| cpal::host_from_id(host_id).ok())
}

fn host_devices(host: &Host, direction: Direction) -> Option<Vec<cpal::Device>> {
    let devices: Result<Vec<cpal::Device>, _> = match direction {
        Direction::Input => host.input_devices().map(|d| d.collect()),
        Direction::Output => host.output_devices().map(|d| d.collect()),
    };
    match devices {
        Ok(devices) => Some(devices),
        Err(e) => {
            log::debug!("Could not enumerate {} devices: {}", direction.name(), e);
            None
        }
    }
}

fn host_default_device(host: &Host, direction: Direction) -> Option<cpal::Device> {
    match direction {
        Direction::Input => host.default_input_device(),
        Direction::Output => host.default_output_device(),
    }
}

/// Information about one capture or playback device
#[derive(Debug, Clone)]
pub struct AudioDevice {
    /// Device identifier for configuration (includes host info)
    pub id: DeviceId,
    pub name: String,
    /// Host backend name (e.g., "ALSA")
    pub host: String,
    pub direction: Direction,
    /// Whether this is the default device for its host
    pub is_default: bool,
    /// Common sample rates the device supports
    pub sample_rates: Vec<u32>,
    pub max_channels: u16,
}

impl std::fmt::Display for AudioDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.host, self.name)?;
        if self.is_default {
            write!(f, " (default)")?;
        }
        Ok(())
    }
}

/// List every device for `direction` across all hosts
pub fn get_devices(direction: Direction) -> AudioResult<Vec<AudioDevice>> {
    let mut all_devices: Vec<AudioDevice> = Vec::new();

    for host_id in cpal::available_hosts() {
        let host = match cpal::host_from_id(host_id) {
            Ok(h) => h,
            Err(e) => {
                log::debug!("Could not initialize host {:?}: {}", host_id, e);
                continue;
            }
        };
        let host_name_str = host_name(host_id);
        let default_name = host_default_device(&host, direction).and_then(|d| d.name().ok());

        let Some(devices) = host_devices(&host, direction) else {
            continue;
        };

        for device in devices {
            let Ok(name) = device.name() else {
                continue;
            };

            let ranges: Vec<(u16, u32, u32)> = match direction {
                Direction::Input => device.supported_input_configs().map(|c| {
                    c.map(|r| (r.channels(), r.min_sample_rate().0, r.max_sample_rate().0))
                        .collect::<Vec<_>>()
                }),
                Direction::Output => device.supported_output_configs().map(|c| {
                    c.map(|r| (r.channels(), r.min_sample_rate().0, r.max_sample_rate().0))
                        .collect::<Vec<_>>()
                }),
            }
            .unwrap_or_default();

            if ranges.is_empty() {
                continue;
            }

            let mut sample_rates: Vec<u32> = Vec::new();
            let mut max_channels: u16 = 0;
            for &(channels, min_rate, max_rate) in &ranges {
                max_channels = max_channels.max(channels);
                for rate in [44100, 48000, 88200, 96000] {
                    if rate >= min_rate && rate <= max_rate && !sample_rates.contains(&rate) {
                        sample_rates.push(rate);
                    }
                }
            }
            sample_rates.sort();

            all_devices.push(AudioDevice {
                id: DeviceId::with_host(&name, &host_name_str),
                is_default: default_name.as_ref() == Some(&name),
                name,
                host: host_name_str.clone(),
                direction,
                sample_rates,
                max_channels,
            });
        }
    }

    if all_devices.is_empty() {
        return Err(AudioError::NoDevices(direction.name()));
    }

    // Default devices first, then by host, then by name
    all_devices.sort_by(|a, b| {
        b.is_default
            .cmp(&a.is_default)
            .then_with(|| a.host.cmp(&b.host))
            .then_with(|| a.name.cmp(&b.name))
    });

    log::debug!("Enumerated {} {} devices", all_devices.len(), direction.name());
    Ok(all_devices)
}

pub fn get_input_devices() -> AudioResult<Vec<AudioDevice>> {
    get_devices(Direction::Input)
}

pub fn get_output_devices() -> AudioResult<Vec<AudioDevice>> {
    get_devices(Direction::Output)
}

/// Resolve a configured device, or the default host's default device
pub fn open_device(id: Option<&DeviceId>, direction: Direction) -> AudioResult<cpal::Device> {
    match id {
        Some(id) => find_device_by_id(id, direction),
        None => host_default_device(&cpal::default_host(), direction)
            .ok_or(AudioError::NoDefaultDevice(direction.name())),
    }
}

/// Find a device by its ID
///
/// Uses the host named in the ID if available, otherwise searches every host.
pub fn find_device_by_id(id: &DeviceId, direction: Direction) -> AudioResult<cpal::Device> {
    let matches = |d: &cpal::Device| d.name().ok().as_ref() == Some(&id.name);

    if let Some(host) = id.host.as_deref().and_then(get_host_by_name) {
        return host_devices(&host, direction)
            .and_then(|devices| devices.into_iter().find(matches))
            .ok_or_else(|| AudioError::DeviceNotFound(id.display_label()));
    }

    cpal::available_hosts()
        .into_iter()
        .filter_map(|host_id| cpal::host_from_id(host_id).ok())
        .filter_map(|host| host_devices(&host, direction))
        .flatten()
        .find(matches)
        .ok_or_else(|| AudioError::DeviceNotFound(id.display_label()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_enumeration() {
        // No assertions: CI machines usually have no sound card
        for direction in [Direction::Input, Direction::Output] {
            match get_devices(direction) {
                Ok(devices) => {
                    println!("Found {} {} devices:", devices.len(), direction.name());
                    for device in &devices {
                        println!(
                            "  - {} (channels: {}, rates: {:?})",
                            device, device.max_channels, device.sample_rates
                        );
                    }
                }
                Err(AudioError::NoDevices(_)) => {
                    println!("No {} devices available (expected in CI)", direction.name());
                }
                Err(e) => println!("Error enumerating devices: {}", e),
            }
        }
    }

    #[test]
    fn test_host_names() {
        assert_eq!(Direction::Input.name(), "input");
        let label = host_name(cpal::default_host().id());
        assert!(!label.is_empty());
    }
}
