//! loopfx - reverb, delay and two-track looper effects unit
//!
//! This is the main entry point. It:
//! 1. Loads the YAML config
//! 2. Starts the duplex audio streams (the engine lives on the audio thread)
//! 3. Spawns the control-rate thread (surface, MIDI CC, LEDs)
//! 4. Runs until Enter is pressed
//!
//! ## Command line flags
//!
//! - `--config <path>`: Use a config file other than ~/.config/loopfx/config.yaml
//! - `--list-devices`: Print audio devices and MIDI ports, then exit
//! - `--write-default-config`: Write a default config file, then exit

mod config;
mod control;
mod indicator;
mod surface;

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use loopfx_core::audio::{get_input_devices, get_output_devices, start_audio_system, AudioDevice, AudioResult};
use loopfx_core::config::{load_config, save_config};
use loopfx_core::control::{ControlSurface, ParkedSurface, SharedControls};
use loopfx_core::engine::CommandSender;
use loopfx_midi::{list_input_ports, list_output_ports, MidiCcSource, MidiOutputHandler, CLIENT_NAME};

use config::UnitConfig;
use control::ControlLoop;
use indicator::{LogIndicator, MidiIndicator};
use surface::MidiSurface;

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();

    // Initialize logger - set RUST_LOG=debug for verbose output
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    if args.iter().any(|arg| arg == "--list-devices") {
        list_devices();
        return Ok(());
    }

    let config_path = arg_value(&args, "--config")
        .map(PathBuf::from)
        .unwrap_or_else(config::default_path);

    if args.iter().any(|arg| arg == "--write-default-config") {
        save_config(&UnitConfig::default(), &config_path)?;
        println!("Wrote default config to {}", config_path.display());
        return Ok(());
    }

    log::info!("loopfx starting up");
    let config: UnitConfig = load_config(&config_path);

    let controls = Arc::new(SharedControls::new());
    let audio = start_audio_system(&config.audio, Arc::clone(&controls))
        .context("Could not start audio")?;
    println!(
        "Audio running: {} Hz, {} frames ({:.1} ms){}",
        audio.sample_rate,
        audio.buffer_size,
        audio.latency_ms,
        if audio.handle.has_input() { "" } else { ", no input" }
    );

    let tick = Duration::from_millis(config.control.tick_interval_ms.max(1));
    let command_sender = audio.command_sender;
    let control = ControlLoop::spawn(
        move || build_control_loop(&config, controls, command_sender),
        tick,
    )?;

    println!("Press Enter to quit");
    wait_for_enter()?;

    control.shutdown();
    drop(audio.handle);
    println!("loopfx stopped.");
    Ok(())
}

/// Value following a `--flag` argument
fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|arg| arg == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

/// Block until Enter, or forever if stdin is closed (running as a service)
fn wait_for_enter() -> anyhow::Result<()> {
    let mut line = String::new();
    let read = std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read stdin")?;
    if read == 0 {
        log::info!("stdin closed, running until killed");
        loop {
            std::thread::park();
        }
    }
    Ok(())
}

/// Runs on the control thread: open MIDI ports and assemble the loop
fn build_control_loop(
    config: &UnitConfig,
    controls: Arc<SharedControls>,
    commands: CommandSender,
) -> ControlLoop {
    let midi = MidiCcSource::connect(&config.midi);
    if let Some(port) = midi.port_name() {
        log::info!("MIDI CC input: {}", port);
    }

    let mut link = None;
    let surface: Box<dyn ControlSurface> = match MidiSurface::connect(&config.surface) {
        Some((surface, handler)) => {
            link = Some(handler);
            Box::new(surface)
        }
        None => {
            log::info!("No control surface, knobs parked at center");
            Box::new(ParkedSurface::default())
        }
    };

    let mut control = ControlLoop::new(
        controls,
        config.control.knob_deadband,
        commands,
        surface,
        midi,
    )
    .with_indicator(Box::new(LogIndicator::default()));

    if let Some(handler) = link {
        control = control.with_link(handler);
        if let Some(leds) = config.surface.leds {
            match MidiOutputHandler::connect(&config.surface.port_match, CLIENT_NAME) {
                Some(output) => control = control.with_indicator(Box::new(MidiIndicator::new(output, leds))),
                None => log::warn!("Surface has no matching output port, LEDs are log-only"),
            }
        }
    }

    control
}

fn list_devices() {
    print_audio_devices("Audio inputs", get_input_devices());
    print_audio_devices("Audio outputs", get_output_devices());

    for (title, ports) in [
        ("MIDI inputs", list_input_ports()),
        ("MIDI outputs", list_output_ports()),
    ] {
        println!("{}:", title);
        match ports {
            Ok(ports) if ports.is_empty() => println!("  (none)"),
            Ok(ports) => ports.iter().for_each(|port| println!("  - {}", port)),
            Err(e) => println!("  unavailable: {}", e),
        }
    }
}

fn print_audio_devices(title: &str, devices: AudioResult<Vec<AudioDevice>>) {
    println!("{}:", title);
    match devices {
        Ok(devices) => {
            for device in devices {
                println!(
                    "  - {} (channels: {}, rates: {:?})",
                    device, device.max_channels, device.sample_rates
                );
            }
        }
        Err(e) => println!("  {}", e),
    }
}
