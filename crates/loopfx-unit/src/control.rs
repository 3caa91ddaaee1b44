//! Control-rate thread
//!
//! Every tick: poll the surface, apply drained MIDI, then refresh the LEDs.
//! The loop runs on its own thread at `tick_interval_ms` and never touches
//! the audio thread except through [`SharedControls`] and the command queue.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam::channel::{self, Sender};

use loopfx_core::control::{
    Button, ControlRouter, ControlSurface, SharedControls, SurfaceFrame,
};
use loopfx_core::engine::CommandSender;
use loopfx_core::TrackId;
use loopfx_midi::{MidiCcSource, MidiInputHandler};

use crate::indicator::{
    blink_interval_ms, led_frame, BlinkState, Indicator, IndicatorInput, LedFrame, Rgb,
    STARTUP_FLASH_MS,
};

pub struct ControlLoop {
    router: ControlRouter,
    commands: CommandSender,
    surface: Box<dyn ControlSurface>,
    midi: MidiCcSource,
    indicators: Vec<Box<dyn Indicator>>,
    blink: BlinkState,
    /// Port handles that must outlive the loop
    _links: Vec<MidiInputHandler>,
}

impl ControlLoop {
    pub fn new(
        controls: Arc<SharedControls>,
        knob_deadband: f32,
        commands: CommandSender,
        surface: Box<dyn ControlSurface>,
        midi: MidiCcSource,
    ) -> Self {
        Self {
            router: ControlRouter::new(controls, knob_deadband),
            commands,
            surface,
            midi,
            indicators: Vec::new(),
            blink: BlinkState::default(),
            _links: Vec::new(),
        }
    }

    pub fn with_indicator(mut self, indicator: Box<dyn Indicator>) -> Self {
        self.indicators.push(indicator);
        self
    }

    /// Keep a MIDI connection alive for as long as the loop runs
    pub fn with_link(mut self, link: MidiInputHandler) -> Self {
        self._links.push(link);
        self
    }

    pub fn controls(&self) -> &Arc<SharedControls> {
        self.router.controls()
    }

    /// Run one tick; `elapsed_ms` is time since the loop started
    pub fn tick(&mut self, elapsed_ms: u64) -> LedFrame {
        let frame = self.surface.poll();
        self.router.apply_surface(&frame, &mut self.commands);

        for event in self.midi.drain() {
            self.router.apply_midi(event);
        }

        let leds = self.leds(&frame, elapsed_ms);
        for indicator in &mut self.indicators {
            indicator.show(&leds);
        }
        leds
    }

    fn leds(&mut self, frame: &SurfaceFrame, elapsed_ms: u64) -> LedFrame {
        if elapsed_ms < STARTUP_FLASH_MS {
            return [Rgb::WHITE; 2];
        }

        let controls = self.router.controls();
        let held = Button::ALL.map(|b| frame.button(b).pressed);

        let blink_on = if frame.any_held() {
            let length = Button::ALL
                .iter()
                .filter(|&&b| held[b as usize])
                .map(|&b| controls.track(b.track()).length())
                .max()
                .unwrap_or(0);
            self.blink.update(elapsed_ms, blink_interval_ms(length))
        } else {
            self.blink.stop();
            false
        };

        led_frame(&IndicatorInput {
            mode: self.router.mode(),
            knobs: frame.knobs,
            tracks: TrackId::ALL.map(|id| controls.track(id).status()),
            held,
            blink_on,
        })
    }

    /// Tick until `shutdown` fires or its sender is dropped
    pub fn run(mut self, interval: Duration, shutdown: channel::Receiver<()>) {
        log::info!(
            "Control loop started (surface: {}, tick {:?})",
            self.surface.name(),
            interval
        );
        let started = Instant::now();
        let ticker = channel::tick(interval);

        loop {
            crossbeam::select! {
                recv(ticker) -> _ => {
                    let elapsed_ms = started.elapsed().as_millis() as u64;
                    self.tick(elapsed_ms);
                }
                recv(shutdown) -> _ => {
                    log::info!("Control loop shutting down");
                    break;
                }
            }
        }

        for indicator in &mut self.indicators {
            indicator.show(&[Rgb::OFF; 2]);
        }
        if self.router.dropped_commands() > 0 {
            log::warn!(
                "{} transport commands were dropped on a full queue",
                self.router.dropped_commands()
            );
        }
    }

    /// Build the loop on a dedicated thread and run it there
    ///
    /// MIDI connections are opened by `build` on the control thread itself,
    /// so nothing port-related has to cross threads.
    pub fn spawn<F>(build: F, interval: Duration) -> anyhow::Result<ControlHandle>
    where
        F: FnOnce() -> ControlLoop + Send + 'static,
    {
        let (shutdown_tx, shutdown_rx) = channel::bounded(1);
        let thread = thread::Builder::new()
            .name("loopfx-control".into())
            .spawn(move || build().run(interval, shutdown_rx))?;

        Ok(ControlHandle {
            shutdown_tx,
            thread: Some(thread),
        })
    }
}

/// Handle to the running control thread
pub struct ControlHandle {
    shutdown_tx: Sender<()>,
    thread: Option<thread::JoinHandle<()>>,
}

impl ControlHandle {
    /// Stop the loop and wait for it to finish
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let _ = self.shutdown_tx.try_send(());
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::error!("Control thread panicked");
            }
        }
    }
}

impl Drop for ControlHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loopfx_core::control::{ButtonState, ControlEvent, Mode, Param, ParkedSurface};
    use loopfx_core::engine::{command_channel, EngineCommand};
    use loopfx_core::looper::TrackStatus;
    use std::sync::atomic::Ordering;

    /// Plays back a scripted list of frames, then rests
    struct ScriptedSurface {
        frames: Vec<SurfaceFrame>,
    }

    impl ControlSurface for ScriptedSurface {
        fn poll(&mut self) -> SurfaceFrame {
            if self.frames.is_empty() {
                SurfaceFrame::resting()
            } else {
                self.frames.remove(0)
            }
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    fn setup(
        surface: Box<dyn ControlSurface>,
        midi: MidiCcSource,
    ) -> (ControlLoop, rtrb::Consumer<EngineCommand>) {
        let controls = Arc::new(SharedControls::new());
        let (tx, rx) = command_channel();
        let control = ControlLoop::new(controls, 0.01, CommandSender::new(tx), surface, midi);
        (control, rx)
    }

    fn pressed(button: usize) -> SurfaceFrame {
        let mut frame = SurfaceFrame::resting();
        frame.buttons[button] = ButtonState {
            pressed: true,
            rising: true,
        };
        frame
    }

    #[test]
    fn test_startup_flash() {
        let (mut control, _rx) = setup(Box::new(ParkedSurface::default()), MidiCcSource::disconnected());
        assert_eq!(control.tick(0), [Rgb::WHITE; 2]);
        assert_eq!(control.tick(STARTUP_FLASH_MS - 1), [Rgb::WHITE; 2]);
        assert_eq!(
            control.tick(STARTUP_FLASH_MS),
            [Rgb::new(0.0, 0.0, 0.5); 2],
            "reverb mode shows the parked knobs in blue"
        );
    }

    #[test]
    fn test_midi_drained_every_tick() {
        let (tx, rx) = flume::unbounded();
        let (mut control, _rx) = setup(
            Box::new(ParkedSurface::default()),
            MidiCcSource::from_receiver(rx),
        );
        tx.send(ControlEvent::SetParam {
            param: Param::DryWet,
            value: 0.9,
        })
        .unwrap();
        tx.send(ControlEvent::StepMode(1)).unwrap();

        control.tick(1000);
        assert_eq!(control.controls().arbiter.resolve(Param::DryWet), 0.9);
        assert_eq!(control.controls().mode.mode(), Mode::Delay);
    }

    #[test]
    fn test_button_press_sends_transport_and_blinks() {
        let surface = ScriptedSurface {
            frames: vec![pressed(0)],
        };
        let (mut control, mut rx) = setup(Box::new(surface), MidiCcSource::disconnected());
        control.controls().mode.set_mode(Mode::Loop);

        let leds = control.tick(1000);
        assert!(matches!(rx.pop(), Ok(EngineCommand::Transport { track: TrackId::A })));
        assert_eq!(leds, [Rgb::WHITE, Rgb::OFF], "held button blinks white, starting on");

        // Released: back to track colours
        let leds = control.tick(1001);
        assert_eq!(leds, [Rgb::new(0.2, 0.2, 0.2); 2]);
    }

    #[test]
    fn test_loop_leds_follow_published_status() {
        let (mut control, _rx) = setup(Box::new(ParkedSurface::default()), MidiCcSource::disconnected());
        control.controls().mode.set_mode(Mode::Loop);
        control
            .controls()
            .track(TrackId::B)
            .status
            .store(TrackStatus::Recording as u8, Ordering::Relaxed);

        let leds = control.tick(1000);
        assert_eq!(leds[0], Rgb::new(0.2, 0.2, 0.2));
        assert_eq!(leds[1], Rgb::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_spawn_and_shutdown() {
        let handle = ControlLoop::spawn(
            || {
                let controls = Arc::new(SharedControls::new());
                let (tx, _rx) = command_channel();
                ControlLoop::new(
                    controls,
                    0.01,
                    CommandSender::new(tx),
                    Box::new(ParkedSurface::default()),
                    MidiCcSource::disconnected(),
                )
            },
            Duration::from_millis(1),
        )
        .unwrap();
        thread::sleep(Duration::from_millis(10));
        handle.shutdown();
    }
}
