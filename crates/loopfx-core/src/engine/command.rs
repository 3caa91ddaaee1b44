//! Lock-free transport command queue
//!
//! The control thread pushes loop transport commands and the audio thread
//! pops them at block boundaries, so a command never takes effect in the
//! middle of a block.
//!
//! The queue is an `rtrb` single-producer single-consumer ringbuffer,
//! allocated once at startup. Push and pop are wait-free.
//!
//! ```ignore
//! let (tx, rx) = command_channel();
//! let mut sender = CommandSender::new(tx);
//!
//! // Control thread
//! sender.send(EngineCommand::Transport { track: TrackId::A });
//!
//! // Audio thread, once per block
//! engine.process_commands(&mut rx);
//! ```

use crate::types::TrackId;

/// Commands sent from the control thread to the audio thread
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EngineCommand {
    /// Button transport: Idle → record, Recording → play, else toggle overdub
    Transport { track: TrackId },
    /// Start (or restart) recording
    StartRecording { track: TrackId },
    /// Close the recording and start looping
    StopRecording { track: TrackId },
    /// Playing ⇄ Overdubbing
    ToggleOverdub { track: TrackId },
    /// Return a track to Idle
    Reset { track: TrackId },
    /// Gate all writes into a track
    SetWriteEnabled { track: TrackId, enabled: bool },
    /// Set a track's output gain
    SetGain { track: TrackId, gain: f32 },
    /// Return both tracks to Idle
    ResetAll,
}

/// Queue capacity; also the most commands the audio thread drains per block
pub const COMMAND_QUEUE_CAPACITY: usize = 64;

/// Create the command queue
pub fn command_channel() -> (rtrb::Producer<EngineCommand>, rtrb::Consumer<EngineCommand>) {
    rtrb::RingBuffer::new(COMMAND_QUEUE_CAPACITY)
}

/// Command sender for the control thread
///
/// Wraps the lock-free producer. All operations are non-blocking.
pub struct CommandSender {
    producer: rtrb::Producer<EngineCommand>,
}

impl CommandSender {
    pub fn new(producer: rtrb::Producer<EngineCommand>) -> Self {
        Self { producer }
    }

    /// Queue a command
    ///
    /// Returns `Err(cmd)` with the command handed back if the queue is full.
    pub fn send(&mut self, cmd: EngineCommand) -> Result<(), EngineCommand> {
        self.producer.push(cmd).map_err(|e| match e {
            rtrb::PushError::Full(value) => value,
        })
    }
}
