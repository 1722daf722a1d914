//! The seam between the game core and the board.

use core::fmt;

use crate::clock::FrameClock;
use crate::config::TickRate;
use crate::game::Phase;
use crate::input::RawPinState;
use crate::render::FrameBuffer;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
pub enum PresentError {
    /// The panel transfer failed part way.
    Transfer,
}

impl fmt::Display for PresentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PresentError::Transfer => f.write_str("display transfer failed"),
        }
    }
}

/// Board services the engine drives. Every call returns promptly; nothing
/// here may block past the current tick.
pub trait Hal {
    /// Current button levels, already mapped to "pressed".
    fn read_input_pins(&mut self) -> RawPinState;

    /// Starts the periodic tick interrupt. Called once, before the first
    /// tick is polled.
    fn register_tick_interrupt(&mut self, rate: TickRate);

    /// Pushes a whole frame to the panel. The buffer is borrowed only for
    /// the duration of the call.
    fn present_frame(&mut self, frame: &FrameBuffer) -> Result<(), PresentError>;

    /// Waits for the next tick. Must return promptly if one is already
    /// pending.
    fn idle(&mut self, _clock: &FrameClock) {}

    /// Notified after every phase transition.
    fn phase_changed(&mut self, _phase: Phase) {}
}
