#![allow(dead_code)]

use std::collections::VecDeque;

use invaders_m4::clock::FrameClock;
use invaders_m4::config::TickRate;
use invaders_m4::engine::{Engine, TickReport};
use invaders_m4::game::Phase;
use invaders_m4::hal::{Hal, PresentError};
use invaders_m4::input::RawPinState;
use invaders_m4::render::{FrameBuffer, Ink};

pub const RELEASED: RawPinState = RawPinState {
    left: false,
    right: false,
    fire: false,
    pause: false,
};

pub const FIRE: RawPinState = RawPinState {
    fire: true,
    ..RELEASED
};

pub const PAUSE: RawPinState = RawPinState {
    pause: true,
    ..RELEASED
};

/// Host stand-in for the board: scripted pins, recorded frames.
#[derive(Default)]
pub struct SimHal {
    /// Pin readings, one per tick. Buttons read released once it runs dry.
    pub script: VecDeque<RawPinState>,
    pub rate: Option<TickRate>,
    pub registrations: u32,
    pub presented: u32,
    pub last_frame: Vec<Ink>,
    /// Number of upcoming presents that fail.
    pub failures: u32,
    pub phases: Vec<Phase>,
    /// Clock whose interrupt fires in the middle of the next present.
    pub interrupt_during_present: Option<&'static FrameClock>,
}

impl SimHal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `pins` for the next `ticks` readings.
    pub fn hold(&mut self, pins: RawPinState, ticks: usize) {
        self.script.extend(std::iter::repeat_n(pins, ticks));
    }
}

impl Hal for SimHal {
    fn read_input_pins(&mut self) -> RawPinState {
        self.script.pop_front().unwrap_or(RELEASED)
    }

    fn register_tick_interrupt(&mut self, rate: TickRate) {
        self.rate = Some(rate);
        self.registrations += 1;
    }

    fn present_frame(&mut self, frame: &FrameBuffer) -> Result<(), PresentError> {
        assert!(frame.is_complete(), "HAL was handed a half-drawn frame");
        if let Some(clock) = self.interrupt_during_present.take() {
            clock.on_interrupt();
        }
        if self.failures > 0 {
            self.failures -= 1;
            return Err(PresentError::Transfer);
        }
        self.presented += 1;
        self.last_frame = frame.inks().collect();
        Ok(())
    }

    fn phase_changed(&mut self, phase: Phase) {
        self.phases.push(phase);
    }
}

/// Fires the timer interrupt once and runs the tick it raised.
pub fn tick(engine: &mut Engine<'_, SimHal>, clock: &FrameClock) -> TickReport {
    clock.on_interrupt();
    engine.poll().expect("a tick was pending")
}

/// Runs ticks until the script is used up.
pub fn drain(engine: &mut Engine<'_, SimHal>, clock: &FrameClock) -> Vec<TickReport> {
    let mut reports = Vec::new();
    while !engine.hal().script.is_empty() {
        reports.push(tick(engine, clock));
    }
    reports
}
