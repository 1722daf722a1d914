//! The main loop: one pass per frame-clock tick.
//!
//! Per tick the order is fixed: capture input, step the state machine
//! (which advances entities and resolves collisions while Playing), draw the
//! back buffer, swap, present the front buffer. Nothing here runs in
//! interrupt context.

use crate::clock::{FrameClock, Tick};
use crate::config::{Config, ConfigError};
use crate::game::{Game, Phase};
use crate::hal::Hal;
use crate::input::InputSampler;
use crate::render::DoubleBuffer;

/// Whether this tick's frame reached the panel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameStatus {
    Presented,
    Skipped,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickReport {
    pub tick: Tick,
    pub phase: Phase,
    pub frame: FrameStatus,
}

/// Running totals since boot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Diagnostics {
    pub ticks: u32,
    pub overruns: u32,
    pub renders_skipped: u32,
}

pub struct Engine<'a, H: Hal> {
    clock: &'a FrameClock,
    hal: H,
    screen: &'a mut DoubleBuffer,
    input: InputSampler,
    game: Game,
    diagnostics: Diagnostics,
}

impl<'a, H: Hal> Engine<'a, H> {
    /// Validates `config` and starts the tick interrupt.
    pub fn new(
        config: Config,
        clock: &'a FrameClock,
        mut hal: H,
        screen: &'a mut DoubleBuffer,
    ) -> Result<Self, ConfigError> {
        let config = config.validate()?;
        hal.register_tick_interrupt(config.tick_rate);
        log::info!(
            "engine up: {} Hz, debounce {}",
            config.tick_rate.hz(),
            config.debounce_samples
        );
        Ok(Self {
            clock,
            hal,
            screen,
            input: InputSampler::new(config.debounce_samples),
            game: Game::new(config),
            diagnostics: Diagnostics::default(),
        })
    }

    /// Handles the pending tick, if there is one.
    pub fn poll(&mut self) -> Option<TickReport> {
        let tick = self.clock.pending()?;

        let input = self.input.sample(self.hal.read_input_pins());
        if let Some(phase) = self.game.step(&input, tick) {
            self.hal.phase_changed(phase);
        }

        let mut canvas = self.screen.begin_frame();
        match self.game.draw(&mut *canvas, tick) {
            Ok(()) => {}
            Err(never) => match never {},
        }
        canvas.finish();

        let frame = match self.hal.present_frame(self.screen.front()) {
            Ok(()) => FrameStatus::Presented,
            Err(err) => {
                log::warn!("frame {} not presented: {}", tick.0, err);
                self.diagnostics.renders_skipped =
                    self.diagnostics.renders_skipped.saturating_add(1);
                self.game.note_render_skipped();
                FrameStatus::Skipped
            }
        };

        self.clock.complete();
        self.diagnostics.ticks = self.diagnostics.ticks.wrapping_add(1);

        let stats = self.clock.stats();
        if stats.overruns != self.diagnostics.overruns {
            log::warn!(
                "tick overrun at {}: {} ticks dropped so far",
                stats.now.0,
                stats.overruns
            );
            self.diagnostics.overruns = stats.overruns;
        }

        Some(TickReport {
            tick,
            phase: self.game.phase(),
            frame,
        })
    }

    /// Runs forever, idling between ticks.
    pub fn run(mut self) -> ! {
        loop {
            if self.poll().is_none() {
                self.hal.idle(self.clock);
            }
        }
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn game_mut(&mut self) -> &mut Game {
        &mut self.game
    }

    pub fn hal(&self) -> &H {
        &self.hal
    }

    pub fn hal_mut(&mut self) -> &mut H {
        &mut self.hal
    }

    pub fn screen(&self) -> &DoubleBuffer {
        self.screen
    }

    pub fn diagnostics(&self) -> Diagnostics {
        self.diagnostics
    }
}
