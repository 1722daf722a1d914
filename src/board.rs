//! Black Pill cabinet wiring behind the core's [`Hal`].

use cortex_m::asm;
use cortex_m::peripheral::SYST;
use cortex_m::peripheral::syst::SystClkSource;
use embassy_stm32::gpio::{Input, Output};
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

use invaders_m4::clock::FrameClock;
use invaders_m4::config::{SCREEN_H, SCREEN_W, TickRate};
use invaders_m4::game::Phase;
use invaders_m4::hal::{Hal, PresentError};
use invaders_m4::input::RawPinState;
use invaders_m4::render::FrameBuffer;

/// Core clock feeding SysTick, as set up in `firmware::clocks`.
pub const SYSCLK_HZ: u32 = 96_000_000;

pub struct Buttons {
    pub left: Input<'static>,
    pub right: Input<'static>,
    pub fire: Input<'static>,
    pub pause: Input<'static>,
}

pub struct Board<D> {
    display: D,
    buttons: Buttons,
    led: Output<'static>,
    syst: SYST,
}

impl<D> Board<D> {
    pub fn new(display: D, buttons: Buttons, led: Output<'static>, syst: SYST) -> Self {
        Self {
            display,
            buttons,
            led,
            syst,
        }
    }
}

impl<D> Hal for Board<D>
where
    D: DrawTarget<Color = Rgb565>,
{
    fn read_input_pins(&mut self) -> RawPinState {
        RawPinState {
            left: self.buttons.left.is_low(),
            right: self.buttons.right.is_low(),
            fire: self.buttons.fire.is_low(),
            pause: self.buttons.pause.is_low(),
        }
    }

    fn register_tick_interrupt(&mut self, rate: TickRate) {
        let reload = SYSCLK_HZ / rate.hz() - 1;
        self.syst.set_clock_source(SystClkSource::Core);
        self.syst.set_reload(reload);
        self.syst.clear_current();
        self.syst.enable_interrupt();
        self.syst.enable_counter();
        defmt::info!("frame clock: {} Hz, reload {}", rate.hz(), reload);
    }

    fn present_frame(&mut self, frame: &FrameBuffer) -> Result<(), PresentError> {
        let area = Rectangle::new(Point::zero(), Size::new(SCREEN_W as u32, SCREEN_H as u32));
        self.display
            .fill_contiguous(&area, frame.colors())
            .map_err(|_| PresentError::Transfer)
    }

    fn idle(&mut self, clock: &FrameClock) {
        // With interrupts masked, a tick that lands after the check still
        // wakes the WFI; its handler runs when the mask is lifted.
        cortex_m::interrupt::free(|_| {
            if !clock.is_pending() {
                asm::wfi();
            }
        });
    }

    fn phase_changed(&mut self, phase: Phase) {
        if phase == Phase::Playing {
            self.led.set_low();
        } else {
            self.led.set_high();
        }
        defmt::info!("phase: {}", phase);
    }
}
