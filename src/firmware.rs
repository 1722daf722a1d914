//! Boot, peripheral bring-up and the frame clock interrupt.

use core::fmt::Write as _;

use cortex_m::peripheral::scb::SystemHandler;
use cortex_m_rt::{entry, exception};
use defmt::{info, unwrap};
use embassy_stm32::gpio::{Input, Level, Output, Pull, Speed};
use embassy_stm32::spi::{self, Spi};
use embassy_stm32::time::Hertz;
use embassy_time::Delay;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_hal_bus::spi::ExclusiveDevice;
use heapless::String;
use mipidsi::Builder;
use mipidsi::models::ST7789;
use mipidsi::options::{ColorInversion, Orientation, Rotation};
use static_cell::{ConstStaticCell, StaticCell};
use {defmt_rtt as _, panic_probe as _};

use invaders_m4::clock::FrameClock;
use invaders_m4::config::Config;
use invaders_m4::engine::Engine;
use invaders_m4::render::DoubleBuffer;

use crate::board::{Board, Buttons};

static FRAME_CLOCK: FrameClock = FrameClock::new();
static SCREEN: ConstStaticCell<DoubleBuffer> = ConstStaticCell::new(DoubleBuffer::new());

#[exception]
fn SysTick() {
    FRAME_CLOCK.on_interrupt();
}

/// Forwards `log` records from the core to defmt over RTT.
struct DefmtLogger;

impl log::Log for DefmtLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        // Long lines are cut at the buffer size.
        let mut line: String<96> = String::new();
        core::write!(line, "{}", record.args()).ok();
        let target = record.target();
        match record.level() {
            log::Level::Error => defmt::error!("{=str}: {=str}", target, line.as_str()),
            log::Level::Warn => defmt::warn!("{=str}: {=str}", target, line.as_str()),
            log::Level::Info => defmt::info!("{=str}: {=str}", target, line.as_str()),
            log::Level::Debug => defmt::debug!("{=str}: {=str}", target, line.as_str()),
            log::Level::Trace => defmt::trace!("{=str}: {=str}", target, line.as_str()),
        }
    }

    fn flush(&self) {}
}

static LOGGER: DefmtLogger = DefmtLogger;

fn init_logging() {
    match log::set_logger(&LOGGER) {
        Ok(()) => log::set_max_level(log::LevelFilter::Info),
        Err(_) => defmt::warn!("log bridge already installed"),
    }
}

/// 25 MHz HSE -> 96 MHz SYSCLK, 48 MHz PLL48CK, APB1 at 48 MHz.
fn clocks() -> embassy_stm32::Config {
    use embassy_stm32::rcc::*;

    let mut config = embassy_stm32::Config::default();
    config.rcc.hse = Some(Hse {
        freq: Hertz(25_000_000),
        mode: HseMode::Oscillator,
    });
    config.rcc.pll_src = PllSource::HSE;
    config.rcc.pll = Some(Pll {
        prediv: PllPreDiv::DIV25,
        mul: PllMul::MUL192,
        divp: Some(PllPDiv::DIV2),
        divq: Some(PllQDiv::DIV4),
        divr: None,
    });
    config.rcc.sys = Sysclk::PLL1_P;
    config.rcc.ahb_pre = AHBPrescaler::DIV1;
    config.rcc.apb1_pre = APBPrescaler::DIV2;
    config.rcc.apb2_pre = APBPrescaler::DIV1;
    config
}

#[entry]
fn main() -> ! {
    init_logging();
    let p = embassy_stm32::init(clocks());
    info!("=== invaders-m4 ===");

    let Some(mut cp) = cortex_m::Peripherals::take() else {
        defmt::panic!("core peripherals already taken");
    };

    // Onboard LED (PC13, active-low)
    let led = Output::new(p.PC13, Level::High, Speed::Low);

    // ST7789 display on SPI1 (APB2 / 2 = 48 MHz)
    let _bl = Output::new(p.PB10, Level::High, Speed::Low);
    let mut spi_config = spi::Config::default();
    spi_config.frequency = Hertz(48_000_000);
    let spi_bus = Spi::new_blocking_txonly(p.SPI1, p.PA5, p.PA7, spi_config);
    let cs_display = Output::new(p.PA4, Level::High, Speed::VeryHigh);
    let dc = Output::new(p.PB0, Level::Low, Speed::VeryHigh);
    let spi_device = unwrap!(ExclusiveDevice::new_no_delay(spi_bus, cs_display));
    static DISPLAY_BUF: StaticCell<[u8; 1024]> = StaticCell::new();
    let display_buf = DISPLAY_BUF.init([0u8; 1024]);
    let di = mipidsi::interface::SpiInterface::new(spi_device, dc, display_buf);
    let Ok(mut display) = Builder::new(ST7789, di)
        .display_size(135, 240)
        .display_offset(52, 40)
        .invert_colors(ColorInversion::Inverted)
        .orientation(Orientation::new().rotate(Rotation::Deg90))
        .init(&mut Delay)
    else {
        defmt::panic!("ST7789 init failed");
    };
    if display.clear(Rgb565::BLACK).is_err() {
        defmt::warn!("display clear failed");
    }
    info!("display ready");

    // Buttons (active-low, pull-up)
    let buttons = Buttons {
        left: Input::new(p.PB12, Pull::Up),
        right: Input::new(p.PB13, Pull::Up),
        fire: Input::new(p.PB14, Pull::Up),
        pause: Input::new(p.PB15, Pull::Up),
    };

    // The frame clock outranks everything else.
    unsafe { cp.SCB.set_priority(SystemHandler::SysTick, 0) };

    let board = Board::new(display, buttons, led, cp.SYST);
    let engine = unwrap!(Engine::new(
        Config::default(),
        &FRAME_CLOCK,
        board,
        SCREEN.take()
    ));
    engine.run()
}
