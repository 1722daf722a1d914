//! STM32F411 "Black Pill" - Invaders
//!
//! ST7789 240x135 on SPI1: SCK PA5, MOSI PA7, CS PA4, DC PB0, backlight PB10
//! Buttons (active-low, pull-up): left PB12, right PB13, fire PB14, pause PB15
//! LED (PC13, active-low): ON during gameplay, OFF otherwise

#![cfg_attr(target_os = "none", no_std)]
#![cfg_attr(target_os = "none", no_main)]

#[cfg(target_os = "none")]
mod board;
#[cfg(target_os = "none")]
mod firmware;

#[cfg(not(target_os = "none"))]
fn main() {
    eprintln!("invaders-m4 is firmware: build it with --target thumbv7em-none-eabihf");
    std::process::exit(2);
}
