//! Fixed-timestep invaders core for a Cortex-M4 and an ST7789 panel.
//!
//! Everything in this crate is board-independent and allocation-free. The
//! firmware binary supplies a [`hal::Hal`], a timer interrupt that calls
//! [`clock::FrameClock::on_interrupt`], and then hands control to
//! [`engine::Engine::run`].

#![cfg_attr(not(test), no_std)]

pub mod clock;
pub mod collision;
pub mod config;
pub mod engine;
pub mod entity;
pub mod game;
pub mod hal;
pub mod input;
pub mod render;
pub mod rng;
pub mod sprites;
pub mod wave;
pub mod world;
