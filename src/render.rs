//! Render pipeline: palette framebuffers, the front/back swap, and the
//! per-phase draw routines.
//!
//! Frames are drawn into the back buffer of a [`DoubleBuffer`] through a
//! [`Canvas`]. Only [`Canvas::finish`] promotes the back buffer to the
//! front, so whatever the HAL is handed is always a whole frame.

use core::convert::Infallible;
use core::fmt::Write;
use core::ops::{Deref, DerefMut};

use embedded_graphics::mono_font::ascii::{FONT_6X10, FONT_10X20};
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::{PixelColor, Rgb565};
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, PrimitiveStyleBuilder, Rectangle};
use embedded_graphics::text::{Alignment, Baseline, Text, TextStyleBuilder};
use heapless::String;

use crate::clock::Tick;
use crate::config::{BARRIER_INTEGRITY, GROUND_Y, HUD_H, SCREEN_H, SCREEN_W};
use crate::entity::{Entity, InvaderClass, Kind, Owner};
use crate::sprites::{self, Sprite};
use crate::world::World;

/// Index into the 16-entry panel palette.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Ink(pub u8);

impl PixelColor for Ink {
    type Raw = ();
}

impl Ink {
    pub const BLACK: Ink = Ink(0);
    pub const WHITE: Ink = Ink(1);
    pub const GREEN: Ink = Ink(2);
    pub const DARK_GREEN: Ink = Ink(3);
    pub const OLIVE: Ink = Ink(4);
    pub const RED: Ink = Ink(5);
    pub const CYAN: Ink = Ink(6);
    pub const YELLOW: Ink = Ink(7);
    pub const MAGENTA: Ink = Ink(8);
    pub const GREY: Ink = Ink(9);
    pub const ORANGE: Ink = Ink(10);

    pub const fn to_rgb565(self) -> Rgb565 {
        PALETTE[(self.0 & 0x0F) as usize]
    }
}

const PALETTE: [Rgb565; 16] = [
    Rgb565::new(0, 0, 0),
    Rgb565::new(31, 63, 31),
    Rgb565::new(4, 60, 4),
    Rgb565::new(2, 36, 2),
    Rgb565::new(18, 40, 2),
    Rgb565::new(31, 8, 4),
    Rgb565::new(4, 58, 31),
    Rgb565::new(31, 60, 4),
    Rgb565::new(31, 12, 31),
    Rgb565::new(14, 28, 14),
    Rgb565::new(31, 36, 0),
    Rgb565::new(0, 0, 0),
    Rgb565::new(0, 0, 0),
    Rgb565::new(0, 0, 0),
    Rgb565::new(0, 0, 0),
    Rgb565::new(0, 0, 0),
];

pub const FRAME_BYTES: usize = (SCREEN_W * SCREEN_H) as usize / 2;

/// One full screen at 4 bits per pixel, two pixels per byte, left pixel in
/// the high nibble.
pub struct FrameBuffer {
    pixels: [u8; FRAME_BYTES],
    complete: bool,
}

impl FrameBuffer {
    pub const fn new() -> Self {
        Self {
            pixels: [0; FRAME_BYTES],
            complete: true,
        }
    }

    /// False while a frame is being drawn into this buffer.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn ink_at(&self, point: Point) -> Option<Ink> {
        let index = Self::index(point)?;
        let byte = self.pixels[index / 2];
        Some(if index % 2 == 0 {
            Ink(byte >> 4)
        } else {
            Ink(byte & 0x0F)
        })
    }

    /// Palette indices in row-major order.
    pub fn inks(&self) -> impl Iterator<Item = Ink> + '_ {
        self.pixels
            .iter()
            .flat_map(|&byte| [Ink(byte >> 4), Ink(byte & 0x0F)])
    }

    /// Panel colours in row-major order, ready for a full-screen transfer.
    pub fn colors(&self) -> impl Iterator<Item = Rgb565> + '_ {
        self.inks().map(Ink::to_rgb565)
    }

    fn index(point: Point) -> Option<usize> {
        if point.x < 0 || point.y < 0 || point.x >= SCREEN_W || point.y >= SCREEN_H {
            return None;
        }
        Some((point.y * SCREEN_W + point.x) as usize)
    }

    fn set(&mut self, point: Point, ink: Ink) {
        let Some(index) = Self::index(point) else {
            return;
        };
        let byte = &mut self.pixels[index / 2];
        *byte = if index % 2 == 0 {
            (*byte & 0x0F) | (ink.0 << 4)
        } else {
            (*byte & 0xF0) | (ink.0 & 0x0F)
        };
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl OriginDimensions for FrameBuffer {
    fn size(&self) -> Size {
        Size::new(SCREEN_W as u32, SCREEN_H as u32)
    }
}

impl DrawTarget for FrameBuffer {
    type Color = Ink;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, ink) in pixels {
            self.set(point, ink);
        }
        Ok(())
    }

    fn clear(&mut self, ink: Ink) -> Result<(), Self::Error> {
        let nibble = ink.0 & 0x0F;
        self.pixels.fill(nibble << 4 | nibble);
        Ok(())
    }
}

/// Front and back framebuffers. The HAL only ever sees [`DoubleBuffer::front`].
pub struct DoubleBuffer {
    buffers: [FrameBuffer; 2],
    front: usize,
    frames: u32,
}

impl DoubleBuffer {
    pub const fn new() -> Self {
        Self {
            buffers: [FrameBuffer::new(), FrameBuffer::new()],
            front: 0,
            frames: 0,
        }
    }

    /// The last finished frame.
    pub fn front(&self) -> &FrameBuffer {
        &self.buffers[self.front]
    }

    /// Frames finished so far.
    pub fn frames(&self) -> u32 {
        self.frames
    }

    /// Clears the back buffer and hands it out for drawing.
    pub fn begin_frame(&mut self) -> Canvas<'_> {
        let back = &mut self.buffers[1 - self.front];
        back.complete = false;
        back.pixels.fill(0);
        Canvas { screen: self }
    }
}

impl Default for DoubleBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// The back buffer while a frame is being drawn. Dropping it without
/// [`Canvas::finish`] leaves the front buffer as it was.
pub struct Canvas<'a> {
    screen: &'a mut DoubleBuffer,
}

impl Canvas<'_> {
    /// Marks the frame whole and swaps it to the front.
    pub fn finish(self) {
        let back = 1 - self.screen.front;
        self.screen.buffers[back].complete = true;
        self.screen.front = back;
        self.screen.frames = self.screen.frames.wrapping_add(1);
    }
}

impl Deref for Canvas<'_> {
    type Target = FrameBuffer;

    fn deref(&self) -> &FrameBuffer {
        &self.screen.buffers[1 - self.screen.front]
    }
}

impl DerefMut for Canvas<'_> {
    fn deref_mut(&mut self) -> &mut FrameBuffer {
        &mut self.screen.buffers[1 - self.screen.front]
    }
}

/// Numbers shown in the status bar.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Hud {
    pub score: u32,
    pub high_score: u32,
    pub lives: u8,
    pub wave: u16,
}

fn invader_look(class: InvaderClass) -> (&'static [Sprite; 2], Ink) {
    match class {
        InvaderClass::Squid => (&sprites::SQUID, Ink::MAGENTA),
        InvaderClass::Crab => (&sprites::CRAB, Ink::CYAN),
        InvaderClass::Octopus => (&sprites::OCTOPUS, Ink::YELLOW),
    }
}

fn barrier_ink(integrity: u8) -> Ink {
    if integrity >= BARRIER_INTEGRITY {
        Ink::GREEN
    } else if integrity * 2 > BARRIER_INTEGRITY {
        Ink::DARK_GREEN
    } else {
        Ink::OLIVE
    }
}

/// Draws `sprite` centred in a `size` box whose top-left is `top_left`.
pub fn blit<D>(
    target: &mut D,
    sprite: &Sprite,
    top_left: Point,
    size: Size,
    ink: Ink,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Ink>,
{
    let inset = Point::new(
        (size.width as i32 - sprite.width as i32) / 2,
        (size.height as i32 - sprite.height as i32) / 2,
    );
    let origin = top_left + inset;
    target.draw_iter(sprite.points().map(|p| Pixel(origin + p, ink)))
}

fn draw_entity<D>(target: &mut D, entity: &Entity) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Ink>,
{
    let size = entity.kind.size();
    let pose = usize::from(entity.pose & 1);
    match entity.kind {
        Kind::Player => blit(target, &sprites::PLAYER, entity.pos, size, Ink::GREEN),
        Kind::Invader(class) => {
            let (poses, ink) = invader_look(class);
            blit(target, &poses[pose], entity.pos, size, ink)
        }
        Kind::Shot(Owner::Player) => blit(target, &sprites::SHOT, entity.pos, size, Ink::WHITE),
        Kind::Shot(Owner::Invader) => {
            blit(target, &sprites::BOMB[pose], entity.pos, size, Ink::ORANGE)
        }
        Kind::Barrier { integrity } => Rectangle::new(entity.pos, size)
            .into_styled(PrimitiveStyle::with_fill(barrier_ink(integrity)))
            .draw(target),
    }
}

/// The playfield in z-order: barriers, invaders, projectiles, player, HUD.
pub fn draw_scene<D>(target: &mut D, world: &World, hud: &Hud, tick: Tick) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Ink>,
{
    for (_, segment) in world.barriers.iter() {
        draw_entity(target, segment)?;
    }
    for (_, invader) in world.invaders.iter() {
        draw_entity(target, invader)?;
    }
    for (_, bomb) in world.bombs.iter() {
        draw_entity(target, bomb)?;
    }
    for (_, shot) in world.shots.iter() {
        draw_entity(target, shot)?;
    }

    // Blink while immune.
    let hidden = world.invulnerable > 0 && (tick.0 >> 2) & 1 == 1;
    if !hidden {
        draw_entity(target, &world.player)?;
    }

    Rectangle::new(Point::new(0, GROUND_Y), Size::new(SCREEN_W as u32, 1))
        .into_styled(PrimitiveStyle::with_fill(Ink::GREEN))
        .draw(target)?;

    draw_hud(target, hud)
}

pub fn draw_hud<D>(target: &mut D, hud: &Hud) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Ink>,
{
    let style = MonoTextStyle::new(&FONT_6X10, Ink::WHITE);
    let mut buf: String<24> = String::new();

    core::write!(buf, "SCORE {:05}", hud.score).ok();
    Text::with_baseline(&buf, Point::new(2, 1), style, Baseline::Top).draw(target)?;

    buf.clear();
    core::write!(buf, "HI {:05}", hud.high_score).ok();
    let dim = MonoTextStyle::new(&FONT_6X10, Ink::GREY);
    Text::with_baseline(&buf, Point::new(84, 1), dim, Baseline::Top).draw(target)?;

    buf.clear();
    core::write!(buf, "W{}", hud.wave).ok();
    Text::with_baseline(&buf, Point::new(150, 1), style, Baseline::Top).draw(target)?;

    // One cannon icon per life, right-aligned.
    let icon = Size::new(7, 4);
    for life in 0..i32::from(hud.lives.min(5)) {
        let x = SCREEN_W - 10 - life * 10;
        Rectangle::new(Point::new(x, 4), icon)
            .into_styled(PrimitiveStyle::with_fill(Ink::GREEN))
            .draw(target)?;
    }

    Rectangle::new(Point::new(0, HUD_H - 1), Size::new(SCREEN_W as u32, 1))
        .into_styled(PrimitiveStyle::with_fill(Ink::GREY))
        .draw(target)?;
    Ok(())
}

fn centred<'a>(
    text: &'a str,
    y: i32,
    style: MonoTextStyle<'a, Ink>,
) -> Text<'a, MonoTextStyle<'a, Ink>> {
    let layout = TextStyleBuilder::new()
        .alignment(Alignment::Center)
        .baseline(Baseline::Top)
        .build();
    Text::with_text_style(text, Point::new(SCREEN_W / 2, y), style, layout)
}

/// Title screen with the points table.
pub fn draw_title<D>(target: &mut D, high_score: u32, tick: Tick) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Ink>,
{
    centred("INVADERS", 8, MonoTextStyle::new(&FONT_10X20, Ink::YELLOW)).draw(target)?;

    let info = MonoTextStyle::new(&FONT_6X10, Ink::WHITE);
    let cell = Size::new(crate::config::INVADER_W as u32, crate::config::INVADER_H as u32);
    let mut buf: String<16> = String::new();
    for (row, class) in [InvaderClass::Squid, InvaderClass::Crab, InvaderClass::Octopus]
        .into_iter()
        .enumerate()
    {
        let y = 40 + row as i32 * 16;
        let (poses, ink) = invader_look(class);
        blit(target, &poses[0], Point::new(84, y), cell, ink)?;
        buf.clear();
        core::write!(buf, "= {} PTS", class.points()).ok();
        Text::with_baseline(&buf, Point::new(102, y - 1), info, Baseline::Top).draw(target)?;
    }

    if (tick.0 >> 4) & 1 == 0 {
        centred("PRESS FIRE", 96, info).draw(target)?;
    }

    buf.clear();
    core::write!(buf, "HI {:05}", high_score).ok();
    centred(&buf, 116, MonoTextStyle::new(&FONT_6X10, Ink::GREY)).draw(target)?;
    Ok(())
}

fn panel<D>(target: &mut D, height: u32, border: Ink) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Ink>,
{
    let size = Size::new(140, height);
    let top_left = Point::new((SCREEN_W - size.width as i32) / 2, (SCREEN_H - height as i32) / 2);
    Rectangle::new(top_left, size)
        .into_styled(
            PrimitiveStyleBuilder::new()
                .fill_color(Ink::BLACK)
                .stroke_color(border)
                .stroke_width(1)
                .build(),
        )
        .draw(target)
}

/// Overlay drawn on top of the frozen scene.
pub fn draw_pause_overlay<D>(target: &mut D) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Ink>,
{
    panel(target, 36, Ink::WHITE)?;
    centred("PAUSED", SCREEN_H / 2 - 10, MonoTextStyle::new(&FONT_10X20, Ink::WHITE)).draw(target)?;
    Ok(())
}

/// Game-over panel; the restart prompt only appears once `ready`.
pub fn draw_game_over<D>(target: &mut D, score: u32, ready: bool) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Ink>,
{
    panel(target, 60, Ink::RED)?;
    let top = (SCREEN_H - 60) / 2;
    centred("GAME OVER", top + 6, MonoTextStyle::new(&FONT_10X20, Ink::RED)).draw(target)?;

    let info = MonoTextStyle::new(&FONT_6X10, Ink::WHITE);
    let mut buf: String<24> = String::new();
    core::write!(buf, "SCORE {}", score).ok();
    centred(&buf, top + 28, info).draw(target)?;
    if ready {
        centred("FIRE FOR MENU", top + 42, info).draw(target)?;
    }
    Ok(())
}
