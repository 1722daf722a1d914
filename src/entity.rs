//! Entities and the fixed-capacity arenas that hold them.

use embedded_graphics::geometry::{Point, Size};

use crate::clock::Tick;
use crate::collision::Bounds;
use crate::config::{
    BOMB_H, BOMB_W, HUD_H, INVADER_H, INVADER_W, PLAYER_H, PLAYER_W, SCREEN_H, SCREEN_W,
    SEGMENT_H, SEGMENT_W, SHOT_H, SHOT_W,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InvaderClass {
    Squid,
    Crab,
    Octopus,
}

impl InvaderClass {
    pub const fn points(self) -> u32 {
        match self {
            InvaderClass::Squid => 30,
            InvaderClass::Crab => 20,
            InvaderClass::Octopus => 10,
        }
    }

    /// Grid row → class, top row first.
    pub const fn for_row(row: usize) -> Self {
        match row {
            0 => InvaderClass::Squid,
            1 | 2 => InvaderClass::Crab,
            _ => InvaderClass::Octopus,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Owner {
    Player,
    Invader,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kind {
    Player,
    Invader(InvaderClass),
    Shot(Owner),
    Barrier { integrity: u8 },
}

impl Kind {
    pub const fn size(self) -> Size {
        let (w, h) = match self {
            Kind::Player => (PLAYER_W, PLAYER_H),
            Kind::Invader(_) => (INVADER_W, INVADER_H),
            Kind::Shot(Owner::Player) => (SHOT_W, SHOT_H),
            Kind::Shot(Owner::Invader) => (BOMB_W, BOMB_H),
            Kind::Barrier { .. } => (SEGMENT_W, SEGMENT_H),
        };
        Size::new(w as u32, h as u32)
    }
}

/// Displacement per tick, in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Velocity {
    pub dx: i32,
    pub dy: i32,
}

impl Velocity {
    pub const ZERO: Velocity = Velocity { dx: 0, dy: 0 };

    pub const fn new(dx: i32, dy: i32) -> Self {
        Self { dx, dy }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Entity {
    /// Top-left corner.
    pub pos: Point,
    pub vel: Velocity,
    pub alive: bool,
    pub kind: Kind,
    /// Animation frame, 0 or 1.
    pub pose: u8,
}

impl Entity {
    pub const DEAD: Entity = Entity {
        pos: Point::zero(),
        vel: Velocity::ZERO,
        alive: false,
        kind: Kind::Player,
        pose: 0,
    };

    pub const fn new(kind: Kind, pos: Point) -> Self {
        Self {
            pos,
            vel: Velocity::ZERO,
            alive: true,
            kind,
            pose: 0,
        }
    }

    pub const fn with_velocity(mut self, vel: Velocity) -> Self {
        self.vel = vel;
        self
    }

    pub fn bounds(&self) -> Bounds {
        let size = self.kind.size();
        Bounds::new(self.pos.x, self.pos.y, size.width as i32, size.height as i32)
    }
}

/// What a single advance did to an entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fate {
    Stays,
    /// Left the playfield; the caller retires the slot.
    Leaves,
}

/// Applies one tick of movement to `entity` using only its own state.
pub fn advance(entity: &mut Entity, tick: Tick) -> Fate {
    match entity.kind {
        Kind::Player => {
            entity.pos.x = (entity.pos.x + entity.vel.dx).clamp(0, SCREEN_W - PLAYER_W);
            Fate::Stays
        }
        Kind::Invader(_) => {
            entity.pos += Point::new(entity.vel.dx, entity.vel.dy);
            if entity.vel != Velocity::ZERO {
                entity.pose ^= 1;
            }
            Fate::Stays
        }
        Kind::Shot(_) => {
            entity.pos.y += entity.vel.dy;
            entity.pose = ((tick.0 >> 2) & 1) as u8;
            let bounds = entity.bounds();
            if bounds.bottom() <= HUD_H || bounds.y >= SCREEN_H {
                Fate::Leaves
            } else {
                Fate::Stays
            }
        }
        Kind::Barrier { .. } => Fate::Stays,
    }
}

/// Iterator over the set bits of a slot mask, lowest index first.
#[derive(Clone, Copy, Debug)]
pub struct SlotIter(u64);

impl Iterator for SlotIter {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.0 == 0 {
            return None;
        }
        let index = self.0.trailing_zeros() as usize;
        self.0 &= self.0 - 1;
        Some(index)
    }
}

/// Fixed slots with an alive bitmask.
///
/// A killed slot stays reserved until [`Arena::reclaim`] runs at the start of
/// the next tick, so nothing allocated mid-tick can land in a slot that is
/// still being iterated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Arena<const N: usize> {
    slots: [Entity; N],
    live: u64,
    dying: u64,
}

impl<const N: usize> Arena<N> {
    const FITS_MASK: () = assert!(N <= 64, "arena slots are tracked in a u64");

    const FULL: u64 = if N == 64 { u64::MAX } else { (1u64 << N) - 1 };

    pub const fn new() -> Self {
        let () = Self::FITS_MASK;
        Self {
            slots: [Entity::DEAD; N],
            live: 0,
            dying: 0,
        }
    }

    /// Places `entity` in the lowest free slot. `None` when full; the caller
    /// drops the request.
    pub fn allocate(&mut self, entity: Entity) -> Option<usize> {
        let free = !(self.live | self.dying) & Self::FULL;
        if free == 0 {
            return None;
        }
        let index = free.trailing_zeros() as usize;
        self.slots[index] = Entity {
            alive: true,
            ..entity
        };
        self.live |= 1 << index;
        Some(index)
    }

    /// Marks a live slot dead. Returns false if it was not live.
    pub fn kill(&mut self, index: usize) -> bool {
        if index >= N {
            return false;
        }
        let bit = 1u64 << index;
        if self.live & bit == 0 {
            return false;
        }
        self.live &= !bit;
        self.dying |= bit;
        self.slots[index].alive = false;
        true
    }

    /// Frees every slot killed since the last call.
    pub fn reclaim(&mut self) -> u32 {
        let freed = self.dying.count_ones();
        self.dying = 0;
        freed
    }

    /// Empties the arena outright.
    pub fn reset(&mut self) {
        self.slots = [Entity::DEAD; N];
        self.live = 0;
        self.dying = 0;
    }

    pub fn is_live(&self, index: usize) -> bool {
        index < N && self.live & (1 << index) != 0
    }

    pub fn live_mask(&self) -> u64 {
        self.live
    }

    pub fn live_count(&self) -> u32 {
        self.live.count_ones()
    }

    /// Indices of the live slots. Holds no borrow, so the arena can be
    /// mutated while walking it.
    pub fn live_indices(&self) -> SlotIter {
        SlotIter(self.live)
    }

    pub fn get(&self, index: usize) -> Option<&Entity> {
        self.is_live(index).then(|| &self.slots[index])
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Entity> {
        if self.is_live(index) {
            Some(&mut self.slots[index])
        } else {
            None
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &Entity)> + '_ {
        self.live_indices().map(move |i| (i, &self.slots[i]))
    }

    /// Advances every live entity in index order, retiring those that leave.
    pub fn advance_all(&mut self, tick: Tick) {
        for index in self.live_indices() {
            if advance(&mut self.slots[index], tick) == Fate::Leaves {
                self.kill(index);
            }
        }
    }
}

impl<const N: usize> Default for Arena<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// First live slot in `mask` whose bounds overlap `bounds`.
pub fn first_overlap<const N: usize>(
    arena: &Arena<N>,
    mask: u64,
    bounds: &Bounds,
) -> Option<usize> {
    SlotIter(mask & arena.live_mask())
        .find(|&i| arena.slots[i].bounds().overlaps(bounds))
}

/// Like [`first_overlap`] but ignores liveness: `mask` is the authority.
/// Used against a mask captured before the current pass started killing.
pub fn first_overlap_in<const N: usize>(
    arena: &Arena<N>,
    mask: u64,
    bounds: &Bounds,
) -> Option<usize> {
    SlotIter(mask).find(|&i| i < N && arena.slots[i].bounds().overlaps(bounds))
}
