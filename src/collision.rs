//! Per-tick collision pass and rule resolution.

use crate::config::{INVASION_Y, MAX_SEGMENTS};
use crate::entity::{Arena, Kind, first_overlap, first_overlap_in};
use crate::world::World;

/// Axis-aligned box in integer pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Bounds {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Bounds {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    pub const fn right(&self) -> i32 {
        self.x + self.w
    }

    pub const fn bottom(&self) -> i32 {
        self.y + self.h
    }

    pub const fn overlaps(&self, other: &Bounds) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }
}

/// What the collision pass decided for this tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RulesOutcome {
    pub points: u32,
    pub invaders_destroyed: u32,
    pub player_hit: bool,
    /// An invader touched the player or reached the invasion line.
    pub invaded: bool,
    pub wave_cleared: bool,
}

/// Resolves every overlap for the tick, after all entities have moved.
///
/// Passes run in a fixed order and each walks its arenas by ascending index,
/// so the outcome depends only on the world state.
pub fn resolve(world: &mut World) -> RulesOutcome {
    let mut outcome = RulesOutcome::default();

    shots_vs_invaders(world, &mut outcome);
    projectiles_vs_barriers(world);
    bombs_vs_player(world, &mut outcome);
    invaders_vs_ground(world, &mut outcome);

    outcome.wave_cleared = world.invaders.live_count() == 0;
    outcome
}

/// Each player shot hits the lowest-index invader it overlaps. Targets are
/// the invaders alive when the pass started, so two shots overlapping the
/// same invader are both spent, and the invader is scored once.
fn shots_vs_invaders(world: &mut World, outcome: &mut RulesOutcome) {
    let targets = world.invaders.live_mask();
    for shot in world.shots.live_indices() {
        let Some(bounds) = world.shots.get(shot).map(|s| s.bounds()) else {
            continue;
        };
        let Some(hit) = first_overlap_in(&world.invaders, targets, &bounds) else {
            continue;
        };
        world.shots.kill(shot);
        let class = world.invaders.get(hit).map(|e| e.kind);
        if world.invaders.kill(hit) {
            if let Some(Kind::Invader(class)) = class {
                outcome.points += class.points();
            }
            outcome.invaders_destroyed += 1;
            log::debug!("invader {} destroyed", hit);
        }
    }
}

/// Any projectile that meets a barrier segment chips it and is spent.
fn projectiles_vs_barriers(world: &mut World) {
    for shot in world.shots.live_indices() {
        let Some(bounds) = world.shots.get(shot).map(|s| s.bounds()) else {
            continue;
        };
        if let Some(segment) = first_overlap(&world.barriers, u64::MAX, &bounds) {
            world.shots.kill(shot);
            erode(&mut world.barriers, segment);
        }
    }
    for bomb in world.bombs.live_indices() {
        let Some(bounds) = world.bombs.get(bomb).map(|b| b.bounds()) else {
            continue;
        };
        if let Some(segment) = first_overlap(&world.barriers, u64::MAX, &bounds) {
            world.bombs.kill(bomb);
            erode(&mut world.barriers, segment);
        }
    }
}

fn bombs_vs_player(world: &mut World, outcome: &mut RulesOutcome) {
    if world.invulnerable > 0 {
        return;
    }
    let player = world.player.bounds();
    for bomb in world.bombs.live_indices() {
        let overlaps = world
            .bombs
            .get(bomb)
            .is_some_and(|b| b.bounds().overlaps(&player));
        if overlaps {
            world.bombs.kill(bomb);
            outcome.player_hit = true;
        }
    }
}

/// Invaders plough through barriers; touching the player or the invasion
/// line ends the game.
fn invaders_vs_ground(world: &mut World, outcome: &mut RulesOutcome) {
    let player = world.player.bounds();
    for invader in world.invaders.live_indices() {
        let Some(bounds) = world.invaders.get(invader).map(|e| e.bounds()) else {
            continue;
        };
        while let Some(segment) = first_overlap(&world.barriers, u64::MAX, &bounds) {
            world.barriers.kill(segment);
        }
        if bounds.overlaps(&player) || bounds.bottom() >= INVASION_Y {
            outcome.invaded = true;
        }
    }
}

fn erode(barriers: &mut Arena<MAX_SEGMENTS>, segment: usize) {
    let worn_out = match barriers.get_mut(segment).map(|e| &mut e.kind) {
        Some(Kind::Barrier { integrity }) => {
            *integrity = integrity.saturating_sub(1);
            *integrity == 0
        }
        _ => false,
    };
    if worn_out {
        barriers.kill(segment);
    }
}
