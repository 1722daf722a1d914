//! Everything that lives on the playfield, and the fixed per-tick update.

use embedded_graphics::geometry::Point;

use crate::clock::Tick;
use crate::collision::{self, RulesOutcome};
use crate::config::{
    BARRIER_COLS, BARRIER_COUNT, BARRIER_INTEGRITY, BARRIER_ROWS, BARRIER_Y, MAX_BOMBS,
    MAX_INVADERS, MAX_PLAYER_SHOTS, MAX_SEGMENTS, PLAYER_SPEED, PLAYER_W, PLAYER_Y, SCREEN_W,
    SEGMENT_H, SEGMENT_W, SHOT_H, SHOT_SPEED, SHOT_W, WaveTuning,
};
use crate::entity::{Arena, Entity, Kind, Owner, Velocity, advance};
use crate::input::InputSnapshot;
use crate::rng::Rng;
use crate::wave::Wave;

const PLAYER_START: Point = Point::new((SCREEN_W - PLAYER_W) / 2, PLAYER_Y);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct World {
    pub player: Entity,
    pub shots: Arena<MAX_PLAYER_SHOTS>,
    pub bombs: Arena<MAX_BOMBS>,
    pub invaders: Arena<MAX_INVADERS>,
    pub barriers: Arena<MAX_SEGMENTS>,
    pub wave: Wave,
    /// Ticks left in which bombs pass through the player.
    pub invulnerable: u16,
}

impl World {
    pub const fn new() -> Self {
        Self {
            player: Entity::new(Kind::Player, PLAYER_START),
            shots: Arena::new(),
            bombs: Arena::new(),
            invaders: Arena::new(),
            barriers: Arena::new(),
            wave: Wave::empty(),
            invulnerable: 0,
        }
    }

    /// Fresh board for a new game: wave 1, full barriers, player centred.
    pub fn start(&mut self, tuning: &WaveTuning) {
        self.player = Entity::new(Kind::Player, PLAYER_START);
        self.invulnerable = 0;
        self.next_wave(1, tuning);
    }

    /// Spawns wave `number` and rebuilds the barriers. Runs after the
    /// collision pass, never while an arena is being walked.
    pub fn next_wave(&mut self, number: u16, tuning: &WaveTuning) {
        self.shots.reset();
        self.bombs.reset();
        self.wave = Wave::spawn(number, tuning, &mut self.invaders);
        self.build_barriers();
    }

    fn build_barriers(&mut self) {
        self.barriers.reset();
        let span = BARRIER_COLS as i32 * SEGMENT_W;
        for barrier in 0..BARRIER_COUNT as i32 {
            let centre = SCREEN_W * (2 * barrier + 1) / (2 * BARRIER_COUNT as i32);
            let left = centre - span / 2;
            for row in 0..BARRIER_ROWS as i32 {
                for col in 0..BARRIER_COLS as i32 {
                    let pos = Point::new(left + col * SEGMENT_W, BARRIER_Y + row * SEGMENT_H);
                    let kind = Kind::Barrier {
                        integrity: BARRIER_INTEGRITY,
                    };
                    self.barriers.allocate(Entity::new(kind, pos));
                }
            }
        }
    }

    /// One Playing tick: player, projectiles, invaders, barriers, then the
    /// collision pass.
    pub fn update(
        &mut self,
        input: &InputSnapshot,
        tick: Tick,
        tuning: &WaveTuning,
        rng: &mut Rng,
    ) -> RulesOutcome {
        // Slots killed last tick become free.
        self.shots.reclaim();
        self.bombs.reclaim();
        self.invaders.reclaim();
        self.barriers.reclaim();

        self.invulnerable = self.invulnerable.saturating_sub(1);
        self.player.vel = Velocity::new(input.steer() * PLAYER_SPEED, 0);
        advance(&mut self.player, tick);
        if input.fire_pressed() {
            self.fire();
        }

        self.shots.advance_all(tick);
        self.bombs.advance_all(tick);

        self.wave.advance(&mut self.invaders, tuning, tick);
        self.wave.drop_bomb(&self.invaders, &mut self.bombs, rng);

        self.barriers.advance_all(tick);

        collision::resolve(self)
    }

    /// Launches a player shot from the cannon's nose, if a slot is free.
    pub fn fire(&mut self) -> Option<usize> {
        let pos = self.player.pos + Point::new((PLAYER_W - SHOT_W) / 2, -SHOT_H);
        let shot = Entity::new(Kind::Shot(Owner::Player), pos)
            .with_velocity(Velocity::new(0, -SHOT_SPEED));
        let slot = self.shots.allocate(shot);
        if slot.is_none() {
            log::debug!("shot dropped: {} already in flight", MAX_PLAYER_SHOTS);
        }
        slot
    }

    /// Clears the bombs in flight and starts the immunity window.
    pub fn player_hit(&mut self, invulnerable_ticks: u16) {
        for bomb in self.bombs.live_indices() {
            self.bombs.kill(bomb);
        }
        self.invulnerable = invulnerable_ticks;
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FIELD_RIGHT, INVADER_COLS, INVADER_W};
    use crate::input::Buttons;

    fn held(buttons: Buttons) -> InputSnapshot {
        InputSnapshot {
            held: buttons,
            pressed: Buttons::NONE,
        }
    }

    fn pressed(buttons: Buttons) -> InputSnapshot {
        InputSnapshot {
            held: buttons,
            pressed: buttons,
        }
    }

    #[test]
    fn start_builds_the_board() {
        let mut world = World::new();
        world.start(&WaveTuning::default());
        assert_eq!(world.invaders.live_count() as usize, MAX_INVADERS);
        assert_eq!(world.barriers.live_count() as usize, MAX_SEGMENTS);
        assert_eq!(world.wave.number, 1);
        assert_eq!(world.player.pos, PLAYER_START);
    }

    #[test]
    fn steering_moves_the_player() {
        let mut world = World::new();
        let tuning = WaveTuning::default();
        world.start(&tuning);
        let mut rng = Rng::new(1);
        world.update(&held(Buttons::LEFT), Tick(1), &tuning, &mut rng);
        assert_eq!(world.player.pos.x, PLAYER_START.x - PLAYER_SPEED);
    }

    #[test]
    fn fire_press_launches_one_shot() {
        let mut world = World::new();
        let tuning = WaveTuning::default();
        world.start(&tuning);
        let mut rng = Rng::new(1);
        world.update(&pressed(Buttons::FIRE), Tick(1), &tuning, &mut rng);
        assert_eq!(world.shots.live_count(), 1);
        // Holding fire does not autofire.
        world.update(&held(Buttons::FIRE), Tick(2), &tuning, &mut rng);
        assert_eq!(world.shots.live_count(), 1);
    }

    #[test]
    fn shots_saturate() {
        let mut world = World::new();
        world.start(&WaveTuning::default());
        for _ in 0..MAX_PLAYER_SHOTS {
            assert!(world.fire().is_some());
        }
        assert_eq!(world.fire(), None);
    }

    #[test]
    fn hit_clears_bombs_and_grants_immunity() {
        let mut world = World::new();
        world.start(&WaveTuning::default());
        world
            .bombs
            .allocate(Entity::new(Kind::Shot(Owner::Invader), Point::new(10, 50)));
        world.player_hit(20);
        assert_eq!(world.bombs.live_count(), 0);
        assert_eq!(world.invulnerable, 20);
    }

    #[test]
    fn barriers_sit_between_grid_and_player() {
        let mut world = World::new();
        world.start(&WaveTuning::default());
        for (_, segment) in world.barriers.iter() {
            assert!(segment.pos.y >= BARRIER_Y);
            assert!(segment.bounds().bottom() < PLAYER_Y);
            assert!(segment.pos.x >= 0 && segment.bounds().right() <= SCREEN_W);
        }
    }

    #[test]
    fn edge_invader_shot_on_arrival_does_not_turn_the_wave() {
        let tuning = WaveTuning {
            base_interval: 1,
            min_interval: 1,
            fire_interval: 1000,
            min_fire_interval: 1000,
            ..WaveTuning::default()
        };
        let mut world = World::new();
        world.start(&tuning);
        let mut rng = Rng::new(1);

        // Keep the two ends of the top row.
        let (left, right) = (0, INVADER_COLS - 1);
        for index in 0..MAX_INVADERS {
            if index != left && index != right {
                world.invaders.kill(index);
            }
        }
        world.invaders.reclaim();

        let right_x = |world: &World| world.invaders.get(right).map_or(FIELD_RIGHT, |e| e.pos.x);
        let mut tick = 0;
        while right_x(&world) + INVADER_W + tuning.step_px < FIELD_RIGHT {
            tick += 1;
            world.wave.advance(&mut world.invaders, &tuning, Tick(tick));
            assert!(tick < 1000, "wave never neared the edge");
        }

        // A shot that meets the right invader where its next step lands.
        let Some(target) = world.invaders.get(right).map(|e| e.pos) else {
            panic!("right invader gone early");
        };
        let aim = target + Point::new(tuning.step_px + INVADER_W / 2, SHOT_SPEED + 2);
        world.shots.allocate(
            Entity::new(Kind::Shot(Owner::Player), aim)
                .with_velocity(Velocity::new(0, -SHOT_SPEED)),
        );

        let outcome = world.update(&InputSnapshot::IDLE, Tick(tick + 1), &tuning, &mut rng);
        assert_eq!(outcome.invaders_destroyed, 1);
        assert!(!world.invaders.is_live(right));

        let Some(survivor) = world.invaders.get(left).map(|e| e.pos) else {
            panic!("left invader gone");
        };
        world.update(&InputSnapshot::IDLE, Tick(tick + 2), &tuning, &mut rng);
        assert_eq!(world.wave.direction, 1);
        assert_eq!(world.wave.descents, 0);
        assert_eq!(
            world.invaders.get(left).map(|e| e.pos),
            Some(survivor + Point::new(tuning.step_px, 0))
        );
    }
}
