//! Game state machine: which phase the cabinet is in, and what each tick
//! does in it.

use embedded_graphics::prelude::DrawTarget;

use crate::clock::Tick;
use crate::collision::RulesOutcome;
use crate::config::Config;
use crate::input::InputSnapshot;
use crate::render::{self, Hud, Ink};
use crate::rng::Rng;
use crate::world::World;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
pub enum Phase {
    Menu,
    Playing,
    Paused,
    GameOver,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Trigger {
    Fire,
    Pause,
    LivesExhausted,
}

/// Every legal phase change. Anything not listed is ignored.
const fn transition(phase: Phase, trigger: Trigger) -> Option<Phase> {
    match (phase, trigger) {
        (Phase::Menu, Trigger::Fire) => Some(Phase::Playing),
        (Phase::Playing, Trigger::Pause) => Some(Phase::Paused),
        (Phase::Playing, Trigger::LivesExhausted) => Some(Phase::GameOver),
        (Phase::Paused, Trigger::Pause) => Some(Phase::Playing),
        (Phase::GameOver, Trigger::Fire) => Some(Phase::Menu),
        _ => None,
    }
}

pub struct Game {
    phase: Phase,
    score: u32,
    high_score: u32,
    lives: u8,
    wave: u16,
    world: World,
    rng: Rng,
    config: Config,
    game_over_at: Tick,
    renders_skipped: u32,
}

impl Game {
    pub fn new(config: Config) -> Self {
        Self {
            phase: Phase::Menu,
            score: 0,
            high_score: 0,
            lives: 0,
            wave: 0,
            world: World::new(),
            rng: Rng::new(1),
            config,
            game_over_at: Tick(0),
            renders_skipped: 0,
        }
    }

    /// Runs one tick. Returns the new phase if it changed.
    pub fn step(&mut self, input: &InputSnapshot, tick: Tick) -> Option<Phase> {
        let trigger = match self.phase {
            Phase::Menu => input.fire_pressed().then_some(Trigger::Fire),
            Phase::Playing if input.pause_pressed() => Some(Trigger::Pause),
            Phase::Playing => {
                let outcome = self
                    .world
                    .update(input, tick, &self.config.wave, &mut self.rng);
                self.apply(outcome);
                (self.lives == 0).then_some(Trigger::LivesExhausted)
            }
            Phase::Paused => input.pause_pressed().then_some(Trigger::Pause),
            Phase::GameOver => {
                (self.cooled_down(tick) && input.fire_pressed()).then_some(Trigger::Fire)
            }
        }?;

        let next = transition(self.phase, trigger)?;
        self.enter(next, tick);
        Some(next)
    }

    fn enter(&mut self, next: Phase, tick: Tick) {
        match (self.phase, next) {
            (Phase::Menu, Phase::Playing) => self.start_game(tick),
            (_, Phase::GameOver) => {
                self.game_over_at = tick;
                log::info!("game over: score {} on wave {}", self.score, self.wave);
            }
            _ => {}
        }
        log::info!("phase {:?} -> {:?}", self.phase, next);
        self.phase = next;
    }

    /// The only place a run's score, lives and wave are reset.
    fn start_game(&mut self, tick: Tick) {
        self.score = 0;
        self.lives = self.config.starting_lives;
        self.wave = 1;
        self.rng = Rng::new(tick.0);
        self.world.start(&self.config.wave);
    }

    fn apply(&mut self, outcome: RulesOutcome) {
        self.score = self.score.saturating_add(outcome.points);
        self.high_score = self.high_score.max(self.score);

        if outcome.invaded {
            log::info!("invaders landed");
            self.lives = 0;
            return;
        }
        if outcome.player_hit {
            self.lives = self.lives.saturating_sub(1);
            log::debug!("player hit, {} lives left", self.lives);
            if self.lives > 0 {
                self.world.player_hit(self.config.invulnerable_ticks);
            }
        }
        if self.lives > 0 && outcome.wave_cleared {
            self.wave = self.wave.saturating_add(1);
            log::info!("wave {} cleared", self.wave - 1);
            self.world.next_wave(self.wave, &self.config.wave);
        }
    }

    /// Draws the current phase. The caller clears the target first.
    pub fn draw<D>(&self, target: &mut D, tick: Tick) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Ink>,
    {
        match self.phase {
            Phase::Menu => render::draw_title(target, self.high_score, tick),
            Phase::Playing => render::draw_scene(target, &self.world, &self.hud(), tick),
            Phase::Paused => {
                render::draw_scene(target, &self.world, &self.hud(), tick)?;
                render::draw_pause_overlay(target)
            }
            Phase::GameOver => {
                render::draw_scene(target, &self.world, &self.hud(), tick)?;
                render::draw_game_over(target, self.score, self.cooled_down(tick))
            }
        }
    }

    /// Game over has lasted long enough for fire to restart.
    fn cooled_down(&self, tick: Tick) -> bool {
        tick.since(self.game_over_at) >= u32::from(self.config.game_over_cooldown)
    }

    /// Records that this tick's frame never reached the panel.
    pub fn note_render_skipped(&mut self) {
        self.renders_skipped = self.renders_skipped.saturating_add(1);
    }

    pub fn hud(&self) -> Hud {
        Hud {
            score: self.score,
            high_score: self.high_score,
            lives: self.lives,
            wave: self.wave,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn high_score(&self) -> u32 {
        self.high_score
    }

    pub fn lives(&self) -> u8 {
        self.lives
    }

    pub fn wave(&self) -> u16 {
        self.wave
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn renders_skipped(&self) -> u32 {
        self.renders_skipped
    }
}

#[cfg(test)]
mod tests {
    use embedded_graphics::geometry::Point;

    use super::*;
    use crate::config::{INVADER_H, INVASION_Y, MAX_INVADERS, PLAYER_Y};
    use crate::entity::{Entity, Kind, Owner, Velocity};
    use crate::input::Buttons;
    use crate::render::FrameBuffer;

    fn press(buttons: Buttons) -> InputSnapshot {
        InputSnapshot {
            held: buttons,
            pressed: buttons,
        }
    }

    fn playing(config: Config) -> Game {
        let mut game = Game::new(config);
        assert_eq!(game.step(&press(Buttons::FIRE), Tick(1)), Some(Phase::Playing));
        game
    }

    fn bomb_on_player(game: &mut Game) {
        let x = game.world().player.pos.x;
        let bomb = Entity::new(Kind::Shot(Owner::Invader), Point::new(x + 4, PLAYER_Y - 6))
            .with_velocity(Velocity::new(0, 2));
        game.world_mut().bombs.allocate(bomb);
    }

    #[test]
    fn fire_on_the_menu_starts_a_fresh_game() {
        let game = playing(Config::default());
        assert_eq!(game.phase(), Phase::Playing);
        assert_eq!(game.score(), 0);
        assert_eq!(game.lives(), 3);
        assert_eq!(game.wave(), 1);
        assert_eq!(game.world().invaders.live_count() as usize, MAX_INVADERS);
    }

    #[test]
    fn menu_ignores_everything_but_fire() {
        let mut game = Game::new(Config::default());
        assert_eq!(game.step(&press(Buttons::PAUSE | Buttons::LEFT), Tick(1)), None);
        assert_eq!(game.step(&InputSnapshot::IDLE, Tick(2)), None);
        assert_eq!(game.phase(), Phase::Menu);
    }

    #[test]
    fn last_life_lost_ends_the_game_on_the_same_tick() {
        let mut game = playing(Config {
            starting_lives: 1,
            ..Config::default()
        });
        bomb_on_player(&mut game);
        assert_eq!(game.step(&InputSnapshot::IDLE, Tick(2)), Some(Phase::GameOver));
        assert_eq!(game.lives(), 0);
    }

    #[test]
    fn invaders_landing_end_the_game_at_full_lives() {
        let mut game = playing(Config::default());
        assert_eq!(game.lives(), 3);
        // Clear of the barriers and the cannon, with its feet on the line.
        if let Some(invader) = game.world_mut().invaders.get_mut(0) {
            invader.pos.y = INVASION_Y - INVADER_H;
        }
        assert_eq!(game.step(&InputSnapshot::IDLE, Tick(2)), Some(Phase::GameOver));
        assert_eq!(game.lives(), 0);
        assert_eq!(game.phase(), Phase::GameOver);
    }

    #[test]
    fn a_hit_costs_one_life_and_grants_immunity() {
        let mut game = playing(Config::default());
        bomb_on_player(&mut game);
        assert_eq!(game.step(&InputSnapshot::IDLE, Tick(2)), None);
        assert_eq!(game.lives(), 2);
        assert!(game.world().invulnerable > 0);
    }

    #[test]
    fn clearing_wave_one_brings_a_faster_wave_two() {
        let mut game = playing(Config::default());
        let first = game.world().wave.move_interval;
        for index in 0..MAX_INVADERS {
            game.world_mut().invaders.kill(index);
        }
        assert_eq!(game.step(&InputSnapshot::IDLE, Tick(2)), None);
        assert_eq!(game.wave(), 2);
        assert!(game.world().wave.move_interval < first);
        assert_eq!(game.world().invaders.live_count() as usize, MAX_INVADERS);
    }

    #[test]
    fn pause_freezes_the_world() {
        let mut game = playing(Config::default());
        assert_eq!(game.step(&press(Buttons::PAUSE), Tick(2)), Some(Phase::Paused));
        let frozen = game.world().clone();
        for tick in 3..40 {
            assert_eq!(game.step(&press(Buttons::LEFT), Tick(tick)), None);
        }
        assert_eq!(game.world(), &frozen);
        assert_eq!(game.step(&press(Buttons::PAUSE), Tick(40)), Some(Phase::Playing));
    }

    #[test]
    fn game_over_waits_for_the_cooldown() {
        let config = Config {
            starting_lives: 1,
            game_over_cooldown: 10,
            ..Config::default()
        };
        let mut game = playing(config);
        bomb_on_player(&mut game);
        assert_eq!(game.step(&InputSnapshot::IDLE, Tick(2)), Some(Phase::GameOver));

        assert_eq!(game.step(&press(Buttons::FIRE), Tick(5)), None);
        assert_eq!(game.step(&press(Buttons::FIRE), Tick(12)), Some(Phase::Menu));
    }

    #[test]
    fn high_score_survives_the_next_run() {
        let mut game = playing(Config {
            starting_lives: 1,
            game_over_cooldown: 0,
            ..Config::default()
        });
        game.score = 120;
        bomb_on_player(&mut game);
        game.step(&InputSnapshot::IDLE, Tick(2));
        assert_eq!(game.high_score(), 120);

        game.step(&press(Buttons::FIRE), Tick(3));
        game.step(&press(Buttons::FIRE), Tick(4));
        assert_eq!(game.phase(), Phase::Playing);
        assert_eq!(game.score(), 0);
        assert_eq!(game.high_score(), 120);
    }

    #[test]
    fn every_phase_draws() {
        let mut game = Game::new(Config::default());
        let mut frame = FrameBuffer::new();
        game.draw(&mut frame, Tick(0)).ok();
        assert!(frame.inks().any(|ink| ink != Ink::BLACK));

        game.step(&press(Buttons::FIRE), Tick(1));
        game.step(&press(Buttons::PAUSE), Tick(2));
        let mut paused = FrameBuffer::new();
        game.draw(&mut paused, Tick(2)).ok();
        assert!(paused.inks().any(|ink| ink == Ink::WHITE));
    }

    #[test]
    fn transition_table_rejects_unlisted_moves() {
        assert_eq!(transition(Phase::Menu, Trigger::Pause), None);
        assert_eq!(transition(Phase::Paused, Trigger::Fire), None);
        assert_eq!(transition(Phase::GameOver, Trigger::LivesExhausted), None);
    }
}
