//! Playfield geometry, arena capacities and the tunable knobs.
//!
//! Geometry and capacities are compile-time constants because they size the
//! static arrays. Everything that changes how the game *feels* lives in
//! [`Config`] and is checked once at boot by [`Config::validate`].

use core::fmt;

// --- Screen ---
pub const SCREEN_W: i32 = 240;
pub const SCREEN_H: i32 = 135;

// --- HUD ---
pub const HUD_H: i32 = 12;
pub const GROUND_Y: i32 = 132;

// --- Field edges the wave turns around at ---
pub const FIELD_LEFT: i32 = 4;
pub const FIELD_RIGHT: i32 = SCREEN_W - 4;

// --- Player ---
pub const PLAYER_W: i32 = 13;
pub const PLAYER_H: i32 = 8;
pub const PLAYER_Y: i32 = 122;
pub const PLAYER_SPEED: i32 = 2;

// --- Invaders ---
pub const INVADER_W: i32 = 11;
pub const INVADER_H: i32 = 8;
pub const INVADER_COLS: usize = 8;
pub const INVADER_ROWS: usize = 5;
pub const INVADER_PITCH_X: i32 = 16;
pub const INVADER_PITCH_Y: i32 = 12;
pub const INVADER_ORIGIN_Y: i32 = HUD_H + 6;
/// Each later wave starts this much lower, up to [`MAX_WAVE_DROP`].
pub const WAVE_DROP_PX: i32 = 4;
pub const MAX_WAVE_DROP: i32 = 24;
/// An invader whose bottom edge reaches this line has landed.
pub const INVASION_Y: i32 = PLAYER_Y;

// --- Projectiles ---
pub const SHOT_W: i32 = 1;
pub const SHOT_H: i32 = 4;
pub const SHOT_SPEED: i32 = 4;
pub const BOMB_W: i32 = 3;
pub const BOMB_H: i32 = 5;
pub const BOMB_SPEED: i32 = 2;

// --- Barriers ---
pub const BARRIER_COUNT: usize = 4;
pub const BARRIER_COLS: usize = 4;
pub const BARRIER_ROWS: usize = 2;
pub const SEGMENT_W: i32 = 5;
pub const SEGMENT_H: i32 = 4;
pub const BARRIER_Y: i32 = 104;
pub const BARRIER_INTEGRITY: u8 = 3;

// --- Arena capacities ---
pub const MAX_PLAYER_SHOTS: usize = 3;
pub const MAX_BOMBS: usize = 6;
pub const MAX_INVADERS: usize = INVADER_COLS * INVADER_ROWS;
pub const MAX_SEGMENTS: usize = BARRIER_COUNT * BARRIER_COLS * BARRIER_ROWS;

/// Upper bound on the debounce window; longer windows feel laggy at 30 Hz.
pub const MAX_DEBOUNCE_SAMPLES: u8 = 8;

/// Frame clock rates the cabinet is known to run at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
pub enum TickRate {
    Hz30,
    Hz50,
    Hz60,
}

impl TickRate {
    pub const fn hz(self) -> u32 {
        match self {
            TickRate::Hz30 => 30,
            TickRate::Hz50 => 50,
            TickRate::Hz60 => 60,
        }
    }
}

/// Invader movement and fire tuning. Intervals are in ticks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WaveTuning {
    /// Horizontal distance of one lockstep move.
    pub step_px: i32,
    /// Vertical drop when the wave turns around.
    pub descent_px: i32,
    /// Ticks between moves on wave 1 with a full grid.
    pub base_interval: u8,
    /// Fastest cadence any wave can reach.
    pub min_interval: u8,
    /// How much `base_interval` shrinks per cleared wave.
    pub speedup_per_wave: u8,
    pub fire_interval: u16,
    pub min_fire_interval: u16,
    pub fire_speedup_per_wave: u16,
}

impl Default for WaveTuning {
    fn default() -> Self {
        Self {
            step_px: 2,
            descent_px: 6,
            base_interval: 16,
            min_interval: 1,
            speedup_per_wave: 3,
            fire_interval: 60,
            min_fire_interval: 15,
            fire_speedup_per_wave: 8,
        }
    }
}

impl WaveTuning {
    /// Move cadence of a full grid on the given wave (1-based).
    pub fn move_interval(&self, wave: u16) -> u8 {
        let faster = u32::from(wave.saturating_sub(1)) * u32::from(self.speedup_per_wave);
        let interval = u32::from(self.base_interval).saturating_sub(faster);
        interval.max(u32::from(self.min_interval)) as u8
    }

    /// Ticks between bombs on the given wave (1-based).
    pub fn bomb_interval(&self, wave: u16) -> u16 {
        let faster = u32::from(wave.saturating_sub(1)) * u32::from(self.fire_speedup_per_wave);
        let interval = u32::from(self.fire_interval).saturating_sub(faster);
        interval.max(u32::from(self.min_fire_interval)) as u16
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    pub tick_rate: TickRate,
    /// Consecutive differing samples needed before a button changes state.
    pub debounce_samples: u8,
    /// Ticks the game-over screen ignores fire for.
    pub game_over_cooldown: u16,
    pub starting_lives: u8,
    /// Ticks of immunity after the player is hit.
    pub invulnerable_ticks: u16,
    pub wave: WaveTuning,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_rate: TickRate::Hz50,
            debounce_samples: 3,
            game_over_cooldown: 50,
            starting_lives: 3,
            invulnerable_ticks: 50,
            wave: WaveTuning::default(),
        }
    }
}

impl Config {
    /// Checks the knobs that would break an invariant if out of range.
    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.debounce_samples == 0 || self.debounce_samples > MAX_DEBOUNCE_SAMPLES {
            return Err(ConfigError::DebounceOutOfRange(self.debounce_samples));
        }
        if self.starting_lives == 0 {
            return Err(ConfigError::NoLives);
        }
        let wave = &self.wave;
        // A step wider than the edge margin could carry an invader off screen.
        if wave.step_px <= 0 || wave.step_px > FIELD_LEFT {
            return Err(ConfigError::StepOutOfRange(wave.step_px));
        }
        if wave.descent_px <= 0 {
            return Err(ConfigError::DescentOutOfRange(wave.descent_px));
        }
        if wave.min_interval == 0 || wave.min_interval > wave.base_interval {
            return Err(ConfigError::MoveInterval);
        }
        if wave.min_fire_interval == 0 || wave.min_fire_interval > wave.fire_interval {
            return Err(ConfigError::FireInterval);
        }
        Ok(self)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
pub enum ConfigError {
    DebounceOutOfRange(u8),
    NoLives,
    StepOutOfRange(i32),
    DescentOutOfRange(i32),
    MoveInterval,
    FireInterval,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::DebounceOutOfRange(n) => {
                write!(f, "debounce window {n} outside 1..={MAX_DEBOUNCE_SAMPLES}")
            }
            ConfigError::NoLives => f.write_str("starting lives must be at least 1"),
            ConfigError::StepOutOfRange(px) => {
                write!(f, "wave step {px}px outside 1..={FIELD_LEFT}")
            }
            ConfigError::DescentOutOfRange(px) => write!(f, "wave descent {px}px must be positive"),
            ConfigError::MoveInterval => {
                f.write_str("move interval needs 1 <= min_interval <= base_interval")
            }
            ConfigError::FireInterval => {
                f.write_str("fire interval needs 1 <= min_fire_interval <= fire_interval")
            }
        }
    }
}
