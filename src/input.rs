//! Debounced button sampling.

use core::ops::BitOr;

/// Raw pin levels as read by the HAL, already converted to "pressed".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RawPinState {
    pub left: bool,
    pub right: bool,
    pub fire: bool,
    pub pause: bool,
}

/// A set of cabinet buttons.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Buttons(u8);

impl Buttons {
    pub const NONE: Buttons = Buttons(0);
    pub const LEFT: Buttons = Buttons(1 << 0);
    pub const RIGHT: Buttons = Buttons(1 << 1);
    pub const FIRE: Buttons = Buttons(1 << 2);
    pub const PAUSE: Buttons = Buttons(1 << 3);

    const ALL: [Buttons; 4] = [Self::LEFT, Self::RIGHT, Self::FIRE, Self::PAUSE];

    pub const fn contains(self, other: Buttons) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    fn set(&mut self, button: Buttons, on: bool) {
        if on {
            self.0 |= button.0;
        } else {
            self.0 &= !button.0;
        }
    }
}

impl BitOr for Buttons {
    type Output = Buttons;

    fn bitor(self, rhs: Buttons) -> Buttons {
        Buttons(self.0 | rhs.0)
    }
}

impl From<RawPinState> for Buttons {
    fn from(raw: RawPinState) -> Self {
        let mut buttons = Buttons::NONE;
        buttons.set(Buttons::LEFT, raw.left);
        buttons.set(Buttons::RIGHT, raw.right);
        buttons.set(Buttons::FIRE, raw.fire);
        buttons.set(Buttons::PAUSE, raw.pause);
        buttons
    }
}

/// Debounced input for one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InputSnapshot {
    /// Buttons whose debounced state is "down".
    pub held: Buttons,
    /// Buttons that went down on this tick.
    pub pressed: Buttons,
}

impl InputSnapshot {
    pub const IDLE: InputSnapshot = InputSnapshot {
        held: Buttons::NONE,
        pressed: Buttons::NONE,
    };

    pub fn fire_pressed(&self) -> bool {
        self.pressed.contains(Buttons::FIRE)
    }

    pub fn pause_pressed(&self) -> bool {
        self.pressed.contains(Buttons::PAUSE)
    }

    /// -1 for left, 1 for right, 0 when neither or both are held.
    pub fn steer(&self) -> i32 {
        let left = self.held.contains(Buttons::LEFT);
        let right = self.held.contains(Buttons::RIGHT);
        match (left, right) {
            (true, false) => -1,
            (false, true) => 1,
            _ => 0,
        }
    }
}

/// Per-button filter: the stable level changes only after `threshold`
/// consecutive samples disagree with it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Debouncer {
    stable: bool,
    run: u8,
}

impl Debouncer {
    pub const fn new() -> Self {
        Self {
            stable: false,
            run: 0,
        }
    }

    pub fn update(&mut self, sample: bool, threshold: u8) -> bool {
        if sample == self.stable {
            self.run = 0;
        } else {
            self.run = self.run.saturating_add(1);
            if self.run >= threshold {
                self.stable = sample;
                self.run = 0;
            }
        }
        self.stable
    }
}

pub struct InputSampler {
    filters: [Debouncer; 4],
    threshold: u8,
    held: Buttons,
}

impl InputSampler {
    pub const fn new(threshold: u8) -> Self {
        Self {
            filters: [Debouncer::new(); 4],
            threshold,
            held: Buttons::NONE,
        }
    }

    /// Folds one raw reading into the filters and returns this tick's snapshot.
    pub fn sample(&mut self, raw: RawPinState) -> InputSnapshot {
        let raw = Buttons::from(raw);
        let mut held = Buttons::NONE;
        for (filter, button) in self.filters.iter_mut().zip(Buttons::ALL) {
            let down = filter.update(raw.contains(button), self.threshold);
            held.set(button, down);
        }

        let pressed = Buttons(held.0 & !self.held.0);
        self.held = held;
        InputSnapshot { held, pressed }
    }
}
