//! Interrupt-driven frame clock.
//!
//! The timer interrupt is the only writer of the tick counter. It hands ticks
//! to the main loop through a single-slot mailbox: one `pending` flag, never a
//! queue. A tick that fires while the previous one is still pending is
//! counted as an overrun and dropped, so a slow main loop slows the game down
//! instead of compressing time.
//!
//! Every shared field is a single-word atomic. The interrupt only does
//! `fetch_add` and `swap`, the main loop only loads and clears, so there is
//! no read-modify-write that both contexts perform on the same word.

use portable_atomic::{AtomicBool, AtomicU32, Ordering};

/// One step of game time, as counted by the frame clock.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
pub struct Tick(pub u32);

impl Tick {
    /// Ticks elapsed since `earlier`, correct across counter wraparound.
    pub const fn since(self, earlier: Tick) -> u32 {
        self.0.wrapping_sub(earlier.0)
    }
}

/// Consistent view of the clock counters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClockStats {
    pub now: Tick,
    pub overruns: u32,
    pub pending: bool,
}

pub struct FrameClock {
    ticks: AtomicU32,
    pending: AtomicBool,
    overruns: AtomicU32,
}

impl FrameClock {
    pub const fn new() -> Self {
        Self {
            ticks: AtomicU32::new(0),
            pending: AtomicBool::new(false),
            overruns: AtomicU32::new(0),
        }
    }

    /// Timer interrupt body. O(1), never blocks.
    pub fn on_interrupt(&self) {
        // The counter is published before the flag, so a main loop that sees
        // `pending` also sees the tick that raised it.
        self.ticks.fetch_add(1, Ordering::Release);
        if self.pending.swap(true, Ordering::AcqRel) {
            self.overruns.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// The tick waiting to be processed, if any. Does not consume it.
    pub fn pending(&self) -> Option<Tick> {
        if self.pending.load(Ordering::Acquire) {
            Some(Tick(self.ticks.load(Ordering::Acquire)))
        } else {
            None
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Marks the pending tick as fully consumed.
    ///
    /// Any interrupt that landed while the tick was being processed has
    /// already been recorded as an overrun; its window is not replayed.
    pub fn complete(&self) {
        self.pending.store(false, Ordering::Release);
    }

    pub fn now(&self) -> Tick {
        Tick(self.ticks.load(Ordering::Acquire))
    }

    pub fn overruns(&self) -> u32 {
        self.overruns.load(Ordering::Relaxed)
    }

    /// Reads all counters with the tick interrupt held off, so the three
    /// values belong to the same instant.
    pub fn stats(&self) -> ClockStats {
        critical_section::with(|_| ClockStats {
            now: self.now(),
            overruns: self.overruns(),
            pending: self.is_pending(),
        })
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_interrupt_counts_exactly_once() {
        let clock = FrameClock::new();
        for expected in 1..=100 {
            clock.on_interrupt();
            assert_eq!(clock.pending(), Some(Tick(expected)));
            clock.complete();
        }
        assert_eq!(clock.now(), Tick(100));
        assert_eq!(clock.overruns(), 0);
    }

    #[test]
    fn back_to_back_interrupts_are_counted_but_not_queued() {
        let clock = FrameClock::new();
        clock.on_interrupt();
        clock.on_interrupt();
        clock.on_interrupt();

        assert_eq!(clock.now(), Tick(3));
        assert_eq!(clock.overruns(), 2);
        assert_eq!(clock.pending(), Some(Tick(3)));

        clock.complete();
        assert_eq!(clock.pending(), None);
    }

    #[test]
    fn pending_is_not_consumed_by_reading() {
        let clock = FrameClock::new();
        clock.on_interrupt();
        assert_eq!(clock.pending(), Some(Tick(1)));
        assert_eq!(clock.pending(), Some(Tick(1)));
        assert!(clock.is_pending());
    }

    #[test]
    fn stats_snapshot() {
        let clock = FrameClock::new();
        clock.on_interrupt();
        clock.on_interrupt();
        assert_eq!(
            clock.stats(),
            ClockStats {
                now: Tick(2),
                overruns: 1,
                pending: true
            }
        );
    }

    #[test]
    fn elapsed_survives_wraparound() {
        let before = Tick(u32::MAX - 1);
        let after = Tick(3);
        assert_eq!(after.since(before), 5);
    }
}
