//! System tick clock.
//!
//! A millisecond counter (and derived seconds counter) advanced once per
//! hardware tick, the only time base used by the drivers. Both counters
//! are written exclusively by [`TickClock::tick`], which runs in the tick
//! interrupt; everything else only loads them. Each load is a single
//! word-sized atomic access, so no lock is needed.
//!
//! Elapsed time is always computed with wrapping subtraction, which
//! stays correct across the 32-bit rollover (~49.7 days at 1 kHz).

use core::sync::atomic::{AtomicU32, Ordering};

use crate::config::MILLIS_PER_SECOND;

/// Monotonic millisecond / second counters.
pub struct TickClock {
    millis: AtomicU32,
    seconds: AtomicU32,
}

impl TickClock {
    /// Clock at boot (0 ms).
    pub const fn new() -> Self {
        Self::starting_at(0)
    }

    /// Clock whose millisecond counter starts at `millis`.
    pub const fn starting_at(millis: u32) -> Self {
        Self {
            millis: AtomicU32::new(millis),
            seconds: AtomicU32::new(millis / MILLIS_PER_SECOND),
        }
    }

    /// Advance by one tick. Call only from the tick interrupt.
    pub fn tick(&self) {
        let now = self.millis.load(Ordering::Relaxed).wrapping_add(1);
        self.millis.store(now, Ordering::Release);
        if now % MILLIS_PER_SECOND == 0 {
            let secs = self.seconds.load(Ordering::Relaxed).wrapping_add(1);
            self.seconds.store(secs, Ordering::Release);
        }
    }

    pub fn now_millis(&self) -> u32 {
        self.millis.load(Ordering::Acquire)
    }

    pub fn now_seconds(&self) -> u32 {
        self.seconds.load(Ordering::Acquire)
    }

    /// Milliseconds since `start`, modulo 2^32.
    pub fn elapsed_since(&self, start: u32) -> u32 {
        self.now_millis().wrapping_sub(start)
    }

    /// True once at least `period` ms have passed since `start`.
    pub fn is_time_up(&self, start: u32, period: u32) -> bool {
        self.elapsed_since(start) >= period
    }
}

impl Default for TickClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_zero() {
        let clock = TickClock::new();
        assert_eq!(clock.now_millis(), 0);
        assert_eq!(clock.now_seconds(), 0);
    }

    #[test]
    fn seconds_follow_millis() {
        let clock = TickClock::new();
        for _ in 0..999 {
            clock.tick();
        }
        assert_eq!(clock.now_seconds(), 0);
        clock.tick();
        assert_eq!(clock.now_millis(), 1000);
        assert_eq!(clock.now_seconds(), 1);

        for _ in 0..2500 {
            clock.tick();
        }
        assert_eq!(clock.now_seconds(), clock.now_millis() / 1000);
    }

    #[test]
    fn elapsed_is_correct_across_wrap() {
        let clock = TickClock::starting_at(u32::MAX - 2);
        let start = clock.now_millis();
        for _ in 0..5 {
            clock.tick();
        }
        assert_eq!(clock.now_millis(), 2);
        assert_eq!(clock.elapsed_since(start), 5);
        assert!(clock.is_time_up(start, 5));
        assert!(!clock.is_time_up(start, 6));
    }

    #[test]
    fn starting_at_derives_seconds() {
        let clock = TickClock::starting_at(12_345);
        assert_eq!(clock.now_seconds(), 12);
    }
}
