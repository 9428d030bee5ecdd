//! Application-wide constants and compile-time configuration.
//!
//! All timing parameters and clock constants live here so they can be
//! tuned in one place. Pin assignments live in [`crate::board`].

// Tick

/// Scheduler tick period (ms). Every driver is serviced once per tick.
pub const TICK_PERIOD_MS: u32 = 1;

/// Milliseconds per second counter increment.
pub const MILLIS_PER_SECOND: u32 = 1000;

// Buttons

/// Time a button line stays masked after an edge before the pin is
/// re-read and the new state committed (ms).
pub const DEBOUNCE_TIME_MS: u32 = 5;

/// Default hold threshold for long-press queries (ms).
pub const DEFAULT_HOLD_TIME_MS: u32 = 500;

// Scheduler

/// Maximum number of tasks the scheduler table can hold.
pub const MAX_TASKS: usize = 8;

// Clocks (SAM3U2 with the 12 MHz crystal and PLLA at 96 MHz / 2)

/// Master clock frequency (Hz).
pub const MCK_HZ: u32 = 48_000_000;

/// SysTick reload value for a 1 ms tick on the core clock.
pub const SYSTICK_RELOAD: u32 = MCK_HZ / 1000 * TICK_PERIOD_MS - 1;

/// Timer counter clock: MCK / 128 (TIMER_CLOCK4), ~2.67 us per count.
pub const TIMER_CLOCK_HZ: u32 = MCK_HZ / 128;

// Demo application

/// Binary clock advances once per this many milliseconds.
pub const BINARY_CLOCK_STEP_MS: u32 = 500;

/// Binary clock wraps at this count (four LEDs).
pub const BINARY_CLOCK_MODULUS: u8 = 16;

/// TC1 period used by the demo: 125 ms at TIMER_CLOCK4.
pub const DEMO_TIMER_PERIOD: u16 = (TIMER_CLOCK_HZ / 8) as u16;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_period_is_an_eighth_of_a_second() {
        assert_eq!(DEMO_TIMER_PERIOD, 46_875);
        assert_eq!(u32::from(DEMO_TIMER_PERIOD) * 8, TIMER_CLOCK_HZ);
    }

    #[test]
    fn systick_reload_gives_one_millisecond() {
        assert_eq!(SYSTICK_RELOAD + 1, MCK_HZ / MILLIS_PER_SECOND);
    }
}
