//! Unified error type for the runtime core.
//!
//! We avoid `alloc` - all error variants carry only fixed-size data.
//! Implements `defmt::Format` for efficient on-target logging.

use crate::timer::TimerChannel;

/// Top-level error type used across the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    // Identities
    /// A raw button index outside the board's button table.
    UnknownButton(u8),

    /// A raw LED index outside the board's LED table.
    UnknownLed(u8),

    /// A raw timer channel index outside the timer block.
    UnknownChannel(u8),

    // Timers
    /// The compare register of a running channel cannot be rewritten;
    /// stop the channel first (or use `reload`).
    ChannelRunning(TimerChannel),

    // Scheduler
    /// The static task table has no free slot.
    SchedulerFull,
}
