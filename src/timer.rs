//! Timer/counter channel manager.
//!
//! Each channel of the timer block counts up to a programmable compare
//! value and raises a compare-match interrupt, which calls
//! [`TimerChannels::on_compare_match`]. That bumps the channel's
//! diagnostic counter and runs the user callback in interrupt context,
//! so callbacks must be short and must not wait on anything.
//!
//! The shared half ([`TimerChannels`]) lives in a `static` reachable from
//! the interrupt. The main-context half ([`TimerManager`]) owns period and
//! run state and talks to the hardware.

use core::cell::Cell;
use core::sync::atomic::{AtomicU32, Ordering};

use critical_section::Mutex;

use crate::error::Error;
use crate::hal::TimerHardware;
use crate::scheduler::Task;

/// Number of channels in the timer block.
pub const TIMER_CHANNEL_COUNT: usize = 3;

/// Compare-match callback. Runs in interrupt context.
pub type TimerCallback = fn();

/// Callback every channel starts with.
pub fn no_op() {}

/// Timer block channels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerChannel {
    Tc0 = 0,
    Tc1,
    Tc2,
}

impl TimerChannel {
    pub const ALL: [TimerChannel; TIMER_CHANNEL_COUNT] =
        [TimerChannel::Tc0, TimerChannel::Tc1, TimerChannel::Tc2];

    pub const fn index(self) -> usize {
        self as usize
    }
}

impl TryFrom<u8> for TimerChannel {
    type Error = Error;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .get(raw as usize)
            .copied()
            .ok_or(Error::UnknownChannel(raw))
    }
}

struct ChannelShared {
    callback: Mutex<Cell<TimerCallback>>,
    matches: AtomicU32,
}

impl ChannelShared {
    const IDLE: Self = Self {
        callback: Mutex::new(Cell::new(no_op as TimerCallback)),
        matches: AtomicU32::new(0),
    };
}

/// Interrupt-visible state of every channel.
pub struct TimerChannels {
    shared: [ChannelShared; TIMER_CHANNEL_COUNT],
}

impl TimerChannels {
    pub const fn new() -> Self {
        Self {
            shared: [ChannelShared::IDLE; TIMER_CHANNEL_COUNT],
        }
    }

    /// Compare-match interrupt body for `channel`.
    pub fn on_compare_match(&self, channel: TimerChannel) {
        let shared = &self.shared[channel.index()];
        shared.matches.fetch_add(1, Ordering::Relaxed);

        // Copy the pointer out so the callback runs with interrupts enabled.
        let callback = critical_section::with(|cs| shared.callback.borrow(cs).get());
        callback();
    }

    /// Compare matches seen on `channel` since initialization.
    pub fn interrupt_count(&self, channel: TimerChannel) -> u32 {
        self.shared[channel.index()].matches.load(Ordering::Relaxed)
    }

    fn set_callback(&self, channel: TimerChannel, callback: TimerCallback) {
        critical_section::with(|cs| {
            self.shared[channel.index()].callback.borrow(cs).set(callback);
        });
    }

    fn reset(&self) {
        for channel in TimerChannel::ALL {
            self.set_callback(channel, no_op);
            self.shared[channel.index()].matches.store(0, Ordering::Relaxed);
        }
    }
}

impl Default for TimerChannels {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy, Debug)]
struct ChannelConfig {
    period: u16,
    running: bool,
}

impl ChannelConfig {
    const STOPPED: Self = Self {
        period: 0,
        running: false,
    };
}

/// Main-context channel control.
pub struct TimerManager<'a, H> {
    channels: &'a TimerChannels,
    hw: &'a H,
    config: [ChannelConfig; TIMER_CHANNEL_COUNT],
}

impl<'a, H: TimerHardware> TimerManager<'a, H> {
    pub fn new(channels: &'a TimerChannels, hw: &'a H) -> Self {
        Self {
            channels,
            hw,
            config: [ChannelConfig::STOPPED; TIMER_CHANNEL_COUNT],
        }
    }

    /// Program the compare value. Takes effect at the next start.
    ///
    /// Rewriting the compare register under a running counter can tear,
    /// so a running channel is rejected; stop it first or use
    /// [`reload`](Self::reload).
    pub fn set_period(&mut self, channel: TimerChannel, ticks: u16) -> Result<(), Error> {
        let config = &mut self.config[channel.index()];
        if config.running {
            return Err(Error::ChannelRunning(channel));
        }
        config.period = ticks;
        self.hw.load_compare(channel.index(), ticks);
        Ok(())
    }

    /// Reset the counter and start counting.
    pub fn start(&mut self, channel: TimerChannel) {
        self.hw.start_counter(channel.index());
        self.config[channel.index()].running = true;

        #[cfg(feature = "defmt")]
        defmt::debug!("Timer {}: start, period {}", channel, self.config[channel.index()].period);
    }

    /// Stop counting. Period and callback are kept.
    pub fn stop(&mut self, channel: TimerChannel) {
        self.hw.stop_counter(channel.index());
        self.config[channel.index()].running = false;

        #[cfg(feature = "defmt")]
        defmt::debug!("Timer {}: stop", channel);
    }

    /// Stop, reprogram and restart in one step.
    pub fn reload(&mut self, channel: TimerChannel, ticks: u16) -> Result<(), Error> {
        self.stop(channel);
        self.set_period(channel, ticks)?;
        self.start(channel);
        Ok(())
    }

    /// Counter ticks since the last trigger.
    pub fn get_elapsed(&self, channel: TimerChannel) -> u16 {
        self.hw.counter(channel.index())
    }

    /// Replace the compare-match callback. Safe while running.
    pub fn assign_callback(&mut self, channel: TimerChannel, callback: TimerCallback) {
        self.channels.set_callback(channel, callback);
    }

    pub fn interrupt_count(&self, channel: TimerChannel) -> u32 {
        self.channels.interrupt_count(channel)
    }

    pub fn is_running(&self, channel: TimerChannel) -> bool {
        self.config[channel.index()].running
    }

    pub fn period(&self, channel: TimerChannel) -> u16 {
        self.config[channel.index()].period
    }
}

impl<H: TimerHardware> Task for TimerManager<'_, H> {
    /// Stop every channel, default the callbacks and unmask compare
    /// interrupts.
    fn initialize(&mut self) {
        self.config = [ChannelConfig::STOPPED; TIMER_CHANNEL_COUNT];
        self.channels.reset();
        for channel in TimerChannel::ALL {
            self.hw.stop_counter(channel.index());
            self.hw.load_compare(channel.index(), 0);
            self.hw.enable_compare_interrupt(channel.index());
        }
    }

    /// Channels are interrupt driven; nothing to poll.
    fn run_active_state(&mut self) {}
}
