//! Host-side board simulation.
//!
//! [`SimBoard`] implements every hardware capability the drivers need
//! with plain `Cell`s, so the full runtime can be stepped tick by tick on
//! a desktop. Pin writes are recorded in a bounded log for inspection.

use core::cell::{Cell, RefCell};

use heapless::Vec;

use crate::hal::{EdgeInterrupts, Level, PinId, PinIo, Port, TimerHardware};
use crate::scheduler::Sleep;
use crate::tick::TickClock;
use crate::timer::{TimerChannel, TimerChannels, TIMER_CHANNEL_COUNT};

/// Maximum number of pin writes kept in the log.
pub const SIM_LOG_CAPACITY: usize = 256;

/// One recorded output operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinEvent {
    Set(PinId),
    Clear(PinId),
    Toggle(PinId),
}

impl PinEvent {
    pub fn pin(&self) -> PinId {
        match *self {
            PinEvent::Set(pin) | PinEvent::Clear(pin) | PinEvent::Toggle(pin) => pin,
        }
    }
}

#[derive(Default)]
struct SimChannel {
    compare: Cell<u16>,
    counter: Cell<u16>,
    running: Cell<bool>,
    irq_enabled: Cell<bool>,
}

/// Simulated PIO controllers and timer block.
///
/// Each port keeps an input-change status word that latches every level
/// change and clears when read, separate from the request pending at the
/// interrupt controller.
#[derive(Default)]
pub struct SimBoard {
    levels: [Cell<u32>; Port::COUNT],
    irq_enabled: [Cell<u32>; Port::COUNT],
    edge_status: [Cell<u32>; Port::COUNT],
    pending_clears: [Cell<u32>; Port::COUNT],
    log: RefCell<Vec<PinEvent, SIM_LOG_CAPACITY>>,
    channels: [SimChannel; TIMER_CHANNEL_COUNT],
}

impl SimBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Force the level seen on an input pin (a finger on a button). A
    /// change of level latches the pin's bit in the port status word.
    pub fn drive(&self, pin: PinId, level: Level) {
        if self.level(pin) != level {
            let status = &self.edge_status[pin.port.index()];
            status.set(status.get() | pin.mask);
        }
        self.apply(pin, level);
    }

    /// Read and clear the port's status word, keeping only lines that are
    /// currently unmasked. This is what a port interrupt handler sees.
    pub fn take_status(&self, port: Port) -> u32 {
        let status = self.edge_status[port.index()].replace(0);
        status & self.irq_mask(port)
    }

    /// Edges latched on the port and not yet read.
    pub fn latched_edges(&self, port: Port) -> u32 {
        self.edge_status[port.index()].get()
    }

    /// Current level of a pin.
    pub fn level(&self, pin: PinId) -> Level {
        Level::from(self.levels[pin.port.index()].get() & pin.mask != 0)
    }

    /// True if the pin's edge interrupt is unmasked.
    pub fn is_irq_enabled(&self, pin: PinId) -> bool {
        self.irq_enabled[pin.port.index()].get() & pin.mask != 0
    }

    /// Raw interrupt-enable word of a port.
    pub fn irq_mask(&self, port: Port) -> u32 {
        self.irq_enabled[port.index()].get()
    }

    /// Number of times the port's request was cleared at the interrupt
    /// controller.
    pub fn pending_clears(&self, port: Port) -> u32 {
        self.pending_clears[port.index()].get()
    }

    /// Snapshot of the pin-write log.
    pub fn events(&self) -> Vec<PinEvent, SIM_LOG_CAPACITY> {
        self.log.borrow().clone()
    }

    /// Number of logged toggles of `pin`.
    pub fn toggle_count(&self, pin: PinId) -> usize {
        self.log
            .borrow()
            .iter()
            .filter(|event| **event == PinEvent::Toggle(pin))
            .count()
    }

    pub fn clear_log(&self) {
        self.log.borrow_mut().clear();
    }

    /// True if the channel's counter clock is enabled.
    pub fn is_counting(&self, channel: TimerChannel) -> bool {
        self.channels[channel.index()].running.get()
    }

    /// Clock a timer channel `counts` times, raising the compare-match
    /// interrupt into `handlers` each time the counter reaches the
    /// compare value.
    pub fn advance_timer(&self, channel: TimerChannel, counts: u32, handlers: &TimerChannels) {
        let sim = &self.channels[channel.index()];
        for _ in 0..counts {
            if !sim.running.get() {
                return;
            }
            let next = sim.counter.get().wrapping_add(1);
            if sim.compare.get() != 0 && next == sim.compare.get() {
                sim.counter.set(0);
                if sim.irq_enabled.get() {
                    handlers.on_compare_match(channel);
                }
            } else {
                sim.counter.set(next);
            }
        }
    }

    fn apply(&self, pin: PinId, level: Level) {
        let port = &self.levels[pin.port.index()];
        match level {
            Level::High => port.set(port.get() | pin.mask),
            Level::Low => port.set(port.get() & !pin.mask),
        }
    }

    fn record(&self, event: PinEvent) {
        // A full log stops recording; the pin state is still updated.
        let _ = self.log.borrow_mut().push(event);
    }
}

impl PinIo for SimBoard {
    fn set(&self, pin: PinId) {
        self.apply(pin, Level::High);
        self.record(PinEvent::Set(pin));
    }

    fn clear(&self, pin: PinId) {
        self.apply(pin, Level::Low);
        self.record(PinEvent::Clear(pin));
    }

    fn toggle(&self, pin: PinId) {
        let flipped = match self.level(pin) {
            Level::High => Level::Low,
            Level::Low => Level::High,
        };
        self.apply(pin, flipped);
        self.record(PinEvent::Toggle(pin));
    }

    fn read(&self, pin: PinId) -> Level {
        self.level(pin)
    }
}

impl EdgeInterrupts for SimBoard {
    fn enable(&self, pin: PinId) {
        let word = &self.irq_enabled[pin.port.index()];
        word.set(word.get() | pin.mask);
    }

    fn disable(&self, pin: PinId) {
        let word = &self.irq_enabled[pin.port.index()];
        word.set(word.get() & !pin.mask);
    }

    fn clear_pending(&self, port: Port) {
        let count = &self.pending_clears[port.index()];
        count.set(count.get() + 1);
    }

    fn discard_edges(&self, port: Port) {
        self.edge_status[port.index()].set(0);
    }
}

impl TimerHardware for SimBoard {
    fn load_compare(&self, channel: usize, ticks: u16) {
        self.channels[channel].compare.set(ticks);
    }

    fn start_counter(&self, channel: usize) {
        let sim = &self.channels[channel];
        sim.counter.set(0);
        sim.running.set(true);
    }

    fn stop_counter(&self, channel: usize) {
        self.channels[channel].running.set(false);
    }

    fn counter(&self, channel: usize) -> u16 {
        self.channels[channel].counter.get()
    }

    fn enable_compare_interrupt(&self, channel: usize) {
        self.channels[channel].irq_enabled.set(true);
    }
}

/// Idle strategy that stands in for the tick interrupt: every idle
/// advances the clock by one tick.
pub struct SimTicker<'a> {
    clock: &'a TickClock,
}

impl<'a> SimTicker<'a> {
    pub fn new(clock: &'a TickClock) -> Self {
        Self { clock }
    }
}

impl Sleep for SimTicker<'_> {
    fn idle(&mut self) {
        self.clock.tick();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticker_advances_clock_per_idle() {
        let clock = TickClock::new();
        let mut ticker = SimTicker::new(&clock);
        ticker.idle();
        ticker.idle();
        assert_eq!(clock.now_millis(), 2);
    }

    #[test]
    fn toggle_flips_level_and_logs() {
        let board = SimBoard::new();
        let pin = PinId::new(Port::B, 13);
        board.toggle(pin);
        assert_eq!(board.level(pin), Level::High);
        board.toggle(pin);
        assert_eq!(board.level(pin), Level::Low);
        assert_eq!(board.toggle_count(pin), 2);
    }

    #[test]
    fn irq_enable_touches_only_one_bit() {
        let board = SimBoard::new();
        let a = PinId::new(Port::B, 0);
        let b = PinId::new(Port::B, 1);
        board.enable(a);
        board.enable(b);
        board.disable(a);
        assert!(!board.is_irq_enabled(a));
        assert!(board.is_irq_enabled(b));
        assert_eq!(board.irq_mask(Port::B), 0b10);
    }

    #[test]
    fn status_word_latches_changes_and_clears_on_read() {
        let board = SimBoard::new();
        let pin = PinId::new(Port::A, 17);
        board.enable(pin);

        board.drive(pin, Level::Low);
        assert_eq!(board.latched_edges(Port::A), 0);

        board.drive(pin, Level::High);
        assert_eq!(board.take_status(Port::A), pin.mask);
        assert_eq!(board.take_status(Port::A), 0);
    }

    #[test]
    fn clearing_the_request_keeps_latched_edges() {
        let board = SimBoard::new();
        let pin = PinId::new(Port::B, 1);
        board.enable(pin);
        board.drive(pin, Level::High);

        board.clear_pending(Port::B);
        assert_eq!(board.latched_edges(Port::B), pin.mask);
        assert_eq!(board.pending_clears(Port::B), 1);

        board.discard_edges(Port::B);
        assert_eq!(board.latched_edges(Port::B), 0);
    }

    #[test]
    fn masked_lines_latch_but_are_not_reported() {
        let board = SimBoard::new();
        let pin = PinId::new(Port::B, 2);
        board.drive(pin, Level::High);
        assert_eq!(board.latched_edges(Port::B), pin.mask);
        assert_eq!(board.take_status(Port::B), 0);
        assert_eq!(board.latched_edges(Port::B), 0);
    }
}
