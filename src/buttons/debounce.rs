//! Interrupt-side half of the button debouncer.
//!
//! A [`DebounceArm`] holds one pending slot per button. The port edge
//! interrupt arms a slot: it masks that button's interrupt line, stamps
//! the current tick and raises the pending flag. From then on only the
//! scheduler touches the slot, and it hands the slot back by clearing the
//! flag and unmasking the line at commit time.
//!
//! Because the line is masked for the whole window, the interrupt cannot
//! run for that button again until the poll side has finished with the
//! slot. The pending flag is published with `Release` after the start
//! stamp and read with `Acquire`, so the poll side always sees the stamp
//! that belongs to the flag.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::board::BUTTON_COUNT;
use crate::hal::{EdgeInterrupts, PinConfig, Port};
use crate::tick::TickClock;

/// Handoff record shared between the edge interrupt and the scheduler.
struct PendingSlot {
    pending: AtomicBool,
    start: AtomicU32,
}

impl PendingSlot {
    const IDLE: Self = Self {
        pending: AtomicBool::new(false),
        start: AtomicU32::new(0),
    };
}

/// Pending-debounce table, armed from port interrupts.
pub struct DebounceArm {
    configs: &'static [PinConfig; BUTTON_COUNT],
    slots: [PendingSlot; BUTTON_COUNT],
}

impl DebounceArm {
    pub const fn new(configs: &'static [PinConfig; BUTTON_COUNT]) -> Self {
        Self {
            configs,
            slots: [PendingSlot::IDLE; BUTTON_COUNT],
        }
    }

    /// Button wiring this table was built for.
    pub fn configs(&self) -> &'static [PinConfig; BUTTON_COUNT] {
        self.configs
    }

    /// Arm the debounce window for the button at `(pin_mask, port)`.
    ///
    /// Interrupt context only. `pin_mask` must have exactly one bit set.
    /// Sources that match no configured button, and buttons that are
    /// already debouncing, are ignored.
    pub fn start_debounce<I>(&self, pin_mask: u32, port: Port, clock: &TickClock, lines: &I)
    where
        I: EdgeInterrupts + ?Sized,
    {
        if pin_mask.count_ones() != 1 {
            return;
        }
        let Some(index) = self.find(pin_mask, port) else {
            return;
        };
        let slot = &self.slots[index];
        if slot.pending.load(Ordering::Acquire) {
            return;
        }

        lines.disable(self.configs[index].pin);
        slot.start.store(clock.now_millis(), Ordering::Relaxed);
        slot.pending.store(true, Ordering::Release);
    }

    /// Body of a PIO port interrupt handler.
    ///
    /// `status` is the port's interrupt status word, read once by the
    /// handler. Every button bit set in it is armed, lowest bit first, then
    /// the port's request is cleared at the interrupt controller. The
    /// status register is not read again here: an edge latched after
    /// `status` was taken stays there and re-raises the interrupt.
    pub fn on_port_interrupt<I>(&self, port: Port, status: u32, clock: &TickClock, lines: &I)
    where
        I: EdgeInterrupts + ?Sized,
    {
        let mut sources = status & self.button_mask(port);
        while sources != 0 {
            let bit = sources & sources.wrapping_neg();
            self.start_debounce(bit, port, clock, lines);
            sources &= !bit;
        }
        lines.clear_pending(port);
    }

    /// OR of every button bit wired to `port`.
    pub fn button_mask(&self, port: Port) -> u32 {
        self.configs
            .iter()
            .filter(|cfg| cfg.pin.port == port)
            .fold(0, |mask, cfg| mask | cfg.pin.mask)
    }

    /// True while the button's debounce window is open.
    pub fn is_pending(&self, index: usize) -> bool {
        self.slots[index].pending.load(Ordering::Acquire)
    }

    pub(crate) fn any_pending(&self) -> bool {
        (0..BUTTON_COUNT).any(|i| self.is_pending(i))
    }

    /// Tick stamped when the window opened. Only meaningful while pending.
    pub(crate) fn started_at(&self, index: usize) -> u32 {
        self.slots[index].start.load(Ordering::Relaxed)
    }

    /// Close the window. The caller re-enables the line afterwards.
    pub(crate) fn finish(&self, index: usize) {
        self.slots[index].pending.store(false, Ordering::Release);
    }

    /// Drop every pending window. Call with all button lines masked.
    pub(crate) fn reset(&self) {
        for slot in &self.slots {
            slot.pending.store(false, Ordering::Relaxed);
            slot.start.store(0, Ordering::Relaxed);
        }
    }

    fn find(&self, pin_mask: u32, port: Port) -> Option<usize> {
        self.configs
            .iter()
            .position(|cfg| cfg.pin.mask == pin_mask && cfg.pin.port == port)
    }
}
