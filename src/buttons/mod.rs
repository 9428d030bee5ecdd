//! Debounced button driver.
//!
//! Buttons are interrupt driven. A port edge interrupt arms a debounce
//! window through [`DebounceArm::start_debounce`]; once per tick the
//! scheduler runs [`ButtonDriver::run_active_state`], which re-reads the
//! pin of every button whose window has closed and commits the new
//! logical state.
//!
//! ## Scan states
//!
//! - **Idle**: no button is debouncing. Each tick only checks whether
//!   any slot has been armed.
//! - **Active**: at least one button is debouncing. Each tick walks every
//!   pending button and commits the ones whose window has elapsed, then
//!   drops back to Idle when none remain.
//!
//! ## Queries
//!
//! `is_pressed` is the committed level, `was_pressed` is a sticky
//! new-press latch that only `acknowledge` clears, and `is_held` reports
//! a press that has lasted at least a given time.

pub mod debounce;


pub use debounce::DebounceArm;

use crate::board::{ButtonId, BUTTON_COUNT};
use crate::config::DEBOUNCE_TIME_MS;
use crate::hal::{EdgeInterrupts, PinIo, Port};
use crate::scheduler::Task;
use crate::tick::TickClock;

/// Committed logical state of a button.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonState {
    Released,
    Pressed,
}

/// Scheduler-level state of the driver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScanState {
    Idle,
    Active,
}

/// Poll-side record for one button.
#[derive(Clone, Copy, Debug)]
struct ButtonStatus {
    current: ButtonState,
    staged: ButtonState,
    new_press: bool,
    pressed_at: u32,
}

impl ButtonStatus {
    const RELEASED: Self = Self {
        current: ButtonState::Released,
        staged: ButtonState::Released,
        new_press: false,
        pressed_at: 0,
    };
}

/// Main-context half of the debouncer.
pub struct ButtonDriver<'a, B> {
    arm: &'a DebounceArm,
    clock: &'a TickClock,
    board: &'a B,
    status: [ButtonStatus; BUTTON_COUNT],
    scan: ScanState,
}

impl<'a, B> ButtonDriver<'a, B>
where
    B: PinIo + EdgeInterrupts,
{
    pub fn new(arm: &'a DebounceArm, clock: &'a TickClock, board: &'a B) -> Self {
        Self {
            arm,
            clock,
            board,
            status: [ButtonStatus::RELEASED; BUTTON_COUNT],
            scan: ScanState::Idle,
        }
    }

    /// True if the button's committed state is `Pressed`.
    pub fn is_pressed(&self, id: ButtonId) -> bool {
        self.status[id.index()].current == ButtonState::Pressed
    }

    /// True if a new press has been committed since the last
    /// [`acknowledge`](Self::acknowledge). Does not clear the latch.
    pub fn was_pressed(&self, id: ButtonId) -> bool {
        self.status[id.index()].new_press
    }

    /// Clear the new-press latch.
    pub fn acknowledge(&mut self, id: ButtonId) {
        self.status[id.index()].new_press = false;
    }

    /// True if the button is pressed and has been for at least
    /// `hold_time_ms`. Non-latching.
    pub fn is_held(&self, id: ButtonId, hold_time_ms: u32) -> bool {
        let status = &self.status[id.index()];
        status.current == ButtonState::Pressed
            && self.clock.is_time_up(status.pressed_at, hold_time_ms)
    }

    /// Committed state of the button.
    pub fn state(&self, id: ButtonId) -> ButtonState {
        self.status[id.index()].current
    }

    /// True while the button's debounce window is open.
    pub fn is_debouncing(&self, id: ButtonId) -> bool {
        self.arm.is_pending(id.index())
    }

    pub fn scan_state(&self) -> ScanState {
        self.scan
    }

    fn scan_idle(&mut self) {
        if self.arm.any_pending() {
            #[cfg(feature = "defmt")]
            defmt::trace!("Buttons: debounce active");
            self.scan = ScanState::Active;
        }
    }

    fn scan_active(&mut self) {
        let mut still_pending = false;

        for index in 0..BUTTON_COUNT {
            if !self.arm.is_pending(index) {
                continue;
            }
            if !self.clock.is_time_up(self.arm.started_at(index), DEBOUNCE_TIME_MS) {
                still_pending = true;
                continue;
            }
            self.commit(index);
        }

        if !still_pending {
            self.scan = ScanState::Idle;
        }
    }

    /// Re-read the pin, update the logical state and hand the line back
    /// to the interrupt.
    fn commit(&mut self, index: usize) {
        let config = self.arm.configs()[index];
        let level = self.board.read(config.pin);
        let status = &mut self.status[index];

        status.staged = if config.polarity.is_active(level) {
            ButtonState::Pressed
        } else {
            ButtonState::Released
        };

        if status.staged != status.current {
            status.current = status.staged;
            if status.current == ButtonState::Pressed {
                status.new_press = true;
                status.pressed_at = self.clock.now_millis();
            }
            #[cfg(feature = "defmt")]
            defmt::debug!("Button {}: {}", index, status.current);
        }

        // Regardless of a state change, close the window before unmasking.
        self.arm.finish(index);
        self.board.enable(config.pin);
    }
}

impl<B> Task for ButtonDriver<'_, B>
where
    B: PinIo + EdgeInterrupts,
{
    /// Reset every button to released and enable all button interrupts.
    fn initialize(&mut self) {
        let configs = self.arm.configs();
        for config in configs {
            self.board.disable(config.pin);
        }

        self.arm.reset();
        self.status = [ButtonStatus::RELEASED; BUTTON_COUNT];
        self.scan = ScanState::Idle;

        for port in Port::ALL {
            self.board.discard_edges(port);
        }
        for config in configs {
            self.board.enable(config.pin);
        }
        for port in Port::ALL {
            self.board.clear_pending(port);
        }
    }

    fn run_active_state(&mut self) {
        match self.scan {
            ScanState::Idle => self.scan_idle(),
            ScanState::Active => self.scan_active(),
        }
    }
}
