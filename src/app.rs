//! Demo user application.
//!
//! Shows off every driver at once:
//!
//! - RED, ORANGE, YELLOW and GREEN count in binary (bit 0 on RED), one
//!   step every [`BINARY_CLOCK_STEP_MS`], wrapping at 16. The LCD
//!   backlight is held white.
//! - WHITE follows BUTTON0; PURPLE lights once BUTTON0 has been held for
//!   [`DEFAULT_HOLD_TIME_MS`].
//! - A new BUTTON1 press blinks BLUE at 4 Hz, a new BUTTON2 press turns it
//!   off.
//! - A new BUTTON3 press starts TC1. Each pass that sees new compare
//!   matches toggles CYAN.

use crate::board::{ButtonId, LedId};
use crate::buttons::ButtonDriver;
use crate::config::{
    BINARY_CLOCK_MODULUS, BINARY_CLOCK_STEP_MS, DEFAULT_HOLD_TIME_MS, DEMO_TIMER_PERIOD,
};
use crate::error::Error;
use crate::hal::{EdgeInterrupts, PinIo, TimerHardware};
use crate::leds::{LedDriver, LedRate};
use crate::timer::{TimerChannel, TimerManager};

/// Channel the demo uses for its periodic event.
pub const DEMO_CHANNEL: TimerChannel = TimerChannel::Tc1;

const CLOCK_LEDS: [LedId; 4] = [LedId::Red, LedId::Orange, LedId::Yellow, LedId::Green];
const BACKLIGHT: [LedId; 3] = [LedId::LcdRed, LedId::LcdGreen, LedId::LcdBlue];

/// The user task. Runs last in every pass so it sees the drivers' state
/// for the current tick.
pub struct UserApp {
    ticks_since_step: u32,
    count: u8,
    seen_matches: u32,
}

impl UserApp {
    pub const fn new() -> Self {
        Self {
            ticks_since_step: 0,
            count: 0,
            seen_matches: 0,
        }
    }

    /// Reset the clock, light the backlight and prepare TC1.
    ///
    /// Expects the timer manager to have been initialized, so the channel
    /// is stopped.
    pub fn initialize<P, H>(
        &mut self,
        leds: &mut LedDriver<'_, P>,
        timers: &mut TimerManager<'_, H>,
    ) -> Result<(), Error>
    where
        P: PinIo,
        H: TimerHardware,
    {
        self.ticks_since_step = 0;
        self.count = 0;
        self.seen_matches = timers.interrupt_count(DEMO_CHANNEL);

        for id in BACKLIGHT {
            leds.turn_on(id);
        }
        self.show_count(leds);

        timers.set_period(DEMO_CHANNEL, DEMO_TIMER_PERIOD)
    }

    /// One application pass.
    pub fn run<P, B, H>(
        &mut self,
        leds: &mut LedDriver<'_, P>,
        buttons: &mut ButtonDriver<'_, B>,
        timers: &mut TimerManager<'_, H>,
    ) where
        P: PinIo,
        B: PinIo + EdgeInterrupts,
        H: TimerHardware,
    {
        self.step_clock(leds);

        show(leds, LedId::White, buttons.is_pressed(ButtonId::Button0));
        show(
            leds,
            LedId::Purple,
            buttons.is_held(ButtonId::Button0, DEFAULT_HOLD_TIME_MS),
        );

        if buttons.was_pressed(ButtonId::Button1) {
            buttons.acknowledge(ButtonId::Button1);
            leds.set_blink_rate(LedId::Blue, LedRate::Hz4);
        }

        if buttons.was_pressed(ButtonId::Button2) {
            buttons.acknowledge(ButtonId::Button2);
            leds.turn_off(LedId::Blue);
        }

        if buttons.was_pressed(ButtonId::Button3) {
            buttons.acknowledge(ButtonId::Button3);
            if !timers.is_running(DEMO_CHANNEL) {
                timers.start(DEMO_CHANNEL);
            }
        }

        // The compare-match counter is the event flag: any increase since
        // the last pass is one CYAN toggle.
        let matches = timers.interrupt_count(DEMO_CHANNEL);
        if matches != self.seen_matches {
            self.seen_matches = matches;
            leds.toggle(LedId::Cyan);
        }
    }

    /// Current binary clock value.
    pub fn count(&self) -> u8 {
        self.count
    }

    fn step_clock<P: PinIo>(&mut self, leds: &mut LedDriver<'_, P>) {
        self.ticks_since_step += 1;
        if self.ticks_since_step < BINARY_CLOCK_STEP_MS {
            return;
        }
        self.ticks_since_step = 0;
        self.count = (self.count + 1) % BINARY_CLOCK_MODULUS;
        self.show_count(leds);
    }

    fn show_count<P: PinIo>(&self, leds: &mut LedDriver<'_, P>) {
        for (bit, id) in CLOCK_LEDS.into_iter().enumerate() {
            show(leds, id, self.count & (1 << bit) != 0);
        }
    }
}

/// Drive a steady LED, touching the pin only on a change.
fn show<P: PinIo>(leds: &mut LedDriver<'_, P>, id: LedId, on: bool) {
    if leds.is_on(id) == on {
        return;
    }
    if on {
        leds.turn_on(id);
    } else {
        leds.turn_off(id);
    }
}

impl Default for UserApp {
    fn default() -> Self {
        Self::new()
    }
}
