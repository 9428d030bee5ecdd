//! Top-level composition of the drivers and the user application.

use crate::app::UserApp;
use crate::board::LED_CONFIGS;
use crate::buttons::{ButtonDriver, DebounceArm};
use crate::hal::{EdgeInterrupts, PinIo, TimerHardware};
use crate::leds::LedDriver;
use crate::scheduler::Task;
use crate::tick::TickClock;
use crate::timer::{TimerChannels, TimerManager};

/// Every task of the firmware, serviced in the fixed order LED, Button,
/// Timer, then the application.
///
/// Registered with the scheduler as one task. The application holds
/// borrows of the drivers, so the order is kept here rather than in the
/// scheduler's table.
pub struct Firmware<'a, B> {
    leds: LedDriver<'a, B>,
    buttons: ButtonDriver<'a, B>,
    timers: TimerManager<'a, B>,
    app: UserApp,
}

impl<'a, B> Firmware<'a, B>
where
    B: PinIo + EdgeInterrupts + TimerHardware,
{
    pub fn new(
        board: &'a B,
        clock: &'a TickClock,
        arm: &'a DebounceArm,
        channels: &'a TimerChannels,
    ) -> Self {
        Self {
            leds: LedDriver::new(&LED_CONFIGS, board),
            buttons: ButtonDriver::new(arm, clock, board),
            timers: TimerManager::new(channels, board),
            app: UserApp::new(),
        }
    }

    pub fn leds(&self) -> &LedDriver<'a, B> {
        &self.leds
    }

    pub fn buttons(&self) -> &ButtonDriver<'a, B> {
        &self.buttons
    }

    pub fn timers(&self) -> &TimerManager<'a, B> {
        &self.timers
    }

    pub fn app(&self) -> &UserApp {
        &self.app
    }
}

impl<B> Task for Firmware<'_, B>
where
    B: PinIo + EdgeInterrupts + TimerHardware,
{
    fn initialize(&mut self) {
        self.leds.initialize();
        self.buttons.initialize();
        self.timers.initialize();
        if let Err(_error) = self.app.initialize(&mut self.leds, &mut self.timers) {
            #[cfg(feature = "defmt")]
            defmt::error!("Firmware: user app init failed: {}", _error);
        }

        #[cfg(feature = "defmt")]
        defmt::info!("Firmware: initialized");
    }

    fn run_active_state(&mut self) {
        self.leds.run_active_state();
        self.buttons.run_active_state();
        self.timers.run_active_state();
        self.app.run(&mut self.leds, &mut self.buttons, &mut self.timers);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::DEMO_CHANNEL;
    use crate::board::{ButtonId, LedId, BUTTON_CONFIGS};
    use crate::config::{BINARY_CLOCK_STEP_MS, DEFAULT_HOLD_TIME_MS, DEMO_TIMER_PERIOD};
    use crate::leds::{LedMode, LedRate};
    use crate::sim::SimBoard;

    struct Rig {
        board: SimBoard,
        clock: TickClock,
        arm: DebounceArm,
        channels: TimerChannels,
    }

    impl Rig {
        fn new() -> Self {
            let board = SimBoard::new();
            for config in &BUTTON_CONFIGS {
                board.drive(config.pin, config.polarity.level_for(false));
            }
            Self {
                board,
                clock: TickClock::new(),
                arm: DebounceArm::new(&BUTTON_CONFIGS),
                channels: TimerChannels::new(),
            }
        }

        fn firmware(&self) -> Firmware<'_, SimBoard> {
            let mut firmware = Firmware::new(&self.board, &self.clock, &self.arm, &self.channels);
            firmware.initialize();
            firmware
        }

        fn set_button(&self, id: ButtonId, pressed: bool) {
            let config = &BUTTON_CONFIGS[id.index()];
            self.board.drive(config.pin, config.polarity.level_for(pressed));
            self.arm
                .on_port_interrupt(config.pin.port, config.pin.mask, &self.clock, &self.board);
        }

        fn run(&self, firmware: &mut Firmware<'_, SimBoard>, ticks: u32) {
            for _ in 0..ticks {
                self.clock.tick();
                firmware.run_active_state();
            }
        }
    }

    /// Ticks that comfortably cover one debounce window.
    const SETTLE: u32 = 6;

    #[test]
    fn initialize_lights_backlight_only() {
        let rig = Rig::new();
        let firmware = rig.firmware();

        for id in LedId::ALL {
            let expected = matches!(id, LedId::LcdRed | LedId::LcdGreen | LedId::LcdBlue);
            assert_eq!(firmware.leds().is_on(id), expected, "{:?}", id);
        }
        assert_eq!(firmware.app().count(), 0);
        assert_eq!(firmware.timers().period(DEMO_CHANNEL), DEMO_TIMER_PERIOD);
        assert!(!firmware.timers().is_running(DEMO_CHANNEL));
    }

    #[test]
    fn binary_clock_counts_and_wraps() {
        let rig = Rig::new();
        let mut firmware = rig.firmware();

        rig.run(&mut firmware, BINARY_CLOCK_STEP_MS);
        assert_eq!(firmware.app().count(), 1);
        assert!(firmware.leds().is_on(LedId::Red));
        assert!(!firmware.leds().is_on(LedId::Orange));

        rig.run(&mut firmware, BINARY_CLOCK_STEP_MS * 10);
        assert_eq!(firmware.app().count(), 11);
        assert!(firmware.leds().is_on(LedId::Red));
        assert!(firmware.leds().is_on(LedId::Orange));
        assert!(!firmware.leds().is_on(LedId::Yellow));
        assert!(firmware.leds().is_on(LedId::Green));

        rig.run(&mut firmware, BINARY_CLOCK_STEP_MS * 5);
        assert_eq!(firmware.app().count(), 0);
        assert!(!firmware.leds().is_on(LedId::Green));
    }

    #[test]
    fn button0_press_and_hold() {
        let rig = Rig::new();
        let mut firmware = rig.firmware();

        rig.set_button(ButtonId::Button0, true);
        rig.run(&mut firmware, SETTLE);
        assert!(firmware.leds().is_on(LedId::White));
        assert!(!firmware.leds().is_on(LedId::Purple));

        rig.run(&mut firmware, DEFAULT_HOLD_TIME_MS);
        assert!(firmware.leds().is_on(LedId::Purple));

        rig.set_button(ButtonId::Button0, false);
        rig.run(&mut firmware, SETTLE);
        assert!(!firmware.leds().is_on(LedId::White));
        assert!(!firmware.leds().is_on(LedId::Purple));
    }

    #[test]
    fn button1_blinks_blue_and_button2_stops_it() {
        let rig = Rig::new();
        let mut firmware = rig.firmware();

        rig.set_button(ButtonId::Button1, true);
        rig.run(&mut firmware, SETTLE);
        assert_eq!(firmware.leds().mode(LedId::Blue), LedMode::Blink);
        assert_eq!(firmware.leds().blink_period(LedId::Blue), LedRate::Hz4.ticks());
        assert!(!firmware.buttons().was_pressed(ButtonId::Button1));

        rig.set_button(ButtonId::Button2, true);
        rig.run(&mut firmware, SETTLE);
        assert_eq!(firmware.leds().mode(LedId::Blue), LedMode::Steady);
        assert!(!firmware.leds().is_on(LedId::Blue));
    }

    #[test]
    fn button3_starts_timer_that_toggles_cyan() {
        let rig = Rig::new();
        let mut firmware = rig.firmware();

        rig.set_button(ButtonId::Button3, true);
        rig.run(&mut firmware, SETTLE);
        assert!(firmware.timers().is_running(DEMO_CHANNEL));
        assert!(!firmware.leds().is_on(LedId::Cyan));

        rig.board
            .advance_timer(DEMO_CHANNEL, u32::from(DEMO_TIMER_PERIOD), &rig.channels);
        rig.run(&mut firmware, 1);
        assert!(firmware.leds().is_on(LedId::Cyan));

        rig.board
            .advance_timer(DEMO_CHANNEL, u32::from(DEMO_TIMER_PERIOD), &rig.channels);
        rig.run(&mut firmware, 1);
        assert!(!firmware.leds().is_on(LedId::Cyan));
        assert_eq!(firmware.timers().interrupt_count(DEMO_CHANNEL), 2);
    }
}
