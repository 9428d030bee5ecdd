//! LED driver and blink engine.
//!
//! On, off and toggle act on the pin immediately and put the LED back in
//! steady mode, cancelling any blink. Blinking relies on the scheduler
//! calling [`LedDriver::run_active_state`] once per tick: each blinking
//! LED counts down and toggles when its countdown reaches zero, so an
//! LED blinking with period `n` toggles every `n` ticks and completes a
//! full on/off cycle every `2n` ticks.

use crate::board::{LedId, LED_COUNT};
use crate::hal::{PinConfig, PinIo};
use crate::scheduler::Task;

/// Operating mode of one LED.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LedMode {
    Steady,
    Blink,
}

/// Standard blink rates, as toggle intervals in 1 ms ticks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u16)]
pub enum LedRate {
    Hz0_5 = 1000,
    Hz1 = 500,
    Hz2 = 250,
    Hz4 = 125,
    Hz8 = 62,
}

impl LedRate {
    /// Ticks between toggles.
    pub const fn ticks(self) -> u16 {
        self as u16
    }
}

#[derive(Clone, Copy, Debug)]
struct LedRecord {
    mode: LedMode,
    period: u16,
    countdown: u16,
}

impl LedRecord {
    const STEADY: Self = Self {
        mode: LedMode::Steady,
        period: 0,
        countdown: 0,
    };
}

/// Owns the blink state of every LED on the board.
pub struct LedDriver<'a, P> {
    configs: &'static [PinConfig; LED_COUNT],
    board: &'a P,
    records: [LedRecord; LED_COUNT],
}

impl<'a, P: PinIo> LedDriver<'a, P> {
    pub fn new(configs: &'static [PinConfig; LED_COUNT], board: &'a P) -> Self {
        Self {
            configs,
            board,
            records: [LedRecord::STEADY; LED_COUNT],
        }
    }

    /// Turn the LED on and cancel any blink.
    pub fn turn_on(&mut self, id: LedId) {
        let config = &self.configs[id.index()];
        self.board.write(config.pin, config.polarity.level_for(true));
        self.records[id.index()].mode = LedMode::Steady;
    }

    /// Turn the LED off and cancel any blink.
    pub fn turn_off(&mut self, id: LedId) {
        let config = &self.configs[id.index()];
        self.board.write(config.pin, config.polarity.level_for(false));
        self.records[id.index()].mode = LedMode::Steady;
    }

    /// Invert the LED and cancel any blink.
    pub fn toggle(&mut self, id: LedId) {
        self.board.toggle(self.configs[id.index()].pin);
        self.records[id.index()].mode = LedMode::Steady;
    }

    /// Blink the LED, toggling every `period_ticks` ticks.
    ///
    /// A period of zero cannot count down, so it leaves the LED steady at
    /// its current level.
    pub fn set_blink(&mut self, id: LedId, period_ticks: u16) {
        let record = &mut self.records[id.index()];
        if period_ticks == 0 {
            record.mode = LedMode::Steady;
            record.period = 0;
            return;
        }

        record.mode = LedMode::Blink;
        record.period = period_ticks;
        record.countdown = period_ticks;

        #[cfg(feature = "defmt")]
        defmt::debug!("LED {}: blink every {} ticks", id, period_ticks);
    }

    /// Blink at one of the standard rates.
    pub fn set_blink_rate(&mut self, id: LedId, rate: LedRate) {
        self.set_blink(id, rate.ticks());
    }

    pub fn mode(&self, id: LedId) -> LedMode {
        self.records[id.index()].mode
    }

    /// Toggle interval of the last blink request, zero if that request
    /// asked for a zero period.
    pub fn blink_period(&self, id: LedId) -> u16 {
        self.records[id.index()].period
    }

    /// True if the pin is currently at its "on" level.
    pub fn is_on(&self, id: LedId) -> bool {
        let config = &self.configs[id.index()];
        config.polarity.is_active(self.board.read(config.pin))
    }
}

impl<P: PinIo> Task for LedDriver<'_, P> {
    /// All LEDs steady and off.
    fn initialize(&mut self) {
        self.records = [LedRecord::STEADY; LED_COUNT];
        for id in LedId::ALL {
            self.turn_off(id);
        }
    }

    fn run_active_state(&mut self) {
        for (record, config) in self.records.iter_mut().zip(self.configs.iter()) {
            if record.mode != LedMode::Blink {
                continue;
            }
            record.countdown = record.countdown.saturating_sub(1);
            if record.countdown == 0 {
                self.board.toggle(config.pin);
                record.countdown = record.period;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::LED_CONFIGS;
    use crate::hal::{Level, PinConfig, PinId, Polarity, Port};
    use crate::sim::SimBoard;

    fn pin(id: LedId) -> PinId {
        LED_CONFIGS[id.index()].pin
    }

    fn run(leds: &mut LedDriver<'_, SimBoard>, ticks: u32) {
        for _ in 0..ticks {
            leds.run_active_state();
        }
    }

    #[test]
    fn initialize_turns_everything_off() {
        let board = SimBoard::new();
        let mut leds = LedDriver::new(&LED_CONFIGS, &board);
        leds.initialize();
        for id in LedId::ALL {
            assert!(!leds.is_on(id));
            assert_eq!(leds.mode(id), LedMode::Steady);
        }
    }

    #[test]
    fn on_off_toggle_drive_pin() {
        let board = SimBoard::new();
        let mut leds = LedDriver::new(&LED_CONFIGS, &board);
        leds.initialize();

        leds.turn_on(LedId::Red);
        assert_eq!(board.level(pin(LedId::Red)), Level::High);
        assert!(leds.is_on(LedId::Red));

        leds.toggle(LedId::Red);
        assert!(!leds.is_on(LedId::Red));

        leds.toggle(LedId::Red);
        leds.turn_off(LedId::Red);
        assert!(!leds.is_on(LedId::Red));
    }

    #[test]
    fn active_low_led_is_driven_low_for_on() {
        static HEARTBEAT: [PinConfig; LED_COUNT] =
            [PinConfig::new(Port::A, 31, Polarity::ActiveLow); LED_COUNT];
        let board = SimBoard::new();
        let mut leds = LedDriver::new(&HEARTBEAT, &board);

        leds.turn_on(LedId::White);
        assert_eq!(board.level(PinId::new(Port::A, 31)), Level::Low);
        assert!(leds.is_on(LedId::White));

        leds.turn_off(LedId::White);
        assert_eq!(board.level(PinId::new(Port::A, 31)), Level::High);
    }

    #[test]
    fn blink_toggles_every_period() {
        let board = SimBoard::new();
        let mut leds = LedDriver::new(&LED_CONFIGS, &board);
        leds.initialize();
        board.clear_log();

        leds.set_blink(LedId::Blue, 4);
        run(&mut leds, 3);
        assert_eq!(board.toggle_count(pin(LedId::Blue)), 0);
        run(&mut leds, 1);
        assert_eq!(board.toggle_count(pin(LedId::Blue)), 1);
        run(&mut leds, 4);
        assert_eq!(board.toggle_count(pin(LedId::Blue)), 2);
    }

    #[test]
    fn blink_leaves_other_leds_alone() {
        let board = SimBoard::new();
        let mut leds = LedDriver::new(&LED_CONFIGS, &board);
        leds.initialize();
        board.clear_log();

        leds.set_blink_rate(LedId::Green, LedRate::Hz8);
        run(&mut leds, 620);

        assert_eq!(board.toggle_count(pin(LedId::Green)), 10);
        assert!(board
            .events()
            .iter()
            .all(|event| event.pin() == pin(LedId::Green)));
    }

    #[test]
    fn steady_call_cancels_blink() {
        let board = SimBoard::new();
        let mut leds = LedDriver::new(&LED_CONFIGS, &board);
        leds.initialize();

        leds.turn_on(LedId::Cyan);
        leds.set_blink(LedId::Cyan, 3);
        assert_eq!(leds.mode(LedId::Cyan), LedMode::Blink);
        leds.turn_off(LedId::Cyan);
        assert_eq!(leds.mode(LedId::Cyan), LedMode::Steady);

        board.clear_log();
        run(&mut leds, 50);
        assert_eq!(board.toggle_count(pin(LedId::Cyan)), 0);
        assert!(!leds.is_on(LedId::Cyan));
    }

    #[test]
    fn toggle_cancels_blink() {
        let board = SimBoard::new();
        let mut leds = LedDriver::new(&LED_CONFIGS, &board);
        leds.initialize();

        leds.set_blink(LedId::Orange, 2);
        leds.toggle(LedId::Orange);
        assert_eq!(leds.mode(LedId::Orange), LedMode::Steady);
        assert!(leds.is_on(LedId::Orange));
    }

    #[test]
    fn zero_period_stays_steady() {
        let board = SimBoard::new();
        let mut leds = LedDriver::new(&LED_CONFIGS, &board);
        leds.initialize();
        leds.turn_on(LedId::Yellow);
        board.clear_log();

        leds.set_blink(LedId::Yellow, 0);
        run(&mut leds, 10);

        assert_eq!(leds.mode(LedId::Yellow), LedMode::Steady);
        assert!(board.events().is_empty());
        assert!(leds.is_on(LedId::Yellow));
    }

    #[test]
    fn zero_period_clears_previous_blink_interval() {
        let board = SimBoard::new();
        let mut leds = LedDriver::new(&LED_CONFIGS, &board);
        leds.initialize();

        leds.set_blink(LedId::Green, 4);
        assert_eq!(leds.blink_period(LedId::Green), 4);

        leds.set_blink(LedId::Green, 0);
        assert_eq!(leds.mode(LedId::Green), LedMode::Steady);
        assert_eq!(leds.blink_period(LedId::Green), 0);
    }

    #[test]
    fn rates_are_toggle_intervals() {
        assert_eq!(LedRate::Hz1.ticks(), 500);
        assert_eq!(LedRate::Hz4.ticks(), 125);
        assert_eq!(LedRate::Hz0_5.ticks(), 1000);
    }
}
