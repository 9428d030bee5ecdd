//! Cooperative tick scheduler.
//!
//! A fixed table of tasks is serviced once per tick, in insertion order,
//! from the main loop. Between passes the loop idles until the tick
//! interrupt advances the clock, so every task observes the time of the
//! current tick. Tasks are never re-entered and never skipped; if a pass
//! runs long enough that a tick is missed, the next pass still runs once
//! and the miss is counted as an overrun.
//!
//! The shipped firmware registers a single task,
//! [`Firmware`](crate::firmware::Firmware), which fixes the order of the
//! drivers and the application inside its own pass; the application
//! borrows the drivers, so they cannot also be entries of this table.
//! Further independent tasks are added after it.

use core::sync::atomic::{AtomicU32, Ordering};

use heapless::Vec;

use crate::config::{MAX_TASKS, TICK_PERIOD_MS};
use crate::error::Error;
use crate::tick::TickClock;

/// One driver or application serviced by the scheduler.
pub trait Task {
    /// Reset to defaults and enable the task's interrupts. Called once.
    fn initialize(&mut self);

    /// One bounded slice of work. Called once per tick.
    fn run_active_state(&mut self);
}

/// Process-wide status bits shared with the interrupt handlers.
pub struct SystemFlags(AtomicU32);

impl SystemFlags {
    /// Main loop is idling for the next tick. Cleared by the tick handler.
    pub const SLEEPING: u32 = 1 << 0;
    /// Every task has been initialized.
    pub const INIT_COMPLETE: u32 = 1 << 1;

    pub const fn new() -> Self {
        Self(AtomicU32::new(0))
    }

    pub fn set(&self, bits: u32) {
        self.0.fetch_or(bits, Ordering::AcqRel);
    }

    pub fn clear(&self, bits: u32) {
        self.0.fetch_and(!bits, Ordering::AcqRel);
    }

    pub fn contains(&self, bits: u32) -> bool {
        self.0.load(Ordering::Acquire) & bits == bits
    }
}

impl Default for SystemFlags {
    fn default() -> Self {
        Self::new()
    }
}

/// Low-power wait used between passes.
pub trait Sleep {
    /// Block until the next interrupt.
    fn idle(&mut self);
}

/// Fixed-order, once-per-tick task runner.
pub struct Scheduler<'a, S> {
    clock: &'a TickClock,
    flags: &'a SystemFlags,
    sleeper: S,
    tasks: Vec<&'a mut dyn Task, MAX_TASKS>,
    last_tick: u32,
    overruns: u32,
}

impl<'a, S: Sleep> Scheduler<'a, S> {
    pub fn new(clock: &'a TickClock, flags: &'a SystemFlags, sleeper: S) -> Self {
        Self {
            clock,
            flags,
            sleeper,
            tasks: Vec::new(),
            last_tick: clock.now_millis(),
            overruns: 0,
        }
    }

    /// Append a task. Tasks run in the order they were added.
    pub fn add(&mut self, task: &'a mut dyn Task) -> Result<(), Error> {
        self.tasks.push(task).map_err(|_| Error::SchedulerFull)
    }

    /// Initialize every task, in order.
    pub fn initialize(&mut self) {
        for task in self.tasks.iter_mut() {
            task.initialize();
        }
        self.last_tick = self.clock.now_millis();
        self.flags.set(SystemFlags::INIT_COMPLETE);

        #[cfg(feature = "defmt")]
        defmt::info!("Scheduler: {} tasks initialized", self.tasks.len());
    }

    /// Run every task once for the current tick.
    pub fn run_tick(&mut self) {
        let now = self.clock.now_millis();
        if now.wrapping_sub(self.last_tick) > TICK_PERIOD_MS {
            self.overruns = self.overruns.wrapping_add(1);

            #[cfg(feature = "defmt")]
            defmt::warn!("Scheduler: overrun, {} ms since last pass", now.wrapping_sub(self.last_tick));
        }
        self.last_tick = now;

        for task in self.tasks.iter_mut() {
            task.run_active_state();
        }
    }

    /// Idle until the tick after the last pass, then run one pass.
    pub fn step(&mut self) {
        self.flags.set(SystemFlags::SLEEPING);
        while self.clock.now_millis() == self.last_tick {
            self.sleeper.idle();
        }
        self.flags.clear(SystemFlags::SLEEPING);
        self.run_tick();
    }

    /// Main loop.
    pub fn run(&mut self) -> ! {
        loop {
            self.step();
        }
    }

    /// Passes that started more than one tick after the previous one.
    pub fn overruns(&self) -> u32 {
        self.overruns
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimTicker;
    use core::cell::RefCell;

    struct Recorder<'r> {
        id: u8,
        clock: &'r TickClock,
        log: &'r RefCell<Vec<(u8, u32), 64>>,
        initialized: bool,
    }

    impl<'r> Recorder<'r> {
        fn new(id: u8, clock: &'r TickClock, log: &'r RefCell<Vec<(u8, u32), 64>>) -> Self {
            Self {
                id,
                clock,
                log,
                initialized: false,
            }
        }
    }

    impl Task for Recorder<'_> {
        fn initialize(&mut self) {
            self.initialized = true;
        }

        fn run_active_state(&mut self) {
            assert!(self.initialized);
            let _ = self.log.borrow_mut().push((self.id, self.clock.now_millis()));
        }
    }

    #[test]
    fn tasks_run_once_per_tick_in_order() {
        let clock = TickClock::new();
        let flags = SystemFlags::new();
        let log = RefCell::new(Vec::new());
        let mut first = Recorder::new(1, &clock, &log);
        let mut second = Recorder::new(2, &clock, &log);
        let mut third = Recorder::new(3, &clock, &log);

        let mut scheduler = Scheduler::new(&clock, &flags, SimTicker::new(&clock));
        scheduler.add(&mut first).unwrap();
        scheduler.add(&mut second).unwrap();
        scheduler.add(&mut third).unwrap();
        scheduler.initialize();
        assert!(flags.contains(SystemFlags::INIT_COMPLETE));

        scheduler.step();
        scheduler.step();

        assert_eq!(
            log.borrow().as_slice(),
            &[(1, 1), (2, 1), (3, 1), (1, 2), (2, 2), (3, 2)]
        );
        assert!(!flags.contains(SystemFlags::SLEEPING));
        assert_eq!(scheduler.overruns(), 0);
    }

    #[test]
    fn missed_tick_counts_as_overrun() {
        let clock = TickClock::new();
        let flags = SystemFlags::new();
        let log = RefCell::new(Vec::new());
        let mut task = Recorder::new(7, &clock, &log);

        let mut scheduler = Scheduler::new(&clock, &flags, SimTicker::new(&clock));
        scheduler.add(&mut task).unwrap();
        scheduler.initialize();

        scheduler.step();
        clock.tick();
        clock.tick();
        scheduler.step();

        assert_eq!(scheduler.overruns(), 1);
        assert_eq!(log.borrow().as_slice(), &[(7, 1), (7, 3)]);
    }

    #[test]
    fn table_has_fixed_capacity() {
        let clock = TickClock::new();
        let flags = SystemFlags::new();
        let log = RefCell::new(Vec::new());
        let mut tasks: [Recorder<'_>; MAX_TASKS + 1] =
            core::array::from_fn(|i| Recorder::new(i as u8, &clock, &log));

        let mut scheduler = Scheduler::new(&clock, &flags, SimTicker::new(&clock));
        let (last, rest) = tasks.split_last_mut().unwrap();
        for task in rest.iter_mut() {
            assert_eq!(scheduler.add(task), Ok(()));
        }
        assert_eq!(scheduler.add(last), Err(Error::SchedulerFull));
        assert_eq!(scheduler.task_count(), MAX_TASKS);
    }

    #[test]
    fn flags_set_and_clear_independently() {
        let flags = SystemFlags::new();
        flags.set(SystemFlags::SLEEPING | SystemFlags::INIT_COMPLETE);
        flags.clear(SystemFlags::SLEEPING);
        assert!(!flags.contains(SystemFlags::SLEEPING));
        assert!(flags.contains(SystemFlags::INIT_COMPLETE));
    }
}
