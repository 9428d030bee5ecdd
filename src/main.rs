//! eief1-runtime - firmware entry point for the EiE SAM3U2 board.
//!
//! SysTick drives the 1 ms tick. PIOA/PIOB edge interrupts arm the button
//! debouncer, and TC0 compare matches run the timer callbacks. Everything
//! else happens in the cooperative scheduler loop, which sleeps with
//! `wfi` between ticks.

#![no_std]
#![no_main]

mod sam3u;

use cortex_m::peripheral::syst::SystClkSource;
use cortex_m::peripheral::NVIC;
use cortex_m_rt::{entry, exception};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use eief1_runtime::board::BUTTON_CONFIGS;
use eief1_runtime::config::SYSTICK_RELOAD;
use eief1_runtime::hal::Port;
use eief1_runtime::{
    DebounceArm, Firmware, Scheduler, Sleep, SystemFlags, TickClock, TimerChannel, TimerChannels,
};

use sam3u::{Irq, Sam3u};

// Shared between the scheduler loop and the interrupt handlers.
static CLOCK: TickClock = TickClock::new();
static FLAGS: SystemFlags = SystemFlags::new();
static BUTTONS: DebounceArm = DebounceArm::new(&BUTTON_CONFIGS);
static TIMERS: TimerChannels = TimerChannels::new();
static BOARD: Sam3u = Sam3u::new();

static FIRMWARE: StaticCell<Firmware<'static, Sam3u>> = StaticCell::new();

/// Sleep until the next interrupt.
struct Wfi;

impl Sleep for Wfi {
    fn idle(&mut self) {
        cortex_m::asm::wfi();
    }
}

#[entry]
fn main() -> ! {
    let Some(mut core) = cortex_m::Peripherals::take() else {
        defmt::panic!("core peripherals already taken");
    };

    defmt::info!("eief1-runtime v{}", env!("CARGO_PKG_VERSION"));

    BOARD.init();

    let firmware = FIRMWARE.init(Firmware::new(&BOARD, &CLOCK, &BUTTONS, &TIMERS));
    let mut scheduler = Scheduler::new(&CLOCK, &FLAGS, Wfi);
    if let Err(e) = scheduler.add(firmware) {
        defmt::panic!("task registration failed: {}", e);
    }
    scheduler.initialize();

    core.SYST.set_clock_source(SystClkSource::Core);
    core.SYST.set_reload(SYSTICK_RELOAD);
    core.SYST.clear_current();
    core.SYST.enable_interrupt();
    core.SYST.enable_counter();

    for irq in Irq::ALL {
        // SAFETY: every handler only touches the lock-free shared statics.
        unsafe { NVIC::unmask(irq) };
    }

    defmt::info!("Scheduler running");
    scheduler.run()
}

#[exception]
fn SysTick() {
    CLOCK.tick();
    FLAGS.clear(SystemFlags::SLEEPING);
}

#[exception]
unsafe fn DefaultHandler(irqn: i16) {
    match Irq::from_number(irqn) {
        Some(Irq::PioA) => port_interrupt(Port::A),
        Some(Irq::PioB) => port_interrupt(Port::B),
        Some(Irq::Tc0) => compare_interrupt(TimerChannel::Tc0),
        Some(Irq::Tc1) => compare_interrupt(TimerChannel::Tc1),
        Some(Irq::Tc2) => compare_interrupt(TimerChannel::Tc2),
        None => {}
    }
}

fn port_interrupt(port: Port) {
    let status = BOARD.take_status(port);
    BUTTONS.on_port_interrupt(port, status, &CLOCK, &BOARD);
}

fn compare_interrupt(channel: TimerChannel) {
    if BOARD.take_compare(channel.index()) {
        TIMERS.on_compare_match(channel);
    }
}
