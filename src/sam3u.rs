//! SAM3U2 register-level board support.
//!
//! Implements the capability traits on the PIOA/PIOB controllers and the
//! TC0 timer block. Every trait method is a single register write (or a
//! read followed by a write for toggle), matching the `&self` contract of
//! the traits.

use core::ptr::{read_volatile, write_volatile};

use cortex_m::interrupt::InterruptNumber;
use cortex_m::peripheral::NVIC;

use eief1_runtime::board::{BUTTON_CONFIGS, LED_CONFIGS};
use eief1_runtime::hal::{EdgeInterrupts, Level, PinId, PinIo, Port, TimerHardware};
use eief1_runtime::timer::TIMER_CHANNEL_COUNT;

// Power management controller
const PMC_BASE: usize = 0x400E_0400;
const PMC_PCER0: usize = PMC_BASE + 0x10;

// PIO controllers
const PIOA_BASE: usize = 0x400E_0C00;
const PIOB_BASE: usize = 0x400E_0E00;

const PIO_PER: usize = 0x00;
const PIO_OER: usize = 0x10;
const PIO_ODR: usize = 0x14;
const PIO_IFER: usize = 0x20;
const PIO_SODR: usize = 0x30;
const PIO_CODR: usize = 0x34;
const PIO_ODSR: usize = 0x38;
const PIO_PDSR: usize = 0x3C;
const PIO_IER: usize = 0x40;
const PIO_IDR: usize = 0x44;
const PIO_IMR: usize = 0x48;
const PIO_ISR: usize = 0x4C;
const PIO_PUER: usize = 0x64;

// Timer counter block 0
const TC0_BASE: usize = 0x4008_0000;
const TC_CHANNEL_STRIDE: usize = 0x40;

const TC_CCR: usize = 0x00;
const TC_CMR: usize = 0x04;
const TC_CV: usize = 0x10;
const TC_RC: usize = 0x1C;
const TC_SR: usize = 0x20;
const TC_IER: usize = 0x24;

const TC_CCR_CLKEN: u32 = 1 << 0;
const TC_CCR_CLKDIS: u32 = 1 << 1;
const TC_CCR_SWTRG: u32 = 1 << 2;
/// TIMER_CLOCK4 (MCK/128), counter reset on RC compare.
const TC_CMR_DEMO: u32 = 3 | (1 << 14);
const TC_SR_CPCS: u32 = 1 << 4;

/// Peripheral interrupt lines used by the firmware. The discriminant is
/// both the NVIC number and the PMC peripheral id.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u16)]
pub enum Irq {
    PioA = 10,
    PioB = 11,
    Tc0 = 22,
    Tc1 = 23,
    Tc2 = 24,
}

impl Irq {
    pub const ALL: [Irq; 5] = [Irq::PioA, Irq::PioB, Irq::Tc0, Irq::Tc1, Irq::Tc2];

    /// Interrupt line of a `DefaultHandler` exception number.
    pub fn from_number(irqn: i16) -> Option<Self> {
        Self::ALL.into_iter().find(|irq| *irq as i16 == irqn)
    }
}

// SAFETY: every discriminant is a valid SAM3U2 interrupt number.
unsafe impl InterruptNumber for Irq {
    fn number(self) -> u16 {
        self as u16
    }
}

/// Handle to the board's PIO and timer registers.
pub struct Sam3u {
    _private: (),
}

impl Sam3u {
    pub const fn new() -> Self {
        Self { _private: () }
    }

    /// Clock the peripherals and configure every LED as an output and every
    /// button as a filtered, pulled-up input. Interrupts stay masked until
    /// the button driver initializes.
    pub fn init(&self) {
        let mut clocks = 0;
        for irq in Irq::ALL {
            clocks |= 1 << (irq as u32);
        }
        write(PMC_PCER0, clocks);

        for config in &LED_CONFIGS {
            let base = pio_base(config.pin.port);
            write(base + PIO_PER, config.pin.mask);
            write(base + PIO_OER, config.pin.mask);
        }
        for config in &BUTTON_CONFIGS {
            let base = pio_base(config.pin.port);
            write(base + PIO_PER, config.pin.mask);
            write(base + PIO_ODR, config.pin.mask);
            write(base + PIO_IFER, config.pin.mask);
            write(base + PIO_PUER, config.pin.mask);
            write(base + PIO_IDR, config.pin.mask);
        }
        for channel in 0..TIMER_CHANNEL_COUNT {
            write(tc_base(channel) + TC_CMR, TC_CMR_DEMO);
        }
    }

    /// Read and clear the port's interrupt status, keeping only lines that
    /// are currently unmasked.
    pub fn take_status(&self, port: Port) -> u32 {
        let base = pio_base(port);
        read(base + PIO_ISR) & read(base + PIO_IMR)
    }

    /// Read and clear the channel status. True on an RC compare match.
    pub fn take_compare(&self, channel: usize) -> bool {
        read(tc_base(channel) + TC_SR) & TC_SR_CPCS != 0
    }
}

impl PinIo for Sam3u {
    fn set(&self, pin: PinId) {
        write(pio_base(pin.port) + PIO_SODR, pin.mask);
    }

    fn clear(&self, pin: PinId) {
        write(pio_base(pin.port) + PIO_CODR, pin.mask);
    }

    fn toggle(&self, pin: PinId) {
        let base = pio_base(pin.port);
        if read(base + PIO_ODSR) & pin.mask != 0 {
            write(base + PIO_CODR, pin.mask);
        } else {
            write(base + PIO_SODR, pin.mask);
        }
    }

    fn read(&self, pin: PinId) -> Level {
        Level::from(read(pio_base(pin.port) + PIO_PDSR) & pin.mask != 0)
    }
}

impl EdgeInterrupts for Sam3u {
    fn enable(&self, pin: PinId) {
        write(pio_base(pin.port) + PIO_IER, pin.mask);
    }

    fn disable(&self, pin: PinId) {
        write(pio_base(pin.port) + PIO_IDR, pin.mask);
    }

    fn clear_pending(&self, port: Port) {
        NVIC::unpend(port_irq(port));
    }

    fn discard_edges(&self, port: Port) {
        // PIO_ISR clears on read.
        let _ = read(pio_base(port) + PIO_ISR);
    }
}

impl TimerHardware for Sam3u {
    fn load_compare(&self, channel: usize, ticks: u16) {
        write(tc_base(channel) + TC_RC, u32::from(ticks));
    }

    fn start_counter(&self, channel: usize) {
        write(tc_base(channel) + TC_CCR, TC_CCR_CLKEN | TC_CCR_SWTRG);
    }

    fn stop_counter(&self, channel: usize) {
        write(tc_base(channel) + TC_CCR, TC_CCR_CLKDIS);
    }

    fn counter(&self, channel: usize) -> u16 {
        read(tc_base(channel) + TC_CV) as u16
    }

    fn enable_compare_interrupt(&self, channel: usize) {
        write(tc_base(channel) + TC_IER, TC_SR_CPCS);
    }
}

fn pio_base(port: Port) -> usize {
    match port {
        Port::A => PIOA_BASE,
        Port::B => PIOB_BASE,
    }
}

fn port_irq(port: Port) -> Irq {
    match port {
        Port::A => Irq::PioA,
        Port::B => Irq::PioB,
    }
}

fn tc_base(channel: usize) -> usize {
    TC0_BASE + channel * TC_CHANNEL_STRIDE
}

fn read(address: usize) -> u32 {
    // SAFETY: callers only pass addresses inside the PMC, PIO and TC
    // register blocks, all of which are word-aligned MMIO.
    unsafe { read_volatile(address as *const u32) }
}

fn write(address: usize, value: u32) {
    // SAFETY: as for `read`.
    unsafe { write_volatile(address as *mut u32, value) }
}
