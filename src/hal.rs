//! Hardware capability boundary.
//!
//! The drivers never touch registers directly. They talk to the board
//! through these traits, which model single-register operations on a
//! PIO controller or timer block. Every method takes `&self` so one board
//! handle can be shared between the interrupt and main contexts, the same
//! way a register block is.

/// PIO controller a pin belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Port {
    A = 0,
    B = 1,
}

impl Port {
    /// Number of PIO controllers on the board.
    pub const COUNT: usize = 2;

    pub const ALL: [Port; Self::COUNT] = [Port::A, Port::B];

    pub const fn index(self) -> usize {
        self as usize
    }
}

/// One physical pin: a single-bit mask within a port.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinId {
    pub port: Port,
    pub mask: u32,
}

impl PinId {
    /// Pin `bit` (0..=31) of `port`.
    pub const fn new(port: Port, bit: u8) -> Self {
        Self {
            port,
            mask: 1 << bit,
        }
    }

    /// Bit position of the pin within its port.
    pub const fn bit(self) -> u32 {
        self.mask.trailing_zeros()
    }
}

/// Electrical level of a pin.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Level {
    Low,
    High,
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }
}

/// Which level means "on" / "pressed".
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Polarity {
    ActiveHigh,
    ActiveLow,
}

impl Polarity {
    /// True if `level` is the active level for this polarity.
    pub fn is_active(self, level: Level) -> bool {
        matches!(
            (self, level),
            (Polarity::ActiveHigh, Level::High) | (Polarity::ActiveLow, Level::Low)
        )
    }

    /// Level that represents `active` for this polarity.
    pub fn level_for(self, active: bool) -> Level {
        match self {
            Polarity::ActiveHigh => Level::from(active),
            Polarity::ActiveLow => Level::from(!active),
        }
    }
}

/// Static wiring of one logical LED or button.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinConfig {
    pub pin: PinId,
    pub polarity: Polarity,
}

impl PinConfig {
    pub const fn new(port: Port, bit: u8, polarity: Polarity) -> Self {
        Self {
            pin: PinId::new(port, bit),
            polarity,
        }
    }
}

/// Atomic single-register GPIO operations.
pub trait PinIo {
    /// Drive the pin high.
    fn set(&self, pin: PinId);
    /// Drive the pin low.
    fn clear(&self, pin: PinId);
    /// Invert the driven level.
    fn toggle(&self, pin: PinId);
    /// Sample the pin.
    fn read(&self, pin: PinId) -> Level;

    /// Drive the pin to `level`.
    fn write(&self, pin: PinId, level: Level) {
        match level {
            Level::High => self.set(pin),
            Level::Low => self.clear(pin),
        }
    }
}

/// Edge-interrupt line control.
///
/// `enable` and `disable` touch exactly the bit named by the pin; other
/// lines sharing the port's enable register are left alone.
pub trait EdgeInterrupts {
    fn enable(&self, pin: PinId);
    fn disable(&self, pin: PinId);
    /// Clear the port's request at the interrupt controller. Edges latched
    /// in the port's status register are left for the next handler pass.
    fn clear_pending(&self, port: Port);
    /// Discard every edge latched in the port's status register. Only
    /// called before the lines are enabled.
    fn discard_edges(&self, port: Port);
}

/// One hardware timer/counter block with compare-match interrupts.
///
/// Channels are addressed by index so implementations can keep a fixed
/// table of register-block handles.
pub trait TimerHardware {
    /// Load the compare (period) register.
    fn load_compare(&self, channel: usize, ticks: u16);
    /// Enable the counter clock and reset the count to zero.
    fn start_counter(&self, channel: usize);
    /// Disable the counter clock.
    fn stop_counter(&self, channel: usize);
    /// Current counter value (ticks since the last trigger).
    fn counter(&self, channel: usize) -> u16;
    /// Unmask the compare-match interrupt for the channel.
    fn enable_compare_interrupt(&self, channel: usize);
}
