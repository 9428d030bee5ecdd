//! Board support tables for the EiE "eief1-pcb-01" board.
//!
//! Logical identities and their wiring. The order of each table must
//! match the discriminants of the corresponding identity enum.
//!
//!   BUTTON0 → PA17   BUTTON1 → PB0   BUTTON2 → PB1   BUTTON3 → PB2
//!   WHITE   → PB13   PURPLE  → PB14  BLUE    → PB18  CYAN    → PB16
//!   GREEN   → PB19   YELLOW  → PB17  ORANGE  → PB15  RED     → PB20
//!   LCD backlight R/G/B → PB10 / PB11 / PB12

use crate::error::Error;
use crate::hal::{PinConfig, Polarity, Port};

/// Number of buttons wired on the board.
pub const BUTTON_COUNT: usize = 4;

/// Number of LEDs (discrete + backlight channels).
pub const LED_COUNT: usize = 11;

/// Logical buttons.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonId {
    Button0 = 0,
    Button1,
    Button2,
    Button3,
}

impl ButtonId {
    pub const ALL: [ButtonId; BUTTON_COUNT] = [
        ButtonId::Button0,
        ButtonId::Button1,
        ButtonId::Button2,
        ButtonId::Button3,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }
}

impl TryFrom<u8> for ButtonId {
    type Error = Error;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .get(raw as usize)
            .copied()
            .ok_or(Error::UnknownButton(raw))
    }
}

/// Logical LEDs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LedId {
    White = 0,
    Purple,
    Blue,
    Cyan,
    Green,
    Yellow,
    Orange,
    Red,
    LcdRed,
    LcdGreen,
    LcdBlue,
}

impl LedId {
    pub const ALL: [LedId; LED_COUNT] = [
        LedId::White,
        LedId::Purple,
        LedId::Blue,
        LedId::Cyan,
        LedId::Green,
        LedId::Yellow,
        LedId::Orange,
        LedId::Red,
        LedId::LcdRed,
        LedId::LcdGreen,
        LedId::LcdBlue,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }
}

impl TryFrom<u8> for LedId {
    type Error = Error;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .get(raw as usize)
            .copied()
            .ok_or(Error::UnknownLed(raw))
    }
}

/// Button wiring, indexed by `ButtonId`.
pub static BUTTON_CONFIGS: [PinConfig; BUTTON_COUNT] = [
    PinConfig::new(Port::A, 17, Polarity::ActiveLow),
    PinConfig::new(Port::B, 0, Polarity::ActiveLow),
    PinConfig::new(Port::B, 1, Polarity::ActiveLow),
    PinConfig::new(Port::B, 2, Polarity::ActiveLow),
];

/// LED wiring, indexed by `LedId`.
pub static LED_CONFIGS: [PinConfig; LED_COUNT] = [
    PinConfig::new(Port::B, 13, Polarity::ActiveHigh),
    PinConfig::new(Port::B, 14, Polarity::ActiveHigh),
    PinConfig::new(Port::B, 18, Polarity::ActiveHigh),
    PinConfig::new(Port::B, 16, Polarity::ActiveHigh),
    PinConfig::new(Port::B, 19, Polarity::ActiveHigh),
    PinConfig::new(Port::B, 17, Polarity::ActiveHigh),
    PinConfig::new(Port::B, 15, Polarity::ActiveHigh),
    PinConfig::new(Port::B, 20, Polarity::ActiveHigh),
    PinConfig::new(Port::B, 10, Polarity::ActiveHigh),
    PinConfig::new(Port::B, 11, Polarity::ActiveHigh),
    PinConfig::new(Port::B, 12, Polarity::ActiveHigh),
];
