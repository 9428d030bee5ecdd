//! Cooperative runtime core for the EiE development board.
//!
//! A 1 ms tick clock, a debounced button driver fed by port edge
//! interrupts, an LED driver with a tick-driven blink engine, a timer
//! channel manager with compare-match callbacks, and the cooperative
//! scheduler that services them once per tick.
//!
//! Everything here is `no_std` and talks to hardware only through the
//! traits in [`hal`], so the same code runs on the SAM3U2 (see
//! `main.rs`, built with `--features embedded`) and on the host against
//! [`sim::SimBoard`].
//!
//! Usage: `cargo test` runs every unit and integration test on the host.

#![cfg_attr(not(test), no_std)]

pub mod app;
pub mod board;
pub mod buttons;
pub mod config;
pub mod error;
pub mod firmware;
pub mod hal;
pub mod leds;
pub mod scheduler;
pub mod sim;
pub mod tick;
pub mod timer;

pub use board::{ButtonId, LedId};
pub use buttons::{ButtonDriver, ButtonState, DebounceArm, ScanState};
pub use error::Error;
pub use firmware::Firmware;
pub use leds::{LedDriver, LedMode, LedRate};
pub use scheduler::{Scheduler, Sleep, SystemFlags, Task};
pub use tick::TickClock;
pub use timer::{TimerCallback, TimerChannel, TimerChannels, TimerManager};
