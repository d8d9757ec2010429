//! Core traits and types shared by the System 2 chip and machine crates.
//!
//! Timing derives from the board's master crystal. CPU cores are external;
//! they plug in through the narrow [`Cpu`] contract and see memory only
//! through a [`Bus`].

mod bus;
mod clock;
mod cpu;
mod observable;
mod ticks;

pub use bus::{Bus, OPEN_BUS_BYTE, OPEN_BUS_WORD};
pub use clock::MasterClock;
pub use cpu::Cpu;
pub use observable::{Observable, Value};
pub use ticks::Ticks;
