//! Namco System 2 arcade board.
//!
//! Four processors share one board: two 68000s (master and slave), a 6809
//! for sound and an HD63705 for cabinet I/O. Each has its own address map
//! over a common store of RAM regions; the dual-port RAM is visible to all
//! four. Two C148 controllers encode interrupts for the 68000s and the
//! master's C148 holds the other processors in reset until its program
//! releases them.
//!
//! Execution is cooperative: a frame is cut into slices and each processor
//! runs its share of every slice in a fixed order. The CPU cores themselves
//! are supplied by the caller through [`emu_core::Cpu`].
//!
//! Error handling is local. Unmapped accesses are open bus, out-of-range
//! indices wrap, missing graphics draw nothing and a watchdog timeout resets
//! the machine. Only construction and EEPROM persistence return errors.

pub mod address_map;
mod board;
pub mod bus;
#[cfg(feature = "native")]
pub mod capture;
mod config;
mod eeprom;
mod error;
mod io;
mod memory;
mod scheduler;
mod sound;
mod system2;

pub use bus::CpuBus;
pub use config::{
    BoardProfile, BoardSettings, BoardVariant, DEFAULT_SLICES_PER_FRAME, FRAME_RATE,
    MASTER_CLOCK_HZ, Processor, RomSet, RozWindow, System2Config, Window,
};
pub use eeprom::EEPROM_BYTES;
pub use error::System2Error;
pub use io::{InputPorts, McuInput, McuIo, SerialControl};
pub use memory::{DUAL_PORT_BYTES, RegionId, SharedRegion, SharedRegions};
pub use scheduler::{CpuSet, SCANLINES_PER_FRAME, Scheduler, SliceOutcome};
pub use sound::SoundPorts;
pub use system2::System2;
