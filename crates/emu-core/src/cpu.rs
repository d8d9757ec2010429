//! CPU execution contract.

use crate::Bus;

/// A CPU core driven in slices by a cooperative scheduler.
///
/// Cores are consumed, not implemented, by the machine crates. The bus is
/// passed in for the duration of a slice so several processors can share
/// the same backing memory without locks: only one of them runs at a time.
///
/// The trait is object-safe; a machine stores its processors as
/// `Box<dyn Cpu>` and wires each one to its own bus view.
pub trait Cpu {
    /// Run for up to `cycles` clock cycles of this CPU.
    ///
    /// Returns the cycles actually consumed. A core returns early when
    /// [`Bus::yield_requested`] becomes true, and may overshoot the budget
    /// by the tail of its last instruction.
    fn execute(&mut self, bus: &mut dyn Bus, cycles: u32) -> u32;

    /// Drive an interrupt input.
    ///
    /// For 68000 cores `line` is an IPL level (1-7). For 8-bit cores it is
    /// the core's own line number (IRQ, FIRQ, NMI...).
    fn set_interrupt_line(&mut self, line: u8, asserted: bool);

    /// Drive the RESET input. Releasing it restarts the core from its
    /// reset vector.
    fn set_reset_line(&mut self, asserted: bool);

    /// Current program counter, zero-extended to 32 bits.
    fn pc(&self) -> u32;
}
