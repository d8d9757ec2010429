//! Sound CPU peripherals.
//!
//! The YM2151 and C140 are opaque here: their registers are stored so the
//! 6809 program sees consistent read-back, but nothing is synthesised.

use log::debug;

use crate::memory::SharedRegion;

/// Start of the banked program area in the sound ROM image.
const BANK_BASE: usize = 0x1_0000;
const BANK_BYTES: usize = 0x4000;
pub const C140_REGISTERS: usize = 0x200;
/// YM2151 status port. The chip is never busy.
pub const YM2151_STATUS: u8 = 0;

#[derive(Debug, Clone)]
pub struct SoundPorts {
    bank: u8,
    ym_address: u8,
    ym_registers: [u8; 256],
    c140: [u8; C140_REGISTERS],
}

impl Default for SoundPorts {
    fn default() -> Self {
        Self::new()
    }
}

impl SoundPorts {
    #[must_use]
    pub fn new() -> Self {
        Self {
            bank: 0,
            ym_address: 0,
            ym_registers: [0; 256],
            c140: [0; C140_REGISTERS],
        }
    }

    #[must_use]
    pub fn bank(&self) -> u8 {
        self.bank
    }

    /// Bank select: D7-D4 pick a 16 KiB bank.
    pub fn select_bank(&mut self, data: u8) {
        let bank = (data >> 4) & 0x0F;
        if bank != self.bank {
            debug!("sound bank {} -> {bank}", self.bank);
            self.bank = bank;
        }
    }

    /// Byte from the banked window at 0x0000-0x3FFF.
    #[must_use]
    pub fn read_banked(&self, program: &SharedRegion, offset: u32) -> u8 {
        let address = BANK_BASE + usize::from(self.bank) * BANK_BYTES + ((offset as usize) & (BANK_BYTES - 1));
        program.read_byte(address as u32)
    }

    pub fn ym2151_write(&mut self, offset: u32, value: u8) {
        if (offset & 1) == 0 {
            self.ym_address = value;
        } else {
            self.ym_registers[usize::from(self.ym_address)] = value;
        }
    }

    #[must_use]
    pub fn ym2151_register(&self, index: u8) -> u8 {
        self.ym_registers[usize::from(index)]
    }

    #[must_use]
    pub fn c140_read(&self, offset: u32) -> u8 {
        self.c140[offset as usize & (C140_REGISTERS - 1)]
    }

    pub fn c140_write(&mut self, offset: u32, value: u8) {
        self.c140[offset as usize & (C140_REGISTERS - 1)] = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bank_comes_from_upper_nibble() {
        let mut image = vec![0; BANK_BASE + 4 * BANK_BYTES];
        image[BANK_BASE + 3 * BANK_BYTES + 0x10] = 0x5A;
        let program = SharedRegion::new("sound program", image);
        let mut ports = SoundPorts::new();
        ports.select_bank(0x3F);
        assert_eq!(ports.bank(), 3);
        assert_eq!(ports.read_banked(&program, 0x10), 0x5A);
    }

    #[test]
    fn ym2151_latches_address_then_data() {
        let mut ports = SoundPorts::new();
        ports.ym2151_write(0, 0x28);
        ports.ym2151_write(1, 0x4A);
        assert_eq!(ports.ym2151_register(0x28), 0x4A);
    }

    #[test]
    fn c140_registers_mirror() {
        let mut ports = SoundPorts::new();
        ports.c140_write(0x1FF, 7);
        assert_eq!(ports.c140_read(0x3FF), 7);
    }
}
