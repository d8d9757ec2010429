//! Memory and I/O bus interface.

/// Value returned for byte reads that hit no mapped device.
pub const OPEN_BUS_BYTE: u8 = 0xFF;

/// Value returned for word reads that hit no mapped device.
pub const OPEN_BUS_WORD: u16 = 0xFFFF;

/// Memory and I/O bus interface.
///
/// A CPU core sees its processor's address space through this trait. The
/// implementation decodes the address and routes the access to memory or a
/// device; unmapped addresses read as open bus and discard writes.
///
/// Addresses are `u32` so one trait serves the 68000's 24-bit space and the
/// 16-bit spaces of the 6809 and 63705. Word accesses are big-endian.
pub trait Bus {
    /// Read a byte from the given address.
    fn read_byte(&mut self, address: u32) -> u8;

    /// Write a byte to the given address.
    fn write_byte(&mut self, address: u32, value: u8);

    /// Read a big-endian word. The address is forced even.
    fn read_word(&mut self, address: u32) -> u16 {
        let address = address & !1;
        let hi = self.read_byte(address);
        let lo = self.read_byte(address.wrapping_add(1));
        u16::from_be_bytes([hi, lo])
    }

    /// Write a big-endian word. The address is forced even.
    fn write_word(&mut self, address: u32, value: u16) {
        let address = address & !1;
        let [hi, lo] = value.to_be_bytes();
        self.write_byte(address, hi);
        self.write_byte(address.wrapping_add(1), lo);
    }

    /// Current encoded interrupt priority level on the IPL pins.
    ///
    /// 68000 cores poll this between instructions, the same way they poll
    /// IPL0-IPL2 on real hardware. Buses without an encoder report 0.
    fn interrupt_level(&self) -> u8 {
        0
    }

    /// True once a device has asked the running CPU to give up the rest of
    /// its slice. Cores stop at the next instruction boundary when set.
    fn yield_requested(&self) -> bool {
        false
    }
}
