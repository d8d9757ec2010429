//! Per-processor view of the board, implementing `emu_core::Bus`.
//!
//! The 68000s see a 16-bit bus: word accesses go straight to the word
//! registers, byte writes to a word register merge with its current
//! contents (big-endian, even address = high byte). The 6809 and the MCU
//! see 8-bit ports. Unmapped addresses are open bus and never fail.

use emu_core::{Bus, OPEN_BUS_BYTE, OPEN_BUS_WORD};
use log::trace;
use namco_c148::{C148Action, InterruptSource};

use crate::address_map::{Access, Port, Target};
use crate::board::Board;
use crate::config::Processor;
use crate::memory::RegionId;
use crate::sound::YM2151_STATUS;

/// Interrupt line numbers passed to `Cpu::set_interrupt_line` for the
/// 8-bit processors. The 68000s take their level from the C148 instead.
pub mod line {
    pub const SOUND_IRQ: u8 = 0;
    pub const SOUND_FIRQ: u8 = 1;
    pub const MCU_IRQ: u8 = 0;
    /// A/D conversion interrupt.
    pub const MCU_ADC: u8 = 1;
}

/// One processor's bus, borrowing the board for the length of a slice.
pub struct CpuBus<'a> {
    board: &'a mut Board,
    processor: Processor,
}

impl<'a> CpuBus<'a> {
    pub(crate) fn new(board: &'a mut Board, processor: Processor) -> Self {
        Self { board, processor }
    }

    #[must_use]
    pub fn processor(&self) -> Processor {
        self.processor
    }

    fn resolve(&self, address: u32, access: Access) -> Option<(Target, u32)> {
        let range = self.board.maps[self.processor.index()].resolve(address, access)?;
        Some((range.target, range.offset(address)))
    }

    /// Index of this processor's C148. Only the 68000s map one.
    fn c148_index(&self) -> usize {
        self.processor.index().min(1)
    }

    fn read_port(&mut self, port: Port, offset: u32) -> u16 {
        let c148 = self.c148_index();
        let board = &mut *self.board;
        let register = ((offset >> 1) & 7) as usize;
        match port {
            Port::C148 => board.c148[c148].read(offset),
            Port::VideoRam => board.video.tilemap().read_vram((offset >> 1) as usize),
            Port::VideoControl => board.video.tilemap().read_control((offset >> 1) as usize),
            Port::Palette => board.video.palette().read_word(offset),
            Port::SerialControl => board.serial.read(offset),
            Port::SpriteBank => board.video.sprite_bank().0,
            Port::RozControl(plane) => board.video.roz_control(plane).map_or(0, |c| c.read(register)),
            Port::KeyLatch => board.key[register],
            Port::SoundBankedRom => {
                u16::from(board.sound.read_banked(board.regions.get(RegionId::SoundProgram), offset))
            }
            Port::SoundBankSelect => u16::from(board.sound.bank() << 4),
            Port::Ym2151 => u16::from(YM2151_STATUS),
            Port::C140 => u16::from(board.sound.c140_read(offset)),
            Port::McuInput(input) => u16::from(board.io.inputs.read(input)),
            Port::McuPortD => u16::from(board.io.port_d()),
            Port::AnalogControl => u16::from(board.io.read_adc_control()),
            Port::AnalogData => u16::from(board.io.read_adc_data()),
        }
    }

    fn write_port(&mut self, port: Port, offset: u32, value: u16) {
        let board = &mut *self.board;
        let register = ((offset >> 1) & 7) as usize;
        match port {
            Port::C148 => {
                let c148 = self.c148_index();
                if let Some(action) = self.board.c148[c148].write(offset, value) {
                    self.apply(action);
                }
            }
            Port::VideoRam => board.video.tilemap_mut().write_vram((offset >> 1) as usize, value),
            Port::VideoControl => board.video.tilemap_mut().write_control((offset >> 1) as usize, value),
            Port::Palette => board.video.palette_mut().write_word(offset, value),
            Port::SerialControl => board.serial.write(offset, value),
            Port::SpriteBank => board.video.set_sprite_bank(value),
            Port::RozControl(plane) => {
                if let Some(control) = board.video.roz_control_mut(plane) {
                    control.write(register, value);
                }
            }
            Port::KeyLatch => board.key[register] = value,
            Port::SoundBankSelect => board.sound.select_bank(value as u8),
            Port::Ym2151 => board.sound.ym2151_write(offset, value as u8),
            Port::C140 => board.sound.c140_write(offset, value as u8),
            Port::McuPortD => board.io.write_port_d(value as u8),
            Port::AnalogControl => {
                if board.io.write_adc_control(value as u8) {
                    board.pulse(Processor::Mcu, line::MCU_ADC);
                }
            }
            Port::AnalogData | Port::McuInput(_) | Port::SoundBankedRom => {}
        }
    }

    fn apply(&mut self, action: C148Action) {
        match action {
            C148Action::TriggerPeerCpuIrq => {
                let peer = 1 - self.c148_index();
                self.board.c148[peer].raise(InterruptSource::CpuIrq);
            }
            C148Action::ResetLine { target, held } => {
                self.board.pending_resets.push((target, held));
                if !held {
                    // The released processor must run before this frame's
                    // interrupts are evaluated.
                    self.board.yield_requested = true;
                }
            }
        }
    }

    fn open_bus(&self, kind: &str, address: u32) {
        trace!("{}: open bus {kind} {address:#08X}", self.processor.name());
    }
}

impl Bus for CpuBus<'_> {
    fn read_byte(&mut self, address: u32) -> u8 {
        let address = address & self.processor.address_mask();
        let Some((target, offset)) = self.resolve(address, Access::Read) else {
            self.open_bus("read", address);
            return OPEN_BUS_BYTE;
        };
        match target {
            Target::Ram(id) | Target::Rom(id) => self.board.regions.get(id).read_byte(offset),
            Target::ByteLane(id) => {
                if address & 1 == 1 {
                    self.board.regions.get(id).read_byte(offset >> 1)
                } else {
                    0
                }
            }
            Target::Handler(port) => {
                if self.processor.is_68000() {
                    let [hi, lo] = self.read_port(port, offset & !1).to_be_bytes();
                    if address & 1 == 0 { hi } else { lo }
                } else {
                    self.read_port(port, offset) as u8
                }
            }
            Target::Nop => 0,
        }
    }

    fn write_byte(&mut self, address: u32, value: u8) {
        let address = address & self.processor.address_mask();
        let Some((target, offset)) = self.resolve(address, Access::Write) else {
            self.open_bus("write", address);
            return;
        };
        match target {
            Target::Ram(id) => self.board.regions.get_mut(id).write_byte(offset, value),
            Target::Rom(_) => trace!("{}: ROM write {address:#08X} dropped", self.processor.name()),
            Target::ByteLane(id) => {
                if address & 1 == 1 {
                    self.board.regions.get_mut(id).write_byte(offset >> 1, value);
                }
            }
            Target::Handler(port) if !self.processor.is_68000() => {
                self.write_port(port, offset, u16::from(value));
            }
            // The C148 only decodes D0-D2, so a byte write is a full write.
            Target::Handler(Port::C148) => self.write_port(Port::C148, offset & !1, u16::from(value)),
            Target::Handler(port) => {
                let word = offset & !1;
                let [hi, lo] = self.read_port(port, word).to_be_bytes();
                let merged = if address & 1 == 0 {
                    u16::from_be_bytes([value, lo])
                } else {
                    u16::from_be_bytes([hi, value])
                };
                self.write_port(port, word, merged);
            }
            Target::Nop => {}
        }
    }

    fn read_word(&mut self, address: u32) -> u16 {
        let address = address & self.processor.address_mask() & !1;
        if !self.processor.is_68000() {
            let hi = self.read_byte(address);
            let lo = self.read_byte(address.wrapping_add(1));
            return u16::from_be_bytes([hi, lo]);
        }
        let Some((target, offset)) = self.resolve(address, Access::Read) else {
            self.open_bus("read", address);
            return OPEN_BUS_WORD;
        };
        match target {
            Target::Ram(id) | Target::Rom(id) => self.board.regions.get(id).read_word(offset),
            Target::ByteLane(id) => u16::from(self.board.regions.get(id).read_byte(offset >> 1)),
            Target::Handler(port) => self.read_port(port, offset),
            Target::Nop => 0,
        }
    }

    fn write_word(&mut self, address: u32, value: u16) {
        let address = address & self.processor.address_mask() & !1;
        if !self.processor.is_68000() {
            let [hi, lo] = value.to_be_bytes();
            self.write_byte(address, hi);
            self.write_byte(address.wrapping_add(1), lo);
            return;
        }
        let Some((target, offset)) = self.resolve(address, Access::Write) else {
            self.open_bus("write", address);
            return;
        };
        match target {
            Target::Ram(id) => self.board.regions.get_mut(id).write_word(offset, value),
            Target::Rom(_) => trace!("{}: ROM write {address:#08X} dropped", self.processor.name()),
            Target::ByteLane(id) => self.board.regions.get_mut(id).write_byte(offset >> 1, value as u8),
            Target::Handler(port) => self.write_port(port, offset, value),
            Target::Nop => {}
        }
    }

    fn interrupt_level(&self) -> u8 {
        if self.processor.is_68000() {
            self.board.c148[self.c148_index()].ipl()
        } else {
            0
        }
    }

    fn yield_requested(&self) -> bool {
        self.board.yield_requested
    }
}
