//! Per-processor address maps.
//!
//! A map is an ordered list of inclusive ranges. Lookup scans from the most
//! recently registered range backwards, so a later range shadows an earlier
//! one wherever they overlap. Some board tables overlap on purpose (the
//! Final Lap road windows); the shadowing is kept and logged rather than
//! rejected.

use log::debug;

use crate::config::{BoardProfile, Processor};
use crate::io::McuInput;
use crate::memory::RegionId;

/// Direction a range answers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
    ReadWrite,
}

impl Access {
    const fn allows(self, other: Self) -> bool {
        matches!(
            (self, other),
            (Self::ReadWrite, _) | (_, Self::ReadWrite) | (Self::Read, Self::Read) | (Self::Write, Self::Write)
        )
    }
}

/// Register windows decoded by the board rather than plain memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Port {
    C148,
    VideoRam,
    VideoControl,
    Palette,
    SerialControl,
    SpriteBank,
    RozControl(usize),
    KeyLatch,
    SoundBankedRom,
    SoundBankSelect,
    Ym2151,
    C140,
    McuInput(McuInput),
    McuPortD,
    AnalogControl,
    AnalogData,
}

/// What a range resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Ram(RegionId),
    /// Read-only region; writes are dropped.
    Rom(RegionId),
    /// Byte region on the low data lane of the 68000 bus: word offset `n`
    /// holds byte `n`, the high lane floats.
    ByteLane(RegionId),
    Handler(Port),
    /// Decoded but inert: reads return 0, writes are dropped.
    Nop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressRange {
    pub start: u32,
    pub end: u32,
    pub access: Access,
    pub target: Target,
    /// Added to `address - start` to form the target offset.
    pub base: u32,
}

impl AddressRange {
    #[must_use]
    pub const fn contains(&self, address: u32) -> bool {
        self.start <= address && address <= self.end
    }

    const fn overlaps(&self, other: &Self) -> bool {
        self.start <= other.end && other.start <= self.end && self.access.allows(other.access)
    }

    /// Offset into the target for `address`.
    #[must_use]
    pub const fn offset(&self, address: u32) -> u32 {
        address - self.start + self.base
    }
}

/// Address map of one processor.
#[derive(Debug, Clone)]
pub struct AddressMap {
    name: &'static str,
    ranges: Vec<AddressRange>,
}

impl AddressMap {
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            ranges: Vec::new(),
        }
    }

    #[must_use]
    pub fn ranges(&self) -> &[AddressRange] {
        &self.ranges
    }

    /// Register a range; it shadows every earlier overlapping range.
    pub fn map(&mut self, start: u32, end: u32, access: Access, target: Target) -> &mut Self {
        self.map_at(start, end, access, target, 0)
    }

    /// Register a range whose target offsets start at `base`.
    pub fn map_at(&mut self, start: u32, end: u32, access: Access, target: Target, base: u32) -> &mut Self {
        let range = AddressRange {
            start,
            end,
            access,
            target,
            base,
        };
        for earlier in self.ranges.iter().filter(|r| r.overlaps(&range)) {
            debug!(
                "{}: {start:#08X}-{end:#08X} {target:?} shadows {:#08X}-{:#08X} {:?}",
                self.name, earlier.start, earlier.end, earlier.target
            );
        }
        self.ranges.push(range);
        self
    }

    /// Range answering `address` for `access`, latest registration first.
    #[must_use]
    pub fn resolve(&self, address: u32, access: Access) -> Option<AddressRange> {
        self.ranges
            .iter()
            .rev()
            .find(|r| r.contains(address) && r.access.allows(access))
            .copied()
    }
}

use Access::{Read, ReadWrite, Write};

/// CPU-board window common to both 68000s. Both maps point at the same
/// regions and handlers.
fn cpu_board_window(map: &mut AddressMap) {
    map.map(0x20_0000, 0x3F_FFFF, Read, Target::Rom(RegionId::DataRom))
        .map(0x40_0000, 0x41_FFFF, ReadWrite, Target::Handler(Port::VideoRam))
        .map(0x42_0000, 0x43_FFFF, ReadWrite, Target::Handler(Port::VideoControl))
        .map(0x44_0000, 0x45_FFFF, ReadWrite, Target::Handler(Port::Palette))
        .map(0x46_0000, 0x47_FFFF, ReadWrite, Target::ByteLane(RegionId::DualPort))
        .map(0x48_0000, 0x49_FFFF, ReadWrite, Target::Ram(RegionId::SerialRam))
        .map(0x4A_0000, 0x4B_FFFF, ReadWrite, Target::Handler(Port::SerialControl));
}

/// Graphics-board window; differs per board variant.
fn gfx_board_window(map: &mut AddressMap, profile: &BoardProfile) {
    let (start, end) = profile.sprite_ram;
    map.map(start, end, ReadWrite, Target::Ram(RegionId::SpriteRam));
    let (start, end) = profile.sprite_bank;
    map.map(start, end, Write, Target::Handler(Port::SpriteBank));

    for (plane, window) in profile.roz.iter().enumerate() {
        map.map(window.ram_start, window.ram_end, ReadWrite, Target::Ram(RegionId::roz(plane)))
            .map(
                window.control_start,
                window.control_start + 0x0F,
                ReadWrite,
                Target::Handler(Port::RozControl(plane)),
            );
    }
    if let Some((start, end)) = profile.key {
        map.map(start, end, ReadWrite, Target::Handler(Port::KeyLatch));
    }
    if profile.road {
        // Graphics and control windows sit inside the tile window.
        map.map(0x88_0000, 0x89_FFFF, ReadWrite, Target::Ram(RegionId::RoadTiles))
            .map(0x89_0000, 0x89_7FFF, ReadWrite, Target::Ram(RegionId::RoadGfx))
            .map(0x89_F000, 0x89_FFFF, ReadWrite, Target::Ram(RegionId::RoadControl));
    }
}

fn master_map(profile: &BoardProfile) -> AddressMap {
    let mut map = AddressMap::new("master");
    map.map(0x00_0000, 0x03_FFFF, ReadWrite, Target::Rom(RegionId::MasterProgram))
        .map(0x10_0000, 0x10_FFFF, ReadWrite, Target::Ram(RegionId::MasterRam))
        .map(0x18_0000, 0x18_3FFF, ReadWrite, Target::ByteLane(RegionId::Eeprom))
        .map(0x1C_0000, 0x1F_FFFF, ReadWrite, Target::Handler(Port::C148));
    cpu_board_window(&mut map);
    gfx_board_window(&mut map, profile);
    map
}

fn slave_map(profile: &BoardProfile) -> AddressMap {
    let mut map = AddressMap::new("slave");
    map.map(0x00_0000, 0x03_FFFF, ReadWrite, Target::Rom(RegionId::SlaveProgram))
        .map(0x10_0000, 0x13_FFFF, ReadWrite, Target::Ram(RegionId::SlaveRam))
        .map(0x1C_0000, 0x1F_FFFF, ReadWrite, Target::Handler(Port::C148));
    cpu_board_window(&mut map);
    gfx_board_window(&mut map, profile);
    map
}

fn sound_map() -> AddressMap {
    let mut map = AddressMap::new("sound");
    // Broad windows first so the registers inside them win.
    map.map(0x0000, 0x3FFF, Read, Target::Handler(Port::SoundBankedRom))
        .map(0x0000, 0x3FFF, Write, Target::Rom(RegionId::SoundProgram))
        .map(0x4000, 0x4001, ReadWrite, Target::Handler(Port::Ym2151))
        .map(0x5000, 0x6FFF, ReadWrite, Target::Handler(Port::C140))
        .map(0x7000, 0x7FFF, ReadWrite, Target::Ram(RegionId::DualPort))
        .map(0x8000, 0x9FFF, ReadWrite, Target::Ram(RegionId::SoundRam))
        .map(0xA000, 0xBFFF, Write, Target::Nop)
        .map_at(0xC000, 0xFFFF, Write, Target::Rom(RegionId::SoundProgram), 0xC000)
        .map_at(0xD000, 0xFFFF, Read, Target::Rom(RegionId::SoundProgram), 0xD000)
        .map(0xC000, 0xC001, Write, Target::Handler(Port::SoundBankSelect))
        .map(0xD001, 0xD001, Write, Target::Nop);
    map
}

fn mcu_map() -> AddressMap {
    let mut map = AddressMap::new("mcu");
    // Port reads 0x0004-0x0006 are undecoded; the RAM behind them is write-only.
    map.map(0x0000, 0x003F, Write, Target::Ram(RegionId::McuRam))
        .map_at(0x0008, 0x003F, Read, Target::Ram(RegionId::McuRam), 0x0008)
        .map(0x0000, 0x0000, Read, Target::Nop)
        .map(0x0001, 0x0001, Read, Target::Handler(Port::McuInput(McuInput::PortB)))
        .map(0x0002, 0x0002, Read, Target::Handler(Port::McuInput(McuInput::PortC)))
        .map(0x0003, 0x0003, ReadWrite, Target::Handler(Port::McuPortD))
        .map(0x0007, 0x0007, Read, Target::Handler(Port::McuInput(McuInput::PortH)))
        .map(0x0010, 0x0010, ReadWrite, Target::Handler(Port::AnalogControl))
        .map(0x0011, 0x0011, ReadWrite, Target::Handler(Port::AnalogData))
        .map_at(0x0040, 0x01BF, ReadWrite, Target::Ram(RegionId::McuRam), 0x0040)
        .map_at(0x01C0, 0x1FFF, ReadWrite, Target::Rom(RegionId::McuProgram), 0x01C0)
        .map(0x2000, 0x2000, Read, Target::Handler(Port::McuInput(McuInput::Dip)))
        .map(0x5000, 0x57FF, ReadWrite, Target::Ram(RegionId::DualPort))
        .map(0x6000, 0x6FFF, Read, Target::Nop)
        .map_at(0x8000, 0xFFFF, ReadWrite, Target::Rom(RegionId::McuProgram), 0x8000);
    for dial in 0..4u8 {
        let address = 0x3000 + u32::from(dial);
        map.map(address, address, Read, Target::Handler(Port::McuInput(McuInput::Dial(dial))));
    }
    map
}

/// Build the map for one processor.
#[must_use]
pub fn build(processor: Processor, profile: &BoardProfile) -> AddressMap {
    match processor {
        Processor::Master => master_map(profile),
        Processor::Slave => slave_map(profile),
        Processor::Sound => sound_map(),
        Processor::Mcu => mcu_map(),
    }
}
