//! Shared region store.
//!
//! Every RAM and ROM buffer on the board lives here, owned by the machine
//! and reached by any processor whose address map points at it. Accesses
//! are serialised by the scheduler, so there is no locking.

use namco_system2_video::SPRITE_RAM_BYTES;

use crate::config::{BoardProfile, RomSet};
use crate::eeprom::EEPROM_BYTES;

/// Dual-port RAM shared by the 68000s, the sound CPU and the MCU.
pub const DUAL_PORT_BYTES: usize = 0x800;
pub const SERIAL_RAM_BYTES: usize = 0x4000;
pub const MASTER_RAM_BYTES: usize = 0x1_0000;
pub const SLAVE_RAM_BYTES: usize = 0x4_0000;
pub const SOUND_RAM_BYTES: usize = 0x2000;
pub const MCU_RAM_BYTES: usize = 0x200;
pub const ROAD_TILE_BYTES: usize = 0x2_0000;
pub const ROAD_GFX_BYTES: usize = 0x8000;
pub const ROAD_CONTROL_BYTES: usize = 0x1000;

/// Named byte buffer. Offsets wrap at the buffer size; an empty region
/// reads as open bus and ignores writes.
#[derive(Debug, Clone)]
pub struct SharedRegion {
    name: &'static str,
    data: Vec<u8>,
}

impl SharedRegion {
    #[must_use]
    pub fn new(name: &'static str, data: Vec<u8>) -> Self {
        Self { name, data }
    }

    #[must_use]
    pub fn filled(name: &'static str, len: usize, value: u8) -> Self {
        Self::new(name, vec![value; len])
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    fn wrap(&self, offset: u32) -> usize {
        let len = self.data.len();
        let offset = offset as usize;
        if len.is_power_of_two() {
            offset & (len - 1)
        } else {
            offset % len
        }
    }

    #[must_use]
    pub fn read_byte(&self, offset: u32) -> u8 {
        if self.data.is_empty() {
            return emu_core::OPEN_BUS_BYTE;
        }
        self.data[self.wrap(offset)]
    }

    pub fn write_byte(&mut self, offset: u32, value: u8) {
        if self.data.is_empty() {
            return;
        }
        let index = self.wrap(offset);
        self.data[index] = value;
    }

    /// Big-endian word at an even offset.
    #[must_use]
    pub fn read_word(&self, offset: u32) -> u16 {
        let offset = offset & !1;
        u16::from_be_bytes([self.read_byte(offset), self.read_byte(offset + 1)])
    }

    pub fn write_word(&mut self, offset: u32, value: u16) {
        let offset = offset & !1;
        let [hi, lo] = value.to_be_bytes();
        self.write_byte(offset, hi);
        self.write_byte(offset + 1, lo);
    }
}

/// Identifies a region in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegionId {
    MasterProgram,
    SlaveProgram,
    SoundProgram,
    McuProgram,
    DataRom,
    MasterRam,
    SlaveRam,
    Eeprom,
    DualPort,
    SerialRam,
    SpriteRam,
    Roz1,
    Roz2,
    RoadTiles,
    RoadGfx,
    RoadControl,
    SoundRam,
    McuRam,
}

impl RegionId {
    const COUNT: usize = 18;

    const fn index(self) -> usize {
        self as usize
    }

    /// ROZ RAM of plane `plane`.
    #[must_use]
    pub const fn roz(plane: usize) -> Self {
        if plane == 0 { Self::Roz1 } else { Self::Roz2 }
    }
}

/// All regions of one board.
#[derive(Debug, Clone)]
pub struct SharedRegions {
    regions: Vec<SharedRegion>,
}

impl SharedRegions {
    /// Allocate the regions a board profile needs. Regions the board lacks
    /// are left empty.
    #[must_use]
    pub fn new(profile: &BoardProfile, roms: RomSet) -> Self {
        let roz_bytes = |plane: usize| profile.roz.get(plane).map_or(0, |w| w.ram_bytes());
        let road = |bytes: usize| if profile.road { bytes } else { 0 };

        let regions = vec![
            SharedRegion::new("master program", roms.master),
            SharedRegion::new("slave program", roms.slave),
            SharedRegion::new("sound program", roms.sound),
            SharedRegion::new("mcu program", roms.mcu),
            SharedRegion::new("data rom", roms.data),
            SharedRegion::filled("master ram", MASTER_RAM_BYTES, 0),
            SharedRegion::filled("slave ram", SLAVE_RAM_BYTES, 0),
            SharedRegion::filled("eeprom", EEPROM_BYTES, 0xFF),
            SharedRegion::filled("dual-port ram", DUAL_PORT_BYTES, 0),
            SharedRegion::filled("serial ram", SERIAL_RAM_BYTES, 0),
            SharedRegion::filled("sprite ram", SPRITE_RAM_BYTES, 0),
            SharedRegion::filled("roz1 ram", roz_bytes(0), 0),
            SharedRegion::filled("roz2 ram", roz_bytes(1), 0),
            SharedRegion::filled("road tile ram", road(ROAD_TILE_BYTES), 0),
            SharedRegion::filled("road gfx ram", road(ROAD_GFX_BYTES), 0),
            SharedRegion::filled("road control", road(ROAD_CONTROL_BYTES), 0),
            SharedRegion::filled("sound ram", SOUND_RAM_BYTES, 0),
            SharedRegion::filled("mcu ram", MCU_RAM_BYTES, 0),
        ];
        debug_assert_eq!(regions.len(), RegionId::COUNT);
        Self { regions }
    }

    #[must_use]
    pub fn get(&self, id: RegionId) -> &SharedRegion {
        &self.regions[id.index()]
    }

    pub fn get_mut(&mut self, id: RegionId) -> &mut SharedRegion {
        &mut self.regions[id.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BoardVariant;

    #[test]
    fn offsets_wrap_at_region_size() {
        let mut region = SharedRegion::filled("dpram", DUAL_PORT_BYTES, 0);
        region.write_byte(0x0805, 0x42);
        assert_eq!(region.read_byte(0x0005), 0x42);
    }

    #[test]
    fn words_are_big_endian() {
        let mut region = SharedRegion::filled("ram", 4, 0);
        region.write_word(1, 0xBEEF);
        assert_eq!(region.as_slice(), &[0xBE, 0xEF, 0, 0]);
        assert_eq!(region.read_word(0), 0xBEEF);
    }

    #[test]
    fn empty_region_is_open_bus() {
        let mut region = SharedRegion::new("absent", Vec::new());
        region.write_byte(0, 1);
        assert_eq!(region.read_byte(0), 0xFF);
    }

    #[test]
    fn absent_hardware_gets_empty_regions() {
        let regions = SharedRegions::new(&BoardVariant::FinalLap.profile(), RomSet::default());
        assert!(regions.get(RegionId::Roz1).is_empty());
        assert_eq!(regions.get(RegionId::RoadTiles).len(), ROAD_TILE_BYTES);
        assert!(regions.get(RegionId::Eeprom).as_slice().iter().all(|&b| b == 0xFF));
    }
}
