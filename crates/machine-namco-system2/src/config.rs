//! Board configuration.
//!
//! Everything that differs between System 2 boards is resolved once, when
//! a [`BoardVariant`] becomes a [`BoardProfile`]. Components receive the
//! profile's fields at construction and never look at the variant again.

use namco_system2_video::{GfxRegions, Orientation, RozPrioritySource, SpriteLayout};

/// Master crystal: 49.152 MHz.
pub const MASTER_CLOCK_HZ: u64 = 49_152_000;
/// Frames per second.
pub const FRAME_RATE: u64 = 60;
/// Default scheduler slices per frame.
pub const DEFAULT_SLICES_PER_FRAME: u32 = 100;

/// One of the four processors on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Processor {
    /// Master 68000 (12.288 MHz).
    Master,
    /// Slave 68000 (12.288 MHz).
    Slave,
    /// 6809 sound CPU (3.072 MHz).
    Sound,
    /// HD63705 I/O microcontroller (2.048 MHz).
    Mcu,
}

impl Processor {
    /// Scheduling order within a slice.
    pub const ALL: [Self; 4] = [Self::Master, Self::Slave, Self::Sound, Self::Mcu];

    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Master => 0,
            Self::Slave => 1,
            Self::Sound => 2,
            Self::Mcu => 3,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Master => "master",
            Self::Slave => "slave",
            Self::Sound => "sound",
            Self::Mcu => "mcu",
        }
    }

    /// Master crystal divisor for this processor's clock.
    #[must_use]
    pub const fn clock_divisor(self) -> u64 {
        match self {
            Self::Master | Self::Slave => 4,
            Self::Sound => 16,
            Self::Mcu => 24,
        }
    }

    /// True for the two 68000s, which have a 16-bit data bus and a C148.
    #[must_use]
    pub const fn is_68000(self) -> bool {
        matches!(self, Self::Master | Self::Slave)
    }

    /// Mask applied to every address the processor emits.
    #[must_use]
    pub const fn address_mask(self) -> u32 {
        if self.is_68000() { 0x00FF_FFFF } else { 0xFFFF }
    }
}

/// Board revisions with distinct graphics hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BoardVariant {
    /// Standard graphics board: one ROZ plane, 8 priority levels.
    #[default]
    Standard,
    /// Final Lap: road generator instead of ROZ, 16 priority levels.
    FinalLap,
    /// Metal Hawk: two ROZ planes with their own priorities.
    MetalHawk,
}

/// Address windows of one ROZ plane on the 68000 bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RozWindow {
    pub ram_start: u32,
    pub ram_end: u32,
    pub control_start: u32,
    /// Bytes of the window holding the square tile map.
    pub map_bytes: usize,
}

impl RozWindow {
    #[must_use]
    pub const fn ram_bytes(self) -> usize {
        (self.ram_end - self.ram_start + 1) as usize
    }
}

/// Inclusive address window.
pub type Window = (u32, u32);

/// Everything variant-specific, resolved once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardProfile {
    pub variant: BoardVariant,
    /// 8 or 16.
    pub priority_levels: u8,
    pub sprite_layout: SpriteLayout,
    pub roz_priority: RozPrioritySource,
    pub roz: Vec<RozWindow>,
    pub sprite_ram: Window,
    pub sprite_bank: Window,
    /// Protection key latch, if fitted.
    pub key: Option<Window>,
    /// Final Lap road tile RAM, road graphics RAM and road control.
    pub road: bool,
}

impl BoardVariant {
    #[must_use]
    pub fn profile(self) -> BoardProfile {
        match self {
            Self::Standard => BoardProfile {
                variant: self,
                priority_levels: 8,
                sprite_layout: SpriteLayout::Standard,
                roz_priority: RozPrioritySource::BankRegister,
                roz: vec![RozWindow {
                    ram_start: 0xC8_0000,
                    ram_end: 0xCB_FFFF,
                    control_start: 0xCC_0000,
                    map_bytes: 0x2_0000,
                }],
                sprite_ram: (0xC0_0000, 0xC0_3FFF),
                sprite_bank: (0xC4_0000, 0xC4_FFFF),
                key: Some((0xD0_0000, 0xD0_000F)),
                road: false,
            },
            Self::FinalLap => BoardProfile {
                variant: self,
                priority_levels: 16,
                sprite_layout: SpriteLayout::FinalLap,
                roz_priority: RozPrioritySource::BankRegister,
                roz: Vec::new(),
                sprite_ram: (0x80_0000, 0x80_FFFF),
                sprite_bank: (0x84_0000, 0x84_FFFF),
                key: None,
                road: true,
            },
            // The Metal Hawk graphics board leaves the standard C80000 ROZ RAM
            // and CC0000 ROZ control windows undecoded; each plane below has its own.
            Self::MetalHawk => BoardProfile {
                variant: self,
                priority_levels: 8,
                sprite_layout: SpriteLayout::Standard,
                roz_priority: RozPrioritySource::ControlWord,
                roz: vec![
                    RozWindow {
                        ram_start: 0xC4_0000,
                        ram_end: 0xC4_7FFF,
                        control_start: 0xD0_0000,
                        map_bytes: 0x8000,
                    },
                    RozWindow {
                        ram_start: 0xC4_8000,
                        ram_end: 0xC4_FFFF,
                        control_start: 0xD0_0010,
                        map_bytes: 0x8000,
                    },
                ],
                sprite_ram: (0xC0_0000, 0xC0_3FFF),
                sprite_bank: (0xE0_0000, 0xE0_FFFF),
                key: None,
                road: false,
            },
        }
    }
}

/// User-facing board settings.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BoardSettings {
    pub variant: BoardVariant,
    pub orientation: Orientation,
    /// Frames without a kick before the machine resets; `None` disables.
    pub watchdog_frames: Option<u32>,
    pub slices_per_frame: u32,
}

impl Default for BoardSettings {
    fn default() -> Self {
        Self {
            variant: BoardVariant::Standard,
            orientation: Orientation::default(),
            watchdog_frames: Some(namco_c148::DEFAULT_WATCHDOG_FRAMES),
            slices_per_frame: DEFAULT_SLICES_PER_FRAME,
        }
    }
}

#[cfg(feature = "serde")]
impl BoardSettings {
    /// Parse settings from JSON. Missing fields take their defaults.
    pub fn from_json(text: &str) -> Result<Self, crate::System2Error> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Program and data ROM images, already decoded into CPU address order.
#[derive(Debug, Clone, Default)]
pub struct RomSet {
    /// Master 68000 program, mapped at 0x000000.
    pub master: Vec<u8>,
    /// Slave 68000 program, mapped at 0x000000.
    pub slave: Vec<u8>,
    /// 6809 program: offset 0x0000-0xFFFF is the CPU view, banks start at
    /// 0x10000.
    pub sound: Vec<u8>,
    /// HD63705 program, indexed by CPU address.
    pub mcu: Vec<u8>,
    /// Shared data ROM at 0x200000-0x3FFFFF.
    pub data: Vec<u8>,
}

/// Everything needed to build a machine.
#[derive(Debug, Clone, Default)]
pub struct System2Config {
    pub settings: BoardSettings,
    pub roms: RomSet,
    pub gfx: GfxRegions,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variants_resolve_to_distinct_profiles() {
        let standard = BoardVariant::Standard.profile();
        assert_eq!(standard.priority_levels, 8);
        assert_eq!(standard.roz.len(), 1);
        assert_eq!(standard.roz[0].ram_bytes(), 0x4_0000);

        let final_lap = BoardVariant::FinalLap.profile();
        assert_eq!(final_lap.priority_levels, 16);
        assert_eq!(final_lap.sprite_layout, SpriteLayout::FinalLap);
        assert!(final_lap.roz.is_empty());
        assert!(final_lap.road);

        let metal_hawk = BoardVariant::MetalHawk.profile();
        assert_eq!(metal_hawk.roz.len(), 2);
        assert_eq!(metal_hawk.roz_priority, RozPrioritySource::ControlWord);
        assert_eq!(metal_hawk.roz[1].ram_bytes(), 0x8000);
    }

    #[test]
    fn clock_divisors_match_cpu_speeds() {
        assert_eq!(MASTER_CLOCK_HZ / Processor::Master.clock_divisor(), 12_288_000);
        assert_eq!(MASTER_CLOCK_HZ / Processor::Sound.clock_divisor(), 3_072_000);
        assert_eq!(MASTER_CLOCK_HZ / Processor::Mcu.clock_divisor(), 2_048_000);
    }
}
