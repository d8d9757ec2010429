//! Namco C148 interrupt encoder and reset controller.
//!
//! Each general-purpose 68000 on a System 2 board has its own C148 mapped at
//! 0x1C0000-0x1FFFFF. The chip folds five interrupt sources into the
//! 68000's three IPL pins, each source with its own programmable level,
//! and on the master board also drives the reset lines of the sound CPU and
//! of the slave 68000 / I/O MCU pair.
//!
//! Registers are selected by address bits 13-17; only D00-D02 are wired.
//!
//! | Offset  | Register                              |
//! |---------|---------------------------------------|
//! | 0x06000 | CPUIRQ level (inter-CPU)              |
//! | 0x08000 | EXIRQ level                           |
//! | 0x0A000 | POSIRQ level                          |
//! | 0x0C000 | SCIRQ level                           |
//! | 0x0E000 | VBLANK level                          |
//! | 0x14000 | trigger the peer CPU's CPUIRQ         |
//! | 0x16000 | acknowledge CPUIRQ (0x18000 EXIRQ ... 0x1E000 VBLANK) |
//! | 0x20000 | EEPROM ready status (D01)             |
//! | 0x22000 | sound CPU reset (master only)         |
//! | 0x24000 | slave CPU + MCU reset (master only)   |
//! | 0x26000 | watchdog kick                         |

use emu_core::{Observable, Value};
use log::debug;

const REG_LEVEL_BASE: usize = 0x03;
const REG_TRIGGER_PEER: usize = 0x0A;
const REG_ACK_BASE: usize = 0x0B;
const REG_EEPROM_READY: usize = 0x10;
const REG_SOUND_RESET: usize = 0x11;
const REG_SLAVE_RESET: usize = 0x12;
const REG_WATCHDOG: usize = 0x13;

/// EEPROM ready is reported on D01; the EEPROM never reports busy.
const EEPROM_READY: u16 = 0x0002;

/// Default watchdog window in frames.
pub const DEFAULT_WATCHDOG_FRAMES: u32 = 60;

/// Interrupt inputs of the C148, in level-register order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InterruptSource {
    /// Inter-CPU interrupt, raised by the peer 68000.
    CpuIrq,
    /// External interrupt from the expansion connector.
    ExIrq,
    /// Raster position compare.
    PosIrq,
    /// Serial communications.
    SciIrq,
    VBlank,
}

impl InterruptSource {
    pub const ALL: [Self; 5] = [
        Self::CpuIrq,
        Self::ExIrq,
        Self::PosIrq,
        Self::SciIrq,
        Self::VBlank,
    ];

    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::CpuIrq => 0,
            Self::ExIrq => 1,
            Self::PosIrq => 2,
            Self::SciIrq => 3,
            Self::VBlank => 4,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::CpuIrq => "cpuirq",
            Self::ExIrq => "exirq",
            Self::PosIrq => "posirq",
            Self::SciIrq => "scirq",
            Self::VBlank => "vblank",
        }
    }
}

/// Per-source request state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineState {
    Idle,
    Asserted,
    Acknowledged,
}

impl LineState {
    const fn name(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Asserted => "asserted",
            Self::Acknowledged => "acknowledged",
        }
    }
}

/// Which 68000 this controller belongs to. Only the master's reset
/// outputs are wired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Master,
    Slave,
}

/// Processors whose reset line the master C148 drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetTarget {
    SoundCpu,
    /// The slave 68000 and the I/O MCU share one reset output.
    SlaveAndMcu,
}

/// Side effect of a register access that reaches outside the chip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum C148Action {
    /// Raise CPUIRQ on the other 68000's controller.
    TriggerPeerCpuIrq,
    /// A reset output changed. `held` is true while the target is in reset.
    ResetLine { target: ResetTarget, held: bool },
}

/// Frame-granular watchdog.
#[derive(Debug, Clone)]
struct Watchdog {
    frames_since_kick: u32,
    limit: Option<u32>,
}

/// Namco C148 interrupt controller.
pub struct C148 {
    role: Role,
    /// Raw register file, 3 bits per register.
    registers: [u16; 32],
    /// Owner of each IPL level. A later raise at the same level replaces
    /// the previous owner; level 0 is never driven.
    owners: [Option<InterruptSource>; 8],
    states: [LineState; 5],
    sound_held: bool,
    slave_held: bool,
    watchdog: Watchdog,
}

impl C148 {
    #[must_use]
    pub fn new(role: Role) -> Self {
        Self::with_watchdog(role, Some(DEFAULT_WATCHDOG_FRAMES))
    }

    /// Controller with an explicit watchdog window; `None` disables it.
    #[must_use]
    pub fn with_watchdog(role: Role, limit: Option<u32>) -> Self {
        Self {
            role,
            registers: [0; 32],
            owners: [None; 8],
            states: [LineState::Idle; 5],
            sound_held: true,
            slave_held: true,
            watchdog: Watchdog {
                frames_since_kick: 0,
                limit,
            },
        }
    }

    /// Return to power-on state: all levels disabled, no requests pending,
    /// dependent processors held in reset.
    pub fn reset(&mut self) {
        let limit = self.watchdog.limit;
        *self = Self::with_watchdog(self.role, limit);
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Programmed level for a source (0 = disabled).
    #[must_use]
    pub fn level(&self, source: InterruptSource) -> u8 {
        (self.registers[REG_LEVEL_BASE + source.index()] & 0x07) as u8
    }

    pub fn set_level(&mut self, source: InterruptSource, level: u8) {
        self.registers[REG_LEVEL_BASE + source.index()] = u16::from(level & 0x07);
    }

    #[must_use]
    pub fn line_state(&self, source: InterruptSource) -> LineState {
        self.states[source.index()]
    }

    /// Encoded level presented on the CPU's IPL pins (0 = none).
    #[must_use]
    pub fn ipl(&self) -> u8 {
        self.owners
            .iter()
            .rposition(Option::is_some)
            .map_or(0, |level| level as u8)
    }

    /// Raise a source. Returns false if its level is programmed to 0.
    pub fn raise(&mut self, source: InterruptSource) -> bool {
        let level = self.level(source);
        if level == 0 {
            return false;
        }
        let displaced = self.owners[usize::from(level)].replace(source);
        self.states[source.index()] = LineState::Asserted;
        if let Some(previous) = displaced {
            // A source that lost its last level has nothing left to acknowledge.
            if previous != source && !self.owners.contains(&Some(previous)) {
                self.states[previous.index()] = LineState::Idle;
            }
        }
        true
    }

    /// Clear every level currently driven by `source`.
    pub fn acknowledge(&mut self, source: InterruptSource) {
        for owner in &mut self.owners {
            if *owner == Some(source) {
                *owner = None;
            }
        }
        let state = &mut self.states[source.index()];
        if *state == LineState::Asserted {
            *state = LineState::Acknowledged;
        }
    }

    /// True while the given target is held in reset.
    #[must_use]
    pub fn reset_held(&self, target: ResetTarget) -> bool {
        match target {
            ResetTarget::SoundCpu => self.sound_held,
            ResetTarget::SlaveAndMcu => self.slave_held,
        }
    }

    /// Drive a reset output. Returns the action if the line changed.
    pub fn reset_control(&mut self, target: ResetTarget, held: bool) -> Option<C148Action> {
        if self.role != Role::Master {
            return None;
        }
        let line = match target {
            ResetTarget::SoundCpu => &mut self.sound_held,
            ResetTarget::SlaveAndMcu => &mut self.slave_held,
        };
        if *line == held {
            return None;
        }
        *line = held;
        debug!(
            "C148 reset {target:?} {}",
            if held { "asserted" } else { "released" }
        );
        Some(C148Action::ResetLine { target, held })
    }

    pub fn watchdog_kick(&mut self) {
        self.watchdog.frames_since_kick = 0;
    }

    /// Count one frame without a kick. Returns true once the window is
    /// exceeded; the counter restarts so the caller resets once.
    pub fn watchdog_tick(&mut self) -> bool {
        let Some(limit) = self.watchdog.limit else {
            return false;
        };
        self.watchdog.frames_since_kick += 1;
        if self.watchdog.frames_since_kick > limit {
            self.watchdog.frames_since_kick = 0;
            return true;
        }
        false
    }

    /// Register read. `offset` is relative to the start of the C148 window.
    ///
    /// Reads of the acknowledge registers acknowledge, as the hardware
    /// decodes the address without looking at R/W.
    pub fn read(&mut self, offset: u32) -> u16 {
        let reg = register_index(offset);
        match reg {
            REG_EEPROM_READY => EEPROM_READY,
            r if (REG_ACK_BASE..REG_ACK_BASE + 5).contains(&r) => {
                self.acknowledge(InterruptSource::ALL[r - REG_ACK_BASE]);
                self.registers[r]
            }
            _ => self.registers[reg],
        }
    }

    /// Register write. `offset` is relative to the start of the C148 window.
    pub fn write(&mut self, offset: u32, data: u16) -> Option<C148Action> {
        let reg = register_index(offset);
        let data = data & 0x07;
        self.registers[reg] = data;
        match reg {
            REG_TRIGGER_PEER => Some(C148Action::TriggerPeerCpuIrq),
            r if (REG_ACK_BASE..REG_ACK_BASE + 5).contains(&r) => {
                self.acknowledge(InterruptSource::ALL[r - REG_ACK_BASE]);
                None
            }
            REG_SOUND_RESET => self.reset_control(ResetTarget::SoundCpu, (data & 0x01) == 0),
            REG_SLAVE_RESET => self.reset_control(ResetTarget::SlaveAndMcu, (data & 0x01) == 0),
            REG_WATCHDOG => {
                self.watchdog_kick();
                None
            }
            _ => None,
        }
    }
}

fn register_index(offset: u32) -> usize {
    ((offset >> 13) & 0x1F) as usize
}

impl Observable for C148 {
    fn query(&self, path: &str) -> Option<Value> {
        if let Some(name) = path.strip_prefix("level.") {
            let source = source_by_name(name)?;
            return Some(self.level(source).into());
        }
        if let Some(name) = path.strip_prefix("state.") {
            let source = source_by_name(name)?;
            return Some(self.line_state(source).name().into());
        }
        match path {
            "ipl" => Some(self.ipl().into()),
            "reset.sound" => Some(self.sound_held.into()),
            "reset.slave" => Some(self.slave_held.into()),
            "watchdog" => Some(self.watchdog.frames_since_kick.into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "ipl",
            "level.cpuirq",
            "level.exirq",
            "level.posirq",
            "level.scirq",
            "level.vblank",
            "state.cpuirq",
            "state.exirq",
            "state.posirq",
            "state.scirq",
            "state.vblank",
            "reset.sound",
            "reset.slave",
            "watchdog",
        ]
    }
}

fn source_by_name(name: &str) -> Option<InterruptSource> {
    InterruptSource::ALL.into_iter().find(|s| s.name() == name)
}
