//! Board state shared by the four processors.

use namco_c148::{C148, InterruptSource, ResetTarget, Role};
use namco_system2_video::System2Video;

use crate::address_map::{self, AddressMap};
use crate::config::{BoardProfile, Processor};
use crate::io::{McuIo, SerialControl};
use crate::memory::{RegionId, SharedRegions};
use crate::sound::SoundPorts;

/// Everything the CPUs reach through their buses.
pub struct Board {
    pub(crate) regions: SharedRegions,
    pub(crate) maps: [AddressMap; 4],
    /// Master and slave controllers.
    pub(crate) c148: [C148; 2],
    pub(crate) video: System2Video,
    pub(crate) sound: SoundPorts,
    pub(crate) io: McuIo,
    pub(crate) serial: SerialControl,
    pub(crate) key: [u16; 8],
    /// Interrupt lines to pulse on each processor's next slice.
    pub(crate) pulses: [u8; 4],
    /// Reset line changes not yet applied to the CPUs.
    pub(crate) pending_resets: Vec<(ResetTarget, bool)>,
    /// Set when the running processor must end its slice early.
    pub(crate) yield_requested: bool,
}

impl Board {
    #[must_use]
    pub(crate) fn new(
        profile: &BoardProfile,
        regions: SharedRegions,
        video: System2Video,
        watchdog_frames: Option<u32>,
    ) -> Self {
        Self {
            regions,
            maps: Processor::ALL.map(|p| address_map::build(p, profile)),
            c148: [
                C148::with_watchdog(Role::Master, watchdog_frames),
                C148::with_watchdog(Role::Slave, watchdog_frames),
            ],
            video,
            sound: SoundPorts::new(),
            io: McuIo::new(),
            serial: SerialControl::default(),
            key: [0; 8],
            pulses: [0; 4],
            pending_resets: Vec::new(),
            yield_requested: false,
        }
    }

    /// Power-on state of the chips. Memory contents survive, as on the
    /// real board.
    pub(crate) fn reset(&mut self) {
        for c148 in &mut self.c148 {
            c148.reset();
        }
        self.sound = SoundPorts::new();
        self.io.reset();
        self.pulses = [0; 4];
        self.pending_resets.clear();
        self.yield_requested = false;
    }

    /// True while `processor` is held in reset by the master C148.
    #[must_use]
    pub fn is_held(&self, processor: Processor) -> bool {
        match processor {
            Processor::Master => false,
            Processor::Slave | Processor::Mcu => self.c148[0].reset_held(ResetTarget::SlaveAndMcu),
            Processor::Sound => self.c148[0].reset_held(ResetTarget::SoundCpu),
        }
    }

    /// Raise a source on both 68000 controllers.
    pub(crate) fn raise_all(&mut self, source: InterruptSource) {
        for c148 in &mut self.c148 {
            c148.raise(source);
        }
    }

    pub(crate) fn pulse(&mut self, processor: Processor, line: u8) {
        self.pulses[processor.index()] |= 1 << line;
    }

    /// Composite the current frame from sprite and ROZ RAM.
    pub(crate) fn render(&mut self) {
        let roz1 = self.regions.get(RegionId::Roz1).as_slice();
        let roz2 = self.regions.get(RegionId::Roz2).as_slice();
        let planes = [roz1, roz2];
        let count = self.video.roz_plane_count().min(planes.len());
        let sprite_ram = self.regions.get(RegionId::SpriteRam).as_slice();
        self.video.render_frame(sprite_ram, &planes[..count]);
    }
}
