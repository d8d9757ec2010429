//! Top-level System 2 machine.
//!
//! The machine owns every buffer and chip on the board; the CPU cores are
//! supplied by the caller through the [`CpuSet`]. Everything runs on one
//! thread, one slice at a time.

use std::path::Path;

use emu_core::{Observable, Value};
use log::{info, warn};
use namco_c148::C148;
use namco_system2_video::{FrameBuffer, RozGeometry, System2Video, VideoConfig};

use crate::board::Board;
use crate::bus::CpuBus;
use crate::config::{BoardProfile, BoardSettings, Processor, System2Config};
use crate::eeprom;
use crate::error::System2Error;
use crate::io::InputPorts;
use crate::memory::{RegionId, SharedRegion, SharedRegions};
use crate::scheduler::{CpuSet, Scheduler};
use crate::sound::SoundPorts;

/// Namco System 2 board.
pub struct System2 {
    settings: BoardSettings,
    profile: BoardProfile,
    board: Board,
    cpus: CpuSet,
    scheduler: Scheduler,
    watchdog_resets: u64,
}

impl System2 {
    /// Build a board and hold it in reset state.
    ///
    /// # Errors
    ///
    /// Returns an error if a ROZ plane's tile map is not a square
    /// power-of-two grid.
    pub fn new(config: System2Config, cpus: CpuSet) -> Result<Self, System2Error> {
        let System2Config {
            settings,
            roms,
            gfx,
        } = config;
        let profile = settings.variant.profile();

        let roz_planes = profile
            .roz
            .iter()
            .enumerate()
            .map(|(plane, window)| {
                RozGeometry::from_ram_bytes(window.map_bytes).ok_or(System2Error::RozRamSize {
                    plane,
                    bytes: window.map_bytes,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let video = System2Video::new(
            VideoConfig {
                priority_levels: profile.priority_levels,
                sprite_layout: profile.sprite_layout,
                roz_planes,
                roz_priority: profile.roz_priority,
                orientation: settings.orientation,
            },
            gfx,
        );

        let regions = SharedRegions::new(&profile, roms);
        let board = Board::new(&profile, regions, video, settings.watchdog_frames);
        info!(
            "System 2 {:?} board: {} priority levels, {} ROZ plane(s), {} slices/frame",
            profile.variant,
            profile.priority_levels,
            profile.roz.len(),
            settings.slices_per_frame
        );

        let mut system = Self {
            scheduler: Scheduler::new(settings.slices_per_frame),
            settings,
            profile,
            board,
            cpus,
            watchdog_resets: 0,
        };
        system.reset();
        Ok(system)
    }

    /// Full machine reset: the master restarts, everything else is held
    /// until the master C148 releases it.
    pub fn reset(&mut self) {
        self.board.reset();
        self.scheduler.reset();
        let master = self.cpus.get_mut(Processor::Master);
        master.set_reset_line(true);
        master.set_reset_line(false);
        for processor in [Processor::Slave, Processor::Sound, Processor::Mcu] {
            self.cpus.get_mut(processor).set_reset_line(true);
        }
    }

    /// Run one scheduler slice. Returns true when it completed a frame.
    pub fn run_slice(&mut self) -> bool {
        let outcome = self.scheduler.run_slice(&mut self.cpus, &mut self.board);
        if outcome.watchdog_expired {
            warn!(
                "watchdog expired in frame {}; resetting the machine",
                self.scheduler.frames()
            );
            self.watchdog_resets += 1;
            self.reset();
        }
        outcome.frame_complete
    }

    /// Run to the end of the current frame.
    pub fn run_frame(&mut self) {
        while !self.run_slice() {}
    }

    #[must_use]
    pub fn settings(&self) -> &BoardSettings {
        &self.settings
    }

    #[must_use]
    pub fn profile(&self) -> &BoardProfile {
        &self.profile
    }

    #[must_use]
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Completed frames.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.scheduler.frames()
    }

    /// Machine resets caused by the watchdog.
    #[must_use]
    pub fn watchdog_resets(&self) -> u64 {
        self.watchdog_resets
    }

    #[must_use]
    pub fn video(&self) -> &System2Video {
        &self.board.video
    }

    #[must_use]
    pub fn frame(&self) -> &FrameBuffer {
        self.board.video.frame()
    }

    /// Last composited frame, ARGB8888, as shown on the cabinet screen:
    /// 288x224, or 224x288 when the orientation swaps the axes.
    #[must_use]
    pub fn framebuffer(&self) -> &[u32] {
        self.board.video.frame().pixels()
    }

    #[must_use]
    pub fn framebuffer_width(&self) -> u32 {
        self.board.video.frame().width() as u32
    }

    #[must_use]
    pub fn framebuffer_height(&self) -> u32 {
        self.board.video.frame().height() as u32
    }

    /// Interrupt controller of a 68000; `None` for the 8-bit processors.
    #[must_use]
    pub fn c148(&self, processor: Processor) -> Option<&C148> {
        match processor {
            Processor::Master => Some(&self.board.c148[0]),
            Processor::Slave => Some(&self.board.c148[1]),
            Processor::Sound | Processor::Mcu => None,
        }
    }

    /// True while `processor` is held in reset.
    #[must_use]
    pub fn is_held(&self, processor: Processor) -> bool {
        self.board.is_held(processor)
    }

    #[must_use]
    pub fn region(&self, id: RegionId) -> &SharedRegion {
        self.board.regions.get(id)
    }

    pub fn region_mut(&mut self, id: RegionId) -> &mut SharedRegion {
        self.board.regions.get_mut(id)
    }

    /// A processor's view of the board, for debuggers and tests. Accesses
    /// have the same side effects as the CPU's own.
    pub fn bus(&mut self, processor: Processor) -> CpuBus<'_> {
        CpuBus::new(&mut self.board, processor)
    }

    #[must_use]
    pub fn inputs(&self) -> &InputPorts {
        &self.board.io.inputs
    }

    pub fn inputs_mut(&mut self) -> &mut InputPorts {
        &mut self.board.io.inputs
    }

    #[must_use]
    pub fn sound(&self) -> &SoundPorts {
        &self.board.sound
    }

    #[must_use]
    pub fn eeprom(&self) -> &[u8] {
        self.region(RegionId::Eeprom).as_slice()
    }

    /// Restore EEPROM contents from a raw image.
    ///
    /// # Errors
    ///
    /// Returns an error if the image is not exactly the EEPROM size.
    pub fn load_eeprom(&mut self, image: &[u8]) -> Result<(), System2Error> {
        eeprom::load(self.region_mut(RegionId::Eeprom), image)
    }

    pub fn load_eeprom_file(&mut self, path: &Path) -> Result<(), System2Error> {
        eeprom::load_file(self.region_mut(RegionId::Eeprom), path)
    }

    pub fn save_eeprom_file(&self, path: &Path) -> Result<(), System2Error> {
        eeprom::save_file(self.region(RegionId::Eeprom), path)
    }
}

fn processor_by_name(name: &str) -> Option<Processor> {
    Processor::ALL.into_iter().find(|p| p.name() == name)
}

impl Observable for System2 {
    fn query(&self, path: &str) -> Option<Value> {
        if let Some(rest) = path.strip_prefix("master.") {
            return self.board.c148[0].query(rest);
        }
        if let Some(rest) = path.strip_prefix("slave.") {
            return self.board.c148[1].query(rest);
        }
        if let Some(rest) = path.strip_prefix("mcu.") {
            return self.board.io.query(rest);
        }
        if let Some(name) = path.strip_prefix("held.") {
            return processor_by_name(name).map(|p| self.is_held(p).into());
        }
        if let Some(name) = path.strip_prefix("cycles.") {
            return processor_by_name(name).map(|p| self.scheduler.cycles(p).into());
        }
        match path {
            "frame" => Some(self.scheduler.frames().into()),
            "slice" => Some(self.scheduler.slice().into()),
            "scanline" => Some(self.scheduler.scanline().into()),
            "sprite_bank" => Some(self.board.video.sprite_bank().0.into()),
            "visible_pens" => Some((self.board.video.visible_pen_count() as u32).into()),
            "watchdog_resets" => Some(self.watchdog_resets.into()),
            "sound.bank" => Some(self.board.sound.bank().into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "frame",
            "slice",
            "scanline",
            "sprite_bank",
            "visible_pens",
            "watchdog_resets",
            "sound.bank",
            "held.<processor>",
            "cycles.<processor>",
            "master.<c148_paths>",
            "slave.<c148_paths>",
            "mcu.port_d",
            "mcu.adc.control",
            "mcu.adc.data",
            "mcu.adc.complete",
        ]
    }
}
