//! Cooperative slice scheduler.
//!
//! A frame is split into a fixed number of slices. In each slice the four
//! processors run in turn (master, slave, sound, MCU) for their share of
//! the master clock, so memory accesses of two processors never interleave
//! inside a slice. A processor held in reset is skipped. When a register
//! write releases a reset line the writer's slice ends early and the
//! change is applied at once, so the released processor runs later in the
//! same slice.

use emu_core::{Bus, Cpu, MasterClock, Ticks};
use log::trace;
use namco_c148::{InterruptSource, ResetTarget};

use crate::board::Board;
use crate::bus::{CpuBus, line};
use crate::config::{FRAME_RATE, MASTER_CLOCK_HZ, Processor};

/// Raster lines per frame, visible and blanking.
pub const SCANLINES_PER_FRAME: u32 = 262;

/// The four CPU cores.
pub struct CpuSet {
    pub master: Box<dyn Cpu>,
    pub slave: Box<dyn Cpu>,
    pub sound: Box<dyn Cpu>,
    pub mcu: Box<dyn Cpu>,
}

impl CpuSet {
    pub fn get_mut(&mut self, processor: Processor) -> &mut dyn Cpu {
        match processor {
            Processor::Master => self.master.as_mut(),
            Processor::Slave => self.slave.as_mut(),
            Processor::Sound => self.sound.as_mut(),
            Processor::Mcu => self.mcu.as_mut(),
        }
    }
}

/// Result of one slice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SliceOutcome {
    /// The slice was the last of its frame.
    pub frame_complete: bool,
    /// A C148 watchdog ran out at the end of the frame.
    pub watchdog_expired: bool,
}

pub struct Scheduler {
    slices_per_frame: u32,
    slice: u32,
    slice_ticks: Ticks,
    frames: u64,
    /// IPL currently driven into each 68000.
    driven_ipl: [u8; 2],
    /// Cycles each processor has executed, for state queries.
    cycles: [u64; 4],
}

impl Scheduler {
    #[must_use]
    pub fn new(slices_per_frame: u32) -> Self {
        let slices_per_frame = slices_per_frame.max(1);
        Self {
            slices_per_frame,
            slice: 0,
            slice_ticks: MasterClock::new(MASTER_CLOCK_HZ)
                .ticks_per_slice(FRAME_RATE, u64::from(slices_per_frame)),
            frames: 0,
            driven_ipl: [0; 2],
            cycles: [0; 4],
        }
    }

    #[must_use]
    pub fn slices_per_frame(&self) -> u32 {
        self.slices_per_frame
    }

    /// Slice index within the current frame.
    #[must_use]
    pub fn slice(&self) -> u32 {
        self.slice
    }

    /// Completed frames.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Raster line reached at the start of the current slice.
    #[must_use]
    pub fn scanline(&self) -> u32 {
        self.slice * SCANLINES_PER_FRAME / self.slices_per_frame
    }

    /// Cycle budget of one slice for `processor`.
    #[must_use]
    pub fn budget(&self, processor: Processor) -> u32 {
        self.slice_ticks.cycles_at(processor.clock_divisor())
    }

    #[must_use]
    pub fn cycles(&self, processor: Processor) -> u64 {
        self.cycles[processor.index()]
    }

    /// Restart the frame. The frame counter keeps running.
    pub fn reset(&mut self) {
        self.slice = 0;
        self.driven_ipl = [0; 2];
    }

    /// Run every processor for one slice, then advance the raster.
    pub(crate) fn run_slice(&mut self, cpus: &mut CpuSet, board: &mut Board) -> SliceOutcome {
        self.schedule_sound_pulses(board);

        for processor in Processor::ALL {
            apply_resets(cpus, board);
            if board.is_held(processor) {
                board.pulses[processor.index()] = 0;
                continue;
            }
            let cpu = cpus.get_mut(processor);
            let pulsed = self.drive_interrupts(processor, cpu, board);

            board.yield_requested = false;
            let budget = self.budget(processor);
            let used = cpu.execute(&mut CpuBus::new(board, processor), budget);
            self.cycles[processor.index()] += u64::from(used);
            if board.yield_requested {
                trace!("{} yielded after {used} of {budget} cycles", processor.name());
            }

            release_pulses(processor, pulsed, cpu, board);
        }
        apply_resets(cpus, board);

        let previous = self.scanline();
        self.slice += 1;
        self.check_position_irq(previous, board);

        if self.slice < self.slices_per_frame {
            return SliceOutcome::default();
        }
        self.slice = 0;
        self.frames += 1;
        SliceOutcome {
            frame_complete: true,
            watchdog_expired: end_of_frame(board),
        }
    }

    /// Sound IRQ twice per frame, FIRQ at 120 Hz between them.
    fn schedule_sound_pulses(&self, board: &mut Board) {
        let n = self.slices_per_frame;
        let at = |fraction: u32| self.slice == n * fraction / 4;
        if at(0) || at(2) {
            board.pulse(Processor::Sound, line::SOUND_IRQ);
        }
        if at(1) || at(3) {
            board.pulse(Processor::Sound, line::SOUND_FIRQ);
        }
    }

    /// Present pending interrupts to `cpu`. Returns the pulsed lines.
    fn drive_interrupts(&mut self, processor: Processor, cpu: &mut dyn Cpu, board: &mut Board) -> u8 {
        if processor.is_68000() {
            let index = processor.index();
            let ipl = CpuBus::new(board, processor).interrupt_level();
            let driven = &mut self.driven_ipl[index];
            if ipl != *driven {
                if *driven != 0 {
                    cpu.set_interrupt_line(*driven, false);
                }
                if ipl != 0 {
                    cpu.set_interrupt_line(ipl, true);
                }
                *driven = ipl;
            }
            return 0;
        }
        let pending = board.pulses[processor.index()];
        for line in (0..8).filter(|&l| pending & (1 << l) != 0) {
            cpu.set_interrupt_line(line, true);
        }
        pending
    }

    /// POSIRQ fires when the raster crosses the line held in palette
    /// control register 5. Line 0 never matches.
    fn check_position_irq(&self, previous: u32, board: &mut Board) {
        let target = u32::from(board.video.palette().control(5) & 0x01FF);
        let current = self.scanline();
        if previous < target && target <= current {
            board.raise_all(InterruptSource::PosIrq);
        }
    }
}

/// Deassert the lines pulsed for this slice. Pulses requested while it ran
/// (the A/D interrupt) wait for the next one.
fn release_pulses(processor: Processor, pulsed: u8, cpu: &mut dyn Cpu, board: &mut Board) {
    for line in (0..8).filter(|&l| pulsed & (1 << l) != 0) {
        cpu.set_interrupt_line(line, false);
    }
    board.pulses[processor.index()] &= !pulsed;
}

/// Forward reset-line changes from the master C148 to the CPU cores.
fn apply_resets(cpus: &mut CpuSet, board: &mut Board) {
    for (target, held) in board.pending_resets.drain(..) {
        let processors: &[Processor] = match target {
            ResetTarget::SoundCpu => &[Processor::Sound],
            ResetTarget::SlaveAndMcu => &[Processor::Slave, Processor::Mcu],
        };
        for &processor in processors {
            cpus.get_mut(processor).set_reset_line(held);
        }
    }
}

/// VBLANK: composite, interrupt everyone, count the watchdogs.
fn end_of_frame(board: &mut Board) -> bool {
    board.render();
    board.raise_all(InterruptSource::VBlank);
    board.pulse(Processor::Mcu, line::MCU_IRQ);

    let master_expired = board.c148[0].watchdog_tick();
    let slave_expired = !board.is_held(Processor::Slave) && board.c148[1].watchdog_tick();
    master_expired || slave_expired
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budgets_follow_clock_divisors() {
        let scheduler = Scheduler::new(100);
        assert_eq!(scheduler.budget(Processor::Master), 2_048);
        assert_eq!(scheduler.budget(Processor::Sound), 512);
        assert_eq!(scheduler.budget(Processor::Mcu), 341);
    }

    #[test]
    fn scanline_advances_with_slices() {
        let mut scheduler = Scheduler::new(100);
        assert_eq!(scheduler.scanline(), 0);
        scheduler.slice = 50;
        assert_eq!(scheduler.scanline(), 131);
    }

    #[test]
    fn zero_slices_is_clamped() {
        assert_eq!(Scheduler::new(0).slices_per_frame(), 1);
    }
}
