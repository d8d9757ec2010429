//! Scripted CPU cores for driving the board without instruction sets.
//!
//! Each fake runs a closure once per slice against its bus and records
//! what the scheduler did to it in a trace shared by all four.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use emu_core::{Bus, Cpu};
use machine_namco_system2::{CpuSet, System2, System2Config};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Execute(&'static str),
    Reset(&'static str, bool),
    Line(&'static str, u8, bool),
    Note(&'static str),
}

pub type Trace = Rc<RefCell<Vec<Event>>>;

/// Slice body. Receives the bus and the 0-based count of slices this core
/// has run.
pub type Program = Box<dyn FnMut(&mut dyn Bus, u32)>;

pub struct FakeCpu {
    name: &'static str,
    trace: Trace,
    program: Program,
    slices: u32,
}

impl Cpu for FakeCpu {
    fn execute(&mut self, bus: &mut dyn Bus, cycles: u32) -> u32 {
        self.trace.borrow_mut().push(Event::Execute(self.name));
        (self.program)(bus, self.slices);
        self.slices += 1;
        if bus.yield_requested() { cycles / 2 } else { cycles }
    }

    fn set_interrupt_line(&mut self, line: u8, asserted: bool) {
        self.trace.borrow_mut().push(Event::Line(self.name, line, asserted));
    }

    fn set_reset_line(&mut self, asserted: bool) {
        self.trace.borrow_mut().push(Event::Reset(self.name, asserted));
    }

    fn pc(&self) -> u32 {
        0
    }
}

pub fn program(body: impl FnMut(&mut dyn Bus, u32) + 'static) -> Program {
    Box::new(body)
}

pub fn idle() -> Program {
    program(|_, _| {})
}

fn fake(name: &'static str, trace: &Trace, program: Program) -> Box<dyn Cpu> {
    Box::new(FakeCpu {
        name,
        trace: Rc::clone(trace),
        program,
        slices: 0,
    })
}

/// Programs for the four cores, idle unless set.
pub struct Programs {
    pub master: Program,
    pub slave: Program,
    pub sound: Program,
    pub mcu: Program,
}

impl Default for Programs {
    fn default() -> Self {
        Self {
            master: idle(),
            slave: idle(),
            sound: idle(),
            mcu: idle(),
        }
    }
}

pub fn cpu_set(trace: &Trace, programs: Programs) -> CpuSet {
    CpuSet {
        master: fake("master", trace, programs.master),
        slave: fake("slave", trace, programs.slave),
        sound: fake("sound", trace, programs.sound),
        mcu: fake("mcu", trace, programs.mcu),
    }
}

/// Build a machine and the trace its cores write to.
pub fn machine(config: System2Config, programs: Programs) -> (System2, Trace) {
    let trace = Trace::default();
    let system = System2::new(config, cpu_set(&trace, programs)).expect("valid config");
    (system, trace)
}

pub fn idle_machine(config: System2Config) -> System2 {
    machine(config, Programs::default()).0
}

/// Position of the first event matching `event`.
pub fn first(trace: &Trace, event: &Event) -> Option<usize> {
    trace.borrow().iter().position(|e| e == event)
}

pub fn count(trace: &Trace, event: &Event) -> usize {
    trace.borrow().iter().filter(|e| *e == event).count()
}

/// Master C148 register addresses.
pub mod c148 {
    pub const CPUIRQ_LEVEL: u32 = 0x1C_6000;
    pub const POSIRQ_LEVEL: u32 = 0x1C_A000;
    pub const VBLANK_LEVEL: u32 = 0x1C_E000;
    pub const TRIGGER_PEER: u32 = 0x1D_4000;
    pub const ACK_CPUIRQ: u32 = 0x1D_6000;
    pub const ACK_VBLANK: u32 = 0x1D_E000;
    pub const SOUND_RESET: u32 = 0x1E_2000;
    pub const SLAVE_RESET: u32 = 0x1E_4000;
    pub const WATCHDOG: u32 = 0x1E_6000;
}
