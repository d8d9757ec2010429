mod common;

use std::cell::Cell;
use std::rc::Rc;

use common::{Event, Programs, c148, count, first, machine, program};
use emu_core::{Observable, Value};
use machine_namco_system2::bus::line;
use machine_namco_system2::{Processor, System2Config};
use namco_c148::{InterruptSource, LineState};

/// Master program that sets the VBLANK level, releases the slave/MCU pair
/// on its slice `release_at`, and acknowledges VBLANK whenever it is
/// presented.
fn master_releasing_slave(trace: &common::Trace, release_at: u32) -> common::Program {
    let trace = Rc::clone(trace);
    program(move |bus, slice| {
        if slice == 0 {
            bus.write_word(c148::VBLANK_LEVEL, 4);
        }
        if bus.interrupt_level() == 4 {
            bus.read_word(c148::ACK_VBLANK);
            trace.borrow_mut().push(Event::Note("vblank ack"));
        }
        if slice == release_at {
            bus.write_word(c148::SLAVE_RESET, 1);
        }
    })
}

#[test]
fn released_processor_runs_before_the_next_vblank_ack() {
    let trace = common::Trace::default();
    let programs = Programs {
        master: master_releasing_slave(&trace, 10),
        ..Programs::default()
    };
    let mut system = machine_namco_system2::System2::new(
        System2Config::default(),
        common::cpu_set(&trace, programs),
    )
    .expect("valid config");

    for _ in 0..10 {
        system.run_slice();
    }
    assert_eq!(count(&trace, &Event::Execute("slave")), 0);
    assert_eq!(count(&trace, &Event::Execute("mcu")), 0);
    assert!(system.is_held(Processor::Slave));

    system.run_frame();
    system.run_slice();
    let released = first(&trace, &Event::Reset("slave", false)).expect("slave released");
    let slave_ran = first(&trace, &Event::Execute("slave")).expect("slave ran");
    let acked = first(&trace, &Event::Note("vblank ack")).expect("vblank acknowledged");
    assert!(released < slave_ran);
    assert!(slave_ran < acked);

    // The release ended the master's slice and the slave ran in the same one.
    let events = trace.borrow();
    let master_slice = events[..released]
        .iter()
        .rposition(|e| *e == Event::Execute("master"))
        .expect("master ran");
    assert!(events[master_slice..slave_ran].iter().all(|e| *e != Event::Execute("sound")));
    assert_eq!(system.query("held.mcu"), Some(Value::Bool(false)));
}

#[test]
fn held_processors_consume_no_cycles() {
    let (mut system, trace) = machine(System2Config::default(), Programs::default());
    system.run_frame();
    assert_eq!(system.scheduler().cycles(Processor::Slave), 0);
    assert_eq!(system.scheduler().cycles(Processor::Sound), 0);
    assert_eq!(system.scheduler().cycles(Processor::Master), 100 * 2_048);
    assert_eq!(count(&trace, &Event::Execute("master")), 100);
    assert_eq!(system.query("held.slave"), Some(Value::Bool(true)));
    assert_eq!(system.query("frame"), Some(Value::U64(1)));
}

#[test]
fn sound_cpu_gets_two_irqs_and_two_firqs_per_frame() {
    let programs = Programs {
        master: program(|bus, slice| {
            if slice == 0 {
                bus.write_word(c148::SOUND_RESET, 1);
            }
        }),
        ..Programs::default()
    };
    let (mut system, trace) = machine(System2Config::default(), programs);
    system.run_frame();

    assert!(!system.is_held(Processor::Sound));
    assert_eq!(count(&trace, &Event::Line("sound", line::SOUND_IRQ, true)), 2);
    assert_eq!(count(&trace, &Event::Line("sound", line::SOUND_FIRQ, true)), 2);
    assert_eq!(count(&trace, &Event::Line("sound", line::SOUND_IRQ, false)), 2);
    assert_eq!(count(&trace, &Event::Execute("sound")), 100);
}

#[test]
fn vblank_is_presented_to_the_68000_after_the_frame() {
    let (mut system, trace) = {
        let trace = common::Trace::default();
        let programs = Programs {
            master: master_releasing_slave(&trace, u32::MAX),
            ..Programs::default()
        };
        let system = machine_namco_system2::System2::new(
            System2Config::default(),
            common::cpu_set(&trace, programs),
        )
        .expect("valid config");
        (system, trace)
    };

    system.run_frame();
    assert_eq!(system.c148(Processor::Master).map(|c| c.ipl()), Some(4));
    assert_eq!(system.c148(Processor::Slave).map(|c| c.ipl()), Some(0));
    assert!(first(&trace, &Event::Line("master", 4, true)).is_none());

    // Next slice: the level is driven, the program acknowledges, and the
    // slice after that drops it.
    system.run_slice();
    system.run_slice();
    let raised = first(&trace, &Event::Line("master", 4, true)).expect("ipl driven");
    let dropped = first(&trace, &Event::Line("master", 4, false)).expect("ipl dropped");
    assert!(raised < dropped);
    assert_eq!(count(&trace, &Event::Note("vblank ack")), 1);
}

#[test]
fn position_irq_fires_when_the_raster_reaches_the_line() {
    let programs = Programs {
        master: program(|bus, slice| {
            if slice == 0 {
                bus.write_word(c148::POSIRQ_LEVEL, 2);
                // Palette control register 5.
                bus.write_word(0x44_300A, 131);
            }
        }),
        ..Programs::default()
    };
    let (mut system, _) = machine(System2Config::default(), programs);
    let posirq = |system: &machine_namco_system2::System2| {
        system
            .c148(Processor::Master)
            .map(|c| c.line_state(InterruptSource::PosIrq))
    };

    for _ in 0..49 {
        system.run_slice();
    }
    assert_eq!(posirq(&system), Some(LineState::Idle));
    system.run_slice();
    assert_eq!(posirq(&system), Some(LineState::Asserted));
    assert_eq!(system.c148(Processor::Master).map(|c| c.ipl()), Some(2));
}

#[test]
fn watchdog_expiry_resets_the_machine() {
    let mut config = System2Config::default();
    config.settings.watchdog_frames = Some(2);
    let (mut system, trace) = machine(config, Programs::default());
    let resets_at_start = count(&trace, &Event::Reset("master", true));

    system.run_frame();
    system.run_frame();
    assert_eq!(system.watchdog_resets(), 0);
    system.run_frame();
    assert_eq!(system.watchdog_resets(), 1);
    assert_eq!(count(&trace, &Event::Reset("master", true)), resets_at_start + 1);
    assert!(system.is_held(Processor::Slave));
}

#[test]
fn kicked_watchdog_never_fires() {
    let mut config = System2Config::default();
    config.settings.watchdog_frames = Some(2);
    let programs = Programs {
        master: program(|bus, _| bus.write_word(c148::WATCHDOG, 0)),
        ..Programs::default()
    };
    let (mut system, _) = machine(config, programs);
    for _ in 0..10 {
        system.run_frame();
    }
    assert_eq!(system.watchdog_resets(), 0);
}

#[test]
fn disabled_watchdog_never_fires() {
    let mut config = System2Config::default();
    config.settings.watchdog_frames = None;
    let (mut system, _) = machine(config, Programs::default());
    for _ in 0..5 {
        system.run_frame();
    }
    assert_eq!(system.watchdog_resets(), 0);
    assert_eq!(system.frame_count(), 5);
}

#[test]
fn peer_interrupt_crosses_between_the_68000s() {
    let seen = Rc::new(Cell::new(0u8));
    let seen_by_slave = Rc::clone(&seen);
    let programs = Programs {
        master: program(|bus, slice| match slice {
            0 => bus.write_word(c148::SLAVE_RESET, 1),
            2 => bus.write_word(c148::TRIGGER_PEER, 0),
            _ => {}
        }),
        slave: program(move |bus, slice| {
            if slice == 0 {
                bus.write_word(c148::CPUIRQ_LEVEL, 5);
            }
            let level = bus.interrupt_level();
            if level != 0 {
                seen_by_slave.set(level);
                bus.read_word(c148::ACK_CPUIRQ);
            }
        }),
        ..Programs::default()
    };
    let (mut system, _) = machine(System2Config::default(), programs);
    for _ in 0..4 {
        system.run_slice();
    }
    assert_eq!(seen.get(), 5);
    assert_eq!(system.c148(Processor::Slave).map(|c| c.ipl()), Some(0));
}
