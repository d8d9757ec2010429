use namco_c148::{C148, InterruptSource, LineState, Role};
use proptest::prelude::*;

fn controller_with_levels(levels: [u8; 5]) -> C148 {
    let mut c148 = C148::new(Role::Master);
    for (source, level) in InterruptSource::ALL.into_iter().zip(levels) {
        c148.set_level(source, level);
    }
    c148
}

#[test]
fn raise_then_acknowledge_clears_line() {
    let mut c148 = controller_with_levels([0, 0, 0, 0, 6]);
    assert!(c148.raise(InterruptSource::VBlank));
    assert_eq!(c148.ipl(), 6);
    c148.acknowledge(InterruptSource::VBlank);
    assert_eq!(c148.ipl(), 0);
}

#[test]
fn same_level_is_last_write_wins() {
    let mut c148 = controller_with_levels([4, 0, 4, 0, 0]);
    c148.raise(InterruptSource::CpuIrq);
    c148.raise(InterruptSource::PosIrq);

    // CPUIRQ lost the level to POSIRQ, so its ack leaves the line up.
    c148.acknowledge(InterruptSource::CpuIrq);
    assert_eq!(c148.ipl(), 4);

    c148.acknowledge(InterruptSource::PosIrq);
    assert_eq!(c148.ipl(), 0);
}

#[test]
fn ack_of_one_source_keeps_other_level_pending() {
    let mut c148 = controller_with_levels([0, 0, 2, 0, 5]);
    c148.raise(InterruptSource::PosIrq);
    c148.raise(InterruptSource::VBlank);
    assert_eq!(c148.ipl(), 5);

    c148.acknowledge(InterruptSource::VBlank);
    assert_eq!(c148.ipl(), 2);
    assert_eq!(c148.line_state(InterruptSource::PosIrq), LineState::Asserted);
}

#[test]
fn reprogrammed_level_applies_to_next_raise() {
    let mut c148 = controller_with_levels([0, 0, 0, 0, 3]);
    c148.raise(InterruptSource::VBlank);
    c148.set_level(InterruptSource::VBlank, 6);
    assert_eq!(c148.ipl(), 3);
    c148.raise(InterruptSource::VBlank);
    assert_eq!(c148.ipl(), 6);
    c148.acknowledge(InterruptSource::VBlank);
    assert_eq!(c148.ipl(), 0);
}

fn source() -> impl Strategy<Value = InterruptSource> {
    (0usize..5).prop_map(|i| InterruptSource::ALL[i])
}

proptest! {
    #[test]
    fn ipl_is_highest_unacknowledged_owner(
        levels in proptest::array::uniform5(0u8..8),
        ops in proptest::collection::vec((source(), any::<bool>()), 0..40),
    ) {
        let mut c148 = controller_with_levels(levels);
        let mut owners: [Option<InterruptSource>; 8] = [None; 8];
        for (source, raise) in ops {
            if raise {
                let level = c148.level(source);
                c148.raise(source);
                if level != 0 {
                    owners[usize::from(level)] = Some(source);
                }
            } else {
                c148.acknowledge(source);
                for owner in &mut owners {
                    if *owner == Some(source) {
                        *owner = None;
                    }
                }
            }
            let expected = owners.iter().rposition(Option::is_some).map_or(0, |l| l as u8);
            prop_assert_eq!(c148.ipl(), expected);
            for source in InterruptSource::ALL {
                prop_assert_eq!(
                    c148.line_state(source) == LineState::Asserted,
                    owners.contains(&Some(source)),
                    "{:?}", source
                );
            }
        }
    }

    #[test]
    fn acknowledging_every_source_clears_the_line(
        levels in proptest::array::uniform5(0u8..8),
        raised in proptest::collection::vec(source(), 0..20),
    ) {
        let mut c148 = controller_with_levels(levels);
        for source in raised {
            c148.raise(source);
        }
        for source in InterruptSource::ALL {
            c148.acknowledge(source);
        }
        prop_assert_eq!(c148.ipl(), 0);
    }
}
