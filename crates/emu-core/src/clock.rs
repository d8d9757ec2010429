//! Master clock configuration.

use crate::Ticks;

/// Master clock configuration for a board.
///
/// Every processor on the board runs at an integer division of this
/// crystal. Scheduling budgets are computed in master ticks and converted
/// per processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MasterClock {
    /// Crystal frequency in Hz (e.g. `49_152_000` for System 2).
    pub frequency_hz: u64,
}

impl MasterClock {
    #[must_use]
    pub const fn new(frequency_hz: u64) -> Self {
        Self { frequency_hz }
    }

    /// Ticks per frame at the given frame rate (integer division).
    #[must_use]
    pub const fn ticks_per_frame(&self, frames_per_second: u64) -> Ticks {
        Ticks::new(self.frequency_hz / frames_per_second)
    }

    /// Ticks per scheduling slice when a frame is cut into `slices`.
    #[must_use]
    pub const fn ticks_per_slice(&self, frames_per_second: u64, slices: u64) -> Ticks {
        Ticks::new(self.frequency_hz / frames_per_second / slices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_budget_divides_frame() {
        let clock = MasterClock::new(49_152_000);
        assert_eq!(clock.ticks_per_frame(60).get(), 819_200);
        assert_eq!(clock.ticks_per_slice(60, 100).get(), 8_192);
    }
}
