//! Simulation time model.
//!
//! # Design
//!
//! Continuous time `t: f64` is measured in simulated days from the start of
//! the run.  Discrete events (seeding, step-mode parameter changes) are keyed
//! by the integer `Day` containing `t`:
//!
//!   day = floor(t + DAY_EPSILON)
//!
//! The epsilon absorbs floating-point drift that lands a solver time value a
//! hair below an integer boundary (e.g. `2.9999999999` after many RK4 steps of
//! `dt = 0.1`), which would otherwise delay a day's events by one whole day.

use std::fmt;

/// Tolerance added before flooring a continuous time to its day.
pub const DAY_EPSILON: f64 = 1e-9;

/// The integer day containing continuous time `t`.
#[inline]
pub fn day_of(t: f64) -> Day {
    Day((t + DAY_EPSILON).floor() as i64)
}

// ── Day ───────────────────────────────────────────────────────────────────────

/// An integer simulated day.  Signed so that times before the start of the
/// run map to a day that simply has no events.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Day(pub i64);

impl Day {
    pub const ZERO: Day = Day(0);

    /// Row index for day-indexed tables, or `None` for negative days.
    #[inline]
    pub fn index(self) -> Option<usize> {
        usize::try_from(self.0).ok()
    }

    /// The continuous time at which this day starts.
    #[inline]
    pub fn start_time(self) -> f64 {
        self.0 as f64
    }

    #[inline]
    pub fn next(self) -> Day {
        Day(self.0 + 1)
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "day {}", self.0)
    }
}
