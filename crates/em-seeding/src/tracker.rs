//! `SeedingTracker` — once-per-day guard around the seeding applicator.
//!
//! An integrator evaluates its right-hand side many times per simulated day,
//! often at times that step backwards within the day.  The tracker remembers
//! the last day it applied and only applies again once `day_of(t)` differs.
//!
//! ```text
//! None ──enter(t)──▶ Some(day_of(t)) ──enter(t') with a different day──▶ Some(day_of(t'))
//!   ▲                                                                          │
//!   └──────────────────────────────── reset() ─────────────────────────────────┘
//! ```

use em_core::{Day, day_of};

use crate::{IncidenceAccumulator, SeedingSchedule, apply_seeding_slice};

#[derive(Clone, Debug, Default)]
pub struct SeedingTracker {
    last_day: Option<Day>,
}

impl SeedingTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the last applied day.  Call before every fresh integration.
    pub fn reset(&mut self) {
        self.last_day = None;
    }

    pub fn last_day(&self) -> Option<Day> {
        self.last_day
    }

    /// Record `t`'s day.  Returns it if it differs from the last one seen.
    pub fn enter(&mut self, t: f64) -> Option<Day> {
        let day = day_of(t);
        if self.last_day == Some(day) {
            return None;
        }
        self.last_day = Some(day);
        Some(day)
    }

    /// Apply the seeding of `t`'s day if that day has not been applied yet.
    ///
    /// Returns `Some((day, events_applied))` when a new day was entered,
    /// even if that day had no events.
    pub fn apply_tracked(
        &mut self,
        t:         f64,
        state:     &mut [f64],
        nodes:     usize,
        schedule:  &SeedingSchedule,
        incidence: Option<&mut IncidenceAccumulator>,
    ) -> Option<(Day, usize)> {
        let day = self.enter(t)?;
        Some((day, apply_seeding_slice(state, nodes, day, schedule, incidence)))
    }
}
