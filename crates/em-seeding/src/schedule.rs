//! Seeding schedule and builder.
//!
//! # Data layout
//!
//! Events are stored contiguously, grouped by day, with a CSR-style pointer
//! array.  The events of day `d` occupy:
//!
//! ```text
//! events[ day_ptr[d] .. day_ptr[d+1] ]
//! ```
//!
//! Days with no events have an empty range, so lookup is O(1) regardless of
//! how sparse the schedule is.

use em_core::{CompartmentId, CoreError, Day, NodeId};

use crate::{SeedingError, SeedingResult};

/// Move `amount` people from `source` to `destination` at `node`.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SeedingEvent {
    pub node:        NodeId,
    pub source:      CompartmentId,
    pub destination: CompartmentId,
    pub amount:      f64,
}

// ── SeedingSchedule ───────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SeedingSchedule {
    /// Length = `days + 1`.  Empty for a schedule with no days.
    day_ptr: Vec<u32>,
    events:  Vec<SeedingEvent>,
}

impl SeedingSchedule {
    /// A schedule with no events.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Wrap precomputed CSR arrays.
    ///
    /// # Errors
    ///
    /// [`SeedingError::DayPointer`] if `day_ptr` does not start at 0 or
    /// decreases; a shape error if its last entry is not `events.len()`;
    /// [`SeedingError::InvalidAmount`] for negative or non-finite amounts.
    pub fn from_parts(day_ptr: Vec<u32>, events: Vec<SeedingEvent>) -> SeedingResult<Self> {
        if day_ptr.is_empty() {
            if !events.is_empty() {
                return Err(CoreError::ShapeMismatch {
                    what:     "seeding day pointer",
                    expected: 1,
                    got:      0,
                }
                .into());
            }
            return Ok(Self::empty());
        }
        if day_ptr[0] != 0 {
            return Err(SeedingError::DayPointer(0));
        }
        for (i, w) in day_ptr.windows(2).enumerate() {
            if w[0] > w[1] {
                return Err(SeedingError::DayPointer(i + 1));
            }
        }
        let last = day_ptr[day_ptr.len() - 1] as usize;
        if last != events.len() {
            return Err(CoreError::ShapeMismatch {
                what:     "seeding events",
                expected: last,
                got:      events.len(),
            }
            .into());
        }

        let schedule = Self { day_ptr, events };
        for d in 0..schedule.days() {
            let day = Day(d as i64);
            for e in schedule.events_on(day) {
                check_amount(day, e.amount)?;
            }
        }
        Ok(schedule)
    }

    /// Number of days covered (the last day with an event, plus one).
    pub fn days(&self) -> usize {
        self.day_ptr.len().saturating_sub(1)
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events scheduled for `day`.  Empty for negative days and days past
    /// the end of the schedule.
    #[inline]
    pub fn events_on(&self, day: Day) -> &[SeedingEvent] {
        match day.index() {
            Some(d) if d < self.days() => {
                let start = self.day_ptr[d] as usize;
                let end   = self.day_ptr[d + 1] as usize;
                &self.events[start..end]
            }
            _ => &[],
        }
    }

    /// Days that carry at least one event, in order.
    pub fn active_days(&self) -> impl Iterator<Item = Day> + '_ {
        self.day_ptr
            .windows(2)
            .enumerate()
            .filter(|(_, w)| w[1] > w[0])
            .map(|(d, _)| Day(d as i64))
    }

    /// Fail if any event names a compartment or node outside the model.
    pub fn validate(&self, compartments: usize, nodes: usize) -> SeedingResult<()> {
        for e in &self.events {
            for c in [e.source, e.destination] {
                if c.index() >= compartments {
                    return Err(CoreError::IndexOutOfRange {
                        what:  "seeding compartment",
                        index: c.index(),
                        bound: compartments,
                    }
                    .into());
                }
            }
            if e.node.index() >= nodes {
                return Err(CoreError::IndexOutOfRange {
                    what:  "seeding node",
                    index: e.node.index(),
                    bound: nodes,
                }
                .into());
            }
        }
        Ok(())
    }
}

fn check_amount(day: Day, amount: f64) -> SeedingResult<()> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(SeedingError::InvalidAmount { day, amount });
    }
    Ok(())
}

// ── SeedingScheduleBuilder ────────────────────────────────────────────────────

/// Collect events in any order, then [`build`](Self::build) the day CSR.
///
/// # Example
///
/// ```
/// use em_core::{CompartmentId, Day, NodeId};
/// use em_seeding::{SeedingEvent, SeedingScheduleBuilder};
///
/// let mut b = SeedingScheduleBuilder::new();
/// b.add(Day(2), SeedingEvent {
///     node:        NodeId(0),
///     source:      CompartmentId(0),
///     destination: CompartmentId(1),
///     amount:      10.0,
/// });
/// let schedule = b.build().unwrap();
/// assert_eq!(schedule.days(), 3);
/// assert_eq!(schedule.events_on(Day(2)).len(), 1);
/// assert!(schedule.events_on(Day(1)).is_empty());
/// ```
#[derive(Default)]
pub struct SeedingScheduleBuilder {
    events: Vec<(Day, SeedingEvent)>,
}

impl SeedingScheduleBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, day: Day, event: SeedingEvent) {
        self.events.push((day, event));
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// Events on the same day keep their insertion order.
    pub fn build(self) -> SeedingResult<SeedingSchedule> {
        let mut raw = self.events;
        for (day, e) in &raw {
            if day.index().is_none() {
                return Err(SeedingError::NegativeDay(*day));
            }
            check_amount(*day, e.amount)?;
        }
        raw.sort_by_key(|(day, _)| *day);

        let days = raw.last().map_or(0, |(day, _)| day.0 as usize + 1);
        let mut day_ptr = vec![0u32; days + 1];
        for (day, _) in &raw {
            day_ptr[day.0 as usize + 1] += 1;
        }
        for i in 1..=days {
            day_ptr[i] += day_ptr[i - 1];
        }
        let events = raw.into_iter().map(|(_, e)| e).collect();
        SeedingSchedule::from_parts(day_ptr, events)
    }
}
