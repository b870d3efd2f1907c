//! Unit tests for em-seeding.

use em_core::{CompartmentId, CompartmentState, Day, NodeId};

use crate::{
    IncidenceAccumulator, SeedingError, SeedingEvent, SeedingSchedule, SeedingScheduleBuilder,
    SeedingTracker, apply_seeding,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

const S: CompartmentId = CompartmentId(0);
const E: CompartmentId = CompartmentId(1);

fn event(node: u32, amount: f64) -> SeedingEvent {
    SeedingEvent { node: NodeId(node), source: S, destination: E, amount }
}

/// One event on day 2 moving 10 from S to E at node 0.
fn day_two_schedule() -> SeedingSchedule {
    let mut b = SeedingScheduleBuilder::new();
    b.add(Day(2), event(0, 10.0));
    b.build().unwrap()
}

// ── Schedule ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod schedule {
    use super::*;

    #[test]
    fn builder_groups_by_day() {
        let mut b = SeedingScheduleBuilder::new();
        b.add(Day(3), event(1, 1.0));
        b.add(Day(0), event(0, 2.0));
        b.add(Day(3), event(0, 3.0));
        assert_eq!(b.event_count(), 3);
        let s = b.build().unwrap();

        assert_eq!(s.days(), 4);
        assert_eq!(s.event_count(), 3);
        assert_eq!(s.events_on(Day(0)), &[event(0, 2.0)]);
        assert!(s.events_on(Day(1)).is_empty());
        // same-day events keep insertion order
        assert_eq!(s.events_on(Day(3)), &[event(1, 1.0), event(0, 3.0)]);
        assert_eq!(s.active_days().collect::<Vec<_>>(), vec![Day(0), Day(3)]);
    }

    #[test]
    fn out_of_range_days_are_empty() {
        let s = day_two_schedule();
        assert!(s.events_on(Day(-1)).is_empty());
        assert!(s.events_on(Day(3)).is_empty());
        assert!(s.events_on(Day(1_000)).is_empty());
        assert!(SeedingSchedule::empty().events_on(Day(0)).is_empty());
    }

    #[test]
    fn negative_day_rejected() {
        let mut b = SeedingScheduleBuilder::new();
        b.add(Day(-2), event(0, 1.0));
        assert!(matches!(b.build(), Err(SeedingError::NegativeDay(Day(-2)))));
    }

    #[test]
    fn invalid_amount_rejected() {
        let mut b = SeedingScheduleBuilder::new();
        b.add(Day(1), event(0, -4.0));
        assert!(matches!(b.build(), Err(SeedingError::InvalidAmount { day: Day(1), .. })));

        let mut b = SeedingScheduleBuilder::new();
        b.add(Day(1), event(0, f64::NAN));
        assert!(matches!(b.build(), Err(SeedingError::InvalidAmount { .. })));
    }

    #[test]
    fn from_parts_checks_pointer() {
        assert!(matches!(
            SeedingSchedule::from_parts(vec![0, 1, 0], vec![event(0, 1.0)]),
            Err(SeedingError::DayPointer(2))
        ));
        assert!(matches!(
            SeedingSchedule::from_parts(vec![0, 2], vec![event(0, 1.0)]),
            Err(SeedingError::Core(_))
        ));
        let s = SeedingSchedule::from_parts(vec![0, 0, 0, 1], vec![event(0, 10.0)]).unwrap();
        assert_eq!(s, day_two_schedule());
    }

    #[test]
    fn validate_checks_indices() {
        let s = day_two_schedule();
        assert!(s.validate(2, 1).is_ok());
        assert!(matches!(s.validate(1, 1), Err(SeedingError::Core(_))));
        assert!(matches!(s.validate(2, 0), Err(SeedingError::Core(_))));
    }
}

// ── Applicator ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod apply {
    use super::*;

    #[test]
    fn source_clamps_destination_gets_full_amount() {
        let mut state = CompartmentState::from_rows(&[vec![5.0], vec![0.0]]).unwrap();
        let applied = apply_seeding(&mut state, Day(2), &day_two_schedule(), None);
        assert_eq!(applied, 1);
        assert_eq!(state.get(S, NodeId(0)), 0.0);
        assert_eq!(state.get(E, NodeId(0)), 10.0);
    }

    #[test]
    fn sufficient_source_is_reduced_exactly() {
        let mut state = CompartmentState::from_rows(&[vec![25.0], vec![1.0]]).unwrap();
        apply_seeding(&mut state, Day(2), &day_two_schedule(), None);
        assert_eq!(state.as_slice(), &[15.0, 11.0]);
    }

    #[test]
    fn other_days_are_no_ops() {
        let mut state = CompartmentState::from_rows(&[vec![5.0], vec![0.0]]).unwrap();
        let before = state.clone();
        for day in [Day(-1), Day(0), Day(1), Day(3), Day(40)] {
            assert_eq!(apply_seeding(&mut state, day, &day_two_schedule(), None), 0);
        }
        assert_eq!(state, before);
    }

    #[test]
    fn raw_applicator_is_not_idempotent() {
        let mut state = CompartmentState::from_rows(&[vec![50.0], vec![0.0]]).unwrap();
        let s = day_two_schedule();
        apply_seeding(&mut state, Day(2), &s, None);
        apply_seeding(&mut state, Day(2), &s, None);
        assert_eq!(state.as_slice(), &[30.0, 20.0]);
    }

    #[test]
    fn incidence_records_applied_amount() {
        let mut state = CompartmentState::from_rows(&[vec![5.0, 0.0], vec![0.0, 0.0]]).unwrap();
        let mut acc = IncidenceAccumulator::new(4, 2, 2);
        apply_seeding(&mut state, Day(2), &day_two_schedule(), Some(&mut acc));
        assert_eq!(acc.get(Day(2), E, NodeId(0)), 10.0);
        assert_eq!(acc.get(Day(2), S, NodeId(0)), 0.0);
        assert_eq!(acc.day_block(Day(2)), Some(&[0.0, 0.0, 10.0, 0.0][..]));
        assert_eq!(acc.as_slice().iter().sum::<f64>(), 10.0);
    }

    #[test]
    fn short_accumulator_drops_late_days() {
        let mut state = CompartmentState::from_rows(&[vec![5.0], vec![0.0]]).unwrap();
        let mut acc = IncidenceAccumulator::new(2, 2, 1);
        apply_seeding(&mut state, Day(2), &day_two_schedule(), Some(&mut acc));
        assert_eq!(state.get(E, NodeId(0)), 10.0);
        assert!(acc.as_slice().iter().all(|&v| v == 0.0));
        assert_eq!(acc.day_block(Day(2)), None);
    }

    #[test]
    fn clear_zeroes_accumulator() {
        let mut state = CompartmentState::from_rows(&[vec![5.0], vec![0.0]]).unwrap();
        let mut acc = IncidenceAccumulator::new(3, 2, 1);
        apply_seeding(&mut state, Day(2), &day_two_schedule(), Some(&mut acc));
        acc.clear();
        assert_eq!(acc.days(), 3);
        assert!(acc.as_slice().iter().all(|&v| v == 0.0));
    }
}

// ── Tracker ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tracker {
    use super::*;

    #[test]
    fn applies_once_per_day() {
        let s = day_two_schedule();
        let mut y = vec![50.0, 0.0];
        let mut tracker = SeedingTracker::new();

        assert_eq!(tracker.apply_tracked(2.0, &mut y, 1, &s, None), Some((Day(2), 1)));
        assert_eq!(tracker.apply_tracked(2.0, &mut y, 1, &s, None), None);
        assert_eq!(tracker.apply_tracked(2.5, &mut y, 1, &s, None), None);
        assert_eq!(tracker.apply_tracked(2.25, &mut y, 1, &s, None), None);
        assert_eq!(y, vec![40.0, 10.0]);
    }

    #[test]
    fn reports_entered_days_without_events() {
        let s = day_two_schedule();
        let mut y = vec![50.0, 0.0];
        let mut tracker = SeedingTracker::new();
        assert_eq!(tracker.apply_tracked(0.5, &mut y, 1, &s, None), Some((Day(0), 0)));
        assert_eq!(tracker.last_day(), Some(Day(0)));
    }

    #[test]
    fn time_just_below_boundary_counts_as_next_day() {
        let s = day_two_schedule();
        let mut y = vec![50.0, 0.0];
        let mut tracker = SeedingTracker::new();
        tracker.apply_tracked(1.5, &mut y, 1, &s, None);
        assert_eq!(tracker.apply_tracked(2.0 - 1e-12, &mut y, 1, &s, None), Some((Day(2), 1)));
    }

    #[test]
    fn reset_allows_reapplication() {
        let s = day_two_schedule();
        let mut y = vec![50.0, 0.0];
        let mut tracker = SeedingTracker::new();
        tracker.apply_tracked(2.0, &mut y, 1, &s, None);
        tracker.reset();
        assert_eq!(tracker.last_day(), None);
        tracker.apply_tracked(2.0, &mut y, 1, &s, None);
        assert_eq!(y, vec![30.0, 20.0]);
    }
}
