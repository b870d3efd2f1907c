//! Seeding applicator.

use em_core::{CompartmentState, Day};

use crate::{IncidenceAccumulator, SeedingSchedule};

/// Apply every event scheduled for `day` to `state`, returning the number of
/// events applied.
///
/// Each event removes `amount` from its source (clamped at 0) and adds the
/// full `amount` to its destination and, if given, to `incidence`.  Calling
/// this twice for the same day applies the events twice; use
/// [`SeedingTracker`](crate::SeedingTracker) for once-per-day semantics.
pub fn apply_seeding(
    state:     &mut CompartmentState,
    day:       Day,
    schedule:  &SeedingSchedule,
    incidence: Option<&mut IncidenceAccumulator>,
) -> usize {
    let nodes = state.nodes();
    apply_seeding_slice(state.as_mut_slice(), nodes, day, schedule, incidence)
}

/// [`apply_seeding`] on a flattened compartment-major state vector.
pub fn apply_seeding_slice(
    state:     &mut [f64],
    nodes:     usize,
    day:       Day,
    schedule:  &SeedingSchedule,
    mut incidence: Option<&mut IncidenceAccumulator>,
) -> usize {
    let events = schedule.events_on(day);
    for e in events {
        let src = e.source.index() * nodes + e.node.index();
        state[src] = (state[src] - e.amount).max(0.0);
        let dst = e.destination.index() * nodes + e.node.index();
        state[dst] += e.amount;
        if let Some(acc) = incidence.as_deref_mut() {
            acc.add(day, e.destination, e.node, e.amount);
        }
    }
    events.len()
}
