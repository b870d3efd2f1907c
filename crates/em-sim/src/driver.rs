//! `Integrator` — the fast-path ODE driver.
//!
//! # Solve loop
//!
//! ```text
//! precompute time-major parameters (+ deltas) once
//! reset seeding tracker
//! breakpoints = output times ∪ whole days inside the span
//!
//! t = t0:  seed day(t0); record if output
//! for each next breakpoint b:
//!   ① integrate y from t to b            (Euler / RK4 / Dormand–Prince)
//!   ② non-negativity policy at b
//!   ③ seed day(b) if newly entered       (SeedingTracker)
//!   ④ record y if b is an output time
//! ```
//!
//! Seeding therefore only ever happens at a segment boundary, never inside a
//! solver step, and each output includes the seeding of its own day.
//!
//! A segment never spans more than one day.  In `SliceMode::Step` every
//! stage of a segment reads the frame of the day the segment starts in, so
//! a stage evaluated exactly at the closing whole day still sees that day's
//! parameters rather than the next one's.

use std::cell::Cell;

use em_core::{CompartmentState, CoreError, Day, day_of, most_negative_in};
use em_params::SliceMode;
use em_params::ParameterTensor;
use em_seeding::{IncidenceAccumulator, SeedingSchedule, SeedingTracker};
use tracing::{debug, info, warn};

use crate::rhs::{RhsScratch, check_param_rows, core_rhs};
use crate::solver::{DormandPrince, FixedScheme, FixedStepper, FnSystem, OdeSystem};
use crate::{
    IntegrationMethod, Model, NonNegativity, SimError, SimResult, SolveObserver, SolverConfig,
    Trajectory,
};

// ── Integrator ────────────────────────────────────────────────────────────────

/// Deterministic integrator for one [`Model`].
///
/// Owns the seeding tracker, which every [`solve`](Self::solve) resets, so an
/// `Integrator` can be reused for repeated runs with different inputs.
pub struct Integrator {
    model:   Model,
    config:  SolverConfig,
    tracker: SeedingTracker,
}

impl Integrator {
    /// # Errors
    ///
    /// [`SimError::StochasticInContinuousPath`] for a stochastic amount
    /// policy; [`SimError::Config`] for a non-positive `dt` or invalid
    /// adaptive tolerances.
    pub fn new(model: Model, config: SolverConfig) -> SimResult<Self> {
        config.validate()?;
        Ok(Self { model, config, tracker: SeedingTracker::new() })
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Integrate from `y0` and record the state at every time in `times`.
    ///
    /// `times` must be finite and non-decreasing; integration starts at
    /// `times[0]`.  Seeding applied along the way is added to `incidence`
    /// when one is supplied.
    pub fn solve<O: SolveObserver>(
        &mut self,
        y0:            &CompartmentState,
        params:        &ParameterTensor,
        schedule:      &SeedingSchedule,
        times:         &[f64],
        mut incidence: Option<&mut IncidenceAccumulator>,
        observer:      &mut O,
    ) -> SimResult<Trajectory> {
        let model = &self.model;
        let compartments = model.compartments();
        let nodes = model.nodes();

        check_state_shape(model, y0)?;
        check_param_rows(model, params)?;
        schedule.validate(compartments, nodes)?;
        check_times(times)?;
        if let Some(acc) = incidence.as_deref() {
            check_incidence_shape(model, acc)?;
        }

        let tm = params.to_time_major(nodes)?.with_deltas();
        let mode = self.config.slice_mode;
        let mut slice = tm.empty_slice();
        let mut scratch = RhsScratch::new(model);
        let mut evaluations = 0usize;
        let segment_day = Cell::new(Day(0));
        let mut loaded: Option<Day> = None;
        let mut system = FnSystem::new(model.state_len(), |t: f64, y: &[f64], dydt: &mut [f64]| {
            evaluations += 1;
            match mode {
                SliceMode::Step => {
                    let day = segment_day.get();
                    if loaded != Some(day) {
                        tm.slice_into(day.start_time(), mode, &mut slice);
                        loaded = Some(day);
                    }
                }
                SliceMode::Linear => tm.slice_into(t, mode, &mut slice),
            }
            core_rhs(model, t, y, &slice, &mut scratch, dydt);
            Ok(())
        });
        let mut stepper = Stepper::new(self.config.method, system.ndim());

        self.tracker.reset();
        let mut y = y0.as_slice().to_vec();
        let breakpoints = breakpoints(times);
        let mut trajectory = Trajectory::with_capacity(times.len(), compartments, nodes);
        let mut next_out = 0;

        let t0 = times[0];
        let t_end = times[times.len() - 1];
        info!(
            t0,
            t_end,
            compartments,
            nodes,
            transitions = model.transitions(),
            segments = breakpoints.len() - 1,
            method = ?self.config.method,
            "solve started"
        );
        observer.on_solve_start(t0, t_end);

        let mut t = t0;
        seed(&mut self.tracker, t, &mut y, nodes, schedule, incidence.as_deref_mut(), observer);
        next_out = record(t, &y, times, next_out, &mut trajectory, observer);

        for &b in &breakpoints[1..] {
            segment_day.set(day_of(t));
            let steps = stepper.integrate(&mut system, &mut y, t, b)?;
            debug!(from = t, to = b, steps, "segment integrated");
            t = b;
            enforce_non_negative(self.config.non_negativity, t, &mut y, nodes)?;
            seed(&mut self.tracker, t, &mut y, nodes, schedule, incidence.as_deref_mut(), observer);
            next_out = record(t, &y, times, next_out, &mut trajectory, observer);
        }
        drop(system);

        observer.on_solve_end(t_end);
        info!(outputs = trajectory.len(), evaluations, "solve finished");
        Ok(trajectory)
    }
}

// ── Steppers ──────────────────────────────────────────────────────────────────

enum Stepper {
    Fixed(FixedStepper),
    Adaptive(DormandPrince),
}

impl Stepper {
    fn new(method: IntegrationMethod, ndim: usize) -> Self {
        match method {
            IntegrationMethod::Euler { dt } => {
                Stepper::Fixed(FixedStepper::new(FixedScheme::Euler, dt, ndim))
            }
            IntegrationMethod::Rk4 { dt } => {
                Stepper::Fixed(FixedStepper::new(FixedScheme::Rk4, dt, ndim))
            }
            IntegrationMethod::Adaptive(opts) => Stepper::Adaptive(DormandPrince::new(opts, ndim)),
        }
    }

    fn integrate<S: OdeSystem>(&mut self, sys: &mut S, y: &mut [f64], t0: f64, t1: f64) -> SimResult<usize> {
        match self {
            Stepper::Fixed(s) => s.integrate(sys, y, t0, t1),
            Stepper::Adaptive(s) => s.integrate(sys, y, t0, t1),
        }
    }
}

// ── Segment helpers ───────────────────────────────────────────────────────────

/// Output times plus every whole day strictly inside `(t0, t_end)`, sorted
/// and deduplicated.
pub(crate) fn breakpoints(times: &[f64]) -> Vec<f64> {
    let t0 = times[0];
    let t_end = times[times.len() - 1];
    let mut points = times.to_vec();
    let mut d = t0.floor() + 1.0;
    while d < t_end {
        points.push(d);
        d += 1.0;
    }
    points.sort_by(f64::total_cmp);
    points.dedup();
    points
}

fn seed<O: SolveObserver>(
    tracker:   &mut SeedingTracker,
    t:         f64,
    y:         &mut [f64],
    nodes:     usize,
    schedule:  &SeedingSchedule,
    incidence: Option<&mut IncidenceAccumulator>,
    observer:  &mut O,
) {
    match tracker.apply_tracked(t, y, nodes, schedule, incidence) {
        Some((day, applied)) if applied > 0 => {
            debug!(%day, applied, "seeding applied");
            observer.on_seeding(day, applied);
        }
        _ => {}
    }
}

/// Record every output time equal to `t`; returns the next pending index.
fn record<O: SolveObserver>(
    t:          f64,
    y:          &[f64],
    times:      &[f64],
    mut next:   usize,
    trajectory: &mut Trajectory,
    observer:   &mut O,
) -> usize {
    while next < times.len() && times[next] == t {
        trajectory.push(t, y);
        observer.on_output(t, y);
        next += 1;
    }
    next
}

pub(crate) fn enforce_non_negative(
    policy: NonNegativity,
    t:      f64,
    y:      &mut [f64],
    nodes:  usize,
) -> SimResult<()> {
    if policy == NonNegativity::Ignore {
        return Ok(());
    }
    let Some((compartment, node, value)) = most_negative_in(y, nodes) else {
        return Ok(());
    };
    match policy {
        NonNegativity::Ignore => {}
        NonNegativity::Warn => {
            warn!(time = t, %compartment, %node, value, "negative state");
        }
        NonNegativity::Clamp => {
            warn!(time = t, %compartment, %node, value, "negative state clamped to zero");
            for v in y.iter_mut().filter(|v| **v < 0.0) {
                *v = 0.0;
            }
        }
        NonNegativity::Abort => {
            return Err(SimError::NegativeState { time: t, compartment, node, value });
        }
    }
    Ok(())
}

// ── Input checks ──────────────────────────────────────────────────────────────

pub(crate) fn check_state_shape(model: &Model, y0: &CompartmentState) -> SimResult<()> {
    if y0.compartments() != model.compartments() {
        return Err(CoreError::ShapeMismatch {
            what:     "initial state compartments",
            expected: model.compartments(),
            got:      y0.compartments(),
        }
        .into());
    }
    if y0.nodes() != model.nodes() {
        return Err(CoreError::ShapeMismatch {
            what:     "initial state nodes",
            expected: model.nodes(),
            got:      y0.nodes(),
        }
        .into());
    }
    Ok(())
}

pub(crate) fn check_incidence_shape(model: &Model, acc: &IncidenceAccumulator) -> SimResult<()> {
    if acc.compartments() != model.compartments() || acc.nodes() != model.nodes() {
        return Err(CoreError::ShapeMismatch {
            what:     "incidence accumulator",
            expected: model.state_len(),
            got:      acc.compartments() * acc.nodes(),
        }
        .into());
    }
    Ok(())
}

fn check_times(times: &[f64]) -> SimResult<()> {
    if times.is_empty() {
        return Err(SimError::Config("no output times requested".into()));
    }
    if times.iter().any(|t| !t.is_finite()) {
        return Err(SimError::Config("output times must be finite".into()));
    }
    if times.windows(2).any(|w| w[1] < w[0]) {
        return Err(SimError::Config("output times must be non-decreasing".into()));
    }
    Ok(())
}
