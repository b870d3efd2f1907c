//! `StochasticStepper` — discrete-time binomial simulation.
//!
//! Each step of length `dt`:
//!
//! ```text
//! seed day(t) if newly entered
//! record y if t is a whole day
//! rates   = proportion rates → mobility mixing        (same as the ODE path)
//! amounts ~ Binomial(floor(source), 1 - exp(-dt · rate))
//! y      += flux(amounts)
//! ```
//!
//! Draws happen in a fixed order from one seeded [`SimRng`], so a given seed
//! always reproduces the same trajectory.

use em_core::{CompartmentState, SimRng};
use em_params::{ParameterTensor, SliceMode};
use em_seeding::{IncidenceAccumulator, SeedingSchedule, SeedingTracker};
use em_transitions::{assemble_flux, stochastic_amounts};
use tracing::{debug, info};

use crate::driver::{check_incidence_shape, check_state_shape, enforce_non_negative};
use crate::rhs::{RhsScratch, check_param_rows};
use crate::{Model, NonNegativity, SimError, SimResult, SolveObserver, Trajectory};

pub struct StochasticStepper {
    model:          Model,
    steps_per_day:  usize,
    seed:           u64,
    slice_mode:     SliceMode,
    non_negativity: NonNegativity,
    tracker:        SeedingTracker,
}

impl StochasticStepper {
    /// `dt` is rounded so that a whole number of steps makes up one day.
    ///
    /// # Errors
    ///
    /// [`SimError::Config`] unless `0 < dt <= 1`.
    pub fn new(model: Model, dt: f64, seed: u64) -> SimResult<Self> {
        if !dt.is_finite() || dt <= 0.0 || dt > 1.0 {
            return Err(SimError::Config(format!("stochastic dt must be in (0, 1], got {dt}")));
        }
        Ok(Self {
            model,
            steps_per_day:  (1.0 / dt).round().max(1.0) as usize,
            seed,
            slice_mode:     SliceMode::Step,
            non_negativity: NonNegativity::Ignore,
            tracker:        SeedingTracker::new(),
        })
    }

    pub fn slice_mode(mut self, mode: SliceMode) -> Self {
        self.slice_mode = mode;
        self
    }

    pub fn non_negativity(mut self, policy: NonNegativity) -> Self {
        self.non_negativity = policy;
        self
    }

    /// Seed for the next [`run`](Self::run).
    pub fn reseed(&mut self, seed: u64) {
        self.seed = seed;
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    /// The step length actually used.
    pub fn dt(&self) -> f64 {
        1.0 / self.steps_per_day as f64
    }

    /// Simulate `days` days from `y0`, recording the state at days
    /// `0, 1, …, days`.
    pub fn run<O: SolveObserver>(
        &mut self,
        y0:            &CompartmentState,
        params:        &ParameterTensor,
        schedule:      &SeedingSchedule,
        days:          usize,
        mut incidence: Option<&mut IncidenceAccumulator>,
        observer:      &mut O,
    ) -> SimResult<Trajectory> {
        let model = &self.model;
        let nodes = model.nodes();
        check_state_shape(model, y0)?;
        check_param_rows(model, params)?;
        schedule.validate(model.compartments(), nodes)?;
        if let Some(acc) = incidence.as_deref() {
            check_incidence_shape(model, acc)?;
        }

        let tm = params.to_time_major(nodes)?;
        let mut slice = tm.empty_slice();
        let mut scratch = RhsScratch::new(model);
        let mut flux = vec![0.0; model.state_len()];
        let mut rng = SimRng::new(self.seed);
        let dt = self.dt();

        self.tracker.reset();
        let mut y = y0.as_slice().to_vec();
        let mut trajectory = Trajectory::with_capacity(days + 1, model.compartments(), nodes);

        info!(days, dt, seed = self.seed, nodes, "stochastic run started");
        observer.on_solve_start(0.0, days as f64);

        let total_steps = days * self.steps_per_day;
        for step in 0..=total_steps {
            let t = step as f64 * dt;
            match self.tracker.apply_tracked(t, &mut y, nodes, schedule, incidence.as_deref_mut()) {
                Some((day, applied)) if applied > 0 => {
                    debug!(%day, applied, "seeding applied");
                    observer.on_seeding(day, applied);
                }
                _ => {}
            }
            if step % self.steps_per_day == 0 {
                let whole_day = (step / self.steps_per_day) as f64;
                trajectory.push(whole_day, &y);
                observer.on_output(whole_day, &y);
            }
            if step == total_steps {
                break;
            }

            tm.slice_into(t, self.slice_mode, &mut slice);
            scratch.mixed_rates_for(model, &y, &slice);
            let (source, rates, amounts) = scratch.amount_buffers();
            stochastic_amounts(source, rates, dt, &mut rng, amounts);
            assemble_flux(amounts, model.table(), model.compartments(), nodes, &mut flux);
            for (v, f) in y.iter_mut().zip(&flux) {
                *v += f;
            }
            enforce_non_negative(self.non_negativity, t + dt, &mut y, nodes)?;
        }

        observer.on_solve_end(days as f64);
        info!(outputs = trajectory.len(), "stochastic run finished");
        Ok(trajectory)
    }
}
