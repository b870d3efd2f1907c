//! Right-hand-side assembly.
//!
//! # Two paths
//!
//! ```text
//! core_rhs(model, t, y, slice, scratch, dydt)      pure; parameters already sliced
//!   ① proportion rates        em_transitions::compute_proportion_rates
//!   ② mobility mixing         MobilityMixer::mix_all
//!   ③ deterministic amounts   source × mixed rate
//!   ④ flux                    em_transitions::assemble_flux
//!
//! GenericRhs::evaluate(t, y, params, incidence)     convenience path
//!   seeding (once per day) → to_time_major → slice → core_rhs
//! ```
//!
//! The integrator uses `core_rhs` directly with a slice refilled in place, so
//! the parameter tensor is reshaped once per solve rather than once per call.

use em_core::{CoreError, Day};
use em_params::{ParamSlice, ParameterTensor, SliceMode};
use em_seeding::{IncidenceAccumulator, SeedingSchedule, SeedingTracker};
use em_transitions::{RateBuffers, assemble_flux, compute_proportion_rates};

use crate::driver::check_incidence_shape;
use crate::{Model, SimError, SimResult};

// ── RhsScratch ────────────────────────────────────────────────────────────────

/// Buffers reused across evaluations.  Contents carry no meaning between
/// calls.
#[derive(Clone, Debug)]
pub struct RhsScratch {
    rates:       RateBuffers,
    rate_params: Vec<f64>,
    mixed:       Vec<f64>,
    amounts:     Vec<f64>,
}

impl RhsScratch {
    pub fn new(model: &Model) -> Self {
        let len = model.transitions() * model.nodes();
        Self {
            rates:       RateBuffers::new(model.table(), model.nodes()),
            rate_params: vec![0.0; len],
            mixed:       vec![0.0; len],
            amounts:     vec![0.0; len],
        }
    }

    /// Mixed per-capita rates from the last evaluation (`Tn × N`).
    pub fn mixed_rates(&self) -> &[f64] {
        &self.mixed
    }

    /// Per-transition amounts from the last evaluation (`Tn × N`).
    pub fn amounts(&self) -> &[f64] {
        &self.amounts
    }

    /// Steps ① and ②: fill `mixed` with the per-capita rate of every
    /// transition, and `rates.source_numbers` with its source sizes.
    pub(crate) fn mixed_rates_for(&mut self, model: &Model, y: &[f64], slice: &ParamSlice) {
        let nodes = model.nodes();
        compute_proportion_rates(y, model.table(), slice, &mut self.rates);
        for (tr, row) in model
            .table()
            .transitions()
            .iter()
            .zip(self.rate_params.chunks_exact_mut(nodes))
        {
            row.copy_from_slice(slice.row(tr.rate));
        }
        model.mixer().mix_all(
            &self.rates.total_rates,
            &self.rate_params,
            &self.rates.single_prop_mask,
            &mut self.mixed,
        );
    }

    /// `(source sizes, mixed rates, amounts out)` for step ③.
    pub(crate) fn amount_buffers(&mut self) -> (&[f64], &[f64], &mut [f64]) {
        (&self.rates.source_numbers, &self.mixed, &mut self.amounts)
    }
}

// ── Core callback ─────────────────────────────────────────────────────────────

/// Write `dy/dt` for the flattened state `y` into `dydt`.
///
/// `slice` must already hold the parameters valid at `t`; `t` itself is not
/// otherwise read.  Both `y` and `dydt` have length `C × N`.
pub fn core_rhs(
    model:   &Model,
    _t:      f64,
    y:       &[f64],
    slice:   &ParamSlice,
    scratch: &mut RhsScratch,
    dydt:    &mut [f64],
) {
    debug_assert_eq!(y.len(), model.state_len());
    debug_assert_eq!(dydt.len(), model.state_len());

    scratch.mixed_rates_for(model, y, slice);
    let (source, rates, amounts) = scratch.amount_buffers();

    #[cfg(not(feature = "parallel"))]
    {
        em_transitions::deterministic_amounts(source, rates, amounts);
    }

    #[cfg(feature = "parallel")]
    {
        em_transitions::deterministic_amounts_parallel(source, rates, amounts);
    }

    assemble_flux(&scratch.amounts, model.table(), model.compartments(), model.nodes(), dydt);
}

// ── Generic callback ──────────────────────────────────────────────────────────

/// Self-contained right-hand side for callers that supply their own
/// parameters on every call.
///
/// Owns a [`SeedingTracker`], so scheduled seeding reaches `y` at most once
/// per simulated day however often the callback is invoked.
pub struct GenericRhs<'a> {
    model:    &'a Model,
    schedule: &'a SeedingSchedule,
    mode:     SliceMode,
    tracker:  SeedingTracker,
    scratch:  RhsScratch,
}

impl<'a> GenericRhs<'a> {
    pub fn new(model: &'a Model, schedule: &'a SeedingSchedule, mode: SliceMode) -> SimResult<Self> {
        schedule.validate(model.compartments(), model.nodes())?;
        Ok(Self {
            model,
            schedule,
            mode,
            tracker: SeedingTracker::new(),
            scratch: RhsScratch::new(model),
        })
    }

    /// Forget which day was last seeded.  Call before reusing the callback
    /// for a fresh integration.
    pub fn reset_seeding_tracker(&mut self) {
        self.tracker.reset();
    }

    /// Apply pending seeding to `y` in place, then return `dy/dt` at `t`.
    ///
    /// Seeded amounts are added to `incidence` when one is supplied, as in
    /// [`Integrator::solve`](crate::Integrator::solve).
    pub fn evaluate(
        &mut self,
        t:         f64,
        y:         &mut [f64],
        params:    &ParameterTensor,
        incidence: Option<&mut IncidenceAccumulator>,
    ) -> SimResult<Vec<f64>> {
        let model = self.model;
        if y.len() != model.state_len() {
            return Err(CoreError::ShapeMismatch {
                what:     "state vector",
                expected: model.state_len(),
                got:      y.len(),
            }
            .into());
        }
        check_param_rows(model, params)?;
        if let Some(acc) = incidence.as_deref() {
            check_incidence_shape(model, acc)?;
        }

        match self.tracker.apply_tracked(t, y, model.nodes(), self.schedule, incidence) {
            Some((day, applied)) if applied > 0 => {
                tracing::debug!(%day, applied, "seeding applied");
            }
            _ => {}
        }

        let slice = params.to_time_major(model.nodes())?.slice(t, self.mode);
        let mut dydt = vec![0.0; model.state_len()];
        core_rhs(model, t, y, &slice, &mut self.scratch, &mut dydt);
        Ok(dydt)
    }

    /// The day the tracker last entered, if any.
    pub fn last_seeded_day(&self) -> Option<Day> {
        self.tracker.last_day()
    }
}

pub(crate) fn check_param_rows(model: &Model, params: &ParameterTensor) -> SimResult<()> {
    if params.params() != model.params() {
        return Err(SimError::Core(CoreError::ShapeMismatch {
            what:     "parameter rows",
            expected: model.params(),
            got:      params.params(),
        }));
    }
    Ok(())
}
