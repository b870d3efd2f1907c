//! Solver configuration.

use em_params::SliceMode;
use em_transitions::AmountPolicy;

use crate::{SimError, SimResult};

/// Step control for the adaptive Dormand–Prince solver.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AdaptiveOptions {
    /// Relative tolerance.  Default: 1e-6.
    pub rtol: f64,
    /// Absolute tolerance.  Default: 1e-6 (state is in people).
    pub atol: f64,
    /// First trial step.  `0.0` picks one from the segment length.
    pub h0: f64,
    /// Smallest step the controller may take.  Default: 1e-10.
    pub h_min: f64,
    /// Largest step.  Default: 1 day.
    pub h_max: f64,
    /// Step attempts allowed per segment.  Default: 100 000.
    pub max_steps: usize,
}

impl Default for AdaptiveOptions {
    fn default() -> Self {
        Self {
            rtol:      1e-6,
            atol:      1e-6,
            h0:        0.0,
            h_min:     1e-10,
            h_max:     1.0,
            max_steps: 100_000,
        }
    }
}

impl AdaptiveOptions {
    pub(crate) fn validate(&self) -> SimResult<()> {
        if !self.rtol.is_finite() || self.rtol <= 0.0 {
            return Err(SimError::Config(format!("rtol must be finite and > 0, got {}", self.rtol)));
        }
        if !self.atol.is_finite() || self.atol <= 0.0 {
            return Err(SimError::Config(format!("atol must be finite and > 0, got {}", self.atol)));
        }
        if !(self.h_min > 0.0) || !(self.h_max >= self.h_min) {
            return Err(SimError::Config(format!(
                "step bounds must satisfy 0 < h_min <= h_max, got {} and {}",
                self.h_min, self.h_max
            )));
        }
        if !(self.h0 >= 0.0) {
            return Err(SimError::Config(format!("h0 must be >= 0, got {}", self.h0)));
        }
        if self.max_steps == 0 {
            return Err(SimError::Config("max_steps must be > 0".into()));
        }
        Ok(())
    }
}

/// Which integrator advances the state between breakpoints.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IntegrationMethod {
    /// Explicit Euler with a fixed step (days).
    Euler { dt: f64 },
    /// Classic fourth-order Runge–Kutta with a fixed step (days).
    Rk4 { dt: f64 },
    /// Dormand–Prince 4(5) with error control.
    Adaptive(AdaptiveOptions),
}

impl Default for IntegrationMethod {
    fn default() -> Self {
        IntegrationMethod::Rk4 { dt: 1.0 / 8.0 }
    }
}

impl IntegrationMethod {
    pub(crate) fn validate(&self) -> SimResult<()> {
        match *self {
            IntegrationMethod::Euler { dt } | IntegrationMethod::Rk4 { dt } => {
                if !dt.is_finite() || dt <= 0.0 {
                    return Err(SimError::Config(format!("dt must be finite and > 0, got {dt}")));
                }
                Ok(())
            }
            IntegrationMethod::Adaptive(opts) => opts.validate(),
        }
    }
}

/// What to do when an integrated state entry drops below zero.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NonNegativity {
    /// No check.
    #[default]
    Ignore,
    /// Log the most negative entry.
    Warn,
    /// Log, then set every negative entry to zero.
    Clamp,
    /// Fail with [`SimError::NegativeState`].
    Abort,
}

/// Everything about *how* a model is integrated.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SolverConfig {
    pub method:         IntegrationMethod,
    /// How parameters are read between integer days.  Default: `Step`.
    pub slice_mode:     SliceMode,
    pub non_negativity: NonNegativity,
    /// Must be `Deterministic` for [`Integrator`](crate::Integrator).
    pub amounts:        AmountPolicy,
}

impl SolverConfig {
    pub fn new(method: IntegrationMethod) -> Self {
        Self { method, ..Self::default() }
    }

    pub fn slice_mode(mut self, mode: SliceMode) -> Self {
        self.slice_mode = mode;
        self
    }

    pub fn non_negativity(mut self, policy: NonNegativity) -> Self {
        self.non_negativity = policy;
        self
    }

    pub fn amounts(mut self, policy: AmountPolicy) -> Self {
        self.amounts = policy;
        self
    }

    /// Reject configurations the continuous integrator cannot run.
    pub fn validate(&self) -> SimResult<()> {
        if self.amounts.is_stochastic() {
            return Err(SimError::StochasticInContinuousPath);
        }
        self.method.validate()
    }
}
