//! Transition-amount computer: `(source size, rate)` → flow per transition.

use em_core::SimRng;

/// Which amount kernel a run uses.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AmountPolicy {
    /// Continuous `source × rate`.  The only policy valid inside an ODE
    /// right-hand side.
    #[default]
    Deterministic,
    /// Binomial draws over a discrete step of length `dt`.
    Stochastic { dt: f64 },
}

impl AmountPolicy {
    pub fn is_stochastic(&self) -> bool {
        matches!(self, AmountPolicy::Stochastic { .. })
    }
}

/// Flattened index chunk below which the parallel kernel stays on one thread.
const PARALLEL_MIN_LEN: usize = 4_096;

/// `out[i] = source[i] * rates[i]`.
pub fn deterministic_amounts(source: &[f64], rates: &[f64], out: &mut [f64]) {
    debug_assert_eq!(source.len(), rates.len());
    debug_assert_eq!(source.len(), out.len());
    for ((o, s), r) in out.iter_mut().zip(source).zip(rates) {
        *o = s * r;
    }
}

/// [`deterministic_amounts`] split over the flattened `Tn × N` index on
/// Rayon's pool.  Pure elementwise arithmetic, so the result is bit-identical
/// to the serial kernel.
pub fn deterministic_amounts_parallel(source: &[f64], rates: &[f64], out: &mut [f64]) {
    use rayon::prelude::*;

    debug_assert_eq!(source.len(), rates.len());
    debug_assert_eq!(source.len(), out.len());
    out.par_iter_mut()
        .with_min_len(PARALLEL_MIN_LEN)
        .zip(source.par_iter())
        .zip(rates.par_iter())
        .for_each(|((o, s), r)| *o = s * r);
}

/// Per-step probability that an individual leaves under a constant `rate`
/// for time `dt`: `clamp(1 - exp(-dt * rate), 0, 1)`.
#[inline]
pub fn transition_probability(rate: f64, dt: f64) -> f64 {
    (1.0 - (-dt * rate).exp()).clamp(0.0, 1.0)
}

/// `out[i] ~ Binomial(floor(max(source[i], 0)), transition_probability(rates[i], dt))`.
///
/// Draws in flattened-index order so a fixed seed reproduces the same run.
/// Never call this from an ODE right-hand side.
pub fn stochastic_amounts(
    source: &[f64],
    rates:  &[f64],
    dt:     f64,
    rng:    &mut SimRng,
    out:    &mut [f64],
) {
    debug_assert_eq!(source.len(), rates.len());
    debug_assert_eq!(source.len(), out.len());
    for ((o, &s), &r) in out.iter_mut().zip(source).zip(rates) {
        let trials = s.max(0.0).floor() as u64;
        *o = rng.binomial(trials, transition_probability(r, dt)) as f64;
    }
}
