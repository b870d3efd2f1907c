//! Numerical substitution policies.
//!
//! Empty compartments and empty nodes are ordinary steady states, not errors.
//! Every place that would divide by such a quantity goes through one of the
//! functions below so the convention stays identical across the engine and can
//! be tested on its own.

/// Divide `numerator` by `denominator`, dividing by 1 instead when the
/// denominator is exactly zero.
///
/// For a proportional term `summed^e / summed` with `summed == 0` this yields
/// `0^e / 1`, i.e. a zero contribution for any positive exponent.  That is a
/// convention, not the mathematical limit (which is infinite for `e < 1`).
#[inline]
pub fn safe_divide(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        numerator
    } else {
        numerator / denominator
    }
}

/// Population used as a normalizer: never below 1.
#[inline]
pub fn floor_population(population: f64) -> f64 {
    population.max(1.0)
}
