//! Deterministic simulation RNG.
//!
//! # Determinism strategy
//!
//! One `SmallRng` drives every stochastic draw of a single simulation, in a
//! fixed order (transition-major, then node).  Independent replicates run by
//! the caller derive their own RNG with [`SimRng::child`]:
//!
//!   child_seed = parent.next_u64() XOR (offset * MIXING_CONSTANT)
//!
//! The mixing constant is the 64-bit fractional part of the golden ratio,
//! which spreads consecutive replicate offsets uniformly across the seed space.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Binomial, Distribution};

/// 64-bit fractional golden-ratio constant for seed mixing.
const MIXING_CONSTANT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Simulation-level RNG for the discrete stochastic stepper.
///
/// Not `Sync`: one simulation owns one `SimRng`.  Give each replicate its own
/// child instead of sharing.
pub struct SimRng(SmallRng);

impl SimRng {
    pub fn new(seed: u64) -> Self {
        SimRng(SmallRng::seed_from_u64(seed))
    }

    /// Derive a child `SimRng` with a different seed offset — useful for
    /// seeding per-replicate RNGs deterministically from the root seed.
    pub fn child(&mut self, offset: u64) -> SimRng {
        let child_seed: u64 = self.0.r#gen::<u64>() ^ offset.wrapping_mul(MIXING_CONSTANT);
        SimRng(SmallRng::seed_from_u64(child_seed))
    }

    /// Number of successes in `trials` Bernoulli(`p`) draws.
    ///
    /// `p` is clamped to `[0, 1]`; a NaN probability draws nothing.
    pub fn binomial(&mut self, trials: u64, p: f64) -> u64 {
        if trials == 0 || p.is_nan() {
            return 0;
        }
        let p = p.clamp(0.0, 1.0);
        match Binomial::new(trials, p) {
            Ok(dist) => dist.sample(&mut self.0),
            Err(_) => 0,
        }
    }
}
