//! Proportion-rate computer.
//!
//! For every transition, multiply together its proportional terms:
//!
//! ```text
//! summed_k[n]       = Σ_{c in term k} state[c, n]
//! source_numbers[n] = summed_0[n]
//! total_rates[n]    = safe_divide(summed_0[n]^e_0[n], summed_0[n])
//!                   × Π_{k ≥ 1} summed_k[n]^e_k[n]
//!                   × rate[n]            (only when there is exactly one term)
//! ```
//!
//! The first term is normalized by the source size because the amount
//! computer multiplies the source back in.  Transitions with more than one
//! term get their rate parameter later, from the mobility mixer.

use em_core::{CompartmentId, safe_divide};
use em_params::ParamSlice;

use crate::{Transition, TransitionTable};

// ── RateBuffers ───────────────────────────────────────────────────────────────

/// Output of [`compute_proportion_rates`]: two `Tn × N` row-major matrices
/// plus the single-term mask.  Allocated once per integration and refilled on
/// every evaluation.
#[derive(Clone, Debug)]
pub struct RateBuffers {
    transitions:          usize,
    nodes:                usize,
    pub total_rates:      Vec<f64>,
    pub source_numbers:   Vec<f64>,
    pub single_prop_mask: Vec<bool>,
}

impl RateBuffers {
    pub fn new(table: &TransitionTable, nodes: usize) -> Self {
        let len = table.len() * nodes;
        Self {
            transitions:      table.len(),
            nodes,
            total_rates:      vec![0.0; len],
            source_numbers:   vec![0.0; len],
            single_prop_mask: table.single_prop_mask(),
        }
    }

    pub fn transitions(&self) -> usize {
        self.transitions
    }

    pub fn nodes(&self) -> usize {
        self.nodes
    }

    #[inline]
    pub fn total_rates_row(&self, t: usize) -> &[f64] {
        &self.total_rates[t * self.nodes..(t + 1) * self.nodes]
    }

    #[inline]
    pub fn source_row(&self, t: usize) -> &[f64] {
        &self.source_numbers[t * self.nodes..(t + 1) * self.nodes]
    }
}

// ── Kernel ────────────────────────────────────────────────────────────────────

/// Fill `out.total_rates` and `out.source_numbers` from the flattened
/// compartment-major `state` and the current parameter slice.
///
/// With the `parallel` feature each transition runs as its own Rayon task.
pub fn compute_proportion_rates(
    state:  &[f64],
    table:  &TransitionTable,
    slice:  &ParamSlice,
    out:    &mut RateBuffers,
) {
    let nodes = out.nodes;
    debug_assert_eq!(out.transitions, table.len());
    if nodes == 0 {
        return;
    }

    #[cfg(not(feature = "parallel"))]
    {
        let mut summed = vec![0.0; nodes];
        for ((tr, total), source) in table
            .transitions()
            .iter()
            .zip(out.total_rates.chunks_exact_mut(nodes))
            .zip(out.source_numbers.chunks_exact_mut(nodes))
        {
            transition_rate(tr, table, state, slice, &mut summed, total, source);
        }
    }

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;

        table
            .transitions()
            .par_iter()
            .zip(out.total_rates.par_chunks_exact_mut(nodes))
            .zip(out.source_numbers.par_chunks_exact_mut(nodes))
            .for_each_init(
                || vec![0.0; nodes],
                |summed, ((tr, total), source)| {
                    transition_rate(tr, table, state, slice, summed, total, source);
                },
            );
    }
}

/// One transition's row.  `summed` is per-worker scratch of length `N`.
fn transition_rate(
    tr:     &Transition,
    table:  &TransitionTable,
    state:  &[f64],
    slice:  &ParamSlice,
    summed: &mut [f64],
    total:  &mut [f64],
    source: &mut [f64],
) {
    let nodes = total.len();
    total.fill(1.0);

    for (k, term) in table.terms(tr).iter().enumerate() {
        sum_rows(state, nodes, table.summed_rows(term), summed);
        let exponent = slice.row(term.exponent);

        if k == 0 {
            source.copy_from_slice(summed);
            for ((r, &s), &e) in total.iter_mut().zip(summed.iter()).zip(exponent) {
                *r *= safe_divide(s.powf(e), s);
            }
            if tr.is_single_proportion() {
                for (r, &rate) in total.iter_mut().zip(slice.row(tr.rate)) {
                    *r *= rate;
                }
            }
        } else {
            for ((r, &s), &e) in total.iter_mut().zip(summed.iter()).zip(exponent) {
                *r *= s.powf(e);
            }
        }
    }
}

/// `summed[n] = Σ_c state[c, n]` over the given compartment rows.
#[inline]
fn sum_rows(state: &[f64], nodes: usize, rows: &[CompartmentId], summed: &mut [f64]) {
    summed.fill(0.0);
    for c in rows {
        let start = c.index() * nodes;
        for (acc, v) in summed.iter_mut().zip(&state[start..start + nodes]) {
            *acc += v;
        }
    }
}
