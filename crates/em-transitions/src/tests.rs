//! Unit tests for em-transitions.

use em_core::{CompartmentId, ParamId, SimRng, TransitionId};
use em_params::{ParamSlice, ParameterTensor, SliceMode};

use crate::{
    ProportionTerm, RateBuffers, Transition, TransitionError, TransitionTable,
    TransitionTableBuilder, assemble_flux, compute_proportion_rates, deterministic_amounts,
    deterministic_amounts_parallel, stochastic_amounts, transition_probability,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

const S: CompartmentId = CompartmentId(0);
const I: CompartmentId = CompartmentId(1);
const R: CompartmentId = CompartmentId(2);

const BETA: ParamId = ParamId(0);
const GAMMA: ParamId = ParamId(1);
const ONE: ParamId = ParamId(2);
const TWO: ParamId = ParamId(3);

/// S → I at beta·S·I, I → R at gamma·I.
fn sir_table() -> TransitionTable {
    let mut b = TransitionTableBuilder::new();
    b.add(S, I, BETA, &[(&[S], ONE), (&[I], ONE)]);
    b.add(I, R, GAMMA, &[(&[I], ONE)]);
    b.build().unwrap()
}

/// Constant per-node parameters: beta, gamma, exponent 1, exponent 2.
fn sir_params(nodes: usize, beta: f64, gamma: f64) -> ParamSlice {
    ParameterTensor::constant(&[
        vec![beta; nodes],
        vec![gamma; nodes],
        vec![1.0; nodes],
        vec![2.0; nodes],
    ])
    .unwrap()
    .to_time_major(nodes)
    .unwrap()
    .slice(0.0, SliceMode::Step)
}

/// Flattened (S, I, R) × nodes.
fn state(s: &[f64], i: &[f64], r: &[f64]) -> Vec<f64> {
    [s, i, r].concat()
}

// ── TransitionTable ───────────────────────────────────────────────────────────

#[cfg(test)]
mod table {
    use super::*;

    #[test]
    fn builder_links_ranges() {
        let t = sir_table();
        assert_eq!(t.len(), 2);
        let si = t.transition(TransitionId(0));
        assert_eq!(si.term_count(), 2);
        let terms = t.terms(si);
        assert_eq!(t.summed_rows(&terms[0]), &[S]);
        assert_eq!(t.summed_rows(&terms[1]), &[I]);
        assert_eq!(t.single_prop_mask(), vec![false, true]);
    }

    #[test]
    fn builder_hands_out_sequential_ids() {
        let mut b = TransitionTableBuilder::new();
        assert_eq!(b.transition_count(), 0);
        let first = b.add(S, I, BETA, &[(&[S], ONE)]);
        let second = b.add(I, R, GAMMA, &[(&[I], ONE)]);
        assert_eq!((first, second), (TransitionId(0), TransitionId(1)));
        assert_eq!(b.transition_count(), 2);
    }

    #[test]
    fn multi_compartment_sums() {
        let mut b = TransitionTableBuilder::new();
        b.add(S, I, BETA, &[(&[S], ONE), (&[I, R], ONE)]);
        let t = b.build().unwrap();
        let terms = t.terms(t.transition(TransitionId(0)));
        assert_eq!(t.summed_rows(&terms[1]), &[I, R]);
    }

    #[test]
    fn transition_without_terms_rejected() {
        let mut b = TransitionTableBuilder::new();
        b.add(S, I, BETA, &[]);
        assert!(matches!(
            b.build(),
            Err(TransitionError::NoProportionalTerms(TransitionId(0)))
        ));
    }

    #[test]
    fn out_of_range_proportions_rejected() {
        let tr = Transition {
            source:           S,
            destination:      I,
            rate:             BETA,
            proportion_start: 0,
            proportion_stop:  3,
        };
        let term = ProportionTerm { sum_start: 0, sum_stop: 1, exponent: ONE };
        let err = TransitionTable::from_parts(vec![tr], vec![term], vec![S]).unwrap_err();
        assert!(matches!(err, TransitionError::ProportionRange { stop: 3, len: 1, .. }));
    }

    #[test]
    fn empty_sum_range_rejected() {
        let tr = Transition {
            source:           S,
            destination:      I,
            rate:             BETA,
            proportion_start: 0,
            proportion_stop:  1,
        };
        let term = ProportionTerm { sum_start: 0, sum_stop: 0, exponent: ONE };
        let err = TransitionTable::from_parts(vec![tr], vec![term], vec![S]).unwrap_err();
        assert!(matches!(err, TransitionError::SumRange { term: 0, .. }));
    }

    #[test]
    fn validate_checks_dimensions() {
        let t = sir_table();
        assert!(t.validate(3, 4).is_ok());
        assert!(matches!(t.validate(2, 4), Err(TransitionError::Core(_))));
        assert!(matches!(t.validate(3, 2), Err(TransitionError::Core(_))));
    }
}

// ── Proportion rates ──────────────────────────────────────────────────────────

#[cfg(test)]
mod rates {
    use super::*;

    fn run(table: &TransitionTable, y: &[f64], slice: &ParamSlice, nodes: usize) -> RateBuffers {
        let mut out = RateBuffers::new(table, nodes);
        compute_proportion_rates(y, table, slice, &mut out);
        out
    }

    #[test]
    fn infection_rate_is_infectious_mass() {
        let table = sir_table();
        let y = state(&[99.0, 40.0], &[1.0, 5.0], &[0.0, 0.0]);
        let out = run(&table, &y, &sir_params(2, 0.3, 0.1), 2);

        // (S^1 / S) * I^1 = I; beta is applied later by mobility mixing.
        assert_eq!(out.total_rates_row(0), &[1.0, 5.0]);
        assert_eq!(out.source_row(0), &[99.0, 40.0]);
    }

    #[test]
    fn single_term_folds_in_rate() {
        let table = sir_table();
        let y = state(&[99.0, 40.0], &[1.0, 5.0], &[0.0, 0.0]);
        let out = run(&table, &y, &sir_params(2, 0.3, 0.1), 2);

        approx::assert_abs_diff_eq!(out.total_rates_row(1)[0], 0.1, epsilon = 1e-15);
        approx::assert_abs_diff_eq!(out.total_rates_row(1)[1], 0.1, epsilon = 1e-15);
        assert_eq!(out.source_row(1), &[1.0, 5.0]);
        assert_eq!(out.single_prop_mask, vec![false, true]);
    }

    #[test]
    fn single_term_equals_power_law() {
        // I → R with exponent 2: rate = I^(2-1) * gamma.
        let mut b = TransitionTableBuilder::new();
        b.add(I, R, GAMMA, &[(&[I], TWO)]);
        let table = b.build().unwrap();
        let y = state(&[0.0, 0.0], &[4.0, 10.0], &[0.0, 0.0]);
        let out = run(&table, &y, &sir_params(2, 0.0, 0.5), 2);
        approx::assert_abs_diff_eq!(out.total_rates_row(0)[0], 2.0, epsilon = 1e-12);
        approx::assert_abs_diff_eq!(out.total_rates_row(0)[1], 5.0, epsilon = 1e-12);
    }

    #[test]
    fn empty_source_contributes_zero() {
        let table = sir_table();
        let y = state(&[0.0, 10.0], &[0.0, 0.0], &[5.0, 0.0]);
        let out = run(&table, &y, &sir_params(2, 0.3, 0.1), 2);
        for v in &out.total_rates {
            assert!(v.is_finite());
        }
        // node 0: S = 0 → 0/1 * I = 0
        assert_eq!(out.total_rates_row(0)[0], 0.0);
        // I → R with I = 0 on both nodes
        assert_eq!(out.total_rates_row(1), &[0.0, 0.0]);
    }

    #[test]
    fn additional_terms_are_not_normalized() {
        // S → I with S·I^2: second term I^2 enters raw.
        let mut b = TransitionTableBuilder::new();
        b.add(S, I, BETA, &[(&[S], ONE), (&[I], TWO)]);
        let table = b.build().unwrap();
        let y = state(&[50.0], &[3.0], &[0.0]);
        let out = run(&table, &y, &sir_params(1, 0.3, 0.1), 1);
        approx::assert_abs_diff_eq!(out.total_rates_row(0)[0], 9.0, epsilon = 1e-12);
    }

    #[test]
    fn rows_are_rewritten_each_call() {
        let table = sir_table();
        let slice = sir_params(1, 0.3, 0.1);
        let mut out = RateBuffers::new(&table, 1);
        compute_proportion_rates(&state(&[9.0], &[1.0], &[0.0]), &table, &slice, &mut out);
        compute_proportion_rates(&state(&[8.0], &[2.0], &[0.0]), &table, &slice, &mut out);
        assert_eq!(out.total_rates_row(0), &[2.0]);
        assert_eq!(out.source_row(0), &[8.0]);
    }
}

// ── Amounts ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod amounts {
    use super::*;

    #[test]
    fn deterministic_is_elementwise_product() {
        let mut out = vec![0.0; 3];
        deterministic_amounts(&[10.0, 0.0, 4.0], &[0.5, 3.0, 0.25], &mut out);
        assert_eq!(out, vec![5.0, 0.0, 1.0]);
    }

    #[test]
    fn parallel_kernel_is_bit_identical() {
        let n = 50_000;
        let source: Vec<f64> = (0..n).map(|i| (i as f64 * 0.37).sin().abs() * 1e4).collect();
        let rates: Vec<f64> = (0..n).map(|i| (i as f64 * 1.13).cos().abs() * 1e-3).collect();
        let mut serial = vec![0.0; n];
        let mut parallel = vec![0.0; n];
        deterministic_amounts(&source, &rates, &mut serial);
        deterministic_amounts_parallel(&source, &rates, &mut parallel);
        assert!(serial.iter().zip(&parallel).all(|(a, b)| a.to_bits() == b.to_bits()));
    }

    #[test]
    fn probability_clamps() {
        assert_eq!(transition_probability(0.0, 1.0), 0.0);
        assert_eq!(transition_probability(-5.0, 1.0), 0.0);
        approx::assert_abs_diff_eq!(
            transition_probability(0.1, 1.0),
            1.0 - (-0.1f64).exp(),
            epsilon = 1e-15
        );
        assert_eq!(transition_probability(f64::INFINITY, 1.0), 1.0);
    }

    #[test]
    fn stochastic_draws_are_bounded_and_reproducible() {
        let source = vec![100.0, 7.9, -3.0, 0.0];
        let rates = vec![0.2, 50.0, 1.0, 1.0];
        let mut a = vec![0.0; 4];
        let mut b = vec![0.0; 4];
        stochastic_amounts(&source, &rates, 1.0, &mut SimRng::new(3), &mut a);
        stochastic_amounts(&source, &rates, 1.0, &mut SimRng::new(3), &mut b);
        assert_eq!(a, b);
        assert!(a[0] >= 0.0 && a[0] <= 100.0);
        // p ≈ 1 with floor(7.9) = 7 trials
        assert_eq!(a[1], 7.0);
        // negative and empty sources draw nothing
        assert_eq!(a[2], 0.0);
        assert_eq!(a[3], 0.0);
    }
}

// ── Flux ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod flux {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn amounts_move_from_source_to_destination() {
        let table = sir_table();
        // S→I: [3, 1], I→R: [0.5, 2]
        let amounts = vec![3.0, 1.0, 0.5, 2.0];
        let mut dy = vec![9.9; 6];
        assemble_flux(&amounts, &table, 3, 2, &mut dy);
        assert_eq!(dy, vec![-3.0, -1.0, 2.5, -1.0, 0.5, 2.0]);
    }

    #[test]
    fn self_loop_is_a_no_op() {
        let mut b = TransitionTableBuilder::new();
        b.add(S, S, BETA, &[(&[S], ONE)]);
        let table = b.build().unwrap();
        let mut dy = vec![0.0; 1];
        assemble_flux(&[4.0], &table, 1, 1, &mut dy);
        assert_eq!(dy, vec![0.0]);
    }

    /// Random tables over 4 compartments.
    fn random_table(pairs: &[(u32, u32)]) -> TransitionTable {
        let mut b = TransitionTableBuilder::new();
        for &(s, d) in pairs {
            b.add(CompartmentId(s), CompartmentId(d), BETA, &[(&[CompartmentId(s)], ONE)]);
        }
        b.build().unwrap()
    }

    proptest! {
        #[test]
        fn flux_conserves_mass_per_node(
            pairs in prop::collection::vec((0u32..4, 0u32..4), 1..8),
            seed_amounts in prop::collection::vec(0.0f64..1e6, 24),
        ) {
            let nodes = 3;
            let table = random_table(&pairs);
            let amounts: Vec<f64> = seed_amounts
                .iter()
                .cycle()
                .take(table.len() * nodes)
                .copied()
                .collect();
            let mut dy = vec![0.0; 4 * nodes];
            assemble_flux(&amounts, &table, 4, nodes, &mut dy);

            let scale: f64 = amounts.iter().sum::<f64>().max(1.0);
            for n in 0..nodes {
                let column: f64 = (0..4).map(|c| dy[c * nodes + n]).sum();
                prop_assert!(column.abs() <= 1e-12 * scale, "node {} sums to {}", n, column);
            }
        }
    }
}
