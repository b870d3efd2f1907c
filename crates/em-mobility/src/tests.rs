//! Unit tests for em-mobility.

use approx::assert_abs_diff_eq;
use em_core::NodeId;

use crate::{MobilityError, MobilityGraph, MobilityGraphBuilder, MobilityMixer};

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Two nodes, flow 0 → 1 of weight 5: node 1's rate draws on node 0.
fn one_way_pair() -> MobilityGraph {
    let mut b = MobilityGraphBuilder::new(2);
    b.add_flow(NodeId(0), NodeId(1), 5.0);
    b.build().unwrap()
}

// ── MobilityGraph ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod graph {
    use super::*;

    #[test]
    fn flows_are_stored_in_receiving_row() {
        let g = one_way_pair();
        assert_eq!(g.row_ptr, vec![0, 0, 1]);
        assert_eq!(g.contacts(NodeId(0)).count(), 0);
        assert_eq!(g.contacts(NodeId(1)).collect::<Vec<_>>(), vec![(NodeId(0), 5.0)]);
    }

    #[test]
    fn duplicate_flows_merge() {
        let mut b = MobilityGraphBuilder::new(3);
        b.add_flow(NodeId(2), NodeId(0), 1.0);
        b.add_flow(NodeId(1), NodeId(0), 2.0);
        b.add_flow(NodeId(2), NodeId(0), 4.0);
        assert_eq!(b.flow_count(), 3);
        let g = b.build().unwrap();
        assert_eq!(g.flow_count(), 2);
        assert_eq!(
            g.contacts(NodeId(0)).collect::<Vec<_>>(),
            vec![(NodeId(1), 2.0), (NodeId(2), 5.0)]
        );
    }

    #[test]
    fn exchange_adds_both_directions() {
        let mut b = MobilityGraphBuilder::new(2);
        b.add_exchange(NodeId(0), NodeId(1), 3.0);
        let g = b.build().unwrap();
        assert_eq!(g.away_totals(), vec![3.0, 3.0]);
    }

    #[test]
    fn empty_graph_has_no_flows() {
        let g = MobilityGraph::empty(4);
        assert!(g.is_empty());
        assert_eq!(g.node_count(), 4);
        assert_eq!(g.away_totals(), vec![0.0; 4]);
    }

    #[test]
    fn away_totals_are_row_sums() {
        let mut b = MobilityGraphBuilder::new(3);
        b.add_flow(NodeId(0), NodeId(1), 40.0);
        b.add_flow(NodeId(2), NodeId(1), 2.0);
        b.add_flow(NodeId(1), NodeId(2), 7.0);
        assert_eq!(b.build().unwrap().away_totals(), vec![0.0, 42.0, 7.0]);
    }

    #[test]
    fn builder_rejects_unknown_node() {
        let mut b = MobilityGraphBuilder::new(2);
        b.add_flow(NodeId(0), NodeId(7), 1.0);
        assert!(matches!(b.build(), Err(MobilityError::Core(_))));
    }

    #[test]
    fn self_flow_rejected() {
        let mut b = MobilityGraphBuilder::new(2);
        b.add_flow(NodeId(1), NodeId(1), 1.0);
        assert!(matches!(b.build(), Err(MobilityError::SelfFlow(NodeId(1)))));
    }

    #[test]
    fn negative_weight_rejected() {
        let mut b = MobilityGraphBuilder::new(2);
        b.add_flow(NodeId(0), NodeId(1), -1.0);
        assert!(matches!(b.build(), Err(MobilityError::InvalidWeight { .. })));
    }

    #[test]
    fn csr_arrays_are_checked() {
        // row pointer too short
        let err = MobilityGraph::from_csr(2, vec![1.0], vec![0, 1], vec![NodeId(0)]);
        assert!(matches!(err, Err(MobilityError::Core(_))));

        // row pointer decreasing
        let err = MobilityGraph::from_csr(2, vec![1.0], vec![0, 1, 0], vec![NodeId(0)]);
        assert!(matches!(err, Err(MobilityError::RowPointer(2))));

        // last row pointer disagrees with value count
        let err = MobilityGraph::from_csr(2, vec![1.0, 2.0], vec![0, 0, 1], vec![NodeId(0), NodeId(0)]);
        assert!(matches!(err, Err(MobilityError::Core(_))));

        let ok = MobilityGraph::from_csr(2, vec![5.0], vec![0, 0, 1], vec![NodeId(0)]).unwrap();
        assert_eq!(ok, one_way_pair());
    }

    #[test]
    fn proportion_who_move_caps_at_one() {
        let mut b = MobilityGraphBuilder::new(3);
        b.add_flow(NodeId(1), NodeId(0), 25.0);
        b.add_flow(NodeId(0), NodeId(1), 80.0);
        b.add_flow(NodeId(0), NodeId(2), 3.0);
        let g = b.build().unwrap();
        let pwm = g.proportion_who_move(&[100.0, 50.0, 0.0]).unwrap();
        assert_abs_diff_eq!(pwm[0], 0.25, epsilon = 1e-15);
        assert_eq!(pwm[1], 1.0);
        // zero population: safe_divide returns the row sum, then capped
        assert_eq!(pwm[2], 1.0);
    }

    #[test]
    fn away_above_population_detected() {
        let g = one_way_pair();
        assert!(g.check_against_population(&[100.0, 100.0]).is_ok());
        assert!(g.check_against_population(&[4.0, 100.0]).is_ok());
        assert!(matches!(
            g.check_against_population(&[100.0, 4.0]),
            Err(MobilityError::FlowExceedsPopulation { node: NodeId(1), .. })
        ));
        assert!(matches!(g.check_against_population(&[100.0]), Err(MobilityError::Core(_))));
    }
}

// ── MobilityMixer ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod mixer {
    use super::*;

    fn pair_mixer(fraction_away: f64) -> MobilityMixer {
        MobilityMixer::new(one_way_pair(), vec![100.0, 100.0], fraction_away, vec![0.5, 0.5])
            .unwrap()
    }

    #[test]
    fn base_force_divides_by_floored_population() {
        let m = MobilityMixer::new(
            MobilityGraph::empty(3),
            vec![100.0, 0.25, 0.0],
            0.5,
            vec![0.0; 3],
        )
        .unwrap();
        let mut out = vec![0.0; 3];
        m.base_forces(&[1.0, 2.0, 3.0], &[0.3, 0.3, 0.3], &mut out);
        assert_abs_diff_eq!(out[0], 0.003, epsilon = 1e-15);
        assert_abs_diff_eq!(out[1], 0.6, epsilon = 1e-15);
        assert_abs_diff_eq!(out[2], 0.9, epsilon = 1e-15);
    }

    #[test]
    fn contacts_add_partner_force() {
        // I = 1 at both nodes, beta = 0.3: base force 0.003 everywhere.
        let m = pair_mixer(0.5);
        let mut force = vec![0.0; 2];
        let mut out = vec![0.0; 2];
        m.mix_transition(&[1.0, 1.0], &[0.3, 0.3], &mut force, &mut out);

        let keep = 1.0 - 0.5 * 0.5;
        assert_abs_diff_eq!(out[0], keep * 0.003, epsilon = 1e-15);
        assert_abs_diff_eq!(out[1], keep * 0.003 + 0.5 * 5.0 / 100.0 * 0.003, epsilon = 1e-15);
        assert_abs_diff_eq!(out[1], 0.002325, epsilon = 1e-15);
    }

    #[test]
    fn no_time_away_is_local_only() {
        let m = pair_mixer(0.0);
        let mut force = vec![0.0; 2];
        let mut out = vec![0.0; 2];
        m.mix_transition(&[4.0, 2.0], &[0.5, 0.5], &mut force, &mut out);
        assert_eq!(out, force);
    }

    #[test]
    fn mix_all_passes_single_term_rows_through() {
        let m = pair_mixer(0.5);
        // row 0: multi-term, row 1: single-term
        let base = vec![1.0, 1.0, 0.1, 0.2];
        let params = vec![0.3, 0.3, 0.1, 0.1];
        let mut out = vec![0.0; 4];
        m.mix_all(&base, &params, &[false, true], &mut out);
        assert_abs_diff_eq!(out[0], 0.00225, epsilon = 1e-15);
        assert_abs_diff_eq!(out[1], 0.002325, epsilon = 1e-15);
        assert_eq!(&out[2..], &[0.1, 0.2]);
    }

    #[test]
    fn derived_movers_follow_graph() {
        let m = MobilityMixer::with_derived_movers(one_way_pair(), vec![100.0, 100.0], 0.5)
            .unwrap();
        assert_eq!(m.proportion_who_move(), &[0.0, 0.05]);
    }

    #[test]
    fn uniform_force_mixes_to_itself() {
        let mut b = MobilityGraphBuilder::new(2);
        b.add_flow(NodeId(0), NodeId(1), 40.0);
        let m = MobilityMixer::with_derived_movers(b.build().unwrap(), vec![100.0, 100.0], 0.5)
            .unwrap();
        let mut out = vec![0.0; 2];
        m.mix_forces(&[1.0, 1.0], &mut out);
        assert_abs_diff_eq!(out[0], 1.0, epsilon = 1e-15);
        assert_abs_diff_eq!(out[1], 1.0, epsilon = 1e-15);
    }

    #[test]
    fn uniform_force_survives_uneven_network() {
        let mut b = MobilityGraphBuilder::new(4);
        b.add_flow(NodeId(0), NodeId(1), 120.0);
        b.add_flow(NodeId(2), NodeId(1), 30.0);
        b.add_flow(NodeId(3), NodeId(1), 10.0);
        b.add_exchange(NodeId(0), NodeId(2), 75.0);
        b.add_flow(NodeId(1), NodeId(3), 5.0);
        let population = vec![1_000.0, 400.0, 250.0, 60.0];
        let m = MobilityMixer::with_derived_movers(b.build().unwrap(), population, 0.8).unwrap();
        let mut out = vec![0.0; 4];
        m.mix_forces(&[0.7; 4], &mut out);
        for v in out {
            assert_abs_diff_eq!(v, 0.7, epsilon = 1e-12);
        }
    }

    #[test]
    fn invalid_construction_rejected() {
        assert!(matches!(
            MobilityMixer::new(one_way_pair(), vec![100.0, 100.0], 1.5, vec![0.5, 0.5]),
            Err(MobilityError::FractionAway(_))
        ));
        assert!(matches!(
            MobilityMixer::new(one_way_pair(), vec![100.0], 0.5, vec![0.5, 0.5]),
            Err(MobilityError::Core(_))
        ));
        assert!(matches!(
            MobilityMixer::new(one_way_pair(), vec![100.0, 100.0], 0.5, vec![0.5]),
            Err(MobilityError::Core(_))
        ));
    }
}
