//! `MobilityMixer` — applies commuting exchange to density-dependent rates.

use em_core::{NodeId, floor_population};

use crate::graph::check_population_len;
use crate::{MobilityError, MobilityGraph, MobilityResult};

/// Everything needed to mix one simulation's rates.  Validated once at
/// construction; the mixing passes themselves cannot fail.
#[derive(Clone, Debug)]
pub struct MobilityMixer {
    graph:               MobilityGraph,
    population:          Vec<f64>,
    fraction_away:       f64,
    proportion_who_move: Vec<f64>,
}

impl MobilityMixer {
    /// # Errors
    ///
    /// Shape errors if `population` or `proportion_who_move` do not have one
    /// entry per graph node; [`MobilityError::FractionAway`] if
    /// `fraction_away` is outside `[0, 1]`.
    pub fn new(
        graph:               MobilityGraph,
        population:          Vec<f64>,
        fraction_away:       f64,
        proportion_who_move: Vec<f64>,
    ) -> MobilityResult<Self> {
        check_population_len(graph.node_count(), &population)?;
        check_population_len(graph.node_count(), &proportion_who_move)?;
        if !(0.0..=1.0).contains(&fraction_away) {
            return Err(MobilityError::FractionAway(fraction_away));
        }
        Ok(Self { graph, population, fraction_away, proportion_who_move })
    }

    /// Like [`new`](Self::new) with `proportion_who_move` derived from the
    /// graph's row sums.
    pub fn with_derived_movers(
        graph:         MobilityGraph,
        population:    Vec<f64>,
        fraction_away: f64,
    ) -> MobilityResult<Self> {
        let movers = graph.proportion_who_move(&population)?;
        Self::new(graph, population, fraction_away, movers)
    }

    pub fn graph(&self) -> &MobilityGraph {
        &self.graph
    }

    pub fn population(&self) -> &[f64] {
        &self.population
    }

    pub fn fraction_away(&self) -> f64 {
        self.fraction_away
    }

    pub fn proportion_who_move(&self) -> &[f64] {
        &self.proportion_who_move
    }

    pub fn nodes(&self) -> usize {
        self.population.len()
    }

    // ── Pass 1 ────────────────────────────────────────────────────────────

    /// `out[n] = rate_base[n] * rate_param[n] / max(population[n], 1)`.
    pub fn base_forces(&self, rate_base: &[f64], rate_param: &[f64], out: &mut [f64]) {
        for (((f, &b), &p), &pop) in out
            .iter_mut()
            .zip(rate_base)
            .zip(rate_param)
            .zip(&self.population)
        {
            *f = b * p / floor_population(pop);
        }
    }

    // ── Pass 2 ────────────────────────────────────────────────────────────

    /// Mixed rate per node from a complete vector of pass-1 forces.
    pub fn mix_forces(&self, base_force: &[f64], out: &mut [f64]) {
        let away = self.fraction_away;
        for (n, o) in out.iter_mut().enumerate() {
            let keep = 1.0 - away * self.proportion_who_move[n];
            let scale = away / floor_population(self.population[n]);
            let visiting: f64 = self
                .graph
                .contacts(NodeId(n as u32))
                .map(|(from, w)| w * base_force[from.index()])
                .sum();
            *o = keep * base_force[n] + scale * visiting;
        }
    }

    /// Both passes for one transition.  `force` is scratch of length `N`.
    pub fn mix_transition(
        &self,
        rate_base:  &[f64],
        rate_param: &[f64],
        force:      &mut [f64],
        out:        &mut [f64],
    ) {
        self.base_forces(rate_base, rate_param, force);
        self.mix_forces(force, out);
    }

    /// Mix every transition of a `Tn × N` rate matrix.
    ///
    /// Rows flagged in `single_prop_mask` are copied through unchanged (their
    /// rate parameter was already applied).  `rate_params` is `Tn × N`: each
    /// transition's rate parameter broadcast over nodes.
    pub fn mix_all(
        &self,
        rates_base:       &[f64],
        rate_params:      &[f64],
        single_prop_mask: &[bool],
        out:              &mut [f64],
    ) {
        let nodes = self.nodes();
        if nodes == 0 {
            return;
        }
        debug_assert_eq!(rates_base.len(), single_prop_mask.len() * nodes);
        debug_assert_eq!(rate_params.len(), rates_base.len());
        debug_assert_eq!(out.len(), rates_base.len());

        #[cfg(not(feature = "parallel"))]
        {
            let mut force = vec![0.0; nodes];
            for (((base, param), &single), row) in rates_base
                .chunks_exact(nodes)
                .zip(rate_params.chunks_exact(nodes))
                .zip(single_prop_mask)
                .zip(out.chunks_exact_mut(nodes))
            {
                if single {
                    row.copy_from_slice(base);
                } else {
                    self.mix_transition(base, param, &mut force, row);
                }
            }
        }

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;

            rates_base
                .par_chunks_exact(nodes)
                .zip(rate_params.par_chunks_exact(nodes))
                .zip(single_prop_mask.par_iter())
                .zip(out.par_chunks_exact_mut(nodes))
                .for_each_init(
                    || vec![0.0; nodes],
                    |force, (((base, param), &single), row)| {
                        if single {
                            row.copy_from_slice(base);
                        } else {
                            self.mix_transition(base, param, force, row);
                        }
                    },
                );
        }
    }
}
