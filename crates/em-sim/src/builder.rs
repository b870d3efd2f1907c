//! Fluent builder for constructing a [`Model`].

use em_core::CoreError;
use em_mobility::{MobilityGraph, MobilityMixer};
use em_transitions::TransitionTable;

use crate::{Model, SimError, SimResult};

/// Fluent builder for [`Model`].
///
/// # Required inputs
///
/// - [`TransitionTable`], via [`transitions`](Self::transitions)
/// - per-node population, via [`population`](Self::population)
/// - compartment and parameter-row counts (given to [`new`](Self::new))
///
/// # Optional inputs (have defaults)
///
/// | Method                      | Default                                      |
/// |-----------------------------|----------------------------------------------|
/// | `.mobility(g)`              | `MobilityGraph::empty(nodes)`                |
/// | `.fraction_away(f)`         | `0.5`                                        |
/// | `.proportion_who_move(v)`   | `graph.proportion_who_move(population)`      |
///
/// # Example
///
/// ```rust,ignore
/// let model = ModelBuilder::new(3, 4)
///     .transitions(table)
///     .population(vec![1_000.0, 500.0])
///     .mobility(graph)
///     .build()?;
/// ```
pub struct ModelBuilder {
    compartments:        usize,
    params:              usize,
    table:               Option<TransitionTable>,
    population:          Option<Vec<f64>>,
    graph:               Option<MobilityGraph>,
    fraction_away:       f64,
    proportion_who_move: Option<Vec<f64>>,
}

impl ModelBuilder {
    pub const DEFAULT_FRACTION_AWAY: f64 = 0.5;

    pub fn new(compartments: usize, params: usize) -> Self {
        Self {
            compartments,
            params,
            table:               None,
            population:          None,
            graph:               None,
            fraction_away:       Self::DEFAULT_FRACTION_AWAY,
            proportion_who_move: None,
        }
    }

    pub fn transitions(mut self, table: TransitionTable) -> Self {
        self.table = Some(table);
        self
    }

    /// Total population per node.  Its length fixes the node count.
    pub fn population(mut self, population: Vec<f64>) -> Self {
        self.population = Some(population);
        self
    }

    pub fn mobility(mut self, graph: MobilityGraph) -> Self {
        self.graph = Some(graph);
        self
    }

    /// Share of the day movers spend away from home.
    pub fn fraction_away(mut self, fraction: f64) -> Self {
        self.fraction_away = fraction;
        self
    }

    /// Override the graph-derived share of each node's residents who move.
    pub fn proportion_who_move(mut self, proportion: Vec<f64>) -> Self {
        self.proportion_who_move = Some(proportion);
        self
    }

    /// Validate every shape and return a ready-to-integrate [`Model`].
    pub fn build(self) -> SimResult<Model> {
        let table = self.table.ok_or(SimError::Missing("transition table"))?;
        let population = self.population.ok_or(SimError::Missing("population vector"))?;
        let nodes = population.len();
        if nodes == 0 {
            return Err(SimError::Config("model has no nodes".into()));
        }
        if self.compartments == 0 {
            return Err(SimError::Config("model has no compartments".into()));
        }
        table.validate(self.compartments, self.params)?;

        let graph = self.graph.unwrap_or_else(|| MobilityGraph::empty(nodes));
        if graph.node_count() != nodes {
            return Err(CoreError::ShapeMismatch {
                what:     "mobility graph",
                expected: nodes,
                got:      graph.node_count(),
            }
            .into());
        }
        graph.check_against_population(&population)?;

        let mixer = match self.proportion_who_move {
            Some(pwm) => MobilityMixer::new(graph, population, self.fraction_away, pwm)?,
            None => MobilityMixer::with_derived_movers(graph, population, self.fraction_away)?,
        };

        Ok(Model {
            table,
            mixer,
            compartments: self.compartments,
            params: self.params,
        })
    }
}
