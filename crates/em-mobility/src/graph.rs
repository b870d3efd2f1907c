//! Mobility graph representation and builder.
//!
//! # Data layout
//!
//! The graph uses **Compressed Sparse Row (CSR)** format.  Row `n` describes
//! the residents of node `n` who spend part of the day elsewhere:
//!
//! ```text
//! col_idx[ row_ptr[n] .. row_ptr[n+1] ]     // node j they spend time at
//! values [ row_ptr[n] .. row_ptr[n+1] ]     // how many of n's residents
//! ```
//!
//! A builder flow `j → n` of weight `w` is stored in row `n`: node `n`'s rate
//! draws on the force at `j` with weight `w`.  The mixed rate at `n` and the
//! share of `n`'s residents who move both read only `n`'s own row, so mixing
//! is a contiguous scan per node and a uniform force mixes to itself.

use em_core::{CoreError, NodeId, floor_population, safe_divide};

use crate::{MobilityError, MobilityResult};

// ── MobilityGraph ─────────────────────────────────────────────────────────────

/// Directed inter-node flows in CSR form, square in the number of nodes.
///
/// Fields are `pub` for direct indexed access on hot paths.  Build with
/// [`MobilityGraphBuilder`] or validate foreign arrays with
/// [`MobilityGraph::from_csr`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MobilityGraph {
    nodes: usize,

    /// CSR row pointer.  Contacts of node `n` are entries
    /// `row_ptr[n] .. row_ptr[n+1]`.  Length = `nodes + 1`.
    pub row_ptr: Vec<u32>,

    /// Node whose force each entry draws on.
    pub col_idx: Vec<NodeId>,

    /// Residents of the row's node mixing there (people per day).
    pub values: Vec<f64>,
}

impl MobilityGraph {
    /// A graph over `nodes` nodes with no flows.
    pub fn empty(nodes: usize) -> Self {
        Self { nodes, row_ptr: vec![0; nodes + 1], col_idx: Vec::new(), values: Vec::new() }
    }

    /// Wrap precomputed CSR arrays, validating their shape and contents.
    pub fn from_csr(
        nodes:   usize,
        values:  Vec<f64>,
        row_ptr: Vec<u32>,
        col_idx: Vec<NodeId>,
    ) -> MobilityResult<Self> {
        if row_ptr.len() != nodes + 1 {
            return Err(CoreError::ShapeMismatch {
                what:     "mobility row pointer",
                expected: nodes + 1,
                got:      row_ptr.len(),
            }
            .into());
        }
        if col_idx.len() != values.len() {
            return Err(CoreError::ShapeMismatch {
                what:     "mobility column index",
                expected: values.len(),
                got:      col_idx.len(),
            }
            .into());
        }
        if row_ptr[0] != 0 {
            return Err(MobilityError::RowPointer(0));
        }
        for (row, w) in row_ptr.windows(2).enumerate() {
            if w[0] > w[1] {
                return Err(MobilityError::RowPointer(row + 1));
            }
        }
        if row_ptr[nodes] as usize != values.len() {
            return Err(CoreError::ShapeMismatch {
                what:     "mobility values",
                expected: row_ptr[nodes] as usize,
                got:      values.len(),
            }
            .into());
        }

        for to in 0..nodes {
            let dest = NodeId(to as u32);
            for k in row_ptr[to] as usize..row_ptr[to + 1] as usize {
                let from = col_idx[k];
                if from.index() >= nodes {
                    return Err(CoreError::IndexOutOfRange {
                        what:  "mobility origin node",
                        index: from.index(),
                        bound: nodes,
                    }
                    .into());
                }
                if from == dest {
                    return Err(MobilityError::SelfFlow(dest));
                }
                let weight = values[k];
                if !weight.is_finite() || weight < 0.0 {
                    return Err(MobilityError::InvalidWeight { from, to: dest, weight });
                }
            }
        }
        Ok(Self { nodes, row_ptr, col_idx, values })
    }

    // ── Dimensions ────────────────────────────────────────────────────────

    pub fn node_count(&self) -> usize {
        self.nodes
    }

    /// Number of stored (origin, destination) flows.
    pub fn flow_count(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    // ── Traversal ─────────────────────────────────────────────────────────

    /// `(other node, weight)` for every entry of `node`'s row.
    ///
    /// This is a contiguous index range — no heap allocation.
    #[inline]
    pub fn contacts(&self, node: NodeId) -> impl Iterator<Item = (NodeId, f64)> + '_ {
        let start = self.row_ptr[node.index()] as usize;
        let end   = self.row_ptr[node.index() + 1] as usize;
        self.col_idx[start..end].iter().copied().zip(self.values[start..end].iter().copied())
    }

    /// Row sums: how many of each node's residents spend time elsewhere.
    pub fn away_totals(&self) -> Vec<f64> {
        self.row_ptr
            .windows(2)
            .map(|w| self.values[w[0] as usize..w[1] as usize].iter().sum())
            .collect()
    }

    /// Share of each node's residents who travel: `min(away / population, 1)`.
    ///
    /// Taken from the same row the mixer reads, so `keep[n]` plus the mixing
    /// weights at `n` sum to one.
    pub fn proportion_who_move(&self, population: &[f64]) -> MobilityResult<Vec<f64>> {
        check_population_len(self.nodes, population)?;
        Ok(self
            .away_totals()
            .iter()
            .zip(population)
            .map(|(&out, &pop)| safe_divide(out, pop).min(1.0))
            .collect())
    }

    /// Fail if any node has more residents away than it has residents.
    pub fn check_against_population(&self, population: &[f64]) -> MobilityResult<()> {
        check_population_len(self.nodes, population)?;
        for (i, (&away, &pop)) in self.away_totals().iter().zip(population).enumerate() {
            if away > floor_population(pop) {
                return Err(MobilityError::FlowExceedsPopulation {
                    node: NodeId(i as u32),
                    away,
                    population: pop,
                });
            }
        }
        Ok(())
    }
}

pub(crate) fn check_population_len(nodes: usize, population: &[f64]) -> MobilityResult<()> {
    if population.len() != nodes {
        return Err(CoreError::ShapeMismatch {
            what:     "population vector",
            expected: nodes,
            got:      population.len(),
        }
        .into());
    }
    Ok(())
}

// ── MobilityGraphBuilder ──────────────────────────────────────────────────────

/// Construct a [`MobilityGraph`] incrementally, then call [`build`](Self::build).
///
/// Flows may be added in any order; duplicates of the same `(origin,
/// destination)` pair are summed.
///
/// # Example
///
/// ```
/// use em_core::NodeId;
/// use em_mobility::MobilityGraphBuilder;
///
/// let mut b = MobilityGraphBuilder::new(3);
/// b.add_flow(NodeId(0), NodeId(1), 120.0);
/// b.add_flow(NodeId(2), NodeId(1), 30.0);
/// let graph = b.build().unwrap();
/// assert_eq!(graph.flow_count(), 2);
/// assert_eq!(graph.contacts(NodeId(1)).count(), 2);
/// ```
pub struct MobilityGraphBuilder {
    nodes: usize,
    flows: Vec<RawFlow>,
}

struct RawFlow {
    from:   NodeId,
    to:     NodeId,
    weight: f64,
}

impl MobilityGraphBuilder {
    pub fn new(nodes: usize) -> Self {
        Self { nodes, flows: Vec::new() }
    }

    /// Add a **directed** flow `from → to`: `weight` residents of `to` mix at
    /// `from`, so `to`'s rate draws on `from`'s force.
    pub fn add_flow(&mut self, from: NodeId, to: NodeId, weight: f64) {
        self.flows.push(RawFlow { from, to, weight });
    }

    /// Convenience: the same flow in **both directions**.
    pub fn add_exchange(&mut self, a: NodeId, b: NodeId, weight: f64) {
        self.add_flow(a, b, weight);
        self.add_flow(b, a, weight);
    }

    pub fn flow_count(&self) -> usize {
        self.flows.len()
    }

    /// Consume the builder and produce a validated [`MobilityGraph`].
    ///
    /// Time complexity: O(F log F) for the flow sort.
    pub fn build(self) -> MobilityResult<MobilityGraph> {
        let nodes = self.nodes;
        for f in &self.flows {
            for id in [f.from, f.to] {
                if id.index() >= nodes {
                    return Err(CoreError::IndexOutOfRange {
                        what:  "mobility node",
                        index: id.index(),
                        bound: nodes,
                    }
                    .into());
                }
            }
        }

        // Sort by (destination, origin) for CSR construction, merging duplicates.
        let mut raw = self.flows;
        raw.sort_unstable_by_key(|f| (f.to.0, f.from.0));
        let mut merged: Vec<RawFlow> = Vec::with_capacity(raw.len());
        for f in raw {
            match merged.last_mut() {
                Some(last) if last.to == f.to && last.from == f.from => last.weight += f.weight,
                _ => merged.push(f),
            }
        }

        let mut row_ptr = vec![0u32; nodes + 1];
        for f in &merged {
            row_ptr[f.to.index() + 1] += 1;
        }
        for i in 1..=nodes {
            row_ptr[i] += row_ptr[i - 1];
        }

        let col_idx = merged.iter().map(|f| f.from).collect();
        let values  = merged.iter().map(|f| f.weight).collect();
        MobilityGraph::from_csr(nodes, values, row_ptr, col_idx)
    }
}
