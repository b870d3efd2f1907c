//! `Trajectory` — the state recorded at each output time.

use em_core::{CompartmentId, NodeId};

/// Dense (times × compartments × nodes) record of a solve.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Trajectory {
    times:        Vec<f64>,
    compartments: usize,
    nodes:        usize,
    data:         Vec<f64>,
}

impl Trajectory {
    pub(crate) fn with_capacity(outputs: usize, compartments: usize, nodes: usize) -> Self {
        Self {
            times: Vec::with_capacity(outputs),
            compartments,
            nodes,
            data: Vec::with_capacity(outputs * compartments * nodes),
        }
    }

    pub(crate) fn push(&mut self, t: f64, state: &[f64]) {
        debug_assert_eq!(state.len(), self.stride());
        self.times.push(t);
        self.data.extend_from_slice(state);
    }

    #[inline]
    fn stride(&self) -> usize {
        self.compartments * self.nodes
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn compartments(&self) -> usize {
        self.compartments
    }

    pub fn nodes(&self) -> usize {
        self.nodes
    }

    /// Flattened compartment-major state at output `i`.
    pub fn state_at(&self, i: usize) -> &[f64] {
        let stride = self.stride();
        &self.data[i * stride..(i + 1) * stride]
    }

    /// The final recorded state, if any.
    pub fn last_state(&self) -> Option<&[f64]> {
        self.len().checked_sub(1).map(|i| self.state_at(i))
    }

    /// Population of every node at output `i`, summed over compartments.
    pub fn node_totals(&self, i: usize) -> Vec<f64> {
        let mut totals = vec![0.0; self.nodes];
        for row in self.state_at(i).chunks_exact(self.nodes.max(1)) {
            for (t, v) in totals.iter_mut().zip(row) {
                *t += v;
            }
        }
        totals
    }

    /// One compartment at one node across every output time.
    pub fn compartment_series(&self, compartment: CompartmentId, node: NodeId) -> Vec<f64> {
        let offset = compartment.index() * self.nodes + node.index();
        (0..self.len()).map(|i| self.data[i * self.stride() + offset]).collect()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }
}
