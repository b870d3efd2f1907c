//! `CompartmentState` — dense (compartment × node) population counts.
//!
//! # Data layout
//!
//! One contiguous row-major `Vec<f64>`; row `c` holds compartment `c` for
//! every node:
//!
//! ```text
//! data[ c * nodes .. (c + 1) * nodes ]
//! ```
//!
//! This is also the flattened ODE state vector, so the integrator hands
//! `as_slice()` straight to the right-hand side without copying.

use crate::{CompartmentId, CoreError, CoreResult, NodeId};

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CompartmentState {
    compartments: usize,
    nodes:        usize,
    data:         Vec<f64>,
}

impl CompartmentState {
    /// All-zero state.
    pub fn zeros(compartments: usize, nodes: usize) -> Self {
        Self { compartments, nodes, data: vec![0.0; compartments * nodes] }
    }

    /// Wrap a flattened compartment-major buffer.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ShapeMismatch`] if `data.len() != compartments * nodes`.
    pub fn from_flat(compartments: usize, nodes: usize, data: Vec<f64>) -> CoreResult<Self> {
        if data.len() != compartments * nodes {
            return Err(CoreError::ShapeMismatch {
                what:     "compartment state",
                expected: compartments * nodes,
                got:      data.len(),
            });
        }
        Ok(Self { compartments, nodes, data })
    }

    /// Build from one `Vec` per compartment (each of length `nodes`).
    pub fn from_rows(rows: &[Vec<f64>]) -> CoreResult<Self> {
        let nodes = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(rows.len() * nodes);
        for row in rows {
            if row.len() != nodes {
                return Err(CoreError::ShapeMismatch {
                    what:     "compartment row",
                    expected: nodes,
                    got:      row.len(),
                });
            }
            data.extend_from_slice(row);
        }
        Ok(Self { compartments: rows.len(), nodes, data })
    }

    // ── Dimensions ────────────────────────────────────────────────────────

    pub fn compartments(&self) -> usize {
        self.compartments
    }

    pub fn nodes(&self) -> usize {
        self.nodes
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    // ── Access ────────────────────────────────────────────────────────────

    #[inline]
    pub fn get(&self, compartment: CompartmentId, node: NodeId) -> f64 {
        self.data[compartment.index() * self.nodes + node.index()]
    }

    #[inline]
    pub fn set(&mut self, compartment: CompartmentId, node: NodeId, value: f64) {
        self.data[compartment.index() * self.nodes + node.index()] = value;
    }

    /// All nodes of one compartment.
    #[inline]
    pub fn row(&self, compartment: CompartmentId) -> &[f64] {
        let start = compartment.index() * self.nodes;
        &self.data[start..start + self.nodes]
    }

    #[inline]
    pub fn row_mut(&mut self, compartment: CompartmentId) -> &mut [f64] {
        let start = compartment.index() * self.nodes;
        &mut self.data[start..start + self.nodes]
    }

    /// The flattened compartment-major state vector.
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    pub fn into_flat(self) -> Vec<f64> {
        self.data
    }

    // ── Aggregates ────────────────────────────────────────────────────────

    /// Sum over compartments for every node.
    pub fn node_totals(&self) -> Vec<f64> {
        let mut totals = vec![0.0; self.nodes];
        for row in self.data.chunks_exact(self.nodes.max(1)) {
            for (t, v) in totals.iter_mut().zip(row) {
                *t += v;
            }
        }
        totals
    }

    /// Sum over every compartment and node.
    pub fn total(&self) -> f64 {
        self.data.iter().sum()
    }

    /// The most negative entry as `(compartment, node, value)`, or `None` if
    /// every entry is non-negative.
    pub fn most_negative(&self) -> Option<(CompartmentId, NodeId, f64)> {
        most_negative_in(self.as_slice(), self.nodes)
    }
}

/// Scan a flattened compartment-major buffer for its most negative entry.
///
/// Shared by [`CompartmentState::most_negative`] and solvers that only hold
/// the raw state vector.
pub fn most_negative_in(data: &[f64], nodes: usize) -> Option<(CompartmentId, NodeId, f64)> {
    let nodes = nodes.max(1);
    data.iter()
        .enumerate()
        .filter(|(_, v)| **v < 0.0)
        .min_by(|a, b| a.1.total_cmp(b.1))
        .map(|(i, &v)| (CompartmentId((i / nodes) as u32), NodeId((i % nodes) as u32), v))
}
