//! `IncidenceAccumulator` — per-day record of seeded arrivals.

use em_core::{CompartmentId, Day, NodeId};

/// Dense (days × compartments × nodes) totals.  Only ever added to.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IncidenceAccumulator {
    days:         usize,
    compartments: usize,
    nodes:        usize,
    data:         Vec<f64>,
}

impl IncidenceAccumulator {
    pub fn new(days: usize, compartments: usize, nodes: usize) -> Self {
        Self { days, compartments, nodes, data: vec![0.0; days * compartments * nodes] }
    }

    pub fn days(&self) -> usize {
        self.days
    }

    pub fn compartments(&self) -> usize {
        self.compartments
    }

    pub fn nodes(&self) -> usize {
        self.nodes
    }

    /// Add `amount` at `(day, compartment, node)`.  Days outside the
    /// accumulator are dropped.
    #[inline]
    pub fn add(&mut self, day: Day, compartment: CompartmentId, node: NodeId, amount: f64) {
        if let Some(i) = self.offset(day, compartment, node) {
            self.data[i] += amount;
        }
    }

    /// 0 for days outside the accumulator.
    pub fn get(&self, day: Day, compartment: CompartmentId, node: NodeId) -> f64 {
        self.offset(day, compartment, node).map_or(0.0, |i| self.data[i])
    }

    /// The (C × N) block for one day.
    pub fn day_block(&self, day: Day) -> Option<&[f64]> {
        let d = day.index().filter(|&d| d < self.days)?;
        let stride = self.compartments * self.nodes;
        Some(&self.data[d * stride..(d + 1) * stride])
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn clear(&mut self) {
        self.data.fill(0.0);
    }

    #[inline]
    fn offset(&self, day: Day, compartment: CompartmentId, node: NodeId) -> Option<usize> {
        let d = day.index().filter(|&d| d < self.days)?;
        debug_assert!(compartment.index() < self.compartments && node.index() < self.nodes);
        Some((d * self.compartments + compartment.index()) * self.nodes + node.index())
    }
}
