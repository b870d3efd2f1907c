//! `Model` — the immutable structure of one metapopulation model.

use em_mobility::MobilityMixer;
use em_transitions::TransitionTable;

/// Validated, immutable model inputs.  Build with
/// [`ModelBuilder`](crate::ModelBuilder).
#[derive(Clone, Debug)]
pub struct Model {
    pub(crate) table:        TransitionTable,
    pub(crate) mixer:        MobilityMixer,
    pub(crate) compartments: usize,
    pub(crate) params:       usize,
}

impl Model {
    pub fn table(&self) -> &TransitionTable {
        &self.table
    }

    pub fn mixer(&self) -> &MobilityMixer {
        &self.mixer
    }

    pub fn compartments(&self) -> usize {
        self.compartments
    }

    /// Number of parameter rows a parameter tensor must provide.
    pub fn params(&self) -> usize {
        self.params
    }

    pub fn nodes(&self) -> usize {
        self.mixer.nodes()
    }

    pub fn population(&self) -> &[f64] {
        self.mixer.population()
    }

    /// Length of the flattened state vector, `C × N`.
    pub fn state_len(&self) -> usize {
        self.compartments * self.nodes()
    }

    pub fn transitions(&self) -> usize {
        self.table.len()
    }
}
