//! Mobility-subsystem error type.

use thiserror::Error;

use em_core::{CoreError, NodeId};

/// Errors produced by `em-mobility`.
#[derive(Debug, Error)]
pub enum MobilityError {
    #[error("{0}")]
    Core(#[from] CoreError),

    #[error("node {0} has a flow to itself")]
    SelfFlow(NodeId),

    #[error("flow {from} → {to} has invalid weight {weight}")]
    InvalidWeight { from: NodeId, to: NodeId, weight: f64 },

    #[error("row pointer is not monotonic at row {0}")]
    RowPointer(usize),

    #[error("{away} residents of {node} are away, more than its population {population}")]
    FlowExceedsPopulation { node: NodeId, away: f64, population: f64 },

    #[error("fraction away {0} is outside [0, 1]")]
    FractionAway(f64),
}

pub type MobilityResult<T> = Result<T, MobilityError>;
