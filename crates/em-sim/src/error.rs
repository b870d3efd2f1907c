use em_core::{CompartmentId, CoreError, NodeId};
use em_mobility::MobilityError;
use em_params::ParamsError;
use em_seeding::SeedingError;
use em_transitions::TransitionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("{0}")]
    Core(#[from] CoreError),

    #[error("parameter error: {0}")]
    Params(#[from] ParamsError),

    #[error("transition table error: {0}")]
    Transition(#[from] TransitionError),

    #[error("mobility error: {0}")]
    Mobility(#[from] MobilityError),

    #[error("seeding error: {0}")]
    Seeding(#[from] SeedingError),

    #[error("model is missing its {0}")]
    Missing(&'static str),

    #[error("solver configuration error: {0}")]
    Config(String),

    #[error("stochastic amounts cannot drive a continuous integrator")]
    StochasticInContinuousPath,

    #[error("negative state {value} in {compartment} at {node} (t = {time})")]
    NegativeState {
        time:        f64,
        compartment: CompartmentId,
        node:        NodeId,
        value:       f64,
    },

    #[error("solver failure: {0}")]
    Solver(String),
}

pub type SimResult<T> = Result<T, SimError>;
