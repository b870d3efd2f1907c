use em_core::{CoreError, TransitionId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransitionError {
    #[error("{0}")]
    Core(#[from] CoreError),

    #[error("transition {0} has no proportional terms")]
    NoProportionalTerms(TransitionId),

    #[error("transition {transition} proportion range {start}..{stop} is invalid for {len} terms")]
    ProportionRange {
        transition: TransitionId,
        start:      usize,
        stop:       usize,
        len:        usize,
    },

    #[error("proportional term {term} sums an empty or invalid compartment range {start}..{stop}")]
    SumRange {
        term:  usize,
        start: usize,
        stop:  usize,
    },
}

pub type TransitionResult<T> = Result<T, TransitionError>;
