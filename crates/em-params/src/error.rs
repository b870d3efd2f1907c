use em_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParamsError {
    #[error("parameter tensor shape error: {0}")]
    Shape(#[from] CoreError),

    #[error("parameter tensor has no time points")]
    NoTimePoints,

    #[error("parameter tensor covers {got} nodes but the model has {expected}")]
    NodeCountMismatch { expected: usize, got: usize },
}

pub type ParamsResult<T> = Result<T, ParamsError>;
