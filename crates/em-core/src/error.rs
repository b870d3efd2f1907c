//! Shape and index errors shared by every `em-*` crate.
//!
//! Sub-crates define their own error enums and wrap `CoreError` as one
//! variant through `#[from]`.

use thiserror::Error;

/// Errors raised while constructing core data structures.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{what} has length {got}, expected {expected}")]
    ShapeMismatch {
        what:     &'static str,
        expected: usize,
        got:      usize,
    },

    #[error("{what} index {index} is out of range (bound {bound})")]
    IndexOutOfRange {
        what:  &'static str,
        index: usize,
        bound: usize,
    },

    #[error("configuration error: {0}")]
    Config(String),
}

/// Shorthand result type for `em-core`.
pub type CoreResult<T> = Result<T, CoreError>;
