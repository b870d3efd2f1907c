//! `em-params` — parameter tensors and the parameter time-slicer.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                      |
//! |-------------|---------------------------------------------------------------|
//! | [`tensor`]  | `ParameterTensor` — (P × T × N) or broadcast (P × T) input    |
//! | [`slice`]   | `TimeMajorParams`, `ParamSlice`, `SliceMode`                  |
//! | [`error`]   | `ParamsError`, `ParamsResult<T>`                              |
//!
//! # Slicing model (summary)
//!
//! The caller's tensor is parameter-major.  Before integration it is
//! reshaped once into time-major frames so that a query at time `t` touches
//! at most two contiguous `P × N` blocks:
//!
//! ```text
//! frames[ i * P * N .. (i + 1) * P * N ]   // frame i
//! Step:   slice(t) = frames[clamp(floor(t), 0, T-1)]
//! Linear: slice(t) = frames[i0] + (t - i0) * (frames[i0+1] - frames[i0])
//! ```

pub mod error;
pub mod slice;
pub mod tensor;


pub use error::{ParamsError, ParamsResult};
pub use slice::{ParamSlice, SliceMode, TimeMajorParams};
pub use tensor::ParameterTensor;
