//! `em-transitions` — from compartment state to per-transition flux.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                        |
//! |-------------|-----------------------------------------------------------------|
//! | [`table`]   | `Transition`, `ProportionTerm`, `TransitionTable` + builder     |
//! | [`rates`]   | `RateBuffers`, `compute_proportion_rates`                       |
//! | [`amounts`] | `AmountPolicy`, deterministic (serial/parallel) and binomial amounts |
//! | [`flux`]    | `assemble_flux` — scatter amounts into `dy/dt`                  |
//! | [`error`]   | `TransitionError`, `TransitionResult<T>`                        |
//!
//! # Pipeline (one right-hand-side evaluation)
//!
//! ```text
//! state (C×N) ──rates──▶ total_rates, source_numbers (Tn×N)
//!             ──(mobility mixing, em-mobility)──▶ mixed rates (Tn×N)
//!             ──amounts──▶ amount (Tn×N)
//!             ──flux──▶ dy/dt (C×N, sums to 0 per node)
//! ```
//!
//! Every stage writes one disjoint output row per transition, so the
//! transition axis can be split across threads with no synchronisation.
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                  |
//! |------------|---------------------------------------------------------|
//! | `parallel` | `compute_proportion_rates` runs per transition on Rayon. |

pub mod amounts;
pub mod error;
pub mod flux;
pub mod rates;
pub mod table;

#[cfg(test)]
mod tests;

pub use amounts::{
    AmountPolicy, deterministic_amounts, deterministic_amounts_parallel, stochastic_amounts,
    transition_probability,
};
pub use error::{TransitionError, TransitionResult};
pub use flux::assemble_flux;
pub use rates::{RateBuffers, compute_proportion_rates};
pub use table::{ProportionTerm, Transition, TransitionTable, TransitionTableBuilder};
