//! `em-mobility` — commuting structure and force-of-infection mixing.
//!
//! # Crate layout
//!
//! | Module     | Contents                                                          |
//! |------------|-------------------------------------------------------------------|
//! | [`graph`]  | `MobilityGraph` (CSR by resident node) + `MobilityGraphBuilder`   |
//! | [`mixer`]  | `MobilityMixer` — two-pass base-force / mixed-rate computation    |
//! | [`error`]  | `MobilityError`, `MobilityResult<T>`                              |
//!
//! # Mixing model (summary)
//!
//! A share `fraction_away` of each day is spent away from home by the
//! residents who move.  Residents of node `n` therefore feel their own
//! node's force for the share that stays, plus the force of every node in
//! `n`'s row, weighted by how many of them mix there:
//!
//! ```text
//! base_force[n] = rate_base[n] · param[n] / max(pop[n], 1)          (pass 1)
//! keep[n]       = 1 - fraction_away · proportion_who_move[n]
//! mixed[n]      = keep[n] · base_force[n]
//!               + Σ_{j → n} fraction_away · w(j→n) / pop[n] · base_force[j]   (pass 2)
//! ```
//!
//! With the default `proportion_who_move[n] = Σ_j w(j→n) / pop[n]` the
//! weights at `n` sum to one, so a spatially uniform force is unchanged.
//! Pass 2 reads other nodes' forces, so every pass-1 value must exist first.
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                  |
//! |------------|---------------------------------------------------------|
//! | `parallel` | `MobilityMixer::mix_all` runs per transition on Rayon.  |

pub mod error;
pub mod graph;
pub mod mixer;

#[cfg(test)]
mod tests;

pub use error::{MobilityError, MobilityResult};
pub use graph::{MobilityGraph, MobilityGraphBuilder};
pub use mixer::MobilityMixer;
