//! `em-seeding` — scheduled exogenous movement between compartments.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                        |
//! |---------------|-----------------------------------------------------------------|
//! | [`schedule`]  | `SeedingEvent`, `SeedingSchedule` (day CSR) + builder           |
//! | [`apply`]     | `apply_seeding`, `apply_seeding_slice` — the raw applicator     |
//! | [`tracker`]   | `SeedingTracker` — at most one application per simulated day    |
//! | [`incidence`] | `IncidenceAccumulator` — (days × C × N) applied amounts         |
//! | [`error`]     | `SeedingError`, `SeedingResult<T>`                              |
//!
//! # Application rule (summary)
//!
//! ```text
//! state[source, node]      = max(state[source, node] - amount, 0)
//! state[destination, node] += amount
//! incidence[day, destination, node] += amount
//! ```
//!
//! The destination always receives the full scheduled amount, even when the
//! source did not hold that many.

pub mod apply;
pub mod error;
pub mod incidence;
pub mod schedule;
pub mod tracker;

#[cfg(test)]
mod tests;

pub use apply::{apply_seeding, apply_seeding_slice};
pub use error::{SeedingError, SeedingResult};
pub use incidence::IncidenceAccumulator;
pub use schedule::{SeedingEvent, SeedingSchedule, SeedingScheduleBuilder};
pub use tracker::SeedingTracker;
