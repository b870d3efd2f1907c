//! `em-core` — foundational types for the `epimix` transmission engine.
//!
//! This crate is a dependency of every other `em-*` crate.  It has no `em-*`
//! dependencies and few external ones (`rand`, `rand_distr`, `thiserror`,
//! plus optional `serde`).
//!
//! # What lives here
//!
//! | Module          | Contents                                                  |
//! |-----------------|-----------------------------------------------------------|
//! | [`ids`]         | `CompartmentId`, `NodeId`, `ParamId`, `TransitionId`      |
//! | [`state`]       | `CompartmentState` — dense (compartment × node) counts    |
//! | [`time`]        | `Day`, `day_of`, `DAY_EPSILON`                            |
//! | [`policy`]      | `safe_divide`, `floor_population`                         |
//! | [`rng`]         | `SimRng` (seeded `SmallRng` + binomial draws)             |
//! | [`error`]       | `CoreError`, `CoreResult`                                 |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public data types.   |

pub mod error;
pub mod ids;
pub mod policy;
pub mod rng;
pub mod state;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{CoreError, CoreResult};
pub use ids::{CompartmentId, NodeId, ParamId, TransitionId};
pub use policy::{floor_population, safe_divide};
pub use rng::SimRng;
pub use state::{CompartmentState, most_negative_in};
pub use time::{DAY_EPSILON, Day, day_of};
