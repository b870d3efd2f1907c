//! `em-sim` — right-hand-side assembly and integration for the epimix engine.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                      |
//! |----------------|---------------------------------------------------------------|
//! | [`builder`]    | `ModelBuilder` — validates shapes, derives mobility defaults  |
//! | [`model`]      | `Model` — transition table + mobility mixer + dimensions      |
//! | [`rhs`]        | `core_rhs`, `RhsScratch`, `GenericRhs`                        |
//! | [`solver`]     | `OdeSystem`, `FixedStepper` (Euler/RK4), `DormandPrince`      |
//! | [`driver`]     | `Integrator` — segmenting, seeding, non-negativity, output    |
//! | [`stochastic`] | `StochasticStepper` — discrete binomial simulation            |
//! | [`trajectory`] | `Trajectory` — (times × C × N) output                         |
//! | [`observer`]   | `SolveObserver`, `NoopObserver`                               |
//! | [`config`]     | `SolverConfig`, `IntegrationMethod`, `AdaptiveOptions`, …     |
//! | [`error`]      | `SimError`, `SimResult<T>`                                    |
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                           |
//! |------------|------------------------------------------------------------------|
//! | `parallel` | Rates and mixing per transition on Rayon; parallel amounts.      |
//! | `serde`    | `Serialize`/`Deserialize` on configuration and `Trajectory`.     |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use em_sim::{IntegrationMethod, Integrator, ModelBuilder, NoopObserver, SolverConfig};
//!
//! let model = ModelBuilder::new(3, 4)
//!     .transitions(table)
//!     .population(population)
//!     .mobility(graph)
//!     .build()?;
//! let mut integrator = Integrator::new(model, SolverConfig::new(IntegrationMethod::Rk4 { dt: 0.1 }))?;
//! let times: Vec<f64> = (0..=60).map(f64::from).collect();
//! let out = integrator.solve(&y0, &params, &schedule, &times, None, &mut NoopObserver)?;
//! ```

pub mod builder;
pub mod config;
pub mod driver;
pub mod error;
pub mod model;
pub mod observer;
pub mod rhs;
pub mod solver;
pub mod stochastic;
pub mod trajectory;


pub use builder::ModelBuilder;
pub use config::{AdaptiveOptions, IntegrationMethod, NonNegativity, SolverConfig};
pub use driver::Integrator;
pub use error::{SimError, SimResult};
pub use model::Model;
pub use observer::{NoopObserver, SolveObserver};
pub use rhs::{GenericRhs, RhsScratch, core_rhs};
pub use solver::{DormandPrince, FixedScheme, FixedStepper, FnSystem, OdeSystem};
pub use stochastic::StochasticStepper;
pub use trajectory::Trajectory;
