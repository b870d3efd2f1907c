//! Solve observer trait for progress reporting and data collection.

use em_core::Day;

/// Callbacks invoked by [`Integrator::solve`][crate::Integrator::solve] and
/// [`StochasticStepper::run`][crate::StochasticStepper::run].
///
/// All methods have default no-op implementations so implementors only need to
/// override what they care about.
///
/// # Example — seeding log
///
/// ```rust,ignore
/// struct SeedLog(Vec<(Day, usize)>);
///
/// impl SolveObserver for SeedLog {
///     fn on_seeding(&mut self, day: Day, applied: usize) {
///         self.0.push((day, applied));
///     }
/// }
/// ```
pub trait SolveObserver {
    /// Called once before the first segment, with the first and last output
    /// times.
    fn on_solve_start(&mut self, _t0: f64, _t_end: f64) {}

    /// Called whenever a day with at least one seeding event is applied.
    fn on_seeding(&mut self, _day: Day, _applied: usize) {}

    /// Called at every requested output time with the flattened state.
    fn on_output(&mut self, _t: f64, _state: &[f64]) {}

    /// Called once after the last output time.
    fn on_solve_end(&mut self, _t_end: f64) {}
}

/// A [`SolveObserver`] that does nothing.
pub struct NoopObserver;

impl SolveObserver for NoopObserver {}
