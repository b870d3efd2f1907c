//! ODE steppers.
//!
//! Every stepper integrates an [`OdeSystem`] over one segment `[t0, t1]`,
//! overwriting `y` in place.  The driver cuts a solve into segments at output
//! times and whole days, so no stepper ever crosses a seeding event.
//!
//! | Stepper            | Order | Step control                                  |
//! |--------------------|-------|-----------------------------------------------|
//! | [`FixedStepper`]   | 1 / 4 | fixed `dt`, last step shortened to hit `t1`   |
//! | [`DormandPrince`]  | 5(4)  | error-controlled, step size kept across calls |

use crate::{AdaptiveOptions, SimError, SimResult};

// ── OdeSystem ─────────────────────────────────────────────────────────────────

/// Right-hand side `dy/dt = f(t, y)`.
pub trait OdeSystem {
    /// Number of state variables.
    fn ndim(&self) -> usize;

    /// Write `f(t, y)` into `dydt`.  Both slices have length `ndim()`.
    fn rhs(&mut self, t: f64, y: &[f64], dydt: &mut [f64]) -> SimResult<()>;
}

/// An [`OdeSystem`] backed by a closure.
pub struct FnSystem<F> {
    ndim: usize,
    f:    F,
}

impl<F> FnSystem<F>
where
    F: FnMut(f64, &[f64], &mut [f64]) -> SimResult<()>,
{
    pub fn new(ndim: usize, f: F) -> Self {
        Self { ndim, f }
    }
}

impl<F> OdeSystem for FnSystem<F>
where
    F: FnMut(f64, &[f64], &mut [f64]) -> SimResult<()>,
{
    fn ndim(&self) -> usize {
        self.ndim
    }

    fn rhs(&mut self, t: f64, y: &[f64], dydt: &mut [f64]) -> SimResult<()> {
        (self.f)(t, y, dydt)
    }
}

// ── Fixed step ────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FixedScheme {
    Euler,
    Rk4,
}

/// Explicit Euler or classic RK4 with a constant step.
pub struct FixedStepper {
    scheme: FixedScheme,
    dt:     f64,
    k1:     Vec<f64>,
    k2:     Vec<f64>,
    k3:     Vec<f64>,
    k4:     Vec<f64>,
    tmp:    Vec<f64>,
}

impl FixedStepper {
    pub fn new(scheme: FixedScheme, dt: f64, ndim: usize) -> Self {
        let stages = match scheme {
            FixedScheme::Euler => 0,
            FixedScheme::Rk4 => ndim,
        };
        Self {
            scheme,
            dt,
            k1:  vec![0.0; ndim],
            k2:  vec![0.0; stages],
            k3:  vec![0.0; stages],
            k4:  vec![0.0; stages],
            tmp: vec![0.0; stages],
        }
    }

    /// Number of steps used for a segment of length `span`.  A remainder
    /// below 1e-9 steps is folded into the last step.
    pub fn steps_for(&self, span: f64) -> usize {
        ((span / self.dt) - 1e-9).ceil().max(1.0) as usize
    }

    /// Advance `y` from `t0` to `t1`.
    pub fn integrate<S: OdeSystem>(
        &mut self,
        sys: &mut S,
        y:   &mut [f64],
        t0:  f64,
        t1:  f64,
    ) -> SimResult<usize> {
        if t1 <= t0 {
            return Ok(0);
        }
        let n = self.steps_for(t1 - t0);
        for i in 0..n {
            let t = t0 + i as f64 * self.dt;
            let h = if i + 1 == n { t1 - t } else { self.dt };
            match self.scheme {
                FixedScheme::Euler => self.euler_step(sys, y, t, h)?,
                FixedScheme::Rk4 => self.rk4_step(sys, y, t, h)?,
            }
        }
        Ok(n)
    }

    fn euler_step<S: OdeSystem>(&mut self, sys: &mut S, y: &mut [f64], t: f64, h: f64) -> SimResult<()> {
        sys.rhs(t, y, &mut self.k1)?;
        for (yi, k) in y.iter_mut().zip(&self.k1) {
            *yi += h * k;
        }
        Ok(())
    }

    fn rk4_step<S: OdeSystem>(&mut self, sys: &mut S, y: &mut [f64], t: f64, h: f64) -> SimResult<()> {
        let half = 0.5 * h;

        sys.rhs(t, y, &mut self.k1)?;
        for ((o, yi), k) in self.tmp.iter_mut().zip(y.iter()).zip(&self.k1) {
            *o = yi + half * k;
        }
        sys.rhs(t + half, &self.tmp, &mut self.k2)?;
        for ((o, yi), k) in self.tmp.iter_mut().zip(y.iter()).zip(&self.k2) {
            *o = yi + half * k;
        }
        sys.rhs(t + half, &self.tmp, &mut self.k3)?;
        for ((o, yi), k) in self.tmp.iter_mut().zip(y.iter()).zip(&self.k3) {
            *o = yi + h * k;
        }
        sys.rhs(t + h, &self.tmp, &mut self.k4)?;

        let sixth = h / 6.0;
        for i in 0..y.len() {
            y[i] += sixth * (self.k1[i] + 2.0 * self.k2[i] + 2.0 * self.k3[i] + self.k4[i]);
        }
        Ok(())
    }
}

// ── Dormand–Prince 4(5) ───────────────────────────────────────────────────────

const C2: f64 = 1.0 / 5.0;
const C3: f64 = 3.0 / 10.0;
const C4: f64 = 4.0 / 5.0;
const C5: f64 = 8.0 / 9.0;

const A21: f64 = 1.0 / 5.0;
const A31: f64 = 3.0 / 40.0;
const A32: f64 = 9.0 / 40.0;
const A41: f64 = 44.0 / 45.0;
const A42: f64 = -56.0 / 15.0;
const A43: f64 = 32.0 / 9.0;
const A51: f64 = 19372.0 / 6561.0;
const A52: f64 = -25360.0 / 2187.0;
const A53: f64 = 64448.0 / 6561.0;
const A54: f64 = -212.0 / 729.0;
const A61: f64 = 9017.0 / 3168.0;
const A62: f64 = -355.0 / 33.0;
const A63: f64 = 46732.0 / 5247.0;
const A64: f64 = 49.0 / 176.0;
const A65: f64 = -5103.0 / 18656.0;

// Fifth-order weights; the advancing solution.
const B1: f64 = 35.0 / 384.0;
const B3: f64 = 500.0 / 1113.0;
const B4: f64 = 125.0 / 192.0;
const B5: f64 = -2187.0 / 6784.0;
const B6: f64 = 11.0 / 84.0;

// Fifth minus embedded fourth order.
const E1: f64 = B1 - 5179.0 / 57600.0;
const E3: f64 = B3 - 7571.0 / 16695.0;
const E4: f64 = B4 - 393.0 / 640.0;
const E5: f64 = B5 - -92097.0 / 339200.0;
const E6: f64 = B6 - 187.0 / 2100.0;
const E7: f64 = -1.0 / 40.0;

const SAFETY: f64 = 0.9;
const MIN_FACTOR: f64 = 0.2;
const MAX_FACTOR: f64 = 5.0;

/// Adaptive Dormand–Prince 5(4) stepper.
///
/// The last accepted step size carries over to the next segment, so
/// back-to-back one-day segments do not restart from a tiny trial step.
pub struct DormandPrince {
    opts:     AdaptiveOptions,
    h:        Option<f64>,
    accepted: usize,
    rejected: usize,
    k:        [Vec<f64>; 7],
    tmp:      Vec<f64>,
    y_new:    Vec<f64>,
}

impl DormandPrince {
    pub fn new(opts: AdaptiveOptions, ndim: usize) -> Self {
        Self {
            opts,
            h: None,
            accepted: 0,
            rejected: 0,
            k: std::array::from_fn(|_| vec![0.0; ndim]),
            tmp: vec![0.0; ndim],
            y_new: vec![0.0; ndim],
        }
    }

    /// Accepted steps since construction.
    pub fn accepted_steps(&self) -> usize {
        self.accepted
    }

    pub fn rejected_steps(&self) -> usize {
        self.rejected
    }

    /// Advance `y` from `t0` to `t1` under error control.
    ///
    /// # Errors
    ///
    /// [`SimError::Solver`] if the step size would drop below `h_min` while
    /// the error is still too large, or if `max_steps` attempts do not reach
    /// `t1`.
    pub fn integrate<S: OdeSystem>(
        &mut self,
        sys: &mut S,
        y:   &mut [f64],
        t0:  f64,
        t1:  f64,
    ) -> SimResult<usize> {
        if t1 <= t0 {
            return Ok(0);
        }
        let span = t1 - t0;
        let opts = self.opts;
        let mut h = match self.h {
            Some(h) => h,
            None if opts.h0 > 0.0 => opts.h0,
            None => (span * 1e-2).max(opts.h_min),
        }
        .clamp(opts.h_min, opts.h_max);

        let mut t = t0;
        let mut steps = 0;
        let n = y.len();
        let [k1, k2, k3, k4, k5, k6, k7] = &mut self.k;
        let tmp = &mut self.tmp;
        let y_new = &mut self.y_new;

        sys.rhs(t, y, k1)?;

        for _ in 0..opts.max_steps {
            let remaining = t1 - t;
            // Land exactly on t1 rather than leave a sliver.
            let last = h >= remaining * (1.0 - 1e-12);
            let h_step = if last { remaining } else { h };

            for i in 0..n {
                tmp[i] = y[i] + h_step * A21 * k1[i];
            }
            sys.rhs(t + C2 * h_step, tmp, k2)?;
            for i in 0..n {
                tmp[i] = y[i] + h_step * (A31 * k1[i] + A32 * k2[i]);
            }
            sys.rhs(t + C3 * h_step, tmp, k3)?;
            for i in 0..n {
                tmp[i] = y[i] + h_step * (A41 * k1[i] + A42 * k2[i] + A43 * k3[i]);
            }
            sys.rhs(t + C4 * h_step, tmp, k4)?;
            for i in 0..n {
                tmp[i] = y[i] + h_step * (A51 * k1[i] + A52 * k2[i] + A53 * k3[i] + A54 * k4[i]);
            }
            sys.rhs(t + C5 * h_step, tmp, k5)?;
            for i in 0..n {
                tmp[i] = y[i]
                    + h_step * (A61 * k1[i] + A62 * k2[i] + A63 * k3[i] + A64 * k4[i] + A65 * k5[i]);
            }
            sys.rhs(t + h_step, tmp, k6)?;
            for i in 0..n {
                y_new[i] = y[i]
                    + h_step * (B1 * k1[i] + B3 * k3[i] + B4 * k4[i] + B5 * k5[i] + B6 * k6[i]);
            }
            let t_new = if last { t1 } else { t + h_step };
            sys.rhs(t_new, y_new, k7)?;

            let mut err = 0.0;
            for i in 0..n {
                let e = h_step
                    * (E1 * k1[i] + E3 * k3[i] + E4 * k4[i] + E5 * k5[i] + E6 * k6[i] + E7 * k7[i]);
                let scale = opts.atol + opts.rtol * y[i].abs().max(y_new[i].abs());
                err += (e / scale) * (e / scale);
            }
            let err = if n == 0 { 0.0 } else { (err / n as f64).sqrt() };
            if !err.is_finite() {
                return Err(SimError::Solver(format!("non-finite error estimate at t = {t}")));
            }

            let factor = if err == 0.0 {
                MAX_FACTOR
            } else {
                (SAFETY * err.powf(-0.2)).clamp(MIN_FACTOR, MAX_FACTOR)
            };

            if err <= 1.0 {
                y.copy_from_slice(y_new);
                std::mem::swap(k1, k7);
                t = t_new;
                steps += 1;
                self.accepted += 1;
                if last {
                    self.h = Some(h);
                    return Ok(steps);
                }
                h = (h_step * factor).clamp(opts.h_min, opts.h_max);
            } else {
                self.rejected += 1;
                if h_step <= opts.h_min {
                    return Err(SimError::Solver(format!(
                        "step size underflow at t = {t} (error norm {err:.3e})"
                    )));
                }
                h = (h_step * factor).max(opts.h_min);
            }
        }

        Err(SimError::Solver(format!(
            "max_steps = {} exhausted at t = {t} before reaching {t1}",
            opts.max_steps
        )))
    }
}
