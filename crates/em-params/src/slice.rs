//! Time-major parameter frames and the per-time slice they produce.

use em_core::{ParamId, day_of};

// ── SliceMode ─────────────────────────────────────────────────────────────────

/// How a continuous query time maps onto the discrete frames.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SliceMode {
    /// Frame `clamp(day_of(t), 0, T-1)` verbatim.  Parameters change only at
    /// whole days, on the same clock that schedules seeding.
    #[default]
    Step,
    /// Linear interpolation between the two frames bracketing `t`, clamped
    /// to the first/last frame outside `[0, T-1]`.
    Linear,
}

// ── ParamSlice ────────────────────────────────────────────────────────────────

/// One `P × N` parameter frame, parameter-major.
///
/// Intended as caller-owned scratch: allocate once with
/// [`TimeMajorParams::empty_slice`] and refill with
/// [`TimeMajorParams::slice_into`] on every right-hand-side evaluation.
#[derive(Clone, Debug, PartialEq)]
pub struct ParamSlice {
    params: usize,
    nodes:  usize,
    data:   Vec<f64>,
}

impl ParamSlice {
    pub fn zeros(params: usize, nodes: usize) -> Self {
        Self { params, nodes, data: vec![0.0; params * nodes] }
    }

    pub fn params(&self) -> usize {
        self.params
    }

    pub fn nodes(&self) -> usize {
        self.nodes
    }

    /// Per-node values of one parameter.
    #[inline]
    pub fn row(&self, param: ParamId) -> &[f64] {
        let start = param.index() * self.nodes;
        &self.data[start..start + self.nodes]
    }

    #[inline]
    pub fn get(&self, param: ParamId, node: usize) -> f64 {
        self.data[param.index() * self.nodes + node]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    fn reshape(&mut self, params: usize, nodes: usize) {
        self.params = params;
        self.nodes = nodes;
        self.data.resize(params * nodes, 0.0);
    }
}

// ── TimeMajorParams ───────────────────────────────────────────────────────────

/// Parameter tensor reshaped to `T × P × N`, optionally with precomputed
/// frame-to-frame deltas for linear slicing.
#[derive(Clone, Debug)]
pub struct TimeMajorParams {
    times:  usize,
    params: usize,
    nodes:  usize,
    frames: Vec<f64>,
    /// `(T - 1) × P × N`, `deltas[i] = frames[i + 1] - frames[i]`.
    deltas: Option<Vec<f64>>,
}

impl TimeMajorParams {
    pub(crate) fn from_frames(times: usize, params: usize, nodes: usize, frames: Vec<f64>) -> Self {
        debug_assert_eq!(frames.len(), times * params * nodes);
        Self { times, params, nodes, frames, deltas: None }
    }

    /// Precompute the deltas tensor used by linear slicing.
    pub fn with_deltas(mut self) -> Self {
        let len = self.frame_len();
        let mut deltas = vec![0.0; self.times.saturating_sub(1) * len];
        for (i, delta) in deltas.chunks_exact_mut(len.max(1)).enumerate() {
            let lo = &self.frames[i * len..(i + 1) * len];
            let hi = &self.frames[(i + 1) * len..(i + 2) * len];
            for ((d, a), b) in delta.iter_mut().zip(lo).zip(hi) {
                *d = b - a;
            }
        }
        self.deltas = Some(deltas);
        self
    }

    pub fn times(&self) -> usize {
        self.times
    }

    pub fn params(&self) -> usize {
        self.params
    }

    pub fn nodes(&self) -> usize {
        self.nodes
    }

    pub fn has_deltas(&self) -> bool {
        self.deltas.is_some()
    }

    #[inline]
    fn frame_len(&self) -> usize {
        self.params * self.nodes
    }

    /// Frame `i` as a flat `P × N` block.
    #[inline]
    pub fn frame(&self, i: usize) -> &[f64] {
        let len = self.frame_len();
        &self.frames[i * len..(i + 1) * len]
    }

    /// A correctly shaped scratch slice for [`slice_into`](Self::slice_into).
    pub fn empty_slice(&self) -> ParamSlice {
        ParamSlice::zeros(self.params, self.nodes)
    }

    /// Allocating form of [`slice_into`](Self::slice_into).
    pub fn slice(&self, t: f64, mode: SliceMode) -> ParamSlice {
        let mut out = self.empty_slice();
        self.slice_into(t, mode, &mut out);
        out
    }

    /// Overwrite `out` with the parameter values valid at time `t`.
    ///
    /// `out` is reshaped if it was built for a different tensor.
    pub fn slice_into(&self, t: f64, mode: SliceMode, out: &mut ParamSlice) {
        if out.params != self.params || out.nodes != self.nodes {
            out.reshape(self.params, self.nodes);
        }
        let last = self.times - 1;

        match mode {
            SliceMode::Step => {
                let i = step_index(t, last);
                out.data.copy_from_slice(self.frame(i));
            }
            SliceMode::Linear => {
                if self.times == 1 || t <= 0.0 || t.is_nan() {
                    out.data.copy_from_slice(self.frame(0));
                    return;
                }
                if t >= last as f64 {
                    out.data.copy_from_slice(self.frame(last));
                    return;
                }
                let i0 = t.floor() as usize;
                let alpha = t - i0 as f64;
                let lo = self.frame(i0);
                let len = self.frame_len();
                match &self.deltas {
                    Some(deltas) => {
                        let d = &deltas[i0 * len..(i0 + 1) * len];
                        for ((o, a), d) in out.data.iter_mut().zip(lo).zip(d) {
                            *o = a + alpha * d;
                        }
                    }
                    None => {
                        let hi = self.frame(i0 + 1);
                        for ((o, a), b) in out.data.iter_mut().zip(lo).zip(hi) {
                            *o = a + alpha * (b - a);
                        }
                    }
                }
            }
        }
    }
}

/// `clamp(day_of(t), 0, last)`, treating NaN as 0.
#[inline]
fn step_index(t: f64, last: usize) -> usize {
    if t.is_nan() {
        return 0;
    }
    day_of(t).index().map_or(0, |day| day.min(last))
}
