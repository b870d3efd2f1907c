//! `ParameterTensor` — the caller-supplied (parameter × time × node) values.

use em_core::{CoreError, ParamId};

use crate::{ParamsError, ParamsResult, TimeMajorParams};

/// Parameter values for one simulation, parameter-major.
///
/// Two layouts are accepted:
///
/// - **Full**: `P × T × N`, index `p * T * N + t * N + n`.
/// - **Broadcast**: `P × T`, index `p * T + t`; every node shares the value.
///
/// Read-only to the engine.  Use [`to_time_major`](Self::to_time_major) once
/// per integration to obtain the sliceable form.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParameterTensor {
    params: usize,
    times:  usize,
    /// `None` for the broadcast layout.
    nodes:  Option<usize>,
    data:   Vec<f64>,
}

impl ParameterTensor {
    /// Full `P × T × N` tensor.
    ///
    /// # Errors
    ///
    /// [`ParamsError::NoTimePoints`] if `times == 0`; [`ParamsError::Shape`]
    /// if `data.len() != params * times * nodes`.
    pub fn new(params: usize, times: usize, nodes: usize, data: Vec<f64>) -> ParamsResult<Self> {
        if times == 0 {
            return Err(ParamsError::NoTimePoints);
        }
        if data.len() != params * times * nodes {
            return Err(CoreError::ShapeMismatch {
                what:     "parameter tensor",
                expected: params * times * nodes,
                got:      data.len(),
            }
            .into());
        }
        Ok(Self { params, times, nodes: Some(nodes), data })
    }

    /// Reduced `P × T` tensor broadcast across every node.
    pub fn broadcast(params: usize, times: usize, data: Vec<f64>) -> ParamsResult<Self> {
        if times == 0 {
            return Err(ParamsError::NoTimePoints);
        }
        if data.len() != params * times {
            return Err(CoreError::ShapeMismatch {
                what:     "broadcast parameter tensor",
                expected: params * times,
                got:      data.len(),
            }
            .into());
        }
        Ok(Self { params, times, nodes: None, data })
    }

    /// Time-constant values: one `Vec` of per-node values per parameter.
    pub fn constant(rows: &[Vec<f64>]) -> ParamsResult<Self> {
        let nodes = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(rows.len() * nodes);
        for row in rows {
            if row.len() != nodes {
                return Err(CoreError::ShapeMismatch {
                    what:     "constant parameter row",
                    expected: nodes,
                    got:      row.len(),
                }
                .into());
            }
            data.extend_from_slice(row);
        }
        Self::new(rows.len(), 1, nodes, data)
    }

    pub fn params(&self) -> usize {
        self.params
    }

    pub fn times(&self) -> usize {
        self.times
    }

    /// Node count for the full layout, `None` when broadcast.
    pub fn nodes(&self) -> Option<usize> {
        self.nodes
    }

    /// Value of parameter `param` at time index `time` for node `node`.
    #[inline]
    pub fn get(&self, param: ParamId, time: usize, node: usize) -> f64 {
        match self.nodes {
            Some(n) => self.data[param.index() * self.times * n + time * n + node],
            None => self.data[param.index() * self.times + time],
        }
    }

    /// Reshape into time-major frames for `nodes` nodes.
    ///
    /// Broadcast tensors are expanded; full tensors must match `nodes`.
    pub fn to_time_major(&self, nodes: usize) -> ParamsResult<TimeMajorParams> {
        match self.nodes {
            Some(n) if n != nodes => {
                return Err(ParamsError::NodeCountMismatch { expected: nodes, got: n });
            }
            _ => {}
        }
        let frame_len = self.params * nodes;
        let mut frames = vec![0.0; self.times * frame_len];
        for t in 0..self.times {
            let frame = &mut frames[t * frame_len..(t + 1) * frame_len];
            for p in 0..self.params {
                let row = &mut frame[p * nodes..(p + 1) * nodes];
                for (n, v) in row.iter_mut().enumerate() {
                    *v = self.get(ParamId(p as u32), t, n);
                }
            }
        }
        Ok(TimeMajorParams::from_frames(self.times, self.params, nodes, frames))
    }
}
