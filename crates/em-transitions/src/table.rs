//! Compiled transition and proportion-info tables.
//!
//! # Data layout
//!
//! Three flat arrays, linked by half-open index ranges (the same CSR idea used
//! for the mobility graph):
//!
//! ```text
//! transitions[t].proportion_start .. proportion_stop   → proportions[..]
//! proportions[k].sum_start        .. sum_stop          → sum_compartments[..]
//! ```
//!
//! A transition's flow is `source_size × Π terms`, where each term is the sum
//! of its compartment rows raised to the exponent parameter.  The first term's
//! sum is the transition's source size.

use std::ops::Range;

use em_core::{CompartmentId, CoreError, ParamId, TransitionId};

use crate::{TransitionError, TransitionResult};

// ── Transition ────────────────────────────────────────────────────────────────

/// One directed compartment-to-compartment flow.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Transition {
    pub source:           CompartmentId,
    pub destination:      CompartmentId,
    /// Parameter row holding the transition's rate.
    pub rate:             ParamId,
    pub proportion_start: u32,
    pub proportion_stop:  u32,
}

impl Transition {
    #[inline]
    pub fn proportions(&self) -> Range<usize> {
        self.proportion_start as usize..self.proportion_stop as usize
    }

    #[inline]
    pub fn term_count(&self) -> usize {
        self.proportions().len()
    }

    /// Exactly one proportional term: the rate parameter is folded in by the
    /// rate computer and mobility mixing is skipped.
    #[inline]
    pub fn is_single_proportion(&self) -> bool {
        self.term_count() == 1
    }
}

// ── ProportionTerm ────────────────────────────────────────────────────────────

/// One multiplicative factor of a transition's rate.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProportionTerm {
    pub sum_start: u32,
    pub sum_stop:  u32,
    /// Parameter row holding the exponent applied to the summed size.
    pub exponent:  ParamId,
}

impl ProportionTerm {
    #[inline]
    pub fn sums(&self) -> Range<usize> {
        self.sum_start as usize..self.sum_stop as usize
    }
}

// ── TransitionTable ───────────────────────────────────────────────────────────

/// Immutable compiled model structure.  Build with
/// [`TransitionTableBuilder`] or [`TransitionTable::from_parts`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TransitionTable {
    transitions:      Vec<Transition>,
    proportions:      Vec<ProportionTerm>,
    sum_compartments: Vec<CompartmentId>,
}

impl TransitionTable {
    /// Assemble a table from precompiled arrays, checking that every range
    /// points inside its target array and that every transition has at least
    /// one proportional term.
    pub fn from_parts(
        transitions:      Vec<Transition>,
        proportions:      Vec<ProportionTerm>,
        sum_compartments: Vec<CompartmentId>,
    ) -> TransitionResult<Self> {
        for (i, tr) in transitions.iter().enumerate() {
            let id = TransitionId(i as u32);
            let (start, stop) = (tr.proportion_start as usize, tr.proportion_stop as usize);
            if start > stop || stop > proportions.len() {
                return Err(TransitionError::ProportionRange {
                    transition: id,
                    start,
                    stop,
                    len: proportions.len(),
                });
            }
            if start == stop {
                return Err(TransitionError::NoProportionalTerms(id));
            }
        }
        for (k, term) in proportions.iter().enumerate() {
            let (start, stop) = (term.sum_start as usize, term.sum_stop as usize);
            if start >= stop || stop > sum_compartments.len() {
                return Err(TransitionError::SumRange { term: k, start, stop });
            }
        }
        Ok(Self { transitions, proportions, sum_compartments })
    }

    /// Check every compartment and parameter reference against the model's
    /// dimensions.
    pub fn validate(&self, compartments: usize, params: usize) -> TransitionResult<()> {
        let check_c = |what: &'static str, c: CompartmentId| {
            if c.index() >= compartments {
                Err(CoreError::IndexOutOfRange { what, index: c.index(), bound: compartments })
            } else {
                Ok(())
            }
        };
        let check_p = |what: &'static str, p: ParamId| {
            if p.index() >= params {
                Err(CoreError::IndexOutOfRange { what, index: p.index(), bound: params })
            } else {
                Ok(())
            }
        };
        for tr in &self.transitions {
            check_c("transition source compartment", tr.source)?;
            check_c("transition destination compartment", tr.destination)?;
            check_p("transition rate parameter", tr.rate)?;
        }
        for term in &self.proportions {
            check_p("proportion exponent parameter", term.exponent)?;
        }
        for &c in &self.sum_compartments {
            check_c("summed compartment", c)?;
        }
        Ok(())
    }

    // ── Access ────────────────────────────────────────────────────────────

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    #[inline]
    pub fn transition(&self, id: TransitionId) -> &Transition {
        &self.transitions[id.index()]
    }

    /// The proportional terms of one transition, in order.
    #[inline]
    pub fn terms(&self, tr: &Transition) -> &[ProportionTerm] {
        &self.proportions[tr.proportions()]
    }

    /// Compartment rows summed by one term.
    #[inline]
    pub fn summed_rows(&self, term: &ProportionTerm) -> &[CompartmentId] {
        &self.sum_compartments[term.sums()]
    }

    /// `true` for every transition with exactly one proportional term.
    pub fn single_prop_mask(&self) -> Vec<bool> {
        self.transitions.iter().map(Transition::is_single_proportion).collect()
    }
}

// ── TransitionTableBuilder ────────────────────────────────────────────────────

/// Construct a [`TransitionTable`] transition by transition.
///
/// # Example
///
/// ```
/// use em_core::{CompartmentId, ParamId};
/// use em_transitions::TransitionTableBuilder;
///
/// let (s, i, r) = (CompartmentId(0), CompartmentId(1), CompartmentId(2));
/// let (beta, gamma, one) = (ParamId(0), ParamId(1), ParamId(2));
///
/// let mut b = TransitionTableBuilder::new();
/// // S → I at beta · S · I
/// b.add(s, i, beta, &[(&[s], one), (&[i], one)]);
/// // I → R at gamma · I
/// b.add(i, r, gamma, &[(&[i], one)]);
/// let table = b.build().unwrap();
/// assert_eq!(table.single_prop_mask(), vec![false, true]);
/// ```
#[derive(Default)]
pub struct TransitionTableBuilder {
    transitions:      Vec<Transition>,
    proportions:      Vec<ProportionTerm>,
    sum_compartments: Vec<CompartmentId>,
}

impl TransitionTableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a transition.  Each term is `(compartments to sum, exponent
    /// parameter)`; the first term defines the source size.
    pub fn add(
        &mut self,
        source:      CompartmentId,
        destination: CompartmentId,
        rate:        ParamId,
        terms:       &[(&[CompartmentId], ParamId)],
    ) -> TransitionId {
        let id = TransitionId(self.transitions.len() as u32);
        let proportion_start = self.proportions.len() as u32;
        for (rows, exponent) in terms {
            let sum_start = self.sum_compartments.len() as u32;
            self.sum_compartments.extend_from_slice(rows);
            self.proportions.push(ProportionTerm {
                sum_start,
                sum_stop: self.sum_compartments.len() as u32,
                exponent: *exponent,
            });
        }
        self.transitions.push(Transition {
            source,
            destination,
            rate,
            proportion_start,
            proportion_stop: self.proportions.len() as u32,
        });
        id
    }

    pub fn transition_count(&self) -> usize {
        self.transitions.len()
    }

    pub fn build(self) -> TransitionResult<TransitionTable> {
        TransitionTable::from_parts(self.transitions, self.proportions, self.sum_compartments)
    }
}
