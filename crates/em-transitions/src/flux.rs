//! Flux assembler: scatter per-transition amounts into `dy/dt`.

use crate::TransitionTable;

/// Write the compartment-major derivative for `amounts` (`Tn × N`) into
/// `out` (`C × N`).
///
/// Every amount is subtracted from its source row and added to its
/// destination row, so for each node the column sum of `out` is zero up to
/// round-off.
pub fn assemble_flux(
    amounts:      &[f64],
    table:        &TransitionTable,
    compartments: usize,
    nodes:        usize,
    out:          &mut [f64],
) {
    debug_assert_eq!(amounts.len(), table.len() * nodes);
    debug_assert_eq!(out.len(), compartments * nodes);
    out.fill(0.0);
    if nodes == 0 {
        return;
    }

    for (tr, amount) in table.transitions().iter().zip(amounts.chunks_exact(nodes)) {
        let src = tr.source.index() * nodes;
        for (d, a) in out[src..src + nodes].iter_mut().zip(amount) {
            *d -= a;
        }
        let dst = tr.destination.index() * nodes;
        for (d, a) in out[dst..dst + nodes].iter_mut().zip(amount) {
            *d += a;
        }
    }
}
