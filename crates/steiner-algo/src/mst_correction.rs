//! MST correction (§9, pre-computation variant only): adjusts the raw
//! per-FST tree cost for pairs of 2-terminal FSTs that share a terminal, to
//! approximate avoiding the double-counting an unconstrained MST would
//! otherwise incur at that shared terminal. The constraint-based
//! (y-variable) variant mentioned in the design notes is intentionally not
//! implemented anywhere in this crate (see DESIGN.md).

use steiner_core::{Fst, Hypergraph};

/// For every pair of 2-terminal FSTs sharing exactly one terminal, subtract
/// `distance(distal_a, distal_b) / 2` from each FST's cost, where
/// `distal_a`/`distal_b` are the two FSTs' non-shared terminal endpoints.
/// Returns a `cost` adjustment per FST id (index-aligned with
/// `hypergraph.fsts()`), to be added into the objective coefficient rather
/// than mutating `Fst::cost` in place (the hypergraph is otherwise
/// immutable post-normalization).
pub fn mst_correction_deltas(hypergraph: &Hypergraph) -> Vec<f64> {
    let fsts = hypergraph.fsts();
    let mut deltas = vec![0.0; fsts.len()];

    let two_terminal: Vec<&Fst> = fsts.iter().filter(|f| f.size() == 2).collect();
    for (a_idx, a) in two_terminal.iter().enumerate() {
        for b in two_terminal.iter().skip(a_idx + 1) {
            let shared: Vec<_> = a.shared_terminals(b).collect();
            if shared.len() != 1 {
                continue;
            }
            let shared_id = shared[0];
            let distal_a = a.terminals.iter().copied().find(|&t| t != shared_id);
            let distal_b = b.terminals.iter().copied().find(|&t| t != shared_id);
            let (Some(distal_a), Some(distal_b)) = (distal_a, distal_b) else {
                continue;
            };
            let d_ab = hypergraph
                .terminal(distal_a)
                .distance(hypergraph.terminal(distal_b));
            let correction = d_ab / 2.0;
            deltas[a.id.value()] -= correction;
            deltas[b.id.value()] -= correction;
        }
    }
    deltas
}
