//! MultiTemporalLayout (§3, §4.3): fixed variable-index assignment across
//! `T` periods plus the trailing inter-period edge-change block.

use steiner_core::Hypergraph;
use steiner_solver_common::VarBounds;

/// Fixed offsets and sizes for one solve's variable block. Indices are
/// computed, never searched for; offsets are frozen at construction.
#[derive(Debug, Clone, Copy)]
pub struct Layout {
    num_fsts: usize,
    num_terminals: usize,
    num_edges: usize,
    periods: usize,
    /// Per-period block size `P = |FSTs| + |terminals| + |edges| + |terminals|`.
    period_size: usize,
    /// Total variable count `V = T*P + (T-1)*|edges|`.
    num_vars: usize,
}

impl Layout {
    pub fn new(hypergraph: &Hypergraph, periods: usize) -> Self {
        let num_fsts = hypergraph.num_fsts();
        let num_terminals = hypergraph.num_terminals();
        let num_edges = hypergraph.edge_map().num_edges();
        let period_size = num_fsts + num_terminals + num_edges + num_terminals;
        let num_vars = periods * period_size + periods.saturating_sub(1) * num_edges;
        Self {
            num_fsts,
            num_terminals,
            num_edges,
            periods,
            period_size,
            num_vars,
        }
    }

    pub fn periods(&self) -> usize {
        self.periods
    }

    pub fn num_fsts(&self) -> usize {
        self.num_fsts
    }

    pub fn num_terminals(&self) -> usize {
        self.num_terminals
    }

    pub fn num_edges(&self) -> usize {
        self.num_edges
    }

    pub fn period_size(&self) -> usize {
        self.period_size
    }

    pub fn num_vars(&self) -> usize {
        self.num_vars
    }

    #[inline]
    pub fn x_index(&self, t: usize, i: usize) -> usize {
        debug_assert!(i < self.num_fsts);
        t * self.period_size + i
    }

    #[inline]
    pub fn uncov_index(&self, t: usize, j: usize) -> usize {
        debug_assert!(j < self.num_terminals);
        t * self.period_size + self.num_fsts + j
    }

    #[inline]
    pub fn z_index(&self, t: usize, e: usize) -> usize {
        debug_assert!(e < self.num_edges);
        t * self.period_size + self.num_fsts + self.num_terminals + e
    }

    #[inline]
    pub fn b_index(&self, t: usize, j: usize) -> usize {
        debug_assert!(j < self.num_terminals);
        t * self.period_size + self.num_fsts + self.num_terminals + self.num_edges + j
    }

    /// `D[e, tau]`, `tau` in `0..T-1`.
    #[inline]
    pub fn d_index(&self, tau: usize, e: usize) -> usize {
        debug_assert!(tau + 1 < self.periods);
        debug_assert!(e < self.num_edges);
        self.periods * self.period_size + tau * self.num_edges + e
    }

    /// Bounds for every variable in layout order (§4.3). LP relaxation
    /// bounds `x` to `[0,1]`; integrality is enforced by branching, not by
    /// these bounds.
    pub fn var_bounds(&self) -> Vec<VarBounds> {
        let mut bounds = Vec::with_capacity(self.num_vars);
        for _t in 0..self.periods {
            bounds.extend(std::iter::repeat(VarBounds::binary()).take(self.num_fsts));
            bounds.extend(std::iter::repeat(VarBounds::new(0.0, 1.0)).take(self.num_terminals));
            bounds.extend(std::iter::repeat(VarBounds::new(0.0, 1.0)).take(self.num_edges));
            bounds.extend(std::iter::repeat(VarBounds::new(0.0, 100.0)).take(self.num_terminals));
        }
        for _tau in 0..self.periods.saturating_sub(1) {
            bounds.extend(std::iter::repeat(VarBounds::new(0.0, 1.0)).take(self.num_edges));
        }
        bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use steiner_core::{Fst, GeometricEdge, PointId, Terminal, TerminalId};

    fn two_terminal_hypergraph() -> Hypergraph {
        let terminals = vec![
            Terminal::new(TerminalId::new(0), 0.0, 0.0, 100.0),
            Terminal::new(TerminalId::new(1), 1.0, 0.0, 50.0),
        ];
        let fst = Fst::new(
            steiner_core::FstId::new(0),
            vec![TerminalId::new(0), TerminalId::new(1)],
            vec![GeometricEdge::new(PointId::new(0), PointId::new(1), 1.0)],
            1.0,
        );
        Hypergraph::new(terminals, vec![fst])
    }

    #[test]
    fn offsets_never_collide_within_a_period() {
        let hg = two_terminal_hypergraph();
        let layout = Layout::new(&hg, 1);
        let mut seen = std::collections::HashSet::new();
        assert!(seen.insert(layout.x_index(0, 0)));
        assert!(seen.insert(layout.uncov_index(0, 0)));
        assert!(seen.insert(layout.uncov_index(0, 1)));
        assert!(seen.insert(layout.z_index(0, 0)));
        assert!(seen.insert(layout.b_index(0, 0)));
        assert!(seen.insert(layout.b_index(0, 1)));
    }

    #[test]
    fn total_var_count_matches_formula() {
        let hg = two_terminal_hypergraph();
        let layout = Layout::new(&hg, 3);
        let p = layout.period_size();
        assert_eq!(layout.num_vars(), 3 * p + 2 * layout.num_edges());
    }

    #[test]
    fn single_period_has_no_d_block() {
        let hg = two_terminal_hypergraph();
        let layout = Layout::new(&hg, 1);
        assert_eq!(layout.num_vars(), layout.period_size());
    }

    #[test]
    fn var_bounds_has_one_entry_per_variable() {
        let hg = two_terminal_hypergraph();
        let layout = Layout::new(&hg, 2);
        assert_eq!(layout.var_bounds().len(), layout.num_vars());
    }
}
