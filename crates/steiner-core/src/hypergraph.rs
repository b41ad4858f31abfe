//! Hypergraph & Normalization (§4.1): the immutable post-FST-generation
//! record consumed by everything downstream.

use crate::edge_map::EdgeMap;
use crate::fst::Fst;
use crate::ids::TerminalId;
use crate::terminal::Terminal;

/// Immutable record of terminals and candidate FSTs, plus the derived edge
/// map. Built once per solve; `battery` fields on terminals are the only
/// thing the outer driver ever replaces between solves, and it does so by
/// constructing a fresh `Hypergraph`, not by mutating this one in place.
#[derive(Debug, Clone)]
pub struct Hypergraph {
    terminals: Vec<Terminal>,
    fsts: Vec<Fst>,
    edge_map: EdgeMap,
}

impl Hypergraph {
    /// Build from raw terminals and FSTs, normalizing FST costs in the same
    /// step (§4.1). `fsts` must already carry `cost = NaN`; this is the only
    /// place that ever assigns `Fst::cost`.
    pub fn new(terminals: Vec<Terminal>, mut fsts: Vec<Fst>) -> Self {
        let d = bounding_box_diagonal(&terminals);
        for fst in &mut fsts {
            fst.cost = if d == 0.0 { fst.length } else { fst.length / d };
        }
        let edge_map = EdgeMap::build(&fsts);
        Self {
            terminals,
            fsts,
            edge_map,
        }
    }

    pub fn terminals(&self) -> &[Terminal] {
        &self.terminals
    }

    pub fn fsts(&self) -> &[Fst] {
        &self.fsts
    }

    pub fn edge_map(&self) -> &EdgeMap {
        &self.edge_map
    }

    pub fn num_terminals(&self) -> usize {
        self.terminals.len()
    }

    pub fn num_fsts(&self) -> usize {
        self.fsts.len()
    }

    pub fn terminal(&self, id: TerminalId) -> &Terminal {
        &self.terminals[id.value()]
    }

    /// Replace the battery vector in place, keeping FSTs and the edge map
    /// untouched. Used by the battery evolution driver between outer
    /// iterations; coordinates and FST geometry never change across those
    /// iterations so rebuilding the edge map would be wasted work.
    pub fn with_batteries(mut self, batteries: &[f64]) -> Self {
        assert_eq!(batteries.len(), self.terminals.len());
        for (terminal, &battery) in self.terminals.iter_mut().zip(batteries) {
            terminal.battery = battery;
        }
        self
    }
}

/// `d = sqrt(dx^2 + dy^2)` over the terminal coordinates' bounding box.
/// Degenerate instances (all terminals coincident, or zero terminals)
/// return 0.0; callers must treat that as "leave costs unmodified".
fn bounding_box_diagonal(terminals: &[Terminal]) -> f64 {
    if terminals.is_empty() {
        return 0.0;
    }
    let (mut min_x, mut max_x) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut min_y, mut max_y) = (f64::INFINITY, f64::NEG_INFINITY);
    for t in terminals {
        min_x = min_x.min(t.x);
        max_x = max_x.max(t.x);
        min_y = min_y.min(t.y);
        max_y = max_y.max(t.y);
    }
    let dx = max_x - min_x;
    let dy = max_y - min_y;
    (dx * dx + dy * dy).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::FstId;

    fn terminals() -> Vec<Terminal> {
        vec![
            Terminal::new(TerminalId::new(0), 0.0, 0.0, 100.0),
            Terminal::new(TerminalId::new(1), 10.0, 0.0, 50.0),
            Terminal::new(TerminalId::new(2), 0.0, 10.0, 50.0),
        ]
    }

    #[test]
    fn normalizes_cost_by_diagonal() {
        let d = (10f64 * 10.0 + 10.0 * 10.0).sqrt();
        let fst = Fst::new(FstId::new(0), vec![TerminalId::new(0)], vec![], 1.9);
        let hg = Hypergraph::new(terminals(), vec![fst]);
        assert!((hg.fsts()[0].cost - 1.9 / d).abs() < 1e-12);
    }

    #[test]
    fn degenerate_instance_leaves_cost_as_length() {
        let coincident = vec![
            Terminal::new(TerminalId::new(0), 5.0, 5.0, 100.0),
            Terminal::new(TerminalId::new(1), 5.0, 5.0, 50.0),
        ];
        let fst = Fst::new(FstId::new(0), vec![TerminalId::new(0)], vec![], 3.0);
        let hg = Hypergraph::new(coincident, vec![fst]);
        assert_eq!(hg.fsts()[0].cost, 3.0);
    }

    #[test]
    fn normalization_is_idempotent_up_to_rounding() {
        let fst = Fst::new(FstId::new(0), vec![TerminalId::new(0)], vec![], 1.9);
        let hg1 = Hypergraph::new(terminals(), vec![fst.clone()]);
        let hg2 = Hypergraph::new(terminals(), vec![fst]);
        assert!((hg1.fsts()[0].cost - hg2.fsts()[0].cost).abs() < 1e-12);
    }
}
