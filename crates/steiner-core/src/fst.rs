//! Full Steiner Tree (FST) candidate hyperedges (§3 Data Model).

use crate::ids::{FstId, PointId, TerminalId};
use serde::{Deserialize, Serialize};

/// One geometric edge within an FST's internal tree, before aggregation by
/// [`crate::edge_map::EdgeMap`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeometricEdge {
    pub a: PointId,
    pub b: PointId,
    pub length: f64,
}

impl GeometricEdge {
    pub fn new(a: PointId, b: PointId, length: f64) -> Self {
        Self { a, b, length }
    }

    /// Canonical endpoint order: smaller id first. `EdgeMap` relies on this
    /// for de-duplication.
    pub fn canonical_endpoints(&self) -> (PointId, PointId) {
        if self.a.value() <= self.b.value() {
            (self.a, self.b)
        } else {
            (self.b, self.a)
        }
    }
}

/// A candidate hyperedge: a locally Steiner-optimal tree connecting a
/// specific subset of terminals. Immutable after generation, save for the
/// one-time `cost` normalization performed in [`crate::hypergraph`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fst {
    pub id: FstId,
    pub terminals: Vec<TerminalId>,
    pub edges: Vec<GeometricEdge>,
    pub length: f64,
    /// `length / bounding_box_diagonal`, filled in by
    /// `Hypergraph::normalize_costs`. `NaN` until normalization runs.
    pub cost: f64,
}

impl Fst {
    pub fn new(id: FstId, terminals: Vec<TerminalId>, edges: Vec<GeometricEdge>, length: f64) -> Self {
        Self {
            id,
            terminals,
            edges,
            length,
            cost: f64::NAN,
        }
    }

    pub fn size(&self) -> usize {
        self.terminals.len()
    }

    pub fn contains_terminal(&self, t: TerminalId) -> bool {
        self.terminals.contains(&t)
    }

    /// Terminal ids shared between `self` and `other`.
    pub fn shared_terminals<'a>(&'a self, other: &'a Fst) -> impl Iterator<Item = TerminalId> + 'a {
        self.terminals
            .iter()
            .copied()
            .filter(move |t| other.terminals.contains(t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_endpoints_orders_smaller_first() {
        let e = GeometricEdge::new(PointId::new(5), PointId::new(2), 1.0);
        assert_eq!(e.canonical_endpoints(), (PointId::new(2), PointId::new(5)));
    }

    #[test]
    fn shared_terminals_finds_overlap() {
        let f0 = Fst::new(
            FstId::new(0),
            vec![TerminalId::new(0), TerminalId::new(1)],
            vec![],
            1.0,
        );
        let f1 = Fst::new(
            FstId::new(1),
            vec![TerminalId::new(1), TerminalId::new(2)],
            vec![],
            1.0,
        );
        let shared: Vec<_> = f0.shared_terminals(&f1).collect();
        assert_eq!(shared, vec![TerminalId::new(1)]);
    }
}
