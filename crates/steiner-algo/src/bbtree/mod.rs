//! BBTree (§4.7): branch-and-cut node scheduler with best-first ordering,
//! branch selection, child creation, and cycle rejection.

pub mod node;
pub mod union_find;

use crate::layout::Layout;
use node::{BranchNode, NodeId, QueueEntry};
use std::collections::BinaryHeap;
use steiner_core::Fst;
use union_find::UnionFind;

/// Node queue plus the bookkeeping (next node id, nodes explored) needed to
/// run branch-and-cut to completion.
pub struct BBTree {
    queue: BinaryHeap<QueueEntry>,
    next_id: u64,
    nodes_explored: u64,
}

impl BBTree {
    pub fn new() -> Self {
        Self {
            queue: BinaryHeap::new(),
            next_id: 0,
            nodes_explored: 0,
        }
    }

    fn fresh_id(&mut self) -> NodeId {
        let id = NodeId::new(self.next_id);
        self.next_id += 1;
        id
    }

    /// Enqueues the root node: no fixings, primal produced by the first
    /// `LPRelaxationLoop` run.
    pub fn seed_root(&mut self, num_x_vars: usize) {
        let id = self.fresh_id();
        let node = BranchNode::root(id, num_x_vars);
        self.queue.push(QueueEntry {
            lp_objective: node.lp_objective,
            depth: node.depth,
            node,
        });
    }

    pub fn pop(&mut self) -> Option<BranchNode> {
        self.nodes_explored += 1;
        self.queue.pop().map(|entry| entry.node)
    }

    pub fn push(&mut self, node: BranchNode) {
        self.queue.push(QueueEntry {
            lp_objective: node.lp_objective,
            depth: node.depth,
            node,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn nodes_explored(&self) -> u64 {
        self.nodes_explored
    }

    /// Best LP bound among live (queued) nodes; feeds `IncumbentTracker`.
    pub fn best_live_bound(&self) -> Option<f64> {
        self.queue.iter().map(|e| e.lp_objective).fold(None, |acc, v| {
            Some(acc.map_or(v, |a: f64| a.min(v)))
        })
    }

    /// §4.7 Pruning: discard if the node's LP objective is already no
    /// better than the incumbent.
    pub fn should_prune(node_objective: f64, incumbent: Option<f64>, epsilon: f64) -> bool {
        match incumbent {
            Some(inc) => node_objective >= inc - epsilon,
            None => false,
        }
    }

    /// §4.7 Branch selection: among fractional `x[i,t]` (period 0 first,
    /// falling back to later periods only if period 0 has none fractional),
    /// pick the variable maximizing `branch_decay * fractionality`.
    pub fn select_branch_variable(node: &BranchNode, layout: &Layout) -> Option<usize> {
        for t in 0..layout.periods() {
            let mut best: Option<(usize, f64)> = None;
            for i in 0..layout.num_fsts() {
                let var = layout.x_index(t, i);
                if node.fixed.contains_key(&var) {
                    continue;
                }
                let value = node.primal.get(var).copied().unwrap_or(0.0);
                let frac = value.min(1.0 - value);
                if frac <= 1e-9 {
                    continue;
                }
                let decay = node.branch_decay.get(var).copied().unwrap_or(1.0);
                let score = decay * frac;
                if best.map_or(true, |(_, best_score)| score > best_score) {
                    best = Some((var, score));
                }
            }
            if let Some((var, _)) = best {
                return Some(var);
            }
        }
        None
    }

    /// §4.7 Child creation: duplicates the parent's primal cache and
    /// fixing/value bitmaps, extends with the chosen fixing, assigns a
    /// fresh node id.
    pub fn create_child(&mut self, parent: &BranchNode, fix_var: usize, fix_value: bool) -> BranchNode {
        let id = self.fresh_id();
        parent.child(id, fix_var, fix_value)
    }

    /// §4.7 Cycle rejection: walks each period's selected FSTs
    /// (`x[i,t] >= 0.5`) through a union-find over terminals. The first FST
    /// whose terminals are already mutually connected closes a cycle;
    /// returns a subtour-elimination row
    /// (`sum_{i in involved} x[i,t] <= |involved| - 1`) over every selected
    /// FST processed in that period up to and including the offending one.
    /// `None` means the primal is cycle-free at every period.
    pub fn find_violated_cycle(
        node: &BranchNode,
        layout: &Layout,
        fsts: &[Fst],
    ) -> Option<(Vec<(u32, i64)>, i64)> {
        for t in 0..layout.periods() {
            let selected: Vec<usize> = (0..layout.num_fsts())
                .filter(|&i| node.primal.get(layout.x_index(t, i)).copied().unwrap_or(0.0) >= 0.5)
                .collect();
            if selected.len() < 2 {
                continue;
            }

            let mut uf = UnionFind::new(layout.num_terminals());
            let mut involved = Vec::new();
            for &i in &selected {
                let terminals = &fsts[i].terminals;
                if terminals.len() < 2 {
                    involved.push(i);
                    continue;
                }
                let anchor = terminals[0].value();
                let already_connected = terminals[1..]
                    .iter()
                    .any(|t| uf.connected(anchor, t.value()));
                involved.push(i);
                for t in &terminals[1..] {
                    uf.union(anchor, t.value());
                }
                if already_connected {
                    let coeffs: Vec<(u32, i64)> = involved
                        .iter()
                        .map(|&fi| (layout.x_index(t, fi) as u32, 1))
                        .collect();
                    let rhs = involved.len() as i64 - 1;
                    return Some((coeffs, rhs));
                }
            }
        }
        None
    }
}

impl Default for BBTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use steiner_core::{FstId, GeometricEdge, Hypergraph, PointId, Terminal, TerminalId};

    fn four_terminal_hypergraph_with_cycle() -> (Hypergraph, Layout) {
        let terminals = (0..4)
            .map(|i| Terminal::new(TerminalId::new(i), i as f64, 0.0, 100.0))
            .collect();
        // F0{0,1}, F1{1,2}, F2{0,2} — a triangle among terminals 0,1,2.
        let f0 = Fst::new(
            FstId::new(0),
            vec![TerminalId::new(0), TerminalId::new(1)],
            vec![GeometricEdge::new(PointId::new(0), PointId::new(1), 1.0)],
            1.0,
        );
        let f1 = Fst::new(
            FstId::new(1),
            vec![TerminalId::new(1), TerminalId::new(2)],
            vec![GeometricEdge::new(PointId::new(1), PointId::new(2), 1.0)],
            1.0,
        );
        let f2 = Fst::new(
            FstId::new(2),
            vec![TerminalId::new(0), TerminalId::new(2)],
            vec![GeometricEdge::new(PointId::new(0), PointId::new(2), 1.0)],
            1.0,
        );
        let hg = Hypergraph::new(terminals, vec![f0, f1, f2]);
        let layout = Layout::new(&hg, 1);
        (hg, layout)
    }

    #[test]
    fn detects_triangle_cycle() {
        let (hg, layout) = four_terminal_hypergraph_with_cycle();
        let mut node = BranchNode::root(NodeId::new(0), layout.num_fsts());
        node.primal = vec![0.0; layout.num_vars()];
        node.primal[layout.x_index(0, 0)] = 1.0;
        node.primal[layout.x_index(0, 1)] = 1.0;
        node.primal[layout.x_index(0, 2)] = 1.0;
        let violation = BBTree::find_violated_cycle(&node, &layout, hg.fsts());
        assert!(violation.is_some());
        let (coeffs, rhs) = violation.unwrap();
        assert_eq!(coeffs.len() as i64, rhs + 1);
    }

    #[test]
    fn spanning_tree_selection_has_no_cycle() {
        let (hg, layout) = four_terminal_hypergraph_with_cycle();
        let mut node = BranchNode::root(NodeId::new(0), layout.num_fsts());
        node.primal = vec![0.0; layout.num_vars()];
        node.primal[layout.x_index(0, 0)] = 1.0;
        node.primal[layout.x_index(0, 1)] = 1.0;
        // F2 omitted: {0-1, 1-2} is a spanning tree, no cycle.
        let violation = BBTree::find_violated_cycle(&node, &layout, hg.fsts());
        assert!(violation.is_none());
    }

    #[test]
    fn pruning_discards_nodes_no_better_than_incumbent() {
        assert!(BBTree::should_prune(-5.0, Some(-5.0), 1e-9));
        assert!(!BBTree::should_prune(-10.0, Some(-5.0), 1e-9));
        assert!(!BBTree::should_prune(-5.0, None, 1e-9));
    }
}
