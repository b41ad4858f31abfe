//! # steiner-algo
//!
//! The branch-and-cut MILP engine (§4): constraint pool, variable layout,
//! objective construction, LP relaxation loop, and the branch-and-bound
//! tree, tied together by [`SolverContext`] (§9 "source-language global
//! state maps to explicit context").

pub mod bbtree;
pub mod config;
pub mod incumbent;
pub mod io_format;
pub mod layout;
pub mod lp;
pub mod mst_correction;
pub mod objective;
pub mod pool;
pub mod relaxation;

pub use bbtree::BBTree;
pub use config::SolverConfig;
pub use incumbent::IncumbentTracker;
pub use io_format::SolveReport;
pub use layout::Layout;
pub use lp::ClarabelLpSolver;
pub use objective::ObjectiveBuilder;
pub use pool::ConstraintPool;
pub use relaxation::{LPRelaxationLoop, RelaxationStatus};

use bbtree::node::BranchNode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use steiner_core::{Fst, Hypergraph, TerminalId};
use steiner_solver_common::{ExitCode, LpSolver, RowOp, SolverError, SolverResult, VarBounds};

/// Owns every piece of mutable solve state for one instance (§9
/// `SolverContext`): the pool, the LP handle, the layout, the node queue,
/// and the incumbent tracker. No routine here reaches for process-wide
/// state; everything is an explicit method on this struct.
pub struct SolverContext<'a> {
    hypergraph: &'a Hypergraph,
    layout: Layout,
    config: SolverConfig,
    pool: ConstraintPool,
    lp: Box<dyn LpSolver>,
    objective: Vec<f64>,
    base_var_bounds: Vec<VarBounds>,
    tree: BBTree,
    incumbent: IncumbentTracker,
    preempt: Arc<AtomicBool>,
}

impl<'a> SolverContext<'a> {
    pub fn new(
        hypergraph: &'a Hypergraph,
        config: SolverConfig,
        mut lp: Box<dyn LpSolver>,
        preempt: Arc<AtomicBool>,
    ) -> SolverResult<Self> {
        config
            .validate()
            .map_err(SolverError::InputMalformed)?;

        let layout = Layout::new(hypergraph, config.time_periods);
        let objective = ObjectiveBuilder::new(hypergraph, &layout, &config).build();
        let base_var_bounds = layout.var_bounds();

        lp.load(&base_var_bounds, &objective)?;

        let mut pool = ConstraintPool::new();
        seed_constraints(&mut pool, hypergraph, &layout, &config);
        pool.flush_pending_to_lp(lp.as_mut())?;

        let mut tree = BBTree::new();
        tree.seed_root(layout.num_vars());

        Ok(Self {
            hypergraph,
            layout,
            config,
            pool,
            lp,
            objective,
            base_var_bounds,
            tree,
            incumbent: IncumbentTracker::new(1.0),
            preempt,
        })
    }

    /// Runs branch-and-cut to completion, gap-target preemption, or user
    /// preemption, whichever comes first (§4.7, §4.8).
    pub fn solve(mut self) -> SolverResult<SolveReport> {
        self.incumbent = IncumbentTracker::new(self.config.gap_target);
        let start = Instant::now();
        let mut exit_code = ExitCode::Fatal;

        loop {
            if self.preempt.load(Ordering::Relaxed) {
                exit_code = ExitCode::Preempted;
                break;
            }
            let Some(mut node) = self.tree.pop() else {
                exit_code = ExitCode::Optimal;
                break;
            };

            self.apply_fixings(&node)?;

            let objective = self.objective.clone();
            let status = {
                let mut relax = LPRelaxationLoop::new(&mut self.pool, self.lp.as_mut(), &self.config, &objective);
                relax.run(&mut node)?
            };

            match status {
                RelaxationStatus::Infeasible | RelaxationStatus::Cutoff => continue,
                RelaxationStatus::Optimal => {}
            }

            if BBTree::should_prune(node.lp_objective, self.incumbent.best_objective(), self.config.fuzz) {
                continue;
            }

            if let Some((coeffs, rhs)) =
                BBTree::find_violated_cycle(&node, &self.layout, self.hypergraph.fsts())
            {
                let (id, _) = self.pool.add_row(coeffs, RowOp::Le, rhs, false);
                self.pool.mark_pending(id);
                self.pool.flush_pending_to_lp(self.lp.as_mut())?;
                self.tree.push(node);
                continue;
            }

            if self.is_integer_feasible(&node) {
                self.incumbent.offer_incumbent(node.lp_objective, &node.primal);
            } else if let Some(var) = BBTree::select_branch_variable(&node, &self.layout) {
                let down = self.tree.create_child(&node, var, false);
                let up = self.tree.create_child(&node, var, true);
                self.tree.push(down);
                self.tree.push(up);
            } else {
                // No fractional x left to branch on but not integer-feasible
                // under our tolerance; accept as-is rather than looping forever.
                self.incumbent.offer_incumbent(node.lp_objective, &node.primal);
            }

            let bound = self.tree.best_live_bound().unwrap_or(node.lp_objective);
            self.incumbent.offer_lp_bound(bound);
            if self.incumbent.should_terminate() {
                exit_code = ExitCode::Preempted;
                break;
            }
        }

        if exit_code == ExitCode::Optimal && self.incumbent.best_objective().is_none() {
            return Err(SolverError::Infeasible {
                source_budget: self.config.budget.unwrap_or(f64::INFINITY),
            });
        }

        Ok(SolveReport {
            exit_code,
            objective: self.incumbent.best_objective(),
            best_lp_bound: self.incumbent.best_lp_bound(),
            gap: self.incumbent.gap(),
            nodes_explored: self.tree.nodes_explored(),
            cpu_time: start.elapsed(),
            assignment: self.incumbent.best_assignment().to_vec(),
        })
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Resets every `x[i,t]` bound to its layout default, then overlays the
    /// node's own fixings. `ClarabelLpSolver` keeps its bounds as a flat
    /// vector with no per-node scoping, so this has to run before every
    /// node's relaxation (§4.6/§4.7 "change the chosen x[i,t] bounds").
    fn apply_fixings(&mut self, node: &BranchNode) -> SolverResult<()> {
        for t in 0..self.layout.periods() {
            for i in 0..self.layout.num_fsts() {
                let var = self.layout.x_index(t, i);
                let bounds = match node.fixed.get(&var) {
                    Some(true) => VarBounds::fixed(1.0),
                    Some(false) => VarBounds::fixed(0.0),
                    None => self.base_var_bounds[var],
                };
                self.lp.chg_bounds(var, bounds)?;
            }
        }
        Ok(())
    }

    fn is_integer_feasible(&self, node: &BranchNode) -> bool {
        for t in 0..self.layout.periods() {
            for i in 0..self.layout.num_fsts() {
                let v = node.primal[self.layout.x_index(t, i)];
                if v.min(1.0 - v) > self.config.fuzz {
                    return false;
                }
            }
        }
        true
    }
}

/// Seeds every constraint family from §4.5 into `pool`, for every period.
/// Rows seeded here are marked `initial` (never GC-eligible, per the pool's
/// invariant) and flushed to the LP once by the caller.
///
/// Generic pairwise-incompatibility seeding ("known-incompatible yet not
/// shadowed by a 2-vertex SEC") is not implemented: §4.5 never specifies how
/// two FSTs are determined incompatible outside of sharing 2+ terminals,
/// which the 2-vertex SEC family already covers. See DESIGN.md.
fn seed_constraints(pool: &mut ConstraintPool, hypergraph: &Hypergraph, layout: &Layout, config: &SolverConfig) {
    let num_terminals = layout.num_terminals();
    let num_fsts = layout.num_fsts();
    let containing: Vec<Vec<usize>> = (0..num_terminals)
        .map(|j| {
            let tid = TerminalId::new(j);
            (0..num_fsts).filter(|&i| hypergraph.fsts()[i].contains_terminal(tid)).collect()
        })
        .collect();

    for t in 0..layout.periods() {
        seed_spanning_row(pool, hypergraph, layout, config, t);
        for j in 0..num_terminals {
            seed_soft_cutset(pool, layout, t, j, &containing[j]);
        }
        seed_source_lock(pool, layout, t);
        if let Some(budget) = config.budget {
            seed_budget_row(pool, hypergraph, layout, config, t, budget);
        }
        if config.seed_2vertex_sec {
            seed_2vertex_sec(pool, hypergraph, layout, t);
        }
        seed_edge_linking(pool, hypergraph, layout, t);
    }
    seed_graph_distance_linearization(pool, layout);
}

fn seed_spanning_row(pool: &mut ConstraintPool, hypergraph: &Hypergraph, layout: &Layout, config: &SolverConfig, t: usize) {
    let mut coeffs: Vec<(u32, i64)> = Vec::new();
    for i in 0..layout.num_fsts() {
        let size = hypergraph.fsts()[i].size() as i64;
        if size != 1 {
            coeffs.push((layout.x_index(t, i) as u32, size - 1));
        }
    }
    for j in 0..layout.num_terminals() {
        coeffs.push((layout.uncov_index(t, j) as u32, 1));
    }
    let rhs = layout.num_terminals() as i64 - 1;
    let op = if config.spanning_is_equality() { RowOp::Eq } else { RowOp::Ge };
    let (id, _) = pool.add_row(coeffs, op, rhs, true);
    pool.mark_pending(id);
}

fn seed_soft_cutset(pool: &mut ConstraintPool, layout: &Layout, t: usize, j: usize, fsts_j: &[usize]) {
    for &i in fsts_j {
        let coeffs = vec![(layout.x_index(t, i) as u32, 1), (layout.uncov_index(t, j) as u32, 1)];
        let (id, _) = pool.add_row(coeffs, RowOp::Le, 1, true);
        pool.mark_pending(id);
    }

    let n_j = fsts_j.len() as i64;
    if n_j > 0 {
        let mut coeffs: Vec<(u32, i64)> = fsts_j.iter().map(|&i| (layout.x_index(t, i) as u32, 1)).collect();
        coeffs.push((layout.uncov_index(t, j) as u32, n_j));
        let (id, _) = pool.add_row(coeffs, RowOp::Le, n_j, true);
        pool.mark_pending(id);
    }

    let mut coeffs: Vec<(u32, i64)> = fsts_j.iter().map(|&i| (layout.x_index(t, i) as u32, 1)).collect();
    coeffs.push((layout.uncov_index(t, j) as u32, 1));
    let (id, _) = pool.add_row(coeffs, RowOp::Ge, 1, true);
    pool.mark_pending(id);
}

fn seed_source_lock(pool: &mut ConstraintPool, layout: &Layout, t: usize) {
    let (id, _) = pool.add_row(vec![(layout.uncov_index(t, 0) as u32, 1)], RowOp::Eq, 0, true);
    pool.mark_pending(id);
}

fn seed_budget_row(pool: &mut ConstraintPool, hypergraph: &Hypergraph, layout: &Layout, config: &SolverConfig, t: usize, budget: f64) {
    let scale = config.budget_scale as f64;
    let coeffs: Vec<(u32, i64)> = (0..layout.num_fsts())
        .map(|i| {
            let c = (hypergraph.fsts()[i].cost * scale).floor() as i64;
            (layout.x_index(t, i) as u32, c)
        })
        .filter(|&(_, c)| c != 0)
        .collect();
    let rhs = (budget * scale).floor() as i64;
    let (id, _) = pool.add_row(coeffs, RowOp::Le, rhs, true);
    pool.mark_pending(id);
}

fn seed_2vertex_sec(pool: &mut ConstraintPool, hypergraph: &Hypergraph, layout: &Layout, t: usize) {
    let num_terminals = layout.num_terminals();
    for a in 0..num_terminals {
        for b in (a + 1)..num_terminals {
            let both: Vec<usize> = (0..layout.num_fsts())
                .filter(|&i| {
                    let fst = &hypergraph.fsts()[i];
                    fst.contains_terminal(TerminalId::new(a)) && fst.contains_terminal(TerminalId::new(b))
                })
                .collect();
            if both.len() >= 2 {
                let coeffs: Vec<(u32, i64)> = both.iter().map(|&i| (layout.x_index(t, i) as u32, 1)).collect();
                let (id, _) = pool.add_row(coeffs, RowOp::Le, 1, true);
                pool.mark_pending(id);
            }
        }
    }
}

fn seed_edge_linking(pool: &mut ConstraintPool, hypergraph: &Hypergraph, layout: &Layout, t: usize) {
    for edge in hypergraph.edge_map().iter() {
        let e = edge.id.value();
        let mut coeffs = vec![(layout.z_index(t, e) as u32, 1)];
        for &fid in &edge.fsts {
            coeffs.push((layout.x_index(t, fid.value()) as u32, -1));
        }
        let (id, _) = pool.add_row(coeffs, RowOp::Le, 0, true);
        pool.mark_pending(id);
    }
}

fn seed_graph_distance_linearization(pool: &mut ConstraintPool, layout: &Layout) {
    for tau in 0..layout.periods().saturating_sub(1) {
        for e in 0..layout.num_edges() {
            let d = layout.d_index(tau, e) as u32;
            let z_next = layout.z_index(tau + 1, e) as u32;
            let z_cur = layout.z_index(tau, e) as u32;
            let (id1, _) = pool.add_row(vec![(d, 1), (z_next, -1), (z_cur, 1)], RowOp::Ge, 0, true);
            pool.mark_pending(id1);
            let (id2, _) = pool.add_row(vec![(d, 1), (z_cur, -1), (z_next, 1)], RowOp::Ge, 0, true);
            pool.mark_pending(id2);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use steiner_core::{FstId, GeometricEdge, PointId, Terminal};

    fn s1_instance() -> Hypergraph {
        let terminals = vec![
            Terminal::new(TerminalId::new(0), 0.0, 0.0, 100.0),
            Terminal::new(TerminalId::new(1), 10.0, 0.0, 50.0),
            Terminal::new(TerminalId::new(2), 0.0, 10.0, 50.0),
            Terminal::new(TerminalId::new(3), 10.0, 10.0, 50.0),
        ];
        let f0 = Fst::new(
            FstId::new(0),
            vec![TerminalId::new(0), TerminalId::new(1), TerminalId::new(2), TerminalId::new(3)],
            vec![
                GeometricEdge::new(PointId::new(0), PointId::new(1), 10.0),
                GeometricEdge::new(PointId::new(1), PointId::new(2), 10.0),
                GeometricEdge::new(PointId::new(2), PointId::new(3), 10.0),
            ],
            1.9 * 10f64 * std::f64::consts::SQRT_2,
        );
        let f1 = Fst::new(
            FstId::new(1),
            vec![TerminalId::new(0), TerminalId::new(1)],
            vec![GeometricEdge::new(PointId::new(0), PointId::new(1), 10.0)],
            0.4 * 10f64 * std::f64::consts::SQRT_2,
        );
        let f2 = Fst::new(
            FstId::new(2),
            vec![TerminalId::new(0), TerminalId::new(2)],
            vec![GeometricEdge::new(PointId::new(0), PointId::new(2), 10.0)],
            0.4 * 10f64 * std::f64::consts::SQRT_2,
        );
        let f3 = Fst::new(
            FstId::new(3),
            vec![TerminalId::new(1), TerminalId::new(3)],
            vec![GeometricEdge::new(PointId::new(1), PointId::new(3), 10.0)],
            0.4 * 10f64 * std::f64::consts::SQRT_2,
        );
        let f4 = Fst::new(
            FstId::new(4),
            vec![TerminalId::new(2), TerminalId::new(3)],
            vec![GeometricEdge::new(PointId::new(2), PointId::new(3), 10.0)],
            0.4 * 10f64 * std::f64::consts::SQRT_2,
        );
        Hypergraph::new(terminals, vec![f0, f1, f2, f3, f4])
    }

    #[test]
    fn solves_trivial_four_terminal_instance() {
        let hg = s1_instance();
        let mut config = SolverConfig::default();
        config.budget = Some(2.0);
        config.time_periods = 1;
        let lp: Box<dyn LpSolver> = Box::new(ClarabelLpSolver::new());
        let preempt = Arc::new(AtomicBool::new(false));
        let ctx = SolverContext::new(&hg, config, lp, preempt).unwrap();
        let report = ctx.solve().unwrap();
        assert_eq!(report.exit_code, ExitCode::Optimal);
        assert!(report.objective.unwrap() < 0.0);
    }

    #[test]
    fn preemption_flag_stops_the_search() {
        let hg = s1_instance();
        let mut config = SolverConfig::default();
        config.budget = Some(2.0);
        let lp: Box<dyn LpSolver> = Box::new(ClarabelLpSolver::new());
        let preempt = Arc::new(AtomicBool::new(true));
        let ctx = SolverContext::new(&hg, config, lp, preempt).unwrap();
        let report = ctx.solve();
        // With the flag already set, the very first iteration preempts
        // before any incumbent is found, which this adapter reports as
        // infeasible-at-budget rather than a degenerate empty solution.
        assert!(report.is_err() || report.unwrap().exit_code == ExitCode::Preempted);
    }
}
