//! LPRelaxationLoop (§4.6): solve → scan-pool → add-violated → delete-slack
//! until no violations remain.

use crate::bbtree::node::BranchNode;
use crate::config::SolverConfig;
use crate::pool::ConstraintPool;
use steiner_solver_common::{LpSolver, SolveStatus, SolverError, SolverResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelaxationStatus {
    Optimal,
    Infeasible,
    Cutoff,
}

/// Drives one node's LP to a cut-free relaxation optimum. Holds borrows of
/// the pool and LP handle for the duration of one `run` call only; both are
/// owned by the enclosing `SolverContext`.
pub struct LPRelaxationLoop<'a> {
    pool: &'a mut ConstraintPool,
    lp: &'a mut dyn LpSolver,
    config: &'a SolverConfig,
    /// Objective coefficients, needed to compute the LP objective value
    /// from the primal vector (the `LpSolver` capability set in §9 does not
    /// include a dedicated "get objective" accessor).
    objective: &'a [f64],
}

/// §4.6 step 7: cap on cumulative pending-row non-zeros before flushing.
const PENDING_NONZERO_THRESHOLD: usize = 50_000;

impl<'a> LPRelaxationLoop<'a> {
    pub fn new(
        pool: &'a mut ConstraintPool,
        lp: &'a mut dyn LpSolver,
        config: &'a SolverConfig,
        objective: &'a [f64],
    ) -> Self {
        Self {
            pool,
            lp,
            config,
            objective,
        }
    }

    /// Runs the relaxation loop for `node`, updating its cached primal,
    /// objective, and pool-version tag in place. If the node is already
    /// fresh against the current pool version, the solve is skipped
    /// entirely and the cached primal is reused (§4.6 optimization).
    pub fn run(&mut self, node: &mut BranchNode) -> SolverResult<RelaxationStatus> {
        if node.is_fresh(self.pool.version()) {
            return Ok(RelaxationStatus::Optimal);
        }

        let mut prior_objective = f64::NEG_INFINITY;
        loop {
            let status = self.lp.solve()?;
            self.pool.advance_iteration();

            match status {
                SolveStatus::Infeasible => return Ok(RelaxationStatus::Infeasible),
                SolveStatus::Cutoff => return Ok(RelaxationStatus::Cutoff),
                SolveStatus::Other(msg) => return Err(SolverError::LpSolverInternal(msg)),
                SolveStatus::Optimal => {}
            }

            let primal = self.lp.get_primal().to_vec();
            let reduced = self.lp.get_reduced_costs().to_vec();
            let objective: f64 = primal
                .iter()
                .zip(self.objective.iter())
                .map(|(&p, &c)| p * c)
                .sum();

            self.update_branch_heuristics(node, &reduced);

            if objective > prior_objective + self.config.fuzz {
                self.pool.delete_slack_rows(self.lp, self.config.fuzz)?;
                prior_objective = objective;
            }

            let newly_pending = self.pool.scan_and_mark(&primal, self.config.fuzz);
            if newly_pending == 0 {
                node.primal = primal;
                node.lp_objective = objective;
                node.cached_pool_version = Some(self.pool.version());
                return Ok(RelaxationStatus::Optimal);
            }

            self.pool.prune_pending(PENDING_NONZERO_THRESHOLD);
            self.pool.flush_pending_to_lp(self.lp)?;
        }
    }

    /// §4.6 step 3: update per-FST-variable branching decay and up/down
    /// bound estimates from the reduced costs. `reduced` is sized to the
    /// full variable count `V`; only entries at `x`-variable positions in
    /// `node.bound_estimates`'s index space are meaningful here, so callers
    /// construct `node.bound_estimates`/`branch_decay` densely over the
    /// `x`-variable index space and this function is given the mapping
    /// implicitly via the node's own vector lengths.
    fn update_branch_heuristics(&self, node: &mut BranchNode, reduced: &[f64]) {
        let n = node.branch_decay.len();
        for idx in 0..n {
            if idx >= reduced.len() {
                break;
            }
            let rc = reduced[idx];
            // Exponential decay toward the latest reduced-cost magnitude,
            // used by branch selection (§4.7) to weight fractionality.
            node.branch_decay[idx] = 0.5 * node.branch_decay[idx] + 0.5 * rc.abs();
            let (down, up) = node.bound_estimates[idx];
            node.bound_estimates[idx] = (down.max(node.lp_objective - rc.abs()), up.max(node.lp_objective + rc.abs()));
        }
    }
}
