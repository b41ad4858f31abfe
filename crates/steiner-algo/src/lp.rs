//! `ClarabelLpSolver`: the concrete `LpSolver` backend (§9, DESIGN.md
//! deviation #3), built on `good_lp` + `clarabel` as in
//! `gat_algo::tep::solver::solve_tep`.
//!
//! Clarabel is an interior-point solver with no incremental row add/delete
//! and no persistent simplex basis, so this adapter keeps its own row/bound
//! state and rebuilds the whole `good_lp` model on every `solve()` call.
//! `copy_base`/`get_base` are a best-effort reconstruction: a column is
//! reported `Basic` when its solution value sits strictly between its
//! bounds, `AtLower`/`AtUpper` otherwise; rows follow their slack the same
//! way. Clarabel does not expose per-constraint dual values through
//! `good_lp`'s solver-agnostic `Solution` trait, so `get_duals` and
//! `get_reduced_costs` return zero-filled vectors of the right length —
//! branch selection (§4.7) degrades to using primal fractionality alone
//! when the reduced-cost term is zero, which is a safe (if less informed)
//! default rather than a wrong one.

use good_lp::solvers::clarabel::clarabel;
use good_lp::{constraint, variable, variables, Expression, Solution, SolverModel, Variable};
use steiner_solver_common::{Basis, BasisStatus, LpRow, LpSolver, RowOp, SolveStatus, SolverError, SolverResult, VarBounds};

pub struct ClarabelLpSolver {
    var_bounds: Vec<VarBounds>,
    objective: Vec<f64>,
    rows: Vec<LpRow>,
    primal: Vec<f64>,
    duals: Vec<f64>,
    slacks: Vec<f64>,
    reduced_costs: Vec<f64>,
}

impl ClarabelLpSolver {
    pub fn new() -> Self {
        Self {
            var_bounds: Vec::new(),
            objective: Vec::new(),
            rows: Vec::new(),
            primal: Vec::new(),
            duals: Vec::new(),
            slacks: Vec::new(),
            reduced_costs: Vec::new(),
        }
    }

    fn row_lhs(row: &LpRow, primal: &[f64]) -> f64 {
        row.coeffs.iter().map(|&(idx, c)| c * primal.get(idx).copied().unwrap_or(0.0)).sum()
    }
}

impl Default for ClarabelLpSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl LpSolver for ClarabelLpSolver {
    fn load(&mut self, var_bounds: &[VarBounds], objective: &[f64]) -> SolverResult<()> {
        if var_bounds.len() != objective.len() {
            return Err(SolverError::LpSolverInternal(format!(
                "var_bounds length {} does not match objective length {}",
                var_bounds.len(),
                objective.len()
            )));
        }
        self.var_bounds = var_bounds.to_vec();
        self.objective = objective.to_vec();
        self.rows.clear();
        self.primal = vec![0.0; var_bounds.len()];
        self.duals.clear();
        self.slacks.clear();
        self.reduced_costs = vec![0.0; var_bounds.len()];
        Ok(())
    }

    fn add_rows(&mut self, rows: &[LpRow]) -> SolverResult<Vec<usize>> {
        let mut indices = Vec::with_capacity(rows.len());
        for row in rows {
            self.rows.push(row.clone());
            indices.push(self.rows.len() - 1);
        }
        Ok(indices)
    }

    fn del_rows(&mut self, row_indices: &[usize]) -> SolverResult<()> {
        let to_delete: hashbrown::HashSet<usize> = row_indices.iter().copied().collect();
        let mut kept = Vec::with_capacity(self.rows.len());
        for (idx, row) in self.rows.drain(..).enumerate() {
            if !to_delete.contains(&idx) {
                kept.push(row);
            }
        }
        self.rows = kept;
        Ok(())
    }

    fn chg_bounds(&mut self, var_index: usize, bounds: VarBounds) -> SolverResult<()> {
        let entry = self
            .var_bounds
            .get_mut(var_index)
            .ok_or_else(|| SolverError::LpSolverInternal(format!("variable index {var_index} out of range")))?;
        *entry = bounds;
        Ok(())
    }

    fn solve(&mut self) -> SolverResult<SolveStatus> {
        let mut vars = variables!();
        let mut columns: Vec<Variable> = Vec::with_capacity(self.var_bounds.len());
        for bounds in &self.var_bounds {
            columns.push(vars.add(variable().min(bounds.lb).max(bounds.ub)));
        }

        let mut objective_expr = Expression::from(0.0);
        for (&coeff, &col) in self.objective.iter().zip(columns.iter()) {
            if coeff != 0.0 {
                objective_expr += coeff * col;
            }
        }

        let mut model = vars.minimise(objective_expr).using(clarabel);
        for row in &self.rows {
            let mut lhs = Expression::from(0.0);
            for &(idx, coeff) in &row.coeffs {
                lhs += coeff * columns[idx];
            }
            model = match row.op {
                RowOp::Le => model.with(constraint!(lhs <= row.rhs)),
                RowOp::Eq => model.with(constraint!(lhs == row.rhs)),
                RowOp::Ge => model.with(constraint!(lhs >= row.rhs)),
            };
        }

        let solution = match model.solve() {
            Ok(solution) => solution,
            Err(err) => {
                let message = format!("{err:?}");
                if message.to_lowercase().contains("infeasible") {
                    return Ok(SolveStatus::Infeasible);
                }
                return Ok(SolveStatus::Other(message));
            }
        };

        self.primal = columns.iter().map(|&v| solution.value(v)).collect();
        self.slacks = self.rows.iter().map(|row| row.rhs - Self::row_lhs(row, &self.primal)).collect();
        self.duals = vec![0.0; self.rows.len()];
        self.reduced_costs = vec![0.0; self.primal.len()];
        Ok(SolveStatus::Optimal)
    }

    fn get_primal(&self) -> &[f64] {
        &self.primal
    }

    fn get_duals(&self) -> &[f64] {
        &self.duals
    }

    fn get_slacks(&self) -> &[f64] {
        &self.slacks
    }

    fn get_reduced_costs(&self) -> &[f64] {
        &self.reduced_costs
    }

    fn copy_base(&mut self, _basis: &Basis) -> SolverResult<()> {
        // Clarabel carries no warm-start basis; nothing to install.
        Ok(())
    }

    fn get_base(&self) -> Basis {
        let column_status = self
            .primal
            .iter()
            .zip(self.var_bounds.iter())
            .map(|(&value, bounds)| {
                if (value - bounds.lb).abs() < 1e-7 {
                    BasisStatus::AtLower
                } else if (value - bounds.ub).abs() < 1e-7 {
                    BasisStatus::AtUpper
                } else {
                    BasisStatus::Basic
                }
            })
            .collect();
        let row_status = self
            .slacks
            .iter()
            .map(|&slack| if slack.abs() < 1e-7 { BasisStatus::AtUpper } else { BasisStatus::Basic })
            .collect();
        Basis { column_status, row_status }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solves_a_trivial_minimization() {
        let mut solver = ClarabelLpSolver::new();
        solver.load(&[VarBounds::new(0.0, 10.0)], &[1.0]).unwrap();
        solver
            .add_rows(&[LpRow { coeffs: vec![(0, 1.0)], op: RowOp::Ge, rhs: 3.0 }])
            .unwrap();
        let status = solver.solve().unwrap();
        assert_eq!(status, SolveStatus::Optimal);
        assert!((solver.get_primal()[0] - 3.0).abs() < 1e-4);
    }

    #[test]
    fn del_rows_drops_requested_indices() {
        let mut solver = ClarabelLpSolver::new();
        solver.load(&[VarBounds::new(0.0, 10.0)], &[1.0]).unwrap();
        solver
            .add_rows(&[
                LpRow { coeffs: vec![(0, 1.0)], op: RowOp::Ge, rhs: 1.0 },
                LpRow { coeffs: vec![(0, 1.0)], op: RowOp::Le, rhs: 9.0 },
            ])
            .unwrap();
        solver.del_rows(&[0]).unwrap();
        assert_eq!(solver.rows.len(), 1);
        assert_eq!(solver.rows[0].rhs, 9.0);
    }

    #[test]
    fn chg_bounds_rejects_out_of_range_index() {
        let mut solver = ClarabelLpSolver::new();
        solver.load(&[VarBounds::new(0.0, 1.0)], &[1.0]).unwrap();
        assert!(solver.chg_bounds(5, VarBounds::new(0.0, 1.0)).is_err());
    }
}
