//! The `LpSolver` capability trait (§9 Design Notes): an opaque handle to a
//! revised-simplex / dual-simplex-shaped solver. `steiner-algo` is the only
//! crate that ever calls these methods; this crate just fixes the contract
//! so the constraint pool, relaxation loop, and branch-and-cut tree can be
//! written against an interface rather than a concrete solver.

use crate::error::SolverResult;

/// Row relational operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOp {
    Le,
    Eq,
    Ge,
}

/// A single constraint row as the LP solver sees it: sparse coefficients
/// over variable indices, an operator, and a right-hand side. This is the
/// solver-facing counterpart of `steiner-algo`'s pool-internal row
/// representation; the pool converts its own sparse arena rows to this
/// shape only when flushing pending rows to the LP.
#[derive(Debug, Clone)]
pub struct LpRow {
    pub coeffs: Vec<(usize, f64)>,
    pub op: RowOp,
    pub rhs: f64,
}

/// Lower/upper bound pair for one variable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VarBounds {
    pub lb: f64,
    pub ub: f64,
}

impl VarBounds {
    pub fn new(lb: f64, ub: f64) -> Self {
        Self { lb, ub }
    }

    pub fn binary() -> Self {
        Self { lb: 0.0, ub: 1.0 }
    }

    pub fn fixed(value: f64) -> Self {
        Self { lb: value, ub: value }
    }
}

/// Outcome of a `solve()` call.
#[derive(Debug, Clone, PartialEq)]
pub enum SolveStatus {
    Optimal,
    Infeasible,
    /// Dual bound already exceeds a cutoff value supplied by the caller.
    Cutoff,
    /// Any other solver-reported status, carried through verbatim for
    /// diagnostics (§7 `LPSolverInternal`).
    Other(String),
}

/// Basic/nonbasic status of one column or row, as recorded by a basis
/// save/restore round-trip (§4.7, §8 "save-then-restore basis").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BasisStatus {
    Basic,
    AtLower,
    AtUpper,
}

/// A saved basis: one status per structural variable, one per row, in the
/// order the LP held them at save time. Branch nodes own a `Basis` each;
/// see `steiner-algo::bbtree::node`.
#[derive(Debug, Clone, Default)]
pub struct Basis {
    pub column_status: Vec<BasisStatus>,
    pub row_status: Vec<BasisStatus>,
}

/// Capability-based LP solver interface (§9):
/// `{load, addRows, delRows, chgBds, solve, getPrimal, getDuals, getSlacks,
/// getReducedCosts, copyBase, getBase}`.
///
/// Implementations are single-owner, blocking, and never suspend mid-call
/// (§5): the solve loop treats every method here as an atomic black-box
/// operation between which pool/LP state may be mutated.
pub trait LpSolver: Send {
    /// (Re)loads the problem: variable count, bounds, and objective
    /// coefficients. Clears any previously loaded rows.
    fn load(&mut self, var_bounds: &[VarBounds], objective: &[f64]) -> SolverResult<()>;

    /// Adds rows to the LP, returning the LP row index assigned to each, in
    /// the order given (insertion order is preserved, per §5's ordering
    /// guarantee on pending-row flush).
    fn add_rows(&mut self, rows: &[LpRow]) -> SolverResult<Vec<usize>>;

    /// Deletes rows by LP row index. Implementations must ensure surviving
    /// rows' indices are stable and reported consistently from `get_base`
    /// afterward, since the pool mirrors LP row indices in its row headers.
    fn del_rows(&mut self, row_indices: &[usize]) -> SolverResult<()>;

    /// Changes one variable's bounds in place (used for branch fixing).
    fn chg_bounds(&mut self, var_index: usize, bounds: VarBounds) -> SolverResult<()>;

    /// Solves to optimality or detects infeasibility/cutoff.
    fn solve(&mut self) -> SolverResult<SolveStatus>;

    fn get_primal(&self) -> &[f64];
    fn get_duals(&self) -> &[f64];
    fn get_slacks(&self) -> &[f64];
    fn get_reduced_costs(&self) -> &[f64];

    /// Installs a previously saved basis ahead of the next `solve()` call.
    fn copy_base(&mut self, basis: &Basis) -> SolverResult<()>;

    /// Snapshots the current basis for later `copy_base`.
    fn get_base(&self) -> Basis;
}
