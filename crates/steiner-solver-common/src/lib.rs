//! # steiner-solver-common
//!
//! The LP solver capability interface (§9), exit codes, and the shared
//! error type used by both CLI binaries and by `steiner-algo`'s internal
//! solve loop. Kept as its own crate — mirroring how this codebase
//! separates the solver IPC/error vocabulary from the algorithms that use
//! it — so a future alternate LP backend can depend on this crate alone.

pub mod error;
pub mod lp_solver;

pub use error::{ExitCode, SolverError, SolverResult};
pub use lp_solver::{Basis, BasisStatus, LpRow, LpSolver, RowOp, SolveStatus, VarBounds};
