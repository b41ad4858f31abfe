//! Exit codes and error types shared by every Steiner solver binary and by
//! `steiner-algo`'s internal solve loop.

use thiserror::Error;

/// Process exit codes for the core solver binary (§6/§7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Optimal within the configured gap target.
    Optimal = 0,
    /// The soft formulation still proved infeasible.
    Infeasible = 1,
    /// Terminated early by gap target or user signal; best-known solution reported.
    Preempted = 2,
    /// Anything else: malformed input, LP solver internal failure, pool invariant violation.
    Fatal = 3,
}

impl ExitCode {
    pub fn from_raw(code: i32) -> Self {
        match code {
            0 => ExitCode::Optimal,
            1 => ExitCode::Infeasible,
            2 => ExitCode::Preempted,
            _ => ExitCode::Fatal,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ExitCode::Optimal)
    }
}

/// Errors arising from LP solving and the branch-and-cut loop (§7).
#[derive(Debug, Error)]
pub enum SolverError {
    /// Unparsable FST/terminal input stream.
    #[error("malformed input: {0}")]
    InputMalformed(String),

    /// Unexpected status from the LP solver (not the scaling retry case,
    /// which is handled locally and never surfaces as this variant).
    #[error("LP solver internal error: {0}")]
    LpSolverInternal(String),

    /// The soft formulation proved infeasible; `source_budget` is echoed so
    /// the user-visible message can suggest widening the budget.
    #[error("infeasible at budget {source_budget}")]
    Infeasible { source_budget: f64 },

    /// Dual bound exceeds the incumbent; recovered locally by pruning the
    /// node. Never expected to escape `steiner-algo`, but kept as a typed
    /// variant so the bbtree module can report it through the same channel
    /// as fatal errors during diagnostics.
    #[error("cutoff hit")]
    CutoffHit,

    /// Non-error early termination: MIP gap target satisfied.
    #[error("preempted: gap target reached")]
    PreemptedByGap,

    /// Non-error early termination: user requested (SIGINT) stop.
    #[error("preempted: user requested stop")]
    PreemptedByUser,

    /// A constraint pool invariant was found violated; implementation bug,
    /// not a user error.
    #[error("pool invariant violated: {0}")]
    PoolInvariantViolated(String),

    /// Generic IO error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SolverError {
    /// Maps this error to the exit code the CLI binaries report (§7).
    pub fn exit_code(&self) -> ExitCode {
        match self {
            SolverError::Infeasible { .. } => ExitCode::Infeasible,
            SolverError::PreemptedByGap | SolverError::PreemptedByUser => ExitCode::Preempted,
            SolverError::CutoffHit => ExitCode::Fatal, // should never reach the CLI boundary
            _ => ExitCode::Fatal,
        }
    }

    /// True for the two non-error early-termination variants (§7).
    pub fn is_preemption(&self) -> bool {
        matches!(self, SolverError::PreemptedByGap | SolverError::PreemptedByUser)
    }
}

/// Result type alias for solver operations.
pub type SolverResult<T> = Result<T, SolverError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_code_round_trips() {
        assert_eq!(ExitCode::from_raw(0), ExitCode::Optimal);
        assert_eq!(ExitCode::from_raw(1), ExitCode::Infeasible);
        assert_eq!(ExitCode::from_raw(2), ExitCode::Preempted);
        assert_eq!(ExitCode::from_raw(99), ExitCode::Fatal);
    }

    #[test]
    fn infeasible_maps_to_exit_code_1() {
        let err = SolverError::Infeasible { source_budget: 0.3 };
        assert_eq!(err.exit_code(), ExitCode::Infeasible);
    }

    #[test]
    fn preemption_variants_are_flagged() {
        assert!(SolverError::PreemptedByGap.is_preemption());
        assert!(SolverError::PreemptedByUser.is_preemption());
        assert!(!SolverError::CutoffHit.is_preemption());
    }
}
