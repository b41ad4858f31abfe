//! Unified error type for the Steiner solver ecosystem.
//!
//! [`SteinerError`] is the common representation used at crate boundaries;
//! algorithm-internal code in `steiner-algo` mostly works with
//! `steiner-solver-common::SolverError` and folds into this type only when
//! surfaced to callers outside the solve loop.

use thiserror::Error;

/// Unified error type for Steiner solver operations.
#[derive(Error, Debug)]
pub enum SteinerError {
    /// I/O errors (file access, stdin/stdout).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// FST/terminal stream parsing errors.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Data validation errors (e.g. dangling terminal id in an FST).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Solver/algorithm errors.
    #[error("Solver error: {0}")]
    Solver(String),

    /// Configuration errors (bad env var, conflicting flags).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Constraint pool invariant violations; these are implementation bugs.
    #[error("Pool invariant violated: {0}")]
    PoolInvariant(String),

    /// Generic errors (for wrapping external errors).
    #[error("{0}")]
    Other(String),
}

/// Convenience type alias for Results using [`SteinerError`].
pub type SteinerResult<T> = Result<T, SteinerError>;

impl From<anyhow::Error> for SteinerError {
    fn from(err: anyhow::Error) -> Self {
        SteinerError::Other(err.to_string())
    }
}

impl From<String> for SteinerError {
    fn from(s: String) -> Self {
        SteinerError::Other(s)
    }
}

impl From<&str> for SteinerError {
    fn from(s: &str) -> Self {
        SteinerError::Other(s.to_string())
    }
}

impl From<serde_json::Error> for SteinerError {
    fn from(err: serde_json::Error) -> Self {
        SteinerError::Parse(err.to_string())
    }
}
