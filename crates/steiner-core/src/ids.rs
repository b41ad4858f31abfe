//! Newtype IDs for terminals, FSTs, and geometric edges.
//!
//! Mirrors the type-safe ID convention used throughout this codebase: a
//! thin `usize` wrapper so a terminal id can never be confused with an FST
//! or edge id at a call site.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TerminalId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FstId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(usize);

/// Id of a geometric point referenced by an FST's edge list. Distinct from
/// [`TerminalId`] because an FST's Steiner points are not terminals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PointId(usize);

impl PointId {
    #[inline]
    pub fn new(value: usize) -> Self {
        PointId(value)
    }
    #[inline]
    pub fn value(&self) -> usize {
        self.0
    }
}

impl std::fmt::Display for PointId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "P{}", self.0)
    }
}

impl TerminalId {
    #[inline]
    pub fn new(value: usize) -> Self {
        TerminalId(value)
    }
    #[inline]
    pub fn value(&self) -> usize {
        self.0
    }
}

impl FstId {
    #[inline]
    pub fn new(value: usize) -> Self {
        FstId(value)
    }
    #[inline]
    pub fn value(&self) -> usize {
        self.0
    }
}

impl EdgeId {
    #[inline]
    pub fn new(value: usize) -> Self {
        EdgeId(value)
    }
    #[inline]
    pub fn value(&self) -> usize {
        self.0
    }
}

impl std::fmt::Display for TerminalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "T{}", self.0)
    }
}

impl std::fmt::Display for FstId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "F{}", self.0)
    }
}

impl std::fmt::Display for EdgeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "E{}", self.0)
    }
}
