//! Constraint row headers and canonicalization (§3 "Constraint row").

use std::hash::{Hash, Hasher};
use steiner_solver_common::RowOp;

/// Monotonically increasing row id; never reused, even after GC. Node
/// resume relies on this total order (§5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowId(u64);

impl RowId {
    pub fn new(value: u64) -> Self {
        RowId(value)
    }
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Metadata for one row in the pool. Coefficients themselves live in the
/// arena (`super::arena`); this header is everything the pool needs to
/// decide whether a row is a duplicate, whether it belongs in the LP, and
/// whether it may be garbage-collected.
#[derive(Debug, Clone)]
pub struct RowHeader {
    pub id: RowId,
    pub hash: u64,
    pub op: RowOp,
    pub rhs: i64,
    /// Index into the arena's block list. Rewritten after every `compact`.
    pub block: usize,
    /// `>= 0`: LP row index. `-1`: not in the LP. `-2`: pending insertion.
    pub lp_shadow: i64,
    /// How many suspended branch nodes need this row in their saved basis.
    pub refcount: u32,
    /// Seeded at construction; never GC-eligible (§3 invariant).
    pub initial: bool,
    /// Set true once GC has removed this row; such headers are tombstoned
    /// rather than removed from `headers`, since `RowId` values are used as
    /// direct indices in some callers and must stay dense-enough to avoid
    /// an extra lookup layer. A discarded header's `block` is meaningless.
    pub discard: bool,
    /// Iteration number at which this row was last observed binding
    /// (slack <= fuzz). Used by GC's ranking function.
    pub last_binding_iteration: u64,
}

pub const LP_SHADOW_ABSENT: i64 = -1;
pub const LP_SHADOW_PENDING: i64 = -2;

/// Reduces `coeffs` (sorted ascending by variable index, deduplicated by
/// summing) and `rhs` to lowest terms by dividing through by their GCD, per
/// §4.5's row-addition protocol. Returns the canonical form plus a hash
/// covering `(coeffs, op, rhs)`.
pub fn canonicalize(
    mut coeffs: Vec<(u32, i64)>,
    op: RowOp,
    rhs: i64,
) -> (Vec<(u32, i64)>, i64, u64) {
    coeffs.sort_by_key(|&(var, _)| var);
    // Merge duplicate variable entries (shouldn't occur from well-formed
    // constraint construction, but keeps canonicalization total).
    let mut merged: Vec<(u32, i64)> = Vec::with_capacity(coeffs.len());
    for (var, coeff) in coeffs {
        if let Some(last) = merged.last_mut() {
            if last.0 == var {
                last.1 += coeff;
                continue;
            }
        }
        merged.push((var, coeff));
    }
    merged.retain(|&(_, c)| c != 0);

    let mut g = rhs.unsigned_abs();
    for &(_, c) in &merged {
        g = gcd(g, c.unsigned_abs());
    }
    let rhs = if g > 1 {
        let g = g as i64;
        for c in merged.iter_mut() {
            c.1 /= g;
        }
        rhs / g
    } else {
        rhs
    };

    let hash = hash_row(&merged, op, rhs);
    (merged, rhs, hash)
}

fn gcd(a: u64, b: u64) -> u64 {
    if b == 0 {
        a.max(1)
    } else {
        gcd(b, a % b)
    }
}

fn hash_row(coeffs: &[(u32, i64)], op: RowOp, rhs: i64) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    for &(var, c) in coeffs {
        var.hash(&mut hasher);
        c.hash(&mut hasher);
    }
    (op as u8).hash(&mut hasher);
    rhs.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalize_reduces_by_gcd() {
        let (coeffs, rhs, _) = canonicalize(vec![(0, 4), (1, 2)], RowOp::Le, 6);
        assert_eq!(coeffs, vec![(0, 2), (1, 1)]);
        assert_eq!(rhs, 3);
    }

    #[test]
    fn canonicalize_sorts_by_variable_index() {
        let (coeffs, _, _) = canonicalize(vec![(3, 1), (1, 1), (2, 1)], RowOp::Le, 1);
        assert_eq!(coeffs, vec![(1, 1), (2, 1), (3, 1)]);
    }

    #[test]
    fn equivalent_rows_hash_identically() {
        let (_, _, h1) = canonicalize(vec![(0, 2), (1, 4)], RowOp::Le, 8);
        let (_, _, h2) = canonicalize(vec![(1, 2), (0, 1)], RowOp::Le, 4);
        assert_eq!(h1, h2);
    }

    #[test]
    fn different_rhs_hashes_differently() {
        let (_, _, h1) = canonicalize(vec![(0, 1)], RowOp::Le, 1);
        let (_, _, h2) = canonicalize(vec![(0, 1)], RowOp::Le, 2);
        assert_ne!(h1, h2);
    }
}
