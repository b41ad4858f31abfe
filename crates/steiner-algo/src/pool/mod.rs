//! ConstraintPool (§4.5): content-addressed store of linear constraints
//! with hash de-duplication, reference-counted row retention across
//! suspended branch nodes, LP-shadow tracking, and garbage collection.

pub mod arena;
pub mod row;

use arena::Arena;
use hashbrown::{HashMap, HashSet};
use row::{canonicalize, RowHeader, RowId, LP_SHADOW_ABSENT, LP_SHADOW_PENDING};
use steiner_solver_common::{LpRow, LpSolver, RowOp, SolverError, SolverResult};

/// The canonicalized, content-addressed store of all generated linear
/// constraints for one solve. Owned by `SolverContext` (§9); never shared
/// across solves.
pub struct ConstraintPool {
    headers: Vec<RowHeader>,
    arena: Arena,
    /// hash -> row ids that hashed there (collision chain; exact equality
    /// is still re-checked against the canonical coeffs before treating two
    /// rows as duplicates, since a hash match is necessary but not
    /// sufficient).
    hash_index: HashMap<u64, Vec<RowId>>,
    next_id: u64,
    /// Strictly increases after every LP solve (§5); used as a freshness
    /// stamp for binding rows and, combined with row count, as the
    /// "pool-version tag" the relaxation loop uses to skip redundant
    /// re-solves on node reentry (§4.6).
    iteration: u64,
    /// Rows marked pending-to-LP, in insertion order (§5 ordering guarantee).
    pending: Vec<RowId>,
    lp_row_count: usize,
}

impl ConstraintPool {
    pub fn new() -> Self {
        Self {
            headers: Vec::new(),
            arena: Arena::new(),
            hash_index: HashMap::new(),
            next_id: 0,
            iteration: 0,
            pending: Vec::new(),
            lp_row_count: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.headers.iter().filter(|h| !h.discard).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A monotonically increasing tag that changes exactly when the pool's
    /// row set changes (new row added). Branch nodes cache this after
    /// solving; if unchanged on reentry, the node may reuse its cached
    /// primal instead of re-solving (§4.6).
    pub fn version(&self) -> u64 {
        self.next_id
    }

    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    fn header(&self, id: RowId) -> &RowHeader {
        &self.headers[id.value() as usize]
    }

    fn header_mut(&mut self, id: RowId) -> &mut RowHeader {
        &mut self.headers[id.value() as usize]
    }

    /// Row-addition protocol (§4.5): reduce to lowest terms, hash, look up;
    /// if a duplicate exists, return `(existing_id, false)` and do nothing
    /// else; otherwise allocate a new arena block and header. `initial`
    /// rows are seeded at construction and are never GC-eligible.
    pub fn add_row(
        &mut self,
        coeffs: Vec<(u32, i64)>,
        op: RowOp,
        rhs: i64,
        initial: bool,
    ) -> (RowId, bool) {
        let (coeffs, rhs, hash) = canonicalize(coeffs, op, rhs);

        if let Some(candidates) = self.hash_index.get(&hash) {
            for &candidate_id in candidates {
                let header = self.header(candidate_id);
                if header.discard {
                    continue;
                }
                let block = self.arena.block(header.block);
                if block.coeffs == coeffs && header.op == op && header.rhs == rhs {
                    return (candidate_id, false);
                }
            }
        }

        let id = RowId::new(self.next_id);
        self.next_id += 1;
        let block = self.arena.push(id, coeffs);
        self.headers.push(RowHeader {
            id,
            hash,
            op,
            rhs,
            block,
            lp_shadow: LP_SHADOW_ABSENT,
            refcount: 0,
            initial,
            discard: false,
            last_binding_iteration: 0,
        });
        self.hash_index.entry(hash).or_default().push(id);
        (id, true)
    }

    /// Marks a row pending-to-LP if it isn't already in the LP or already pending.
    pub fn mark_pending(&mut self, id: RowId) {
        let header = self.header_mut(id);
        if header.lp_shadow == LP_SHADOW_PENDING || header.lp_shadow >= 0 {
            return;
        }
        header.lp_shadow = LP_SHADOW_PENDING;
        self.pending.push(id);
    }

    pub fn inc_ref(&mut self, id: RowId) {
        self.header_mut(id).refcount += 1;
    }

    pub fn dec_ref(&mut self, id: RowId) {
        let header = self.header_mut(id);
        header.refcount = header.refcount.saturating_sub(1);
    }

    /// Flushes every pending row to the LP in one batch (§4.5 LP
    /// synchronization), recording each row's new LP-row index. Preserves
    /// the `pruning` threshold from §4.6 step 7: callers that want pruning
    /// should trim `self.pending` (via `prune_pending`) before calling this.
    pub fn flush_pending_to_lp(&mut self, lp: &mut dyn LpSolver) -> SolverResult<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let pending = std::mem::take(&mut self.pending);
        let lp_rows: Vec<LpRow> = pending
            .iter()
            .map(|&id| {
                let header = self.header(id);
                let block = self.arena.block(header.block);
                LpRow {
                    coeffs: block.coeffs.iter().map(|&(v, c)| (v as usize, c as f64)).collect(),
                    op: header.op,
                    rhs: header.rhs as f64,
                }
            })
            .collect();
        let assigned = lp.add_rows(&lp_rows)?;
        if assigned.len() != pending.len() {
            return Err(SolverError::PoolInvariantViolated(format!(
                "LP returned {} row indices for {} pending rows",
                assigned.len(),
                pending.len()
            )));
        }
        for (&id, lp_index) in pending.iter().zip(assigned) {
            self.header_mut(id).lp_shadow = lp_index as i64;
        }
        self.lp_row_count += pending.len();
        Ok(())
    }

    /// §4.6 step 7: keep only the smallest pending rows (by non-zero count)
    /// when the cumulative non-zero count exceeds `threshold`.
    pub fn prune_pending(&mut self, threshold: usize) {
        let total: usize = self
            .pending
            .iter()
            .map(|&id| self.arena.block(self.header(id).block).coeffs.len())
            .sum();
        if total <= threshold {
            return;
        }
        self.pending.sort_by_key(|&id| self.arena.block(self.header(id).block).coeffs.len());
        let mut running = 0usize;
        let mut kept = Vec::new();
        for id in self.pending.drain(..) {
            let nz = self.arena.block(self.header(id).block).coeffs.len();
            if running + nz > threshold && !kept.is_empty() {
                self.header_mut(id).lp_shadow = LP_SHADOW_ABSENT;
                continue;
            }
            running += nz;
            kept.push(id);
        }
        self.pending = kept;
    }

    /// Evaluates every non-LP row against `primal` (full `V`-length vector)
    /// and marks any row violating its bound by more than `fuzz` as
    /// pending. Rows currently in the LP are stamped with the current
    /// iteration number when binding (slack <= fuzz), so they survive GC
    /// pressure. Returns the number of newly-pending rows.
    pub fn scan_and_mark(&mut self, primal: &[f64], fuzz: f64) -> usize {
        let mut to_mark = Vec::new();
        for header in &self.headers {
            if header.discard {
                continue;
            }
            let block = self.arena.block(header.block);
            let lhs: f64 = block.coeffs.iter().map(|&(v, c)| c as f64 * primal[v as usize]).sum();
            let rhs = header.rhs as f64;
            let slack = match header.op {
                RowOp::Le => rhs - lhs,
                RowOp::Ge => lhs - rhs,
                RowOp::Eq => -(lhs - rhs).abs(),
            };
            if header.lp_shadow >= 0 {
                if slack.abs() <= fuzz {
                    to_mark.push((header.id, true));
                }
            } else if slack < -fuzz {
                to_mark.push((header.id, false));
            }
        }
        let mut newly_pending = 0;
        for (id, binding) in to_mark {
            if binding {
                self.header_mut(id).last_binding_iteration = self.iteration;
            } else {
                let was_absent = self.header(id).lp_shadow == LP_SHADOW_ABSENT;
                self.mark_pending(id);
                if was_absent {
                    newly_pending += 1;
                }
            }
        }
        newly_pending
    }

    /// Deletes LP rows whose slack is strictly above `fuzz`, unless
    /// initial, pending, or referenced by a suspended node (§4.5 "Slack
    /// deletion"). Keeps the LP and pool in lockstep by renumbering
    /// surviving rows' `lp_shadow` after the delete.
    pub fn delete_slack_rows(&mut self, lp: &mut dyn LpSolver, fuzz: f64) -> SolverResult<()> {
        let slacks = lp.get_slacks();
        let mut to_delete_lp_indices: Vec<usize> = Vec::new();
        for header in &self.headers {
            if header.discard || header.initial || header.refcount > 0 {
                continue;
            }
            if header.lp_shadow < 0 {
                continue;
            }
            let idx = header.lp_shadow as usize;
            if idx < slacks.len() && slacks[idx].abs() > fuzz {
                to_delete_lp_indices.push(idx);
            }
        }
        if to_delete_lp_indices.is_empty() {
            return Ok(());
        }
        to_delete_lp_indices.sort_unstable();
        lp.del_rows(&to_delete_lp_indices)?;

        let deleted: HashSet<usize> = to_delete_lp_indices.iter().copied().collect();
        for header in &mut self.headers {
            if header.lp_shadow < 0 {
                continue;
            }
            let idx = header.lp_shadow as usize;
            if deleted.contains(&idx) {
                header.lp_shadow = LP_SHADOW_ABSENT;
            } else {
                let shift = to_delete_lp_indices.iter().filter(|&&d| d < idx).count();
                header.lp_shadow = (idx - shift) as i64;
            }
        }
        self.lp_row_count -= to_delete_lp_indices.len();
        Ok(())
    }

    /// Advances the iteration counter; called exactly once per LP solve (§5).
    pub fn advance_iteration(&mut self) {
        self.iteration += 1;
    }

    /// Triggers GC if the arena's non-zero count exceeds
    /// `target_multiplier * in_use_count`, where `in_use_count` counts
    /// non-discarded rows. Ranks candidates by
    /// `size * (current_iteration - last_binding_iteration)` (§4.5);
    /// never touches initial rows, rows in the LP, or referenced rows.
    pub fn maybe_garbage_collect(&mut self, target_multiplier: usize) {
        let in_use = self.len().max(1);
        if self.arena.total_nonzeros() <= target_multiplier * in_use {
            return;
        }
        self.garbage_collect(target_multiplier * in_use);
    }

    fn garbage_collect(&mut self, target_nonzeros: usize) {
        let mut candidates: Vec<(RowId, usize)> = self
            .headers
            .iter()
            .filter(|h| !h.discard && !h.initial && h.lp_shadow < 0 && h.refcount == 0)
            .map(|h| {
                let size = self.arena.block(h.block).coeffs.len();
                let age = self.iteration.saturating_sub(h.last_binding_iteration);
                (h.id, size * age.max(1) as usize)
            })
            .collect();
        candidates.sort_by_key(|&(_, cost)| std::cmp::Reverse(cost));

        let mut current = self.arena.total_nonzeros();
        let mut discarded: HashSet<RowId> = HashSet::new();
        for (id, _) in candidates {
            if current <= target_nonzeros {
                break;
            }
            let header = self.header_mut(id);
            header.discard = true;
            let nz = self.arena.block(header.block).coeffs.len();
            current -= nz;
            discarded.insert(id);
        }
        if discarded.is_empty() {
            return;
        }

        let keep: HashSet<RowId> = self
            .headers
            .iter()
            .filter(|h| !h.discard)
            .map(|h| h.id)
            .collect();
        let mapping = self.arena.compact(&keep);
        for header in &mut self.headers {
            if let Some(&new_block) = mapping.get(&header.id) {
                header.block = new_block;
            }
        }
        for hash_bucket in self.hash_index.values_mut() {
            hash_bucket.retain(|id| !discarded.contains(id));
        }
    }
}

impl Default for ConstraintPool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(v: u32, coeff: i64) -> Vec<(u32, i64)> {
        vec![(v, coeff)]
    }

    #[test]
    fn duplicate_add_returns_false_and_size_increases_by_one() {
        let mut pool = ConstraintPool::new();
        let (id1, added1) = pool.add_row(row(0, 1), RowOp::Le, 1, false);
        let (id2, added2) = pool.add_row(row(0, 1), RowOp::Le, 1, false);
        assert!(added1);
        assert!(!added2);
        assert_eq!(id1, id2);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn gcd_equivalent_rows_are_deduplicated() {
        let mut pool = ConstraintPool::new();
        let (_, added1) = pool.add_row(vec![(0, 2), (1, 4)], RowOp::Le, 8, false);
        let (_, added2) = pool.add_row(vec![(0, 1), (1, 2)], RowOp::Le, 4, false);
        assert!(added1);
        assert!(!added2);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn refcount_tracks_branch_node_retention() {
        let mut pool = ConstraintPool::new();
        let (id, _) = pool.add_row(row(0, 1), RowOp::Le, 1, false);
        pool.inc_ref(id);
        assert_eq!(pool.header(id).refcount, 1);
        pool.dec_ref(id);
        assert_eq!(pool.header(id).refcount, 0);
    }

    #[test]
    fn initial_rows_are_never_collected() {
        let mut pool = ConstraintPool::new();
        let (id, _) = pool.add_row(row(0, 1), RowOp::Le, 1, true);
        pool.garbage_collect(0);
        assert!(!pool.header(id).discard);
    }

    #[test]
    fn lp_shadow_consistency_after_mark_pending() {
        let mut pool = ConstraintPool::new();
        let (id, _) = pool.add_row(row(0, 1), RowOp::Le, 1, false);
        assert_eq!(pool.header(id).lp_shadow, LP_SHADOW_ABSENT);
        pool.mark_pending(id);
        assert_eq!(pool.header(id).lp_shadow, LP_SHADOW_PENDING);
    }

    #[test]
    fn version_increases_on_new_row() {
        let mut pool = ConstraintPool::new();
        let v0 = pool.version();
        pool.add_row(row(0, 1), RowOp::Le, 1, false);
        assert!(pool.version() > v0);
    }

    #[test]
    fn gc_preserving_all_live_rows_changes_nothing_observable() {
        let mut pool = ConstraintPool::new();
        let (id, _) = pool.add_row(row(0, 1), RowOp::Le, 1, false);
        pool.inc_ref(id);
        pool.garbage_collect(0);
        assert!(!pool.header(id).discard);
        assert_eq!(pool.len(), 1);
    }
}
