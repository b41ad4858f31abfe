//! The constraint pool's coefficient arena (§4.5): an append-only block
//! list, not a `bumpalo` wrapper (see DESIGN.md for why) — `bumpalo` only
//! supports whole-arena `reset()`, and this arena needs to compact
//! *survivors* during GC while leaving unreachable rows' storage behind.

use super::row::RowId;

/// One row's coefficient payload: `(variable index, integer coefficient)`
/// pairs in canonical (sorted-by-variable) order. A block is always
/// allocated fresh on `push` and never reused from a freed tail fragment,
/// matching §4.5's row-addition protocol.
#[derive(Debug, Clone)]
pub struct Block {
    pub row_id: RowId,
    pub coeffs: Vec<(u32, i64)>,
}

/// Append-only list of coefficient blocks, one per live row. `push` never
/// reuses space; only `compact` reclaims it, and only for rows the caller
/// says are dead.
#[derive(Debug, Clone, Default)]
pub struct Arena {
    blocks: Vec<Block>,
}

impl Arena {
    pub fn new() -> Self {
        Self { blocks: Vec::new() }
    }

    /// Appends a new block, returning its current index. The index is only
    /// valid until the next `compact` call; callers must re-resolve it from
    /// `row_id` afterward (the constraint pool does this via its header's
    /// `block` field, which it updates after every `compact`).
    pub fn push(&mut self, row_id: RowId, coeffs: Vec<(u32, i64)>) -> usize {
        self.blocks.push(Block { row_id, coeffs });
        self.blocks.len() - 1
    }

    pub fn block(&self, index: usize) -> &Block {
        &self.blocks[index]
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Total non-zero coefficient count across all live blocks, used to
    /// decide whether GC should trigger.
    pub fn total_nonzeros(&self) -> usize {
        self.blocks.iter().map(|b| b.coeffs.len()).sum()
    }

    /// Compacts survivors: drops every block whose row id is not in `keep`,
    /// preserving the relative order of survivors. §4.5 describes this as
    /// "reverse the arena block list, compact survivors by memmove, free
    /// emptied blocks, reverse back" — a reverse-retain-reverse round trip
    /// produces the same observable result as that memmove-based
    /// compaction, since both leave survivors in their original relative
    /// order with dead blocks' storage reclaimed.
    ///
    /// Returns the new `(row_id -> block index)` mapping so the caller can
    /// update row headers.
    pub fn compact(&mut self, keep: &hashbrown::HashSet<RowId>) -> hashbrown::HashMap<RowId, usize> {
        self.blocks.reverse();
        self.blocks.retain(|b| keep.contains(&b.row_id));
        self.blocks.reverse();

        let mut mapping = hashbrown::HashMap::with_capacity(self.blocks.len());
        for (idx, block) in self.blocks.iter().enumerate() {
            mapping.insert(block.row_id, idx);
        }
        mapping
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compact_preserves_survivor_order() {
        let mut arena = Arena::new();
        let ids: Vec<RowId> = (0..5).map(RowId::new).collect();
        for &id in &ids {
            arena.push(id, vec![(0, 1)]);
        }
        let keep: hashbrown::HashSet<RowId> = [ids[1], ids[3]].into_iter().collect();
        let mapping = arena.compact(&keep);
        assert_eq!(arena.len(), 2);
        assert_eq!(arena.block(mapping[&ids[1]]).row_id, ids[1]);
        assert_eq!(arena.block(mapping[&ids[3]]).row_id, ids[3]);
        // relative order preserved: ids[1] (originally before ids[3]) stays first.
        assert!(mapping[&ids[1]] < mapping[&ids[3]]);
    }
}
