//! Collision resolver.
//!
//! Given a layout and the set of blocks a tick just moved, relaxes every
//! pairwise overlap among comparable blocks (root blocks with each other,
//! siblings of the same container with each other) to a stable state.
//!
//! The only adjustment ever performed is pushing a block's `row_start` down,
//! so displacement is monotonic and the loop converges; a fixed pass cap
//! bounds pathological inputs, and residual overlap after the cap is a
//! non-fatal, logged condition rather than an error.
//!
//! Known gap, preserved as observed: pairs in which *both* blocks moved in
//! the same tick are skipped, so two simultaneously-moved blocks may keep
//! overlapping. The rigid group-move path validates against static blocks
//! before committing, which is where this otherwise would bite.

use blockboard_core::geometry::GridRect;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::constrain::constrain;
use crate::model::{Block, BlockId, Layout};

/// Upper bound on relaxation passes.
pub const RESOLVE_PASS_CAP: usize = 100;

/// What a resolver run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveOutcome {
    /// Passes actually executed.
    pub passes: usize,
    /// Whether a pass completed without any adjustment.
    pub converged: bool,
}

/// Whether two blocks are in conflict.
///
/// Comparable pairs are root/root and siblings of the same parent; a direct
/// parent/child overlap is containment, not a violation.
#[must_use]
pub fn violates(a: &Block, b: &Block) -> bool {
    if a.id == b.id || a.parent != b.parent {
        return false;
    }
    a.pos.overlaps(b.pos)
}

/// Relax all overlaps, starting from `overrides` applied on top of `layout`.
///
/// `moved` names the blocks the current tick repositioned; `overrides`
/// supplies their new rectangles (ids absent from the layout are ignored).
/// Returns the settled layout and a [`ResolveOutcome`].
#[must_use]
pub fn resolve(
    mut layout: Layout,
    moved: &[BlockId],
    overrides: &FxHashMap<BlockId, GridRect>,
) -> (Layout, ResolveOutcome) {
    let moved_set: FxHashSet<BlockId> = moved.iter().copied().collect();

    for (id, pos) in overrides {
        if let Some(block) = layout.get_mut(*id) {
            block.pos = *pos;
        }
    }

    // Scan order is stable for the whole run: top to bottom, left to right.
    layout
        .blocks
        .sort_by_key(|b| (b.pos.row_start, b.pos.col_start, b.id));

    let mut passes = 0;
    let mut converged = false;
    while passes < RESOLVE_PASS_CAP {
        passes += 1;
        let mut changed = false;

        // Re-clamp every child against its (possibly just-moved) parent.
        let parents: FxHashMap<BlockId, (GridRect, crate::model::StackDirection)> = layout
            .blocks
            .iter()
            .filter_map(|b| b.kind.stack().map(|stack| (b.id, (b.pos, stack))))
            .collect();
        for block in &mut layout.blocks {
            let Some(parent_id) = block.parent else {
                continue;
            };
            let Some((parent_pos, stack)) = parents.get(&parent_id) else {
                continue;
            };
            let clamped = constrain(block.pos, *parent_pos, *stack);
            if clamped != block.pos {
                block.pos = clamped;
                changed = true;
            }
        }

        // Settle violating pairs by pushing one of the two down.
        for i in 0..layout.blocks.len() {
            for j in (i + 1)..layout.blocks.len() {
                let (a, b) = {
                    let (left, right) = layout.blocks.split_at(j);
                    (&left[i], &right[0])
                };
                if !violates(a, b) {
                    continue;
                }
                let a_moved = moved_set.contains(&a.id);
                let b_moved = moved_set.contains(&b.id);
                if a_moved && b_moved {
                    continue;
                }

                // One moved: the moved block yields. Neither moved: the lower
                // block settles below the higher one.
                let (push_idx, below) = if a_moved {
                    (i, b.pos.bottom())
                } else if b_moved {
                    (j, a.pos.bottom())
                } else if a.pos.row_start >= b.pos.row_start {
                    (i, b.pos.bottom())
                } else {
                    (j, a.pos.bottom())
                };

                let pushed = &mut layout.blocks[push_idx];
                if pushed.pos.row_start != below {
                    pushed.pos.row_start = below;
                    changed = true;
                }
            }
        }

        if !changed {
            converged = true;
            break;
        }
    }

    if !converged {
        #[cfg(feature = "tracing")]
        tracing::warn!(
            passes = passes,
            "collision resolver hit its pass cap with residual overlap"
        );
    }

    // The last pass may have pushed a child past its container's interior;
    // containment always holds on exit, even if overlap had to remain.
    let parents: FxHashMap<BlockId, (GridRect, crate::model::StackDirection)> = layout
        .blocks
        .iter()
        .filter_map(|b| b.kind.stack().map(|stack| (b.id, (b.pos, stack))))
        .collect();
    for block in &mut layout.blocks {
        if let Some((parent_pos, stack)) = block.parent.and_then(|p| parents.get(&p)) {
            block.pos = constrain(block.pos, *parent_pos, *stack);
        }
    }

    (layout, ResolveOutcome { passes, converged })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Block, BlockKind, StackDirection};

    fn leaf(id: u64, pos: GridRect) -> Block {
        Block::new(BlockId::new(id).unwrap(), BlockKind::Stats, pos)
    }

    fn layout_with(blocks: Vec<Block>) -> Layout {
        let max = blocks.iter().map(|b| b.id.get()).max().unwrap_or(0);
        Layout {
            next_id: BlockId::new(max + 1).unwrap(),
            blocks,
            ..Layout::new(12)
        }
    }

    fn no_overrides() -> FxHashMap<BlockId, GridRect> {
        FxHashMap::default()
    }

    fn pos_of(layout: &Layout, id: u64) -> GridRect {
        layout.get(BlockId::new(id).unwrap()).unwrap().pos
    }

    // ---- Pair settling ----

    #[test]
    fn untouched_pair_settles_by_gravity() {
        let layout = layout_with(vec![
            leaf(1, GridRect::new(1, 4, 1, 4)),
            leaf(2, GridRect::new(2, 4, 2, 4)),
        ]);
        let (settled, outcome) = resolve(layout, &[], &no_overrides());
        assert!(outcome.converged);
        // Block 2 starts lower, so it is the one pushed below block 1.
        assert_eq!(pos_of(&settled, 1).rows().start, 1);
        assert_eq!(pos_of(&settled, 2).rows().start, 5);
        assert!(settled.invariant_report().issues.is_empty());
    }

    #[test]
    fn moved_block_yields_to_static() {
        let layout = layout_with(vec![
            leaf(1, GridRect::new(1, 4, 1, 4)),
            leaf(2, GridRect::new(1, 4, 8, 4)),
        ]);
        let moved = [BlockId::new(1).unwrap()];
        let mut overrides = no_overrides();
        // Drop block 1 right on top of block 2.
        overrides.insert(moved[0], GridRect::new(1, 4, 8, 4));
        let (settled, outcome) = resolve(layout, &moved, &overrides);
        assert!(outcome.converged);
        assert_eq!(pos_of(&settled, 2).row_start, 8, "static block holds");
        assert_eq!(pos_of(&settled, 1).row_start, 12, "moved block yields");
    }

    #[test]
    fn both_moved_pair_is_skipped() {
        let layout = layout_with(vec![
            leaf(1, GridRect::new(1, 4, 1, 4)),
            leaf(2, GridRect::new(1, 4, 1, 4)),
        ]);
        let moved = [BlockId::new(1).unwrap(), BlockId::new(2).unwrap()];
        let (settled, outcome) = resolve(layout, &moved, &no_overrides());
        assert!(outcome.converged);
        // Documented gap: the overlap survives.
        assert!(pos_of(&settled, 1).overlaps(pos_of(&settled, 2)));
    }

    #[test]
    fn cascade_settles_a_column_of_blocks() {
        let layout = layout_with(vec![
            leaf(1, GridRect::new(1, 4, 1, 4)),
            leaf(2, GridRect::new(1, 4, 2, 4)),
            leaf(3, GridRect::new(1, 4, 3, 4)),
        ]);
        let (settled, outcome) = resolve(layout, &[], &no_overrides());
        assert!(outcome.converged);
        let mut rows: Vec<u16> = settled.blocks.iter().map(|b| b.pos.row_start).collect();
        rows.sort_unstable();
        assert_eq!(rows, vec![1, 5, 9]);
    }

    #[test]
    fn side_by_side_blocks_untouched() {
        let layout = layout_with(vec![
            leaf(1, GridRect::new(1, 3, 1, 6)),
            leaf(2, GridRect::new(4, 3, 1, 6)),
        ]);
        let (settled, outcome) = resolve(layout.clone(), &[], &no_overrides());
        assert!(outcome.converged);
        assert_eq!(outcome.passes, 1);
        assert_eq!(pos_of(&settled, 1), GridRect::new(1, 3, 1, 6));
        assert_eq!(pos_of(&settled, 2), GridRect::new(4, 3, 1, 6));
    }

    // ---- Containment interplay ----

    #[test]
    fn child_reclamped_after_parent_moves() {
        let container_id = BlockId::new(1).unwrap();
        let container = Block::new(
            container_id,
            BlockKind::Container {
                stack: StackDirection::Horizontal,
            },
            GridRect::new(1, 12, 1, 10),
        );
        let child = Block::nested(
            BlockId::new(2).unwrap(),
            BlockKind::Text,
            GridRect::new(2, 4, 2, 8),
            container_id,
        );
        let layout = layout_with(vec![container, child]);

        let mut overrides = no_overrides();
        overrides.insert(container_id, GridRect::new(1, 12, 5, 10));
        let (settled, outcome) = resolve(layout, &[container_id], &overrides);
        assert!(outcome.converged);
        let child_pos = pos_of(&settled, 2);
        assert_eq!(child_pos.rows().start, 6);
        assert_eq!(child_pos.rows().len, 8);
    }

    #[test]
    fn parent_child_overlap_is_not_a_violation() {
        let container_id = BlockId::new(1).unwrap();
        let container = Block::new(
            container_id,
            BlockKind::Container {
                stack: StackDirection::Vertical,
            },
            GridRect::new(1, 12, 1, 10),
        );
        let child = Block::nested(
            BlockId::new(2).unwrap(),
            BlockKind::Text,
            GridRect::new(1, 12, 2, 4),
            container_id,
        );
        assert!(!violates(&container, &child));
        assert!(!violates(&child, &container));
    }

    #[test]
    fn foreign_child_and_root_are_not_comparable() {
        let container_id = BlockId::new(1).unwrap();
        let child = Block::nested(
            BlockId::new(2).unwrap(),
            BlockKind::Text,
            GridRect::new(1, 6, 2, 4),
            container_id,
        );
        let root = leaf(3, GridRect::new(1, 6, 2, 4));
        assert!(!violates(&child, &root));
    }

    // ---- Properties ----

    #[test]
    fn resolve_is_idempotent() {
        let layout = layout_with(vec![
            leaf(1, GridRect::new(1, 4, 1, 4)),
            leaf(2, GridRect::new(2, 4, 2, 4)),
            leaf(3, GridRect::new(3, 4, 3, 4)),
        ]);
        let (once, _) = resolve(layout, &[], &no_overrides());
        let (twice, outcome) = resolve(once.clone(), &[], &no_overrides());
        assert!(outcome.converged);
        assert_eq!(once.state_hash(), twice.state_hash());
    }

    #[test]
    fn override_for_unknown_id_is_ignored() {
        let layout = layout_with(vec![leaf(1, GridRect::new(1, 3, 1, 4))]);
        let mut overrides = no_overrides();
        overrides.insert(BlockId::new(99).unwrap(), GridRect::new(1, 3, 5, 4));
        let (settled, outcome) = resolve(layout, &[], &overrides);
        assert!(outcome.converged);
        assert_eq!(settled.blocks.len(), 1);
    }
}
