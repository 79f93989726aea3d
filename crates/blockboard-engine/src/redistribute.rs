//! Container child redistribution.
//!
//! Two triggers, two algorithms, both operating on the direct children of a
//! single container:
//!
//! - [`distribute_even`] — direction toggle or explicit size change. Grows
//!   the container (never shrinks it) to hold its children at the floor
//!   size, then divides the interior exactly: zero gaps, exact sum.
//! - [`rescale`] — one interactive resize tick. Rescales proportionally
//!   from the drag-start snapshot; any child pushed under its axis floor
//!   rejects the whole tick so no half-applied state ever lands.
//!
//! The two paths intentionally use different padding/floor constants; the
//! divergence is carried over from the observed behavior rather than
//! unified by guesswork.

use blockboard_core::geometry::GridRect;

use crate::constrain::interior;
use crate::model::{BlockId, BlockModelError, Layout, StackDirection};

/// Extra axis units required beyond the child floors in the even path.
pub const EVEN_PADDING: u16 = 2;
/// Per-child minimum extent along the distribution axis in the even path.
pub const EVEN_MIN_FLOOR: u16 = 2;

/// Column floor for any child during an interactive rescale tick.
pub const RESCALE_MIN_COLS: u16 = 1;
/// Row floor for any child during an interactive rescale tick.
pub const RESCALE_MIN_ROWS: u16 = 3;
/// Overall container height floor during an interactive rescale tick.
pub const CONTAINER_MIN_ROWS: u16 = 5;

fn sorted_child_ids(layout: &Layout, container: BlockId, stack: StackDirection) -> Vec<BlockId> {
    let mut ids: Vec<(u16, u16, BlockId)> = layout
        .children_of(container)
        .map(|c| {
            let (key, cross) = match stack {
                StackDirection::Horizontal => (c.pos.col_start, c.pos.row_start),
                StackDirection::Vertical => (c.pos.row_start, c.pos.col_start),
            };
            (key, cross, c.id)
        })
        .collect();
    // After a direction toggle every child shares one coordinate on the new
    // axis; the cross-axis key carries the prior spatial order through.
    ids.sort_by_key(|&(key, cross, id)| (key, cross, id));
    ids.into_iter().map(|(_, _, id)| id).collect()
}

/// Recompute a container's children with even distribution.
///
/// Children are sorted by their current position along the distribution
/// axis, then given `floor(extent / n)` units each with the remainder going
/// to the first `extent % n` children. The cross axis stretches every child
/// to the full interior extent.
pub fn distribute_even(layout: &Layout, container_id: BlockId) -> Result<Layout, BlockModelError> {
    let mut layout = layout.clone();
    let container = layout
        .get(container_id)
        .ok_or(BlockModelError::UnknownBlock { id: container_id })?;
    let stack = container
        .kind
        .stack()
        .ok_or(BlockModelError::NotAContainer { id: container_id })?;

    let child_ids = sorted_child_ids(&layout, container_id, stack);
    let n = child_ids.len() as u16;
    if n == 0 {
        return Ok(layout);
    }

    // Grow-only sizing: the distribution axis must hold every child at the
    // floor size plus padding.
    let required = n * EVEN_MIN_FLOOR + EVEN_PADDING;
    let mut pos = container.pos;
    match stack {
        StackDirection::Vertical => {
            pos.row_span = pos.row_span.max(required);
        }
        StackDirection::Horizontal => {
            pos.col_span = pos.col_span.max(required).min(layout.grid_columns);
            let last_start = layout.grid_columns + 1 - pos.col_span;
            pos.col_start = pos.col_start.clamp(1, last_start);
        }
    }
    if let Some(block) = layout.get_mut(container_id) {
        block.pos = pos;
    }

    let inner = interior(pos);
    let extent = match stack {
        StackDirection::Vertical => inner.row_span,
        StackDirection::Horizontal => inner.col_span,
    };
    let base = extent / n;
    let remainder = extent % n;

    let mut offset = match stack {
        StackDirection::Vertical => inner.row_start,
        StackDirection::Horizontal => inner.col_start,
    };
    for (i, id) in child_ids.iter().enumerate() {
        // Degenerate interiors still give every child one unit.
        let size = (base + u16::from((i as u16) < remainder)).max(1);
        if let Some(child) = layout.get_mut(*id) {
            match stack {
                StackDirection::Vertical => {
                    child.pos = GridRect::new(inner.col_start, inner.col_span, offset, size);
                }
                StackDirection::Horizontal => {
                    // Overcrowded interiors pin trailing children to the
                    // last column instead of spilling past the grid edge.
                    let start = offset.min(inner.right() - 1);
                    let fit = size.min(inner.right() - start);
                    child.pos = GridRect::new(start, fit, inner.row_start, inner.row_span);
                }
            }
        }
        offset += size;
    }

    Ok(layout)
}

#[inline]
fn scale_round(value: u16, scale: f64) -> u16 {
    (f64::from(value) * scale).round() as u16
}

/// Apply one interactive resize tick to a container.
///
/// `snapshot` is the layout captured at drag start; every tick derives from
/// it, never from the previous tick's output, so rounding never compounds.
/// Returns `Ok(None)` when the tick would push any child under its axis
/// floor or the container under its own height floor; the caller keeps the
/// pre-tick layout in that case.
pub fn rescale(
    snapshot: &Layout,
    container_id: BlockId,
    new_pos: GridRect,
) -> Result<Option<Layout>, BlockModelError> {
    let container = snapshot
        .get(container_id)
        .ok_or(BlockModelError::UnknownBlock { id: container_id })?;
    let stack = container
        .kind
        .stack()
        .ok_or(BlockModelError::NotAContainer { id: container_id })?;

    if new_pos.row_span < CONTAINER_MIN_ROWS {
        return Ok(None);
    }

    let old_inner = interior(container.pos);
    let new_inner = interior(new_pos);
    let scale_cols = if old_inner.col_span == 0 {
        1.0
    } else {
        f64::from(new_inner.col_span) / f64::from(old_inner.col_span)
    };
    let scale_rows = if old_inner.row_span == 0 {
        1.0
    } else {
        f64::from(new_inner.row_span) / f64::from(old_inner.row_span)
    };

    let child_ids = sorted_child_ids(snapshot, container_id, stack);

    let mut updated = snapshot.clone();
    if let Some(block) = updated.get_mut(container_id) {
        block.pos = new_pos;
    }

    // Monotonic placement along the distribution axis: each child starts no
    // earlier than the previous child's end.
    let mut prev_end = match stack {
        StackDirection::Vertical => new_inner.row_start,
        StackDirection::Horizontal => new_inner.col_start,
    };

    for id in child_ids {
        let initial = snapshot.get(id).map(|c| c.pos).unwrap_or(new_inner);

        let rel_cols = initial.col_start.saturating_sub(old_inner.col_start);
        let rel_rows = initial.row_start.saturating_sub(old_inner.row_start);
        let mut col_start = new_inner.col_start + scale_round(rel_cols, scale_cols);
        let mut col_span = scale_round(initial.col_span, scale_cols);
        let mut row_start = new_inner.row_start + scale_round(rel_rows, scale_rows);
        let mut row_span = scale_round(initial.row_span, scale_rows);

        match stack {
            StackDirection::Horizontal => {
                col_start = col_start.max(prev_end);
                if col_start.saturating_add(col_span) > new_inner.right() {
                    col_span = new_inner.right().saturating_sub(col_start);
                }
                prev_end = col_start.saturating_add(col_span);
                // Cross axis: cap to the new interior extent.
                row_span = row_span.min(new_inner.row_span);
                row_start = row_start
                    .max(new_inner.row_start)
                    .min(new_inner.bottom().saturating_sub(row_span).max(new_inner.row_start));
            }
            StackDirection::Vertical => {
                row_start = row_start.max(prev_end);
                if row_start.saturating_add(row_span) > new_inner.bottom() {
                    row_span = new_inner.bottom().saturating_sub(row_start);
                }
                prev_end = row_start.saturating_add(row_span);
                col_span = col_span.min(new_inner.col_span);
                col_start = col_start
                    .max(new_inner.col_start)
                    .min(new_inner.right().saturating_sub(col_span).max(new_inner.col_start));
            }
        }

        if col_span < RESCALE_MIN_COLS || row_span < RESCALE_MIN_ROWS {
            return Ok(None);
        }

        if let Some(child) = updated.get_mut(id) {
            child.pos = GridRect::new(col_start, col_span, row_start, row_span);
        }
    }

    Ok(Some(updated))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Block, BlockKind};

    fn container_block(id: u64, stack: StackDirection, pos: GridRect) -> Block {
        Block::new(
            BlockId::new(id).unwrap(),
            BlockKind::Container { stack },
            pos,
        )
    }

    fn child_block(id: u64, parent: u64, pos: GridRect) -> Block {
        Block::nested(
            BlockId::new(id).unwrap(),
            BlockKind::Text,
            pos,
            BlockId::new(parent).unwrap(),
        )
    }

    fn layout_with(blocks: Vec<Block>) -> Layout {
        let max = blocks.iter().map(|b| b.id.get()).max().unwrap_or(0);
        Layout {
            next_id: BlockId::new(max + 1).unwrap(),
            blocks,
            ..Layout::new(12)
        }
    }

    fn pos_of(layout: &Layout, id: u64) -> GridRect {
        layout.get(BlockId::new(id).unwrap()).unwrap().pos
    }

    // ---- Even distribution ----

    #[test]
    fn vertical_even_split_matches_remainder_rule() {
        // Container rowSpan 10, interior 8, three children: heights [3, 3, 2].
        let layout = layout_with(vec![
            container_block(1, StackDirection::Vertical, GridRect::new(1, 12, 1, 10)),
            child_block(2, 1, GridRect::new(1, 12, 2, 2)),
            child_block(3, 1, GridRect::new(1, 12, 4, 2)),
            child_block(4, 1, GridRect::new(1, 12, 6, 2)),
        ]);
        let out = distribute_even(&layout, BlockId::new(1).unwrap()).unwrap();

        assert_eq!(pos_of(&out, 1).row_span, 10, "no shrink, no growth needed");
        assert_eq!(pos_of(&out, 2).rows().start, 2);
        assert_eq!(pos_of(&out, 2).row_span, 3);
        assert_eq!(pos_of(&out, 3).rows().start, 5);
        assert_eq!(pos_of(&out, 3).row_span, 3);
        assert_eq!(pos_of(&out, 4).rows().start, 8);
        assert_eq!(pos_of(&out, 4).row_span, 2);
        // Exact sum, zero gaps.
        assert_eq!(pos_of(&out, 4).bottom(), 10);
    }

    #[test]
    fn even_split_sum_equals_interior_extent() {
        for n in 1..=5u64 {
            let mut blocks = vec![container_block(
                1,
                StackDirection::Vertical,
                GridRect::new(1, 12, 1, 13),
            )];
            for i in 0..n {
                blocks.push(child_block(
                    2 + i,
                    1,
                    GridRect::new(1, 12, 2 + i as u16, 1),
                ));
            }
            let layout = layout_with(blocks);
            let out = distribute_even(&layout, BlockId::new(1).unwrap()).unwrap();
            let total: u16 = out
                .children_of(BlockId::new(1).unwrap())
                .map(|c| c.pos.row_span)
                .sum();
            let inner = interior(pos_of(&out, 1));
            assert_eq!(total, inner.row_span, "n = {n}");
        }
    }

    #[test]
    fn even_split_grows_too_small_container() {
        // Three children need rowSpan >= 3*2+2 = 8; container has 6.
        let layout = layout_with(vec![
            container_block(1, StackDirection::Vertical, GridRect::new(1, 12, 1, 6)),
            child_block(2, 1, GridRect::new(1, 12, 2, 1)),
            child_block(3, 1, GridRect::new(1, 12, 3, 1)),
            child_block(4, 1, GridRect::new(1, 12, 4, 1)),
        ]);
        let out = distribute_even(&layout, BlockId::new(1).unwrap()).unwrap();
        assert_eq!(pos_of(&out, 1).row_span, 8);
    }

    #[test]
    fn horizontal_even_split_stretches_cross_axis() {
        let layout = layout_with(vec![
            container_block(1, StackDirection::Horizontal, GridRect::new(1, 12, 1, 10)),
            child_block(2, 1, GridRect::new(1, 2, 2, 3)),
            child_block(3, 1, GridRect::new(6, 2, 2, 3)),
        ]);
        let out = distribute_even(&layout, BlockId::new(1).unwrap()).unwrap();
        // Interior is 12 wide: widths [6, 6]; every child spans interior rows.
        assert_eq!(pos_of(&out, 2), GridRect::new(1, 6, 2, 8));
        assert_eq!(pos_of(&out, 3), GridRect::new(7, 6, 2, 8));
    }

    #[test]
    fn even_split_preserves_prior_order() {
        // Child 3 currently sits left of child 2; the split must keep that.
        let layout = layout_with(vec![
            container_block(1, StackDirection::Horizontal, GridRect::new(1, 12, 1, 10)),
            child_block(2, 1, GridRect::new(8, 2, 2, 3)),
            child_block(3, 1, GridRect::new(2, 2, 2, 3)),
        ]);
        let out = distribute_even(&layout, BlockId::new(1).unwrap()).unwrap();
        assert!(pos_of(&out, 3).col_start < pos_of(&out, 2).col_start);
    }

    #[test]
    fn even_split_after_toggle_keeps_spatial_order() {
        // Post-toggle state: the container already stacks vertically, but
        // its children still sit side by side from the horizontal layout.
        // Child 3 (leftmost, higher id) must end up above child 2.
        let layout = layout_with(vec![
            container_block(1, StackDirection::Vertical, GridRect::new(1, 12, 1, 10)),
            child_block(2, 1, GridRect::new(7, 6, 2, 8)),
            child_block(3, 1, GridRect::new(1, 6, 2, 8)),
        ]);
        let out = distribute_even(&layout, BlockId::new(1).unwrap()).unwrap();
        assert!(
            pos_of(&out, 3).row_start < pos_of(&out, 2).row_start,
            "leftmost child stacks first: got {:?} vs {:?}",
            pos_of(&out, 3),
            pos_of(&out, 2)
        );
    }

    #[test]
    fn even_split_without_children_is_identity() {
        let layout = layout_with(vec![container_block(
            1,
            StackDirection::Vertical,
            GridRect::new(1, 12, 1, 6),
        )]);
        let out = distribute_even(&layout, BlockId::new(1).unwrap()).unwrap();
        assert_eq!(out.state_hash(), layout.state_hash());
    }

    #[test]
    fn even_split_on_leaf_is_an_error() {
        let layout = layout_with(vec![Block::new(
            BlockId::new(1).unwrap(),
            BlockKind::Stats,
            GridRect::new(1, 3, 1, 6),
        )]);
        assert!(matches!(
            distribute_even(&layout, BlockId::new(1).unwrap()),
            Err(BlockModelError::NotAContainer { .. })
        ));
    }

    // ---- Interactive rescale ----

    #[test]
    fn rescale_shrinks_children_proportionally() {
        // Vertical container rows 12 (interior 10), children heights [5, 5].
        let layout = layout_with(vec![
            container_block(1, StackDirection::Vertical, GridRect::new(1, 12, 1, 12)),
            child_block(2, 1, GridRect::new(1, 12, 2, 5)),
            child_block(3, 1, GridRect::new(1, 12, 7, 5)),
        ]);
        let out = rescale(
            &layout,
            BlockId::new(1).unwrap(),
            GridRect::new(1, 12, 1, 8),
        )
        .unwrap()
        .expect("tick accepted");
        // Interior shrinks 10 -> 6, scale 0.6: heights [3, 3] at rows 2 and 5.
        assert_eq!(pos_of(&out, 1).row_span, 8);
        assert_eq!(pos_of(&out, 2).rows(), blockboard_core::Span::new(2, 3));
        assert_eq!(pos_of(&out, 3).rows(), blockboard_core::Span::new(5, 3));
    }

    #[test]
    fn rescale_rejects_below_column_floor() {
        // Horizontal container width 12 -> 3: a 1-wide child scales to 0.
        let layout = layout_with(vec![
            container_block(1, StackDirection::Horizontal, GridRect::new(1, 12, 1, 10)),
            child_block(2, 1, GridRect::new(1, 1, 2, 8)),
            child_block(3, 1, GridRect::new(2, 11, 2, 8)),
        ]);
        let out = rescale(
            &layout,
            BlockId::new(1).unwrap(),
            GridRect::new(1, 3, 1, 10),
        )
        .unwrap();
        assert!(out.is_none(), "tick must be rejected, not half-applied");
    }

    #[test]
    fn rescale_rejects_below_container_height_floor() {
        let layout = layout_with(vec![container_block(
            1,
            StackDirection::Vertical,
            GridRect::new(1, 12, 1, 12),
        )]);
        let out = rescale(
            &layout,
            BlockId::new(1).unwrap(),
            GridRect::new(1, 12, 1, CONTAINER_MIN_ROWS - 1),
        )
        .unwrap();
        assert!(out.is_none());
    }

    #[test]
    fn rescale_keeps_children_monotonic() {
        // Aggressive shrink where naive rounding would interleave children.
        let layout = layout_with(vec![
            container_block(1, StackDirection::Horizontal, GridRect::new(1, 12, 1, 10)),
            child_block(2, 1, GridRect::new(1, 5, 2, 8)),
            child_block(3, 1, GridRect::new(6, 3, 2, 8)),
            child_block(4, 1, GridRect::new(9, 4, 2, 8)),
        ]);
        let out = rescale(
            &layout,
            BlockId::new(1).unwrap(),
            GridRect::new(1, 7, 1, 10),
        )
        .unwrap()
        .expect("tick accepted");
        let a = pos_of(&out, 2);
        let b = pos_of(&out, 3);
        let c = pos_of(&out, 4);
        assert!(a.right() <= b.col_start);
        assert!(b.right() <= c.col_start);
        assert!(c.right() <= interior(pos_of(&out, 1)).right());
    }

    #[test]
    fn rescale_derives_from_snapshot_not_previous_tick() {
        let layout = layout_with(vec![
            container_block(1, StackDirection::Vertical, GridRect::new(1, 12, 1, 12)),
            child_block(2, 1, GridRect::new(1, 12, 2, 10)),
        ]);
        let id = BlockId::new(1).unwrap();
        // Tick straight to rows 9 vs through an intermediate tick: the final
        // geometry must be identical because both derive from the snapshot.
        let direct = rescale(&layout, id, GridRect::new(1, 12, 1, 9))
            .unwrap()
            .unwrap();
        let _intermediate = rescale(&layout, id, GridRect::new(1, 12, 1, 11))
            .unwrap()
            .unwrap();
        let stepped = rescale(&layout, id, GridRect::new(1, 12, 1, 9))
            .unwrap()
            .unwrap();
        assert_eq!(direct.state_hash(), stepped.state_hash());
    }

    #[test]
    fn rescale_grows_children_too() {
        let layout = layout_with(vec![
            container_block(1, StackDirection::Vertical, GridRect::new(1, 12, 1, 7)),
            child_block(2, 1, GridRect::new(1, 12, 2, 5)),
        ]);
        let out = rescale(
            &layout,
            BlockId::new(1).unwrap(),
            GridRect::new(1, 12, 1, 12),
        )
        .unwrap()
        .expect("tick accepted");
        assert_eq!(pos_of(&out, 2).row_span, 10);
    }

    #[test]
    fn rescale_unknown_container_is_an_error() {
        let layout = layout_with(vec![]);
        assert!(matches!(
            rescale(
                &layout,
                BlockId::new(9).unwrap(),
                GridRect::new(1, 12, 1, 10)
            ),
            Err(BlockModelError::UnknownBlock { .. })
        ));
    }
}
