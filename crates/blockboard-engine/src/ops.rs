//! High-level editing operations.
//!
//! Each operation takes the current layout by reference and returns a new
//! one, so callers can checkpoint the input before applying the output.
//! Operations that can disturb neighbours run the collision resolver;
//! rigid group moves deliberately do not.

use blockboard_core::geometry::{Cell, GridRect};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::constrain::constrain;
use crate::ingest::{ingest as ingest_proposals, ProposedBlock};
use crate::model::{Block, BlockId, BlockKind, BlockModelError, Layout};
use crate::redistribute::distribute_even;
use crate::resolve::{resolve, ResolveOutcome};
use crate::slot::find_slot;

/// Default footprint for a newly added block.
pub const NEW_BLOCK_COLS: u16 = 4;
pub const NEW_BLOCK_ROWS: u16 = 4;

/// Add a block of `kind` at the first free slot among root blocks.
pub fn add_block(layout: &Layout, kind: BlockKind) -> Result<(Layout, BlockId), BlockModelError> {
    add_block_sized(layout, kind, NEW_BLOCK_COLS, NEW_BLOCK_ROWS)
}

/// Add a block with an explicit footprint.
pub fn add_block_sized(
    layout: &Layout,
    kind: BlockKind,
    cols: u16,
    rows: u16,
) -> Result<(Layout, BlockId), BlockModelError> {
    let mut next = layout.clone();
    let id = next.allocate_id()?;

    let occupied: Vec<GridRect> = next.roots().map(|b| b.pos).collect();
    let cols = cols.clamp(1, next.grid_columns);
    let rows = rows.max(1);
    let Cell { col, row } = find_slot(&occupied, next.grid_columns, cols, rows);

    next.blocks
        .push(Block::new(id, kind, GridRect::new(col, cols, row, rows)));
    Ok((next, id))
}

/// Move `ids` (plus the children of any moved container) by one shared
/// delta, preserving relative offsets exactly.
///
/// The delta is clamped so every member stays on the grid. The resolver is
/// bypassed: a group move is rigid, and neighbours are left where they are.
pub fn move_group(
    layout: &Layout,
    ids: &[BlockId],
    delta_cols: i32,
    delta_rows: i32,
) -> Result<Layout, BlockModelError> {
    let members = expand_members(layout, ids)?;

    // Clamp the shared delta so the extreme member still fits.
    let mut dc = delta_cols;
    let mut dr = delta_rows;
    for id in &members {
        if let Some(block) = layout.get(*id) {
            let pos = block.pos;
            let min_dc = 1 - i32::from(pos.col_start);
            let max_dc = i32::from(layout.grid_columns + 1 - pos.col_span.min(layout.grid_columns))
                - i32::from(pos.col_start);
            dc = dc.clamp(min_dc, max_dc.max(min_dc));
            let min_dr = 1 - i32::from(pos.row_start);
            dr = dr.max(min_dr);
        }
    }

    let mut next = layout.clone();
    for id in &members {
        if let Some(block) = next.get_mut(*id) {
            let col = (i32::from(block.pos.col_start) + dc).max(1) as u16;
            let row = (i32::from(block.pos.row_start) + dr).max(1) as u16;
            block.pos = GridRect::new(col, block.pos.col_span, row, block.pos.row_span);
        }
    }
    Ok(next)
}

/// Resize one block to `new_pos`.
///
/// Containers redistribute their children over the new footprint; leaves
/// are clamped (and containment-constrained when nested), then the layout
/// resolves around the resized block.
pub fn resize_block(
    layout: &Layout,
    id: BlockId,
    new_pos: GridRect,
) -> Result<(Layout, ResolveOutcome), BlockModelError> {
    let block = layout
        .get(id)
        .ok_or(BlockModelError::UnknownBlock { id })?;

    if block.kind.is_container() {
        let mut next = layout.clone();
        let clamped = clamp_to_grid(new_pos, layout.grid_columns);
        if let Some(b) = next.get_mut(id) {
            b.pos = clamped;
        }
        let next = distribute_even(&next, id)?;
        return Ok(resolve(next, &[], &FxHashMap::default()));
    }

    let mut next = layout.clone();
    let parent = block.parent.and_then(|p| {
        layout
            .get(p)
            .and_then(|pb| pb.kind.stack().map(|s| (pb.pos, s)))
    });
    let clamped = match parent {
        Some((container, stack)) => constrain(new_pos, container, stack),
        None => clamp_to_grid(new_pos, next.grid_columns),
    };
    if let Some(b) = next.get_mut(id) {
        b.pos = clamped;
    }
    Ok(resolve(next, &[], &FxHashMap::default()))
}

/// Toggle or set a container's stack direction and redistribute its
/// children evenly along the new axis.
pub fn set_stack_direction(
    layout: &Layout,
    id: BlockId,
    stack: crate::model::StackDirection,
) -> Result<(Layout, ResolveOutcome), BlockModelError> {
    let mut next = layout.clone();
    let block = next
        .get_mut(id)
        .ok_or(BlockModelError::UnknownBlock { id })?;
    match &mut block.kind {
        BlockKind::Container { stack: s } => *s = stack,
        _ => return Err(BlockModelError::NotAContainer { id }),
    }
    let next = distribute_even(&next, id)?;
    Ok(resolve(next, &[], &FxHashMap::default()))
}

/// Move a block into (or out of) a container.
///
/// `parent = None` re-roots the block at its current position. Containers
/// cannot be nested; nesting stays one level deep.
pub fn reparent(
    layout: &Layout,
    id: BlockId,
    parent: Option<BlockId>,
) -> Result<(Layout, ResolveOutcome), BlockModelError> {
    let block = layout
        .get(id)
        .ok_or(BlockModelError::UnknownBlock { id })?;

    let target = match parent {
        None => None,
        Some(pid) => {
            let host = layout
                .get(pid)
                .ok_or(BlockModelError::UnknownBlock { id: pid })?;
            let Some(stack) = host.kind.stack() else {
                return Err(BlockModelError::NotAContainer { id: pid });
            };
            if block.kind.is_container() {
                return Err(BlockModelError::NestingTooDeep { id });
            }
            Some((pid, host.pos, stack))
        }
    };

    let mut next = layout.clone();
    if let Some(b) = next.get_mut(id) {
        match target {
            Some((pid, container, stack)) => {
                b.parent = Some(pid);
                b.pos = constrain(b.pos, container, stack);
            }
            None => {
                b.parent = None;
                b.pos = clamp_to_grid(b.pos, layout.grid_columns);
            }
        }
    }
    Ok(resolve(next, &[], &FxHashMap::default()))
}

/// Delete `ids`. With `cascade`, a deleted container takes its children
/// with it; otherwise the children are re-rooted in place.
pub fn delete_blocks(
    layout: &Layout,
    ids: &[BlockId],
    cascade: bool,
) -> Result<Layout, BlockModelError> {
    for id in ids {
        if !layout.contains(*id) {
            return Err(BlockModelError::UnknownBlock { id: *id });
        }
    }
    let mut doomed: FxHashSet<BlockId> = ids.iter().copied().collect();
    if cascade {
        for block in &layout.blocks {
            if block.parent.is_some_and(|p| doomed.contains(&p)) {
                doomed.insert(block.id);
            }
        }
    }

    let mut next = layout.clone();
    next.blocks.retain(|b| !doomed.contains(&b.id));
    for block in &mut next.blocks {
        if block.parent.is_some_and(|p| doomed.contains(&p)) {
            block.parent = None;
        }
    }
    Ok(next)
}

/// Ingest externally produced proposals. See [`crate::ingest`].
pub fn ingest(
    layout: &Layout,
    proposals: &[ProposedBlock],
) -> Result<(Layout, ResolveOutcome), BlockModelError> {
    ingest_proposals(layout, proposals)
}

// ==== helpers ====

fn clamp_to_grid(pos: GridRect, grid_columns: u16) -> GridRect {
    let col_span = pos.col_span.clamp(1, grid_columns);
    let col_start = pos.col_start.clamp(1, grid_columns + 1 - col_span);
    GridRect::new(col_start, col_span, pos.row_start.max(1), pos.row_span.max(1))
}

fn expand_members(layout: &Layout, ids: &[BlockId]) -> Result<Vec<BlockId>, BlockModelError> {
    let mut members: Vec<BlockId> = Vec::with_capacity(ids.len());
    let mut seen: FxHashSet<BlockId> = FxHashSet::default();
    for id in ids {
        if !layout.contains(*id) {
            return Err(BlockModelError::UnknownBlock { id: *id });
        }
        if seen.insert(*id) {
            members.push(*id);
        }
    }
    // A moved container carries its children.
    for block in &layout.blocks {
        if block.parent.is_some_and(|p| seen.contains(&p)) && seen.insert(block.id) {
            members.push(block.id);
        }
    }
    Ok(members)
}
