//! Placement validator ("ghost" engine).
//!
//! Models an in-progress drag as explicit state: [`DragState::Idle`] or
//! [`DragState::Dragging`] with a [`DragContext`] holding the layout
//! snapshot taken at drag start. Every pointer tick derives a fresh
//! [`Ghost`] from that snapshot — the snapshot itself is never mutated, and
//! no tick compounds on the previous tick's output.
//!
//! Candidate selection runs in two modes, by priority:
//!
//! 1. Nested — a single non-container block whose pointer cell falls inside
//!    a root container: the candidate is containment-clamped; sibling
//!    overlap triggers a shrink-only repair along the stack's free axis.
//! 2. Root — container drags, group drags, and anything without a hosting
//!    container: the anchor is clamped into grid bounds, and a group is
//!    valid only as a rigid body (every member in bounds, no member
//!    touching a non-moving block).
//!
//! Committing an invalid ghost leaves the snapshot unchanged; committing a
//! valid group applies one shared delta to every member and bypasses the
//! collision resolver so members never re-pack against each other.

use blockboard_core::geometry::{Cell, GridRect};
use rustc_hash::FxHashSet;

use crate::constrain::{constrain, interior};
use crate::model::{Block, BlockId, BlockModelError, Layout, StackDirection};

/// Minimum span a shrink-only repair may leave on the free axis.
pub const REPAIR_MIN_SPAN: u16 = 1;

/// A non-committed candidate placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ghost {
    /// Candidate rectangle for the active block.
    pub pos: GridRect,
    /// Hosting container, if the candidate nests.
    pub parent: Option<BlockId>,
    /// Whether dropping here would be accepted.
    pub valid: bool,
}

/// Drag interaction state machine.
#[derive(Debug, Clone)]
pub enum DragState {
    Idle,
    Dragging(DragContext),
}

impl DragState {
    /// Begin a drag of `members` with `active` as the pointer-bearing block.
    pub fn begin(
        snapshot: &Layout,
        active: BlockId,
        members: &[BlockId],
    ) -> Result<Self, BlockModelError> {
        Ok(Self::Dragging(DragContext::new(snapshot, active, members)?))
    }

    /// The context, while a drag is in progress.
    #[must_use]
    pub fn context(&self) -> Option<&DragContext> {
        match self {
            Self::Idle => None,
            Self::Dragging(ctx) => Some(ctx),
        }
    }
}

/// Everything one drag needs: the snapshot and the moving set.
#[derive(Debug, Clone)]
pub struct DragContext {
    snapshot: Layout,
    active: BlockId,
    members: Vec<BlockId>,
}

impl DragContext {
    fn new(snapshot: &Layout, active: BlockId, members: &[BlockId]) -> Result<Self, BlockModelError> {
        if !snapshot.contains(active) {
            return Err(BlockModelError::UnknownBlock { id: active });
        }
        for id in members {
            if !snapshot.contains(*id) {
                return Err(BlockModelError::UnknownBlock { id: *id });
            }
        }
        let mut members = members.to_vec();
        if !members.contains(&active) {
            members.push(active);
        }
        Ok(Self {
            snapshot: snapshot.clone(),
            active,
            members,
        })
    }

    /// The layout captured at drag start.
    #[must_use]
    pub fn snapshot(&self) -> &Layout {
        &self.snapshot
    }

    /// Whether this drag moves more than one block.
    #[must_use]
    pub fn is_group(&self) -> bool {
        self.members.len() > 1
    }

    /// Compute the candidate placement for the current pointer cell.
    ///
    /// Read-only; never mutates the snapshot.
    #[must_use]
    pub fn preview(&self, pointer: Cell) -> Ghost {
        // Id validated at drag start; a missing block means the snapshot was
        // swapped out from under us, so reject the drop.
        let Some(active) = self.snapshot.get(self.active) else {
            return Ghost {
                pos: GridRect::new(1, 1, 1, 1),
                parent: None,
                valid: false,
            };
        };

        if !self.is_group() && !active.kind.is_container() {
            if let Some(host) = self.hosting_container(pointer) {
                return self.preview_nested(pointer, active, host);
            }
        }
        self.preview_root(pointer, active)
    }

    /// Resolve the drop: valid candidates commit, anything else reverts.
    #[must_use]
    pub fn commit(&self, pointer: Cell) -> Layout {
        let ghost = self.preview(pointer);
        if !ghost.valid {
            return self.snapshot.clone();
        }

        let mut layout = self.snapshot.clone();
        let Some(initial_active) = self.snapshot.get(self.active).map(|b| b.pos) else {
            return layout;
        };
        let delta_cols = i32::from(ghost.pos.col_start) - i32::from(initial_active.col_start);
        let delta_rows = i32::from(ghost.pos.row_start) - i32::from(initial_active.row_start);

        for id in &self.members {
            let initial = self.snapshot.get(*id).map(|b| b.pos);
            let Some(block) = layout.get_mut(*id) else {
                continue;
            };
            if *id == self.active {
                block.pos = ghost.pos;
                block.parent = ghost.parent;
            } else if let Some(initial) = initial {
                // Rigid translation: the shared delta, nothing else.
                block.pos = translate(initial, delta_cols, delta_rows);
            }
        }
        layout
    }

    /// Abandon the drag: the snapshot is the result.
    #[must_use]
    pub fn cancel(&self) -> Layout {
        self.snapshot.clone()
    }

    fn hosting_container(&self, pointer: Cell) -> Option<&Block> {
        self.snapshot.roots().find(|b| {
            b.kind.is_container() && b.id != self.active && b.pos.contains_cell(pointer)
        })
    }

    fn preview_nested(&self, pointer: Cell, active: &Block, host: &Block) -> Ghost {
        let Some(stack) = host.kind.stack() else {
            return self.preview_root(pointer, active);
        };
        let anchored = GridRect::new(
            pointer.col,
            active.pos.col_span,
            pointer.row,
            active.pos.row_span,
        );
        let candidate = constrain(anchored, host.pos, stack);

        let siblings: Vec<&Block> = self
            .snapshot
            .children_of(host.id)
            .filter(|c| c.id != self.active)
            .collect();

        if !siblings.iter().any(|s| s.pos.overlaps(candidate)) {
            return Ghost {
                pos: candidate,
                parent: Some(host.id),
                valid: true,
            };
        }

        // Shrink-only repair along the stack's free axis: pull the far edge
        // back to the nearest following sibling's near edge.
        let inner = interior(host.pos);
        let (start, limit) = match stack {
            StackDirection::Horizontal => (candidate.col_start, inner.right()),
            StackDirection::Vertical => (candidate.row_start, inner.bottom()),
        };
        let next_edge = siblings
            .iter()
            .filter(|s| s.pos.overlaps(candidate))
            .map(|s| match stack {
                StackDirection::Horizontal => s.pos.col_start,
                StackDirection::Vertical => s.pos.row_start,
            })
            .filter(|edge| *edge > start)
            .min();

        let Some(edge) = next_edge else {
            // An overlapping sibling starts at or before the candidate; no
            // shrink can fix that.
            return Ghost {
                pos: candidate,
                parent: Some(host.id),
                valid: false,
            };
        };

        let span = edge - start;
        let repaired = match stack {
            StackDirection::Horizontal => GridRect::new(
                candidate.col_start,
                span,
                candidate.row_start,
                candidate.row_span,
            ),
            StackDirection::Vertical => GridRect::new(
                candidate.col_start,
                candidate.col_span,
                candidate.row_start,
                span,
            ),
        };
        let valid = span >= REPAIR_MIN_SPAN
            && edge <= limit
            && !siblings.iter().any(|s| s.pos.overlaps(repaired));
        Ghost {
            pos: repaired,
            parent: Some(host.id),
            valid,
        }
    }

    fn preview_root(&self, pointer: Cell, active: &Block) -> Ghost {
        let grid_columns = self.snapshot.grid_columns;
        let width = active.pos.col_span.min(grid_columns);
        let last_col = grid_columns + 1 - width;
        let anchor = Cell::new(pointer.col.clamp(1, last_col), pointer.row.max(1));
        let candidate = GridRect::new(anchor.col, width, anchor.row, active.pos.row_span);

        let delta_cols = i32::from(anchor.col) - i32::from(active.pos.col_start);
        let delta_rows = i32::from(anchor.row) - i32::from(active.pos.row_start);

        let moving: FxHashSet<BlockId> = self.members.iter().copied().collect();
        let mut valid = true;
        for id in &self.members {
            let Some(member) = self.snapshot.get(*id) else {
                continue;
            };
            let cand = translate(member.pos, delta_cols, delta_rows);
            if cand.col_start < 1
                || cand.row_start < 1
                || cand.right() > grid_columns + 1
                || cand != shifted_exactly(member.pos, delta_cols, delta_rows)
            {
                valid = false;
                break;
            }
            let blocked = self.snapshot.blocks.iter().any(|other| {
                if moving.contains(&other.id) {
                    return false;
                }
                // Children of a moving container follow it on resolution.
                if other.parent.is_some_and(|p| moving.contains(&p)) {
                    return false;
                }
                other.pos.overlaps(cand)
            });
            if blocked {
                valid = false;
                break;
            }
        }

        Ghost {
            pos: candidate,
            parent: None,
            valid,
        }
    }
}

fn translate(pos: GridRect, delta_cols: i32, delta_rows: i32) -> GridRect {
    let col = (i32::from(pos.col_start) + delta_cols).max(0) as u16;
    let row = (i32::from(pos.row_start) + delta_rows).max(0) as u16;
    GridRect::new(col, pos.col_span, row, pos.row_span)
}

/// Translation without the low-edge clamp, for detecting members that would
/// be pushed off the grid.
fn shifted_exactly(pos: GridRect, delta_cols: i32, delta_rows: i32) -> GridRect {
    let col = i32::from(pos.col_start) + delta_cols;
    let row = i32::from(pos.row_start) + delta_rows;
    if col < 1 || row < 1 {
        // Poison value that can never equal a clamped translation of itself.
        return GridRect::new(u16::MAX, pos.col_span, u16::MAX, pos.row_span);
    }
    GridRect::new(col as u16, pos.col_span, row as u16, pos.row_span)
}
