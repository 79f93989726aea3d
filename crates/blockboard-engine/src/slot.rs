//! Free-slot finder.
//!
//! Scans for the first anchor where a new rectangle fits among the root
//! blocks: row-major, top to bottom, left to right. Existing blocks claim a
//! one-row clearance above and below themselves (no column clearance). A
//! hard row cap keeps the scan bounded; exhausting it falls back to the
//! first row below everything, which always terminates and never overlaps.

use blockboard_core::geometry::{Cell, GridRect};

/// Last row the scan will consider.
pub const SLOT_ROW_CAP: u16 = 200;

/// Row clearance kept around existing blocks.
pub const SLOT_ROW_BUFFER: u16 = 1;

/// Find the first free anchor for a `width` x `height` rectangle.
///
/// `occupied` holds the rectangles of the root blocks. Returns the top-left
/// cell of the chosen slot.
#[must_use]
pub fn find_slot(occupied: &[GridRect], grid_columns: u16, width: u16, height: u16) -> Cell {
    find_slot_from(occupied, grid_columns, width, height, 1)
}

/// [`find_slot`] starting the row scan at `start_row`.
#[must_use]
pub fn find_slot_from(
    occupied: &[GridRect],
    grid_columns: u16,
    width: u16,
    height: u16,
    start_row: u16,
) -> Cell {
    let width = width.max(1);
    let height = height.max(1);

    if width <= grid_columns {
        let last_col = grid_columns - width + 1;
        for row in start_row.max(1)..=SLOT_ROW_CAP {
            for col in 1..=last_col {
                let candidate = GridRect::new(col, width, row, height);
                let blocked = occupied
                    .iter()
                    .any(|r| r.with_row_buffer(SLOT_ROW_BUFFER).overlaps(candidate));
                if !blocked {
                    return Cell::new(col, row);
                }
            }
        }
    }

    // Degraded fallback: first row below every existing block.
    let below_all = occupied.iter().map(|r| r.bottom()).max().unwrap_or(1).max(1);
    Cell::new(1, below_all)
}
