//! Parent-containment constrainer.
//!
//! Clamps a child rectangle into a container's interior given the container's
//! stack direction. The forced axis (cross axis) always spans the full
//! interior; the free axis is clamped so the child never escapes the interior
//! far edge. The clamp is idempotent.
//!
//! Interior padding is 1 row top and bottom and 0 columns; horizontal visual
//! padding is a rendering concern, not a layout one.

use blockboard_core::geometry::{GridRect, Span};

use crate::model::StackDirection;

/// Rows reserved at the top and bottom of a container.
pub const CONTAINER_ROW_PADDING: u16 = 1;

/// A container's usable area for children.
#[must_use]
pub fn interior(container: GridRect) -> GridRect {
    GridRect::new(
        container.col_start,
        container.col_span,
        container.row_start.saturating_add(CONTAINER_ROW_PADDING),
        container
            .row_span
            .saturating_sub(CONTAINER_ROW_PADDING * 2),
    )
}

/// Clamp one axis of a child into the interior span.
///
/// Size is capped to the interior extent first, then the start is capped so
/// `start + size - 1` stays at or before the interior's last unit. Degenerate
/// interiors pin the child to the interior start at span 1 rather than panic.
fn clamp_axis(start: u16, len: u16, inner: Span) -> Span {
    let len = len.clamp(1, inner.len.max(1));
    let max_start = inner.end().saturating_sub(len).max(inner.start);
    let start = start.max(inner.start).min(max_start);
    Span::new(start, len)
}

/// Clamp a child rectangle into a container's interior.
#[must_use]
pub fn constrain(child: GridRect, container: GridRect, stack: StackDirection) -> GridRect {
    let inner = interior(container);

    // Forced axis never collapses to zero, even for degenerate containers.
    let full_cols = Span::new(inner.col_start, inner.col_span.max(1));
    let full_rows = Span::new(inner.row_start, inner.row_span.max(1));

    let (cols, rows) = match stack {
        // Children stack top to bottom; every child spans the full width.
        StackDirection::Vertical => (
            full_cols,
            clamp_axis(child.row_start, child.row_span, inner.rows()),
        ),
        // Children stack left to right; every child spans the full height.
        StackDirection::Horizontal => (
            clamp_axis(child.col_start, child.col_span, inner.cols()),
            full_rows,
        ),
    };

    GridRect::new(cols.start, cols.len, rows.start, rows.len)
}
