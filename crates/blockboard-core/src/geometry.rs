//! Interval and rectangle tests on integer grid coordinates.

use serde::{Deserialize, Serialize};

/// A half-open interval on one grid axis.
///
/// Covers `[start, start + len)`. Grid coordinates are 1-indexed, so a valid
/// span never starts at 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    /// First covered unit (inclusive).
    pub start: u16,
    /// Number of covered units.
    pub len: u16,
}

impl Span {
    /// Create a new span.
    #[inline]
    #[must_use]
    pub const fn new(start: u16, len: u16) -> Self {
        Self { start, len }
    }

    /// One past the last covered unit.
    #[inline]
    #[must_use]
    pub const fn end(self) -> u16 {
        self.start.saturating_add(self.len)
    }

    /// Last covered unit (inclusive). Equals `start` for a span of length 1.
    #[inline]
    #[must_use]
    pub const fn last(self) -> u16 {
        self.end().saturating_sub(1)
    }

    /// Whether two half-open intervals share at least one unit.
    ///
    /// Touching spans (`a.end() == b.start`) do not overlap.
    #[inline]
    #[must_use]
    pub const fn overlaps(self, other: Span) -> bool {
        self.start < other.end() && other.start < self.end()
    }

    /// Whether `other` lies entirely within this span.
    #[inline]
    #[must_use]
    pub const fn contains(self, other: Span) -> bool {
        other.start >= self.start && other.end() <= self.end()
    }

    /// Whether a single unit falls inside this span.
    #[inline]
    #[must_use]
    pub const fn contains_unit(self, unit: u16) -> bool {
        unit >= self.start && unit < self.end()
    }

    /// Grow the span by `amount` units on each side, clamping at 0.
    ///
    /// Used by the free-slot scan to keep a one-row clearance around
    /// existing blocks.
    #[inline]
    #[must_use]
    pub const fn expanded(self, amount: u16) -> Self {
        let start = self.start.saturating_sub(amount);
        // Units clipped away at the low edge do not extend the far edge.
        let clipped = amount.saturating_sub(self.start);
        let len = self
            .len
            .saturating_add(amount.saturating_mul(2))
            .saturating_sub(clipped);
        Self { start, len }
    }
}

/// An axis-aligned rectangle of grid cells.
///
/// Half-open on both axes: occupies columns `[col_start, col_start + col_span)`
/// and rows `[row_start, row_start + row_span)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridRect {
    pub col_start: u16,
    pub col_span: u16,
    pub row_start: u16,
    pub row_span: u16,
}

impl GridRect {
    /// Create a new rectangle.
    #[inline]
    #[must_use]
    pub const fn new(col_start: u16, col_span: u16, row_start: u16, row_span: u16) -> Self {
        Self {
            col_start,
            col_span,
            row_start,
            row_span,
        }
    }

    /// Column interval.
    #[inline]
    #[must_use]
    pub const fn cols(self) -> Span {
        Span::new(self.col_start, self.col_span)
    }

    /// Row interval.
    #[inline]
    #[must_use]
    pub const fn rows(self) -> Span {
        Span::new(self.row_start, self.row_span)
    }

    /// One past the rightmost covered column.
    #[inline]
    #[must_use]
    pub const fn right(self) -> u16 {
        self.cols().end()
    }

    /// One past the bottom covered row.
    #[inline]
    #[must_use]
    pub const fn bottom(self) -> u16 {
        self.rows().end()
    }

    /// Area in grid cells.
    #[inline]
    #[must_use]
    pub const fn area(self) -> u32 {
        self.col_span as u32 * self.row_span as u32
    }

    /// Whether the rectangle covers zero cells.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.col_span == 0 || self.row_span == 0
    }

    /// Whether two rectangles share at least one cell.
    #[inline]
    #[must_use]
    pub const fn overlaps(self, other: GridRect) -> bool {
        self.cols().overlaps(other.cols()) && self.rows().overlaps(other.rows())
    }

    /// Whether `other` lies entirely within this rectangle (all four edges
    /// inside or on the boundary).
    #[inline]
    #[must_use]
    pub const fn contains_rect(self, other: GridRect) -> bool {
        self.cols().contains(other.cols()) && self.rows().contains(other.rows())
    }

    /// Whether a single cell falls inside this rectangle.
    #[inline]
    #[must_use]
    pub const fn contains_cell(self, cell: Cell) -> bool {
        self.cols().contains_unit(cell.col) && self.rows().contains_unit(cell.row)
    }

    /// The same rectangle with the row interval grown by `rows` on each side.
    ///
    /// Column extent is unchanged; the buffer is a row-axis concern only.
    #[inline]
    #[must_use]
    pub const fn with_row_buffer(self, rows: u16) -> Self {
        let r = self.rows().expanded(rows);
        Self {
            col_start: self.col_start,
            col_span: self.col_span,
            row_start: r.start,
            row_span: r.len,
        }
    }
}

/// A single grid cell, as derived from a pointer position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub col: u16,
    pub row: u16,
}

impl Cell {
    /// Create a new cell.
    #[inline]
    #[must_use]
    pub const fn new(col: u16, row: u16) -> Self {
        Self { col, row }
    }
}
