//! Canonical block/layout schema and validation.
//!
//! This module defines the data model shared by every engine component:
//!
//! - Deterministic block identifiers suitable for replay/diff.
//! - Explicit weak parent references for one-level container nesting.
//! - Canonical serialization snapshots with forward-compatible extension bags.
//! - Structured invariant diagnostics that never panic on malformed layouts.

use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use blockboard_core::geometry::GridRect;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Current layout schema version.
pub const LAYOUT_SCHEMA_VERSION: u16 = 1;

/// Column count used when a caller does not specify one.
pub const DEFAULT_GRID_COLUMNS: u16 = 12;

// =========================================================================
// Identifiers
// =========================================================================

/// Stable identifier for blocks.
///
/// `0` is reserved/invalid so IDs are always non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(u64);

impl BlockId {
    /// Lowest valid block ID.
    pub const MIN: Self = Self(1);

    /// Create a new block ID, rejecting 0.
    pub fn new(raw: u64) -> Result<Self, BlockModelError> {
        if raw == 0 {
            return Err(BlockModelError::ZeroBlockId);
        }
        Ok(Self(raw))
    }

    /// Get the raw numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Return the next ID, or an error on overflow.
    pub fn checked_next(self) -> Result<Self, BlockModelError> {
        let Some(next) = self.0.checked_add(1) else {
            return Err(BlockModelError::BlockIdOverflow { current: self });
        };
        Self::new(next)
    }
}

impl Default for BlockId {
    fn default() -> Self {
        Self::MIN
    }
}

// =========================================================================
// Block kinds
// =========================================================================

/// Axis along which a container lays out its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StackDirection {
    Horizontal,
    Vertical,
}

impl StackDirection {
    /// The other direction.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Horizontal => Self::Vertical,
            Self::Vertical => Self::Horizontal,
        }
    }
}

/// Closed set of block kinds.
///
/// `Container` is the only kind that may host children; its stack direction
/// is variant payload, not a nullable field on every block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BlockKind {
    Heading,
    Text,
    Image,
    Stats,
    Chart,
    Table,
    Button,
    Container { stack: StackDirection },
}

impl BlockKind {
    /// Whether this kind may host children.
    #[inline]
    #[must_use]
    pub const fn is_container(self) -> bool {
        matches!(self, Self::Container { .. })
    }

    /// Stack direction, for containers only.
    #[inline]
    #[must_use]
    pub const fn stack(self) -> Option<StackDirection> {
        match self {
            Self::Container { stack } => Some(stack),
            _ => None,
        }
    }
}

// =========================================================================
// Blocks
// =========================================================================

/// One rectangular block on the grid.
///
/// `parent` is a weak lookup key into [`Layout::blocks`]; containers never
/// own their children structurally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    pub kind: BlockKind,
    pub pos: GridRect,
    #[serde(default)]
    pub parent: Option<BlockId>,
    /// Optional color hint carried through from ingestion.
    #[serde(default)]
    pub color: Option<String>,
}

impl Block {
    /// Build a root block.
    #[must_use]
    pub fn new(id: BlockId, kind: BlockKind, pos: GridRect) -> Self {
        Self {
            id,
            kind,
            pos,
            parent: None,
            color: None,
        }
    }

    /// Build a nested block.
    #[must_use]
    pub fn nested(id: BlockId, kind: BlockKind, pos: GridRect, parent: BlockId) -> Self {
        Self {
            id,
            kind,
            pos,
            parent: Some(parent),
            color: None,
        }
    }

    /// Whether this block sits at the top level of the grid.
    #[inline]
    #[must_use]
    pub const fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

// =========================================================================
// Layout snapshot
// =========================================================================

/// Canonical serializable layout: a fixed-column grid plus its blocks.
///
/// The extension map is reserved for forward-compatible fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout {
    #[serde(default = "default_schema_version")]
    pub schema_version: u16,
    pub grid_columns: u16,
    pub next_id: BlockId,
    pub blocks: Vec<Block>,
    #[serde(default)]
    pub extensions: BTreeMap<String, String>,
}

fn default_schema_version() -> u16 {
    LAYOUT_SCHEMA_VERSION
}

impl Layout {
    /// Create an empty layout with the given column count.
    #[must_use]
    pub fn new(grid_columns: u16) -> Self {
        Self {
            schema_version: LAYOUT_SCHEMA_VERSION,
            grid_columns: grid_columns.max(1),
            next_id: BlockId::MIN,
            blocks: Vec::new(),
            extensions: BTreeMap::new(),
        }
    }

    /// Look up a block by id.
    #[must_use]
    pub fn get(&self, id: BlockId) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id == id)
    }

    pub(crate) fn get_mut(&mut self, id: BlockId) -> Option<&mut Block> {
        self.blocks.iter_mut().find(|b| b.id == id)
    }

    /// Whether a block with this id exists.
    #[must_use]
    pub fn contains(&self, id: BlockId) -> bool {
        self.get(id).is_some()
    }

    /// Iterate over top-level blocks.
    pub fn roots(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter().filter(|b| b.is_root())
    }

    /// Iterate over the direct children of a container.
    pub fn children_of(&self, id: BlockId) -> impl Iterator<Item = &Block> {
        self.blocks.iter().filter(move |b| b.parent == Some(id))
    }

    /// Allocate the next block id, advancing the counter.
    pub fn allocate_id(&mut self) -> Result<BlockId, BlockModelError> {
        let id = self.next_id;
        self.next_id = id.checked_next()?;
        Ok(id)
    }

    /// Canonicalize block ordering by ID for deterministic serialization.
    pub fn canonicalize(&mut self) {
        self.blocks.sort_by_key(|b| b.id);
    }

    /// Deterministic hash for state diagnostics.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        self.schema_version.hash(&mut hasher);
        self.grid_columns.hash(&mut hasher);
        self.next_id.hash(&mut hasher);
        let mut ordered: Vec<&Block> = self.blocks.iter().collect();
        ordered.sort_by_key(|b| b.id);
        for block in ordered {
            block.id.hash(&mut hasher);
            block.pos.hash(&mut hasher);
            block.parent.hash(&mut hasher);
            block.kind.hash(&mut hasher);
            block.color.hash(&mut hasher);
        }
        for (k, v) in &self.extensions {
            k.hash(&mut hasher);
            v.hash(&mut hasher);
        }
        hasher.finish()
    }

    /// Inspect invariants and emit a structured diagnostics report.
    #[must_use]
    pub fn invariant_report(&self) -> LayoutInvariantReport {
        build_invariant_report(self)
    }
}

impl Default for Layout {
    fn default() -> Self {
        Self::new(DEFAULT_GRID_COLUMNS)
    }
}

// =========================================================================
// Invariant diagnostics
// =========================================================================

/// Severity for one invariant finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutInvariantSeverity {
    Error,
    Warning,
}

/// Stable code for invariant findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutInvariantCode {
    UnsupportedSchemaVersion,
    DuplicateBlockId,
    ZeroSpan,
    OutOfBounds,
    MissingParent,
    ParentNotContainer,
    NestedContainer,
    ContainmentBroken,
    SiblingOverlap,
    NextIdNotGreaterThanExisting,
}

/// One actionable invariant finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutInvariantIssue {
    pub code: LayoutInvariantCode,
    pub severity: LayoutInvariantSeverity,
    /// Block the finding is about, if any.
    pub block: Option<BlockId>,
    /// Second block for pairwise findings.
    pub other: Option<BlockId>,
    pub detail: String,
}

/// All findings for one layout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutInvariantReport {
    pub issues: Vec<LayoutInvariantIssue>,
}

impl LayoutInvariantReport {
    /// Whether any error-severity finding is present.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.issues
            .iter()
            .any(|i| i.severity == LayoutInvariantSeverity::Error)
    }

    /// Whether any finding with the given code is present.
    #[must_use]
    pub fn has_code(&self, code: LayoutInvariantCode) -> bool {
        self.issues.iter().any(|i| i.code == code)
    }
}

/// Containment check for the invariant report.
///
/// Degenerate interiors (containers shorter than the padding allows) still
/// admit a one-row child pinned at the interior start, matching what the
/// constrainer produces for them.
fn within_interior(child: GridRect, container: GridRect) -> bool {
    let inner = crate::constrain::interior(container);
    let row_extent = inner.row_span.max(1);
    child.col_start >= inner.col_start
        && child.right() <= inner.right()
        && child.row_start >= inner.row_start
        && child.bottom() <= inner.row_start + row_extent
}

fn build_invariant_report(layout: &Layout) -> LayoutInvariantReport {
    use LayoutInvariantCode as Code;
    use LayoutInvariantSeverity as Sev;

    let mut issues = Vec::new();
    let mut issue = |code, severity, block, other, detail: String| {
        issues.push(LayoutInvariantIssue {
            code,
            severity,
            block,
            other,
            detail,
        });
    };

    if layout.schema_version != LAYOUT_SCHEMA_VERSION {
        issue(
            Code::UnsupportedSchemaVersion,
            Sev::Error,
            None,
            None,
            format!(
                "schema version {} (expected {})",
                layout.schema_version, LAYOUT_SCHEMA_VERSION
            ),
        );
    }

    let mut seen: FxHashMap<BlockId, usize> = FxHashMap::default();
    let mut max_id = 0u64;
    for block in &layout.blocks {
        *seen.entry(block.id).or_insert(0) += 1;
        max_id = max_id.max(block.id.get());
    }
    for (id, count) in &seen {
        if *count > 1 {
            issue(
                Code::DuplicateBlockId,
                Sev::Error,
                Some(*id),
                None,
                format!("id {} appears {} times", id.get(), count),
            );
        }
    }
    if max_id >= layout.next_id.get() {
        issue(
            Code::NextIdNotGreaterThanExisting,
            Sev::Error,
            None,
            None,
            format!(
                "next_id {} not greater than max existing id {}",
                layout.next_id.get(),
                max_id
            ),
        );
    }

    for block in &layout.blocks {
        if block.pos.col_span == 0 || block.pos.row_span == 0 {
            issue(
                Code::ZeroSpan,
                Sev::Error,
                Some(block.id),
                None,
                format!("block {} has a zero-length span", block.id.get()),
            );
        }
        if block.pos.col_start < 1
            || block.pos.right() > layout.grid_columns.saturating_add(1)
            || block.pos.row_start < 1
        {
            issue(
                Code::OutOfBounds,
                Sev::Error,
                Some(block.id),
                None,
                format!(
                    "block {} occupies columns [{}, {}) on a {}-column grid",
                    block.id.get(),
                    block.pos.col_start,
                    block.pos.right(),
                    layout.grid_columns
                ),
            );
        }

        if let Some(parent_id) = block.parent {
            match layout.get(parent_id) {
                None => issue(
                    Code::MissingParent,
                    Sev::Error,
                    Some(block.id),
                    Some(parent_id),
                    format!("parent {} does not exist", parent_id.get()),
                ),
                Some(parent) => {
                    if !parent.kind.is_container() {
                        issue(
                            Code::ParentNotContainer,
                            Sev::Error,
                            Some(block.id),
                            Some(parent_id),
                            format!("parent {} is not a container", parent_id.get()),
                        );
                    } else if parent.parent.is_some() {
                        issue(
                            Code::NestedContainer,
                            Sev::Error,
                            Some(block.id),
                            Some(parent_id),
                            "nesting deeper than one container level".to_string(),
                        );
                    } else if !within_interior(block.pos, parent.pos) {
                        issue(
                            Code::ContainmentBroken,
                            Sev::Error,
                            Some(block.id),
                            Some(parent_id),
                            format!(
                                "block {} escapes the interior of container {}",
                                block.id.get(),
                                parent_id.get()
                            ),
                        );
                    }
                    if block.kind.is_container() {
                        issue(
                            Code::NestedContainer,
                            Sev::Error,
                            Some(block.id),
                            Some(parent_id),
                            format!("container {} has a parent", block.id.get()),
                        );
                    }
                }
            }
        }
    }

    // Sibling and root pairs must not overlap. Residual overlap can survive a
    // capped resolver run, so this is a warning rather than an error.
    for (i, a) in layout.blocks.iter().enumerate() {
        for b in layout.blocks.iter().skip(i + 1) {
            if a.parent == b.parent && a.pos.overlaps(b.pos) {
                issue(
                    Code::SiblingOverlap,
                    Sev::Warning,
                    Some(a.id),
                    Some(b.id),
                    format!("blocks {} and {} overlap", a.id.get(), b.id.get()),
                );
            }
        }
    }

    LayoutInvariantReport { issues }
}

// =========================================================================
// Model errors
// =========================================================================

/// Errors for programmer misuse of the model or operations layer.
///
/// Normal user-driven geometry outcomes (invalid drop target, rejected resize
/// tick) are expressed as validity results, never as errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockModelError {
    /// Block IDs must be non-zero.
    ZeroBlockId,
    /// The id counter overflowed.
    BlockIdOverflow { current: BlockId },
    /// No block with this id exists in the layout.
    UnknownBlock { id: BlockId },
    /// The operation requires a container block.
    NotAContainer { id: BlockId },
    /// The operation would nest deeper than one container level.
    NestingTooDeep { id: BlockId },
}

impl fmt::Display for BlockModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroBlockId => write!(f, "block id 0 is reserved"),
            Self::BlockIdOverflow { current } => {
                write!(f, "block id overflow after {}", current.get())
            }
            Self::UnknownBlock { id } => write!(f, "unknown block {}", id.get()),
            Self::NotAContainer { id } => write!(f, "block {} is not a container", id.get()),
            Self::NestingTooDeep { id } => write!(
                f,
                "block {} cannot be nested deeper than one container level",
                id.get()
            ),
        }
    }
}

impl std::error::Error for BlockModelError {}

// =========================================================================
// Tests
// =========================================================================
