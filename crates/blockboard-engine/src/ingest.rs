//! Ingestion of externally produced block lists.
//!
//! Upstream generators emit flat block lists with no parent links and only
//! loosely sane geometry. Ingestion sanitizes each proposal, infers a
//! one-level hierarchy from rectangle containment, and appends the result
//! to a layout through the usual constrain/resolve pipeline.

use blockboard_core::geometry::GridRect;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::constrain::constrain;
use crate::model::{Block, BlockId, BlockKind, BlockModelError, Layout, StackDirection};
use crate::resolve::{resolve, ResolveOutcome};

/// Smallest span on both axes at which a plain block is promoted to a
/// container during hierarchy inference.
pub const CONTAINER_PROMOTION_MIN_SPAN: u16 = 3;

/// One block as proposed by an external source, before sanitization.
///
/// Fields are signed and defaulted so that sloppy payloads deserialize
/// rather than fail; [`sanitize`] is where geometry becomes trustworthy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposedBlock {
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub col_start: i64,
    #[serde(default)]
    pub col_span: i64,
    #[serde(default)]
    pub row_start: i64,
    #[serde(default)]
    pub row_span: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl ProposedBlock {
    fn resolved_kind(&self) -> BlockKind {
        match self.kind.as_str() {
            "heading" => BlockKind::Heading,
            "text" => BlockKind::Text,
            "image" => BlockKind::Image,
            "stats" => BlockKind::Stats,
            "chart" => BlockKind::Chart,
            "table" => BlockKind::Table,
            "button" => BlockKind::Button,
            "container" => BlockKind::Container {
                stack: StackDirection::Horizontal,
            },
            // Unrecognized kinds degrade to plain text rather than erroring.
            _ => BlockKind::Text,
        }
    }
}

/// Clamp one proposal into grid geometry.
///
/// Column values are forced into `[1, grid_columns]` with the span capped so
/// the block stays on the grid; non-positive row values default to 1.
#[must_use]
pub fn sanitize(proposal: &ProposedBlock, grid_columns: u16) -> (BlockKind, GridRect) {
    let cols = i64::from(grid_columns);
    let col_span = proposal.col_span.clamp(1, cols) as u16;
    let col_start = proposal
        .col_start
        .clamp(1, i64::from(grid_columns + 1 - col_span)) as u16;
    let row_span = proposal.row_span.max(1).min(i64::from(u16::MAX)) as u16;
    let row_start = proposal.row_start.max(1).min(i64::from(u16::MAX)) as u16;
    (
        proposal.resolved_kind(),
        GridRect::new(col_start, col_span, row_start, row_span),
    )
}

/// Inferred parent assignment: index into the proposal list, or none.
type ParentSlots = Vec<Option<usize>>;

/// Infer a one-level hierarchy from rectangle containment.
///
/// Blocks are visited largest-area first. A block may adopt another when it
/// fully contains it, it is not itself adopted, and it is nesting-eligible:
/// already a container, or spanning at least
/// [`CONTAINER_PROMOTION_MIN_SPAN`] on both axes. Containers are never
/// adopted. Adoption by a plain block promotes it to a horizontal container.
fn infer_hierarchy(blocks: &mut [(BlockKind, GridRect)]) -> ParentSlots {
    let mut parents: ParentSlots = vec![None; blocks.len()];

    let mut order: Vec<usize> = (0..blocks.len()).collect();
    order.sort_by(|a, b| {
        blocks[*b]
            .1
            .area()
            .cmp(&blocks[*a].1.area())
            .then_with(|| a.cmp(b))
    });

    for (rank, &outer) in order.iter().enumerate() {
        if parents[outer].is_some() {
            continue;
        }
        let (outer_kind, outer_pos) = blocks[outer].clone();
        let eligible = outer_kind.is_container()
            || (outer_pos.col_span >= CONTAINER_PROMOTION_MIN_SPAN
                && outer_pos.row_span >= CONTAINER_PROMOTION_MIN_SPAN);
        if !eligible {
            continue;
        }

        let mut adopted_any = false;
        for &inner in &order[rank + 1..] {
            if parents[inner].is_some() {
                continue;
            }
            if blocks[inner].0.is_container() {
                continue;
            }
            if outer_pos.contains_rect(blocks[inner].1) {
                parents[inner] = Some(outer);
                adopted_any = true;
            }
        }

        if adopted_any && !outer_kind.is_container() {
            blocks[outer].0 = BlockKind::Container {
                stack: StackDirection::Horizontal,
            };
        }
    }

    parents
}

/// Sanitize, infer hierarchy, and append `proposals` to `layout`.
///
/// Children are containment-clamped into their inferred containers, then
/// the whole layout runs through collision resolution with the appended
/// blocks marked as moved, so new content yields to what was already
/// there.
pub fn ingest(
    layout: &Layout,
    proposals: &[ProposedBlock],
) -> Result<(Layout, ResolveOutcome), BlockModelError> {
    let mut next = layout.clone();

    let mut sanitized: Vec<(BlockKind, GridRect)> = proposals
        .iter()
        .map(|p| sanitize(p, next.grid_columns))
        .collect();
    let parents = infer_hierarchy(&mut sanitized);

    // Allocate ids in proposal order so output is deterministic.
    let mut assigned: FxHashMap<usize, BlockId> = FxHashMap::default();
    for idx in 0..sanitized.len() {
        assigned.insert(idx, next.allocate_id()?);
    }

    for idx in 0..sanitized.len() {
        let (kind, pos) = sanitized[idx].clone();
        let id = assigned[&idx];
        let block = match parents[idx] {
            Some(parent_idx) => {
                let (parent_kind, parent_pos) = &sanitized[parent_idx];
                let clamped = match parent_kind.stack() {
                    Some(stack) => constrain(pos, *parent_pos, stack),
                    None => pos,
                };
                Block::nested(id, kind, clamped, assigned[&parent_idx])
            }
            None => Block::new(id, kind, pos),
        };
        next.blocks.push(block);
    }

    let appended: Vec<BlockId> = (0..parents.len()).map(|idx| assigned[&idx]).collect();
    Ok(resolve(next, &appended, &FxHashMap::default()))
}
