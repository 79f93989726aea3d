#![forbid(unsafe_code)]

//! Grid layout engine for block-based page mockups.
//!
//! The engine is pure state-in, state-out: every operation takes a
//! [`Layout`] and returns a new one, which makes checkpointing and drag
//! previews cheap to reason about. The pieces:
//!
//! - [`model`] — blocks, ids, layouts, serialization, invariant checking.
//! - [`constrain`] — containment clamping of children into containers.
//! - [`resolve`] — downward-push collision relaxation.
//! - [`slot`] — free-slot search for newly added blocks.
//! - [`redistribute`] — even splits and proportional rescaling of
//!   container children.
//! - [`ghost`] — drag state and per-tick placement validation.
//! - [`ingest`] — sanitizing and auto-nesting external block lists.
//! - [`ops`] — the high-level editing operations built from the above.
//! - [`history`] — bounded undo/redo over layout snapshots.

pub mod constrain;
pub mod ghost;
pub mod history;
pub mod ingest;
pub mod model;
pub mod ops;
pub mod redistribute;
pub mod resolve;
pub mod slot;

pub use blockboard_core::geometry::{Cell, GridRect, Span};

pub use constrain::{constrain, interior, CONTAINER_ROW_PADDING};
pub use ghost::{DragContext, DragState, Ghost};
pub use history::{CheckpointLog, CHECKPOINT_DEPTH};
pub use ingest::ProposedBlock;
pub use model::{
    Block, BlockId, BlockKind, BlockModelError, Layout, StackDirection, LAYOUT_SCHEMA_VERSION,
};
pub use resolve::{resolve, ResolveOutcome, RESOLVE_PASS_CAP};
pub use slot::find_slot;
