//! Bounded undo/redo checkpointing.
//!
//! The log stores whole-layout snapshots. Recording while undone truncates
//! the redo tail; exceeding the depth evicts the oldest entry.

use crate::model::Layout;

/// How many checkpoints the log retains.
pub const CHECKPOINT_DEPTH: usize = 20;

/// A bounded linear history of layout snapshots.
#[derive(Debug, Clone)]
pub struct CheckpointLog {
    entries: Vec<Layout>,
    cursor: usize,
}

impl CheckpointLog {
    /// Start a log with `initial` as the sole checkpoint.
    #[must_use]
    pub fn new(initial: Layout) -> Self {
        Self {
            entries: vec![initial],
            cursor: 0,
        }
    }

    /// The checkpoint the cursor sits on.
    #[must_use]
    pub fn current(&self) -> &Layout {
        &self.entries[self.cursor]
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    /// Record a new checkpoint after the cursor, discarding any redo tail.
    pub fn record(&mut self, layout: Layout) {
        self.entries.truncate(self.cursor + 1);
        self.entries.push(layout);
        if self.entries.len() > CHECKPOINT_DEPTH {
            self.entries.remove(0);
        }
        self.cursor = self.entries.len() - 1;
    }

    /// Step back one checkpoint, if there is one.
    pub fn undo(&mut self) -> Option<&Layout> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        Some(&self.entries[self.cursor])
    }

    /// Step forward one checkpoint, if one was undone.
    pub fn redo(&mut self) -> Option<&Layout> {
        if self.cursor + 1 >= self.entries.len() {
            return None;
        }
        self.cursor += 1;
        Some(&self.entries[self.cursor])
    }
}
