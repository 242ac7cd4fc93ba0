//! Snapshot-based undo/redo.
//!
//! Every entry is a full owned copy of the editable state. History is
//! strictly linear: committing a new entry discards everything that was
//! undone.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::adjustments::Adjustments;
use crate::layer::{Layer, LayerId};
use crate::selection::Crop;

/// One point in edit history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Human-readable action, e.g. "Add Text Layer".
    pub label: String,
    pub layers: Vec<Layer>,
    pub adjustments: Adjustments,
    pub selected_layer_id: Option<LayerId>,
    #[serde(default)]
    pub crop: Crop,
}

#[derive(Clone, Debug, Default)]
pub struct History {
    undo_stack: Vec<HistoryEntry>,
    redo_stack: Vec<HistoryEntry>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `entry` as an undo point and drop any redo history.
    pub fn commit(&mut self, entry: HistoryEntry) {
        debug!(
            label = %entry.label,
            undo_depth = self.undo_stack.len() + 1,
            "history commit"
        );
        self.undo_stack.push(entry);
        self.redo_stack.clear();
    }

    /// Step back. `current` is the live state, which becomes the redo entry.
    /// Returns the state to restore, or `None` when there is nothing to undo.
    pub fn undo(&mut self, mut current: HistoryEntry) -> Option<HistoryEntry> {
        let entry = self.undo_stack.pop()?;
        current.label = entry.label.clone();
        self.redo_stack.push(current);
        debug!(label = %entry.label, undo_remaining = self.undo_stack.len(), "undo");
        Some(entry)
    }

    /// Step forward again. `current` is pushed back onto the undo stack.
    pub fn redo(&mut self, mut current: HistoryEntry) -> Option<HistoryEntry> {
        let entry = self.redo_stack.pop()?;
        current.label = entry.label.clone();
        self.undo_stack.push(current);
        debug!(label = %entry.label, redo_remaining = self.redo_stack.len(), "redo");
        Some(entry)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    /// Label of the action the next undo would revert.
    pub fn undo_label(&self) -> Option<&str> {
        self.undo_stack.last().map(|e| e.label.as_str())
    }

    pub fn redo_label(&self) -> Option<&str> {
        self.redo_stack.last().map(|e| e.label.as_str())
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}
