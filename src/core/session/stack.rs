//! Session-scoped undo stack.

use crate::core::apply::UndoEntry;

/// Holds the undo entry of the most recent apply.
///
/// Only that entry is reversible: pushing a new one discards the previous.
/// Nothing here is persisted.
#[derive(Debug, Default)]
pub struct UndoStack {
    entries: Vec<UndoEntry>,
}

impl UndoStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an apply. Returns the entry it replaced, if any.
    ///
    /// An apply that moved nothing still replaces the previous entry but is
    /// not itself kept.
    pub fn push(&mut self, entry: UndoEntry) -> Option<UndoEntry> {
        let replaced = self.entries.pop();
        self.entries.clear();
        if !entry.is_empty() {
            self.entries.push(entry);
        }
        replaced
    }

    /// The active entry
    pub fn peek(&self) -> Option<&UndoEntry> {
        self.entries.last()
    }

    /// Take the active entry for reversal
    pub fn pop(&mut self) -> Option<UndoEntry> {
        self.entries.pop()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
