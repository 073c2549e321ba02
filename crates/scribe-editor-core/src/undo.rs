//! Undo/redo history for the editor.
//!
//! Formatting edits change marks and block kinds as well as text, so history
//! entries are whole `(document, selection)` snapshots rather than text
//! operations. The document is a rope plus two small vectors; cloning it is
//! cheap relative to an edit.

use crate::document::RichDocument;
use crate::types::Selection;

/// Default bound on recorded undo steps.
pub const DEFAULT_MAX_UNDO_STEPS: usize = 100;

/// A recorded editor state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub document: RichDocument,
    pub selection: Option<Selection>,
}

impl Snapshot {
    pub fn new(document: RichDocument, selection: Option<Selection>) -> Self {
        Self {
            document,
            selection,
        }
    }
}

/// Bounded undo/redo stacks of snapshots.
#[derive(Debug, Clone)]
pub struct History {
    undo_stack: Vec<Snapshot>,
    redo_stack: Vec<Snapshot>,
    max_steps: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_UNDO_STEPS)
    }
}

impl History {
    pub fn new(max_steps: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_steps,
        }
    }

    /// Record the state before an edit. Clears the redo stack.
    pub fn record(&mut self, before: Snapshot) {
        self.redo_stack.clear();
        self.undo_stack.push(before);

        // Trim if over max
        while self.undo_stack.len() > self.max_steps {
            self.undo_stack.remove(0);
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Step back. `current` is pushed onto the redo stack and the previous
    /// state returned, or `None` with nothing to undo.
    pub fn undo(&mut self, current: Snapshot) -> Option<Snapshot> {
        let previous = self.undo_stack.pop()?;
        self.redo_stack.push(current);
        Some(previous)
    }

    /// Step forward again after an undo.
    pub fn redo(&mut self, current: Snapshot) -> Option<Snapshot> {
        let next = self.redo_stack.pop()?;
        self.undo_stack.push(current);
        Some(next)
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(html: &str) -> Snapshot {
        Snapshot::new(RichDocument::from_html(html), None)
    }

    #[test]
    fn test_undo_redo_cycle() {
        let mut history = History::default();
        history.record(snap("<p>a</p>"));

        let restored = history.undo(snap("<p>ab</p>"));
        assert_eq!(restored, Some(snap("<p>a</p>")));
        assert!(history.can_redo());

        let again = history.redo(snap("<p>a</p>"));
        assert_eq!(again, Some(snap("<p>ab</p>")));
        assert!(history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn test_new_edit_clears_redo() {
        let mut history = History::default();
        history.record(snap("<p>a</p>"));
        history.undo(snap("<p>ab</p>"));
        assert!(history.can_redo());

        history.record(snap("<p>a</p>"));
        assert!(!history.can_redo());
    }

    #[test]
    fn test_max_steps() {
        let mut history = History::new(2);
        history.record(snap("<p>1</p>"));
        history.record(snap("<p>2</p>"));
        history.record(snap("<p>3</p>")); // evicts "1"

        let current = snap("<p>4</p>");
        let first = history.undo(current);
        assert_eq!(first, Some(snap("<p>3</p>")));
        let second = history.undo(snap("<p>3</p>"));
        assert_eq!(second, Some(snap("<p>2</p>")));
        assert_eq!(history.undo(snap("<p>2</p>")), None);
    }

    #[test]
    fn test_nothing_to_undo() {
        let mut history = History::default();
        assert!(!history.can_undo());
        assert_eq!(history.undo(snap("")), None);
        assert!(!history.can_redo());
    }
}
