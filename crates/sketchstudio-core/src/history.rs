//! Snapshot-based undo/redo.

use crate::scene::{SceneDocument, SceneResult};
use std::collections::VecDeque;

/// Linear undo/redo over serialized scene snapshots.
///
/// The undo stack always keeps its first entry (the initial scene). Undo moves
/// the top entry to the front of the redo deque; redo moves the front of the
/// redo deque back on top of the undo stack. Together the two always hold
/// every recorded snapshot, in order.
#[derive(Debug, Clone, Default)]
pub struct History {
    undo_stack: Vec<String>,
    redo_stack: VecDeque<String>,
}

impl History {
    /// Start a history whose first snapshot is `initial`.
    pub fn new(initial: &SceneDocument) -> SceneResult<Self> {
        let mut history = Self::default();
        history.record(initial)?;
        Ok(history)
    }

    /// Append a snapshot after a committed edit and drop pending redos.
    pub fn record(&mut self, doc: &SceneDocument) -> SceneResult<()> {
        let json = doc.to_json()?;
        self.record_json(json);
        Ok(())
    }

    pub fn record_json(&mut self, json: String) {
        self.undo_stack.push(json);
        if !self.redo_stack.is_empty() {
            log::debug!("discarding {} redo snapshot(s)", self.redo_stack.len());
            self.redo_stack.clear();
        }
    }

    /// Step back. Returns the snapshot to restore, or `None` when only the
    /// initial snapshot is left.
    pub fn undo(&mut self) -> Option<&str> {
        if self.undo_stack.len() < 2 {
            return None;
        }
        let top = self.undo_stack.pop()?;
        self.redo_stack.push_front(top);
        self.undo_stack.last().map(String::as_str)
    }

    /// Step forward. Returns the snapshot to restore.
    pub fn redo(&mut self) -> Option<&str> {
        let next = self.redo_stack.pop_front()?;
        self.undo_stack.push(next);
        self.undo_stack.last().map(String::as_str)
    }

    pub fn can_undo(&self) -> bool {
        self.undo_stack.len() > 1
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

    /// Snapshot currently shown (top of the undo stack).
    pub fn current(&self) -> Option<&str> {
        self.undo_stack.last().map(String::as_str)
    }

    /// Every recorded snapshot in recording order.
    pub fn snapshots(&self) -> impl Iterator<Item = &str> {
        self.undo_stack
            .iter()
            .chain(self.redo_stack.iter())
            .map(String::as_str)
    }

    /// Forget everything and start over from `initial`.
    pub fn reset(&mut self, initial: &SceneDocument) -> SceneResult<()> {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.record(initial)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history_with(entries: &[&str]) -> History {
        let mut history = History::default();
        for e in entries {
            history.record_json((*e).to_string());
        }
        history
    }

    #[test]
    fn test_undo_keeps_initial() {
        let mut history = history_with(&["s0"]);
        assert!(!history.can_undo());
        assert_eq!(history.undo(), None);
        assert_eq!(history.undo_len(), 1);
    }

    #[test]
    fn test_undo_redo_order() {
        let mut history = history_with(&["s0", "s1", "s2", "s3"]);
        assert_eq!(history.undo(), Some("s2"));
        assert_eq!(history.undo(), Some("s1"));
        assert_eq!(history.undo(), Some("s0"));
        assert_eq!(history.undo(), None);

        assert_eq!(history.redo(), Some("s1"));
        assert_eq!(history.redo(), Some("s2"));
        assert_eq!(history.redo(), Some("s3"));
        assert_eq!(history.redo(), None);
    }

    #[test]
    fn test_partition_invariant() {
        let mut history = history_with(&["s0", "s1", "s2", "s3"]);
        let all: Vec<String> = history.snapshots().map(str::to_string).collect();
        history.undo();
        history.undo();
        assert_eq!(history.snapshots().collect::<Vec<_>>(), all);
        history.redo();
        assert_eq!(history.snapshots().collect::<Vec<_>>(), all);
        assert_eq!(history.undo_len() + history.redo_len(), 4);
    }

    #[test]
    fn test_record_clears_redo() {
        let mut history = history_with(&["s0", "s1", "s2"]);
        history.undo();
        assert!(history.can_redo());
        history.record_json("s3".to_string());
        assert!(!history.can_redo());
        assert_eq!(history.snapshots().collect::<Vec<_>>(), vec!["s0", "s1", "s3"]);
    }

    #[test]
    fn test_new_records_document() {
        let doc = SceneDocument::empty(800, 600);
        let history = History::new(&doc).unwrap();
        let current = history.current().unwrap();
        assert_eq!(SceneDocument::from_json(current).unwrap(), doc);
    }
}
