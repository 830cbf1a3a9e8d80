use std::time::SystemTime;

use tracing::debug;

use crate::layer::Layer;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum EditOp {
    LoadBase,
    AddLayer,
    RemoveLayer,
    Reorder,
    Move,
    Resize,
    Rotate,
    Paint,
    Erase,
    ClearMask,
    Properties,
}

impl EditOp {
    pub const fn label(self) -> &'static str {
        match self {
            Self::LoadBase => "Load image",
            Self::AddLayer => "Add layer",
            Self::RemoveLayer => "Delete layer",
            Self::Reorder => "Reorder layers",
            Self::Move => "Move",
            Self::Resize => "Resize",
            Self::Rotate => "Rotate",
            Self::Paint => "Paint mask",
            Self::Erase => "Erase mask",
            Self::ClearMask => "Clear mask",
            Self::Properties => "Layer properties",
        }
    }
}

/// A snapshot of every layer at a commit point.
///
/// Layers are cloned shallowly: images and masks are shared with the live
/// store, so restoring an entry brings back geometry and properties but not
/// mask pixels painted since.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub when: SystemTime,
    pub op: EditOp,
    layers: Vec<Layer>,
}

impl HistoryEntry {
    pub fn new(op: EditOp, layers: &[Layer]) -> Self {
        Self {
            when: SystemTime::now(),
            op,
            layers: layers.to_vec(),
        }
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }
}

#[derive(Debug, Default, Clone)]
pub struct History {
    entries: Vec<HistoryEntry>,
    current: usize,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self, entry: HistoryEntry) {
        debug!(op = entry.op.label(), "history reset");
        self.entries.clear();
        self.entries.push(entry);
        self.current = 0;
    }

    /// Drops any undone entries and appends `entry` as the new present.
    pub fn commit(&mut self, entry: HistoryEntry) {
        if self.entries.is_empty() {
            self.reset(entry);
            return;
        }

        self.entries.truncate(self.current + 1);
        debug!(
            op = entry.op.label(),
            index = self.entries.len(),
            "history commit"
        );
        self.entries.push(entry);
        self.current = self.entries.len() - 1;
    }

    pub fn undo(&mut self) -> Option<&HistoryEntry> {
        if !self.can_undo() {
            return None;
        }
        self.current -= 1;
        debug!(index = self.current, "undo");
        self.entries.get(self.current)
    }

    pub fn redo(&mut self) -> Option<&HistoryEntry> {
        if !self.can_redo() {
            return None;
        }
        self.current += 1;
        debug!(index = self.current, "redo");
        self.entries.get(self.current)
    }

    pub fn can_undo(&self) -> bool {
        self.current > 0
    }

    pub fn can_redo(&self) -> bool {
        self.current + 1 < self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub const fn current_index(&self) -> usize {
        self.current
    }

    pub fn current(&self) -> Option<&HistoryEntry> {
        self.entries.get(self.current)
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(op: EditOp) -> HistoryEntry {
        HistoryEntry::new(op, &[])
    }

    fn ops(history: &History) -> Vec<EditOp> {
        history.entries().iter().map(|entry| entry.op).collect()
    }

    #[test]
    fn empty_timeline_does_nothing() {
        let mut history = History::new();
        assert!(history.undo().is_none());
        assert!(history.redo().is_none());
        assert!(history.current().is_none());
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn undo_and_redo_walk_the_timeline() {
        let mut history = History::new();
        history.reset(entry(EditOp::LoadBase));
        history.commit(entry(EditOp::AddLayer));
        history.commit(entry(EditOp::Move));
        assert_eq!(history.current_index(), 2);

        assert_eq!(history.undo().map(|e| e.op), Some(EditOp::AddLayer));
        assert_eq!(history.undo().map(|e| e.op), Some(EditOp::LoadBase));
        assert!(history.undo().is_none());
        assert_eq!(history.current_index(), 0);

        assert_eq!(history.redo().map(|e| e.op), Some(EditOp::AddLayer));
        assert_eq!(history.redo().map(|e| e.op), Some(EditOp::Move));
        assert!(history.redo().is_none());
    }

    #[test]
    fn committing_truncates_the_future() {
        let mut history = History::new();
        history.reset(entry(EditOp::LoadBase));
        history.commit(entry(EditOp::AddLayer));
        history.commit(entry(EditOp::Move));
        history.undo();
        history.undo();

        history.commit(entry(EditOp::Paint));
        assert_eq!(ops(&history), [EditOp::LoadBase, EditOp::Paint]);
        assert_eq!(history.current_index(), 1);
        assert!(!history.can_redo());
    }

    #[test]
    fn reset_starts_over() {
        let mut history = History::new();
        history.reset(entry(EditOp::LoadBase));
        history.commit(entry(EditOp::Resize));
        history.reset(entry(EditOp::LoadBase));
        assert_eq!(history.len(), 1);
        assert_eq!(history.current_index(), 0);
        assert!(!history.can_undo());
    }

    #[test]
    fn commit_on_empty_timeline_is_a_reset() {
        let mut history = History::new();
        history.commit(entry(EditOp::AddLayer));
        assert_eq!(history.len(), 1);
        assert_eq!(history.current_index(), 0);
    }
}
