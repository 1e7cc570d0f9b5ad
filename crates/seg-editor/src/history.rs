//! Undo/Redo history.
//!
//! Every committed mutation pushes the polygon set as it was *before* the
//! mutation onto the undo stack and clears redo. Snapshots share unchanged
//! polygons with the live set (`Arc`), so a full-set snapshot per edit is
//! cheap. Both stacks are bounded by `max_depth`; the oldest entry falls off.

use seg_core::model::Snapshot;
use std::collections::VecDeque;

/// One restorable state.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub snapshot: Snapshot,
    /// Name of the edit that moved away from this state (e.g. "Slice polygon").
    pub label: String,
    /// Editor clock (ms) when the entry was recorded.
    pub timestamp_ms: f64,
}

/// Bounded undo/redo stacks of full-set snapshots.
#[derive(Debug)]
pub struct History {
    undo_stack: VecDeque<HistoryEntry>,
    redo_stack: VecDeque<HistoryEntry>,
    /// Maximum depth of each stack.
    max_depth: usize,
}

impl History {
    pub fn new(max_depth: usize) -> Self {
        let max_depth = max_depth.max(1);
        Self {
            undo_stack: VecDeque::with_capacity(max_depth.min(256)),
            redo_stack: VecDeque::new(),
            max_depth,
        }
    }

    /// Record `before` as the state preceding the edit `label`.
    pub fn push(&mut self, before: Snapshot, label: &str, timestamp_ms: f64) {
        push_bounded(
            &mut self.undo_stack,
            HistoryEntry {
                snapshot: before,
                label: label.to_string(),
                timestamp_ms,
            },
            self.max_depth,
        );
        self.redo_stack.clear();
    }

    /// Step back. `current` is the live state, saved for redo. Returns the
    /// entry to restore, or `None` (no-op) when there is nothing to undo.
    pub fn undo(&mut self, current: Snapshot, timestamp_ms: f64) -> Option<HistoryEntry> {
        let entry = self.undo_stack.pop_back()?;
        push_bounded(
            &mut self.redo_stack,
            HistoryEntry {
                snapshot: current,
                label: entry.label.clone(),
                timestamp_ms,
            },
            self.max_depth,
        );
        Some(entry)
    }

    /// Step forward again after an undo.
    pub fn redo(&mut self, current: Snapshot, timestamp_ms: f64) -> Option<HistoryEntry> {
        let entry = self.redo_stack.pop_back()?;
        push_bounded(
            &mut self.undo_stack,
            HistoryEntry {
                snapshot: current,
                label: entry.label.clone(),
                timestamp_ms,
            },
            self.max_depth,
        );
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

    /// Label of the edit the next `undo` would revert.
    pub fn undo_label(&self) -> Option<&str> {
        self.undo_stack.back().map(|e| e.label.as_str())
    }

    pub fn redo_label(&self) -> Option<&str> {
        self.redo_stack.back().map(|e| e.label.as_str())
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

fn push_bounded(stack: &mut VecDeque<HistoryEntry>, entry: HistoryEntry, max_depth: usize) {
    stack.push_back(entry);
    while stack.len() > max_depth {
        stack.pop_front();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seg_core::id::PolygonId;
    use seg_core::model::{Point, Polygon, PolygonKind, PolygonSet};

    fn set_with(n: usize) -> PolygonSet {
        let mut set = PolygonSet::new();
        for i in 0..n {
            let dx = i as f64 * 10.0;
            set.insert(Polygon::new(
                PolygonId::intern(&format!("hist_{i}")),
                vec![Point::new(dx, 0.0), Point::new(dx + 5.0, 0.0), Point::new(dx, 5.0)],
                PolygonKind::External,
            ));
        }
        set
    }

    #[test]
    fn empty_stacks_are_noops() {
        let mut h = History::new(10);
        assert!(h.undo(Snapshot::default(), 0.0).is_none());
        assert!(h.redo(Snapshot::default(), 0.0).is_none());
        assert!(!h.can_undo());
    }

    #[test]
    fn undo_then_redo_round_trips() {
        let mut h = History::new(10);
        let before = set_with(1).snapshot();
        let after = set_with(2).snapshot();
        h.push(before.clone(), "Create polygon", 1.0);

        let undone = h.undo(after.clone(), 2.0).unwrap();
        assert_eq!(undone.snapshot, before);
        assert_eq!(undone.label, "Create polygon");
        assert_eq!(h.redo_label(), Some("Create polygon"));

        let redone = h.redo(before, 3.0).unwrap();
        assert_eq!(redone.snapshot, after);
        assert!(h.can_undo());
        assert!(!h.can_redo());
    }

    #[test]
    fn new_push_clears_redo() {
        let mut h = History::new(10);
        h.push(set_with(1).snapshot(), "a", 0.0);
        h.undo(set_with(2).snapshot(), 0.0);
        assert!(h.can_redo());
        h.push(set_with(3).snapshot(), "b", 0.0);
        assert!(!h.can_redo());
    }

    #[test]
    fn depth_is_bounded() {
        let mut h = History::new(3);
        for i in 0..5 {
            h.push(set_with(i).snapshot(), &format!("edit {i}"), i as f64);
        }
        assert_eq!(h.undo_len(), 3);
        assert_eq!(h.undo_label(), Some("edit 4"));
        // Oldest two were dropped.
        let mut labels = Vec::new();
        while let Some(e) = h.undo(Snapshot::default(), 0.0) {
            labels.push(e.label);
        }
        assert_eq!(labels, vec!["edit 4", "edit 3", "edit 2"]);
    }
}
