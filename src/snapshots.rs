//! Bounded undo history of serialized editor states.

use serde::{Deserialize, Serialize};

use crate::dom::DomSelection;

pub const DEFAULT_MAX_SNAPSHOT_SIZE: usize = 10_000_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityState {
    pub id: String,
    pub state: String,
}

/// An immutable capture of the editor content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub html: String,
    #[serde(default)]
    pub is_dark_mode: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_states: Option<Vec<EntityState>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection: Option<DomSelection>,
}

impl Snapshot {
    pub fn new(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            is_dark_mode: false,
            entity_states: None,
            selection: None,
        }
    }

    /// Size accounted against the history ceiling.
    pub fn size(&self) -> usize {
        self.html.len()
    }
}

/// Ordered snapshots with a cursor. Everything after the cursor is redo history.
#[derive(Debug, Clone)]
pub struct SnapshotsManager {
    snapshots: Vec<Snapshot>,
    total_size: usize,
    current_index: Option<usize>,
    auto_complete_index: Option<usize>,
    max_size: usize,
    /// Content changed since the last recorded snapshot.
    pub has_new_content: bool,
}

impl Default for SnapshotsManager {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SNAPSHOT_SIZE)
    }
}

impl SnapshotsManager {
    pub fn new(max_size: usize) -> Self {
        Self {
            snapshots: Vec::new(),
            total_size: 0,
            current_index: None,
            auto_complete_index: None,
            max_size,
            has_new_content: false,
        }
    }

    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    pub fn total_size(&self) -> usize {
        self.total_size
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    pub fn auto_complete_index(&self) -> Option<usize> {
        self.auto_complete_index
    }

    pub fn current(&self) -> Option<&Snapshot> {
        self.snapshots.get(self.current_index?)
    }

    fn target_index(&self, step: isize) -> Option<usize> {
        let current = self.current_index? as isize;
        let target = current.checked_add(step)?;
        (target >= 0 && (target as usize) < self.snapshots.len()).then_some(target as usize)
    }

    pub fn can_move(&self, step: isize) -> bool {
        self.target_index(step).is_some()
    }

    /// Moves the cursor by `step` and returns the snapshot it lands on.
    pub fn move_by(&mut self, step: isize) -> Option<&Snapshot> {
        let target = self.target_index(step)?;
        self.current_index = Some(target);
        self.auto_complete_index = None;
        self.snapshots.get(target)
    }

    pub fn add_snapshot(&mut self, snapshot: Snapshot, is_auto_complete: bool) {
        if let Some(idx) = self.current_index {
            if is_same_snapshot(&self.snapshots[idx], &snapshot) {
                // Same content, only the selection may differ.
                self.snapshots[idx] = snapshot;
                return;
            }
        }

        self.clear_redo();
        self.total_size += snapshot.size();
        self.snapshots.push(snapshot);
        self.current_index = Some(self.snapshots.len() - 1);

        let mut remove_count = 0;
        while remove_count < self.snapshots.len() && self.total_size > self.max_size {
            self.total_size -= self.snapshots[remove_count].size();
            remove_count += 1;
        }
        if remove_count > 0 {
            tracing::debug!(remove_count, total_size = self.total_size, "trimmed undo history");
            self.snapshots.drain(..remove_count);
            self.current_index = self
                .current_index
                .and_then(|idx| idx.checked_sub(remove_count));
            self.auto_complete_index = self
                .auto_complete_index
                .and_then(|idx| idx.checked_sub(remove_count));
        }

        if is_auto_complete {
            self.auto_complete_index = self.current_index;
        }
    }

    /// Drops everything after the cursor.
    pub fn clear_redo(&mut self) {
        let Some(current) = self.current_index else {
            return;
        };
        if current + 1 >= self.snapshots.len() {
            return;
        }
        let removed: usize = self.snapshots[current + 1..].iter().map(Snapshot::size).sum();
        self.snapshots.truncate(current + 1);
        self.total_size -= removed;
        self.auto_complete_index = None;
    }

    /// The snapshot right before the cursor was recorded for an auto-complete.
    pub fn can_undo_auto_complete(&self) -> bool {
        matches!(
            (self.auto_complete_index, self.current_index),
            (Some(auto), Some(current)) if current == auto + 1
        )
    }
}

fn is_same_snapshot(current: &Snapshot, next: &Snapshot) -> bool {
    current.html == next.html && current.entity_states.is_none() && next.entity_states.is_none()
}

#[cfg(test)]
#[path = "snapshots_tests.rs"]
mod snapshots_tests;
