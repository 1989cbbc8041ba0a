//! Decides when the undo history gets a new snapshot.

use super::{EditorCore, EditorPlugin};
use crate::event::{ChangeSource, KeyboardEvent, PluginEvent};
use crate::snapshots::SnapshotsManager;

#[derive(Debug)]
pub struct UndoState {
    pub(crate) snapshots: SnapshotsManager,
    /// Last key that changed content, used to start a new snapshot when the
    /// kind of editing changes.
    pub(crate) last_key: Option<String>,
}

impl UndoState {
    pub(crate) fn new(snapshots: SnapshotsManager) -> Self {
        Self {
            snapshots,
            last_key: None,
        }
    }

    pub fn snapshots(&self) -> &SnapshotsManager {
        &self.snapshots
    }
}

fn is_delete_key(key: &str) -> bool {
    key == "Backspace" || key == "Delete"
}

/// Records the content before a Backspace/Delete when that starts a new run
/// of deletions or removes an expanded selection.
pub(crate) fn snapshot_before_delete(core: &mut EditorCore, key: &str, is_collapsed: bool) {
    let key_changed = core.undo.last_key.as_deref() != Some(key);
    if !is_collapsed || (key_changed && core.undo.snapshots.has_new_content) {
        core.take_snapshot();
    }
    core.undo.last_key = Some(key.to_string());
}

fn clear_redo_for_input(core: &mut EditorCore) {
    core.undo.snapshots.clear_redo();
    core.undo.snapshots.has_new_content = true;
}

pub struct UndoPlugin;

impl UndoPlugin {
    fn on_key_down(&mut self, core: &mut EditorCore, event: &mut KeyboardEvent) {
        if event.default_prevented && !event.handled_by_edit_feature {
            return;
        }
        let is_collapsed = core.dom_selection().is_none_or(|selection| selection.is_collapsed());

        if is_delete_key(&event.key) {
            if event.handled_by_edit_feature {
                return;
            }
            if event.key == "Backspace" && core.undo.snapshots.can_undo_auto_complete() {
                tracing::debug!("undoing auto complete");
                core.undo();
                event.prevent_default();
                event.handled_by_edit_feature = true;
            } else {
                snapshot_before_delete(core, &event.key, is_collapsed);
            }
        } else if event.is_navigation() {
            if core.undo.snapshots.has_new_content {
                core.take_snapshot();
            }
            core.undo.last_key = None;
        } else if event.key == "Enter" {
            if core.undo.snapshots.has_new_content || !is_collapsed {
                core.take_snapshot();
            }
            core.undo.last_key = Some(event.key.clone());
        } else if event.is_character() {
            let after_delete = core.undo.last_key.as_deref().is_some_and(is_delete_key);
            if !is_collapsed || (after_delete && core.undo.snapshots.has_new_content) {
                core.take_snapshot();
            }
            clear_redo_for_input(core);
            core.undo.last_key = None;
        }
    }
}

impl EditorPlugin for UndoPlugin {
    fn name(&self) -> &'static str {
        "Undo"
    }

    /// Backspace right after an auto-complete reverts it, so the edit plugin
    /// must not delete a character first.
    fn will_handle_event_exclusively(&self, core: &EditorCore, event: &PluginEvent) -> bool {
        matches!(event, PluginEvent::KeyDown(key) if key.key == "Backspace" && !key.default_prevented)
            && core.undo.snapshots.can_undo_auto_complete()
    }

    fn on_plugin_event(&mut self, core: &mut EditorCore, event: &mut PluginEvent) {
        match event {
            PluginEvent::EditorReady => {
                if core.undo.snapshots.current_index().is_none() {
                    core.take_snapshot();
                }
            }
            PluginEvent::KeyDown(key) => self.on_key_down(core, key),
            PluginEvent::Input {
                is_composing: false,
                ..
            }
            | PluginEvent::CompositionEnd { .. } => clear_redo_for_input(core),
            PluginEvent::MouseDown => {
                if core.undo.snapshots.has_new_content {
                    core.take_snapshot();
                }
                core.undo.last_key = None;
            }
            PluginEvent::ContentChanged { source, .. } => {
                if !matches!(
                    source,
                    ChangeSource::Undo
                        | ChangeSource::Redo
                        | ChangeSource::SwitchToDarkMode
                        | ChangeSource::SwitchToLightMode
                ) {
                    core.undo.snapshots.has_new_content = true;
                }
            }
            _ => {}
        }
    }
}
