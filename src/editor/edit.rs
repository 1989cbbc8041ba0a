//! Backspace and Delete handled on the model instead of by the browser.

use super::undo::snapshot_before_delete;
use super::{EditorCore, EditorPlugin, FormatContentModelOptions};
use crate::delete::{
    DeleteResult, DeleteSelectionStep, backward_delete_collapsed_selection,
    backward_delete_word_selection, delete_all_segment_before, delete_list, delete_selection,
    forward_delete_collapsed_selection, forward_delete_word_selection,
};
use crate::event::{ChangeSource, KeyboardEvent, PluginEvent};
use crate::model::normalize_content_model;

pub struct EditPlugin;

impl EditorPlugin for EditPlugin {
    fn name(&self) -> &'static str {
        "Edit"
    }

    fn on_plugin_event(&mut self, core: &mut EditorCore, event: &mut PluginEvent) {
        if let PluginEvent::KeyDown(key) = event {
            if (key.key == "Backspace" || key.key == "Delete")
                && !key.default_prevented
                && !key.is_composing
            {
                keyboard_delete(core, key);
            }
        }
    }
}

fn delete_steps(event: &KeyboardEvent, is_mac: bool) -> Vec<DeleteSelectionStep> {
    let forward = event.key == "Delete";
    let word = if is_mac {
        event.alt && !event.meta
    } else {
        event.ctrl && !event.alt
    };
    let all_before = is_mac && event.meta && !event.alt && !forward;

    let mut steps: Vec<DeleteSelectionStep> = Vec::new();
    if all_before {
        steps.push(delete_all_segment_before);
    }
    if word {
        steps.push(if forward {
            forward_delete_word_selection
        } else {
            backward_delete_word_selection
        });
    }
    if !forward {
        steps.push(delete_list);
    }
    steps.push(if forward {
        forward_delete_collapsed_selection
    } else {
        backward_delete_collapsed_selection
    });
    steps
}

fn keyboard_delete(core: &mut EditorCore, event: &mut KeyboardEvent) {
    let Some(selection) = core.dom_selection() else {
        return;
    };
    snapshot_before_delete(core, &event.key, selection.is_collapsed());

    let steps = delete_steps(event, core.options().is_mac);
    let api_name = if event.key == "Delete" {
        "handleDeleteKey"
    } else {
        "handleBackspaceKey"
    };
    let mut result = DeleteResult::NotDeleted;
    core.format_content_model(
        |model, context| {
            result = delete_selection(model, &steps, Some(&mut *context)).delete_result;
            match result {
                DeleteResult::SingleChar | DeleteResult::Range => {
                    context.skip_undo_snapshot = result == DeleteResult::SingleChar;
                    normalize_content_model(model);
                    true
                }
                DeleteResult::NotDeleted | DeleteResult::NothingToDelete => false,
            }
        },
        FormatContentModelOptions::api(api_name).with_source(ChangeSource::Keyboard),
    );

    tracing::debug!(key = %event.key, ?result, "keyboard delete");
    if result != DeleteResult::NotDeleted {
        event.prevent_default();
        event.handled_by_edit_feature = true;
    }
}
