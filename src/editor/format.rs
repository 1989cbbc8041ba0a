//! Pending format: a format chosen with a collapsed caret that applies to
//! whatever gets typed next.

use super::{EditorCore, EditorPlugin, FormatContentModelOptions};
use crate::event::{ChangeSource, PluginEvent};
use crate::model::{Format, Segment, paragraph_mut};
use crate::selection::{IterateSelectionsOption, SelectionTarget, collect_selections};

#[derive(Debug, Default)]
pub struct FormatState {
    pub(crate) pending_format: Option<Format>,
}

impl FormatState {
    pub fn pending_format(&self) -> Option<&Format> {
        self.pending_format.as_ref()
    }
}

pub struct FormatPlugin;

impl EditorPlugin for FormatPlugin {
    fn name(&self) -> &'static str {
        "Format"
    }

    fn on_plugin_event(&mut self, core: &mut EditorCore, event: &mut PluginEvent) {
        match event {
            PluginEvent::Input {
                data: Some(data),
                is_composing: false,
            }
            | PluginEvent::CompositionEnd { data: Some(data) } => {
                if let Some(format) = core.format.pending_format.take() {
                    let data = data.clone();
                    apply_pending_format(core, &data, &format);
                }
            }
            PluginEvent::KeyDown(key) if key.is_navigation() => core.format.pending_format = None,
            PluginEvent::MouseUp => core.format.pending_format = None,
            _ => {}
        }
    }
}

/// Gives the characters just typed before the caret `format`, splitting them
/// off the text segment they were typed into.
pub fn apply_pending_format(core: &mut EditorCore, data: &str, format: &Format) -> bool {
    tracing::debug!(data, ?format, "applying pending format");
    core.format_content_model(
        |model, _context| {
            let Some(address) = collect_selections(model, IterateSelectionsOption::default())
                .into_iter()
                .find_map(|record| match record.target {
                    SelectionTarget::Segments { paragraph, .. } => Some(paragraph),
                    _ => None,
                })
            else {
                return false;
            };
            let Some(paragraph) = paragraph_mut(model, &address) else {
                return false;
            };
            let Some(marker_index) = paragraph.marker_index() else {
                return false;
            };
            let Some(text_index) = marker_index.checked_sub(1) else {
                return false;
            };
            let Some(Segment::Text(text)) = paragraph.segments.get_mut(text_index) else {
                return false;
            };
            if data.is_empty() || !text.text.ends_with(data) {
                return false;
            }

            let mut typed = text.clone();
            typed.text = data.to_string();
            typed.is_selected = false;
            typed
                .format
                .extend(format.iter().map(|(key, value)| (key.clone(), value.clone())));
            let merged = typed.format.clone();

            text.text.truncate(text.text.len() - data.len());
            if text.text.is_empty() {
                paragraph.segments[text_index] = Segment::Text(typed);
            } else {
                paragraph.segments.insert(marker_index, Segment::Text(typed));
            }
            if let Some(Segment::SelectionMarker(marker)) =
                paragraph.segments.iter_mut().find(|segment| segment.is_marker())
            {
                marker.format = merged;
            }
            true
        },
        FormatContentModelOptions {
            api_name: Some("applyPendingFormat".to_string()),
            change_source: Some(ChangeSource::Format),
            skip_undo_snapshot: true,
            can_undo_by_backspace: false,
        },
    )
}
