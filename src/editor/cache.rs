//! Keeps the last model around for as long as it still describes the DOM.

use super::{EditorCore, EditorPlugin};
use crate::dom::{DomSelection, are_same_selections};
use crate::event::{NativeEvent, PluginEvent};
use crate::model::ContentModelDocument;

#[derive(Debug, Default)]
pub struct CacheState {
    pub(crate) cached_model: Option<ContentModelDocument>,
    pub(crate) cached_selection: Option<DomSelection>,
}

impl CacheState {
    pub fn cached_model(&self) -> Option<&ContentModelDocument> {
        self.cached_model.as_ref()
    }

    pub fn cached_selection(&self) -> Option<&DomSelection> {
        self.cached_selection.as_ref()
    }
}

pub struct CachePlugin;

impl EditorPlugin for CachePlugin {
    fn name(&self) -> &'static str {
        "Cache"
    }

    fn dispose(&mut self, core: &mut EditorCore) -> anyhow::Result<()> {
        core.cache = CacheState::default();
        Ok(())
    }

    fn on_plugin_event(&mut self, core: &mut EditorCore, event: &mut PluginEvent) {
        match event {
            PluginEvent::KeyDown(key) => {
                if key.key == "Enter" || key.handled_by_edit_feature || key.default_prevented {
                    core.invalidate_cache();
                }
            }
            PluginEvent::Input { .. } => update_cached_model(core, None, true),
            PluginEvent::SelectionChanged { selection } => {
                let selection = selection.clone();
                update_cached_model(core, selection, false);
            }
            PluginEvent::ContentChanged {
                content_model,
                selection,
                ..
            } => match content_model.take() {
                Some(model) if core.options.cache_model => {
                    tracing::debug!("adopting model from content change");
                    core.cache.cached_model = Some(model);
                    core.cache.cached_selection = selection.clone();
                }
                _ => core.invalidate_cache(),
            },
            _ => {}
        }
    }

    fn on_native_event(&mut self, core: &mut EditorCore, event: &NativeEvent) -> bool {
        if *event == NativeEvent::SelectionChange && core.host.has_focus() {
            update_cached_model(core, None, false);
        }
        false
    }
}

/// Brings the cached model in line with the live selection, or drops it when
/// the indexer cannot or there is no selection at all.
pub(super) fn update_cached_model(core: &mut EditorCore, selection: Option<DomSelection>, force: bool) {
    if core.is_in_shadow_edit() {
        return;
    }
    let Some(new_selection) = selection.or_else(|| core.host.dom_selection()) else {
        core.invalidate_cache();
        return;
    };
    let old_selection = core.cache.cached_selection.as_ref();
    if !force {
        if let Some(old) = old_selection {
            if are_same_selections(old, &new_selection) {
                return;
            }
        }
    }

    let reconciled = match (core.cache.cached_model.as_mut(), core.dom_indexer.as_mut()) {
        (Some(model), Some(indexer)) => {
            indexer.reconcile_selection(model, &new_selection, old_selection)
        }
        _ => false,
    };
    if reconciled {
        core.cache.cached_selection = Some(new_selection);
    } else {
        core.invalidate_cache();
    }
}
