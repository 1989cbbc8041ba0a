//! The editor shell: plugin dispatch, the format orchestrator and the editor
//! lifecycle.
//!
//! [`Editor`] owns the plugins and an [`EditorCore`]. Plugins receive the core
//! mutably with every event. Anything a plugin or a core API raises while an
//! event is being handled is queued and delivered, in order, once the current
//! handler returns.

use std::collections::VecDeque;
use std::mem;

use crate::dom::{
    ClipboardData, ColorTransformDirection, DomIndexer, DomSelection, EditorHost, NodeId,
    PasteHandler,
};
use crate::event::{ChangeSource, ChangedEntity, EntityOperation, NativeEvent, PluginEvent};
use crate::model::{CachedElementKind, ContentModelDocument, clone_model};
use crate::options::EditorOptions;
use crate::snapshots::{Snapshot, SnapshotsManager};

mod cache;
mod context;
mod copy_paste;
mod edit;
mod format;
mod undo;

pub use cache::{CachePlugin, CacheState};
pub use context::{DeletedEntity, FormatContentModelContext, FormatContentModelOptions};
pub use copy_paste::{
    CopyPastePlugin, CopyPasteState, adjust_selection_for_copy_cut, preprocess_table,
    retain_selected_content,
};
pub use edit::EditPlugin;
pub use format::{FormatPlugin, FormatState, apply_pending_format};
pub use undo::{UndoPlugin, UndoState};

/// A unit of editor behavior driven by [`PluginEvent`]s.
pub trait EditorPlugin {
    fn name(&self) -> &'static str;

    fn initialize(&mut self, _core: &mut EditorCore) {}

    fn dispose(&mut self, _core: &mut EditorCore) -> anyhow::Result<()> {
        Ok(())
    }

    /// A plugin answering true gets `event` alone; the others never see it.
    fn will_handle_event_exclusively(&self, _core: &EditorCore, _event: &PluginEvent) -> bool {
        false
    }

    fn on_plugin_event(&mut self, core: &mut EditorCore, event: &mut PluginEvent);

    /// Document-level browser events. Returns true when the browser's default
    /// handling must be prevented.
    fn on_native_event(&mut self, _core: &mut EditorCore, _event: &NativeEvent) -> bool {
        false
    }
}

pub type DeferredTask = Box<dyn FnOnce(&mut EditorCore)>;
pub type DisposeErrorHandler = Box<dyn FnMut(&str, &anyhow::Error)>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelCopyMode {
    /// Clone sharing every DOM handle with the live model.
    Connected,
    /// Cache handles dropped, General and Entity wrappers cloned.
    Disconnected,
}

struct ShadowEdit {
    model: ContentModelDocument,
    selection: Option<DomSelection>,
}

#[derive(Default)]
struct LifecycleState {
    is_disposed: bool,
    is_dark_mode: bool,
    shadow_edit: Option<ShadowEdit>,
}

/// Everything the plugins share: the host, options and the core plugins' state.
pub struct EditorCore {
    host: Box<dyn EditorHost>,
    dom_indexer: Option<Box<dyn DomIndexer>>,
    options: EditorOptions,
    cache: CacheState,
    format: FormatState,
    undo: UndoState,
    copy_paste: CopyPasteState,
    lifecycle: LifecycleState,
    pending_events: VecDeque<PluginEvent>,
    deferred: VecDeque<DeferredTask>,
}

impl EditorCore {
    fn new(host: Box<dyn EditorHost>, dom_indexer: Option<Box<dyn DomIndexer>>, options: EditorOptions) -> Self {
        let lifecycle = LifecycleState {
            is_dark_mode: options.in_dark_mode,
            ..Default::default()
        };
        Self {
            host,
            dom_indexer,
            undo: UndoState::new(SnapshotsManager::new(options.max_snapshot_size)),
            options,
            cache: CacheState::default(),
            format: FormatState::default(),
            copy_paste: CopyPasteState::default(),
            lifecycle,
            pending_events: VecDeque::new(),
            deferred: VecDeque::new(),
        }
    }

    pub fn host(&self) -> &dyn EditorHost {
        self.host.as_ref()
    }

    pub fn host_mut(&mut self) -> &mut dyn EditorHost {
        self.host.as_mut()
    }

    pub fn options(&self) -> &EditorOptions {
        &self.options
    }

    pub fn cache_state(&self) -> &CacheState {
        &self.cache
    }

    pub fn format_state(&self) -> &FormatState {
        &self.format
    }

    pub fn undo_state(&self) -> &UndoState {
        &self.undo
    }

    pub fn is_disposed(&self) -> bool {
        self.lifecycle.is_disposed
    }

    pub fn is_dark_mode(&self) -> bool {
        self.lifecycle.is_dark_mode
    }

    pub fn is_in_shadow_edit(&self) -> bool {
        self.lifecycle.shadow_edit.is_some()
    }

    /// Queues `event` for delivery after the current handler returns.
    pub fn trigger_event(&mut self, event: PluginEvent) {
        self.pending_events.push_back(event);
    }

    /// Runs `task` on the next turn of the host's event loop.
    pub fn run_async(&mut self, task: impl FnOnce(&mut EditorCore) + 'static) {
        self.deferred.push_back(Box::new(task));
    }

    pub fn dom_selection(&self) -> Option<DomSelection> {
        self.host.dom_selection()
    }

    /// Moves the DOM selection. The cached model follows through the indexer
    /// or is dropped.
    pub fn set_dom_selection(&mut self, selection: Option<&DomSelection>) {
        self.host.set_dom_selection(selection);
        cache::update_cached_model(self, selection.cloned(), false);
        self.trigger_event(PluginEvent::SelectionChanged {
            selection: selection.cloned(),
        });
    }

    // ========================================================================
    // Models
    // ========================================================================

    /// Hands out the cached model, deriving a fresh one from the DOM if there
    /// is none. Pair with [`EditorCore::keep_model`].
    fn take_model(&mut self) -> ContentModelDocument {
        if let Some(model) = self.cache.cached_model.take() {
            return model;
        }
        let mut model = self
            .host
            .create_content_model(&self.options.dom_to_model, None);
        if model.format.is_none() {
            model.format = self.options.default_segment_format.clone();
        }
        tracing::debug!(blocks = model.blocks.len(), "derived content model from DOM");
        if self.cache.cached_selection.is_none() {
            self.cache.cached_selection = self.host.dom_selection();
        }
        model
    }

    fn keep_model(&mut self, model: ContentModelDocument) {
        if self.options.cache_model {
            self.cache.cached_model = Some(model);
        } else {
            self.cache.cached_selection = None;
        }
    }

    /// Current model of the editor content. Derived only when the cache is not
    /// valid, or when a selection override is given.
    pub fn create_content_model(&mut self, selection_override: Option<&DomSelection>) -> ContentModelDocument {
        if selection_override.is_some() {
            return self
                .host
                .create_content_model(&self.options.dom_to_model, selection_override);
        }
        let model = self.take_model();
        let copy = model.clone();
        self.keep_model(model);
        copy
    }

    pub fn get_content_model_copy(&mut self, mode: ModelCopyMode) -> ContentModelDocument {
        let model = self.create_content_model(None);
        match mode {
            ModelCopyMode::Connected => model,
            ModelCopyMode::Disconnected => {
                let in_dark_mode = self.lifecycle.is_dark_mode;
                let host = self.host.as_mut();
                let mut policy = |node: NodeId, kind: CachedElementKind| match kind {
                    CachedElementKind::Cache => None,
                    CachedElementKind::General | CachedElementKind::Entity => {
                        let clone = host.clone_node(node, true);
                        if in_dark_mode {
                            host.transform_color(clone, true, ColorTransformDirection::DarkToLight);
                        }
                        Some(clone)
                    }
                };
                clone_model(&model, Some(&mut policy))
            }
        }
    }

    /// Drops the cached model so the next access derives it from the DOM.
    /// Ignored while a shadow edit is running.
    pub fn invalidate_cache(&mut self) {
        if self.lifecycle.shadow_edit.is_some() {
            tracing::debug!("cache invalidation suppressed during shadow edit");
            return;
        }
        if self.cache.cached_model.is_some() {
            tracing::debug!("content model cache invalidated");
        }
        self.cache.cached_model = None;
        self.cache.cached_selection = None;
    }

    // ========================================================================
    // Format orchestration
    // ========================================================================

    /// Runs `formatter` on the current model and, when it reports a change,
    /// writes the model back to the DOM, syncs the selection and records undo
    /// snapshots.
    ///
    /// A formatter that returns false must leave the model untouched.
    pub fn format_content_model<F>(&mut self, formatter: F, options: FormatContentModelOptions) -> bool
    where
        F: FnOnce(&mut ContentModelDocument, &mut FormatContentModelContext) -> bool,
    {
        if self.lifecycle.shadow_edit.is_some() {
            return self.format_shadow_model(formatter);
        }

        let mut model = self.take_model();
        let mut context = FormatContentModelContext::default();
        let changed = formatter(&mut model, &mut context);
        let api_name = options.api_name.as_deref().unwrap_or("format");

        if !changed {
            tracing::debug!(api_name, "formatter made no change");
            if context.clear_model_cache {
                self.invalidate_cache();
            } else {
                self.keep_model(model);
            }
            return false;
        }

        let skip_undo_snapshot = options.skip_undo_snapshot || context.skip_undo_snapshot;
        // The state before an undoable-by-backspace change is the one Backspace
        // returns to.
        if !skip_undo_snapshot && self.undo.snapshots.has_new_content {
            self.add_undo_snapshot(options.can_undo_by_backspace);
        }

        let root = self.host.root();
        let selection = self.host.content_model_to_dom(&model, root, None);
        if let Some(selection) = &selection {
            self.host.set_dom_selection(Some(selection));
        }
        if let Some(format) = context.new_pending_format.take() {
            self.format.pending_format = Some(format);
        }

        let changed_entities: Vec<ChangedEntity> = context
            .new_entities
            .into_iter()
            .map(|entity| ChangedEntity {
                entity,
                operation: EntityOperation::NewEntity,
            })
            .chain(context.deleted_entities.into_iter().map(|deleted| ChangedEntity {
                entity: deleted.entity,
                operation: deleted.operation,
            }))
            .collect();
        for changed in &changed_entities {
            self.trigger_event(PluginEvent::EntityOperation {
                operation: changed.operation,
                entity: changed.entity.clone(),
            });
        }

        let source = options.change_source.clone().unwrap_or(ChangeSource::Format);
        tracing::debug!(
            api_name,
            ?source,
            skip_undo_snapshot,
            new_images = context.new_images.len(),
            changed_entities = changed_entities.len(),
            "applied format"
        );

        let keep = self.options.cache_model && !context.clear_model_cache;
        self.trigger_event(PluginEvent::ContentChanged {
            source,
            content_model: keep.then_some(model),
            selection: if keep { selection } else { None },
            api_name: options.api_name.clone(),
            changed_entities,
        });

        if skip_undo_snapshot {
            self.undo.snapshots.has_new_content = true;
        } else {
            self.add_undo_snapshot(false);
        }
        true
    }

    fn format_shadow_model<F>(&mut self, formatter: F) -> bool
    where
        F: FnOnce(&mut ContentModelDocument, &mut FormatContentModelContext) -> bool,
    {
        let Some(shadow) = self.lifecycle.shadow_edit.as_ref() else {
            return false;
        };
        let mut model = shadow.model.clone();
        let mut context = FormatContentModelContext::default();
        if !formatter(&mut model, &mut context) {
            return false;
        }
        let root = self.host.root();
        self.host.content_model_to_dom(&model, root, None);
        true
    }

    /// Enters preview mode: formatting applies to a throwaway copy until
    /// [`EditorCore::stop_shadow_edit`] puts the real content back.
    pub fn start_shadow_edit(&mut self) {
        if self.lifecycle.shadow_edit.is_some() {
            tracing::debug!("shadow edit already active");
            return;
        }
        let model = self.create_content_model(None);
        let selection = self.host.dom_selection();
        self.lifecycle.shadow_edit = Some(ShadowEdit { model, selection });
    }

    pub fn stop_shadow_edit(&mut self) {
        let Some(shadow) = self.lifecycle.shadow_edit.take() else {
            return;
        };
        let root = self.host.root();
        self.host.content_model_to_dom(&shadow.model, root, None);
        self.host.set_dom_selection(shadow.selection.as_ref());
        if self.options.cache_model {
            self.cache.cached_model = Some(shadow.model);
            self.cache.cached_selection = shadow.selection;
        }
    }

    pub fn set_pending_format(&mut self, format: crate::model::Format) {
        self.format.pending_format = Some(format);
    }

    // ========================================================================
    // Dark mode
    // ========================================================================

    pub fn set_dark_mode(&mut self, is_dark_mode: bool) {
        if self.lifecycle.is_dark_mode == is_dark_mode {
            return;
        }
        let root = self.host.root();
        let (direction, source) = if is_dark_mode {
            (ColorTransformDirection::LightToDark, ChangeSource::SwitchToDarkMode)
        } else {
            (ColorTransformDirection::DarkToLight, ChangeSource::SwitchToLightMode)
        };
        self.host.transform_color(root, false, direction);
        self.lifecycle.is_dark_mode = is_dark_mode;
        self.invalidate_cache();
        self.trigger_event(PluginEvent::content_changed(source));
        self.add_undo_snapshot(false);
    }

    // ========================================================================
    // Undo
    // ========================================================================

    /// Records the current DOM content as a snapshot.
    pub fn take_snapshot(&mut self) {
        self.add_undo_snapshot(false);
    }

    fn add_undo_snapshot(&mut self, is_auto_complete: bool) {
        let root = self.host.root();
        let snapshot = Snapshot {
            html: self.host.inner_html(root),
            is_dark_mode: self.lifecycle.is_dark_mode,
            entity_states: None,
            selection: self.host.dom_selection(),
        };
        self.undo.snapshots.add_snapshot(snapshot, is_auto_complete);
        self.undo.snapshots.has_new_content = false;
    }

    pub fn can_undo(&self) -> bool {
        self.undo.snapshots.has_new_content || self.undo.snapshots.can_move(-1)
    }

    pub fn can_redo(&self) -> bool {
        self.undo.snapshots.can_move(1)
    }

    pub fn undo(&mut self) -> bool {
        if self.undo.snapshots.has_new_content {
            self.add_undo_snapshot(false);
        }
        let Some(snapshot) = self.undo.snapshots.move_by(-1).cloned() else {
            return false;
        };
        self.restore_snapshot(snapshot, ChangeSource::Undo);
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(snapshot) = self.undo.snapshots.move_by(1).cloned() else {
            return false;
        };
        self.restore_snapshot(snapshot, ChangeSource::Redo);
        true
    }

    fn restore_snapshot(&mut self, snapshot: Snapshot, source: ChangeSource) {
        let root = self.host.root();
        self.host.set_inner_html(root, &snapshot.html);
        if snapshot.is_dark_mode != self.lifecycle.is_dark_mode {
            let direction = if self.lifecycle.is_dark_mode {
                ColorTransformDirection::LightToDark
            } else {
                ColorTransformDirection::DarkToLight
            };
            self.host.transform_color(root, false, direction);
        }
        self.host.set_dom_selection(snapshot.selection.as_ref());
        self.invalidate_cache();
        self.undo.snapshots.has_new_content = false;
        self.trigger_event(PluginEvent::content_changed(source));
    }
}

// ============================================================================
// Editor
// ============================================================================

pub struct EditorBuilder {
    host: Box<dyn EditorHost>,
    options: EditorOptions,
    dom_indexer: Option<Box<dyn DomIndexer>>,
    plugins: Vec<Box<dyn EditorPlugin>>,
    paste_handler: Option<Box<dyn PasteHandler>>,
    dispose_error_handler: Option<DisposeErrorHandler>,
}

impl EditorBuilder {
    pub fn new(host: Box<dyn EditorHost>, options: EditorOptions) -> Self {
        Self {
            host,
            options,
            dom_indexer: None,
            plugins: Vec::new(),
            paste_handler: None,
            dispose_error_handler: None,
        }
    }

    pub fn dom_indexer(mut self, indexer: Box<dyn DomIndexer>) -> Self {
        self.dom_indexer = Some(indexer);
        self
    }

    /// Adds a plugin that runs after the built-in ones and before undo tracking.
    pub fn plugin(mut self, plugin: Box<dyn EditorPlugin>) -> Self {
        self.plugins.push(plugin);
        self
    }

    pub fn paste_handler(mut self, handler: Box<dyn PasteHandler>) -> Self {
        self.paste_handler = Some(handler);
        self
    }

    pub fn dispose_error_handler(mut self, handler: DisposeErrorHandler) -> Self {
        self.dispose_error_handler = Some(handler);
        self
    }

    pub fn build(self) -> Editor {
        let mut plugins: Vec<Box<dyn EditorPlugin>> = vec![
            Box::new(CachePlugin),
            Box::new(FormatPlugin),
            Box::new(CopyPastePlugin),
            Box::new(EditPlugin),
        ];
        plugins.extend(self.plugins);
        plugins.push(Box::new(UndoPlugin));

        let mut editor = Editor {
            core: EditorCore::new(self.host, self.dom_indexer, self.options),
            plugins,
            paste_handler: self.paste_handler,
            dispose_error_handler: self
                .dispose_error_handler
                .unwrap_or_else(default_dispose_error_handler),
        };
        for plugin in &mut editor.plugins {
            plugin.initialize(&mut editor.core);
        }
        editor.handle_event(PluginEvent::EditorReady);
        editor
    }
}

fn default_dispose_error_handler() -> DisposeErrorHandler {
    Box::new(|name: &str, error: &anyhow::Error| {
        tracing::error!(plugin = name, "failed to dispose plugin: {error:#}");
    })
}

pub struct Editor {
    core: EditorCore,
    plugins: Vec<Box<dyn EditorPlugin>>,
    paste_handler: Option<Box<dyn PasteHandler>>,
    dispose_error_handler: DisposeErrorHandler,
}

impl Editor {
    pub fn core(&self) -> &EditorCore {
        &self.core
    }

    /// Direct access to the core. Events raised through it are delivered with
    /// the next [`Editor::handle_event`] or [`Editor::flush_events`].
    pub fn core_mut(&mut self) -> &mut EditorCore {
        &mut self.core
    }

    pub fn plugin_names(&self) -> Vec<&'static str> {
        self.plugins.iter().map(|plugin| plugin.name()).collect()
    }

    /// Delivers `event` to every plugin, then everything it caused. Returns the
    /// event as the plugins left it.
    pub fn handle_event(&mut self, event: PluginEvent) -> PluginEvent {
        if self.core.is_disposed() {
            return event;
        }
        let event = self.dispatch(event);
        self.flush_events();
        event
    }

    /// Returns true when the browser's default handling must be prevented.
    pub fn handle_native_event(&mut self, event: NativeEvent) -> bool {
        if self.core.is_disposed() {
            return false;
        }
        let mut prevent_default = false;
        for plugin in &mut self.plugins {
            prevent_default |= plugin.on_native_event(&mut self.core, &event);
        }
        self.flush_events();
        prevent_default
    }

    fn dispatch(&mut self, mut event: PluginEvent) -> PluginEvent {
        let exclusive = self
            .plugins
            .iter()
            .position(|plugin| plugin.will_handle_event_exclusively(&self.core, &event));
        match exclusive {
            Some(index) => self.plugins[index].on_plugin_event(&mut self.core, &mut event),
            None => {
                for plugin in &mut self.plugins {
                    plugin.on_plugin_event(&mut self.core, &mut event);
                }
            }
        }
        event
    }

    pub fn flush_events(&mut self) {
        while let Some(event) = self.core.pending_events.pop_front() {
            if self.core.is_disposed() {
                break;
            }
            self.dispatch(event);
        }
    }

    /// Runs the tasks queued with [`EditorCore::run_async`]. Tasks queued while
    /// running wait for the next call.
    pub fn run_deferred(&mut self) {
        let tasks = mem::take(&mut self.core.deferred);
        for task in tasks {
            if self.core.is_disposed() {
                break;
            }
            task(&mut self.core);
        }
        self.flush_events();
    }

    /// Hands clipboard content extracted by the host to the paste handler,
    /// unless the editor went away in the meantime.
    pub fn on_clipboard_data(&mut self, data: ClipboardData) {
        if self.core.is_disposed() {
            tracing::debug!("editor disposed before clipboard data arrived, paste dropped");
            return;
        }
        let Some(handler) = self.paste_handler.as_mut() else {
            tracing::warn!("no paste handler installed");
            return;
        };
        tracing::debug!(types = ?data.types, "pasting clipboard data");
        handler.paste(&mut self.core, data);
        self.flush_events();
    }

    pub fn format_content_model<F>(&mut self, formatter: F, options: FormatContentModelOptions) -> bool
    where
        F: FnOnce(&mut ContentModelDocument, &mut FormatContentModelContext) -> bool,
    {
        let changed = self.core.format_content_model(formatter, options);
        self.flush_events();
        changed
    }

    pub fn set_dark_mode(&mut self, is_dark_mode: bool) {
        self.core.set_dark_mode(is_dark_mode);
        self.flush_events();
    }

    pub fn undo(&mut self) -> bool {
        let undone = self.core.undo();
        self.flush_events();
        undone
    }

    pub fn redo(&mut self) -> bool {
        let redone = self.core.redo();
        self.flush_events();
        redone
    }

    /// HTML of the content with editor-only artifacts removed by the plugins.
    pub fn get_clean_html(&mut self) -> String {
        let root = self.core.host.root();
        let cloned_root = self.core.host.clone_node(root, true);
        if self.core.is_dark_mode() {
            self.core
                .host
                .transform_color(cloned_root, false, ColorTransformDirection::DarkToLight);
        }
        self.dispatch(PluginEvent::ExtractContentWithDom { cloned_root });
        self.flush_events();
        self.core.host.inner_html(cloned_root)
    }

    /// Tears the editor down. Plugins are disposed in reverse order; a failing
    /// plugin is reported and does not stop the others.
    pub fn dispose(&mut self) {
        if self.core.is_disposed() {
            return;
        }
        self.dispatch(PluginEvent::BeforeDispose);
        self.flush_events();

        for plugin in self.plugins.iter_mut().rev() {
            if let Err(error) = plugin.dispose(&mut self.core) {
                (self.dispose_error_handler)(plugin.name(), &error);
            }
        }
        self.core.pending_events.clear();
        self.core.deferred.clear();
        self.core.cache = CacheState::default();
        self.core.lifecycle.is_disposed = true;
    }
}

#[cfg(test)]
#[path = "editor_tests.rs"]
mod editor_tests;
