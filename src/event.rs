//! The closed set of events plugins receive.

use serde::Serialize;

use crate::dom::{DomSelection, NodeId};
use crate::model::{ContentModelDocument, Entity};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityOperation {
    NewEntity,
    Overwrite,
    RemoveFromStart,
    RemoveFromEnd,
}

/// Why the content changed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChangeSource {
    Format,
    Keyboard,
    Cut,
    Paste,
    SetContent,
    SwitchToDarkMode,
    SwitchToLightMode,
    Undo,
    Redo,
    Custom(String),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeyboardEvent {
    /// Key name as reported by the browser, e.g. `"a"`, `"Enter"`, `"ArrowLeft"`.
    pub key: String,
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub meta: bool,
    pub is_composing: bool,
    pub default_prevented: bool,
    /// Set by the plugin that took care of the key.
    pub handled_by_edit_feature: bool,
}

impl KeyboardEvent {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Default::default()
        }
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn is_character(&self) -> bool {
        self.key.chars().count() == 1 && !self.ctrl && !self.meta
    }

    pub fn is_navigation(&self) -> bool {
        matches!(
            self.key.as_str(),
            "ArrowLeft"
                | "ArrowRight"
                | "ArrowUp"
                | "ArrowDown"
                | "Home"
                | "End"
                | "PageUp"
                | "PageDown"
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChangedEntity {
    pub entity: Entity,
    pub operation: EntityOperation,
}

#[derive(Debug, PartialEq)]
pub enum PluginEvent {
    EditorReady,
    BeforeDispose,
    KeyDown(KeyboardEvent),
    KeyUp(KeyboardEvent),
    Input {
        data: Option<String>,
        is_composing: bool,
    },
    CompositionEnd {
        data: Option<String>,
    },
    MouseDown,
    MouseUp,
    ContentChanged {
        source: ChangeSource,
        /// The model the change produced. The cache plugin takes it over, so
        /// plugins after it see `None`.
        content_model: Option<ContentModelDocument>,
        selection: Option<DomSelection>,
        api_name: Option<String>,
        changed_entities: Vec<ChangedEntity>,
    },
    SelectionChanged {
        selection: Option<DomSelection>,
    },
    ContextMenu,
    EntityOperation {
        operation: EntityOperation,
        entity: Entity,
    },
    /// A clone of the editor root is about to be serialized.
    ExtractContentWithDom {
        cloned_root: NodeId,
    },
    /// The clipboard fragment is rendered and about to be read by the browser.
    BeforeCutCopy {
        cloned_root: NodeId,
        is_cut: bool,
    },
    Scroll,
}

impl PluginEvent {
    pub fn content_changed(source: ChangeSource) -> Self {
        PluginEvent::ContentChanged {
            source,
            content_model: None,
            selection: None,
            api_name: None,
            changed_entities: Vec::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PluginEvent::EditorReady => "editorReady",
            PluginEvent::BeforeDispose => "beforeDispose",
            PluginEvent::KeyDown(_) => "keyDown",
            PluginEvent::KeyUp(_) => "keyUp",
            PluginEvent::Input { .. } => "input",
            PluginEvent::CompositionEnd { .. } => "compositionEnd",
            PluginEvent::MouseDown => "mouseDown",
            PluginEvent::MouseUp => "mouseUp",
            PluginEvent::ContentChanged { .. } => "contentChanged",
            PluginEvent::SelectionChanged { .. } => "selectionChanged",
            PluginEvent::ContextMenu => "contextMenu",
            PluginEvent::EntityOperation { .. } => "entityOperation",
            PluginEvent::ExtractContentWithDom { .. } => "extractContentWithDom",
            PluginEvent::BeforeCutCopy { .. } => "beforeCutCopy",
            PluginEvent::Scroll => "scroll",
        }
    }
}

/// Document-level browser events the host forwards without a plugin event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NativeEvent {
    Copy,
    Cut,
    Paste(Vec<crate::dom::ClipboardItem>),
    SelectionChange,
}
