//! DOM-facing types and the contracts of the collaborators the core drives.
//!
//! The core never owns DOM nodes. Every node is referenced through a [`NodeId`]
//! handle handed out by the host, and everything that touches the live DOM
//! (deriving a model, projecting it back, clipboard extraction, color
//! transformation) goes through [`EditorHost`].

use serde::{Deserialize, Serialize};

use crate::model::ContentModelDocument;
use crate::options::DomToModelOptions;

/// Non-owning handle to a node living in the host document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomPosition {
    pub node: NodeId,
    pub offset: usize,
}

impl DomPosition {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellRect {
    pub first_row: usize,
    pub first_column: usize,
    pub last_row: usize,
    pub last_column: usize,
}

/// The one selection description that is active at a time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DomSelection {
    #[serde(rename_all = "camelCase")]
    Range {
        start: DomPosition,
        end: DomPosition,
        #[serde(default)]
        is_reverted: bool,
    },
    #[serde(rename_all = "camelCase")]
    Table {
        table: NodeId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cells: Option<CellRect>,
    },
    Image {
        image: NodeId,
    },
}

impl DomSelection {
    pub fn caret(node: NodeId, offset: usize) -> Self {
        DomSelection::Range {
            start: DomPosition::new(node, offset),
            end: DomPosition::new(node, offset),
            is_reverted: false,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        match self {
            DomSelection::Range { start, end, .. } => start == end,
            DomSelection::Table { .. } | DomSelection::Image { .. } => false,
        }
    }
}

/// Cheap structural equality used before paying for reconciliation.
pub fn are_same_selections(a: &DomSelection, b: &DomSelection) -> bool {
    match (a, b) {
        (
            DomSelection::Range {
                start: start_a,
                end: end_a,
                ..
            },
            DomSelection::Range {
                start: start_b,
                end: end_b,
                ..
            },
        ) => start_a == start_b && end_a == end_b,
        (
            DomSelection::Table {
                table: table_a,
                cells: cells_a,
            },
            DomSelection::Table {
                table: table_b,
                cells: cells_b,
            },
        ) => table_a == table_b && cells_a == cells_b,
        (DomSelection::Image { image: a }, DomSelection::Image { image: b }) => a == b,
        _ => false,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorTransformDirection {
    LightToDark,
    DarkToLight,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipboardItem {
    pub kind: String,
    pub mime_type: String,
}

/// Structured clipboard content produced by the host's item extractor.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipboardData {
    pub types: Vec<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_html: Option<String>,
    #[serde(default)]
    pub image_data_uri: Option<String>,
    #[serde(default)]
    pub custom_values: Vec<(String, String)>,
}

/// Primitive DOM access used by node-creation hooks.
pub trait DomAccess {
    /// Lower-case tag name, or `None` for non-element nodes.
    fn tag_name(&self, node: NodeId) -> Option<String>;
    fn is_content_editable(&self, node: NodeId) -> bool;
    fn remove_attribute(&mut self, node: NodeId, name: &str);
    /// Wraps `node` into a new element with `tag` and returns the wrapper.
    fn wrap(&mut self, node: NodeId, tag: &str) -> NodeId;
    fn clone_node(&mut self, node: NodeId, deep: bool) -> NodeId;
    fn clear_children(&mut self, node: NodeId);
    fn inner_html(&self, node: NodeId) -> String;
}

/// Invoked by the projector for every DOM node it creates.
pub type OnNodeCreated<'a> = &'a mut dyn FnMut(&mut dyn DomAccess, NodeId);

/// Everything the core needs from the browser environment.
pub trait EditorHost: DomAccess {
    fn root(&self) -> NodeId;
    fn has_focus(&self) -> bool;
    fn focus(&mut self);
    fn dom_selection(&self) -> Option<DomSelection>;
    fn set_dom_selection(&mut self, selection: Option<&DomSelection>);
    fn set_inner_html(&mut self, node: NodeId, html: &str);

    /// Hidden element the copy pipeline renders the clipboard fragment into.
    fn create_temp_container(&mut self) -> NodeId;
    /// Moves focus into `node` and selects `selection` inside it.
    fn focus_temp_container(&mut self, node: NodeId, selection: &DomSelection);

    /// DOM to Model derivation.
    fn create_content_model(
        &mut self,
        options: &DomToModelOptions,
        selection_override: Option<&DomSelection>,
    ) -> ContentModelDocument;

    /// Model to DOM projection into `target`; returns the selection the
    /// projected markers translate to.
    fn content_model_to_dom(
        &mut self,
        model: &ContentModelDocument,
        target: NodeId,
        on_node_created: Option<OnNodeCreated<'_>>,
    ) -> Option<DomSelection>;

    fn transform_color(&mut self, node: NodeId, include_self: bool, direction: ColorTransformDirection);

    /// Starts the asynchronous extraction; the host hands the result back
    /// through `Editor::on_clipboard_data`.
    fn extract_clipboard_items(&mut self, items: &[ClipboardItem], allowed_custom_types: &[String]);
}

/// Patches a cached model's selection flags to match a new DOM selection.
pub trait DomIndexer {
    fn reconcile_selection(
        &mut self,
        model: &mut ContentModelDocument,
        new_selection: &DomSelection,
        old_selection: Option<&DomSelection>,
    ) -> bool;
}

/// External routine that merges extracted clipboard content into the model.
pub trait PasteHandler {
    fn paste(&mut self, editor: &mut crate::editor::EditorCore, data: ClipboardData);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caret_is_collapsed() {
        assert!(DomSelection::caret(NodeId(1), 3).is_collapsed());
        let range = DomSelection::Range {
            start: DomPosition::new(NodeId(1), 0),
            end: DomPosition::new(NodeId(1), 2),
            is_reverted: false,
        };
        assert!(!range.is_collapsed());
        assert!(!DomSelection::Image { image: NodeId(4) }.is_collapsed());
    }

    #[test]
    fn same_selection_ignores_direction() {
        let forward = DomSelection::Range {
            start: DomPosition::new(NodeId(1), 0),
            end: DomPosition::new(NodeId(2), 1),
            is_reverted: false,
        };
        let mut backward = forward.clone();
        if let DomSelection::Range { is_reverted, .. } = &mut backward {
            *is_reverted = true;
        }
        assert!(are_same_selections(&forward, &backward));
        assert!(!are_same_selections(
            &forward,
            &DomSelection::Image { image: NodeId(1) }
        ));
    }
}
