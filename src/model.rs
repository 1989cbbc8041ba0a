//! The Content Model tree: Document, Blocks and Segments.
//!
//! Every node carries a format map and, where it can be selected on its own, an
//! `is_selected` flag. DOM nodes referenced from the tree are [`NodeId`] handles
//! owned by the host.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::dom::NodeId;

mod clone;
pub mod metadata;
mod normalize;
mod structure;

pub use clone::{CachedElementKind, CachedElementPolicy, clone_model};
pub use normalize::{normalize_content_model, normalize_paragraph};
pub use structure::{
    block_group_mut, block_mut, block_ref, closest_ancestor_index, create_br, create_paragraph,
    create_selection_marker, create_text, group_blocks, group_blocks_mut, group_type_chain,
    is_block_empty, is_segment_empty, is_whole_table_selected, list_item_mut, list_item_ref,
    paragraph_mut, paragraph_ref, table_cell_mut, table_context_for_group, table_mut, table_ref,
};

/// Style key/value pairs (`fontSize`, `color`, `whiteSpace`, ...).
pub type Format = BTreeMap<String, String>;
pub type Dataset = BTreeMap<String, String>;

// ============================================================================
// Document and blocks
// ============================================================================

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentModelDocument {
    pub blocks: Vec<Block>,
    /// Default segment format inherited by synthesized paragraphs and markers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<Format>,
}

impl ContentModelDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blocks(mut self, blocks: Vec<Block>) -> Self {
        self.blocks = blocks;
        self
    }

    pub fn with_format(mut self, format: Format) -> Self {
        self.format = Some(format);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "blockType")]
pub enum Block {
    Paragraph(Paragraph),
    Table(Table),
    Divider(Divider),
    BlockGroup(BlockGroup),
    Entity(Entity),
}

impl Block {
    pub fn format(&self) -> &Format {
        match self {
            Block::Paragraph(paragraph) => &paragraph.format,
            Block::Table(table) => &table.format,
            Block::Divider(divider) => &divider.format,
            Block::BlockGroup(group) => group.format(),
            Block::Entity(entity) => &entity.format,
        }
    }

    pub fn as_paragraph(&self) -> Option<&Paragraph> {
        match self {
            Block::Paragraph(paragraph) => Some(paragraph),
            _ => None,
        }
    }

    pub fn as_paragraph_mut(&mut self) -> Option<&mut Paragraph> {
        match self {
            Block::Paragraph(paragraph) => Some(paragraph),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Block::Table(table) => Some(table),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paragraph {
    pub segments: Vec<Segment>,
    #[serde(default)]
    pub format: Format,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment_format: Option<Format>,
    /// No DOM wrapper of its own, exists only to hold segments.
    #[serde(default)]
    pub is_implicit: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decorator: Option<ParagraphDecorator>,
    #[serde(skip)]
    pub cached_element: Option<NodeId>,
}

impl Paragraph {
    pub fn with_segments(mut self, segments: Vec<Segment>) -> Self {
        self.segments = segments;
        self
    }

    pub fn marker_index(&self) -> Option<usize> {
        self.segments
            .iter()
            .position(|segment| matches!(segment, Segment::SelectionMarker(_)))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParagraphDecorator {
    pub tag_name: String,
    #[serde(default)]
    pub format: Format,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub rows: Vec<TableRow>,
    #[serde(default)]
    pub widths: Vec<f64>,
    #[serde(default)]
    pub format: Format,
    #[serde(default)]
    pub dataset: Dataset,
    #[serde(skip)]
    pub cached_element: Option<NodeId>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRow {
    pub cells: Vec<TableCell>,
    #[serde(default)]
    pub height: f64,
    #[serde(default)]
    pub format: Format,
    #[serde(skip)]
    pub cached_element: Option<NodeId>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableCell {
    pub blocks: Vec<Block>,
    #[serde(default)]
    pub format: Format,
    #[serde(default)]
    pub span_left: bool,
    #[serde(default)]
    pub span_above: bool,
    #[serde(default)]
    pub is_header: bool,
    #[serde(default)]
    pub is_selected: bool,
    #[serde(default)]
    pub dataset: Dataset,
    #[serde(skip)]
    pub cached_element: Option<NodeId>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DividerTag {
    #[default]
    Hr,
    Div,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Divider {
    #[serde(default)]
    pub tag_name: DividerTag,
    #[serde(default)]
    pub format: Format,
    #[serde(default)]
    pub is_selected: bool,
    #[serde(skip)]
    pub cached_element: Option<NodeId>,
}

/// Atomic, externally owned content island.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub wrapper: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub is_readonly: bool,
    #[serde(default)]
    pub is_selected: bool,
    #[serde(default)]
    pub format: Format,
}

// ============================================================================
// Block groups
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockGroupType {
    Document,
    FormatContainer,
    ListItem,
    TableCell,
    General,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "blockGroupType")]
pub enum BlockGroup {
    FormatContainer(FormatContainer),
    ListItem(ListItem),
    General(GeneralBlock),
}

impl BlockGroup {
    pub fn group_type(&self) -> BlockGroupType {
        match self {
            BlockGroup::FormatContainer(_) => BlockGroupType::FormatContainer,
            BlockGroup::ListItem(_) => BlockGroupType::ListItem,
            BlockGroup::General(_) => BlockGroupType::General,
        }
    }

    pub fn blocks(&self) -> &Vec<Block> {
        match self {
            BlockGroup::FormatContainer(container) => &container.blocks,
            BlockGroup::ListItem(item) => &item.blocks,
            BlockGroup::General(general) => &general.blocks,
        }
    }

    pub fn blocks_mut(&mut self) -> &mut Vec<Block> {
        match self {
            BlockGroup::FormatContainer(container) => &mut container.blocks,
            BlockGroup::ListItem(item) => &mut item.blocks,
            BlockGroup::General(general) => &mut general.blocks,
        }
    }

    pub fn format(&self) -> &Format {
        match self {
            BlockGroup::FormatContainer(container) => &container.format,
            BlockGroup::ListItem(item) => &item.format,
            BlockGroup::General(general) => &general.format,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerTag {
    #[default]
    Blockquote,
    Div,
    Pre,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatContainer {
    #[serde(default)]
    pub tag_name: ContainerTag,
    pub blocks: Vec<Block>,
    #[serde(default)]
    pub format: Format,
    #[serde(skip)]
    pub cached_element: Option<NodeId>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ListType {
    #[default]
    #[serde(rename = "UL")]
    Unordered,
    #[serde(rename = "OL")]
    Ordered,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListLevel {
    pub list_type: ListType,
    #[serde(default)]
    pub format: Format,
    #[serde(default)]
    pub dataset: Dataset,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListItem {
    pub blocks: Vec<Block>,
    pub levels: Vec<ListLevel>,
    /// Carries the format of the list marker.
    #[serde(default)]
    pub format_holder: SelectionMarker,
    #[serde(default)]
    pub format: Format,
    #[serde(skip)]
    pub cached_element: Option<NodeId>,
}

/// Opaque wrapped DOM island that still holds editable blocks.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneralBlock {
    pub element: NodeId,
    pub blocks: Vec<Block>,
    #[serde(default)]
    pub format: Format,
    #[serde(default)]
    pub is_selected: bool,
}

// ============================================================================
// Segments
// ============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "segmentType")]
pub enum Segment {
    Text(Text),
    Br(Br),
    Image(Image),
    General(GeneralSegment),
    Entity(Entity),
    SelectionMarker(SelectionMarker),
}

impl Segment {
    pub fn format(&self) -> &Format {
        match self {
            Segment::Text(text) => &text.format,
            Segment::Br(br) => &br.format,
            Segment::Image(image) => &image.format,
            Segment::General(general) => &general.format,
            Segment::Entity(entity) => &entity.format,
            Segment::SelectionMarker(marker) => &marker.format,
        }
    }

    pub fn is_selected(&self) -> bool {
        match self {
            Segment::Text(text) => text.is_selected,
            Segment::Br(br) => br.is_selected,
            Segment::Image(image) => image.is_selected,
            Segment::General(general) => general.is_selected,
            Segment::Entity(entity) => entity.is_selected,
            Segment::SelectionMarker(marker) => marker.is_selected,
        }
    }

    pub fn set_selected(&mut self, selected: bool) {
        match self {
            Segment::Text(text) => text.is_selected = selected,
            Segment::Br(br) => br.is_selected = selected,
            Segment::Image(image) => image.is_selected = selected,
            Segment::General(general) => general.is_selected = selected,
            Segment::Entity(entity) => entity.is_selected = selected,
            Segment::SelectionMarker(marker) => marker.is_selected = selected,
        }
    }

    pub fn is_marker(&self) -> bool {
        matches!(self, Segment::SelectionMarker(_))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    pub href: String,
    #[serde(default)]
    pub format: Format,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Text {
    pub text: String,
    #[serde(default)]
    pub format: Format,
    #[serde(default)]
    pub is_selected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<Link>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Br {
    #[serde(default)]
    pub format: Format,
    #[serde(default)]
    pub is_selected: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub src: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(default)]
    pub format: Format,
    #[serde(default)]
    pub is_selected: bool,
    /// Selected through an image selection rather than a range.
    #[serde(default)]
    pub is_selected_as_image_selection: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<Link>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneralSegment {
    pub element: NodeId,
    #[serde(default)]
    pub format: Format,
    #[serde(default)]
    pub is_selected: bool,
}

/// Zero-width placeholder for the caret.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionMarker {
    #[serde(default)]
    pub format: Format,
    #[serde(default)]
    pub is_selected: bool,
}

// ============================================================================
// Addressing
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GroupStep {
    /// Into the block group at this index of the parent's blocks.
    Block(usize),
    /// Into a cell of the table at index `table` of the parent's blocks.
    Cell { table: usize, row: usize, col: usize },
}

impl GroupStep {
    fn block_index(&self) -> usize {
        match *self {
            GroupStep::Block(idx) => idx,
            GroupStep::Cell { table, .. } => table,
        }
    }

    fn block_index_mut(&mut self) -> &mut usize {
        match self {
            GroupStep::Block(idx) => idx,
            GroupStep::Cell { table, .. } => table,
        }
    }
}

/// Location of a block group, from the Document down. Empty means the Document.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupPath {
    steps: Vec<GroupStep>,
}

impl GroupPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn from_steps(steps: Vec<GroupStep>) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &[GroupStep] {
        &self.steps
    }

    pub fn is_root(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.steps.len()
    }

    pub fn child(&self, step: GroupStep) -> Self {
        let mut steps = self.steps.clone();
        steps.push(step);
        Self { steps }
    }

    pub(crate) fn push(&mut self, step: GroupStep) {
        self.steps.push(step);
    }

    pub(crate) fn pop(&mut self) {
        self.steps.pop();
    }

    pub fn parent(&self) -> Option<(GroupPath, GroupStep)> {
        let (last, prefix) = self.steps.split_last()?;
        Some((GroupPath::from_steps(prefix.to_vec()), last.clone()))
    }

    pub fn prefix(&self, depth: usize) -> GroupPath {
        GroupPath::from_steps(self.steps[..depth.min(self.steps.len())].to_vec())
    }

    pub fn starts_with(&self, other: &GroupPath) -> bool {
        self.steps.starts_with(&other.steps)
    }

    /// True when this group lives somewhere inside the table at `table`.
    pub fn is_inside_table(&self, table: &BlockAddress) -> bool {
        let depth = table.group.depth();
        self.starts_with(&table.group)
            && matches!(
                self.steps.get(depth),
                Some(GroupStep::Cell { table: idx, .. }) if *idx == table.index
            )
    }

    /// Keeps this path pointing at the same group after `removed` was spliced out.
    pub fn adjust_for_removed_block(&mut self, removed: &BlockAddress) {
        let depth = removed.group.depth();
        if !self.starts_with(&removed.group) {
            return;
        }
        if let Some(step) = self.steps.get_mut(depth) {
            let idx = step.block_index_mut();
            if *idx > removed.index {
                *idx -= 1;
            }
        }
    }

    pub(crate) fn step_block_index(&self, depth: usize) -> Option<usize> {
        self.steps.get(depth).map(GroupStep::block_index)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockAddress {
    pub group: GroupPath,
    pub index: usize,
}

impl BlockAddress {
    pub fn new(group: GroupPath, index: usize) -> Self {
        Self { group, index }
    }

    pub fn root(index: usize) -> Self {
        Self {
            group: GroupPath::root(),
            index,
        }
    }

    /// Path of the group this block opens when it is a block group.
    pub fn as_group(&self) -> GroupPath {
        self.group.child(GroupStep::Block(self.index))
    }

    pub fn cell(&self, row: usize, col: usize) -> GroupPath {
        self.group.child(GroupStep::Cell {
            table: self.index,
            row,
            col,
        })
    }

    /// Keeps this address pointing at the same block after `removed` was spliced out.
    pub fn adjust_for_removed_block(&mut self, removed: &BlockAddress) {
        if self.group == removed.group {
            if self.index > removed.index {
                self.index -= 1;
            }
        } else {
            self.group.adjust_for_removed_block(removed);
        }
    }
}
