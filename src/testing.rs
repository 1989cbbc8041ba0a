//! Builders and fakes shared by the unit tests.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::dom::{
    ClipboardData, ClipboardItem, ColorTransformDirection, DomAccess, DomIndexer, DomSelection,
    EditorHost, NodeId, OnNodeCreated, PasteHandler,
};
use crate::editor::{EditorCore, EditorPlugin};
use crate::event::PluginEvent;
use crate::model::{
    Block, BlockGroup, Br, ContentModelDocument, Divider, DividerTag, Entity, Format,
    FormatContainer, GeneralBlock, Image, ListItem, ListLevel, ListType, Paragraph, Segment,
    SelectionMarker, Table, TableCell, TableRow, Text,
};
use crate::options::DomToModelOptions;
use crate::selection::has_selection;

pub fn fmt(pairs: &[(&str, &str)]) -> Format {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

pub fn doc(blocks: Vec<Block>) -> ContentModelDocument {
    ContentModelDocument::new().with_blocks(blocks)
}

pub fn text(value: &str) -> Segment {
    Segment::Text(Text {
        text: value.to_string(),
        ..Default::default()
    })
}

pub fn selected_text(value: &str) -> Segment {
    Segment::Text(Text {
        text: value.to_string(),
        is_selected: true,
        ..Default::default()
    })
}

pub fn formatted_text(value: &str, format: Format) -> Segment {
    Segment::Text(Text {
        text: value.to_string(),
        format,
        ..Default::default()
    })
}

pub fn marker() -> Segment {
    Segment::SelectionMarker(SelectionMarker {
        format: Format::new(),
        is_selected: true,
    })
}

pub fn formatted_marker(format: Format) -> Segment {
    Segment::SelectionMarker(SelectionMarker {
        format,
        is_selected: true,
    })
}

pub fn br() -> Segment {
    Segment::Br(Br::default())
}

pub fn image(src: &str, selected: bool) -> Segment {
    Segment::Image(Image {
        src: src.to_string(),
        is_selected: selected,
        ..Default::default()
    })
}

fn entity(wrapper: NodeId, id: &str, selected: bool) -> Entity {
    Entity {
        wrapper,
        entity_type: Some("test".to_string()),
        id: Some(id.to_string()),
        is_readonly: true,
        is_selected: selected,
        format: Format::new(),
    }
}

pub fn entity_segment(wrapper: NodeId, id: &str, selected: bool) -> Segment {
    Segment::Entity(entity(wrapper, id, selected))
}

pub fn entity_block(wrapper: NodeId, id: &str) -> Block {
    Block::Entity(entity(wrapper, id, false))
}

pub fn selected_entity_block(wrapper: NodeId, id: &str) -> Block {
    Block::Entity(entity(wrapper, id, true))
}

pub fn paragraph(segments: Vec<Segment>) -> Block {
    Block::Paragraph(Paragraph::default().with_segments(segments))
}

pub fn implicit_paragraph(segments: Vec<Segment>) -> Block {
    Block::Paragraph(Paragraph {
        is_implicit: true,
        ..Paragraph::default().with_segments(segments)
    })
}

pub fn divider(selected: bool) -> Block {
    Block::Divider(Divider {
        tag_name: DividerTag::Hr,
        is_selected: selected,
        ..Default::default()
    })
}

pub fn quote(blocks: Vec<Block>) -> Block {
    Block::BlockGroup(BlockGroup::FormatContainer(FormatContainer {
        blocks,
        ..Default::default()
    }))
}

pub fn list_item(blocks: Vec<Block>) -> Block {
    Block::BlockGroup(BlockGroup::ListItem(ListItem {
        blocks,
        levels: vec![ListLevel {
            list_type: ListType::Unordered,
            ..Default::default()
        }],
        ..Default::default()
    }))
}

pub fn general_block(element: NodeId, blocks: Vec<Block>, selected: bool) -> Block {
    Block::BlockGroup(BlockGroup::General(GeneralBlock {
        element,
        blocks,
        format: Format::new(),
        is_selected: selected,
    }))
}

pub fn cell(blocks: Vec<Block>) -> TableCell {
    TableCell {
        blocks,
        ..Default::default()
    }
}

pub fn selected_cell(blocks: Vec<Block>) -> TableCell {
    TableCell {
        blocks,
        is_selected: true,
        ..Default::default()
    }
}

pub fn table(rows: Vec<Vec<TableCell>>) -> Block {
    Block::Table(Table {
        rows: rows
            .into_iter()
            .map(|cells| TableRow {
                cells,
                ..Default::default()
            })
            .collect(),
        ..Default::default()
    })
}

/// Plain text of every paragraph in document order, markers shown as `|`.
pub fn outline(document: &ContentModelDocument) -> Vec<String> {
    fn walk(blocks: &[Block], out: &mut Vec<String>) {
        for block in blocks {
            match block {
                Block::Paragraph(paragraph) => out.push(
                    paragraph
                        .segments
                        .iter()
                        .map(|segment| match segment {
                            Segment::Text(text) => text.text.clone(),
                            Segment::Br(_) => "<br>".to_string(),
                            Segment::SelectionMarker(_) => "|".to_string(),
                            Segment::Image(_) => "<img>".to_string(),
                            Segment::Entity(_) => "<entity>".to_string(),
                            Segment::General(_) => "<general>".to_string(),
                        })
                        .collect(),
                ),
                Block::Table(table) => {
                    for row in &table.rows {
                        for cell in &row.cells {
                            walk(&cell.blocks, out);
                        }
                    }
                }
                Block::Divider(_) => out.push("<hr>".to_string()),
                Block::Entity(_) => out.push("<entity>".to_string()),
                Block::BlockGroup(group) => walk(group.blocks(), out),
            }
        }
    }
    let mut out = Vec::new();
    walk(&document.blocks, &mut out);
    out
}

// ============================================================================
// Fake host
// ============================================================================

pub const ROOT: NodeId = NodeId(1);

struct FakeState {
    model: ContentModelDocument,
    selection: Option<DomSelection>,
    has_focus: bool,
    derivations: usize,
    projections: Vec<(NodeId, ContentModelDocument)>,
    html: BTreeMap<NodeId, String>,
    tags: BTreeMap<NodeId, String>,
    read_only: Vec<NodeId>,
    /// Models seen by HTML, so restoring an HTML string restores its model.
    models_by_html: BTreeMap<String, ContentModelDocument>,
    next_node: u64,
    log: Vec<String>,
}

impl FakeState {
    fn new_node(&mut self, tag: &str) -> NodeId {
        self.next_node += 1;
        let node = NodeId(self.next_node);
        self.tags.insert(node, tag.to_string());
        node
    }
}

/// Renders a model the way the fake DOM stores it. Selection is not part of
/// the markup.
pub fn render(document: &ContentModelDocument) -> String {
    outline(document)
        .iter()
        .map(|line| format!("<p>{}</p>", line.replace('|', "")))
        .collect()
}

/// In-memory editor host: the "DOM" is the last projected model.
#[derive(Clone)]
pub struct FakeHost {
    state: Rc<RefCell<FakeState>>,
}

impl FakeHost {
    pub fn new(model: ContentModelDocument) -> Self {
        let html = render(&model);
        let mut tags = BTreeMap::new();
        tags.insert(ROOT, "div".to_string());
        let state = FakeState {
            html: BTreeMap::from([(ROOT, html.clone())]),
            models_by_html: BTreeMap::from([(html, model.clone())]),
            model,
            selection: None,
            has_focus: true,
            derivations: 0,
            projections: Vec::new(),
            tags,
            read_only: Vec::new(),
            next_node: ROOT.0,
            log: Vec::new(),
        };
        Self {
            state: Rc::new(RefCell::new(state)),
        }
    }

    pub fn model(&self) -> ContentModelDocument {
        self.state.borrow().model.clone()
    }

    /// Replaces the content as if the user typed without the editor noticing.
    pub fn set_model(&self, model: ContentModelDocument) {
        let mut state = self.state.borrow_mut();
        let html = render(&model);
        state.html.insert(ROOT, html.clone());
        state.models_by_html.insert(html, model.clone());
        state.model = model;
    }

    pub fn set_selection(&self, selection: Option<DomSelection>) {
        self.state.borrow_mut().selection = selection;
    }

    pub fn set_focus(&self, has_focus: bool) {
        self.state.borrow_mut().has_focus = has_focus;
    }

    pub fn derivations(&self) -> usize {
        self.state.borrow().derivations
    }

    /// Models projected into the editor root.
    pub fn projections(&self) -> Vec<ContentModelDocument> {
        self.state
            .borrow()
            .projections
            .iter()
            .filter(|(target, _)| *target == ROOT)
            .map(|(_, model)| model.clone())
            .collect()
    }

    /// Models projected anywhere but the editor root.
    pub fn fragments(&self) -> Vec<ContentModelDocument> {
        self.state
            .borrow()
            .projections
            .iter()
            .filter(|(target, _)| *target != ROOT)
            .map(|(_, model)| model.clone())
            .collect()
    }

    pub fn html(&self, node: NodeId) -> String {
        self.state.borrow().html.get(&node).cloned().unwrap_or_default()
    }

    pub fn log(&self) -> Vec<String> {
        self.state.borrow().log.clone()
    }

    fn record(&self, entry: String) {
        self.state.borrow_mut().log.push(entry);
    }
}

impl DomAccess for FakeHost {
    fn tag_name(&self, node: NodeId) -> Option<String> {
        self.state.borrow().tags.get(&node).cloned()
    }

    fn is_content_editable(&self, node: NodeId) -> bool {
        !self.state.borrow().read_only.contains(&node)
    }

    fn remove_attribute(&mut self, node: NodeId, name: &str) {
        self.record(format!("removeAttribute {} {name}", node.0));
    }

    fn wrap(&mut self, node: NodeId, tag: &str) -> NodeId {
        let wrapper = self.state.borrow_mut().new_node(tag);
        self.record(format!("wrap {} {tag}", node.0));
        wrapper
    }

    fn clone_node(&mut self, node: NodeId, _deep: bool) -> NodeId {
        let mut state = self.state.borrow_mut();
        let tag = state.tags.get(&node).cloned().unwrap_or_default();
        let clone = state.new_node(&tag);
        let html = state.html.get(&node).cloned().unwrap_or_default();
        state.html.insert(clone, html);
        clone
    }

    fn clear_children(&mut self, node: NodeId) {
        self.state.borrow_mut().html.insert(node, String::new());
        self.record(format!("clear {}", node.0));
    }

    fn inner_html(&self, node: NodeId) -> String {
        self.html(node)
    }
}

impl EditorHost for FakeHost {
    fn root(&self) -> NodeId {
        ROOT
    }

    fn has_focus(&self) -> bool {
        self.state.borrow().has_focus
    }

    fn focus(&mut self) {
        self.state.borrow_mut().has_focus = true;
    }

    fn dom_selection(&self) -> Option<DomSelection> {
        self.state.borrow().selection.clone()
    }

    fn set_dom_selection(&mut self, selection: Option<&DomSelection>) {
        self.state.borrow_mut().selection = selection.cloned();
    }

    fn set_inner_html(&mut self, node: NodeId, html: &str) {
        let mut state = self.state.borrow_mut();
        state.html.insert(node, html.to_string());
        if node == ROOT {
            if let Some(model) = state.models_by_html.get(html).cloned() {
                state.model = model;
            }
        }
    }

    fn create_temp_container(&mut self) -> NodeId {
        let node = self.state.borrow_mut().new_node("div");
        self.record(format!("tempContainer {}", node.0));
        node
    }

    fn focus_temp_container(&mut self, node: NodeId, selection: &DomSelection) {
        let mut state = self.state.borrow_mut();
        state.selection = Some(selection.clone());
        state.log.push(format!("focusTemp {}", node.0));
    }

    fn create_content_model(
        &mut self,
        _options: &DomToModelOptions,
        _selection_override: Option<&DomSelection>,
    ) -> ContentModelDocument {
        let mut state = self.state.borrow_mut();
        state.derivations += 1;
        state.model.clone()
    }

    fn content_model_to_dom(
        &mut self,
        model: &ContentModelDocument,
        target: NodeId,
        on_node_created: Option<OnNodeCreated<'_>>,
    ) -> Option<DomSelection> {
        let created: Vec<NodeId> = {
            let mut state = self.state.borrow_mut();
            state.projections.push((target, model.clone()));
            let html = render(model);
            state.html.insert(target, html.clone());
            state.models_by_html.insert(html, model.clone());
            if target == ROOT {
                state.model = model.clone();
            }
            let mut created = Vec::new();
            for block in &model.blocks {
                match block {
                    Block::Table(_) => created.push(state.new_node("table")),
                    Block::Entity(_) => {
                        let node = state.new_node("div");
                        state.read_only.push(node);
                        created.push(node);
                    }
                    _ => {}
                }
            }
            created
        };
        if let Some(hook) = on_node_created {
            for node in created {
                hook(self, node);
            }
        }
        has_selection(model).then(|| DomSelection::caret(target, 0))
    }

    fn transform_color(&mut self, node: NodeId, include_self: bool, direction: ColorTransformDirection) {
        self.record(format!("color {} {include_self} {direction:?}", node.0));
    }

    fn extract_clipboard_items(&mut self, items: &[ClipboardItem], allowed_custom_types: &[String]) {
        self.record(format!(
            "extract {} [{}]",
            items.len(),
            allowed_custom_types.join(",")
        ));
    }
}

// ============================================================================
// Other collaborators
// ============================================================================

/// Indexer that either always or never manages to patch the cached model.
pub struct FakeIndexer {
    reconciles: bool,
    calls: Rc<Cell<usize>>,
}

impl FakeIndexer {
    pub fn new(reconciles: bool) -> Self {
        Self {
            reconciles,
            calls: Rc::new(Cell::new(0)),
        }
    }

    pub fn calls(&self) -> Rc<Cell<usize>> {
        Rc::clone(&self.calls)
    }
}

impl DomIndexer for FakeIndexer {
    fn reconcile_selection(
        &mut self,
        _model: &mut ContentModelDocument,
        _new_selection: &DomSelection,
        _old_selection: Option<&DomSelection>,
    ) -> bool {
        self.calls.set(self.calls.get() + 1);
        self.reconciles
    }
}

#[derive(Clone, Default)]
pub struct RecordingPasteHandler {
    pasted: Rc<RefCell<Vec<ClipboardData>>>,
}

impl RecordingPasteHandler {
    pub fn pasted(&self) -> Vec<ClipboardData> {
        self.pasted.borrow().clone()
    }
}

impl PasteHandler for RecordingPasteHandler {
    fn paste(&mut self, _editor: &mut EditorCore, data: ClipboardData) {
        self.pasted.borrow_mut().push(data);
    }
}

/// Plugin that writes `name:event` for everything it sees into a shared log.
pub struct RecordingPlugin {
    name: &'static str,
    log: Rc<RefCell<Vec<String>>>,
    fail_dispose: bool,
}

impl RecordingPlugin {
    pub fn new(name: &'static str, log: &Rc<RefCell<Vec<String>>>) -> Self {
        Self {
            name,
            log: Rc::clone(log),
            fail_dispose: false,
        }
    }

    pub fn failing_dispose(mut self) -> Self {
        self.fail_dispose = true;
        self
    }
}

impl EditorPlugin for RecordingPlugin {
    fn name(&self) -> &'static str {
        self.name
    }

    fn dispose(&mut self, _core: &mut EditorCore) -> anyhow::Result<()> {
        self.log.borrow_mut().push(format!("{}:dispose", self.name));
        if self.fail_dispose {
            anyhow::bail!("{} failed to let go", self.name);
        }
        Ok(())
    }

    fn on_plugin_event(&mut self, _core: &mut EditorCore, event: &mut PluginEvent) {
        self.log
            .borrow_mut()
            .push(format!("{}:{}", self.name, event.name()));
    }
}
