//! Copy, cut and paste.
//!
//! Copy and cut render a trimmed clone of the selected content into a hidden
//! container the browser copies from. The container is emptied on the next
//! turn, and a cut deletes the selection from the live model at that point.

use super::{EditorCore, EditorPlugin, FormatContentModelOptions, ModelCopyMode};
use crate::delete::{DeleteResult, delete_selection};
use crate::dom::{ClipboardItem, DomAccess, DomSelection, NodeId};
use crate::event::{ChangeSource, NativeEvent, PluginEvent};
use crate::model::{
    Block, BlockGroup, ContentModelDocument, Segment, Table, normalize_content_model,
    paragraph_mut, table_mut,
};
use crate::selection::{
    IterateSelectionsOption, SelectionTarget, collect_selections, get_selected_cells,
};

#[derive(Debug, Default)]
pub struct CopyPasteState {
    temp_container: Option<NodeId>,
}

pub struct CopyPastePlugin;

impl EditorPlugin for CopyPastePlugin {
    fn name(&self) -> &'static str {
        "CopyPaste"
    }

    fn dispose(&mut self, core: &mut EditorCore) -> anyhow::Result<()> {
        if let Some(container) = core.copy_paste.temp_container.take() {
            core.host.clear_children(container);
        }
        Ok(())
    }

    fn on_plugin_event(&mut self, _core: &mut EditorCore, _event: &mut PluginEvent) {}

    fn on_native_event(&mut self, core: &mut EditorCore, event: &NativeEvent) -> bool {
        match event {
            NativeEvent::Copy => on_cut_copy(core, false),
            NativeEvent::Cut => on_cut_copy(core, true),
            NativeEvent::Paste(items) => on_paste(core, items),
            NativeEvent::SelectionChange => false,
        }
    }
}

fn on_cut_copy(core: &mut EditorCore, is_cut: bool) -> bool {
    let Some(selection) = core.dom_selection() else {
        return false;
    };
    if selection.is_collapsed() {
        return false;
    }

    let mut model = core.get_content_model_copy(ModelCopyMode::Disconnected);
    match selection {
        DomSelection::Table { .. } => {
            let table = collect_selections(&model, IterateSelectionsOption::default())
                .into_iter()
                .find_map(|record| record.table_context.map(|context| context.table));
            if let Some(address) = table {
                if let Some(table) = table_mut(&mut model, &address) {
                    preprocess_table(table);
                }
            }
        }
        DomSelection::Range { .. } => adjust_selection_for_copy_cut(&mut model),
        DomSelection::Image { .. } => {}
    }
    retain_selected_content(&mut model);

    let container = match core.copy_paste.temp_container {
        Some(container) => container,
        None => {
            let container = core.host.create_temp_container();
            core.copy_paste.temp_container = Some(container);
            container
        }
    };
    let mut hook = on_node_created;
    let selection_for_copy = core
        .host
        .content_model_to_dom(&model, container, Some(&mut hook));

    let Some(selection_for_copy) = selection_for_copy else {
        tracing::debug!(is_cut, "nothing to copy");
        return false;
    };
    core.host.focus_temp_container(container, &selection_for_copy);
    tracing::debug!(is_cut, "clipboard fragment rendered");
    core.trigger_event(PluginEvent::BeforeCutCopy {
        cloned_root: container,
        is_cut,
    });

    core.run_async(move |core| {
        core.host.clear_children(container);
        core.host.focus();
        core.set_dom_selection(Some(&selection));
        if is_cut {
            core.format_content_model(
                |model, context| {
                    let result = delete_selection(model, &[], Some(context)).delete_result;
                    if result == DeleteResult::Range {
                        normalize_content_model(model);
                    }
                    true
                },
                FormatContentModelOptions::api("cut").with_source(ChangeSource::Cut),
            );
        }
    });
    false
}

fn on_paste(core: &mut EditorCore, items: &[ClipboardItem]) -> bool {
    let allowed = core.options.allowed_custom_paste_types.clone();
    tracing::debug!(items = items.len(), "extracting clipboard items");
    core.host.extract_clipboard_items(items, &allowed);
    true
}

/// Post-processes every node the projector creates for the clipboard.
fn on_node_created(dom: &mut dyn DomAccess, node: NodeId) {
    if dom.tag_name(node).as_deref() == Some("table") {
        dom.wrap(node, "div");
    }
    if dom.tag_name(node).is_some() && !dom.is_content_editable(node) {
        dom.remove_attribute(node, "contenteditable");
    }
}

/// Narrows a table down to its selected cells.
pub fn preprocess_table(table: &mut Table) {
    let selected = get_selected_cells(table);
    for row in &mut table.rows {
        row.cells.retain(|cell| cell.is_selected);
    }
    table.rows.retain(|row| !row.cells.is_empty());
    table.format.remove("width");
    table.widths = match selected {
        Some(rect) => table
            .widths
            .iter()
            .enumerate()
            .filter(|(idx, _)| *idx >= rect.first_column && *idx <= rect.last_column)
            .map(|(_, width)| *width)
            .collect(),
        None => Vec::new(),
    };
}

/// A range starting right after the last character of a paragraph leaves a
/// lone marker there. When the selection then continues into a different
/// table context, that marker must not end up on the clipboard as an empty
/// line.
pub fn adjust_selection_for_copy_cut(model: &mut ContentModelDocument) {
    let mut records = collect_selections(model, IterateSelectionsOption::default()).into_iter();
    let Some(first) = records.next() else {
        return;
    };
    let SelectionTarget::Segments { paragraph, segments } = &first.target else {
        return;
    };
    let [marker_index] = segments.as_slice() else {
        return;
    };
    let Some(next) = records.next() else {
        return;
    };
    if next.table_context == first.table_context {
        return;
    }
    if let Some(block) = paragraph_mut(model, paragraph) {
        if block.segments.get(*marker_index).is_some_and(Segment::is_marker) {
            block.segments.remove(*marker_index);
        }
    }
}

/// Drops everything that is not selected. Selected table cells, General
/// blocks, dividers and entities are kept whole.
pub fn retain_selected_content(model: &mut ContentModelDocument) {
    retain_blocks(&mut model.blocks);
}

fn retain_blocks(blocks: &mut Vec<Block>) {
    blocks.retain_mut(retain_block);
}

fn retain_block(block: &mut Block) -> bool {
    match block {
        Block::Paragraph(paragraph) => {
            paragraph.segments.retain(Segment::is_selected);
            !paragraph.segments.is_empty()
        }
        Block::Table(table) => {
            let mut keep = false;
            for row in &mut table.rows {
                for cell in &mut row.cells {
                    if cell.is_selected {
                        keep = true;
                    } else {
                        retain_blocks(&mut cell.blocks);
                        keep |= !cell.blocks.is_empty();
                    }
                }
            }
            keep
        }
        Block::Divider(divider) => divider.is_selected,
        Block::Entity(entity) => entity.is_selected,
        Block::BlockGroup(BlockGroup::General(general)) if general.is_selected => true,
        Block::BlockGroup(group) => {
            retain_blocks(group.blocks_mut());
            !group.blocks().is_empty()
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::TableRow;
    use crate::testing::{
        cell, divider, doc, marker, outline, paragraph, selected_cell, selected_text, table, text,
    };

    #[test]
    fn table_is_narrowed_to_selected_cells() {
        let mut table = Table {
            rows: vec![TableRow {
                cells: vec![
                    cell(vec![paragraph(vec![text("a")])]),
                    selected_cell(vec![paragraph(vec![text("b")])]),
                    selected_cell(vec![paragraph(vec![text("c")])]),
                    cell(vec![paragraph(vec![text("d")])]),
                ],
                ..Default::default()
            }],
            widths: vec![100.0, 20.0, 30.0, 80.0],
            format: crate::testing::fmt(&[("width", "230px"), ("borderCollapse", "collapse")]),
            ..Default::default()
        };

        preprocess_table(&mut table);

        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].cells.len(), 2);
        assert_eq!(table.widths, vec![20.0, 30.0]);
        assert!(!table.format.contains_key("width"));
        assert!(table.format.contains_key("borderCollapse"));
    }

    #[test]
    fn unselected_rows_disappear() {
        let Block::Table(mut table) = table(vec![
            vec![cell(vec![]), cell(vec![])],
            vec![selected_cell(vec![]), cell(vec![])],
        ]) else {
            unreachable!()
        };
        preprocess_table(&mut table);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].cells.len(), 1);
        assert!(table.widths.is_empty());
    }

    #[test]
    fn marker_before_table_is_dropped() {
        let mut model = doc(vec![
            paragraph(vec![text("a"), marker()]),
            table(vec![vec![cell(vec![paragraph(vec![selected_text("b")])])]]),
        ]);

        adjust_selection_for_copy_cut(&mut model);

        assert_eq!(outline(&model), vec!["a", "b"]);
    }

    #[test]
    fn marker_in_same_context_is_kept() {
        let mut model = doc(vec![
            paragraph(vec![text("a"), marker()]),
            paragraph(vec![selected_text("b")]),
        ]);
        adjust_selection_for_copy_cut(&mut model);
        assert_eq!(outline(&model), vec!["a|", "b"]);
    }

    #[test]
    fn unselected_content_is_trimmed() {
        let mut model = doc(vec![
            paragraph(vec![text("a")]),
            paragraph(vec![text("b"), selected_text("c")]),
            divider(false),
            table(vec![vec![
                selected_cell(vec![paragraph(vec![text("d")])]),
                cell(vec![paragraph(vec![text("e")])]),
            ]]),
        ]);

        retain_selected_content(&mut model);

        assert_eq!(outline(&model), vec!["c", "d"]);
    }
}
