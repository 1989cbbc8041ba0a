//! Removing the selected content from a model.
//!
//! [`delete_selection`] first removes an expanded selection, then lets the
//! supplied steps handle a collapsed one (Backspace, Delete, word deletion...),
//! and finally merges the paragraphs a cross-paragraph deletion left behind.

use std::mem;

use serde::Serialize;
use unicode_segmentation::UnicodeSegmentation;

use crate::editor::{DeletedEntity, FormatContentModelContext};
use crate::event::EntityOperation;
use crate::model::{
    Block, BlockAddress, BlockGroup, ContentModelDocument, Entity, Format, GroupPath, Paragraph,
    Segment, SelectionMarker, create_br, create_paragraph, paragraph_mut, table_cell_mut,
};
use crate::selection::{
    GeneralElementPolicy, IterateSelectionsOption, ListFormatHolderPolicy, SelectionTarget,
    TableCellContentPolicy, TableSelectionContext, collect_selections,
};

pub mod steps;

pub use steps::{
    backward_delete_collapsed_selection, backward_delete_word_selection, delete_all_segment_before,
    delete_list, forward_delete_collapsed_selection, forward_delete_word_selection,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DeleteResult {
    /// Nothing was selected, only the caret position was resolved.
    NotDeleted,
    /// One character (grapheme cluster) or one inline atom next to the caret.
    SingleChar,
    Range,
    /// The caret sits at an edge with nothing to remove. The caller should
    /// still swallow the key.
    NothingToDelete,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeleteDirection {
    Forward,
    Backward,
}

/// Where new content goes after a deletion.
#[derive(Clone, Debug, PartialEq)]
pub struct InsertPoint {
    pub marker: SelectionMarker,
    pub paragraph: BlockAddress,
    pub table_context: Option<TableSelectionContext>,
}

impl InsertPoint {
    /// The group owning the paragraph. Use `group_type_chain` for the types of
    /// every group up to the Document.
    pub fn path(&self) -> &GroupPath {
        &self.paragraph.group
    }
}

/// State shared by the expanded deletion and the steps that follow it.
pub struct DeleteSelectionContext<'f> {
    pub delete_result: DeleteResult,
    pub insert_point: Option<InsertPoint>,
    pub last_paragraph: Option<BlockAddress>,
    pub last_table_context: Option<TableSelectionContext>,
    pub format_context: Option<&'f mut FormatContentModelContext>,
}

impl DeleteSelectionContext<'_> {
    pub(crate) fn record_deleted_entity(&mut self, entity: &Entity, operation: EntityOperation) {
        if let Some(context) = self.format_context.as_deref_mut() {
            context.deleted_entities.push(DeletedEntity {
                entity: entity.clone(),
                operation,
            });
        }
    }
}

/// One pluggable deletion policy, run only while nothing has been deleted yet.
pub type DeleteSelectionStep = fn(&mut ContentModelDocument, &mut DeleteSelectionContext<'_>);

#[derive(Clone, Debug, PartialEq)]
pub struct DeleteSelectionResult {
    pub delete_result: DeleteResult,
    pub insert_point: Option<InsertPoint>,
}

pub fn delete_selection(
    model: &mut ContentModelDocument,
    additional_steps: &[DeleteSelectionStep],
    format_context: Option<&mut FormatContentModelContext>,
) -> DeleteSelectionResult {
    let mut context = delete_expanded_selection(model, format_context);

    for step in additional_steps {
        if matches!(
            context.delete_result,
            DeleteResult::NotDeleted | DeleteResult::NothingToDelete
        ) {
            step(model, &mut context);
        }
    }

    merge_paragraph_after_delete(model, &mut context);

    tracing::debug!(result = ?context.delete_result, "delete selection");
    DeleteSelectionResult {
        delete_result: context.delete_result,
        insert_point: context.insert_point,
    }
}

fn delete_expanded_selection<'f>(
    model: &mut ContentModelDocument,
    format_context: Option<&'f mut FormatContentModelContext>,
) -> DeleteSelectionContext<'f> {
    let mut context = DeleteSelectionContext {
        delete_result: DeleteResult::NotDeleted,
        insert_point: None,
        last_paragraph: None,
        last_table_context: None,
        format_context,
    };
    let records = collect_selections(
        model,
        IterateSelectionsOption {
            include_list_format_holder: ListFormatHolderPolicy::Never,
            content_under_selected_table_cell: TableCellContentPolicy::IgnoreForTableOrCell,
            content_under_selected_general_element: GeneralElementPolicy::GeneralElementOnly,
        },
    );
    let default_format = model.format.clone();

    // Every deletion below swaps one block for one block, so the recorded
    // addresses stay valid for the whole pass.
    for record in records {
        let mut marker_format = default_format.clone().unwrap_or_default();
        let mut insert_index = 0;
        let paragraph_address = match record.target {
            SelectionTarget::Segments {
                paragraph: address,
                segments,
            } => {
                let Some(paragraph) = paragraph_mut(model, &address) else {
                    debug_assert!(false, "selected paragraph missing at {address:?}");
                    continue;
                };
                let Some(&first) = segments.first() else {
                    continue;
                };
                if let Some(segment) = paragraph.segments.get(first) {
                    marker_format = segment.format().clone();
                }
                insert_index = first;

                let mut deleted = Vec::new();
                let mut any_deleted = false;
                for &idx in segments.iter().rev() {
                    any_deleted |= delete_segment(paragraph, idx, None, &mut deleted);
                }
                if any_deleted {
                    context.delete_result = DeleteResult::Range;
                    paragraph.is_implicit = false;
                }
                for (entity, operation) in deleted.into_iter().rev() {
                    context.record_deleted_entity(&entity, operation);
                }
                address
            }
            SelectionTarget::Block(address) => {
                let replacement = create_paragraph(true, None, default_format.as_ref());
                if let Some(removed) = replace_block(model, &address, Block::Paragraph(replacement)) {
                    if let Block::Entity(entity) = &removed {
                        context.record_deleted_entity(entity, EntityOperation::Overwrite);
                    }
                    context.delete_result = DeleteResult::Range;
                }
                address
            }
            SelectionTarget::TableCell => {
                let Some(cell) = table_cell_mut(model, &record.path) else {
                    debug_assert!(false, "selected cell missing at {:?}", record.path);
                    continue;
                };
                let mut paragraph = create_paragraph(true, None, default_format.as_ref());
                paragraph.segments.push(create_br(default_format.as_ref()));
                cell.blocks = vec![Block::Paragraph(paragraph)];
                cell.is_selected = false;
                context.delete_result = DeleteResult::Range;
                BlockAddress::new(record.path.clone(), 0)
            }
            SelectionTarget::ListFormatHolder => continue,
        };

        if context.insert_point.is_none() {
            let Some(paragraph) = paragraph_mut(model, &paragraph_address) else {
                continue;
            };
            let marker = SelectionMarker {
                format: marker_format,
                is_selected: true,
            };
            let insert_index = insert_index.min(paragraph.segments.len());
            paragraph
                .segments
                .insert(insert_index, Segment::SelectionMarker(marker.clone()));
            context.insert_point = Some(InsertPoint {
                marker,
                paragraph: paragraph_address,
                table_context: record.table_context,
            });
        } else {
            context.last_paragraph = Some(paragraph_address);
            context.last_table_context = record.table_context;
        }
    }

    context
}

fn merge_paragraph_after_delete(model: &mut ContentModelDocument, context: &mut DeleteSelectionContext<'_>) {
    if context.delete_result != DeleteResult::Range {
        return;
    }
    let (Some(insert_point), Some(last)) = (&context.insert_point, &context.last_paragraph) else {
        return;
    };
    if *last == insert_point.paragraph || context.last_table_context != insert_point.table_context {
        return;
    }

    let Some(last_paragraph) = paragraph_mut(model, last) else {
        return;
    };
    let moved = mem::take(&mut last_paragraph.segments);
    let Some(target) = paragraph_mut(model, &insert_point.paragraph) else {
        return;
    };
    target.segments.extend(moved);
}

/// Swaps the block at `address` for `replacement` and returns the old block.
pub(crate) fn replace_block(
    model: &mut ContentModelDocument,
    address: &BlockAddress,
    replacement: Block,
) -> Option<Block> {
    let blocks = crate::model::group_blocks_mut(model, &address.group)?;
    let slot = blocks.get_mut(address.index)?;
    Some(mem::replace(slot, replacement))
}

/// Removes a whole block (or the entity it is) and reports whether it did.
pub(crate) fn delete_block(
    model: &mut ContentModelDocument,
    address: &BlockAddress,
    direction: DeleteDirection,
    context: &mut DeleteSelectionContext<'_>,
) -> bool {
    let Some(blocks) = crate::model::group_blocks_mut(model, &address.group) else {
        return false;
    };
    let Some(block) = blocks.get(address.index) else {
        return false;
    };
    match block {
        Block::Divider(_) | Block::Entity(_) | Block::BlockGroup(BlockGroup::General(_)) => {}
        Block::Paragraph(_) | Block::Table(_) | Block::BlockGroup(_) => return false,
    }
    let removed = blocks.remove(address.index);
    if let Block::Entity(entity) = &removed {
        let operation = entity_operation(entity.is_selected, direction);
        context.record_deleted_entity(entity, operation);
    }
    true
}

fn entity_operation(is_selected: bool, direction: DeleteDirection) -> EntityOperation {
    if is_selected {
        EntityOperation::Overwrite
    } else {
        match direction {
            DeleteDirection::Forward => EntityOperation::RemoveFromStart,
            DeleteDirection::Backward => EntityOperation::RemoveFromEnd,
        }
    }
}

/// Deletes the segment at `index` of `paragraph`.
///
/// Selected segments go away entirely. An unselected text segment loses one
/// grapheme from the side facing the caret when `direction` is given. Markers
/// are removed but never count as deleted content. Removed entities are pushed
/// to `deleted_entities`.
pub(crate) fn delete_segment(
    paragraph: &mut Paragraph,
    index: usize,
    direction: Option<DeleteDirection>,
    deleted_entities: &mut Vec<(Entity, EntityOperation)>,
) -> bool {
    let preserve_white_space = is_white_space_preserved(&paragraph.format);
    let segments = &mut paragraph.segments;
    let Some(segment) = segments.get_mut(index) else {
        return false;
    };

    match segment {
        Segment::SelectionMarker(_) => {
            segments.remove(index);
            return false;
        }
        Segment::Text(text) if !text.is_selected && !text.text.is_empty() => {
            let Some(direction) = direction else {
                return false;
            };
            remove_grapheme(&mut text.text, direction);
            if !text.text.is_empty() {
                return true;
            }
            segments.remove(index);
        }
        Segment::Entity(entity) => {
            let operation =
                entity_operation(entity.is_selected, direction.unwrap_or(DeleteDirection::Backward));
            deleted_entities.push((entity.clone(), operation));
            segments.remove(index);
        }
        Segment::Text(_) | Segment::Br(_) | Segment::Image(_) | Segment::General(_) => {
            segments.remove(index);
        }
    }

    if !preserve_white_space && index > 0 {
        if let Some(Segment::Text(previous)) = segments.get_mut(index - 1) {
            normalize_trailing_space(&mut previous.text);
        }
    }
    true
}

fn remove_grapheme(text: &mut String, direction: DeleteDirection) {
    let range = match direction {
        DeleteDirection::Forward => text
            .grapheme_indices(true)
            .next()
            .map(|(start, grapheme)| start..start + grapheme.len()),
        DeleteDirection::Backward => text
            .grapheme_indices(true)
            .next_back()
            .map(|(start, grapheme)| start..start + grapheme.len()),
    };
    if let Some(range) = range {
        text.replace_range(range, "");
    }
}

/// A trailing plain space would be collapsed by the browser once nothing follows it.
fn normalize_trailing_space(text: &mut String) {
    if text.ends_with(' ') {
        text.pop();
        text.push('\u{a0}');
    }
}

fn is_white_space_preserved(format: &Format) -> bool {
    matches!(
        format.get("whiteSpace").map(String::as_str),
        Some("pre" | "pre-wrap" | "break-spaces")
    )
}

#[cfg(test)]
#[path = "delete_tests.rs"]
mod delete_tests;
