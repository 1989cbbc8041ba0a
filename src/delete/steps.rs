use super::{
    DeleteDirection, DeleteResult, DeleteSelectionContext, delete_block, delete_segment,
};
use crate::model::{
    Block, BlockAddress, ContentModelDocument, Format, GroupStep, Paragraph, Segment, block_ref,
    group_blocks, list_item_mut, paragraph_mut,
};

const DUMMY_ITEM_KEY: &str = "displayForDummyItem";

pub fn forward_delete_collapsed_selection(
    model: &mut ContentModelDocument,
    context: &mut DeleteSelectionContext<'_>,
) {
    delete_collapsed_selection(model, context, DeleteDirection::Forward);
}

pub fn backward_delete_collapsed_selection(
    model: &mut ContentModelDocument,
    context: &mut DeleteSelectionContext<'_>,
) {
    delete_collapsed_selection(model, context, DeleteDirection::Backward);
}

fn delete_collapsed_selection(
    model: &mut ContentModelDocument,
    context: &mut DeleteSelectionContext<'_>,
    direction: DeleteDirection,
) {
    if context.delete_result != DeleteResult::NotDeleted {
        return;
    }
    let Some(insert_point) = context.insert_point.clone() else {
        return;
    };
    let Some(paragraph) = paragraph_mut(model, &insert_point.paragraph) else {
        return;
    };
    let Some(marker_index) = paragraph.marker_index() else {
        return;
    };
    let skip_br = has_redundant_trailing_br(&paragraph.segments);
    let content_len = paragraph.segments.len() - usize::from(skip_br);

    let neighbour = match direction {
        DeleteDirection::Forward => Some(marker_index + 1),
        DeleteDirection::Backward => marker_index.checked_sub(1),
    }
    .filter(|idx| *idx < content_len);

    if let Some(index) = neighbour {
        let mut deleted = Vec::new();
        if delete_segment(paragraph, index, Some(direction), &mut deleted) {
            context.delete_result = DeleteResult::SingleChar;
            // The paragraph may be empty now; keep its wrapper so its format survives.
            paragraph.is_implicit = false;
        }
        for (entity, operation) in deleted {
            context.record_deleted_entity(&entity, operation);
        }
        return;
    }

    let Some(sibling) = leaf_sibling_block(model, &insert_point.paragraph, direction) else {
        context.delete_result = DeleteResult::NothingToDelete;
        return;
    };

    let sibling_kind = match block_ref(model, &sibling) {
        Some(Block::Paragraph(_)) => SiblingKind::Paragraph,
        Some(Block::Table(_)) | None => SiblingKind::Table,
        Some(_) => SiblingKind::Atom,
    };
    match sibling_kind {
        SiblingKind::Paragraph => {
            if skip_br {
                drop_placeholder_br(model, &insert_point.paragraph);
            }
            match direction {
                DeleteDirection::Forward => context.last_paragraph = Some(sibling),
                DeleteDirection::Backward => {
                    if let Some(previous) = paragraph_mut(model, &sibling) {
                        if matches!(previous.segments.last(), Some(Segment::Br(_))) {
                            previous.segments.pop();
                        }
                    }
                    context.last_paragraph = Some(insert_point.paragraph.clone());
                    if let Some(point) = context.insert_point.as_mut() {
                        point.paragraph = sibling;
                    }
                }
            }
            context.last_table_context = insert_point.table_context.clone();
            context.delete_result = DeleteResult::Range;
        }
        SiblingKind::Table => {
            // Tables are never swallowed by a single key press.
            context.delete_result = DeleteResult::NothingToDelete;
        }
        SiblingKind::Atom => {
            if delete_block(model, &sibling, direction, context) {
                if let Some(point) = context.insert_point.as_mut() {
                    point.paragraph.adjust_for_removed_block(&sibling);
                    if skip_br {
                        drop_placeholder_br(model, &point.paragraph);
                    }
                }
                context.delete_result = DeleteResult::Range;
            } else {
                context.delete_result = DeleteResult::NothingToDelete;
            }
        }
    }
}

fn drop_placeholder_br(model: &mut ContentModelDocument, address: &BlockAddress) {
    if let Some(paragraph) = paragraph_mut(model, address) {
        if matches!(paragraph.segments.last(), Some(Segment::Br(_))) {
            paragraph.segments.pop();
        }
    }
}

enum SiblingKind {
    Paragraph,
    Table,
    Atom,
}

/// A trailing Br only keeps an otherwise empty line open; it is not content the
/// caret can delete. Two Brs in a row are a real empty line and stay.
fn has_redundant_trailing_br(segments: &[Segment]) -> bool {
    if !matches!(segments.last(), Some(Segment::Br(_))) {
        return false;
    }
    let content: Vec<&Segment> = segments.iter().filter(|s| !s.is_marker()).collect();
    let before_last = content.len().checked_sub(2).map(|idx| content[idx]);
    !matches!(before_last, Some(Segment::Br(_)))
}

/// The closest leaf block before or after `address`, walking out of block
/// groups but never out of a table cell, and descending into groups.
pub(crate) fn leaf_sibling_block(
    model: &ContentModelDocument,
    address: &BlockAddress,
    direction: DeleteDirection,
) -> Option<BlockAddress> {
    let mut current = address.clone();
    loop {
        let blocks = group_blocks(model, &current.group)?;
        let sibling_index = match direction {
            DeleteDirection::Forward => Some(current.index + 1),
            DeleteDirection::Backward => current.index.checked_sub(1),
        }
        .filter(|idx| *idx < blocks.len());

        if let Some(index) = sibling_index {
            let mut found = BlockAddress::new(current.group.clone(), index);
            while let Some(Block::BlockGroup(group)) = block_ref(model, &found) {
                let len = group.blocks().len();
                if len == 0 {
                    break;
                }
                let child = match direction {
                    DeleteDirection::Forward => 0,
                    DeleteDirection::Backward => len - 1,
                };
                found = BlockAddress::new(found.as_group(), child);
            }
            return Some(found);
        }

        let (parent, step) = current.group.parent()?;
        match step {
            GroupStep::Block(index) => current = BlockAddress::new(parent, index),
            GroupStep::Cell { .. } => return None,
        }
    }
}

pub fn forward_delete_word_selection(
    model: &mut ContentModelDocument,
    context: &mut DeleteSelectionContext<'_>,
) {
    delete_word_selection(model, context, DeleteDirection::Forward);
}

pub fn backward_delete_word_selection(
    model: &mut ContentModelDocument,
    context: &mut DeleteSelectionContext<'_>,
) {
    delete_word_selection(model, context, DeleteDirection::Backward);
}

/// Deletes from the caret to the word boundary inside the neighbouring text
/// segment. Anything but text next to the caret is left to the collapsed step.
fn delete_word_selection(
    model: &mut ContentModelDocument,
    context: &mut DeleteSelectionContext<'_>,
    direction: DeleteDirection,
) {
    if context.delete_result != DeleteResult::NotDeleted {
        return;
    }
    let Some(insert_point) = context.insert_point.as_ref() else {
        return;
    };
    let Some(paragraph) = paragraph_mut(model, &insert_point.paragraph) else {
        return;
    };
    let Some(marker_index) = paragraph.marker_index() else {
        return;
    };
    let index = match direction {
        DeleteDirection::Forward => marker_index + 1,
        DeleteDirection::Backward => match marker_index.checked_sub(1) {
            Some(idx) => idx,
            None => return,
        },
    };
    let Some(Segment::Text(text)) = paragraph.segments.get_mut(index) else {
        return;
    };

    let char_len = text.text.chars().count();
    let (start, end) = match direction {
        DeleteDirection::Forward => (0, next_word_boundary(&text.text, 0)),
        DeleteDirection::Backward => (previous_word_boundary(&text.text, char_len), char_len),
    };
    if start >= end {
        return;
    }
    let start_byte = char_to_byte_idx(&text.text, start);
    let end_byte = char_to_byte_idx(&text.text, end);
    text.text.drain(start_byte..end_byte);
    if text.text.is_empty() {
        paragraph.segments.remove(index);
    }
    paragraph.is_implicit = false;
    context.delete_result = DeleteResult::Range;
}

/// Removes everything before the caret in its paragraph.
pub fn delete_all_segment_before(
    model: &mut ContentModelDocument,
    context: &mut DeleteSelectionContext<'_>,
) {
    if context.delete_result != DeleteResult::NotDeleted {
        return;
    }
    let Some(insert_point) = context.insert_point.as_ref() else {
        return;
    };
    let Some(paragraph) = paragraph_mut(model, &insert_point.paragraph) else {
        return;
    };
    let Some(marker_index) = paragraph.marker_index() else {
        return;
    };

    let mut deleted = Vec::new();
    let mut any_deleted = false;
    for index in (0..marker_index).rev() {
        paragraph.segments[index].set_selected(true);
        any_deleted |= delete_segment(paragraph, index, None, &mut deleted);
    }
    if any_deleted {
        context.delete_result = DeleteResult::Range;
    }
    for (entity, operation) in deleted {
        context.record_deleted_entity(&entity, operation);
    }
}

/// Backspace at the very start of a list item first hides its marker, then
/// removes the innermost list level.
pub fn delete_list(model: &mut ContentModelDocument, context: &mut DeleteSelectionContext<'_>) {
    if context.delete_result != DeleteResult::NotDeleted {
        return;
    }
    let Some(insert_point) = context.insert_point.as_ref() else {
        return;
    };
    if insert_point.paragraph.index != 0 || !starts_with_marker(model, &insert_point.paragraph) {
        return;
    }
    let Some(item) = list_item_mut(model, insert_point.path()) else {
        return;
    };
    let Some(last_level) = item.levels.last_mut() else {
        return;
    };

    if is_dummy_level(&last_level.format) {
        item.levels.pop();
    } else {
        last_level
            .format
            .insert(DUMMY_ITEM_KEY.to_string(), "block".to_string());
    }
    context.delete_result = DeleteResult::Range;
}

fn starts_with_marker(model: &ContentModelDocument, address: &BlockAddress) -> bool {
    matches!(
        block_ref(model, address),
        Some(Block::Paragraph(Paragraph { segments, .. })) if segments.first().is_some_and(Segment::is_marker)
    )
}

fn is_dummy_level(format: &Format) -> bool {
    format.get(DUMMY_ITEM_KEY).is_some_and(|value| value == "block")
}

// ============================================================================
// Word boundaries
// ============================================================================

fn char_to_byte_idx(text: &str, char_idx: usize) -> usize {
    text.char_indices()
        .nth(char_idx)
        .map_or(text.len(), |(byte_idx, _)| byte_idx)
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

fn is_punctuation(ch: char) -> bool {
    !ch.is_whitespace() && !is_word_char(ch)
}

/// Start of the word before `offset`, skipping whitespace right before it.
fn previous_word_boundary(text: &str, offset: usize) -> usize {
    let chars: Vec<char> = text.chars().collect();
    let mut idx = offset.min(chars.len());

    while idx > 0 && chars[idx - 1].is_whitespace() {
        idx -= 1;
    }
    if idx > 0 && is_word_char(chars[idx - 1]) {
        while idx > 0 && is_word_char(chars[idx - 1]) {
            idx -= 1;
        }
    } else {
        while idx > 0 && is_punctuation(chars[idx - 1]) {
            idx -= 1;
        }
    }
    idx
}

/// End of the word at `offset`, including the whitespace that follows it.
fn next_word_boundary(text: &str, offset: usize) -> usize {
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();
    let mut idx = offset.min(len);

    if idx < len && is_word_char(chars[idx]) {
        while idx < len && is_word_char(chars[idx]) {
            idx += 1;
        }
    } else {
        while idx < len && is_punctuation(chars[idx]) {
            idx += 1;
        }
    }
    while idx < len && chars[idx].is_whitespace() {
        idx += 1;
    }
    idx
}
