use std::mem;

use super::{Block, BlockGroup, ContentModelDocument, Paragraph, Segment, Table};
use super::{create_br, create_paragraph, is_block_empty, is_segment_empty};

/// Cleans up the tree after a mutation pass: empty segments and blocks go away,
/// list items without levels are unwrapped and every table cell keeps a line to
/// type into.
pub fn normalize_content_model(document: &mut ContentModelDocument) {
    normalize_blocks(&mut document.blocks);
}

fn normalize_blocks(blocks: &mut Vec<Block>) {
    let mut idx = 0;
    while idx < blocks.len() {
        let unwrapped = match &mut blocks[idx] {
            Block::BlockGroup(BlockGroup::ListItem(item)) if item.levels.is_empty() => {
                Some(mem::take(&mut item.blocks))
            }
            _ => None,
        };
        if let Some(inner) = unwrapped {
            // Re-visit the same index, the unwrapped blocks still need normalizing.
            blocks.splice(idx..=idx, inner);
            continue;
        }

        match &mut blocks[idx] {
            Block::Paragraph(paragraph) => normalize_paragraph(paragraph),
            Block::Table(table) => normalize_table(table),
            Block::BlockGroup(group) => normalize_blocks(group.blocks_mut()),
            Block::Divider(_) | Block::Entity(_) => {}
        }

        if is_block_empty(&blocks[idx]) {
            blocks.remove(idx);
        } else {
            idx += 1;
        }
    }
}

fn normalize_table(table: &mut Table) {
    for row in &mut table.rows {
        for cell in &mut row.cells {
            normalize_blocks(&mut cell.blocks);
            if cell.blocks.is_empty() {
                let mut paragraph = create_paragraph(false, None, None);
                paragraph.segments.push(create_br(None));
                cell.blocks.push(Block::Paragraph(paragraph));
            }
        }
    }
    table.rows.retain(|row| !row.cells.is_empty());
}

pub fn normalize_paragraph(paragraph: &mut Paragraph) {
    paragraph.segments.retain(|segment| !is_segment_empty(segment));

    if paragraph.is_implicit {
        return;
    }

    let segments = &mut paragraph.segments;
    let len = segments.len();
    match segments.last() {
        Some(Segment::SelectionMarker(marker))
            if len == 1 || matches!(segments[len - 2], Segment::Br(_)) =>
        {
            // A caret alone on a line needs a Br to keep the line height.
            let format = marker.format.clone();
            segments.push(create_br(Some(&format)));
        }
        Some(Segment::Br(_)) if len > 1 => {
            let content: Vec<&Segment> = segments.iter().filter(|s| !s.is_marker()).collect();
            if content.len() > 1 && !matches!(content[content.len() - 2], Segment::Br(_)) {
                segments.pop();
            }
        }
        _ => {}
    }
}
