use super::{
    Block, BlockAddress, BlockGroup, BlockGroupType, Br, ContentModelDocument, Format, GroupPath,
    GroupStep, ListItem, Paragraph, Segment, SelectionMarker, Table, TableCell, Text,
};
use crate::selection::TableSelectionContext;

// ============================================================================
// Lookup helpers
// ============================================================================

pub fn group_blocks<'a>(document: &'a ContentModelDocument, path: &GroupPath) -> Option<&'a Vec<Block>> {
    let mut blocks = &document.blocks;
    for step in path.steps() {
        blocks = match *step {
            GroupStep::Block(idx) => match blocks.get(idx)? {
                Block::BlockGroup(group) => group.blocks(),
                _ => return None,
            },
            GroupStep::Cell { table, row, col } => match blocks.get(table)? {
                Block::Table(table) => &table.rows.get(row)?.cells.get(col)?.blocks,
                _ => return None,
            },
        };
    }
    Some(blocks)
}

pub fn group_blocks_mut<'a>(
    document: &'a mut ContentModelDocument,
    path: &GroupPath,
) -> Option<&'a mut Vec<Block>> {
    let mut blocks = &mut document.blocks;
    for step in path.steps() {
        blocks = match *step {
            GroupStep::Block(idx) => match blocks.get_mut(idx)? {
                Block::BlockGroup(group) => group.blocks_mut(),
                _ => return None,
            },
            GroupStep::Cell { table, row, col } => match blocks.get_mut(table)? {
                Block::Table(table) => &mut table.rows.get_mut(row)?.cells.get_mut(col)?.blocks,
                _ => return None,
            },
        };
    }
    Some(blocks)
}

pub fn block_ref<'a>(document: &'a ContentModelDocument, address: &BlockAddress) -> Option<&'a Block> {
    group_blocks(document, &address.group)?.get(address.index)
}

pub fn block_mut<'a>(
    document: &'a mut ContentModelDocument,
    address: &BlockAddress,
) -> Option<&'a mut Block> {
    group_blocks_mut(document, &address.group)?.get_mut(address.index)
}

pub fn paragraph_ref<'a>(
    document: &'a ContentModelDocument,
    address: &BlockAddress,
) -> Option<&'a Paragraph> {
    block_ref(document, address)?.as_paragraph()
}

pub fn paragraph_mut<'a>(
    document: &'a mut ContentModelDocument,
    address: &BlockAddress,
) -> Option<&'a mut Paragraph> {
    block_mut(document, address)?.as_paragraph_mut()
}

pub fn table_ref<'a>(document: &'a ContentModelDocument, address: &BlockAddress) -> Option<&'a Table> {
    match block_ref(document, address)? {
        Block::Table(table) => Some(table),
        _ => None,
    }
}

pub fn table_mut<'a>(
    document: &'a mut ContentModelDocument,
    address: &BlockAddress,
) -> Option<&'a mut Table> {
    match block_mut(document, address)? {
        Block::Table(table) => Some(table),
        _ => None,
    }
}

/// The cell a path ending in a `Cell` step points at.
pub fn table_cell_mut<'a>(
    document: &'a mut ContentModelDocument,
    path: &GroupPath,
) -> Option<&'a mut TableCell> {
    let (parent, GroupStep::Cell { table, row, col }) = path.parent()? else {
        return None;
    };
    let table = table_mut(document, &BlockAddress::new(parent, table))?;
    table.rows.get_mut(row)?.cells.get_mut(col)
}

/// The block group a path ending in a `Block` step points at.
pub fn block_group_mut<'a>(
    document: &'a mut ContentModelDocument,
    path: &GroupPath,
) -> Option<&'a mut BlockGroup> {
    let (parent, GroupStep::Block(idx)) = path.parent()? else {
        return None;
    };
    match block_mut(document, &BlockAddress::new(parent, idx))? {
        Block::BlockGroup(group) => Some(group),
        _ => None,
    }
}

pub fn list_item_ref<'a>(document: &'a ContentModelDocument, path: &GroupPath) -> Option<&'a ListItem> {
    let (parent, GroupStep::Block(idx)) = path.parent()? else {
        return None;
    };
    match block_ref(document, &BlockAddress::new(parent, idx))? {
        Block::BlockGroup(BlockGroup::ListItem(item)) => Some(item),
        _ => None,
    }
}

pub fn list_item_mut<'a>(
    document: &'a mut ContentModelDocument,
    path: &GroupPath,
) -> Option<&'a mut ListItem> {
    match block_group_mut(document, path)? {
        BlockGroup::ListItem(item) => Some(item),
        _ => None,
    }
}

/// Types of the groups owning `path`, innermost first, ending with `Document`.
pub fn group_type_chain(document: &ContentModelDocument, path: &GroupPath) -> Vec<BlockGroupType> {
    let mut chain = vec![BlockGroupType::Document];
    let mut blocks = &document.blocks;
    for step in path.steps() {
        let next = match *step {
            GroupStep::Block(idx) => match blocks.get(idx) {
                Some(Block::BlockGroup(group)) => {
                    chain.push(group.group_type());
                    group.blocks()
                }
                _ => break,
            },
            GroupStep::Cell { table, row, col } => {
                let cell = match blocks.get(table) {
                    Some(Block::Table(table)) => table.rows.get(row).and_then(|r| r.cells.get(col)),
                    _ => None,
                };
                let Some(cell) = cell else {
                    break;
                };
                chain.push(BlockGroupType::TableCell);
                &cell.blocks
            }
        };
        blocks = next;
    }
    chain.reverse();
    chain
}

/// Index into an innermost-first chain of the closest group of one of `types`,
/// giving up as soon as a group of one of `stop_types` is met.
pub fn closest_ancestor_index(
    chain: &[BlockGroupType],
    types: &[BlockGroupType],
    stop_types: &[BlockGroupType],
) -> Option<usize> {
    for (idx, group_type) in chain.iter().enumerate() {
        if types.contains(group_type) {
            return Some(idx);
        }
        if stop_types.contains(group_type) {
            return None;
        }
    }
    None
}

/// Context of the innermost table cell enclosing `path`, if any.
pub fn table_context_for_group(
    document: &ContentModelDocument,
    path: &GroupPath,
) -> Option<TableSelectionContext> {
    let (depth, (table_index, row_index, col_index)) = path
        .steps()
        .iter()
        .enumerate()
        .rev()
        .find_map(|(depth, step)| match *step {
            GroupStep::Cell { table, row, col } => Some((depth, (table, row, col))),
            GroupStep::Block(_) => None,
        })?;
    let table = BlockAddress::new(path.prefix(depth), table_index);
    let is_whole_table_selected = table_ref(document, &table).is_some_and(is_whole_table_selected);
    Some(TableSelectionContext {
        table,
        row_index,
        col_index,
        is_whole_table_selected,
    })
}

pub fn is_whole_table_selected(table: &Table) -> bool {
    let mut cells = table.rows.iter().flat_map(|row| row.cells.iter()).peekable();
    cells.peek().is_some() && cells.all(|cell| cell.is_selected)
}

// ============================================================================
// Factories
// ============================================================================

pub fn create_paragraph(
    is_implicit: bool,
    block_format: Option<&Format>,
    segment_format: Option<&Format>,
) -> Paragraph {
    Paragraph {
        is_implicit,
        format: block_format.cloned().unwrap_or_default(),
        segment_format: segment_format.filter(|format| !format.is_empty()).cloned(),
        ..Default::default()
    }
}

pub fn create_selection_marker(format: Option<&Format>) -> Segment {
    Segment::SelectionMarker(SelectionMarker {
        format: format.cloned().unwrap_or_default(),
        is_selected: true,
    })
}

pub fn create_br(format: Option<&Format>) -> Segment {
    Segment::Br(Br {
        format: format.cloned().unwrap_or_default(),
        is_selected: false,
    })
}

pub fn create_text(text: impl Into<String>, format: Option<&Format>) -> Segment {
    Segment::Text(Text {
        text: text.into(),
        format: format.cloned().unwrap_or_default(),
        ..Default::default()
    })
}

// ============================================================================
// Emptiness
// ============================================================================

pub fn is_segment_empty(segment: &Segment) -> bool {
    match segment {
        Segment::Text(text) => text.text.is_empty(),
        Segment::Image(image) => image.src.is_empty(),
        _ => false,
    }
}

pub fn is_block_empty(block: &Block) -> bool {
    match block {
        Block::Paragraph(paragraph) => paragraph.segments.is_empty(),
        Block::Table(table) => table.rows.iter().all(|row| row.cells.is_empty()),
        Block::BlockGroup(BlockGroup::FormatContainer(container)) => container.blocks.is_empty(),
        Block::BlockGroup(BlockGroup::ListItem(item)) => item.blocks.iter().all(is_block_empty),
        Block::BlockGroup(BlockGroup::General(_)) | Block::Divider(_) | Block::Entity(_) => false,
    }
}
