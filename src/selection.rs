//! Locating the selected parts of a model.
//!
//! [`iterate_selections`] walks the tree in document order and reports every
//! selected unit together with the group that owns it and, inside tables, the
//! enclosing cell. The visitor can stop the walk early by returning
//! `ControlFlow::Break`.

use std::ops::ControlFlow;

use crate::dom::CellRect;
use crate::model::{
    Block, BlockAddress, BlockGroup, ContentModelDocument, GroupPath, GroupStep, ListItem,
    Paragraph, Segment, Table, TableCell, is_whole_table_selected,
};

/// The table cell a selected unit lives in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableSelectionContext {
    pub table: BlockAddress,
    pub row_index: usize,
    pub col_index: usize,
    /// Every cell of the table is selected.
    pub is_whole_table_selected: bool,
}

/// When to report the marker format holder of a list item.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ListFormatHolderPolicy {
    /// Only when all segments directly inside the item are selected.
    #[default]
    AllSegments,
    AnySegment,
    Never,
}

/// What to report for selected table cells.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TableCellContentPolicy {
    /// The cell and then everything inside it.
    #[default]
    Include,
    /// A wholly selected table is reported once as a block, its content is skipped.
    IgnoreForTable,
    /// Like `IgnoreForTable`, and content of any selected cell is skipped too.
    IgnoreForTableOrCell,
}

/// What to report for selected general blocks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GeneralElementPolicy {
    #[default]
    ContentOnly,
    GeneralElementOnly,
    Both,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IterateSelectionsOption {
    pub include_list_format_holder: ListFormatHolderPolicy,
    pub content_under_selected_table_cell: TableCellContentPolicy,
    pub content_under_selected_general_element: GeneralElementPolicy,
}

#[derive(Debug)]
pub enum SelectedUnit<'a> {
    /// Selected segments of the paragraph at `index` of the owning group.
    Segments {
        paragraph: &'a Paragraph,
        index: usize,
        segments: Vec<usize>,
    },
    /// The marker format of the list item the path points at.
    ListFormatHolder { item: &'a ListItem },
    /// A block selected as a whole: divider, entity, general block or whole table.
    Block { block: &'a Block, index: usize },
    /// The cell the path points at is selected.
    TableCell { cell: &'a TableCell },
}

#[derive(Debug)]
pub struct SelectionVisit<'a> {
    pub path: &'a GroupPath,
    pub table_context: Option<&'a TableSelectionContext>,
    pub unit: SelectedUnit<'a>,
}

pub fn iterate_selections<F>(
    document: &ContentModelDocument,
    option: IterateSelectionsOption,
    mut visitor: F,
) -> ControlFlow<()>
where
    F: FnMut(&SelectionVisit<'_>) -> ControlFlow<()>,
{
    let mut walker = Walker {
        option,
        visitor: &mut visitor,
    };
    let mut path = GroupPath::root();
    walker.group(&document.blocks, None, &mut path, None, false)
}

struct Walker<'v, F> {
    option: IterateSelectionsOption,
    visitor: &'v mut F,
}

impl<F> Walker<'_, F>
where
    F: FnMut(&SelectionVisit<'_>) -> ControlFlow<()>,
{
    fn emit(
        &mut self,
        path: &GroupPath,
        table_context: Option<&TableSelectionContext>,
        unit: SelectedUnit<'_>,
    ) -> ControlFlow<()> {
        (self.visitor)(&SelectionVisit {
            path,
            table_context,
            unit,
        })
    }

    fn group(
        &mut self,
        blocks: &[Block],
        list_item: Option<&ListItem>,
        path: &mut GroupPath,
        table_context: Option<&TableSelectionContext>,
        treat_all_as_selected: bool,
    ) -> ControlFlow<()> {
        let mut has_selected_segment = false;
        let mut has_unselected_segment = false;

        for (index, block) in blocks.iter().enumerate() {
            match block {
                Block::BlockGroup(BlockGroup::General(general)) => {
                    let is_selected = treat_all_as_selected || general.is_selected;
                    let policy = self.option.content_under_selected_general_element;
                    let handle_content =
                        !is_selected || policy != GeneralElementPolicy::GeneralElementOnly;
                    let handle_element = is_selected
                        && (policy != GeneralElementPolicy::ContentOnly || general.blocks.is_empty());

                    if handle_content {
                        path.push(GroupStep::Block(index));
                        let flow = self.group(&general.blocks, None, path, table_context, is_selected);
                        path.pop();
                        flow?;
                    }
                    if handle_element {
                        self.emit(path, table_context, SelectedUnit::Block { block, index })?;
                    }
                }
                Block::BlockGroup(group) => {
                    let item = match group {
                        BlockGroup::ListItem(item) => Some(item),
                        _ => None,
                    };
                    path.push(GroupStep::Block(index));
                    let flow = self.group(
                        group.blocks(),
                        item,
                        path,
                        table_context,
                        treat_all_as_selected,
                    );
                    path.pop();
                    flow?;
                }
                Block::Table(table) => {
                    let whole = is_whole_table_selected(table);
                    if whole
                        && self.option.content_under_selected_table_cell
                            != TableCellContentPolicy::Include
                    {
                        self.emit(path, table_context, SelectedUnit::Block { block, index })?;
                        continue;
                    }
                    self.table(table, index, whole, path, treat_all_as_selected)?;
                }
                Block::Paragraph(paragraph) => {
                    let segments: Vec<usize> = paragraph
                        .segments
                        .iter()
                        .enumerate()
                        .filter(|(_, segment)| treat_all_as_selected || segment.is_selected())
                        .map(|(idx, _)| idx)
                        .collect();
                    has_selected_segment |= !segments.is_empty();
                    has_unselected_segment |= segments.len() < paragraph.segments.len();
                    if !segments.is_empty() {
                        self.emit(
                            path,
                            table_context,
                            SelectedUnit::Segments {
                                paragraph,
                                index,
                                segments,
                            },
                        )?;
                    }
                }
                Block::Divider(divider) => {
                    if treat_all_as_selected || divider.is_selected {
                        self.emit(path, table_context, SelectedUnit::Block { block, index })?;
                    }
                }
                Block::Entity(entity) => {
                    if treat_all_as_selected || entity.is_selected {
                        self.emit(path, table_context, SelectedUnit::Block { block, index })?;
                    }
                }
            }
        }

        if let Some(item) = list_item {
            let policy = self.option.include_list_format_holder;
            if policy != ListFormatHolderPolicy::Never
                && has_selected_segment
                && (!has_unselected_segment || policy == ListFormatHolderPolicy::AnySegment)
            {
                self.emit(path, table_context, SelectedUnit::ListFormatHolder { item })?;
            }
        }

        ControlFlow::Continue(())
    }

    fn table(
        &mut self,
        table: &Table,
        index: usize,
        is_whole_table_selected: bool,
        path: &mut GroupPath,
        treat_all_as_selected: bool,
    ) -> ControlFlow<()> {
        let address = BlockAddress::new(path.clone(), index);
        for (row_index, row) in table.rows.iter().enumerate() {
            for (col_index, cell) in row.cells.iter().enumerate() {
                let context = TableSelectionContext {
                    table: address.clone(),
                    row_index,
                    col_index,
                    is_whole_table_selected,
                };
                path.push(GroupStep::Cell {
                    table: index,
                    row: row_index,
                    col: col_index,
                });
                let flow = self.cell(cell, path, &context, treat_all_as_selected);
                path.pop();
                flow?;
            }
        }
        ControlFlow::Continue(())
    }

    fn cell(
        &mut self,
        cell: &TableCell,
        path: &mut GroupPath,
        context: &TableSelectionContext,
        treat_all_as_selected: bool,
    ) -> ControlFlow<()> {
        if cell.is_selected {
            self.emit(path, Some(context), SelectedUnit::TableCell { cell })?;
        }
        if !cell.is_selected
            || self.option.content_under_selected_table_cell
                != TableCellContentPolicy::IgnoreForTableOrCell
        {
            self.group(
                &cell.blocks,
                None,
                path,
                Some(context),
                treat_all_as_selected || cell.is_selected,
            )?;
        }
        ControlFlow::Continue(())
    }
}

// ============================================================================
// Owned selection records
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SelectionTarget {
    Segments {
        paragraph: BlockAddress,
        segments: Vec<usize>,
    },
    /// The record's path is the list item.
    ListFormatHolder,
    Block(BlockAddress),
    /// The record's path is the cell.
    TableCell,
}

/// A visit detached from the tree, for passes that mutate afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectionRecord {
    pub path: GroupPath,
    pub table_context: Option<TableSelectionContext>,
    pub target: SelectionTarget,
}

impl SelectionRecord {
    fn from_visit(visit: &SelectionVisit<'_>) -> Self {
        let target = match &visit.unit {
            SelectedUnit::Segments {
                index, segments, ..
            } => SelectionTarget::Segments {
                paragraph: BlockAddress::new(visit.path.clone(), *index),
                segments: segments.clone(),
            },
            SelectedUnit::ListFormatHolder { .. } => SelectionTarget::ListFormatHolder,
            SelectedUnit::Block { index, .. } => {
                SelectionTarget::Block(BlockAddress::new(visit.path.clone(), *index))
            }
            SelectedUnit::TableCell { .. } => SelectionTarget::TableCell,
        };
        Self {
            path: visit.path.clone(),
            table_context: visit.table_context.cloned(),
            target,
        }
    }
}

pub fn collect_selections(
    document: &ContentModelDocument,
    option: IterateSelectionsOption,
) -> Vec<SelectionRecord> {
    let mut records = Vec::new();
    let _ = iterate_selections(document, option, |visit| {
        records.push(SelectionRecord::from_visit(visit));
        ControlFlow::Continue(())
    });
    records
}

pub fn has_selection(document: &ContentModelDocument) -> bool {
    iterate_selections(document, IterateSelectionsOption::default(), |_| {
        ControlFlow::Break(())
    })
    .is_break()
}

/// Selected segments in document order; list format holders are not included.
pub fn get_selected_segments(document: &ContentModelDocument) -> Vec<&Segment> {
    let mut addresses = Vec::new();
    let _ = iterate_selections(document, IterateSelectionsOption::default(), |visit| {
        if let SelectedUnit::Segments {
            index, segments, ..
        } = &visit.unit
        {
            addresses.push((BlockAddress::new(visit.path.clone(), *index), segments.clone()));
        }
        ControlFlow::Continue(())
    });

    addresses
        .into_iter()
        .filter_map(|(address, segments)| {
            let paragraph = crate::model::paragraph_ref(document, &address)?;
            Some(
                segments
                    .into_iter()
                    .filter_map(|idx| paragraph.segments.get(idx))
                    .collect::<Vec<_>>(),
            )
        })
        .flatten()
        .collect()
}

/// Paragraphs holding at least one selected segment, in document order.
pub fn get_selected_paragraphs(document: &ContentModelDocument) -> Vec<BlockAddress> {
    let mut paragraphs: Vec<BlockAddress> = Vec::new();
    let _ = iterate_selections(document, IterateSelectionsOption::default(), |visit| {
        if let SelectedUnit::Segments { index, .. } = &visit.unit {
            let address = BlockAddress::new(visit.path.clone(), *index);
            if paragraphs.last() != Some(&address) {
                paragraphs.push(address);
            }
        }
        ControlFlow::Continue(())
    });
    paragraphs
}

// ============================================================================
// Writing selection state
// ============================================================================

/// A segment position inside the model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelPosition {
    pub paragraph: BlockAddress,
    pub segment: usize,
}

impl ModelPosition {
    pub fn new(paragraph: BlockAddress, segment: usize) -> Self {
        Self { paragraph, segment }
    }
}

pub fn clear_selection(document: &mut ContentModelDocument) {
    let mut path = GroupPath::root();
    let mut state = SelectionWriter::clear();
    state.blocks(&mut document.blocks, &mut path);
}

/// Marks the segments from `start` to `end` (both inclusive, `start` first in
/// document order) selected and everything else unselected.
pub fn set_selection(document: &mut ContentModelDocument, start: &ModelPosition, end: &ModelPosition) {
    let mut path = GroupPath::root();
    let mut state = SelectionWriter {
        range: Some((start, end)),
        inside: false,
    };
    state.blocks(&mut document.blocks, &mut path);
}

struct SelectionWriter<'p> {
    range: Option<(&'p ModelPosition, &'p ModelPosition)>,
    inside: bool,
}

impl SelectionWriter<'_> {
    fn clear() -> Self {
        Self {
            range: None,
            inside: false,
        }
    }

    fn blocks(&mut self, blocks: &mut [Block], path: &mut GroupPath) {
        for (index, block) in blocks.iter_mut().enumerate() {
            match block {
                Block::Paragraph(paragraph) => {
                    for (seg_idx, segment) in paragraph.segments.iter_mut().enumerate() {
                        let is_start = is_at(self.range.map(|(start, _)| start), path, index, seg_idx);
                        let is_end = is_at(self.range.map(|(_, end)| end), path, index, seg_idx);
                        if is_start {
                            self.inside = true;
                        }
                        segment.set_selected(self.inside);
                        if let Segment::Image(image) = segment {
                            image.is_selected_as_image_selection = false;
                        }
                        if is_end {
                            self.inside = false;
                        }
                    }
                }
                Block::Table(table) => {
                    for (row_index, row) in table.rows.iter_mut().enumerate() {
                        for (col_index, cell) in row.cells.iter_mut().enumerate() {
                            cell.is_selected = false;
                            path.push(GroupStep::Cell {
                                table: index,
                                row: row_index,
                                col: col_index,
                            });
                            self.blocks(&mut cell.blocks, path);
                            path.pop();
                        }
                    }
                }
                Block::Divider(divider) => divider.is_selected = self.inside,
                Block::Entity(entity) => entity.is_selected = self.inside,
                Block::BlockGroup(group) => {
                    match group {
                        BlockGroup::ListItem(item) => item.format_holder.is_selected = false,
                        BlockGroup::General(general) => general.is_selected = false,
                        BlockGroup::FormatContainer(_) => {}
                    }
                    path.push(GroupStep::Block(index));
                    self.blocks(group.blocks_mut(), path);
                    path.pop();
                }
            }
        }
    }
}

fn is_at(position: Option<&ModelPosition>, path: &GroupPath, index: usize, segment: usize) -> bool {
    position.is_some_and(|position| {
        position.segment == segment && position.paragraph.index == index && &position.paragraph.group == path
    })
}

pub fn select_table_cells(table: &mut Table, rect: &CellRect) {
    for (row_index, row) in table.rows.iter_mut().enumerate() {
        for (col_index, cell) in row.cells.iter_mut().enumerate() {
            cell.is_selected = (rect.first_row..=rect.last_row).contains(&row_index)
                && (rect.first_column..=rect.last_column).contains(&col_index);
        }
    }
}

/// Bounding rectangle of the selected cells.
pub fn get_selected_cells(table: &Table) -> Option<CellRect> {
    let mut rect: Option<CellRect> = None;
    for (row_index, row) in table.rows.iter().enumerate() {
        for (col_index, cell) in row.cells.iter().enumerate() {
            if !cell.is_selected {
                continue;
            }
            rect = Some(match rect {
                None => CellRect {
                    first_row: row_index,
                    first_column: col_index,
                    last_row: row_index,
                    last_column: col_index,
                },
                Some(rect) => CellRect {
                    first_row: rect.first_row.min(row_index),
                    first_column: rect.first_column.min(col_index),
                    last_row: rect.last_row.max(row_index),
                    last_column: rect.last_column.max(col_index),
                },
            });
        }
    }
    rect
}

#[cfg(test)]
#[path = "selection_tests.rs"]
mod selection_tests;
