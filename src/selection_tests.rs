use std::ops::ControlFlow;

use pretty_assertions::assert_eq;

use super::*;
use crate::dom::NodeId;
use crate::testing::{
    cell, divider, doc, general_block, list_item, marker, paragraph, quote, selected_cell,
    selected_entity_block, selected_text, table, text,
};

fn all(document: &ContentModelDocument) -> Vec<SelectionRecord> {
    collect_selections(document, IterateSelectionsOption::default())
}

fn with(option: IterateSelectionsOption, document: &ContentModelDocument) -> Vec<SelectionRecord> {
    collect_selections(document, option)
}

fn segments_at(group: GroupPath, index: usize, segments: Vec<usize>) -> SelectionTarget {
    SelectionTarget::Segments {
        paragraph: BlockAddress::new(group, index),
        segments,
    }
}

#[test]
fn unselected_model_yields_nothing() {
    let document = doc(vec![paragraph(vec![text("a")]), divider(false)]);
    assert!(all(&document).is_empty());
    assert!(!has_selection(&document));
}

#[test]
fn reports_selected_segments_in_document_order() {
    let document = doc(vec![
        paragraph(vec![text("a"), selected_text("b")]),
        paragraph(vec![text("c")]),
        paragraph(vec![selected_text("d"), text("e")]),
    ]);
    let records = all(&document);
    assert_eq!(
        records.iter().map(|r| r.target.clone()).collect::<Vec<_>>(),
        vec![
            segments_at(GroupPath::root(), 0, vec![1]),
            segments_at(GroupPath::root(), 2, vec![0]),
        ]
    );
    assert!(records.iter().all(|r| r.table_context.is_none()));
    assert_eq!(
        get_selected_paragraphs(&document),
        vec![BlockAddress::root(0), BlockAddress::root(2)]
    );
    let selected: Vec<_> = get_selected_segments(&document);
    assert_eq!(selected, vec![&selected_text("b"), &selected_text("d")]);
}

#[test]
fn descends_into_containers() {
    let document = doc(vec![quote(vec![paragraph(vec![marker()])])]);
    let records = all(&document);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].path, BlockAddress::root(0).as_group());
    assert_eq!(
        records[0].target,
        segments_at(BlockAddress::root(0).as_group(), 0, vec![0])
    );
}

#[test]
fn selected_cell_is_reported_before_its_content() {
    let document = doc(vec![table(vec![vec![
        cell(vec![paragraph(vec![text("a")])]),
        selected_cell(vec![paragraph(vec![text("b")])]),
    ]])]);
    let records = all(&document);
    let cell_path = BlockAddress::root(0).cell(0, 1);

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].target, SelectionTarget::TableCell);
    assert_eq!(records[0].path, cell_path);
    // Content of a selected cell counts as selected even without flags.
    assert_eq!(records[1].target, segments_at(cell_path, 0, vec![0]));

    let context = records[1].table_context.as_ref().unwrap();
    assert_eq!(context.table, BlockAddress::root(0));
    assert_eq!((context.row_index, context.col_index), (0, 1));
    assert!(!context.is_whole_table_selected);
}

#[test]
fn whole_table_can_be_reported_as_one_block() {
    let document = doc(vec![table(vec![vec![
        selected_cell(vec![paragraph(vec![text("a")])]),
        selected_cell(vec![paragraph(vec![text("b")])]),
    ]])]);

    let included = all(&document);
    assert_eq!(included.len(), 4);
    assert!(
        included
            .iter()
            .all(|r| r.table_context.as_ref().unwrap().is_whole_table_selected)
    );

    let option = IterateSelectionsOption {
        content_under_selected_table_cell: TableCellContentPolicy::IgnoreForTable,
        ..Default::default()
    };
    assert_eq!(
        with(option, &document),
        vec![SelectionRecord {
            path: GroupPath::root(),
            table_context: None,
            target: SelectionTarget::Block(BlockAddress::root(0)),
        }]
    );
}

#[test]
fn ignore_for_table_or_cell_skips_cell_content() {
    let document = doc(vec![table(vec![vec![
        cell(vec![paragraph(vec![selected_text("a")])]),
        selected_cell(vec![paragraph(vec![text("b")])]),
    ]])]);
    let option = IterateSelectionsOption {
        content_under_selected_table_cell: TableCellContentPolicy::IgnoreForTableOrCell,
        ..Default::default()
    };
    let targets: Vec<_> = with(option, &document).into_iter().map(|r| r.target).collect();
    assert_eq!(
        targets,
        vec![
            segments_at(BlockAddress::root(0).cell(0, 0), 0, vec![0]),
            SelectionTarget::TableCell,
        ]
    );
}

#[test]
fn list_format_holder_follows_policy() {
    let fully = doc(vec![list_item(vec![paragraph(vec![selected_text("a")])])]);
    let partly = doc(vec![list_item(vec![paragraph(vec![
        text("a"),
        selected_text("b"),
    ])])]);
    let holder = |records: &[SelectionRecord]| {
        records
            .iter()
            .any(|r| r.target == SelectionTarget::ListFormatHolder)
    };

    let records = all(&fully);
    assert!(holder(&records));
    // Reported after the item's content, with the item as path.
    assert_eq!(records.last().unwrap().path, BlockAddress::root(0).as_group());
    assert!(!holder(&all(&partly)));

    let any = IterateSelectionsOption {
        include_list_format_holder: ListFormatHolderPolicy::AnySegment,
        ..Default::default()
    };
    assert!(holder(&with(any, &partly)));

    let never = IterateSelectionsOption {
        include_list_format_holder: ListFormatHolderPolicy::Never,
        ..Default::default()
    };
    assert!(!holder(&with(never, &fully)));
}

#[test]
fn general_block_policies() {
    let document = doc(vec![general_block(
        NodeId(5),
        vec![paragraph(vec![text("inside")])],
        true,
    )]);
    let element = SelectionTarget::Block(BlockAddress::root(0));
    let content = segments_at(BlockAddress::root(0).as_group(), 0, vec![0]);
    let targets = |policy| {
        with(
            IterateSelectionsOption {
                content_under_selected_general_element: policy,
                ..Default::default()
            },
            &document,
        )
        .into_iter()
        .map(|r| r.target)
        .collect::<Vec<_>>()
    };

    assert_eq!(targets(GeneralElementPolicy::ContentOnly), vec![content.clone()]);
    assert_eq!(
        targets(GeneralElementPolicy::GeneralElementOnly),
        vec![element.clone()]
    );
    assert_eq!(targets(GeneralElementPolicy::Both), vec![content, element]);
}

#[test]
fn empty_selected_general_block_is_reported_as_element() {
    let document = doc(vec![general_block(NodeId(5), vec![], true)]);
    assert_eq!(
        all(&document)[0].target,
        SelectionTarget::Block(BlockAddress::root(0))
    );
}

#[test]
fn selected_atoms_are_blocks() {
    let document = doc(vec![divider(true), selected_entity_block(NodeId(1), "E")]);
    let targets: Vec<_> = all(&document).into_iter().map(|r| r.target).collect();
    assert_eq!(
        targets,
        vec![
            SelectionTarget::Block(BlockAddress::root(0)),
            SelectionTarget::Block(BlockAddress::root(1)),
        ]
    );
}

#[test]
fn visitor_can_stop_early() {
    let document = doc(vec![
        paragraph(vec![selected_text("a")]),
        paragraph(vec![selected_text("b")]),
    ]);
    let mut visits = 0;
    let flow = iterate_selections(&document, IterateSelectionsOption::default(), |_| {
        visits += 1;
        ControlFlow::Break(())
    });
    assert!(flow.is_break());
    assert_eq!(visits, 1);
}

#[test]
fn set_selection_marks_range_across_groups() {
    let mut document = doc(vec![
        paragraph(vec![text("a"), text("b")]),
        quote(vec![paragraph(vec![text("c")])]),
        divider(false),
        paragraph(vec![text("d"), text("e")]),
    ]);
    set_selection(
        &mut document,
        &ModelPosition::new(BlockAddress::root(0), 1),
        &ModelPosition::new(BlockAddress::root(3), 0),
    );
    let selected: Vec<_> = get_selected_segments(&document);
    assert_eq!(
        selected,
        vec![&selected_text("b"), &selected_text("c"), &selected_text("d")]
    );
    let Block::Divider(divider) = &document.blocks[2] else {
        panic!("expected divider");
    };
    assert!(divider.is_selected);

    clear_selection(&mut document);
    assert!(!has_selection(&document));
}

#[test]
fn table_cell_rectangle_round_trip() {
    let Block::Table(mut table) = table(vec![
        vec![cell(vec![]), cell(vec![]), cell(vec![])],
        vec![cell(vec![]), cell(vec![]), cell(vec![])],
    ]) else {
        unreachable!()
    };
    let rect = CellRect {
        first_row: 0,
        first_column: 1,
        last_row: 1,
        last_column: 2,
    };
    select_table_cells(&mut table, &rect);
    assert!(!table.rows[0].cells[0].is_selected);
    assert!(table.rows[1].cells[2].is_selected);
    assert_eq!(get_selected_cells(&table), Some(rect));
    assert!(!is_whole_table_selected(&table));

    select_table_cells(
        &mut table,
        &CellRect {
            first_row: 0,
            first_column: 0,
            last_row: 1,
            last_column: 2,
        },
    );
    assert!(is_whole_table_selected(&table));
}
