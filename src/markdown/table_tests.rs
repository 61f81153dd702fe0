use super::*;
use crate::markdown::{apply_block_shortcut, export_markdown, parse_document};

fn import(source: &str) -> DocumentTree {
    parse_document(source, &ImportOptions::default()).unwrap()
}

fn tables(tree: &DocumentTree) -> Vec<NodeKey> {
    tree.children_of(tree.root())
        .iter()
        .copied()
        .filter(|key| is_table(tree, *key))
        .collect()
}

fn row_texts(tree: &DocumentTree, table: NodeKey) -> Vec<Vec<String>> {
    tree.children_of(table)
        .iter()
        .map(|row| {
            tree.children_of(*row)
                .iter()
                .map(|cell| tree.text_content(*cell))
                .collect()
        })
        .collect()
}

fn header_flags(tree: &DocumentTree, table: NodeKey) -> Vec<bool> {
    tree.children_of(table)
        .iter()
        .map(|row| is_header_row(tree, *row))
        .collect()
}

#[test]
fn row_followed_by_divider_becomes_header() {
    let tree = import("| a | b |\n| - | - |");
    let found = tables(&tree);
    assert_eq!(found.len(), 1);
    assert_eq!(tree.children_of(tree.root()).len(), 1);
    assert_eq!(row_texts(&tree, found[0]), vec![vec!["a", "b"]]);
    assert_eq!(header_flags(&tree, found[0]), vec![true]);
}

#[test]
fn consecutive_rows_share_one_table() {
    let tree = import("| a | b |\n| c | d |\n| e | f |");
    let found = tables(&tree);
    assert_eq!(found.len(), 1);
    assert_eq!(tree.children_of(found[0]).len(), 3);
    assert_eq!(header_flags(&tree, found[0]), vec![false, false, false]);
}

#[test]
fn divider_marks_the_row_right_above_it() {
    let tree = import("| a |\n| b |\n| --- |\n| c |");
    let found = tables(&tree);
    assert_eq!(found.len(), 1);
    assert_eq!(header_flags(&tree, found[0]), vec![false, true, false]);
}

#[test]
fn different_column_counts_start_a_new_table() {
    let tree = import("| a | b |\n| c |");
    let found = tables(&tree);
    assert_eq!(found.len(), 2);
    assert_eq!(column_count(&tree, found[0]), 2);
    assert_eq!(column_count(&tree, found[1]), 1);
}

#[test]
fn blank_line_separates_tables() {
    let tree = import("| a |\n\n| b |");
    assert_eq!(tables(&tree).len(), 2);
    assert_eq!(tree.children_of(tree.root()).len(), 2);
}

#[test]
fn divider_without_table_stays_text() {
    let tree = import("| --- | --- |");
    let root_children = tree.children_of(tree.root());
    assert_eq!(root_children.len(), 1);
    assert!(matches!(tree.kind(root_children[0]), Some(NodeKind::Paragraph)));
    assert_eq!(tree.text_content(root_children[0]), "| --- | --- |");
}

#[test]
fn cells_are_parsed_as_markdown() {
    let tree = import("| **bold** | one\\ntwo |  |");
    let table = tables(&tree)[0];
    let row = tree.first_child(table).unwrap();
    let cells = tree.children_of(row);
    assert_eq!(cells.len(), 3);

    let bold_paragraph = tree.first_child(cells[0]).unwrap();
    let bold_text = tree.first_child(bold_paragraph).unwrap();
    assert!(
        tree.text(bold_text)
            .unwrap()
            .format
            .contains(crate::tree::TextFormat::BOLD)
    );

    assert_eq!(tree.children_of(cells[1]).len(), 2);
    assert_eq!(tree.text_content(cells[1]), "one\n\ntwo");

    assert_eq!(tree.children_of(cells[2]).len(), 1);
    assert!(tree.is_empty_paragraph(tree.first_child(cells[2]).unwrap()));
}

#[test]
fn export_writes_one_divider_after_the_first_header_row() {
    let tree = import("| h1 | h2 |\n| - | - |\n| a | b |\n| --- | --- |\n| c | d |");
    assert_eq!(
        export_markdown(&tree),
        "| h1 | h2 |\n| --- | --- |\n| a | b |\n| c | d |"
    );
}

#[test]
fn export_escapes_newlines_inside_cells() {
    let tree = import("| one\\ntwo | ***\\n |");
    let exported = export_markdown(&tree);
    assert_eq!(exported, "| one\\n\\ntwo | ***\\n |");
    assert_eq!(export_markdown(&import(&exported)), exported);
}

#[test]
fn shortcut_absorbs_raw_rows_above_and_pads_cells() {
    let mut tree = DocumentTree::new();
    let root = tree.root();
    let first = tree.create_text_paragraph("| a |");
    let second = tree.create_text_paragraph("| b | c |");
    let third = tree.create_text_paragraph("| d |");
    tree.append(root, &[first, second, third]).unwrap();

    assert!(apply_block_shortcut(&mut tree, third, &ImportOptions::default()).unwrap());

    let found = tables(&tree);
    assert_eq!(tree.children_of(root), found.as_slice());
    assert_eq!(found.len(), 1);
    assert_eq!(
        row_texts(&tree, found[0]),
        vec![vec!["a", ""], vec!["b", "c"], vec!["d", ""]]
    );
    assert!(!tree.contains(first));
    assert!(!tree.contains(second));
}

#[test]
fn shortcut_row_merges_into_table_above() {
    let mut tree = import("| a | b |\n| - | - |");
    let root = tree.root();
    let table = tables(&tree)[0];
    let typed = tree.create_text_paragraph("| c | d |");
    tree.append(root, &[typed]).unwrap();

    assert!(apply_block_shortcut(&mut tree, typed, &ImportOptions::default()).unwrap());

    assert_eq!(tree.children_of(root), &[table]);
    assert_eq!(
        row_texts(&tree, table),
        vec![vec!["a", "b"], vec!["c", "d"]]
    );
    assert_eq!(header_flags(&tree, table), vec![true, false]);
}

#[test]
fn shortcut_divider_without_table_is_left_alone() {
    let mut tree = DocumentTree::new();
    let root = tree.root();
    let divider = tree.create_text_paragraph("| --- |");
    tree.append(root, &[divider]).unwrap();

    assert!(!apply_block_shortcut(&mut tree, divider, &ImportOptions::default()).unwrap());
    assert_eq!(tree.text_content(divider), "| --- |");
}
