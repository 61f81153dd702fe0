use super::*;
use crate::toolbar::{BlockType, FontSizeStep};
use crate::tree::{FormatFlag, NodeKey, NodeKind, Point};

fn text_key(editor: &Editor, content: &str) -> NodeKey {
    editor
        .read(|tree, _| {
            tree.text_nodes(tree.root())
                .into_iter()
                .find(|key| tree.text(*key).is_some_and(|data| data.content == content))
        })
        .unwrap_or_else(|| panic!("no text node {content:?}"))
}

fn select(editor: &mut Editor, from: (&str, usize), to: (&str, usize)) {
    let anchor = Point::new(text_key(editor, from.0), from.1);
    let focus = Point::new(text_key(editor, to.0), to.1);
    editor.set_selection(Some(Selection::new(anchor, focus)));
}

fn caret(editor: &mut Editor, content: &str, offset: usize) {
    let point = Point::new(text_key(editor, content), offset);
    editor.set_selection(Some(Selection::collapsed(point)));
}

fn root_kinds(editor: &Editor) -> Vec<&'static str> {
    editor.read(|tree, _| {
        tree.children_of(tree.root())
            .iter()
            .filter_map(|key| tree.kind(*key).map(NodeKind::type_name))
            .collect()
    })
}

#[test]
fn bold_applies_to_part_of_a_text_node() {
    let mut editor = Editor::from_markdown("hello world").unwrap();
    select(&mut editor, ("hello world", 0), ("hello world", 5));

    assert!(editor.format_text(FormatFlag::Bold).unwrap());

    assert_eq!(editor.export_markdown(), "**hello** world");
    assert!(editor.toolbar_state().is_bold);
    let selected = editor.read(|tree, selection| {
        let selection = selection.unwrap();
        tree.text(selection.anchor.key).map(|data| data.content.clone())
    });
    assert_eq!(selected.as_deref(), Some("hello"));

    assert!(editor.format_text(FormatFlag::Bold).unwrap());
    assert_eq!(editor.export_markdown(), "hello world");
    assert!(!editor.toolbar_state().is_bold);
}

#[test]
fn mixed_selection_is_formatted_as_a_whole() {
    let mut editor = Editor::from_markdown("**bold** plain").unwrap();
    select(&mut editor, ("bold", 0), (" plain", 6));
    assert!(!editor.toolbar_state().is_bold);

    editor.format_text(FormatFlag::Bold).unwrap();

    assert_eq!(editor.export_markdown(), "**bold plain**");
}

#[test]
fn backward_selection_keeps_its_direction() {
    let mut editor = Editor::from_markdown("one two three").unwrap();
    select(&mut editor, ("one two three", 7), ("one two three", 4));

    editor.format_text(FormatFlag::Italic).unwrap();

    assert_eq!(editor.export_markdown(), "one _two_ three");
    let backward = editor.read(|tree, selection| selection.unwrap().is_backward(tree));
    assert!(backward);
}

#[test]
fn collapsed_selection_toggles_pending_format() {
    let mut editor = Editor::from_markdown("plain").unwrap();
    caret(&mut editor, "plain", 2);

    editor.format_text(FormatFlag::Italic).unwrap();

    assert_eq!(editor.export_markdown(), "plain");
    assert!(editor.toolbar_state().is_italic);
    assert!(!editor.can_undo());
}

#[test]
fn subscript_and_superscript_exclude_each_other() {
    let mut editor = Editor::from_markdown("x2").unwrap();
    select(&mut editor, ("x2", 1), ("x2", 2));
    editor.format_text(FormatFlag::Superscript).unwrap();

    let two = text_key(&editor, "2");
    let anchor = Point::new(two, 0);
    let focus = Point::new(two, 1);
    editor.set_selection(Some(Selection::new(anchor, focus)));
    editor.format_text(FormatFlag::Subscript).unwrap();

    let format = editor.read(|tree, _| tree.text(two).map(|data| data.format)).unwrap();
    assert!(format.has(FormatFlag::Subscript));
    assert!(!format.has(FormatFlag::Superscript));
}

#[test]
fn font_size_is_clamped_and_stepped() {
    let mut editor = Editor::from_markdown("small big").unwrap();
    select(&mut editor, ("small big", 6), ("small big", 9));

    assert_eq!(editor.set_font_size(100).unwrap(), 72);
    let big = text_key(&editor, "big");
    let style = editor.read(|tree, _| tree.text(big).map(|data| data.style.clone()));
    assert_eq!(style.as_deref(), Some("font-size: 72px;"));
    assert_eq!(editor.toolbar_state().font_size, 72);

    assert_eq!(editor.step_font_size(FontSizeStep::Decrement).unwrap(), 60);
    assert_eq!(editor.toolbar_state().font_size, 60);

    let small = text_key(&editor, "small ");
    let untouched = editor.read(|tree, _| tree.text(small).map(|data| data.style.is_empty()));
    assert_eq!(untouched, Some(true));
}

#[test]
fn headings_quotes_and_code_replace_the_block() {
    let mut editor = Editor::from_markdown("title").unwrap();
    caret(&mut editor, "title", 0);

    editor.set_block_type(BlockType::H2).unwrap();
    assert_eq!(editor.export_markdown(), "## title");
    assert_eq!(editor.toolbar_state().block_type, BlockType::H2);

    editor.set_block_type(BlockType::Quote).unwrap();
    assert_eq!(editor.export_markdown(), "> title");

    editor.set_block_type(BlockType::Code).unwrap();
    assert_eq!(editor.export_markdown(), "```\ntitle\n```");
    assert_eq!(editor.toolbar_state().block_type, BlockType::Code);
    assert!(editor.selection().is_some());
}

#[test]
fn list_conversion_toggles_back_to_paragraphs() {
    let mut editor = Editor::from_markdown("a\nb").unwrap();
    select(&mut editor, ("a", 0), ("b", 1));

    editor.set_block_type(BlockType::Bullet).unwrap();
    assert_eq!(editor.export_markdown(), "- a\n- b");
    assert_eq!(root_kinds(&editor), vec!["list"]);

    editor.set_block_type(BlockType::Bullet).unwrap();
    assert_eq!(editor.export_markdown(), "a\n\nb");
}

#[test]
fn list_type_switches_in_place() {
    let mut editor = Editor::from_markdown("- a\n- b").unwrap();
    caret(&mut editor, "a", 0);

    editor.set_block_type(BlockType::Number).unwrap();
    assert_eq!(editor.export_markdown(), "1. a\n2. b");

    editor.set_block_type(BlockType::Check).unwrap();
    assert_eq!(editor.export_markdown(), "- [ ] a\n- [ ] b");
}

#[test]
fn converted_block_joins_the_list_above() {
    let mut editor = Editor::from_markdown("- a\nb").unwrap();
    caret(&mut editor, "b", 0);

    editor.set_block_type(BlockType::Bullet).unwrap();

    assert_eq!(root_kinds(&editor), vec!["list"]);
    assert_eq!(editor.export_markdown(), "- a\n- b");
}

#[test]
fn link_wraps_and_unwraps_selected_text() {
    let mut editor = Editor::from_markdown("see site").unwrap();
    select(&mut editor, ("see site", 4), ("see site", 8));

    assert!(editor.toggle_link(Some("https://example.com")).unwrap());
    assert_eq!(editor.export_markdown(), "see [site](https://example.com)");
    assert!(editor.toolbar_state().is_link);

    caret(&mut editor, "site", 1);
    editor.toggle_link(Some("https://example.org")).unwrap();
    assert_eq!(editor.export_markdown(), "see [site](https://example.org)");

    editor.toggle_link(None).unwrap();
    assert_eq!(editor.export_markdown(), "see site");
}

#[test]
fn operations_without_selection_do_nothing() {
    let mut editor = Editor::from_markdown("text").unwrap();
    assert!(!editor.format_text(FormatFlag::Bold).unwrap());
    assert!(!editor.set_block_type(BlockType::H1).unwrap());
    assert!(!editor.toggle_link(None).unwrap());
    assert!(!editor.can_undo());
}
