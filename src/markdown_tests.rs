use proptest::prelude::*;

use super::*;
use crate::tree::{DocumentTree, HeadingLevel, ListType, NodeKey, NodeKind, TextFormat};

fn import(source: &str) -> DocumentTree {
    parse_document(source, &ImportOptions::default()).unwrap()
}

fn round_trip(source: &str) -> String {
    export_markdown(&import(source))
}

fn kinds(tree: &DocumentTree) -> Vec<&'static str> {
    tree.children_of(tree.root())
        .iter()
        .filter_map(|key| tree.kind(*key).map(NodeKind::type_name))
        .collect()
}

fn only_block(tree: &DocumentTree) -> NodeKey {
    let children = tree.children_of(tree.root());
    assert_eq!(children.len(), 1, "expected a single block, got {:?}", kinds(tree));
    children[0]
}

#[test]
fn lines_become_separate_paragraphs() {
    let tree = import("one\ntwo");
    assert_eq!(kinds(&tree), vec!["paragraph", "paragraph"]);
    assert_eq!(export_markdown(&tree), "one\n\ntwo");
}

#[test]
fn blank_lines_never_survive() {
    let tree = import("\n\na\n\n\n\nb\n\n");
    assert_eq!(kinds(&tree), vec!["paragraph", "paragraph"]);
    assert!(import("").is_empty());
    assert!(import("\n  \n").is_empty());
}

#[test]
fn headings_keep_their_level() {
    for level in 1..=6u8 {
        let source = format!("{} Title **{level}**", "#".repeat(level as usize));
        let tree = import(&source);
        let heading = only_block(&tree);
        assert_eq!(
            tree.kind(heading),
            Some(&NodeKind::Heading(HeadingLevel::new(level).unwrap()))
        );
        assert_eq!(export_markdown(&tree), source);
    }
}

#[test]
fn consecutive_quote_lines_merge() {
    let tree = import("> first\n> **second**");
    let quote = only_block(&tree);
    assert_eq!(tree.text_content(quote), "first\nsecond");
    assert_eq!(export_markdown(&tree), "> first\n> **second**");

    assert_eq!(kinds(&import("> a\n\n> b")), vec!["quote", "quote"]);
}

#[test]
fn fenced_code_keeps_language_and_body() {
    let source = "```rust\nfn main() {\n    println!(\"**not bold**\");\n}\n```";
    let tree = import(source);
    let code = only_block(&tree);
    assert_eq!(
        tree.kind(code),
        Some(&NodeKind::Code {
            language: Some("rust".to_string())
        })
    );
    assert_eq!(export_markdown(&tree), source);
    assert_eq!(round_trip("```\n```"), "```\n```");
}

#[test]
fn unclosed_fence_consumes_the_rest() {
    let tree = import("```\n# not a heading\n- nor a list");
    let code = only_block(&tree);
    assert_eq!(tree.text_content(code), "# not a heading\n- nor a list");
}

#[test]
fn nested_lists_use_wrapper_items() {
    let source = "- a\n    - b\n        - c\n- d";
    let tree = import(source);
    let list = only_block(&tree);
    let items = tree.children_of(list);
    assert_eq!(items.len(), 3);
    let wrapper = items[1];
    let nested = tree.first_child(wrapper).unwrap();
    assert_eq!(tree.children_of(wrapper), &[nested]);
    assert!(matches!(tree.kind(nested), Some(NodeKind::List { .. })));
    assert_eq!(export_markdown(&tree), source);
}

#[test]
fn numbered_lists_keep_start_and_renumber() {
    let tree = import("3. three\n4. four");
    let list = only_block(&tree);
    assert_eq!(
        tree.kind(list),
        Some(&NodeKind::List {
            list_type: ListType::Number,
            start: 3
        })
    );
    assert_eq!(export_markdown(&tree), "3. three\n4. four");
    assert_eq!(round_trip("1. a\n1. b\n    - c\n1. d"), "1. a\n2. b\n    - c\n3. d");
}

#[test]
fn check_lists_record_state() {
    let tree = import("- [ ] todo\n- [x] done");
    let list = only_block(&tree);
    let states: Vec<Option<bool>> = tree
        .children_of(list)
        .iter()
        .map(|item| match tree.kind(*item) {
            Some(NodeKind::ListItem { checked }) => *checked,
            _ => None,
        })
        .collect();
    assert_eq!(states, vec![Some(false), Some(true)]);
    assert_eq!(export_markdown(&tree), "- [ ] todo\n- [x] done");
}

#[test]
fn list_type_change_starts_a_new_list() {
    let tree = import("- a\n1. b\n- [ ] c");
    assert_eq!(kinds(&tree), vec!["list", "list", "list"]);
    assert_eq!(export_markdown(&tree), "- a\n\n1. b\n\n- [ ] c");
}

#[test]
fn every_rule_form_exports_as_stars() {
    for form in ["---", "***", "___"] {
        let tree = import(&format!("before\n{form}\nafter"));
        assert_eq!(kinds(&tree), vec!["paragraph", "horizontalrule", "paragraph"]);
        assert_eq!(export_markdown(&tree), "before\n\n***\n\nafter");
    }
}

#[test]
fn trailing_rule_keeps_an_empty_paragraph() {
    let tree = import("text\n---\n\n");
    assert_eq!(kinds(&tree), vec!["paragraph", "horizontalrule", "paragraph"]);
    let exported = export_markdown(&tree);
    assert_eq!(exported, "text\n\n***\n");
    assert_eq!(round_trip(&exported), exported);
}

#[test]
fn inline_formatting_survives_import() {
    let tree = import("a **b** [c](https://c.dev) ![d](d.png)");
    let paragraph = only_block(&tree);
    let children = tree.children_of(paragraph);
    assert_eq!(children.len(), 6);
    assert_eq!(
        tree.text(children[1]).map(|data| data.format),
        Some(TextFormat::BOLD)
    );
    assert!(matches!(tree.kind(children[3]), Some(NodeKind::Link { url }) if url == "https://c.dev"));
    assert!(matches!(tree.kind(children[5]), Some(NodeKind::Image(image)) if image.src == "d.png"));
}

#[test]
fn import_replaces_previous_content() {
    let mut tree = import("old content");
    let root = tree.root();
    import_markdown(&mut tree, root, "# new", &ImportOptions::default()).unwrap();
    assert_eq!(kinds(&tree), vec!["heading"]);
    tree.validate().unwrap();
}

#[test]
fn indent_width_is_configurable() {
    let options = ImportOptions { indent_width: 2 };
    let tree = parse_document("- a\n  - b", &options).unwrap();
    assert_eq!(export_markdown(&tree), "- a\n    - b");
}

#[test]
fn block_shortcuts_convert_typed_paragraphs() {
    let cases = [
        ("## Title", "heading"),
        ("> quoted", "quote"),
        ("- item", "list"),
        ("1. item", "list"),
        ("- [x] item", "list"),
        ("```js", "code"),
    ];
    for (typed, expected) in cases {
        let mut tree = DocumentTree::new();
        let root = tree.root();
        let paragraph = tree.create_text_paragraph(typed);
        tree.append(root, &[paragraph]).unwrap();

        assert!(apply_block_shortcut(&mut tree, paragraph, &ImportOptions::default()).unwrap());
        assert_eq!(kinds(&tree), vec![expected], "typed {typed:?}");
    }
}

#[test]
fn block_shortcut_leaves_plain_text_alone() {
    let mut tree = DocumentTree::new();
    let root = tree.root();
    let paragraph = tree.create_text_paragraph("just text");
    tree.append(root, &[paragraph]).unwrap();
    assert!(!apply_block_shortcut(&mut tree, paragraph, &ImportOptions::default()).unwrap());
    assert_eq!(tree.children_of(root), &[paragraph]);
}

#[test]
fn block_shortcut_rule_in_the_middle_replaces_the_paragraph() {
    let mut tree = import("above\n---\nbelow");
    // Import already placed the rule; type a second one before the last block.
    let root = tree.root();
    let last = *tree.children_of(root).last().unwrap();
    let typed = tree.create_text_paragraph("***");
    tree.insert_before(last, typed).unwrap();

    assert!(apply_block_shortcut(&mut tree, typed, &ImportOptions::default()).unwrap());
    assert_eq!(
        kinds(&tree),
        vec!["paragraph", "horizontalrule", "horizontalrule", "paragraph"]
    );
}

#[test]
fn markdown_file_name_defaults_to_untitled() {
    assert_eq!(markdown_file_name("Notes"), "Notes.md");
    assert_eq!(markdown_file_name("  "), "Untitled.md");
}

#[test]
fn markdown_file_name_stays_inside_the_directory() {
    assert_eq!(markdown_file_name("../escape"), "-escape.md");
    assert_eq!(markdown_file_name("a/b\\c"), "a-b-c.md");
    assert_eq!(markdown_file_name(".."), "Untitled.md");
    assert_eq!(markdown_file_name(".hidden"), "hidden.md");
}

#[test]
fn mixed_document_round_trips() {
    let source = "# Plan\n\nSome **bold** and _italic_ text.\n\n> a quote\n> across lines\n\n- one\n    - nested\n- two\n\n| Name | Value |\n| --- | --- |\n| `x` | **1** |\n\n***\n\n```sh\necho hi\n```";
    assert_eq!(round_trip(source), source);
}

#[test]
fn literal_markup_characters_keep_their_meaning() {
    let tree = import("see *notes_* here");
    let paragraph = only_block(&tree);
    let italic = tree.children_of(paragraph)[1];
    assert_eq!(
        tree.text(italic).map(|data| (data.content.as_str(), data.format)),
        Some(("notes_", TextFormat::ITALIC))
    );
    assert_eq!(export_markdown(&tree), r"see _notes\__ here");

    for source in ["see *notes_* here", "*(_*=_", "2 * 3 = 6, a_b and [x]!"] {
        let first = round_trip(source);
        assert_eq!(round_trip(&first), first, "source: {source:?}");
    }
}

#[test]
fn table_cells_escape_literal_markup() {
    let first = round_trip("| a *b_* | c |");
    assert_eq!(first, r"| a _b\__ | c |");
    assert_eq!(round_trip(&first), first);
}

#[test]
fn paragraphs_that_look_like_blocks_stay_paragraphs() {
    let texts = [
        "# not a heading",
        "1. not a list",
        "---",
        "> not a quote",
        "- nor this",
        "  indented",
        "trailing  ",
        "| a | b |",
    ];
    let mut tree = DocumentTree::new();
    let root = tree.root();
    for text in texts {
        let paragraph = tree.create_text_paragraph(text);
        tree.append(root, &[paragraph]).unwrap();
    }

    let exported = export_markdown(&tree);
    assert!(exported.starts_with(r"\# not a heading"), "{exported}");
    assert!(exported.contains(r"1\. not a list"), "{exported}");

    let reimported = import(&exported);
    assert_eq!(kinds(&reimported), vec!["paragraph"; texts.len()]);
    let contents: Vec<String> = reimported
        .children_of(reimported.root())
        .iter()
        .map(|key| reimported.text_content(*key))
        .collect();
    assert_eq!(contents, texts);
    assert_eq!(export_markdown(&reimported), exported);
}

fn word() -> impl Strategy<Value = String> {
    "[a-z]{1,8}"
}

fn inline_line() -> impl Strategy<Value = String> {
    let token = prop_oneof![
        word(),
        word().prop_map(|w| format!("**{w}**")),
        word().prop_map(|w| format!("_{w}_")),
        word().prop_map(|w| format!("*{w}*")),
        word().prop_map(|w| format!("~~{w}~~")),
        word().prop_map(|w| format!("=={w}==")),
        word().prop_map(|w| format!("`{w}`")),
        (word(), word()).prop_map(|(text, url)| format!("[{text}](https://{url}.dev)")),
    ];
    prop::collection::vec(token, 1..4).prop_map(|tokens| tokens.join(" "))
}

fn block_line() -> impl Strategy<Value = String> {
    prop_oneof![
        inline_line(),
        (1..=6usize, inline_line()).prop_map(|(level, text)| format!("{} {text}", "#".repeat(level))),
        inline_line().prop_map(|text| format!("> {text}")),
        inline_line().prop_map(|text| format!("- {text}")),
        inline_line().prop_map(|text| format!("    - {text}")),
        inline_line().prop_map(|text| format!("1. {text}")),
        inline_line().prop_map(|text| format!("- [ ] {text}")),
        (inline_line(), inline_line()).prop_map(|(a, b)| format!("| {a} | {b} |")),
        Just("| --- | --- |".to_string()),
        prop_oneof![Just("---"), Just("***"), Just("___")].prop_map(str::to_string),
        word().prop_map(|w| format!("```\n{w}\n```")),
        Just(String::new()),
    ]
}

fn punctuated_line() -> impl Strategy<Value = String> {
    r"[ab*_~=`\\\[\]()!|#>\- 1.:x<&]{0,12}"
}

proptest! {
    #[test]
    fn punctuation_heavy_sources_export_idempotently(line in punctuated_line()) {
        for source in [format!("x {line}"), line.clone(), format!("| {line} | y |")] {
            let first = round_trip(&source);
            let second = round_trip(&first);
            prop_assert_eq!(first, second, "source: {:?}", source);
        }
    }

    #[test]
    fn plain_text_paragraphs_read_back_unchanged(line in punctuated_line()) {
        prop_assume!(!line.is_empty());
        let mut tree = DocumentTree::new();
        let root = tree.root();
        let paragraph = tree.create_text_paragraph(&line);
        tree.append(root, &[paragraph]).unwrap();

        let reimported = import(&export_markdown(&tree));
        prop_assert_eq!(kinds(&reimported), vec!["paragraph"]);
        prop_assert_eq!(reimported.text_content(only_block(&reimported)), line);
    }

    #[test]
    fn export_is_idempotent_over_imported_trees(
        lines in prop::collection::vec(block_line(), 0..12)
    ) {
        let source = lines.join("\n");
        let first = round_trip(&source);
        let second = round_trip(&first);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn imported_trees_are_structurally_valid(
        lines in prop::collection::vec(block_line(), 0..12)
    ) {
        let tree = import(&lines.join("\n"));
        prop_assert!(tree.validate().is_ok());
    }
}
