use tracing_test::traced_test;

use super::*;
use crate::tree::NodeKind;

fn root_keys(editor: &Editor) -> Vec<String> {
    editor
        .root_children_summary()
        .into_iter()
        .map(|summary| summary.key)
        .collect()
}

fn insert(content: &str, anchor: &str, position: InsertPosition) -> Command {
    Command::InsertParagraph {
        content: content.to_string(),
        location: InsertLocation {
            anchor_node_key: anchor.to_string(),
            position,
        },
    }
}

fn edit(node_key: &str, old_text: &str, new_text: &str) -> Command {
    Command::EditParagraph {
        node_key: node_key.to_string(),
        old_text: old_text.to_string(),
        new_text: new_text.to_string(),
    }
}

#[test]
fn commands_deserialize_from_agent_json() {
    let json = r#"[
        {"type": "insertParagraph", "content": "hi", "location": {"anchorNodeKey": "7", "position": "before"}},
        {"type": "editParagraph", "nodeKey": "3", "oldText": "a", "newText": "b"}
    ]"#;
    let commands: Vec<Command> = serde_json::from_str(json).unwrap();
    assert_eq!(
        commands,
        vec![insert("hi", "7", InsertPosition::Before), edit("3", "a", "b")]
    );
}

#[test]
fn insert_after_anchor_succeeds() {
    let mut editor = Editor::from_markdown("first\n\nlast").unwrap();
    let keys = root_keys(&editor);

    let outcome = editor
        .execute_command(&insert("middle", &keys[0], InsertPosition::After))
        .unwrap();

    assert!(outcome.is_success());
    assert_eq!(outcome.reason, None);
    assert_eq!(outcome.next_editor_markdown_content, "first\n\nmiddle\n\nlast");
}

#[test]
fn insert_before_anchor_succeeds() {
    let mut editor = Editor::from_markdown("first\n\nlast").unwrap();
    let keys = root_keys(&editor);

    let outcome = editor
        .execute_command(&insert("zeroth", &keys[0], InsertPosition::Before))
        .unwrap();

    assert_eq!(outcome.status, CommandStatus::Success);
    assert_eq!(outcome.next_editor_markdown_content, "zeroth\n\nfirst\n\nlast");
}

#[test]
fn insert_anchored_on_inline_node_uses_its_block() {
    let mut editor = Editor::from_markdown("**bold** text\n\nlast").unwrap();
    let bold = editor.read(|tree, _| tree.text_nodes(tree.root())[0]);

    let outcome = editor
        .execute_command(&insert("after", &bold.to_string(), InsertPosition::After))
        .unwrap();

    assert!(outcome.is_success());
    assert_eq!(
        outcome.next_editor_markdown_content,
        "**bold** text\n\nafter\n\nlast"
    );
}

#[traced_test]
#[test]
fn insert_with_unknown_anchor_appends_and_fails() {
    let mut editor = Editor::from_markdown("first\n\nsecond").unwrap();

    let outcome = editor
        .execute_command(&insert("fallback", "999999999", InsertPosition::Before))
        .unwrap();

    assert_eq!(outcome.status, CommandStatus::Failure);
    assert!(outcome.reason.as_deref().is_some_and(|reason| reason.contains("999999999")));
    assert_eq!(
        outcome.next_editor_markdown_content,
        "first\n\nsecond\n\nfallback"
    );
    let last = editor.read(|tree, _| {
        let last = tree.last_child(tree.root()).unwrap();
        tree.text_content(last)
    });
    assert_eq!(last, "fallback");
    assert!(editor.can_undo());
    assert!(logs_contain("anchor node not found"));
}

#[test]
fn insert_with_unparsable_anchor_also_falls_back() {
    let mut editor = Editor::from_markdown("only").unwrap();
    let outcome = editor
        .execute_command(&insert("tail", "not-a-key", InsertPosition::After))
        .unwrap();
    assert!(!outcome.is_success());
    assert_eq!(outcome.next_editor_markdown_content, "only\n\ntail");
}

#[test]
fn root_is_not_a_valid_anchor() {
    let mut editor = Editor::from_markdown("only").unwrap();
    let root = editor.tree().root().to_string();
    let outcome = editor
        .execute_command(&insert("tail", &root, InsertPosition::Before))
        .unwrap();
    assert!(!outcome.is_success());
    assert_eq!(outcome.next_editor_markdown_content, "only\n\ntail");
}

#[test]
fn edit_replaces_block_with_fresh_paragraph() {
    let mut editor = Editor::from_markdown("## **Old** title\n\nkeep").unwrap();
    let keys = root_keys(&editor);

    let outcome = editor
        .execute_command(&edit(&keys[0], "Old title", "New title"))
        .unwrap();

    assert!(outcome.is_success());
    assert_eq!(outcome.next_editor_markdown_content, "New title\n\nkeep");
    let kinds: Vec<NodeKind> = editor.read(|tree, _| {
        tree.children_of(tree.root())
            .iter()
            .filter_map(|key| tree.kind(*key).cloned())
            .collect()
    });
    assert_eq!(kinds, vec![NodeKind::Paragraph, NodeKind::Paragraph]);
    assert!(!root_keys(&editor).contains(&keys[0]));
}

#[test]
fn edit_inside_a_list_item_only_touches_that_item() {
    let mut editor = Editor::from_markdown("- one\n- **two** too\n    - nested\n- three").unwrap();
    let (one_item, two) = editor.read(|tree, _| {
        let find = |content: &str| {
            tree.text_nodes(tree.root())
                .into_iter()
                .find(|key| tree.text(*key).is_some_and(|data| data.content == content))
                .unwrap()
        };
        (tree.parent_of(find("one")).unwrap(), find("two"))
    });
    let list_key = root_keys(&editor)[0].clone();

    let outcome = editor.execute_command(&edit(&two.to_string(), "two too", "2")).unwrap();
    assert!(outcome.is_success());
    assert_eq!(
        outcome.next_editor_markdown_content,
        "- one\n- 2\n    - nested\n- three"
    );

    let outcome = editor
        .execute_command(&edit(&one_item.to_string(), "one", "1"))
        .unwrap();
    assert!(outcome.is_success());
    assert_eq!(
        outcome.next_editor_markdown_content,
        "- 1\n- 2\n    - nested\n- three"
    );
    assert_eq!(root_keys(&editor), vec![list_key]);
    editor.tree().validate().unwrap();
}

#[test]
fn edit_ignores_stale_old_text() {
    let mut editor = Editor::from_markdown("current").unwrap();
    let keys = root_keys(&editor);
    let outcome = editor
        .execute_command(&edit(&keys[0], "something else", "replaced"))
        .unwrap();
    assert!(outcome.is_success());
    assert_eq!(outcome.next_editor_markdown_content, "replaced");
}

#[traced_test]
#[test]
fn edit_with_unknown_key_changes_nothing() {
    let mut editor = Editor::from_markdown("# Title\n\n| a | b |\n\nbody").unwrap();
    let before = editor.tree().clone();
    let exported = editor.export_markdown();

    let outcome = editor
        .execute_command(&edit("424242424242", "body", "new"))
        .unwrap();

    assert_eq!(outcome.status, CommandStatus::Failure);
    assert!(outcome.reason.is_some());
    assert_eq!(editor.tree(), &before);
    assert_eq!(outcome.next_editor_markdown_content, exported);
    assert!(!editor.can_undo());
    assert!(logs_contain("node to edit not found"));
}

#[test]
fn edit_of_a_removed_node_fails() {
    let mut editor = Editor::from_markdown("one\n\ntwo").unwrap();
    let keys = root_keys(&editor);
    editor.execute_command(&edit(&keys[1], "two", "2")).unwrap();

    let outcome = editor.execute_command(&edit(&keys[1], "2", "again")).unwrap();

    assert!(!outcome.is_success());
    assert_eq!(outcome.next_editor_markdown_content, "one\n\n2");
}

#[test]
fn outcome_carries_root_children_summary() {
    let mut editor = Editor::from_markdown("# Title\n\n- a\n- b").unwrap();
    let keys = root_keys(&editor);
    let outcome = editor
        .execute_command(&insert("text", &keys[1], InsertPosition::After))
        .unwrap();

    let summary: Vec<NodeSummary> =
        serde_json::from_str(&outcome.next_editor_root_children).unwrap();
    assert_eq!(summary.len(), 3);
    assert_eq!(summary[0].node_type, "heading");
    assert_eq!(summary[0].tag.as_deref(), Some("h1"));
    assert_eq!(summary[0].text_content, "Title");
    assert_eq!(summary[0].prev, None);
    assert_eq!(summary[0].next.as_deref(), Some(keys[1].as_str()));
    assert_eq!(summary[1].node_type, "list");
    assert_eq!(summary[1].tag.as_deref(), Some("bullet"));
    assert_eq!(summary[1].child_count, 2);
    assert_eq!(summary[2].node_type, "paragraph");
    assert_eq!(summary[2].next, None);
    let root = editor.tree().root().to_string();
    assert!(summary.iter().all(|node| node.parent.as_deref() == Some(root.as_str())));
}

#[test]
fn outcome_serializes_with_agent_field_names() {
    let mut editor = Editor::from_markdown("x").unwrap();
    let outcome = editor
        .execute_command(&edit("0", "x", "y"))
        .unwrap();
    let value = serde_json::to_value(&outcome).unwrap();
    assert_eq!(value["status"], "failure");
    assert!(value["reason"].is_string());
    assert_eq!(value["nextEditorMarkdownContent"], "x");
    assert!(value["nextEditorRootChildren"].is_string());

    let keys = root_keys(&editor);
    let outcome = editor.execute_command(&edit(&keys[0], "x", "y")).unwrap();
    let value = serde_json::to_value(&outcome).unwrap();
    assert_eq!(value["status"], "success");
    assert!(value.get("reason").is_none());
}

#[test]
fn each_command_is_one_undo_step() {
    let mut editor = Editor::from_markdown("base").unwrap();
    let keys = root_keys(&editor);
    let outcomes = editor
        .execute_commands(&[
            insert("one", &keys[0], InsertPosition::After),
            insert("two", "missing", InsertPosition::After),
        ])
        .unwrap();
    assert_eq!(outcomes.len(), 2);
    assert!(outcomes[0].is_success());
    assert!(!outcomes[1].is_success());

    assert!(editor.undo());
    assert_eq!(editor.export_markdown(), "base\n\none");
    assert!(editor.undo());
    assert_eq!(editor.export_markdown(), "base");
}
