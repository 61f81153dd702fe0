use super::{
    ImportOptions,
    classify::{LineClass, classify_line},
    import::{list_type_of, nested_list},
    inline::export_inline,
    rule::RULE_MARKDOWN,
    table::export_table,
};
use crate::tree::{DocumentTree, ListType, NodeKey, NodeKind};

const LIST_INDENT: &str = "    ";

/// Serializes the whole document.
pub fn export_markdown(tree: &DocumentTree) -> String {
    export_children(tree, tree.root())
}

/// Serializes the blocks held by `container` (the root or a table cell).
/// Blocks are separated by a blank line; an empty paragraph stands for a
/// blank line itself and gets no separator of its own.
pub fn export_children(tree: &DocumentTree, container: NodeKey) -> String {
    let mut output = String::new();
    let mut previous_empty: Option<bool> = None;
    for child in tree.children_of(container) {
        let Some(block) = export_block(tree, *child) else {
            continue;
        };
        let is_empty = tree.is_empty_paragraph(*child);
        if let Some(previous_empty) = previous_empty {
            output.push_str(if previous_empty || is_empty { "\n" } else { "\n\n" });
        }
        output.push_str(&block);
        previous_empty = Some(is_empty);
    }
    output
}

/// Markdown for one top-level block, `None` for nodes that are not blocks.
pub fn export_block(tree: &DocumentTree, key: NodeKey) -> Option<String> {
    let block = match tree.kind(key)? {
        NodeKind::Table => export_table(tree, key),
        NodeKind::HorizontalRule => RULE_MARKDOWN.to_string(),
        NodeKind::Paragraph => escape_paragraph(export_inline(tree, key)),
        NodeKind::Heading(level) => {
            format!("{} {}", "#".repeat(level.get() as usize), export_inline(tree, key))
        }
        NodeKind::Quote => export_inline(tree, key)
            .split('\n')
            .map(|line| format!("> {line}"))
            .collect::<Vec<_>>()
            .join("\n"),
        NodeKind::Code { language } => {
            let content: String = tree
                .children_of(key)
                .iter()
                .filter_map(|child| tree.text(*child))
                .map(|data| data.content.as_str())
                .collect();
            let language = language.as_deref().unwrap_or_default();
            if content.is_empty() {
                format!("```{language}\n```")
            } else {
                format!("```{language}\n{content}\n```")
            }
        }
        NodeKind::List { .. } => {
            let mut lines = Vec::new();
            export_list(tree, key, 0, &mut lines);
            lines.join("\n")
        }
        _ => return None,
    };
    Some(block)
}

/// Keeps a paragraph line from reading back as another block type or
/// losing its edge whitespace.
fn escape_paragraph(line: String) -> String {
    let Some(first) = line.chars().next() else {
        return line;
    };
    let line = match line.chars().next_back() {
        Some(last) if last.is_whitespace() && line.len() > first.len_utf8() => format!(
            "{}{}",
            &line[..line.len() - last.len_utf8()],
            char_reference(last)
        ),
        _ => line,
    };
    if first.is_whitespace() {
        return format!("{}{}", char_reference(first), &line[first.len_utf8()..]);
    }
    match classify_line(&line, &ImportOptions::default()) {
        LineClass::Blank | LineClass::Text(_) => line,
        _ if first.is_ascii_digit() => {
            let digits = line
                .find(|ch: char| !ch.is_ascii_digit())
                .unwrap_or(line.len());
            format!("{}\\{}", &line[..digits], &line[digits..])
        }
        _ => format!("\\{line}"),
    }
}

fn char_reference(ch: char) -> String {
    format!("&#{};", ch as u32)
}

fn export_list(tree: &DocumentTree, list: NodeKey, depth: usize, lines: &mut Vec<String>) {
    let Some(NodeKind::List { list_type, start }) = tree.kind(list) else {
        return;
    };
    let indent = LIST_INDENT.repeat(depth);
    let mut index = 0;
    for item in tree.children_of(list) {
        if let Some(nested) = nested_list(tree, *item) {
            export_list(tree, nested, depth + 1, lines);
            continue;
        }
        let prefix = match list_type {
            ListType::Bullet => "- ".to_string(),
            ListType::Number => format!("{}. ", *start as usize + index),
            ListType::Check => {
                let checked = matches!(
                    tree.kind(*item),
                    Some(NodeKind::ListItem {
                        checked: Some(true)
                    })
                );
                if checked { "- [x] " } else { "- [ ] " }.to_string()
            }
        };
        lines.push(format!("{indent}{prefix}{}", export_inline(tree, *item)));
        index += 1;

        for child in tree.children_of(*item) {
            if list_type_of(tree, *child).is_some() {
                export_list(tree, *child, depth + 1, lines);
            }
        }
    }
}
