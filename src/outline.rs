//! Plain-text outline of a document: one line per block with its key,
//! type and a preview of its text, nested containers indented below.

use unicode_width::UnicodeWidthChar;

use crate::markdown::nested_list;
use crate::tree::{DocumentTree, NodeKey, NodeKind};

pub const DEFAULT_OUTLINE_WIDTH: usize = 80;

const INDENT: &str = "  ";
const ELLIPSIS: char = '…';

/// Renders the blocks below the root, every line at most `width` columns.
pub fn render_outline(tree: &DocumentTree, width: usize) -> String {
    let mut lines = Vec::new();
    for child in tree.children_of(tree.root()) {
        outline_node(tree, *child, 0, width, &mut lines);
    }
    lines.join("\n")
}

fn outline_node(
    tree: &DocumentTree,
    key: NodeKey,
    depth: usize,
    width: usize,
    lines: &mut Vec<String>,
) {
    let Some(kind) = tree.kind(key) else {
        return;
    };
    let is_item = matches!(kind, NodeKind::ListItem { .. });
    if let Some(nested) = nested_list(tree, key).filter(|_| is_item) {
        outline_node(tree, nested, depth + 1, width, lines);
        return;
    }
    let label = match kind {
        NodeKind::Heading(level) => level.tag(),
        NodeKind::List { list_type, .. } => format!("list:{}", list_type.label()),
        NodeKind::ListItem { checked: Some(true) } => "item [x]".to_string(),
        NodeKind::ListItem { checked: Some(false) } => "item [ ]".to_string(),
        NodeKind::ListItem { checked: None } => "item".to_string(),
        NodeKind::TableCell { header: true } => "cell:header".to_string(),
        NodeKind::Code {
            language: Some(language),
        } => format!("code:{language}"),
        other => other.type_name().to_string(),
    };
    let prefix = format!("{}{label} #{key}", INDENT.repeat(depth));

    let nested: Vec<NodeKey> = match kind {
        NodeKind::List { .. } | NodeKind::Table | NodeKind::TableRow | NodeKind::TableCell { .. } => {
            tree.children_of(key).to_vec()
        }
        NodeKind::ListItem { .. } => tree
            .children_of(key)
            .iter()
            .copied()
            .filter(|child| matches!(tree.kind(*child), Some(NodeKind::List { .. })))
            .collect(),
        _ => Vec::new(),
    };

    let preview = match kind {
        NodeKind::List { .. } | NodeKind::Table | NodeKind::TableRow => String::new(),
        NodeKind::TableCell { .. } => String::new(),
        NodeKind::ListItem { .. } => tree
            .children_of(key)
            .iter()
            .filter(|child| !nested.contains(child))
            .map(|child| tree.text_content(*child))
            .collect(),
        _ => tree.text_content(key),
    };
    let preview = preview.replace('\n', " ");
    let line = if preview.is_empty() {
        prefix
    } else {
        format!("{prefix}  {preview}")
    };
    lines.push(truncate_to_width(&line, width));

    for child in nested {
        outline_node(tree, child, depth + 1, width, lines);
    }
}

pub fn display_width(text: &str) -> usize {
    text.chars()
        .map(|ch| UnicodeWidthChar::width(ch).unwrap_or(0))
        .sum()
}

/// Cuts `text` to `max_width` display columns, ending in an ellipsis when
/// anything was dropped.
pub fn truncate_to_width(text: &str, max_width: usize) -> String {
    if display_width(text) <= max_width {
        return text.to_string();
    }
    if max_width == 0 {
        return String::new();
    }
    let target = max_width - 1;
    let mut output = String::new();
    let mut width = 0;
    for ch in text.chars() {
        let ch_width = UnicodeWidthChar::width(ch).unwrap_or(0);
        if width + ch_width > target {
            break;
        }
        width += ch_width;
        output.push(ch);
    }
    output.push(ELLIPSIS);
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::{ImportOptions, parse_document};

    fn outline(source: &str, width: usize) -> Vec<String> {
        let tree = parse_document(source, &ImportOptions::default()).unwrap();
        render_outline(&tree, width)
            .lines()
            .map(|line| {
                // Keys differ between runs; keep the shape only.
                let (head, tail) = line.split_once(" #").unwrap_or((line, ""));
                let tail = tail.trim_start_matches(|ch: char| ch.is_ascii_digit());
                format!("{head}{tail}")
            })
            .collect()
    }

    #[test]
    fn blocks_and_nesting_are_indented() {
        let lines = outline("# Title\n\n- one\n    - [x] done\n\n| a | b |", 80);
        assert_eq!(
            lines,
            vec![
                "h1  Title",
                "list:bullet",
                "  item  one",
                "    list:check",
                "      item [x]  done",
                "table",
                "  tablerow",
                "    tablecell",
                "      paragraph  a",
                "    tablecell",
                "      paragraph  b",
            ]
        );
    }

    #[test]
    fn long_previews_are_cut_by_display_width() {
        let tree = parse_document("漢字漢字漢字漢字", &ImportOptions::default()).unwrap();
        let line = render_outline(&tree, 20);
        assert!(display_width(&line) <= 20);
        assert!(line.ends_with(ELLIPSIS));
    }

    #[test]
    fn truncation_counts_wide_characters() {
        assert_eq!(truncate_to_width("abc", 3), "abc");
        assert_eq!(truncate_to_width("abcdef", 4), "abc…");
        assert_eq!(truncate_to_width("漢字漢字", 5), "漢字…");
        assert_eq!(truncate_to_width("abc", 0), "");
    }
}
