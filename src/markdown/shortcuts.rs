use std::collections::HashSet;

use super::{ImportOptions, classify::classify_line, import::Assembly};
use crate::Result;
use crate::tree::{DocumentTree, NodeKey, NodeKind};

/// Runs the block transformers against a paragraph being edited, the way
/// typing `## ` or `| a | b |` converts a line in place. Only paragraphs made
/// of text qualify. Returns whether the paragraph was transformed.
pub fn apply_block_shortcut(
    tree: &mut DocumentTree,
    paragraph: NodeKey,
    options: &ImportOptions,
) -> Result<bool> {
    if !matches!(tree.kind(paragraph), Some(NodeKind::Paragraph)) {
        return Ok(false);
    }
    let children = tree.children_of(paragraph);
    if children.is_empty() || !children.iter().all(|child| tree.text(*child).is_some()) {
        return Ok(false);
    }

    let line = tree.text_content(paragraph);
    let class = classify_line(&line, options);
    let placeholders = HashSet::new();
    let assembly = Assembly {
        options,
        importing: false,
        placeholders: &placeholders,
    };
    let transformed = assembly.apply(tree, paragraph, &class)?;
    if transformed {
        tracing::debug!(paragraph = %paragraph, line = %line, "applied block shortcut");
    }
    Ok(transformed)
}
