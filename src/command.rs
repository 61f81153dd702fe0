//! Structured edits requested by an external agent.
//!
//! Each command runs as one transaction and always produces a
//! [`CommandOutcome`]. A key that no longer resolves is reported through
//! the outcome's status and reason, never as an error: inserting falls back
//! to appending at the end of the document, editing leaves the tree alone.

use serde::{Deserialize, Serialize};

use crate::Result;
use crate::editor::{Editor, Transaction};
use crate::markdown::export_markdown;
use crate::tree::{NodeKey, NodeKind};

mod summary;

pub use summary::{NodeSummary, root_children_json, summarize_root_children};

/// Transaction tag carried by commits made on behalf of an agent.
pub const COMMAND_TAG: &str = "command";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Command {
    #[serde(rename_all = "camelCase")]
    InsertParagraph {
        content: String,
        location: InsertLocation,
    },
    #[serde(rename_all = "camelCase")]
    EditParagraph {
        node_key: String,
        /// Text the agent believes the node holds. Informational only.
        old_text: String,
        new_text: String,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertLocation {
    pub anchor_node_key: String,
    pub position: InsertPosition,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsertPosition {
    Before,
    After,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandStatus {
    Success,
    Failure,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandOutcome {
    pub status: CommandStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub next_editor_markdown_content: String,
    /// JSON array of [`NodeSummary`] records for the root's children.
    pub next_editor_root_children: String,
}

impl CommandOutcome {
    pub fn is_success(&self) -> bool {
        self.status == CommandStatus::Success
    }
}

impl Editor {
    /// Runs `command` in a single transaction and reports the result along
    /// with a fresh export of the document.
    pub fn execute_command(&mut self, command: &Command) -> Result<CommandOutcome> {
        let reason = self.update_tagged(Some(COMMAND_TAG), |tx| match command {
            Command::InsertParagraph { content, location } => {
                insert_paragraph(tx, content, &location.anchor_node_key, location.position)
            }
            Command::EditParagraph {
                node_key,
                old_text,
                new_text,
            } => edit_paragraph(tx, node_key, old_text, new_text),
        })?;

        let (markdown, children) = self.read(|tree, _| {
            let children = root_children_json(tree)?;
            Ok::<_, crate::TreeError>((export_markdown(tree), children))
        })?;
        Ok(CommandOutcome {
            status: match reason {
                Some(_) => CommandStatus::Failure,
                None => CommandStatus::Success,
            },
            reason,
            next_editor_markdown_content: markdown,
            next_editor_root_children: children,
        })
    }

    /// Runs each command in order, one transaction apiece.
    pub fn execute_commands(&mut self, commands: &[Command]) -> Result<Vec<CommandOutcome>> {
        commands
            .iter()
            .map(|command| self.execute_command(command))
            .collect()
    }

    pub fn root_children_summary(&self) -> Vec<NodeSummary> {
        self.read(|tree, _| summarize_root_children(tree))
    }
}

/// Attached, non-root node named by `raw`.
fn resolve(tx: &Transaction, raw: &str) -> Option<NodeKey> {
    let key = raw.parse::<NodeKey>().ok()?;
    (key != tx.root() && tx.contains(key) && tx.is_attached(key)).then_some(key)
}

/// Top-level block holding the node named by `raw`.
fn resolve_block(tx: &Transaction, raw: &str) -> Option<NodeKey> {
    let key = resolve(tx, raw)?;
    tx.find_nearest_block_ancestor(key).ok()
}

/// Returns the failure reason, if any. The paragraph is inserted either way.
fn insert_paragraph(
    tx: &mut Transaction,
    content: &str,
    anchor: &str,
    position: InsertPosition,
) -> Result<Option<String>> {
    let paragraph = tx.create_text_paragraph(content);
    let Some(block) = resolve_block(tx, anchor) else {
        let root = tx.root();
        tx.append(root, &[paragraph])?;
        tracing::warn!(anchor, "anchor node not found, appended paragraph to the document");
        return Ok(Some(format!(
            "anchor node {anchor} not found; the paragraph was appended to the end of the document"
        )));
    };

    match position {
        InsertPosition::Before => tx.insert_before(block, paragraph)?,
        InsertPosition::After => tx.insert_after(block, paragraph)?,
    }
    tracing::debug!(anchor = %block, paragraph = %paragraph, ?position, "inserted paragraph");
    Ok(None)
}

/// Replaces the block with a fresh paragraph. A node inside a list item
/// only has that item's text replaced. A missing node changes nothing.
fn edit_paragraph(
    tx: &mut Transaction,
    node_key: &str,
    old_text: &str,
    new_text: &str,
) -> Result<Option<String>> {
    let Some(block) = resolve_block(tx, node_key) else {
        tracing::warn!(node_key, "node to edit not found, document left unchanged");
        return Ok(Some(format!("node {node_key} not found; nothing was edited")));
    };
    let item = resolve(tx, node_key).and_then(|key| enclosing_list_item(tx, key));
    let target = item.unwrap_or(block);

    let current = tx.text_content(target);
    if current != old_text {
        tracing::debug!(node = %target, expected = old_text, found = %current, "edited node text differs");
    }
    match item {
        Some(item) => {
            replace_item_text(tx, item, new_text)?;
            tracing::debug!(item = %item, "replaced list item text");
        }
        None => {
            let paragraph = tx.create_text_paragraph(new_text);
            tx.replace(block, paragraph, false)?;
            tracing::debug!(node = %block, paragraph = %paragraph, "replaced node");
        }
    }
    Ok(None)
}

/// Nearest list item holding `key`, the node itself included.
fn enclosing_list_item(tx: &Transaction, key: NodeKey) -> Option<NodeKey> {
    std::iter::once(key)
        .chain(tx.ancestors(key))
        .find(|candidate| matches!(tx.kind(*candidate), Some(NodeKind::ListItem { .. })))
}

/// Swaps the inline content of `item` for plain text. Nested lists stay.
fn replace_item_text(tx: &mut Transaction, item: NodeKey, text: &str) -> Result<()> {
    let inline: Vec<NodeKey> = tx
        .children_of(item)
        .iter()
        .copied()
        .filter(|child| tx.kind(*child).is_some_and(NodeKind::is_inline))
        .collect();
    for child in inline {
        tx.remove(child)?;
    }
    if text.is_empty() {
        return Ok(());
    }
    let node = tx.create_text(text);
    match tx.first_child(item) {
        Some(first) => tx.insert_before(first, node),
        None => tx.append(item, &[node]),
    }
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod command_tests;
