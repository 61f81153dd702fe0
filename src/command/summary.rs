use serde::{Deserialize, Serialize};

use crate::Result;
use crate::tree::{DocumentTree, NodeKey, NodeKind};

/// One direct child of the root as handed to an agent, which refers back
/// to it by `key` in later commands.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSummary {
    pub key: String,
    #[serde(rename = "type")]
    pub node_type: String,
    pub text_content: String,
    /// `h1`..`h6` for headings, the list type for lists, the language for
    /// code blocks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    pub child_count: usize,
    pub parent: Option<String>,
    pub prev: Option<String>,
    pub next: Option<String>,
}

impl NodeSummary {
    pub fn of(tree: &DocumentTree, key: NodeKey) -> Option<Self> {
        let kind = tree.kind(key)?;
        let tag = match kind {
            NodeKind::Heading(level) => Some(level.tag()),
            NodeKind::List { list_type, .. } => Some(list_type.label().to_string()),
            NodeKind::Code { language } => language.clone(),
            _ => None,
        };
        Some(Self {
            key: key.to_string(),
            node_type: kind.type_name().to_string(),
            text_content: tree.text_content(key),
            tag,
            child_count: tree.children_of(key).len(),
            parent: tree.parent_of(key).map(|parent| parent.to_string()),
            prev: tree.previous_sibling(key).map(|prev| prev.to_string()),
            next: tree.next_sibling(key).map(|next| next.to_string()),
        })
    }
}

pub fn summarize_root_children(tree: &DocumentTree) -> Vec<NodeSummary> {
    tree.children_of(tree.root())
        .iter()
        .filter_map(|key| NodeSummary::of(tree, *key))
        .collect()
}

/// The root-children summary serialized as a JSON array.
pub fn root_children_json(tree: &DocumentTree) -> Result<String> {
    Ok(serde_json::to_string(&summarize_root_children(tree))?)
}
