use std::{
    collections::{BTreeSet, HashMap},
    fmt,
    num::ParseIntError,
    str::FromStr,
    sync::atomic::{AtomicU64, Ordering},
};

mod inspect;
mod kind;
mod mutate;
mod selection;
pub mod style;

pub use kind::{
    FormatFlag, HeadingLevel, ImageData, ListType, NodeKind, TextData, TextFormat,
};
pub use selection::{Point, Selection, TextRange, is_at_node_end};

static NEXT_KEY: AtomicU64 = AtomicU64::new(1);

/// Process-unique node identity. Keys are never reused, not even across trees.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeKey(u64);

impl NodeKey {
    fn next() -> Self {
        Self(NEXT_KEY.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NodeKey {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(Self)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Node {
    key: NodeKey,
    kind: NodeKind,
    parent: Option<NodeKey>,
    children: Vec<NodeKey>,
}

impl Node {
    pub fn key(&self) -> NodeKey {
        self.key
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn parent(&self) -> Option<NodeKey> {
        self.parent
    }

    pub fn children(&self) -> &[NodeKey] {
        &self.children
    }

    pub fn text(&self) -> Option<&TextData> {
        match &self.kind {
            NodeKind::Text(data) => Some(data),
            _ => None,
        }
    }
}

/// Keys touched since the last commit.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub dirty: BTreeSet<NodeKey>,
    pub removed: BTreeSet<NodeKey>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.dirty.is_empty() && self.removed.is_empty()
    }
}

/// Arena of keyed nodes hanging off a single root.
///
/// Relationships are stored as keys, never as references, so removing a
/// subtree cannot leave anything dangling: a stale key simply stops
/// resolving.
#[derive(Clone, Debug)]
pub struct DocumentTree {
    nodes: HashMap<NodeKey, Node>,
    root: NodeKey,
    changes: ChangeSet,
}

impl DocumentTree {
    pub fn new() -> Self {
        let root = NodeKey::next();
        let mut nodes = HashMap::new();
        nodes.insert(
            root,
            Node {
                key: root,
                kind: NodeKind::Root,
                parent: None,
                children: Vec::new(),
            },
        );
        Self {
            nodes,
            root,
            changes: ChangeSet::default(),
        }
    }

    /// A tree holding one empty paragraph, the state an editor starts from.
    pub fn with_empty_paragraph() -> Self {
        let mut tree = Self::new();
        let paragraph = tree.create_paragraph();
        let root = tree.root();
        tree.attach_fresh(root, paragraph);
        tree.changes = ChangeSet::default();
        tree
    }

    pub fn root(&self) -> NodeKey {
        self.root
    }

    pub fn get(&self, key: NodeKey) -> Option<&Node> {
        self.nodes.get(&key)
    }

    pub fn contains(&self, key: NodeKey) -> bool {
        self.nodes.contains_key(&key)
    }

    pub fn kind(&self, key: NodeKey) -> Option<&NodeKind> {
        self.nodes.get(&key).map(Node::kind)
    }

    pub fn text(&self, key: NodeKey) -> Option<&TextData> {
        self.nodes.get(&key).and_then(Node::text)
    }

    /// Mutable access to a text node's payload; marks the node dirty. The
    /// other payloads change through the typed setters below, which keep
    /// the node's variant.
    pub fn text_mut(&mut self, key: NodeKey) -> crate::Result<&mut TextData> {
        let node = self
            .nodes
            .get_mut(&key)
            .ok_or(crate::TreeError::NodeNotFound(key))?;
        match &mut node.kind {
            NodeKind::Text(data) => {
                self.changes.dirty.insert(key);
                Ok(data)
            }
            _ => Err(crate::TreeError::NotText(key)),
        }
    }

    pub fn set_text_data(&mut self, key: NodeKey, data: TextData) -> crate::Result<()> {
        *self.text_mut(key)? = data;
        Ok(())
    }

    pub fn set_heading_level(&mut self, key: NodeKey, level: HeadingLevel) -> crate::Result<()> {
        self.update_payload(key, "heading", |kind| match kind {
            NodeKind::Heading(current) => {
                *current = level;
                true
            }
            _ => false,
        })
    }

    pub fn set_code_language(
        &mut self,
        key: NodeKey,
        language: Option<String>,
    ) -> crate::Result<()> {
        self.update_payload(key, "code", |kind| match kind {
            NodeKind::Code { language: current } => {
                *current = language;
                true
            }
            _ => false,
        })
    }

    pub fn set_list_type(&mut self, key: NodeKey, list_type: ListType) -> crate::Result<()> {
        self.update_payload(key, "list", |kind| match kind {
            NodeKind::List {
                list_type: current, ..
            } => {
                *current = list_type;
                true
            }
            _ => false,
        })
    }

    pub fn set_checked(&mut self, key: NodeKey, checked: Option<bool>) -> crate::Result<()> {
        self.update_payload(key, "listitem", |kind| match kind {
            NodeKind::ListItem { checked: current } => {
                *current = checked;
                true
            }
            _ => false,
        })
    }

    pub fn set_cell_header(&mut self, key: NodeKey, header: bool) -> crate::Result<()> {
        self.update_payload(key, "tablecell", |kind| match kind {
            NodeKind::TableCell { header: current } => {
                *current = header;
                true
            }
            _ => false,
        })
    }

    pub fn set_link_url(&mut self, key: NodeKey, url: impl Into<String>) -> crate::Result<()> {
        let url = url.into();
        self.update_payload(key, "link", |kind| match kind {
            NodeKind::Link { url: current } => {
                *current = url;
                true
            }
            _ => false,
        })
    }

    pub fn set_image_data(&mut self, key: NodeKey, image: ImageData) -> crate::Result<()> {
        self.update_payload(key, "image", |kind| match kind {
            NodeKind::Image(current) => {
                *current = image;
                true
            }
            _ => false,
        })
    }

    /// Runs `apply` on the payload; it reports false when the variant is not
    /// the `expected` one, in which case nothing is marked dirty.
    fn update_payload(
        &mut self,
        key: NodeKey,
        expected: &'static str,
        apply: impl FnOnce(&mut NodeKind) -> bool,
    ) -> crate::Result<()> {
        let node = self
            .nodes
            .get_mut(&key)
            .ok_or(crate::TreeError::NodeNotFound(key))?;
        if !apply(&mut node.kind) {
            return Err(crate::TreeError::KindMismatch { key, expected });
        }
        self.changes.dirty.insert(key);
        Ok(())
    }

    /// Number of nodes reachable from the root, the root included.
    pub fn len(&self) -> usize {
        self.descendants(self.root).len()
    }

    pub fn is_empty(&self) -> bool {
        self.children_of(self.root).is_empty()
    }

    // ------------------------------------------------------------------
    // Factories. Created nodes start detached; attach them with one of
    // the structural operations.
    // ------------------------------------------------------------------

    pub fn create(&mut self, kind: NodeKind) -> NodeKey {
        let key = NodeKey::next();
        self.nodes.insert(
            key,
            Node {
                key,
                kind,
                parent: None,
                children: Vec::new(),
            },
        );
        self.changes.dirty.insert(key);
        key
    }

    pub fn create_paragraph(&mut self) -> NodeKey {
        self.create(NodeKind::Paragraph)
    }

    pub fn create_text(&mut self, content: impl Into<String>) -> NodeKey {
        self.create(NodeKind::Text(TextData::plain(content)))
    }

    pub fn create_formatted_text(
        &mut self,
        content: impl Into<String>,
        format: TextFormat,
    ) -> NodeKey {
        self.create(NodeKind::Text(TextData {
            content: content.into(),
            format,
            style: String::new(),
        }))
    }

    pub fn create_heading(&mut self, level: HeadingLevel) -> NodeKey {
        self.create(NodeKind::Heading(level))
    }

    pub fn create_list(&mut self, list_type: ListType) -> NodeKey {
        self.create(NodeKind::List {
            list_type,
            start: 1,
        })
    }

    pub fn create_list_item(&mut self, checked: Option<bool>) -> NodeKey {
        self.create(NodeKind::ListItem { checked })
    }

    pub fn create_table_cell(&mut self, header: bool) -> NodeKey {
        self.create(NodeKind::TableCell { header })
    }

    /// Paragraph holding a single plain text node (or nothing when empty).
    pub fn create_text_paragraph(&mut self, content: &str) -> NodeKey {
        let paragraph = self.create_paragraph();
        if !content.is_empty() {
            let text = self.create_text(content);
            self.attach_fresh(paragraph, text);
        }
        paragraph
    }

    fn attach_fresh(&mut self, parent: NodeKey, child: NodeKey) {
        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.push(child);
        }
    }

    // ------------------------------------------------------------------
    // Bookkeeping used by the transaction layer.
    // ------------------------------------------------------------------

    pub(crate) fn mark_dirty(&mut self, key: NodeKey) {
        self.changes.dirty.insert(key);
    }

    pub(crate) fn take_changes(&mut self) -> ChangeSet {
        let mut changes = std::mem::take(&mut self.changes);
        changes.dirty.retain(|key| self.nodes.contains_key(key));
        changes
    }

    /// Drops every node no longer reachable from the root.
    pub fn collect_garbage(&mut self) -> usize {
        let reachable: BTreeSet<NodeKey> = self.descendants(self.root).into_iter().collect();
        let garbage: Vec<NodeKey> = self
            .nodes
            .keys()
            .filter(|key| !reachable.contains(key))
            .copied()
            .collect();
        for key in &garbage {
            self.nodes.remove(key);
            self.changes.removed.insert(*key);
        }
        garbage.len()
    }
}

impl Default for DocumentTree {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for DocumentTree {
    fn eq(&self, other: &Self) -> bool {
        self.root == other.root && self.nodes == other.nodes
    }
}

#[cfg(test)]
#[path = "tree_tests.rs"]
mod tree_tests;
