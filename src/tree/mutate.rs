use super::{DocumentTree, NodeKey, NodeKind, TextData};
use crate::{Result, TreeError};

// ============================================================================
// Structural operations. Every operation validates up front and only then
// touches the arena, so a failed call leaves the tree exactly as it was.
// ============================================================================

impl DocumentTree {
    pub fn insert_before(&mut self, target: NodeKey, node: NodeKey) -> Result<()> {
        self.insert_next_to(target, node, 0)
    }

    pub fn insert_after(&mut self, target: NodeKey, node: NodeKey) -> Result<()> {
        self.insert_next_to(target, node, 1)
    }

    fn insert_next_to(&mut self, target: NodeKey, node: NodeKey, shift: usize) -> Result<()> {
        if target == node {
            return Ok(());
        }
        let parent = self.attached_parent(target)?;
        self.check_insertable(parent, node)?;

        self.detach(node);
        let index = self
            .index_in_parent(target)
            .ok_or(TreeError::Detached(target))?;
        self.attach_at(parent, index + shift, node);
        Ok(())
    }

    /// Appends `nodes` to `parent`, in order.
    pub fn append(&mut self, parent: NodeKey, nodes: &[NodeKey]) -> Result<()> {
        for (idx, node) in nodes.iter().enumerate() {
            if nodes[..idx].contains(node) {
                return Err(TreeError::WouldCreateCycle(*node));
            }
            self.check_insertable(parent, *node)?;
        }
        for node in nodes {
            self.detach(*node);
            let index = self.children_of(parent).len();
            self.attach_at(parent, index, *node);
        }
        Ok(())
    }

    /// Detaches `key` and destroys it together with its subtree.
    pub fn remove(&mut self, key: NodeKey) -> Result<()> {
        if key == self.root() {
            return Err(TreeError::RootImmutable);
        }
        if !self.contains(key) {
            return Err(TreeError::NodeNotFound(key));
        }
        self.detach(key);
        self.destroy(key);
        Ok(())
    }

    /// Puts `replacement` where `key` was and destroys `key`. With
    /// `preserve_children` the old children move over to the replacement.
    pub fn replace(
        &mut self,
        key: NodeKey,
        replacement: NodeKey,
        preserve_children: bool,
    ) -> Result<()> {
        if key == self.root() || replacement == self.root() {
            return Err(TreeError::RootImmutable);
        }
        if key == replacement {
            return Ok(());
        }
        let node_kind = self.kind(key).ok_or(TreeError::NodeNotFound(key))?.clone();
        let replacement_kind = self
            .kind(replacement)
            .ok_or(TreeError::NodeNotFound(replacement))?
            .clone();
        if self.is_ancestor_of(replacement, key) {
            return Err(TreeError::WouldCreateCycle(replacement));
        }
        let parent = self.parent_of(key);
        if let Some(parent) = parent {
            let parent_kind = self.kind(parent).ok_or(TreeError::NodeNotFound(parent))?;
            if !parent_kind.accepts_child(&replacement_kind) {
                return Err(TreeError::InvalidChild {
                    parent: parent_kind.type_name(),
                    child: replacement_kind.type_name(),
                });
            }
        }
        let moved: Vec<NodeKey> = if preserve_children {
            self.children_of(key)
                .iter()
                .copied()
                .filter(|child| *child != replacement)
                .collect()
        } else {
            Vec::new()
        };
        if !moved.is_empty() && replacement_kind.is_leaf() {
            return Err(TreeError::LeafNode(replacement));
        }
        for child in &moved {
            let child_kind = self.kind(*child).ok_or(TreeError::NodeNotFound(*child))?;
            if !replacement_kind.accepts_child(child_kind) {
                return Err(TreeError::InvalidChild {
                    parent: replacement_kind.type_name(),
                    child: child_kind.type_name(),
                });
            }
        }
        tracing::trace!(
            key = %key,
            replacement = %replacement,
            from = node_kind.type_name(),
            to = replacement_kind.type_name(),
            "replace node"
        );

        self.detach(replacement);
        if let Some(parent) = parent {
            if let Some(index) = self.index_in_parent(key) {
                self.detach(key);
                self.attach_at(parent, index, replacement);
            }
        }
        for child in moved {
            self.detach(child);
            let index = self.children_of(replacement).len();
            self.attach_at(replacement, index, child);
        }
        self.destroy(key);
        Ok(())
    }

    /// Splits a text node at a character offset. The original node keeps the
    /// leading half; the trailing half is a new sibling with the same format
    /// and style. Both are returned in document order, either may be empty.
    pub fn split_text(&mut self, key: NodeKey, offset: usize) -> Result<(NodeKey, NodeKey)> {
        let data = self.text(key).ok_or_else(|| {
            if self.contains(key) {
                TreeError::NotText(key)
            } else {
                TreeError::NodeNotFound(key)
            }
        })?;
        let len = data.len();
        if offset > len {
            return Err(TreeError::OffsetOutOfRange { key, offset, len });
        }
        let byte_idx = char_to_byte_idx(&data.content, offset);
        let tail = TextData {
            content: data.content[byte_idx..].to_string(),
            format: data.format,
            style: data.style.clone(),
        };

        let second = self.create(NodeKind::Text(tail));
        self.text_mut(key)?.content.truncate(byte_idx);
        if let Some(parent) = self.parent_of(key) {
            if let Some(index) = self.index_in_parent(key) {
                self.attach_at(parent, index + 1, second);
            }
        }
        Ok((key, second))
    }

    /// Merges adjacent text children of `parent` that share format and style
    /// and drops empty ones. Returns the surviving children.
    pub fn normalize_text_children(&mut self, parent: NodeKey) -> Vec<NodeKey> {
        let children = self.children_of(parent).to_vec();
        let mut previous: Option<NodeKey> = None;
        for child in children {
            let Some(data) = self.text(child).cloned() else {
                previous = None;
                continue;
            };
            if data.is_empty() {
                self.detach(child);
                self.destroy(child);
                continue;
            }
            if let Some(prev) = previous {
                let mergeable = self
                    .text(prev)
                    .is_some_and(|p| p.format == data.format && p.style == data.style);
                if mergeable {
                    if let Ok(prev_data) = self.text_mut(prev) {
                        prev_data.content.push_str(&data.content);
                    }
                    self.detach(child);
                    self.destroy(child);
                    continue;
                }
            }
            previous = Some(child);
        }
        self.children_of(parent).to_vec()
    }

    // ------------------------------------------------------------------
    // Internal primitives. These do not validate.
    // ------------------------------------------------------------------

    fn attached_parent(&self, target: NodeKey) -> Result<NodeKey> {
        if target == self.root() {
            return Err(TreeError::RootImmutable);
        }
        if !self.contains(target) {
            return Err(TreeError::NodeNotFound(target));
        }
        self.parent_of(target).ok_or(TreeError::Detached(target))
    }

    fn check_insertable(&self, parent: NodeKey, node: NodeKey) -> Result<()> {
        if node == self.root() {
            return Err(TreeError::RootImmutable);
        }
        let parent_kind = self.kind(parent).ok_or(TreeError::NodeNotFound(parent))?;
        let node_kind = self.kind(node).ok_or(TreeError::NodeNotFound(node))?;
        if parent == node || self.is_ancestor_of(node, parent) {
            return Err(TreeError::WouldCreateCycle(node));
        }
        if parent_kind.is_leaf() {
            return Err(TreeError::LeafNode(parent));
        }
        if !parent_kind.accepts_child(node_kind) {
            return Err(TreeError::InvalidChild {
                parent: parent_kind.type_name(),
                child: node_kind.type_name(),
            });
        }
        Ok(())
    }

    pub(crate) fn detach(&mut self, key: NodeKey) {
        let Some(parent) = self.parent_of(key) else {
            return;
        };
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.retain(|child| *child != key);
        }
        if let Some(node) = self.nodes.get_mut(&key) {
            node.parent = None;
        }
        self.mark_dirty(parent);
        self.mark_dirty(key);
    }

    fn attach_at(&mut self, parent: NodeKey, index: usize, key: NodeKey) {
        if let Some(node) = self.nodes.get_mut(&parent) {
            let index = index.min(node.children.len());
            node.children.insert(index, key);
        }
        if let Some(node) = self.nodes.get_mut(&key) {
            node.parent = Some(parent);
        }
        self.mark_dirty(parent);
        self.mark_dirty(key);
    }

    fn destroy(&mut self, key: NodeKey) {
        for descendant in self.descendants(key) {
            self.nodes.remove(&descendant);
            self.changes.dirty.remove(&descendant);
            self.changes.removed.insert(descendant);
        }
    }
}

pub(crate) fn char_to_byte_idx(text: &str, char_idx: usize) -> usize {
    text.char_indices()
        .nth(char_idx)
        .map(|(byte_idx, _)| byte_idx)
        .unwrap_or(text.len())
}
