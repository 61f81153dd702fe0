use super::{DocumentTree, NodeKey, NodeKind};
use crate::{Result, TreeError};

impl DocumentTree {
    pub fn parent_of(&self, key: NodeKey) -> Option<NodeKey> {
        self.get(key)?.parent()
    }

    pub fn children_of(&self, key: NodeKey) -> &[NodeKey] {
        self.get(key).map(|node| node.children()).unwrap_or(&[])
    }

    pub fn first_child(&self, key: NodeKey) -> Option<NodeKey> {
        self.children_of(key).first().copied()
    }

    pub fn last_child(&self, key: NodeKey) -> Option<NodeKey> {
        self.children_of(key).last().copied()
    }

    pub fn index_in_parent(&self, key: NodeKey) -> Option<usize> {
        let parent = self.parent_of(key)?;
        self.children_of(parent).iter().position(|child| *child == key)
    }

    pub fn next_sibling(&self, key: NodeKey) -> Option<NodeKey> {
        let parent = self.parent_of(key)?;
        let index = self.index_in_parent(key)?;
        self.children_of(parent).get(index + 1).copied()
    }

    pub fn previous_sibling(&self, key: NodeKey) -> Option<NodeKey> {
        let parent = self.parent_of(key)?;
        let index = self.index_in_parent(key)?;
        index
            .checked_sub(1)
            .and_then(|idx| self.children_of(parent).get(idx).copied())
    }

    /// True when the node hangs off the root through an unbroken chain of parents.
    pub fn is_attached(&self, key: NodeKey) -> bool {
        if key == self.root() {
            return true;
        }
        self.ancestors(key).last().copied() == Some(self.root())
    }

    /// Parents of `key`, nearest first. The node itself is not included.
    pub fn ancestors(&self, key: NodeKey) -> Vec<NodeKey> {
        let mut result = Vec::new();
        let mut current = self.parent_of(key);
        while let Some(parent) = current {
            if result.contains(&parent) {
                break;
            }
            result.push(parent);
            current = self.parent_of(parent);
        }
        result
    }

    pub fn is_ancestor_of(&self, ancestor: NodeKey, key: NodeKey) -> bool {
        self.ancestors(key).contains(&ancestor)
    }

    pub fn find_ancestor(
        &self,
        key: NodeKey,
        predicate: impl Fn(&NodeKind) -> bool,
    ) -> Option<NodeKey> {
        std::iter::once(key)
            .chain(self.ancestors(key))
            .find(|candidate| self.kind(*candidate).is_some_and(&predicate))
    }

    /// Pre-order walk of `key` and everything below it.
    pub fn descendants(&self, key: NodeKey) -> Vec<NodeKey> {
        let mut result = Vec::new();
        if !self.contains(key) {
            return result;
        }
        let mut stack = vec![key];
        while let Some(current) = stack.pop() {
            result.push(current);
            for child in self.children_of(current).iter().rev() {
                stack.push(*child);
            }
        }
        result
    }

    /// Text nodes below `key`, in document order.
    pub fn text_nodes(&self, key: NodeKey) -> Vec<NodeKey> {
        self.descendants(key)
            .into_iter()
            .filter(|candidate| self.text(*candidate).is_some())
            .collect()
    }

    /// Child indices leading from the root to `key`.
    pub fn path_from_root(&self, key: NodeKey) -> Option<Vec<usize>> {
        if !self.is_attached(key) {
            return None;
        }
        let mut path = Vec::new();
        let mut current = key;
        while current != self.root() {
            path.push(self.index_in_parent(current)?);
            current = self.parent_of(current)?;
        }
        path.reverse();
        Some(path)
    }

    pub fn text_content(&self, key: NodeKey) -> String {
        let Some(node) = self.get(key) else {
            return String::new();
        };
        match node.kind() {
            NodeKind::Text(data) => data.content.clone(),
            NodeKind::Image(_) | NodeKind::HorizontalRule => String::new(),
            _ => {
                let mut output = String::new();
                let children = node.children();
                for (idx, child) in children.iter().enumerate() {
                    output.push_str(&self.text_content(*child));
                    let is_block = self.kind(*child).is_some_and(|kind| !kind.is_inline());
                    if is_block && idx + 1 < children.len() {
                        output.push_str("\n\n");
                    }
                }
                output
            }
        }
    }

    /// Top-level block containing `key`: the first node (the node itself
    /// included) whose parent is the root or a table cell.
    pub fn find_nearest_block_ancestor(&self, key: NodeKey) -> Result<NodeKey> {
        if !self.contains(key) {
            return Err(TreeError::NodeNotFound(key));
        }
        std::iter::once(key)
            .chain(self.ancestors(key))
            .find(|candidate| {
                let parent_is_shadow_root = self
                    .parent_of(*candidate)
                    .and_then(|parent| self.kind(parent))
                    .is_some_and(NodeKind::is_shadow_root);
                let is_container = self
                    .kind(*candidate)
                    .is_some_and(|kind| !kind.is_inline());
                parent_is_shadow_root && is_container
            })
            .ok_or(TreeError::NoBlockAncestor(key))
    }

    pub fn is_empty_paragraph(&self, key: NodeKey) -> bool {
        matches!(self.kind(key), Some(NodeKind::Paragraph))
            && self
                .children_of(key)
                .iter()
                .all(|child| self.text(*child).is_some_and(|text| text.is_empty()))
    }

    /// Checks the structural invariants of everything reachable from the root.
    pub fn validate(&self) -> Result<()> {
        let root = self.root();
        if self.parent_of(root).is_some() {
            return Err(TreeError::RootImmutable);
        }
        let mut seen = std::collections::HashSet::new();
        let mut stack = vec![root];
        while let Some(key) = stack.pop() {
            if !seen.insert(key) {
                return Err(TreeError::WouldCreateCycle(key));
            }
            let node = self.get(key).ok_or(TreeError::NodeNotFound(key))?;
            if node.kind().is_leaf() && !node.children().is_empty() {
                return Err(TreeError::LeafNode(key));
            }
            for child in node.children() {
                let child_node = self.get(*child).ok_or(TreeError::NodeNotFound(*child))?;
                if child_node.parent() != Some(key) {
                    return Err(TreeError::Detached(*child));
                }
                if !node.kind().accepts_child(child_node.kind()) {
                    return Err(TreeError::InvalidChild {
                        parent: node.kind().type_name(),
                        child: child_node.kind().type_name(),
                    });
                }
                stack.push(*child);
            }
        }
        Ok(())
    }
}
