use std::collections::{BTreeSet, HashMap};

use crate::tree::{ChangeSet, DocumentTree, Node, NodeKey, Selection};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HistoryConfig {
    /// Committed states kept for undo. Older ones are dropped.
    pub max_depth: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { max_depth: 100 }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Snapshot {
    pub tree: DocumentTree,
    pub selection: Option<Selection>,
}

#[derive(Debug)]
pub(crate) struct History {
    undo: Vec<Snapshot>,
    redo: Vec<Snapshot>,
    config: HistoryConfig,
}

impl History {
    pub fn new(config: HistoryConfig) -> Self {
        Self {
            undo: Vec::new(),
            redo: Vec::new(),
            config,
        }
    }

    /// Remembers the state a commit replaced. Any redo branch is dropped.
    pub fn record(&mut self, previous: Snapshot) {
        if self.config.max_depth == 0 {
            return;
        }
        self.undo.push(previous);
        if self.undo.len() > self.config.max_depth {
            let excess = self.undo.len() - self.config.max_depth;
            self.undo.drain(..excess);
        }
        self.redo.clear();
    }

    pub fn undo(&mut self, current: Snapshot) -> Option<Snapshot> {
        let previous = self.undo.pop()?;
        self.redo.push(current);
        Some(previous)
    }

    pub fn redo(&mut self, current: Snapshot) -> Option<Snapshot> {
        let next = self.redo.pop()?;
        self.undo.push(current);
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}

/// Keys that differ between two versions of a document.
pub(crate) fn changes_between(before: &DocumentTree, after: &DocumentTree) -> ChangeSet {
    let reachable = |tree: &DocumentTree| -> HashMap<NodeKey, Node> {
        tree.descendants(tree.root())
            .into_iter()
            .filter_map(|key| tree.get(key).map(|node| (key, node.clone())))
            .collect()
    };
    let old = reachable(before);
    let new = reachable(after);

    let dirty: BTreeSet<NodeKey> = new
        .iter()
        .filter(|(key, node)| old.get(*key) != Some(*node))
        .map(|(key, _)| *key)
        .collect();
    let removed: BTreeSet<NodeKey> = old
        .keys()
        .filter(|key| !new.contains_key(*key))
        .copied()
        .collect();
    ChangeSet { dirty, removed }
}
