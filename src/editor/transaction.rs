use std::ops::{Deref, DerefMut};

use crate::Result;
use crate::tree::{ChangeSet, DocumentTree, Selection};

/// Follow-up work queued from inside a transaction body.
pub(crate) type ScheduledUpdate = Box<dyn FnOnce(&mut Transaction) -> Result<()>>;

/// Pending state of an update. Derefs to the working copy of the tree; the
/// editor only sees the result if the body returns `Ok`.
pub struct Transaction {
    tree: DocumentTree,
    selection: Option<Selection>,
    scheduled: Vec<ScheduledUpdate>,
}

impl Transaction {
    pub(crate) fn new(tree: DocumentTree, selection: Option<Selection>) -> Self {
        Self {
            tree,
            selection,
            scheduled: Vec::new(),
        }
    }

    pub fn tree(&self) -> &DocumentTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut DocumentTree {
        &mut self.tree
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn set_selection(&mut self, selection: Option<Selection>) {
        self.selection = selection;
    }

    /// Queues `update` to run as its own transaction once this one has
    /// committed.
    pub fn schedule(&mut self, update: impl FnOnce(&mut Transaction) -> Result<()> + 'static) {
        self.scheduled.push(Box::new(update));
    }

    pub(crate) fn into_parts(self) -> (DocumentTree, Option<Selection>, Vec<ScheduledUpdate>) {
        (self.tree, self.selection, self.scheduled)
    }
}

impl Deref for Transaction {
    type Target = DocumentTree;

    fn deref(&self) -> &DocumentTree {
        &self.tree
    }
}

impl DerefMut for Transaction {
    fn deref_mut(&mut self) -> &mut DocumentTree {
        &mut self.tree
    }
}

/// What listeners see after a commit.
#[derive(Debug)]
pub struct UpdateEvent<'a> {
    pub tree: &'a DocumentTree,
    pub selection: Option<&'a Selection>,
    pub changes: &'a ChangeSet,
    pub tag: Option<&'a str>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) u64);

pub(crate) type Listener = Box<dyn FnMut(&UpdateEvent<'_>)>;
