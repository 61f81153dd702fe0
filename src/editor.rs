//! Editing session around a [`DocumentTree`]: transactional updates, the
//! current selection, undo history, the toolbar snapshot and update
//! listeners.

use crate::Result;
use crate::markdown::{self, ImportOptions};
use crate::toolbar::{ToolbarState, ToolbarSynchronizer, ToolbarUpdate};
use crate::tree::{ChangeSet, DocumentTree, Selection};

mod file;
mod format;
mod history;
mod transaction;

pub use history::HistoryConfig;
pub use transaction::{ListenerId, Transaction, UpdateEvent};

use history::{History, Snapshot, changes_between};
use transaction::Listener;

/// Tag carried by commits produced by undo and redo.
pub const HISTORIC_TAG: &str = "historic";

pub struct Editor {
    tree: DocumentTree,
    selection: Option<Selection>,
    history: History,
    toolbar: ToolbarSynchronizer,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: u64,
    import_options: ImportOptions,
}

impl Editor {
    pub fn new() -> Self {
        Self::with_options(ImportOptions::default(), HistoryConfig::default())
    }

    pub fn with_options(import_options: ImportOptions, history: HistoryConfig) -> Self {
        Self {
            tree: DocumentTree::with_empty_paragraph(),
            selection: None,
            history: History::new(history),
            toolbar: ToolbarSynchronizer::new(),
            listeners: Vec::new(),
            next_listener: 0,
            import_options,
        }
    }

    /// Editor whose document is parsed from `source`. Nothing is recorded
    /// in the history.
    pub fn from_markdown(source: &str) -> Result<Self> {
        let mut editor = Self::new();
        let mut tree = markdown::parse_document(source, &editor.import_options)?;
        tree.collect_garbage();
        tree.take_changes();
        editor.tree = tree;
        Ok(editor)
    }

    pub fn tree(&self) -> &DocumentTree {
        &self.tree
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn import_options(&self) -> &ImportOptions {
        &self.import_options
    }

    /// Read pass over the last committed state.
    pub fn read<T>(&self, body: impl FnOnce(&DocumentTree, Option<&Selection>) -> T) -> T {
        body(&self.tree, self.selection.as_ref())
    }

    pub fn update<T>(&mut self, body: impl FnOnce(&mut Transaction) -> Result<T>) -> Result<T> {
        self.update_tagged(None, body)
    }

    /// Runs `body` against a working copy of the tree. On `Ok` the copy is
    /// committed and listeners hear about it once; on `Err` it is thrown
    /// away and the editor is left as it was. Updates scheduled by the body
    /// run afterwards, each as a transaction of its own.
    pub fn update_tagged<T>(
        &mut self,
        tag: Option<&str>,
        body: impl FnOnce(&mut Transaction) -> Result<T>,
    ) -> Result<T> {
        let mut transaction = Transaction::new(self.tree.clone(), self.selection.clone());
        let value = body(&mut transaction)?;
        let (tree, selection, scheduled) = transaction.into_parts();
        self.commit(tree, selection, tag);

        for update in scheduled {
            if let Err(err) = self.update_tagged(tag, update) {
                tracing::warn!(error = %err, "scheduled update failed");
            }
        }
        Ok(value)
    }

    fn commit(
        &mut self,
        mut tree: DocumentTree,
        mut selection: Option<Selection>,
        tag: Option<&str>,
    ) {
        let collected = tree.collect_garbage();
        let changes = tree.take_changes();
        sanitize_selection(&tree, &mut selection);
        if changes.is_empty() && selection == self.selection {
            return;
        }

        let previous_tree = std::mem::replace(&mut self.tree, tree);
        let previous_selection = std::mem::replace(&mut self.selection, selection);
        if !changes.is_empty() {
            self.history.record(Snapshot {
                tree: previous_tree,
                selection: previous_selection,
            });
        }
        tracing::debug!(
            dirty = changes.dirty.len(),
            removed = changes.removed.len(),
            collected,
            tag = tag.unwrap_or_default(),
            "committed update"
        );
        self.notify(&changes, tag);
    }

    fn notify(&mut self, changes: &ChangeSet, tag: Option<&str>) {
        self.sync_history_flags();
        self.toolbar.refresh(&self.tree, self.selection.as_ref());
        let event = UpdateEvent {
            tree: &self.tree,
            selection: self.selection.as_ref(),
            changes,
            tag,
        };
        for (_, listener) in self.listeners.iter_mut() {
            listener(&event);
        }
    }

    fn sync_history_flags(&mut self) {
        let (shown_undo, shown_redo) = {
            let state = self.toolbar.state();
            (state.can_undo, state.can_redo)
        };
        let (can_undo, can_redo) = (self.history.can_undo(), self.history.can_redo());
        if shown_undo != can_undo {
            self.toolbar.set_can_undo(can_undo);
        }
        if shown_redo != can_redo {
            self.toolbar.set_can_redo(can_redo);
        }
    }

    /// Selection-change path: stores the selection and refreshes the
    /// toolbar. Selections pointing at missing nodes are dropped.
    pub fn set_selection(&mut self, selection: Option<Selection>) {
        let mut selection = selection;
        sanitize_selection(&self.tree, &mut selection);
        self.selection = selection;
        self.toolbar.refresh(&self.tree, self.selection.as_ref());
    }

    pub fn register_listener(
        &mut self,
        listener: impl FnMut(&UpdateEvent<'_>) + 'static,
    ) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unregister_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo(&mut self) -> bool {
        let current = self.snapshot();
        match self.history.undo(current) {
            Some(previous) => {
                self.restore(previous);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        let current = self.snapshot();
        match self.history.redo(current) {
            Some(next) => {
                self.restore(next);
                true
            }
            None => false,
        }
    }

    /// Forgets every undo and redo step.
    pub fn clear_history(&mut self) {
        self.history.clear();
        self.sync_history_flags();
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            tree: self.tree.clone(),
            selection: self.selection.clone(),
        }
    }

    fn restore(&mut self, snapshot: Snapshot) {
        let changes = changes_between(&self.tree, &snapshot.tree);
        self.tree = snapshot.tree;
        self.selection = snapshot.selection;
        sanitize_selection(&self.tree, &mut self.selection);
        self.notify(&changes, Some(HISTORIC_TAG));
    }

    pub fn toolbar_state(&self) -> &ToolbarState {
        self.toolbar.state()
    }

    /// Pushes an externally observed value into the toolbar snapshot.
    pub fn update_toolbar_state(&mut self, update: ToolbarUpdate) {
        self.toolbar.update(update);
    }

    pub fn export_markdown(&self) -> String {
        self.read(|tree, _| markdown::export_markdown(tree))
    }

    /// Replaces the whole document with `source` in one transaction.
    pub fn import_markdown(&mut self, source: &str) -> Result<()> {
        let options = self.import_options.clone();
        self.update(|tx| {
            let root = tx.root();
            markdown::import_markdown(tx, root, source, &options)?;
            tx.set_selection(None);
            Ok(())
        })
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

/// Clears a selection that points at missing nodes and clamps the offsets
/// of one that does not.
fn sanitize_selection(tree: &DocumentTree, selection: &mut Option<Selection>) {
    let Some(current) = selection.as_mut() else {
        return;
    };
    if current.is_valid(tree) {
        current.clamp(tree);
    } else {
        tracing::debug!("selection points at removed nodes, clearing it");
        *selection = None;
    }
}

#[cfg(test)]
#[path = "editor_tests.rs"]
mod editor_tests;

#[cfg(test)]
#[path = "editor/format_tests.rs"]
mod format_tests;
