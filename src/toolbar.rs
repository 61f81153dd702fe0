//! Toolbar state derived from the tree and the current selection.

use serde::{Deserialize, Serialize};

use crate::tree::{
    DocumentTree, FormatFlag, ListType, NodeKind, Selection,
    style::{parse_px, style_value},
};

pub const DEFAULT_FONT_SIZE: u32 = 15;
pub const MIN_FONT_SIZE: u32 = 8;
pub const MAX_FONT_SIZE: u32 = 72;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    #[default]
    Paragraph,
    H1,
    H2,
    H3,
    H4,
    H5,
    H6,
    Bullet,
    Number,
    Check,
    Quote,
    Code,
}

impl BlockType {
    pub fn label(self) -> &'static str {
        match self {
            BlockType::Paragraph => "Normal",
            BlockType::H1 => "Heading 1",
            BlockType::H2 => "Heading 2",
            BlockType::H3 => "Heading 3",
            BlockType::H4 => "Heading 4",
            BlockType::H5 => "Heading 5",
            BlockType::H6 => "Heading 6",
            BlockType::Bullet => "Bulleted List",
            BlockType::Number => "Numbered List",
            BlockType::Check => "Check List",
            BlockType::Quote => "Quote",
            BlockType::Code => "Code Block",
        }
    }

    pub fn heading_level(self) -> Option<u8> {
        match self {
            BlockType::H1 => Some(1),
            BlockType::H2 => Some(2),
            BlockType::H3 => Some(3),
            BlockType::H4 => Some(4),
            BlockType::H5 => Some(5),
            BlockType::H6 => Some(6),
            _ => None,
        }
    }

    pub fn list_type(self) -> Option<ListType> {
        match self {
            BlockType::Bullet => Some(ListType::Bullet),
            BlockType::Number => Some(ListType::Number),
            BlockType::Check => Some(ListType::Check),
            _ => None,
        }
    }

    pub fn from_list_type(list_type: ListType) -> Self {
        match list_type {
            ListType::Bullet => BlockType::Bullet,
            ListType::Number => BlockType::Number,
            ListType::Check => BlockType::Check,
        }
    }

    /// Block type shown for a top-level node, `None` for kinds the toolbar
    /// has no entry for (tables, rules).
    pub fn from_kind(kind: &NodeKind) -> Option<Self> {
        let block_type = match kind {
            NodeKind::Paragraph => BlockType::Paragraph,
            NodeKind::Heading(level) => match level.get() {
                1 => BlockType::H1,
                2 => BlockType::H2,
                3 => BlockType::H3,
                4 => BlockType::H4,
                5 => BlockType::H5,
                _ => BlockType::H6,
            },
            NodeKind::Quote => BlockType::Quote,
            NodeKind::Code { .. } => BlockType::Code,
            NodeKind::List { list_type, .. } => BlockType::from_list_type(*list_type),
            _ => return None,
        };
        Some(block_type)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RootType {
    #[default]
    Root,
    Table,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolbarState {
    pub block_type: BlockType,
    pub root_type: RootType,
    pub code_language: Option<String>,
    pub is_bold: bool,
    pub is_italic: bool,
    pub is_strikethrough: bool,
    pub is_underline: bool,
    pub is_code: bool,
    pub is_subscript: bool,
    pub is_superscript: bool,
    pub is_highlight: bool,
    pub is_lowercase: bool,
    pub is_uppercase: bool,
    pub is_capitalize: bool,
    pub is_link: bool,
    pub font_size: u32,
    pub can_undo: bool,
    pub can_redo: bool,
}

impl Default for ToolbarState {
    fn default() -> Self {
        Self {
            block_type: BlockType::Paragraph,
            root_type: RootType::Root,
            code_language: None,
            is_bold: false,
            is_italic: false,
            is_strikethrough: false,
            is_underline: false,
            is_code: false,
            is_subscript: false,
            is_superscript: false,
            is_highlight: false,
            is_lowercase: false,
            is_uppercase: false,
            is_capitalize: false,
            is_link: false,
            font_size: DEFAULT_FONT_SIZE,
            can_undo: false,
            can_redo: false,
        }
    }
}

impl ToolbarState {
    pub fn format(&self, flag: FormatFlag) -> bool {
        match flag {
            FormatFlag::Bold => self.is_bold,
            FormatFlag::Italic => self.is_italic,
            FormatFlag::Strikethrough => self.is_strikethrough,
            FormatFlag::Underline => self.is_underline,
            FormatFlag::Code => self.is_code,
            FormatFlag::Subscript => self.is_subscript,
            FormatFlag::Superscript => self.is_superscript,
            FormatFlag::Highlight => self.is_highlight,
            FormatFlag::Lowercase => self.is_lowercase,
            FormatFlag::Uppercase => self.is_uppercase,
            FormatFlag::Capitalize => self.is_capitalize,
        }
    }

    fn format_mut(&mut self, flag: FormatFlag) -> &mut bool {
        match flag {
            FormatFlag::Bold => &mut self.is_bold,
            FormatFlag::Italic => &mut self.is_italic,
            FormatFlag::Strikethrough => &mut self.is_strikethrough,
            FormatFlag::Underline => &mut self.is_underline,
            FormatFlag::Code => &mut self.is_code,
            FormatFlag::Subscript => &mut self.is_subscript,
            FormatFlag::Superscript => &mut self.is_superscript,
            FormatFlag::Highlight => &mut self.is_highlight,
            FormatFlag::Lowercase => &mut self.is_lowercase,
            FormatFlag::Uppercase => &mut self.is_uppercase,
            FormatFlag::Capitalize => &mut self.is_capitalize,
        }
    }

    /// Sets a single field. Font sizes are clamped to the supported range.
    pub fn apply(&mut self, update: ToolbarUpdate) {
        match update {
            ToolbarUpdate::BlockType(block_type) => self.block_type = block_type,
            ToolbarUpdate::RootType(root_type) => self.root_type = root_type,
            ToolbarUpdate::CodeLanguage(language) => self.code_language = language,
            ToolbarUpdate::Format(flag, enabled) => *self.format_mut(flag) = enabled,
            ToolbarUpdate::Link(is_link) => self.is_link = is_link,
            ToolbarUpdate::FontSize(size) => {
                self.font_size = size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE)
            }
            ToolbarUpdate::CanUndo(can_undo) => self.can_undo = can_undo,
            ToolbarUpdate::CanRedo(can_redo) => self.can_redo = can_redo,
        }
    }
}

/// One field of [`ToolbarState`] with its new value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ToolbarUpdate {
    BlockType(BlockType),
    RootType(RootType),
    CodeLanguage(Option<String>),
    Format(FormatFlag, bool),
    Link(bool),
    FontSize(u32),
    CanUndo(bool),
    CanRedo(bool),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FontSizeStep {
    Increment,
    Decrement,
}

/// Next size on the toolbar's non-linear font size scale.
pub fn calculate_next_font_size(current: u32, step: FontSizeStep) -> u32 {
    let next = match step {
        FontSizeStep::Increment => match current {
            size if size < MIN_FONT_SIZE => MIN_FONT_SIZE,
            size if size < 12 => size + 1,
            size if size < 20 => size + 2,
            size if size < 36 => size + 4,
            size if size <= 60 => size + 12,
            _ => MAX_FONT_SIZE,
        },
        FontSizeStep::Decrement => match current {
            size if size > MAX_FONT_SIZE => MAX_FONT_SIZE,
            size if size >= 48 => size - 12,
            size if size >= 24 => size - 4,
            size if size >= 14 => size - 2,
            size if size >= 9 => size - 1,
            _ => MIN_FONT_SIZE,
        },
    };
    next.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE)
}

/// Recomputes the selection-dependent part of `previous`. Undo and redo
/// availability are carried over untouched.
pub fn derive_state(
    tree: &DocumentTree,
    selection: &Selection,
    previous: &ToolbarState,
) -> ToolbarState {
    let mut state = previous.clone();
    let anchor = selection.anchor.key;

    state.root_type = if tree
        .find_ancestor(anchor, |kind| matches!(kind, NodeKind::TableCell { .. }))
        .is_some()
    {
        RootType::Table
    } else {
        RootType::Root
    };

    if let Ok(element) = tree.find_nearest_block_ancestor(anchor) {
        match tree.kind(element) {
            Some(NodeKind::List { .. }) => {
                let list_type = tree
                    .find_ancestor(anchor, |kind| matches!(kind, NodeKind::List { .. }))
                    .and_then(|list| match tree.kind(list) {
                        Some(NodeKind::List { list_type, .. }) => Some(*list_type),
                        _ => None,
                    });
                if let Some(list_type) = list_type {
                    state.block_type = BlockType::from_list_type(list_type);
                }
                state.code_language = None;
            }
            Some(NodeKind::Code { language }) => {
                state.block_type = BlockType::Code;
                state.code_language = language.clone();
            }
            Some(kind) => {
                if let Some(block_type) = BlockType::from_kind(kind) {
                    state.block_type = block_type;
                }
                state.code_language = None;
            }
            None => {}
        }
    }

    for flag in FormatFlag::ALL {
        *state.format_mut(flag) = selection.has_format(tree, flag);
    }

    state.is_link = tree.get_selected_node(selection).is_some_and(|node| {
        let is_link = |key| matches!(tree.kind(key), Some(NodeKind::Link { .. }));
        is_link(node) || tree.parent_of(node).is_some_and(is_link)
    });

    let default_size = format!("{DEFAULT_FONT_SIZE}px");
    let size = selection.style_value(tree, "font-size", &default_size);
    state.font_size = parse_px(&size)
        .map(|size| size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE))
        .unwrap_or(DEFAULT_FONT_SIZE);
    state
}

/// Font size of a single text node's style, or the default.
pub fn font_size_of(style: &str) -> u32 {
    style_value(style, "font-size")
        .and_then(parse_px)
        .unwrap_or(DEFAULT_FONT_SIZE)
}

/// Holds the toolbar snapshot and keeps it in step with commits and
/// selection changes.
#[derive(Clone, Debug, Default)]
pub struct ToolbarSynchronizer {
    state: ToolbarState,
}

impl ToolbarSynchronizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ToolbarState {
        &self.state
    }

    /// Recomputes from `selection`. Without a selection the previous state
    /// stays as it is. Returns whether anything changed.
    pub fn refresh(&mut self, tree: &DocumentTree, selection: Option<&Selection>) -> bool {
        let Some(selection) = selection else {
            return false;
        };
        let next = derive_state(tree, selection, &self.state);
        if next == self.state {
            return false;
        }
        tracing::trace!(block_type = ?next.block_type, font_size = next.font_size, "toolbar state changed");
        self.state = next;
        true
    }

    pub fn set_can_undo(&mut self, can_undo: bool) {
        self.state.can_undo = can_undo;
    }

    pub fn set_can_redo(&mut self, can_redo: bool) {
        self.state.can_redo = can_redo;
    }

    pub fn update(&mut self, update: ToolbarUpdate) {
        self.state.apply(update);
    }
}

#[cfg(test)]
#[path = "toolbar_tests.rs"]
mod toolbar_tests;
