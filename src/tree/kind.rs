use std::fmt;

/// Independent inline format bits carried by text nodes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TextFormat(u16);

impl TextFormat {
    pub const BOLD: Self = Self(1);
    pub const ITALIC: Self = Self(1 << 1);
    pub const STRIKETHROUGH: Self = Self(1 << 2);
    pub const UNDERLINE: Self = Self(1 << 3);
    pub const CODE: Self = Self(1 << 4);
    pub const SUBSCRIPT: Self = Self(1 << 5);
    pub const SUPERSCRIPT: Self = Self(1 << 6);
    pub const HIGHLIGHT: Self = Self(1 << 7);
    pub const LOWERCASE: Self = Self(1 << 8);
    pub const UPPERCASE: Self = Self(1 << 9);
    pub const CAPITALIZE: Self = Self(1 << 10);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn intersection(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    pub const fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }

    pub fn toggle(&mut self, other: Self) {
        self.0 ^= other.0;
    }

    pub fn set(&mut self, other: Self, enabled: bool) {
        if enabled {
            self.insert(other);
        } else {
            self.remove(other);
        }
    }

    pub fn has(self, flag: FormatFlag) -> bool {
        self.contains(flag.mask())
    }
}

impl From<FormatFlag> for TextFormat {
    fn from(flag: FormatFlag) -> Self {
        flag.mask()
    }
}

/// Named view of a single [`TextFormat`] bit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FormatFlag {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Code,
    Subscript,
    Superscript,
    Highlight,
    Lowercase,
    Uppercase,
    Capitalize,
}

impl FormatFlag {
    pub const ALL: [FormatFlag; 11] = [
        FormatFlag::Bold,
        FormatFlag::Italic,
        FormatFlag::Underline,
        FormatFlag::Strikethrough,
        FormatFlag::Code,
        FormatFlag::Subscript,
        FormatFlag::Superscript,
        FormatFlag::Highlight,
        FormatFlag::Lowercase,
        FormatFlag::Uppercase,
        FormatFlag::Capitalize,
    ];

    pub const fn mask(self) -> TextFormat {
        match self {
            FormatFlag::Bold => TextFormat::BOLD,
            FormatFlag::Italic => TextFormat::ITALIC,
            FormatFlag::Underline => TextFormat::UNDERLINE,
            FormatFlag::Strikethrough => TextFormat::STRIKETHROUGH,
            FormatFlag::Code => TextFormat::CODE,
            FormatFlag::Subscript => TextFormat::SUBSCRIPT,
            FormatFlag::Superscript => TextFormat::SUPERSCRIPT,
            FormatFlag::Highlight => TextFormat::HIGHLIGHT,
            FormatFlag::Lowercase => TextFormat::LOWERCASE,
            FormatFlag::Uppercase => TextFormat::UPPERCASE,
            FormatFlag::Capitalize => TextFormat::CAPITALIZE,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            FormatFlag::Bold => "bold",
            FormatFlag::Italic => "italic",
            FormatFlag::Underline => "underline",
            FormatFlag::Strikethrough => "strikethrough",
            FormatFlag::Code => "code",
            FormatFlag::Subscript => "subscript",
            FormatFlag::Superscript => "superscript",
            FormatFlag::Highlight => "highlight",
            FormatFlag::Lowercase => "lowercase",
            FormatFlag::Uppercase => "uppercase",
            FormatFlag::Capitalize => "capitalize",
        }
    }
}

impl fmt::Display for FormatFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HeadingLevel(u8);

impl HeadingLevel {
    pub fn new(level: u8) -> Option<Self> {
        (1..=6).contains(&level).then_some(Self(level))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn tag(self) -> String {
        format!("h{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ListType {
    Bullet,
    Number,
    Check,
}

impl ListType {
    pub fn label(self) -> &'static str {
        match self {
            ListType::Bullet => "bullet",
            ListType::Number => "number",
            ListType::Check => "check",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextData {
    pub content: String,
    pub format: TextFormat,
    /// Inline CSS-like declarations, e.g. `font-size: 18px;`.
    pub style: String,
}

impl TextData {
    pub fn plain(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            format: TextFormat::empty(),
            style: String::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.content.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageData {
    pub src: String,
    pub alt_text: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub max_width: u32,
}

impl ImageData {
    pub const DEFAULT_MAX_WIDTH: u32 = 500;

    pub fn new(src: impl Into<String>, alt_text: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            alt_text: alt_text.into(),
            width: None,
            height: None,
            max_width: Self::DEFAULT_MAX_WIDTH,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Root,
    Paragraph,
    Heading(HeadingLevel),
    Quote,
    Code { language: Option<String> },
    List { list_type: ListType, start: u32 },
    ListItem { checked: Option<bool> },
    Table,
    TableRow,
    TableCell { header: bool },
    Link { url: String },
    Image(ImageData),
    HorizontalRule,
    Text(TextData),
}

impl NodeKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            NodeKind::Root => "root",
            NodeKind::Paragraph => "paragraph",
            NodeKind::Heading(_) => "heading",
            NodeKind::Quote => "quote",
            NodeKind::Code { .. } => "code",
            NodeKind::List { .. } => "list",
            NodeKind::ListItem { .. } => "listitem",
            NodeKind::Table => "table",
            NodeKind::TableRow => "tablerow",
            NodeKind::TableCell { .. } => "tablecell",
            NodeKind::Link { .. } => "link",
            NodeKind::Image(_) => "image",
            NodeKind::HorizontalRule => "horizontalrule",
            NodeKind::Text(_) => "text",
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(
            self,
            NodeKind::Text(_) | NodeKind::Image(_) | NodeKind::HorizontalRule
        )
    }

    pub fn is_inline(&self) -> bool {
        matches!(
            self,
            NodeKind::Text(_) | NodeKind::Link { .. } | NodeKind::Image(_)
        )
    }

    /// Containers whose children are laid out as independent blocks.
    pub fn is_shadow_root(&self) -> bool {
        matches!(self, NodeKind::Root | NodeKind::TableCell { .. })
    }

    pub fn is_text(&self) -> bool {
        matches!(self, NodeKind::Text(_))
    }

    fn is_block_content(&self) -> bool {
        matches!(
            self,
            NodeKind::Paragraph
                | NodeKind::Heading(_)
                | NodeKind::Quote
                | NodeKind::Code { .. }
                | NodeKind::List { .. }
                | NodeKind::HorizontalRule
        )
    }

    pub fn accepts_child(&self, child: &NodeKind) -> bool {
        if self.is_leaf() || matches!(child, NodeKind::Root) {
            return false;
        }
        match self {
            NodeKind::Root => child.is_block_content() || matches!(child, NodeKind::Table),
            NodeKind::TableCell { .. } => child.is_block_content(),
            NodeKind::Paragraph | NodeKind::Heading(_) | NodeKind::Quote => child.is_inline(),
            NodeKind::Code { .. } => child.is_text(),
            NodeKind::Link { .. } => matches!(child, NodeKind::Text(_) | NodeKind::Image(_)),
            NodeKind::List { .. } => matches!(child, NodeKind::ListItem { .. }),
            NodeKind::ListItem { .. } => {
                child.is_inline() || matches!(child, NodeKind::List { .. })
            }
            NodeKind::Table => matches!(child, NodeKind::TableRow),
            NodeKind::TableRow => matches!(child, NodeKind::TableCell { .. }),
            NodeKind::Image(_) | NodeKind::HorizontalRule | NodeKind::Text(_) => false,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}
