//! Inline content of a block: formatted text runs, links and images.
//!
//! Import hands each line to `pulldown-cmark` and flattens the emphasis
//! spans it reports into [`TextFormat`] bits. CommonMark has no
//! `==highlight==`, so unescaped `==` pairs are swapped for a marker
//! character before parsing and paired up again inside each span.
//!
//! Export escapes every character the importer would read as markup and
//! rebuilds properly nested delimiter runs from the format bits.

use std::collections::HashSet;

use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};

use crate::Result;
use crate::tree::{DocumentTree, ImageData, NodeKey, NodeKind, TextData, TextFormat};

/// Stands in for `==` while a line goes through the CommonMark parser.
const HIGHLIGHT_MARK: char = '\u{E000}';

/// Pads both ends of every source line so no line reads as block syntax and
/// edge whitespace is kept. Counts as whitespace for delimiter flanking.
const EDGE: char = '\u{A0}';

/// Formats written with delimiters. On equal run lengths the earlier one
/// is opened first.
const MARKUP: [TextFormat; 4] = [
    TextFormat::BOLD,
    TextFormat::ITALIC,
    TextFormat::STRIKETHROUGH,
    TextFormat::HIGHLIGHT,
];

const ESCAPED: [char; 11] = ['\\', '*', '_', '~', '`', '=', '[', ']', '<', '&', '|'];

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Inline {
    Text { content: String, format: TextFormat },
    Link { url: String, children: Vec<Inline> },
    Image { src: String, alt: String },
}

pub(crate) fn parse_inline(text: &str) -> Vec<Inline> {
    if text.is_empty() {
        return Vec::new();
    }
    let padded_break = format!("{EDGE}\n{EDGE}");
    let source = format!(
        "{EDGE}{}{EDGE}",
        mark_highlights(text).replace('\n', &padded_break)
    );
    let mut output = Vec::new();
    flatten(Collector::default().run(&source), TextFormat::empty(), &mut output);
    output.retain(|node| !matches!(node, Inline::Text { content, .. } if content.is_empty()));
    merge_adjacent(output)
}

/// Inline structure as reported by the parser, before highlight pairing.
enum Span {
    Text(String),
    Code(String),
    Mark,
    Styled(TextFormat, Vec<Span>),
    Link { url: String, children: Vec<Span> },
    Image { src: String, alt: String },
}

enum Frame {
    Styled(TextFormat),
    Link(String),
    Image { src: String, alt: String },
}

#[derive(Default)]
struct Collector {
    root: Vec<Span>,
    open: Vec<(Frame, Vec<Span>)>,
    /// Cleared at each line start, where the next text drops its leading
    /// edge padding.
    mid_line: bool,
}

impl Collector {
    fn run(mut self, source: &str) -> Vec<Span> {
        for event in Parser::new_ext(source, Options::ENABLE_STRIKETHROUGH) {
            match event {
                Event::Start(tag) => {
                    let frame = match tag {
                        Tag::Emphasis => Frame::Styled(TextFormat::ITALIC),
                        Tag::Strong => Frame::Styled(TextFormat::BOLD),
                        Tag::Strikethrough => Frame::Styled(TextFormat::STRIKETHROUGH),
                        Tag::Link { dest_url, .. } => Frame::Link(restore_highlights(&dest_url)),
                        Tag::Image { dest_url, .. } => Frame::Image {
                            src: restore_highlights(&dest_url),
                            alt: String::new(),
                        },
                        _ => continue,
                    };
                    self.open.push((frame, Vec::new()));
                }
                Event::End(
                    TagEnd::Emphasis
                    | TagEnd::Strong
                    | TagEnd::Strikethrough
                    | TagEnd::Link
                    | TagEnd::Image,
                ) => self.close(),
                Event::Text(text) | Event::InlineHtml(text) | Event::Html(text) => {
                    self.push_text(&text);
                }
                Event::Code(code) => {
                    self.mid_line = true;
                    let code = restore_highlights(&code);
                    match self.image_alt() {
                        Some(alt) => alt.push_str(&code),
                        None => self.current().push(Span::Code(code)),
                    }
                }
                Event::SoftBreak | Event::HardBreak => self.line_break(),
                _ => {}
            }
        }
        while !self.open.is_empty() {
            self.close();
        }
        self.trim_line_end();
        self.root
    }

    fn current(&mut self) -> &mut Vec<Span> {
        match self.open.last_mut() {
            Some((_, children)) => children,
            None => &mut self.root,
        }
    }

    /// Alt text of the innermost open image. Everything inside an image is
    /// plain alt text.
    fn image_alt(&mut self) -> Option<&mut String> {
        self.open.iter_mut().rev().find_map(|(frame, _)| match frame {
            Frame::Image { alt, .. } => Some(alt),
            _ => None,
        })
    }

    fn close(&mut self) {
        if let Some((frame, children)) = self.open.pop() {
            let span = match frame {
                Frame::Styled(format) => Span::Styled(format, children),
                Frame::Link(url) => Span::Link { url, children },
                Frame::Image { src, alt } => Span::Image { src, alt },
            };
            self.current().push(span);
        }
    }

    fn push_text(&mut self, text: &str) {
        let text = if self.mid_line {
            text
        } else {
            text.strip_prefix(EDGE).unwrap_or(text)
        };
        self.mid_line = true;
        if let Some(alt) = self.image_alt() {
            alt.push_str(&restore_highlights(text));
            return;
        }
        let spans = self.current();
        for (idx, piece) in text.split(HIGHLIGHT_MARK).enumerate() {
            if idx > 0 {
                spans.push(Span::Mark);
            }
            if !piece.is_empty() {
                spans.push(Span::Text(piece.to_string()));
            }
        }
    }

    fn line_break(&mut self) {
        self.trim_line_end();
        match self.image_alt() {
            Some(alt) => alt.push('\n'),
            None => self.current().push(Span::Text("\n".to_string())),
        }
        self.mid_line = false;
    }

    /// Drops the trailing edge padding of the line written so far.
    fn trim_line_end(&mut self) {
        if let Some(alt) = self.image_alt() {
            if alt.ends_with(EDGE) {
                alt.pop();
            }
            return;
        }
        if let Some(Span::Text(content)) = self.current().last_mut() {
            if content.ends_with(EDGE) {
                content.pop();
            }
        }
    }
}

/// Replaces each unescaped `==` with [`HIGHLIGHT_MARK`].
fn mark_highlights(text: &str) -> String {
    let mut output = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                output.push(ch);
                if let Some(next) = chars.next() {
                    output.push(next);
                }
            }
            '=' if chars.peek() == Some(&'=') => {
                chars.next();
                output.push(HIGHLIGHT_MARK);
            }
            _ => output.push(ch),
        }
    }
    output
}

fn restore_highlights(text: &str) -> String {
    text.replace(HIGHLIGHT_MARK, "==")
}

/// Indices of the marks that pair up within one span. A pair with nothing
/// between its marks stays literal, as does a final unpaired mark.
fn paired_marks(spans: &[Span]) -> HashSet<usize> {
    let mut paired = HashSet::new();
    let mut pending: Option<usize> = None;
    for (idx, span) in spans.iter().enumerate() {
        if !matches!(span, Span::Mark) {
            continue;
        }
        match pending.take() {
            Some(open) if idx > open + 1 => {
                paired.insert(open);
                paired.insert(idx);
            }
            Some(_) => {}
            None => pending = Some(idx),
        }
    }
    paired
}

fn flatten(spans: Vec<Span>, format: TextFormat, output: &mut Vec<Inline>) {
    let paired = paired_marks(&spans);
    let mut highlighted = false;
    for (idx, span) in spans.into_iter().enumerate() {
        let current = if highlighted {
            format.union(TextFormat::HIGHLIGHT)
        } else {
            format
        };
        match span {
            Span::Mark if paired.contains(&idx) => highlighted = !highlighted,
            Span::Mark => output.push(Inline::Text {
                content: "==".to_string(),
                format: current,
            }),
            Span::Text(content) => output.push(Inline::Text {
                content,
                format: current,
            }),
            Span::Code(content) => output.push(Inline::Text {
                content,
                format: current.union(TextFormat::CODE),
            }),
            Span::Styled(mask, children) => flatten(children, current.union(mask), output),
            Span::Link { url, children } => {
                let mut inner = Vec::new();
                flatten(children, current, &mut inner);
                inner.retain(|node| !matches!(node, Inline::Text { content, .. } if content.is_empty()));
                output.push(Inline::Link {
                    url,
                    children: merge_adjacent(inner),
                });
            }
            Span::Image { src, alt } => output.push(Inline::Image { src, alt }),
        }
    }
}

fn merge_adjacent(nodes: Vec<Inline>) -> Vec<Inline> {
    let mut merged: Vec<Inline> = Vec::with_capacity(nodes.len());
    for node in nodes {
        if let (
            Some(Inline::Text {
                content: previous,
                format: previous_format,
            }),
            Inline::Text { content, format },
        ) = (merged.last_mut(), &node)
        {
            if *previous_format == *format {
                previous.push_str(content);
                continue;
            }
        }
        merged.push(node);
    }
    merged
}

/// Parses `text` and appends the resulting inline nodes to `parent`.
pub(crate) fn append_inline(tree: &mut DocumentTree, parent: NodeKey, text: &str) -> Result<()> {
    let nodes = parse_inline(text);
    let keys = build(tree, &nodes)?;
    tree.append(parent, &keys)
}

fn build(tree: &mut DocumentTree, nodes: &[Inline]) -> Result<Vec<NodeKey>> {
    let mut keys = Vec::with_capacity(nodes.len());
    for node in nodes {
        let key = match node {
            Inline::Text { content, format } => tree.create(NodeKind::Text(TextData {
                content: content.clone(),
                format: *format,
                style: String::new(),
            })),
            Inline::Link { url, children } => {
                let link = tree.create(NodeKind::Link { url: url.clone() });
                let child_keys = build(tree, children)?;
                tree.append(link, &child_keys)?;
                link
            }
            Inline::Image { src, alt } => tree.create(NodeKind::Image(ImageData::new(
                src.clone(),
                alt.clone(),
            ))),
        };
        keys.push(key);
    }
    Ok(keys)
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Token {
    Text(String),
    Open(TextFormat),
    Close(TextFormat),
}

/// Serializes the inline children of `parent`.
pub(crate) fn export_inline(tree: &DocumentTree, parent: NodeKey) -> String {
    let mut tokens = Vec::new();
    write_children(tree, parent, TextFormat::empty(), &mut tokens);
    render(&tokens)
}

fn write_children(tree: &DocumentTree, parent: NodeKey, active: TextFormat, tokens: &mut Vec<Token>) {
    let pieces = pieces(tree, parent);
    write_range(tree, &pieces, active, tokens);
}

/// Inline children of `parent` with the delimited formats each one needs.
/// Images and empty links take the formats their neighbours share.
fn pieces(tree: &DocumentTree, parent: NodeKey) -> Vec<(NodeKey, TextFormat)> {
    let found: Vec<(NodeKey, Option<TextFormat>)> = tree
        .children_of(parent)
        .iter()
        .filter_map(|child| match tree.kind(*child)? {
            NodeKind::Text(data) if !data.is_empty() => Some((*child, Some(markup(data.format)))),
            NodeKind::Link { .. } => Some((*child, link_format(tree, *child))),
            NodeKind::Image(_) => Some((*child, None)),
            _ => None,
        })
        .collect();

    found
        .iter()
        .enumerate()
        .map(|(idx, (key, format))| {
            let format = format.unwrap_or_else(|| {
                let before = found[..idx].iter().rev().find_map(|(_, format)| *format);
                let after = found[idx + 1..].iter().find_map(|(_, format)| *format);
                match (before, after) {
                    (Some(before), Some(after)) => before.intersection(after),
                    (Some(one), None) | (None, Some(one)) => one,
                    (None, None) => TextFormat::empty(),
                }
            });
            (*key, format)
        })
        .collect()
}

fn markup(format: TextFormat) -> TextFormat {
    MARKUP
        .iter()
        .filter(|mask| format.contains(**mask))
        .fold(TextFormat::empty(), |acc, mask| acc.union(*mask))
}

/// Formats shared by every text inside a link, `None` when it has no text.
fn link_format(tree: &DocumentTree, link: NodeKey) -> Option<TextFormat> {
    tree.children_of(link)
        .iter()
        .filter_map(|child| tree.text(*child))
        .filter(|data| !data.is_empty())
        .map(|data| markup(data.format))
        .reduce(TextFormat::intersection)
}

/// Opens the format with the longest run first so delimiters always nest.
fn write_range(
    tree: &DocumentTree,
    pieces: &[(NodeKey, TextFormat)],
    active: TextFormat,
    tokens: &mut Vec<Token>,
) {
    let mut idx = 0;
    while idx < pieces.len() {
        let missing = pieces[idx].1.difference(active);
        let mut outer: Option<(TextFormat, usize)> = None;
        for mask in MARKUP {
            if !missing.contains(mask) {
                continue;
            }
            let run = pieces[idx..]
                .iter()
                .take_while(|(_, format)| format.contains(mask))
                .count();
            if outer.is_none_or(|(_, longest)| run > longest) {
                outer = Some((mask, run));
            }
        }

        match outer {
            Some((mask, run)) => {
                tokens.push(Token::Open(mask));
                write_range(tree, &pieces[idx..idx + run], active.union(mask), tokens);
                tokens.push(Token::Close(mask));
                idx += run;
            }
            None => {
                write_piece(tree, pieces[idx].0, active, tokens);
                idx += 1;
            }
        }
    }
}

fn write_piece(tree: &DocumentTree, key: NodeKey, active: TextFormat, tokens: &mut Vec<Token>) {
    match tree.kind(key) {
        Some(NodeKind::Text(data)) => {
            let text = if data.format.contains(TextFormat::CODE) {
                code_span(&data.content)
            } else {
                escape_text(&data.content)
            };
            tokens.push(Token::Text(text));
        }
        Some(NodeKind::Link { url }) => {
            tokens.push(Token::Text("[".to_string()));
            write_children(tree, key, active, tokens);
            tokens.push(Token::Text(format!("]({})", destination(url))));
        }
        Some(NodeKind::Image(image)) => tokens.push(Token::Text(format!(
            "![{}]({})",
            escape_text(&image.alt_text),
            destination(&image.src)
        ))),
        _ => {}
    }
}

fn render(tokens: &[Token]) -> String {
    let mut output = String::new();
    let mut italics: Vec<&'static str> = Vec::new();
    for (idx, token) in tokens.iter().enumerate() {
        match token {
            Token::Text(text) => output.push_str(text),
            Token::Open(mask) if *mask == TextFormat::ITALIC => {
                let marker = italic_marker(tokens, idx);
                italics.push(marker);
                output.push_str(marker);
            }
            Token::Close(mask) if *mask == TextFormat::ITALIC => {
                output.push_str(italics.pop().unwrap_or("_"));
            }
            Token::Open(mask) | Token::Close(mask) => output.push_str(marker(*mask)),
        }
    }
    output
}

fn marker(mask: TextFormat) -> &'static str {
    if mask == TextFormat::BOLD {
        "**"
    } else if mask == TextFormat::STRIKETHROUGH {
        "~~"
    } else if mask == TextFormat::HIGHLIGHT {
        "=="
    } else {
        "_"
    }
}

/// `_` cannot open or close inside a word; `*` can. Bold markers next to
/// the italic one join its `*` run, so the word test looks past them.
fn italic_marker(tokens: &[Token], open: usize) -> &'static str {
    let close = tokens[open..]
        .iter()
        .position(|token| *token == Token::Close(TextFormat::ITALIC))
        .map_or(tokens.len(), |offset| open + offset);
    let before = tokens[..open].iter().rev().find(|token| !is_transparent(token));
    let after = tokens
        .get(close + 1..)
        .and_then(|rest| rest.iter().find(|token| !is_transparent(token)));
    if before.is_some_and(|token| is_wordlike(token, true))
        || after.is_some_and(|token| is_wordlike(token, false))
    {
        "*"
    } else {
        "_"
    }
}

fn is_transparent(token: &Token) -> bool {
    match token {
        Token::Text(text) => text.is_empty(),
        Token::Open(mask) | Token::Close(mask) => *mask == TextFormat::BOLD,
    }
}

fn is_wordlike(token: &Token, at_end: bool) -> bool {
    match token {
        Token::Text(text) => {
            let ch = if at_end {
                text.chars().next_back()
            } else {
                text.chars().next()
            };
            ch.is_some_and(|ch| !ch.is_whitespace() && !ch.is_ascii_punctuation())
        }
        // `==` is read back as a plain character.
        Token::Open(mask) | Token::Close(mask) => *mask == TextFormat::HIGHLIGHT,
    }
}

/// Backslash-escapes every character the importer reads as inline markup.
fn escape_text(text: &str) -> String {
    let mut output = String::with_capacity(text.len());
    for (idx, ch) in text.char_indices() {
        // A trailing `!` would turn a following link into an image.
        let trailing_bang = ch == '!' && idx + 1 == text.len();
        if ESCAPED.contains(&ch) || trailing_bang {
            output.push('\\');
        }
        output.push(ch);
    }
    output
}

fn code_span(content: &str) -> String {
    let mut longest = 0;
    let mut run = 0;
    for ch in content.chars() {
        if ch == '`' {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }
    let fence = "`".repeat(longest + 1);
    let padded = (content.starts_with(['`', ' ']) || content.ends_with(['`', ' ']))
        && !content.chars().all(|ch| ch == ' ');
    if padded {
        format!("{fence} {content} {fence}")
    } else {
        format!("{fence}{content}{fence}")
    }
}

fn destination(url: &str) -> String {
    let pointy = url.chars().any(|ch| ch.is_whitespace() || ch.is_control());
    let special: &[char] = if pointy {
        &['\\', '<', '>', '&']
    } else {
        &['\\', '(', ')', '<', '>', '&']
    };
    let mut output = String::with_capacity(url.len() + 2);
    if pointy {
        output.push('<');
    }
    for ch in url.chars() {
        if special.contains(&ch) {
            output.push('\\');
        }
        output.push(ch);
    }
    if pointy {
        output.push('>');
    }
    output
}
