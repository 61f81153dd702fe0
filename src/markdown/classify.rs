use std::sync::LazyLock;

use regex::Regex;

use super::ImportOptions;
use crate::tree::{HeadingLevel, ListType};

static TABLE_ROW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\|(.+)\|\s?$").expect("valid table row pattern"));
static TABLE_DIVIDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\|\s*:?-*:?\s*)+\|\s?$").expect("valid table divider pattern")
});
static HORIZONTAL_RULE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(---|\*\*\*|___)\s?$").expect("valid rule pattern"));
static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6})\s(.*)$").expect("valid heading pattern"));
static QUOTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^>\s?(.*)$").expect("valid quote pattern"));
static CODE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^```(\S*)\s*$").expect("valid fence pattern"));
static CHECK_LIST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\s*)[-*+]\s\[([ xX])\](?:\s(.*))?$").expect("valid check list pattern")
});
static UNORDERED_LIST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\s*)[-*+]\s(.*)$").expect("valid bullet pattern"));
static ORDERED_LIST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\s*)(\d{1,9})\.\s(.*)$").expect("valid number pattern"));

/// Block-level line transformers in the order they are tried. The custom
/// table and rule transformers come before the base set so they win on
/// lines both could claim (`---` is a rule, never a bullet).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockTransformer {
    Table,
    HorizontalRule,
    Heading,
    Quote,
    CodeFence,
    CheckList,
    UnorderedList,
    OrderedList,
}

impl BlockTransformer {
    pub const ALL: [BlockTransformer; 8] = [
        BlockTransformer::Table,
        BlockTransformer::HorizontalRule,
        BlockTransformer::Heading,
        BlockTransformer::Quote,
        BlockTransformer::CodeFence,
        BlockTransformer::CheckList,
        BlockTransformer::UnorderedList,
        BlockTransformer::OrderedList,
    ];

    pub fn is_custom(self) -> bool {
        matches!(self, BlockTransformer::Table | BlockTransformer::HorizontalRule)
    }

    fn classify(self, line: &str, options: &ImportOptions) -> Option<LineClass> {
        match self {
            BlockTransformer::Table => {
                if is_table_divider(line) {
                    return Some(LineClass::TableDivider);
                }
                split_table_row(line).map(LineClass::TableRow)
            }
            BlockTransformer::HorizontalRule => HORIZONTAL_RULE
                .is_match(line)
                .then_some(LineClass::HorizontalRule),
            BlockTransformer::Heading => {
                let caps = HEADING.captures(line)?;
                let level = HeadingLevel::new(caps[1].len() as u8)?;
                Some(LineClass::Heading {
                    level,
                    text: caps[2].to_string(),
                })
            }
            BlockTransformer::Quote => {
                let caps = QUOTE.captures(line)?;
                Some(LineClass::Quote(caps[1].to_string()))
            }
            BlockTransformer::CodeFence => {
                let caps = CODE_FENCE.captures(line)?;
                Some(LineClass::CodeBlock {
                    language: non_empty(&caps[1]),
                    content: String::new(),
                })
            }
            BlockTransformer::CheckList => {
                let caps = CHECK_LIST.captures(line)?;
                Some(LineClass::ListItem(ListLine {
                    list_type: ListType::Check,
                    depth: indent_depth(&caps[1], options),
                    checked: Some(!caps[2].trim().is_empty()),
                    number: 1,
                    text: caps.get(3).map(|m| m.as_str()).unwrap_or_default().to_string(),
                }))
            }
            BlockTransformer::UnorderedList => {
                let caps = UNORDERED_LIST.captures(line)?;
                Some(LineClass::ListItem(ListLine {
                    list_type: ListType::Bullet,
                    depth: indent_depth(&caps[1], options),
                    checked: None,
                    number: 1,
                    text: caps[2].to_string(),
                }))
            }
            BlockTransformer::OrderedList => {
                let caps = ORDERED_LIST.captures(line)?;
                Some(LineClass::ListItem(ListLine {
                    list_type: ListType::Number,
                    depth: indent_depth(&caps[1], options),
                    checked: None,
                    number: caps[2].parse().unwrap_or(1),
                    text: caps[3].to_string(),
                }))
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ListLine {
    pub list_type: ListType,
    pub depth: usize,
    pub checked: Option<bool>,
    pub number: u32,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum LineClass {
    Blank,
    Text(String),
    Heading { level: HeadingLevel, text: String },
    Quote(String),
    CodeBlock {
        language: Option<String>,
        content: String,
    },
    ListItem(ListLine),
    TableRow(Vec<String>),
    TableDivider,
    HorizontalRule,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ClassifiedLine {
    pub class: LineClass,
    pub raw: String,
}

/// First pass of the import: one entry per block line. Fenced code is
/// collected into a single entry; an unclosed fence runs to the end.
pub(crate) fn classify_lines(source: &str, options: &ImportOptions) -> Vec<ClassifiedLine> {
    let lines: Vec<&str> = source.lines().collect();
    let mut classified = Vec::with_capacity(lines.len());
    let mut idx = 0;
    while idx < lines.len() {
        let line = lines[idx];
        if let Some(caps) = CODE_FENCE.captures(line) {
            let close = (idx + 1..lines.len()).find(|j| lines[*j].trim_end() == "```");
            let end = match close {
                Some(close) => close,
                None => {
                    tracing::warn!(line = idx + 1, "unclosed code fence runs to end of input");
                    lines.len()
                }
            };
            let body = lines[idx + 1..end].join("\n");
            let raw_end = close.map(|close| close + 1).unwrap_or(lines.len());
            classified.push(ClassifiedLine {
                class: LineClass::CodeBlock {
                    language: non_empty(&caps[1]),
                    content: body,
                },
                raw: lines[idx..raw_end].join("\n"),
            });
            idx = raw_end;
            continue;
        }
        classified.push(ClassifiedLine {
            class: classify_line(line, options),
            raw: line.to_string(),
        });
        idx += 1;
    }
    classified
}

/// Classifies a single line against the block transformers.
pub(crate) fn classify_line(line: &str, options: &ImportOptions) -> LineClass {
    if line.trim().is_empty() {
        return LineClass::Blank;
    }
    BlockTransformer::ALL
        .iter()
        .find_map(|transformer| transformer.classify(line, options))
        .unwrap_or_else(|| LineClass::Text(line.to_string()))
}

/// Cell texts of a markdown table row, `None` when the line is not a row.
/// Escaped pipes stay inside their cell, escapes included.
pub(crate) fn split_table_row(line: &str) -> Option<Vec<String>> {
    let caps = TABLE_ROW.captures(line)?;
    let mut cells = Vec::new();
    let mut cell = String::new();
    let mut chars = caps[1].chars();
    while let Some(ch) = chars.next() {
        match ch {
            '|' => cells.push(std::mem::take(&mut cell)),
            '\\' => {
                cell.push(ch);
                if let Some(next) = chars.next() {
                    cell.push(next);
                }
            }
            _ => cell.push(ch),
        }
    }
    cells.push(cell);
    Some(cells)
}

pub(crate) fn is_table_divider(line: &str) -> bool {
    TABLE_DIVIDER.is_match(line) && line.contains('-')
}

fn indent_depth(indent: &str, options: &ImportOptions) -> usize {
    let width: usize = indent
        .chars()
        .map(|ch| if ch == '\t' { options.indent_width } else { 1 })
        .sum();
    width / options.indent_width.max(1)
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}
