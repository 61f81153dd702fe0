//! Markdown codec: converts between a [`DocumentTree`](crate::tree::DocumentTree)
//! and markdown text.
//!
//! Import runs in two passes. Lines are classified first (fenced code is
//! grouped, blank lines are noted), then each line's paragraph is rewritten
//! into its block by the transformers in [`BlockTransformer::ALL`] order.
//! Export walks the tree with one writer per node kind.

mod classify;
mod export;
mod import;
mod inline;
mod rule;
mod shortcuts;
mod table;

pub use classify::BlockTransformer;
pub use export::{export_block, export_children, export_markdown};
pub use import::{import_markdown, parse_document};
pub(crate) use import::nested_list;
pub use shortcuts::apply_block_shortcut;
pub use table::column_count;

/// Knobs for the importer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportOptions {
    /// Columns of leading whitespace per list nesting level. A tab counts
    /// as a full level.
    pub indent_width: usize,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self { indent_width: 4 }
    }
}

/// File name used when exporting a document with the given title. Path
/// separators and control characters become `-` and leading dots are
/// dropped, so the name never leaves the export directory.
pub fn markdown_file_name(title: &str) -> String {
    let cleaned: String = title
        .trim()
        .chars()
        .map(|ch| {
            if matches!(ch, '/' | '\\' | ':') || ch.is_control() {
                '-'
            } else {
                ch
            }
        })
        .collect();
    let title = cleaned.trim_start_matches('.').trim();
    let title = if title.is_empty() { "Untitled" } else { title };
    format!("{title}.md")
}

#[cfg(test)]
#[path = "markdown_tests.rs"]
mod markdown_tests;
