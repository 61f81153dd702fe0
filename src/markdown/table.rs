use super::{
    ImportOptions,
    classify::{is_table_divider, split_table_row},
    export::export_children,
    import::import_markdown,
};
use crate::Result;
use crate::tree::{DocumentTree, NodeKey, NodeKind};

/// Turns `paragraph` into a table row. Directly preceding paragraphs that
/// still hold a raw row are pulled into the same table, and the result is
/// merged into a preceding table with the same column count. Returns false
/// when the paragraph's parent cannot hold a table.
pub(crate) fn apply_row(
    tree: &mut DocumentTree,
    paragraph: NodeKey,
    cells: &[String],
    options: &ImportOptions,
) -> Result<bool> {
    let accepts_table = tree
        .parent_of(paragraph)
        .and_then(|parent| tree.kind(parent))
        .is_some_and(|kind| kind.accepts_child(&NodeKind::Table));
    if !accepts_table {
        return Ok(false);
    }

    let mut rows = vec![cells.to_vec()];
    let mut max_cells = cells.len();
    let mut sibling = tree.previous_sibling(paragraph);
    while let Some(candidate) = sibling {
        let Some(row_cells) = raw_row(tree, candidate) else {
            break;
        };
        max_cells = max_cells.max(row_cells.len());
        rows.insert(0, row_cells);
        sibling = tree.previous_sibling(candidate);
        tree.remove(candidate)?;
    }

    let table = tree.create(NodeKind::Table);
    for texts in &rows {
        let row = tree.create(NodeKind::TableRow);
        let mut row_cells = Vec::with_capacity(max_cells);
        for text in texts {
            row_cells.push(create_cell(tree, text, options)?);
        }
        while row_cells.len() < max_cells {
            row_cells.push(create_cell(tree, "", options)?);
        }
        tree.append(row, &row_cells)?;
        tree.append(table, &[row])?;
    }

    let merge_target = tree
        .previous_sibling(paragraph)
        .filter(|key| is_table(tree, *key) && column_count(tree, *key) == max_cells);
    match merge_target {
        Some(previous) => {
            let new_rows = tree.children_of(table).to_vec();
            tree.append(previous, &new_rows)?;
            tree.remove(table)?;
            tree.remove(paragraph)?;
            tracing::debug!(table = %previous, rows = new_rows.len(), "merged rows into table");
        }
        None => tree.replace(paragraph, table, false)?,
    }
    Ok(true)
}

/// Marks the last row of the preceding table as header and drops the
/// divider paragraph. Without a preceding table nothing changes.
pub(crate) fn apply_divider(tree: &mut DocumentTree, paragraph: NodeKey) -> Result<bool> {
    let Some(table) = tree
        .previous_sibling(paragraph)
        .filter(|key| is_table(tree, *key))
    else {
        tracing::warn!(paragraph = %paragraph, "table divider without a table above it");
        return Ok(false);
    };
    let Some(last_row) = tree.last_child(table) else {
        return Ok(false);
    };
    for cell in tree.children_of(last_row).to_vec() {
        tree.set_cell_header(cell, true)?;
    }
    tree.remove(paragraph)?;
    Ok(true)
}

pub(crate) fn export_table(tree: &DocumentTree, table: NodeKey) -> String {
    let mut lines = Vec::new();
    let mut divider_written = false;
    for row in tree.children_of(table) {
        let cells: Vec<String> = tree
            .children_of(*row)
            .iter()
            .filter(|cell| matches!(tree.kind(**cell), Some(NodeKind::TableCell { .. })))
            .map(|cell| {
                export_children(tree, *cell)
                    .replace('\n', "\\n")
                    .trim()
                    .to_string()
            })
            .collect();
        lines.push(format!("| {} |", cells.join(" | ")));
        if !divider_written && is_header_row(tree, *row) {
            lines.push(format!("| {} |", vec!["---"; cells.len()].join(" | ")));
            divider_written = true;
        }
    }
    lines.join("\n")
}

/// Column count of a table, taken from its first row.
pub fn column_count(tree: &DocumentTree, table: NodeKey) -> usize {
    tree.first_child(table)
        .map(|row| tree.children_of(row).len())
        .unwrap_or(0)
}

fn is_table(tree: &DocumentTree, key: NodeKey) -> bool {
    matches!(tree.kind(key), Some(NodeKind::Table))
}

fn is_header_row(tree: &DocumentTree, row: NodeKey) -> bool {
    tree.children_of(row)
        .iter()
        .any(|cell| matches!(tree.kind(*cell), Some(NodeKind::TableCell { header: true })))
}

/// Cells of a paragraph whose only child is plain row text.
fn raw_row(tree: &DocumentTree, key: NodeKey) -> Option<Vec<String>> {
    if !matches!(tree.kind(key), Some(NodeKind::Paragraph)) {
        return None;
    }
    let [only] = tree.children_of(key) else {
        return None;
    };
    let content = &tree.text(*only)?.content;
    if is_table_divider(content) {
        return None;
    }
    split_table_row(content)
}

fn create_cell(tree: &mut DocumentTree, text: &str, options: &ImportOptions) -> Result<NodeKey> {
    let cell = tree.create_table_cell(false);
    let source = unescape_line_breaks(text);
    import_markdown(tree, cell, source.trim(), options)?;
    if tree.children_of(cell).is_empty() {
        let paragraph = tree.create_paragraph();
        tree.append(cell, &[paragraph])?;
    }
    Ok(cell)
}

/// Turns the `\n` sequences written by [`export_table`] back into line
/// breaks. Other backslash escapes pass through untouched.
fn unescape_line_breaks(text: &str) -> String {
    let mut output = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            output.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => output.push('\n'),
            Some(next) => {
                output.push(ch);
                output.push(next);
            }
            None => output.push(ch),
        }
    }
    output
}

#[cfg(test)]
#[path = "table_tests.rs"]
mod table_tests;
