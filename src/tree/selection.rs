use std::cmp::Ordering;

use super::{DocumentTree, FormatFlag, NodeKey, NodeKind, TextFormat, style::style_value};

/// A position inside the tree. For text nodes the offset counts characters;
/// for element nodes it is a child index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Point {
    pub key: NodeKey,
    pub offset: usize,
}

impl Point {
    pub fn new(key: NodeKey, offset: usize) -> Self {
        Self { key, offset }
    }
}

/// Character range of a single text node covered by a selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextRange {
    pub key: NodeKey,
    pub start: usize,
    pub end: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selection {
    pub anchor: Point,
    pub focus: Point,
    /// Pending format toggles applied on top of the anchor text's own format
    /// while the selection is collapsed.
    pub format: TextFormat,
    /// Pending style for text typed at a collapsed selection.
    pub style: String,
}

impl Selection {
    pub fn new(anchor: Point, focus: Point) -> Self {
        Self {
            anchor,
            focus,
            format: TextFormat::empty(),
            style: String::new(),
        }
    }

    pub fn collapsed(point: Point) -> Self {
        Self::new(point, point)
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    /// Both points resolve to attached nodes.
    pub fn is_valid(&self, tree: &DocumentTree) -> bool {
        tree.is_attached(self.anchor.key) && tree.is_attached(self.focus.key)
    }

    /// Pulls offsets back inside their nodes.
    pub fn clamp(&mut self, tree: &DocumentTree) {
        for point in [&mut self.anchor, &mut self.focus] {
            let max = point_extent(tree, point.key);
            point.offset = point.offset.min(max);
        }
    }

    pub fn is_backward(&self, tree: &DocumentTree) -> bool {
        compare_points(tree, &self.focus, &self.anchor) == Ordering::Less
    }

    /// Start and end of the selection in document order.
    pub fn ordered_points(&self, tree: &DocumentTree) -> (Point, Point) {
        if self.is_backward(tree) {
            (self.focus, self.anchor)
        } else {
            (self.anchor, self.focus)
        }
    }

    /// Cells spanned when anchor and focus sit in different cells of one table.
    pub fn table_cells(&self, tree: &DocumentTree) -> Option<Vec<NodeKey>> {
        let anchor_cell = enclosing_cell(tree, self.anchor.key)?;
        let focus_cell = enclosing_cell(tree, self.focus.key)?;
        if anchor_cell == focus_cell {
            return None;
        }
        let anchor_row = tree.parent_of(anchor_cell)?;
        let focus_row = tree.parent_of(focus_cell)?;
        let table = tree.parent_of(anchor_row)?;
        if tree.parent_of(focus_row)? != table {
            return None;
        }
        let rows = tree.children_of(table);
        let row_a = rows.iter().position(|row| *row == anchor_row)?;
        let row_b = rows.iter().position(|row| *row == focus_row)?;
        let col_a = tree.index_in_parent(anchor_cell)?;
        let col_b = tree.index_in_parent(focus_cell)?;
        let (row_lo, row_hi) = (row_a.min(row_b), row_a.max(row_b));
        let (col_lo, col_hi) = (col_a.min(col_b), col_a.max(col_b));

        let mut cells = Vec::new();
        for row in &rows[row_lo..=row_hi] {
            let row_cells = tree.children_of(*row);
            for col in col_lo..=col_hi {
                if let Some(cell) = row_cells.get(col) {
                    cells.push(*cell);
                }
            }
        }
        Some(cells)
    }

    /// Text covered by the selection, with zero-width fragments left out.
    pub fn text_ranges(&self, tree: &DocumentTree) -> Vec<TextRange> {
        if let Some(cells) = self.table_cells(tree) {
            return cells
                .into_iter()
                .flat_map(|cell| tree.text_nodes(cell))
                .filter_map(|key| {
                    let len = tree.text(key)?.len();
                    (len > 0).then_some(TextRange { key, start: 0, end: len })
                })
                .collect();
        }

        let texts = tree.text_nodes(tree.root());
        let (start, end) = self.ordered_points(tree);
        let (start_idx, start_offset) = linear_position(tree, &texts, &start);
        let (end_idx, end_offset) = linear_position(tree, &texts, &end);

        let mut ranges = Vec::new();
        for (idx, key) in texts.iter().enumerate() {
            if idx < start_idx || idx > end_idx {
                continue;
            }
            let Some(len) = tree.text(*key).map(|data| data.len()) else {
                continue;
            };
            let from = if idx == start_idx { start_offset.min(len) } else { 0 };
            let to = if idx == end_idx { end_offset.min(len) } else { len };
            if from < to {
                ranges.push(TextRange {
                    key: *key,
                    start: from,
                    end: to,
                });
            }
        }
        ranges
    }

    /// Whether the whole selection carries `flag`. Mixed selections report
    /// false; there is no partial state.
    pub fn has_format(&self, tree: &DocumentTree, flag: FormatFlag) -> bool {
        if self.is_collapsed() {
            let base = tree
                .text(self.anchor.key)
                .map(|data| data.format)
                .unwrap_or_default();
            let mut effective = base;
            effective.toggle(self.format);
            return effective.has(flag);
        }
        let ranges = self.text_ranges(tree);
        !ranges.is_empty()
            && ranges.iter().all(|range| {
                tree.text(range.key)
                    .is_some_and(|data| data.format.has(flag))
            })
    }

    /// Shared value of a style property across the selection, `default` when
    /// nothing sets it and an empty string when the selection is mixed.
    pub fn style_value(&self, tree: &DocumentTree, property: &str, default: &str) -> String {
        if self.is_collapsed() {
            if let Some(value) = style_value(&self.style, property) {
                return value.to_string();
            }
            return tree
                .text(self.anchor.key)
                .and_then(|data| style_value(&data.style, property))
                .unwrap_or(default)
                .to_string();
        }

        let mut shared: Option<String> = None;
        for range in self.text_ranges(tree) {
            let value = tree
                .text(range.key)
                .and_then(|data| style_value(&data.style, property))
                .unwrap_or(default)
                .to_string();
            match &shared {
                Some(existing) if *existing != value => return String::new(),
                Some(_) => {}
                None => shared = Some(value),
            }
        }
        shared.unwrap_or_else(|| default.to_string())
    }
}

/// A point sits at the end of its node: the last character of a text node or
/// past the last child of an element.
pub fn is_at_node_end(tree: &DocumentTree, point: &Point) -> bool {
    point.offset >= point_extent(tree, point.key)
}

fn point_extent(tree: &DocumentTree, key: NodeKey) -> usize {
    match tree.text(key) {
        Some(data) => data.len(),
        None => tree.children_of(key).len(),
    }
}

fn enclosing_cell(tree: &DocumentTree, key: NodeKey) -> Option<NodeKey> {
    tree.find_ancestor(key, |kind| matches!(kind, NodeKind::TableCell { .. }))
}

/// Maps a point onto (index into `texts`, character offset). Element points
/// land on the first text node at or after the boundary they describe.
fn linear_position(tree: &DocumentTree, texts: &[NodeKey], point: &Point) -> (usize, usize) {
    if tree.text(point.key).is_some() {
        let idx = texts
            .iter()
            .position(|key| *key == point.key)
            .unwrap_or(texts.len());
        return (idx, point.offset);
    }
    let Some(mut boundary) = tree.path_from_root(point.key) else {
        return (texts.len(), 0);
    };
    boundary.push(point.offset);
    let idx = texts
        .iter()
        .position(|key| {
            tree.path_from_root(*key)
                .is_some_and(|path| path.as_slice() >= boundary.as_slice())
        })
        .unwrap_or(texts.len());
    (idx, 0)
}

fn compare_points(tree: &DocumentTree, a: &Point, b: &Point) -> Ordering {
    if a.key == b.key {
        return a.offset.cmp(&b.offset);
    }
    let path_a = tree.path_from_root(a.key);
    let path_b = tree.path_from_root(b.key);
    let (Some(mut path_a), Some(mut path_b)) = (path_a, path_b) else {
        return Ordering::Equal;
    };
    if tree.text(a.key).is_none() {
        path_a.push(a.offset);
    }
    if tree.text(b.key).is_none() {
        path_b.push(b.offset);
    }
    path_a.cmp(&path_b)
}

impl DocumentTree {
    /// The node a selection is "on". For a selection spanning two nodes this
    /// follows the direction-dependent end-of-node tie-break: the side whose
    /// boundary sits at the end of its node (anchor for forward selections,
    /// focus for backward ones) decides between anchor and focus node.
    pub fn get_selected_node(&self, selection: &Selection) -> Option<NodeKey> {
        let anchor_node = selection.anchor.key;
        let focus_node = selection.focus.key;
        if !self.contains(anchor_node) || !self.contains(focus_node) {
            return None;
        }
        if anchor_node == focus_node {
            return Some(anchor_node);
        }
        let selected = if selection.is_backward(self) {
            if is_at_node_end(self, &selection.focus) {
                anchor_node
            } else {
                focus_node
            }
        } else if is_at_node_end(self, &selection.anchor) {
            anchor_node
        } else {
            focus_node
        };
        Some(selected)
    }
}
