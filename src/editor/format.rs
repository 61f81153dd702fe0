use super::{Editor, Transaction};
use crate::Result;
use crate::toolbar::{
    BlockType, DEFAULT_FONT_SIZE, FontSizeStep, MAX_FONT_SIZE, MIN_FONT_SIZE,
    calculate_next_font_size,
};
use crate::tree::{
    FormatFlag, HeadingLevel, ListType, NodeKey, NodeKind, Point, Selection, TextData,
    style::{parse_px, patch_style},
};

/// Formats that cannot be active together with `flag`.
fn exclusive_with(flag: FormatFlag) -> &'static [FormatFlag] {
    match flag {
        FormatFlag::Subscript => &[FormatFlag::Superscript],
        FormatFlag::Superscript => &[FormatFlag::Subscript],
        FormatFlag::Lowercase => &[FormatFlag::Uppercase, FormatFlag::Capitalize],
        FormatFlag::Uppercase => &[FormatFlag::Lowercase, FormatFlag::Capitalize],
        FormatFlag::Capitalize => &[FormatFlag::Lowercase, FormatFlag::Uppercase],
        _ => &[],
    }
}

impl Transaction {
    /// Toggles `flag` over the selection. A collapsed selection only flips
    /// the pending format used for the next typed text. Returns whether
    /// anything changed.
    pub fn format_text(&mut self, flag: FormatFlag) -> Result<bool> {
        let Some(selection) = self.selection().cloned() else {
            return Ok(false);
        };
        if selection.is_collapsed() {
            let mut selection = selection;
            selection.format.toggle(flag.mask());
            self.set_selection(Some(selection));
            return Ok(true);
        }

        let enable = !selection.has_format(self.tree(), flag);
        let backward = selection.is_backward(self.tree());
        let covered = self.isolate_selection(&selection)?;
        if covered.is_empty() {
            return Ok(false);
        }
        for key in &covered {
            let data = self.text_mut(*key)?;
            data.format.set(flag.mask(), enable);
            if enable {
                for other in exclusive_with(flag) {
                    data.format.remove(other.mask());
                }
            }
        }
        tracing::debug!(%flag, enable, nodes = covered.len(), "format text");
        self.select_covered(&selection, &covered, backward);
        Ok(true)
    }

    /// Sets the `font-size` of the selected text, clamped to the toolbar's
    /// range. Returns the size applied.
    pub fn set_font_size(&mut self, size: u32) -> Result<u32> {
        let size = size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE);
        let Some(selection) = self.selection().cloned() else {
            return Ok(size);
        };
        let value = format!("{size}px");
        if selection.is_collapsed() {
            let mut selection = selection;
            selection.style = patch_style(&selection.style, "font-size", Some(&value));
            self.set_selection(Some(selection));
            return Ok(size);
        }

        let backward = selection.is_backward(self.tree());
        let covered = self.isolate_selection(&selection)?;
        for key in &covered {
            let data = self.text_mut(*key)?;
            data.style = patch_style(&data.style, "font-size", Some(&value));
        }
        self.select_covered(&selection, &covered, backward);
        Ok(size)
    }

    /// Moves the selection's font size one step along the toolbar scale.
    pub fn step_font_size(&mut self, step: FontSizeStep) -> Result<u32> {
        let current = self
            .selection()
            .map(|selection| {
                let default = format!("{DEFAULT_FONT_SIZE}px");
                selection.style_value(self.tree(), "font-size", &default)
            })
            .and_then(|value| parse_px(&value))
            .unwrap_or(DEFAULT_FONT_SIZE);
        self.set_font_size(calculate_next_font_size(current, step))
    }

    /// Converts the top-level blocks touched by the selection to
    /// `block_type`. Asking for the list type every selected block already
    /// has turns those lists back into paragraphs.
    pub fn set_block_type(&mut self, block_type: BlockType) -> Result<bool> {
        let Some(selection) = self.selection().cloned() else {
            return Ok(false);
        };
        let blocks = self.selected_blocks(&selection)?;
        if blocks.is_empty() {
            return Ok(false);
        }

        let converted = match block_type.list_type() {
            Some(list_type) if self.all_lists_of(&blocks, list_type) => {
                self.convert_blocks(&blocks, BlockType::Paragraph)?
            }
            Some(list_type) => self.convert_to_lists(&blocks, list_type)?,
            None => self.convert_blocks(&blocks, block_type)?,
        };
        tracing::debug!(block_type = block_type.label(), blocks = converted.len(), "set block type");

        if !selection.is_valid(self.tree()) {
            let caret = converted.first().map(|block| {
                let point = match self.text_nodes(*block).first() {
                    Some(text) => Point::new(*text, 0),
                    None => Point::new(*block, 0),
                };
                Selection::collapsed(point)
            });
            self.set_selection(caret);
        }
        Ok(!converted.is_empty())
    }

    /// Wraps the selected text in a link to `url`, or updates the link the
    /// selection is on. `None` removes the links around the selection.
    pub fn toggle_link(&mut self, url: Option<&str>) -> Result<bool> {
        let Some(selection) = self.selection().cloned() else {
            return Ok(false);
        };
        match url {
            Some(url) => self.apply_link(&selection, url),
            None => self.remove_links(&selection),
        }
    }

    fn apply_link(&mut self, selection: &Selection, url: &str) -> Result<bool> {
        if let Some(link) = self
            .get_selected_node(selection)
            .and_then(|node| self.enclosing_link(node))
        {
            self.set_link_url(link, url)?;
            return Ok(true);
        }
        if selection.is_collapsed() {
            return Ok(false);
        }

        let backward = selection.is_backward(self.tree());
        let covered = self.isolate_selection(selection)?;
        let mut runs: Vec<Vec<NodeKey>> = Vec::new();
        for key in &covered {
            if let Some(link) = self.enclosing_link(*key) {
                self.set_link_url(link, url)?;
                continue;
            }
            let continues_run = runs.last().and_then(|run| run.last()).is_some_and(|prev| {
                self.next_sibling(*prev) == Some(*key)
            });
            match runs.last_mut() {
                Some(run) if continues_run => run.push(*key),
                _ => runs.push(vec![*key]),
            }
        }

        for run in runs {
            let Some(first) = run.first().copied() else {
                continue;
            };
            let accepts_link = self
                .parent_of(first)
                .and_then(|parent| self.kind(parent))
                .is_some_and(|kind| kind.accepts_child(&NodeKind::Link { url: String::new() }));
            if !accepts_link {
                continue;
            }
            let link = self.create(NodeKind::Link {
                url: url.to_string(),
            });
            self.insert_before(first, link)?;
            self.append(link, &run)?;
        }
        self.select_covered(selection, &covered, backward);
        Ok(!covered.is_empty())
    }

    fn remove_links(&mut self, selection: &Selection) -> Result<bool> {
        let mut links: Vec<NodeKey> = Vec::new();
        let candidates: Vec<NodeKey> = if selection.is_collapsed() {
            self.get_selected_node(selection).into_iter().collect()
        } else {
            selection
                .text_ranges(self.tree())
                .into_iter()
                .map(|range| range.key)
                .collect()
        };
        for key in candidates {
            if let Some(link) = self.enclosing_link(key) {
                if !links.contains(&link) {
                    links.push(link);
                }
            }
        }
        for link in &links {
            let children = self.children_of(*link).to_vec();
            for child in children {
                self.insert_before(*link, child)?;
            }
            self.remove(*link)?;
        }
        Ok(!links.is_empty())
    }

    fn enclosing_link(&self, key: NodeKey) -> Option<NodeKey> {
        let parent = self.parent_of(key);
        std::iter::once(key)
            .chain(parent)
            .find(|candidate| matches!(self.kind(*candidate), Some(NodeKind::Link { .. })))
    }

    /// Splits text at the selection boundaries so every covered range is a
    /// whole text node. Returns those nodes in document order.
    fn isolate_selection(&mut self, selection: &Selection) -> Result<Vec<NodeKey>> {
        let ranges = selection.text_ranges(self.tree());
        let mut covered = Vec::with_capacity(ranges.len());
        for range in ranges {
            let len = self.text(range.key).map(TextData::len).unwrap_or(0);
            if range.end < len {
                self.split_text(range.key, range.end)?;
            }
            let key = if range.start > 0 {
                self.split_text(range.key, range.start)?.1
            } else {
                range.key
            };
            covered.push(key);
        }
        Ok(covered)
    }

    fn select_covered(&mut self, original: &Selection, covered: &[NodeKey], backward: bool) {
        if original.table_cells(self.tree()).is_some() {
            return;
        }
        let (Some(first), Some(last)) = (covered.first(), covered.last()) else {
            return;
        };
        let start = Point::new(*first, 0);
        let end = Point::new(*last, self.text(*last).map(TextData::len).unwrap_or(0));
        let (anchor, focus) = if backward { (end, start) } else { (start, end) };
        let mut selection = Selection::new(anchor, focus);
        selection.format = original.format;
        selection.style = original.style.clone();
        self.set_selection(Some(selection));
    }

    /// Top-level blocks between the selection's start and end, in order.
    fn selected_blocks(&self, selection: &Selection) -> Result<Vec<NodeKey>> {
        let (start, end) = selection.ordered_points(self.tree());
        let first = self.find_nearest_block_ancestor(start.key)?;
        let last = self.find_nearest_block_ancestor(end.key)?;
        let Some(parent) = self.parent_of(first) else {
            return Ok(vec![first]);
        };
        if self.parent_of(last) != Some(parent) {
            return Ok(vec![first]);
        }
        let siblings = self.children_of(parent);
        let (Some(from), Some(to)) = (
            siblings.iter().position(|key| *key == first),
            siblings.iter().position(|key| *key == last),
        ) else {
            return Ok(vec![first]);
        };
        Ok(siblings[from.min(to)..=from.max(to)].to_vec())
    }

    fn all_lists_of(&self, blocks: &[NodeKey], target: ListType) -> bool {
        blocks.iter().all(|block| {
            matches!(self.kind(*block), Some(NodeKind::List { list_type, .. }) if *list_type == target)
        })
    }

    /// Rebuilds each block as a non-list block. Lists are flattened into one
    /// block per item. Tables and rules are left alone.
    fn convert_blocks(&mut self, blocks: &[NodeKey], target: BlockType) -> Result<Vec<NodeKey>> {
        let mut converted = Vec::new();
        for block in blocks {
            match self.kind(*block).cloned() {
                Some(NodeKind::List { .. }) => {
                    for item in self.list_entries(*block) {
                        let inline: Vec<NodeKey> = self
                            .children_of(item)
                            .iter()
                            .copied()
                            .filter(|child| self.kind(*child).is_some_and(NodeKind::is_inline))
                            .collect();
                        let replacement = self.create_block(target);
                        self.fill_block(replacement, target, &inline)?;
                        self.insert_before(*block, replacement)?;
                        converted.push(replacement);
                    }
                    self.remove(*block)?;
                }
                Some(NodeKind::Table | NodeKind::HorizontalRule) | None => {}
                Some(kind) if BlockType::from_kind(&kind) == Some(target) => {
                    converted.push(*block);
                }
                Some(_) => {
                    let replacement = self.create_block(target);
                    if target == BlockType::Code {
                        let inline = self.children_of(*block).to_vec();
                        self.fill_block(replacement, target, &inline)?;
                        self.replace(*block, replacement, false)?;
                    } else {
                        self.replace(*block, replacement, true)?;
                    }
                    converted.push(replacement);
                }
            }
        }
        Ok(converted)
    }

    fn convert_to_lists(&mut self, blocks: &[NodeKey], list_type: ListType) -> Result<Vec<NodeKey>> {
        let checked = (list_type == ListType::Check).then_some(false);
        let mut lists = Vec::new();
        for block in blocks {
            match self.kind(*block).cloned() {
                Some(NodeKind::List { .. }) => {
                    for list in self.descendants(*block) {
                        match self.kind(list).cloned() {
                            Some(NodeKind::List { .. }) => self.set_list_type(list, list_type)?,
                            Some(NodeKind::ListItem { checked: current }) => {
                                let value = match (list_type, current) {
                                    (ListType::Check, Some(value)) => Some(value),
                                    _ => checked,
                                };
                                self.set_checked(list, value)?;
                            }
                            _ => {}
                        }
                    }
                    lists.push(*block);
                }
                Some(NodeKind::Table | NodeKind::HorizontalRule) | None => {}
                Some(_) => {
                    let inline = self.children_of(*block).to_vec();
                    let item = self.create_list_item(checked);
                    self.append(item, &inline)?;
                    let list = self.create_list(list_type);
                    self.append(list, &[item])?;
                    self.replace(*block, list, false)?;
                    lists.push(list);
                }
            }
        }

        let mut merged = Vec::new();
        for list in lists {
            if !self.contains(list) {
                continue;
            }
            let survivor = match self.previous_sibling(list) {
                Some(prev) if self.same_list_type(prev, list_type) => {
                    let items = self.children_of(list).to_vec();
                    self.append(prev, &items)?;
                    self.remove(list)?;
                    prev
                }
                _ => list,
            };
            if let Some(next) = self.next_sibling(survivor) {
                if self.same_list_type(next, list_type) {
                    let items = self.children_of(next).to_vec();
                    self.append(survivor, &items)?;
                    self.remove(next)?;
                }
            }
            if !merged.contains(&survivor) {
                merged.push(survivor);
            }
        }
        Ok(merged)
    }

    fn same_list_type(&self, key: NodeKey, target: ListType) -> bool {
        matches!(self.kind(key), Some(NodeKind::List { list_type, .. }) if *list_type == target)
    }

    /// Items of a list that carry content, nested lists included, in
    /// document order.
    fn list_entries(&self, list: NodeKey) -> Vec<NodeKey> {
        self.descendants(list)
            .into_iter()
            .filter(|key| matches!(self.kind(*key), Some(NodeKind::ListItem { .. })))
            .filter(|item| {
                self.children_of(*item)
                    .iter()
                    .any(|child| !matches!(self.kind(*child), Some(NodeKind::List { .. })))
                    || self.children_of(*item).is_empty()
            })
            .collect()
    }

    fn create_block(&mut self, target: BlockType) -> NodeKey {
        match target {
            BlockType::Quote => self.create(NodeKind::Quote),
            BlockType::Code => self.create(NodeKind::Code { language: None }),
            other => match other.heading_level().and_then(HeadingLevel::new) {
                Some(level) => self.create_heading(level),
                None => self.create_paragraph(),
            },
        }
    }

    /// Moves `inline` into `block`. Code blocks take the plain text instead.
    fn fill_block(&mut self, block: NodeKey, target: BlockType, inline: &[NodeKey]) -> Result<()> {
        if target != BlockType::Code {
            return self.append(block, inline);
        }
        let content: String = inline.iter().map(|key| self.text_content(*key)).collect();
        if !content.is_empty() {
            let text = self.create_text(content);
            self.append(block, &[text])?;
        }
        Ok(())
    }
}

impl Editor {
    pub fn format_text(&mut self, flag: FormatFlag) -> Result<bool> {
        self.update(|tx| tx.format_text(flag))
    }

    pub fn set_font_size(&mut self, size: u32) -> Result<u32> {
        self.update(|tx| tx.set_font_size(size))
    }

    pub fn step_font_size(&mut self, step: FontSizeStep) -> Result<u32> {
        self.update(|tx| tx.step_font_size(step))
    }

    pub fn set_block_type(&mut self, block_type: BlockType) -> Result<bool> {
        self.update(|tx| tx.set_block_type(block_type))
    }

    pub fn toggle_link(&mut self, url: Option<&str>) -> Result<bool> {
        self.update(|tx| tx.toggle_link(url))
    }
}
