use std::collections::HashSet;

use super::{
    ImportOptions,
    classify::{ClassifiedLine, LineClass, ListLine, classify_lines},
    inline::append_inline,
    rule::apply_rule,
    table::{apply_divider, apply_row},
};
use crate::Result;
use crate::tree::{DocumentTree, ListType, NodeKey, NodeKind};

/// Replaces the children of `container` (the root or a table cell) with the
/// blocks parsed from `source`.
///
/// Every line first becomes a paragraph of its own; the block transformers
/// then rewrite those paragraphs in document order, looking at their
/// already-assembled neighbours to merge quotes, lists and tables. Blank
/// lines only exist as placeholders during assembly.
pub fn import_markdown(
    tree: &mut DocumentTree,
    container: NodeKey,
    source: &str,
    options: &ImportOptions,
) -> Result<()> {
    for child in tree.children_of(container).to_vec() {
        tree.remove(child)?;
    }

    let mut lines = Vec::new();
    let mut placeholders = HashSet::new();
    for line in classify_lines(source, options) {
        let paragraph = tree.create_paragraph();
        tree.append(container, &[paragraph])?;
        match &line.class {
            LineClass::Blank => {
                placeholders.insert(paragraph);
            }
            LineClass::Text(text) => append_inline(tree, paragraph, text)?,
            _ => {}
        }
        lines.push((paragraph, line));
    }

    let assembly = Assembly {
        options,
        importing: true,
        placeholders: &placeholders,
    };
    for (paragraph, ClassifiedLine { class, raw }) in lines {
        let transformed = assembly.apply(tree, paragraph, &class)?;
        if !transformed && !matches!(class, LineClass::Blank | LineClass::Text(_)) {
            // Degraded lines stay as the literal text they came from.
            append_inline(tree, paragraph, &raw)?;
        }
    }

    for placeholder in placeholders {
        if tree.contains(placeholder) {
            tree.remove(placeholder)?;
        }
    }
    tracing::debug!(
        container = %container,
        blocks = tree.children_of(container).len(),
        "imported markdown"
    );
    Ok(())
}

/// Parses a whole document into a fresh tree.
pub fn parse_document(source: &str, options: &ImportOptions) -> Result<DocumentTree> {
    let mut tree = DocumentTree::new();
    let root = tree.root();
    import_markdown(&mut tree, root, source, options)?;
    Ok(tree)
}

/// Second pass: turns a classified line's paragraph into its block.
pub(crate) struct Assembly<'a> {
    pub options: &'a ImportOptions,
    /// Consecutive quote lines only merge while importing a document.
    pub importing: bool,
    /// Blank-line paragraphs that do not count as following blocks.
    pub placeholders: &'a HashSet<NodeKey>,
}

impl Assembly<'_> {
    /// Returns false when the paragraph was left untouched.
    pub(crate) fn apply(
        &self,
        tree: &mut DocumentTree,
        paragraph: NodeKey,
        class: &LineClass,
    ) -> Result<bool> {
        match class {
            LineClass::Blank | LineClass::Text(_) => Ok(false),
            LineClass::Heading { level, text } => {
                let heading = tree.create_heading(*level);
                append_inline(tree, heading, text)?;
                tree.replace(paragraph, heading, false)?;
                Ok(true)
            }
            LineClass::Quote(text) => {
                self.place_quote(tree, paragraph, text)?;
                Ok(true)
            }
            LineClass::CodeBlock { language, content } => {
                let code = tree.create(NodeKind::Code {
                    language: language.clone(),
                });
                if !content.is_empty() {
                    let text = tree.create_text(content.as_str());
                    tree.append(code, &[text])?;
                }
                tree.replace(paragraph, code, false)?;
                Ok(true)
            }
            LineClass::ListItem(item) => {
                place_list_item(tree, paragraph, item)?;
                Ok(true)
            }
            LineClass::TableRow(cells) => apply_row(tree, paragraph, cells, self.options),
            LineClass::TableDivider => apply_divider(tree, paragraph),
            LineClass::HorizontalRule => {
                let has_next = self.has_following_block(tree, paragraph);
                apply_rule(tree, paragraph, has_next)?;
                Ok(true)
            }
        }
    }

    fn has_following_block(&self, tree: &DocumentTree, paragraph: NodeKey) -> bool {
        let mut sibling = tree.next_sibling(paragraph);
        while let Some(key) = sibling {
            if !self.placeholders.contains(&key) {
                return true;
            }
            sibling = tree.next_sibling(key);
        }
        false
    }

    fn place_quote(&self, tree: &mut DocumentTree, paragraph: NodeKey, text: &str) -> Result<()> {
        let previous = tree
            .previous_sibling(paragraph)
            .filter(|key| matches!(tree.kind(*key), Some(NodeKind::Quote)));
        match previous {
            Some(quote) if self.importing => {
                let line_break = tree.create_text("\n");
                tree.append(quote, &[line_break])?;
                append_inline(tree, quote, text)?;
                tree.normalize_text_children(quote);
                tree.remove(paragraph)?;
            }
            _ => {
                let quote = tree.create(NodeKind::Quote);
                append_inline(tree, quote, text)?;
                tree.replace(paragraph, quote, false)?;
            }
        }
        Ok(())
    }
}

/// Attaches a list item for `paragraph`, continuing the list right above it
/// when there is one. Deeper items go into a nested list held by a wrapper
/// item of the list one level up.
fn place_list_item(tree: &mut DocumentTree, paragraph: NodeKey, line: &ListLine) -> Result<()> {
    let checked = match line.list_type {
        ListType::Check => Some(line.checked.unwrap_or(false)),
        ListType::Bullet | ListType::Number => None,
    };
    let item = tree.create_list_item(checked);
    append_inline(tree, item, &line.text)?;

    let previous = tree
        .previous_sibling(paragraph)
        .filter(|key| list_type_of(tree, *key).is_some());
    let Some(top) = previous else {
        let list = new_list(tree, line);
        tree.append(list, &[item])?;
        tree.replace(paragraph, list, false)?;
        return Ok(());
    };

    if line.depth == 0 {
        if list_type_of(tree, top) == Some(line.list_type) {
            tree.append(top, &[item])?;
            tree.remove(paragraph)?;
        } else {
            let list = new_list(tree, line);
            tree.append(list, &[item])?;
            tree.replace(paragraph, list, false)?;
        }
        return Ok(());
    }

    let mut list = top;
    for _ in 0..line.depth {
        let nested = tree
            .last_child(list)
            .and_then(|last| nested_list(tree, last));
        list = match nested {
            Some(nested) => nested,
            None => open_nested_list(tree, list, line)?,
        };
    }
    if list_type_of(tree, list) != Some(line.list_type) {
        let parent_list = tree
            .parent_of(list)
            .and_then(|wrapper| tree.parent_of(wrapper))
            .unwrap_or(top);
        list = open_nested_list(tree, parent_list, line)?;
    }
    tree.append(list, &[item])?;
    tree.remove(paragraph)?;
    Ok(())
}

fn new_list(tree: &mut DocumentTree, line: &ListLine) -> NodeKey {
    let start = match line.list_type {
        ListType::Number => line.number,
        ListType::Bullet | ListType::Check => 1,
    };
    tree.create(NodeKind::List {
        list_type: line.list_type,
        start,
    })
}

/// Appends a wrapper item holding a fresh nested list to `list`.
fn open_nested_list(tree: &mut DocumentTree, list: NodeKey, line: &ListLine) -> Result<NodeKey> {
    let wrapper = tree.create_list_item(None);
    let nested = new_list(tree, line);
    tree.append(wrapper, &[nested])?;
    tree.append(list, &[wrapper])?;
    Ok(nested)
}

pub(crate) fn list_type_of(tree: &DocumentTree, key: NodeKey) -> Option<ListType> {
    match tree.kind(key) {
        Some(NodeKind::List { list_type, .. }) => Some(*list_type),
        _ => None,
    }
}

/// The list held by a wrapper item, i.e. an item whose only child is a list.
pub(crate) fn nested_list(tree: &DocumentTree, item: NodeKey) -> Option<NodeKey> {
    match tree.children_of(item) {
        [only] if list_type_of(tree, *only).is_some() => Some(*only),
        _ => None,
    }
}
