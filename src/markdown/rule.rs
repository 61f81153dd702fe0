use crate::Result;
use crate::tree::{DocumentTree, NodeKey, NodeKind};

/// Markdown written for every horizontal rule, whichever form produced it.
pub(crate) const RULE_MARKDOWN: &str = "***";

/// Places a rule for `paragraph`. With a following block the paragraph is
/// replaced; as the last block it is emptied and kept below the rule so
/// there is still somewhere to put the cursor.
pub(crate) fn apply_rule(
    tree: &mut DocumentTree,
    paragraph: NodeKey,
    has_next: bool,
) -> Result<NodeKey> {
    let rule = tree.create(NodeKind::HorizontalRule);
    if has_next {
        tree.replace(paragraph, rule, false)?;
    } else {
        for child in tree.children_of(paragraph).to_vec() {
            tree.remove(child)?;
        }
        tree.insert_before(paragraph, rule)?;
    }
    Ok(rule)
}
