use thiserror::Error;

use crate::tree::NodeKey;

pub type Result<T> = std::result::Result<T, TreeError>;

/// Structural misuse of the document tree.
///
/// Reference-not-found conditions coming from outside the editor (an agent
/// naming a stale key) are not reported through this type; the command
/// executor turns them into a failure outcome instead.
#[derive(Debug, Error)]
pub enum TreeError {
    #[error("node {0} does not exist")]
    NodeNotFound(NodeKey),

    #[error("the root node cannot be removed, replaced or moved")]
    RootImmutable,

    #[error("node {0} is a leaf and cannot hold children")]
    LeafNode(NodeKey),

    #[error("a {child} node cannot be placed inside a {parent} node")]
    InvalidChild {
        parent: &'static str,
        child: &'static str,
    },

    #[error("moving node {0} would make it its own ancestor")]
    WouldCreateCycle(NodeKey),

    #[error("node {0} is not a text node")]
    NotText(NodeKey),

    #[error("node {key} is not a {expected} node")]
    KindMismatch {
        key: NodeKey,
        expected: &'static str,
    },

    #[error("offset {offset} is out of range for node {key} (length {len})")]
    OffsetOutOfRange {
        key: NodeKey,
        offset: usize,
        len: usize,
    },

    #[error("node {0} has no block ancestor below the root")]
    NoBlockAncestor(NodeKey),

    #[error("node {0} is not attached to a parent")]
    Detached(NodeKey),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}
