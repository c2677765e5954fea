use std::fmt;

use crate::utils::arena::NodeId;

/// Caller contract violations, plus the failures reported by the invariant checkers.
///
/// Lookup misses and unique-key collisions are not errors; they come back as `None` and as the
/// already-present node respectively.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TreeError {
    /// The id names a freed slot, or was never handed out by this tree.
    UnknownNode(NodeId),
    /// The operation needs a node that is linked into the tree.
    NotLinked(NodeId),
    /// The operation needs a detached node.
    AlreadyLinked(NodeId),
    /// A byte-key length whose bit count does not fit a branch's split position.
    KeyTooLong(usize),
    /// An invariant check found the structure inconsistent.
    Corrupted(String),
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeError::UnknownNode(id) => write!(f, "unknown node {id:?}"),
            TreeError::NotLinked(id) => write!(f, "node {id:?} is not linked into the tree"),
            TreeError::AlreadyLinked(id) => write!(f, "node {id:?} is already linked"),
            TreeError::KeyTooLong(len) => write!(f, "key length of {len} bytes is too long"),
            TreeError::Corrupted(msg) => write!(f, "tree corrupted: {msg}"),
        }
    }
}

impl std::error::Error for TreeError {}

/// Result type for tree operations.
pub type Result<T> = std::result::Result<T, TreeError>;
