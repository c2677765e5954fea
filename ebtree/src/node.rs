//! The dual-role node record and the tagged references that connect nodes.
//!
//! Every stored key owns exactly one [`Node`]. The node always carries a *leaf* (the key itself)
//! and may additionally lend its *branch* to the tree as an internal split point between two
//! other subtrees. References between nodes say which of the two roles they address.

use crate::utils::arena::NodeId;
use crate::utils::list::{ChainLinks, Chained};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Side {
    Left = 0,
    Right = 1,
}

impl Side {
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    #[inline]
    pub fn from_bit(bit: usize) -> Side {
        if bit & 1 == 0 { Side::Left } else { Side::Right }
    }

    pub const BOTH: [Side; 2] = [Side::Left, Side::Right];
}

/// A tagged reference: a node plus the role of that node being pointed at.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Link {
    Leaf(NodeId),
    Branch(NodeId),
}

impl Link {
    #[inline]
    pub fn node(self) -> NodeId {
        match self {
            Link::Leaf(id) | Link::Branch(id) => id,
        }
    }
}

/// Where a leaf or a branch hangs from: the root slot, or one side of some node's branch.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Parent {
    Root,
    Branch(NodeId, Side),
}

/// The branch role of a node, present only while the branch is in use.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct Branch {
    pub(crate) parent: Parent,
    pub(crate) children: [Link; 2],
    /// Split criterion. For scalar keys this is the 1-based position of the highest bit in
    /// which the two subtrees differ. For byte-string keys it is the number of leading bits
    /// both subtrees share, or a negative value on the branches of a duplicate subtree.
    pub(crate) bit: i32,
}

impl Branch {
    #[inline]
    pub(crate) fn child(&self, side: Side) -> Link {
        self.children[side.index()]
    }

    #[inline]
    pub(crate) fn is_dup(&self) -> bool {
        self.bit < 0
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LeafState {
    /// Not part of any tree. Link fields are meaningless.
    Detached,
    /// Occupies a leaf position in the tree structure.
    Linked(Parent),
    /// Chained behind an equal key's node; has no position of its own.
    Duplicate,
}

pub(crate) struct Node<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) leaf: LeafState,
    pub(crate) branch: Option<Branch>,
    pub(crate) dups: ChainLinks,
}

impl<K, V> Node<K, V> {
    pub(crate) fn new(id: NodeId, key: K, value: V) -> Self {
        Self {
            key,
            value,
            leaf: LeafState::Detached,
            branch: None,
            dups: ChainLinks::alone(id),
        }
    }

    #[inline]
    pub(crate) fn is_linked(&self) -> bool {
        !matches!(self.leaf, LeafState::Detached)
    }
}

impl<K, V> Chained for Node<K, V> {
    #[inline]
    fn chain(&self) -> &ChainLinks {
        &self.dups
    }

    #[inline]
    fn chain_mut(&mut self) -> &mut ChainLinks {
        &mut self.dups
    }
}

/// The tree handle: the slot the whole tree hangs from, and the key policy.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Root {
    pub(crate) left: Option<Link>,
    pub(crate) unique: bool,
}

#[cfg(test)]
mod tests {
    use crate::node::{Link, Node, Side};
    use crate::utils::arena::NodeArena;
    use crate::utils::list::is_alone;

    #[test]
    fn test_side() {
        assert_eq!(Side::from_bit(0), Side::Left);
        assert_eq!(Side::from_bit(1), Side::Right);
        assert_eq!(Side::Left.opposite(), Side::Right);
        assert_eq!(Side::Right.index(), 1);
    }

    #[test]
    fn test_new_node_is_detached() {
        let mut arena = NodeArena::new();
        let id = arena.add(|id| Node::new(id, 7u32, "seven"));
        assert!(!arena[id].is_linked());
        assert!(arena[id].branch.is_none());
        assert!(is_alone(&arena, id));
        assert_eq!(Link::Branch(id).node(), Link::Leaf(id).node());
    }
}
