use std::iter::FusedIterator;

use crate::tree::Tree;
use crate::utils::arena::NodeId;

/// In-order iterator over a contiguous run of nodes, from a first node to a last node inclusive.
///
/// Built by [`crate::ScalarOps::range`], which resolves the bounds to their end nodes up front.
pub struct Range<'a, K, V> {
    tree: &'a Tree<K, V>,
    front: Option<NodeId>,
    back: Option<NodeId>,
}

impl<'a, K, V> Range<'a, K, V> {
    /// `first` must not come after `last` in the tree's order.
    pub(crate) fn new(tree: &'a Tree<K, V>, first: NodeId, last: NodeId) -> Self {
        Self {
            tree,
            front: Some(first),
            back: Some(last),
        }
    }

    pub(crate) fn empty(tree: &'a Tree<K, V>) -> Self {
        Self {
            tree,
            front: None,
            back: None,
        }
    }

    fn take(&mut self, id: NodeId) -> (NodeId, &'a K, &'a V) {
        if self.front == self.back {
            self.front = None;
            self.back = None;
        }
        let node = &self.tree.nodes[id];
        (id, &node.key, &node.value)
    }
}

impl<'a, K, V> Iterator for Range<'a, K, V> {
    type Item = (NodeId, &'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.front?;
        let entry = self.take(id);
        if self.front.is_some() {
            self.front = self.tree.step_next(id);
        }
        Some(entry)
    }
}

impl<K, V> DoubleEndedIterator for Range<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let id = self.back?;
        let entry = self.take(id);
        if self.back.is_some() {
            self.back = self.tree.step_prev(id);
        }
        Some(entry)
    }
}

impl<K, V> FusedIterator for Range<'_, K, V> {}
