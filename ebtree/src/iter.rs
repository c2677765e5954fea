use std::iter::FusedIterator;

use crate::tree::Tree;
use crate::utils::arena::NodeId;

type IterEntry<'a, K, V> = (NodeId, &'a K, &'a V);

/// In-order iterator over every linked node of a [`Tree`], duplicates included.
///
/// Walks the tree with the same steps as [`Tree::next`] from the front and [`Tree::prev`] from
/// the back, so both directions agree on where duplicates go.
pub struct Iter<'a, K, V> {
    tree: &'a Tree<K, V>,
    front: Option<NodeId>,
    back: Option<NodeId>,
    remaining: usize,
}

impl<'a, K, V> Iter<'a, K, V> {
    pub(crate) fn new(tree: &'a Tree<K, V>) -> Self {
        Self {
            tree,
            front: tree.first(),
            back: tree.last(),
            remaining: tree.len(),
        }
    }

    fn entry(&self, id: NodeId) -> IterEntry<'a, K, V> {
        let node = &self.tree.nodes[id];
        (id, &node.key, &node.value)
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = IterEntry<'a, K, V>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.front?;
        self.remaining -= 1;
        self.front = self.tree.step_next(id);
        Some(self.entry(id))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> DoubleEndedIterator for Iter<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.back?;
        self.remaining -= 1;
        self.back = self.tree.step_prev(id);
        Some(self.entry(id))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// In-order iterator over the first node of each distinct key.
pub struct UniqueIter<'a, K, V> {
    tree: &'a Tree<K, V>,
    next: Option<NodeId>,
}

impl<'a, K, V> UniqueIter<'a, K, V> {
    pub(crate) fn new(tree: &'a Tree<K, V>) -> Self {
        Self {
            tree,
            next: tree.first(),
        }
    }
}

impl<'a, K, V> Iterator for UniqueIter<'a, K, V> {
    type Item = IterEntry<'a, K, V>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        self.next = self.tree.step_next_unique(id);
        let node = &self.tree.nodes[id];
        Some((id, &node.key, &node.value))
    }
}

impl<K, V> FusedIterator for UniqueIter<'_, K, V> {}

impl<'a, K, V> IntoIterator for &'a Tree<K, V> {
    type Item = IterEntry<'a, K, V>;
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
