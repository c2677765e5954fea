//! Byte-string keys.
//!
//! Keys are compared as big-endian bit strings over a caller-chosen length in bytes, passed on
//! every call and never stored. A branch's `bit` is the number of leading bits shared by every
//! key below it; the child is picked by the key's bit at that position. Equal keys hang in a
//! *duplicate subtree* whose branches carry negative `bit` values, ordered left to right by
//! insertion.

use std::cmp::Ordering;

use crate::error::{Result, TreeError};
use crate::node::{LeafState, Link, Parent, Side};
use crate::tree::Tree;
use crate::utils::arena::NodeId;
use crate::utils::bits::{bit_at, cmp_bits, equal_bits};

/// Insertion and lookup for trees keyed by byte strings of `len` bytes.
pub trait BytesOps<V> {
    /// Link the detached node `id`, comparing keys over their first `len` bytes.
    ///
    /// Returns `id`, or in a unique tree that already holds an equal key, the node holding it
    /// (`id` then stays detached). Fails with [`TreeError::KeyTooLong`] when `len` bytes hold more
    /// than `i32::MAX` bits.
    fn insert(&mut self, id: NodeId, len: usize) -> Result<NodeId>;

    /// First node whose key equals `key` over `len` bytes.
    fn lookup(&self, key: &[u8], len: usize) -> Option<NodeId>;

    /// Verify the structure of the tree and the placement of every key.
    fn check_invariants(&self, len: usize) -> Result<()>;
}

impl<K, V> BytesOps<V> for Tree<K, V>
where
    K: AsRef<[u8]>,
{
    fn insert(&mut self, id: NodeId, len: usize) -> Result<NodeId> {
        self.check_detached(id)?;
        // Bounds every split position below, so the `as i32` casts never wrap.
        let len_bits = len
            .checked_mul(8)
            .filter(|bits| i32::try_from(*bits).is_ok())
            .ok_or(TreeError::KeyTooLong(len))?;
        let Some(mut next) = self.root.left else {
            self.link_into_empty(id);
            return Ok(id);
        };

        let mut parent = Parent::Root;
        let mut bit = 0;
        loop {
            match next {
                Link::Leaf(old) => {
                    let new_key = self.nodes[id].key.as_ref();
                    let old_key = self.nodes[old].key.as_ref();
                    bit = equal_bits(new_key, old_key, bit, len_bits);
                    match cmp_bits(new_key, old_key, bit, len_bits) {
                        Ordering::Less => {
                            self.insert_above(id, parent, next, Side::Left, bit as i32)
                        }
                        Ordering::Greater => {
                            self.insert_above(id, parent, next, Side::Right, bit as i32)
                        }
                        Ordering::Equal if self.is_unique() => return Ok(old),
                        Ordering::Equal => {
                            // The lone key becomes a duplicate subtree of two.
                            self.insert_above(id, parent, next, Side::Right, -1);
                            #[cfg(feature = "tracing")]
                            tracing::trace!(node = ?id, with = ?old, "created duplicate subtree");
                        }
                    }
                    return Ok(id);
                }
                Link::Branch(owner) => {
                    let branch = *self.branch(owner);
                    let new_key = self.nodes[id].key.as_ref();
                    let old_key = self.nodes[owner].key.as_ref();
                    if branch.is_dup() {
                        // Everything below shares one key; compare to the end.
                        bit = equal_bits(new_key, old_key, bit, len_bits);
                    } else if bit < branch.bit as usize {
                        bit = equal_bits(new_key, old_key, bit, branch.bit as usize);
                    }

                    if branch.is_dup() || bit < branch.bit as usize {
                        match cmp_bits(new_key, old_key, bit, len_bits) {
                            Ordering::Less => {
                                self.insert_above(id, parent, next, Side::Left, bit as i32)
                            }
                            Ordering::Greater => {
                                self.insert_above(id, parent, next, Side::Right, bit as i32)
                            }
                            Ordering::Equal if self.is_unique() => {
                                return Ok(self.walk_down(next, Side::Left));
                            }
                            Ordering::Equal => self.insert_dup(owner, id),
                        }
                        return Ok(id);
                    }

                    let side = Side::from_bit(bit_at(new_key, branch.bit as usize));
                    parent = Parent::Branch(owner, side);
                    next = branch.child(side);
                }
            }
        }
    }

    fn lookup(&self, key: &[u8], len: usize) -> Option<NodeId> {
        let len_bits = len << 3;
        let mut next = self.root.left?;
        let mut bit = 0;
        loop {
            match next {
                Link::Leaf(leaf) => {
                    let stored = self.nodes[leaf].key.as_ref();
                    return (equal_bits(key, stored, 0, len_bits) == len_bits).then_some(leaf);
                }
                Link::Branch(owner) => {
                    let stored = self.nodes[owner].key.as_ref();
                    let branch = self.branch(owner);
                    if branch.is_dup() {
                        if equal_bits(key, stored, 0, len_bits) != len_bits {
                            return None;
                        }
                        return Some(self.walk_down(next, Side::Left));
                    }

                    let split = branch.bit as usize;
                    bit = equal_bits(key, stored, bit, split);
                    if bit < split {
                        return None;
                    }
                    next = branch.child(Side::from_bit(bit_at(key, split)));
                }
            }
        }
    }

    fn check_invariants(&self, len: usize) -> Result<()> {
        self.check_structure()?;

        let len_bits = len << 3;
        for (id, node) in self.nodes.iter() {
            let parent = match node.leaf {
                LeafState::Detached => continue,
                LeafState::Duplicate => {
                    return Err(TreeError::Corrupted(format!(
                        "node {id:?} is a chained duplicate in a byte-string tree"
                    )));
                }
                LeafState::Linked(parent) => parent,
            };
            let key = node.key.as_ref();
            for (owner, side) in self.ancestors(parent) {
                let branch = self.branch(owner);
                let stored = self.nodes[owner].key.as_ref();
                let placed = if branch.is_dup() {
                    equal_bits(key, stored, 0, len_bits) == len_bits
                } else {
                    let split = branch.bit as usize;
                    split < len_bits
                        && equal_bits(key, stored, 0, split) == split
                        && Side::from_bit(bit_at(key, split)) == side
                };
                if !placed {
                    return Err(TreeError::Corrupted(format!(
                        "leaf {id:?} misplaced under the branch of {owner:?}"
                    )));
                }
            }

            if let Some(branch) = &node.branch {
                for side in Side::BOTH {
                    let Link::Branch(child) = branch.child(side) else {
                        continue;
                    };
                    let child_bit = self.branch(child).bit;
                    // Ordinary splits deepen going down; a duplicate subtree only holds
                    // duplicate branches, with values rising toward -1.
                    let deeper = if branch.is_dup() {
                        child_bit < 0 && child_bit > branch.bit
                    } else {
                        child_bit < 0 || child_bit > branch.bit
                    };
                    if !deeper {
                        return Err(TreeError::Corrupted(format!(
                            "branch of {child:?} does not split below its parent {id:?}"
                        )));
                    }
                }
            }
        }

        self.check_order(|a, b| cmp_bits(a.as_ref(), b.as_ref(), 0, len_bits).is_le())
    }
}

impl<K, V> Tree<K, V>
where
    K: AsRef<[u8]>,
{
    /// Add `id` to the duplicate subtree rooted at the branch of `sub`, after every member
    /// already there.
    ///
    /// New branches go into the deepest hole on the rightmost path (a spot where a child's
    /// `bit` skips a value), or above the whole group one level lower when there is none, which
    /// keeps the group's depth logarithmic in its size.
    fn insert_dup(&mut self, mut sub: NodeId, id: NodeId) {
        let mut head = sub;
        loop {
            let branch = self.branch(head);
            let Link::Branch(next) = branch.child(Side::Right) else {
                break;
            };
            if self.branch(next).bit > branch.bit + 1 {
                sub = next;
            }
            head = next;
        }

        let bottom = *self.branch(head);
        if bottom.bit < -1 {
            // A hole right above the last leaf.
            let leaf = bottom.child(Side::Right);
            self.insert_above(id, Parent::Branch(head, Side::Right), leaf, Side::Right, -1);
        } else {
            let above = *self.branch(sub);
            self.insert_above(id, above.parent, Link::Branch(sub), Side::Right, above.bit - 1);
        }
        #[cfg(feature = "tracing")]
        tracing::trace!(node = ?id, group = ?sub, "grew duplicate subtree");
    }
}

#[cfg(test)]
mod tests {
    use rand::seq::SliceRandom;
    use rand::{Rng, rng};

    use crate::error::TreeError;
    use crate::keys::bytes::BytesOps;
    use crate::stats::TreeStatsTrait;
    use crate::tree::Tree;
    use crate::utils::arena::NodeId;

    fn insert(tree: &mut Tree<Vec<u8>, u32>, key: &[u8], value: u32, len: usize) -> NodeId {
        let id = tree.alloc(key.to_vec(), value);
        tree.insert(id, len).unwrap()
    }

    fn keys_of(tree: &Tree<Vec<u8>, u32>) -> Vec<Vec<u8>> {
        tree.iter().map(|(_, k, _)| k.clone()).collect()
    }

    #[test]
    fn test_example_a_ab_ab() {
        let mut tree = Tree::<Vec<u8>, u32>::new();
        let a = insert(&mut tree, b"a", 0, 2);
        let ab1 = insert(&mut tree, b"ab", 1, 2);
        let ab2 = insert(&mut tree, b"ab", 2, 2);
        assert_eq!(tree.len(), 3);

        let mut uniques = vec![];
        let mut cur = tree.first();
        while let Some(id) = cur {
            uniques.push(id);
            cur = tree.next_unique(id).unwrap();
        }
        assert_eq!(uniques, vec![a, ab1]);

        assert_eq!(tree.next(ab1).unwrap(), Some(ab2));
        assert_eq!(tree.prev(ab2).unwrap(), Some(ab1));
        assert_eq!(tree.lookup(b"ab", 2), Some(ab1));
        assert_eq!(tree.lookup(b"a", 2), Some(a));
        assert_eq!(tree.lookup(b"a\0", 2), Some(a));
        assert_eq!(tree.lookup(b"b", 2), None);
        assert_eq!(tree.prev_unique(ab2).unwrap(), Some(a));
        assert_eq!(tree.next_unique(a).unwrap(), Some(ab1));
        tree.check_invariants(2).unwrap();
    }

    #[test]
    fn test_unique_tree_refuses_duplicates() {
        let mut tree = Tree::<Vec<u8>, u32>::new_unique();
        let first = insert(&mut tree, b"key", 0, 3);
        insert(&mut tree, b"kez", 1, 3);

        let dup = tree.alloc(b"key".to_vec(), 2);
        assert_eq!(tree.insert(dup, 3).unwrap(), first);
        assert!(!tree.is_linked(dup));
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.insert(first, 3), Err(TreeError::AlreadyLinked(first)));
        tree.check_invariants(3).unwrap();
    }

    #[test]
    fn test_insert_rejects_oversized_length() {
        let too_long = (i32::MAX as usize >> 3) + 1;
        let mut tree = Tree::<Vec<u8>, u32>::new();
        let id = tree.alloc(b"a".to_vec(), 0);
        assert_eq!(tree.insert(id, too_long), Err(TreeError::KeyTooLong(too_long)));
        assert!(tree.is_empty());

        insert(&mut tree, b"b", 1, 1);
        assert_eq!(tree.insert(id, too_long), Err(TreeError::KeyTooLong(too_long)));
        assert_eq!(tree.insert(id, usize::MAX), Err(TreeError::KeyTooLong(usize::MAX)));
        assert!(!tree.is_linked(id));

        // The largest accepted length still links.
        assert_eq!(tree.insert(id, too_long - 1).unwrap(), id);
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_duplicate_subtree_keeps_insertion_order() {
        let mut tree = Tree::<Vec<u8>, u32>::new();
        insert(&mut tree, b"aa", 100, 2);
        let dups: Vec<NodeId> = (0..37).map(|i| insert(&mut tree, b"mm", i, 2)).collect();
        insert(&mut tree, b"zz", 200, 2);
        tree.check_invariants(2).unwrap();

        let values: Vec<u32> = tree.iter().map(|(_, _, v)| *v).collect();
        let mut expected = vec![100];
        expected.extend(0..37);
        expected.push(200);
        assert_eq!(values, expected);

        let backward: Vec<u32> = tree.iter().rev().map(|(_, _, v)| *v).collect();
        expected.reverse();
        assert_eq!(backward, expected);

        assert_eq!(tree.lookup(b"mm", 2), Some(dups[0]));
        let uniques: Vec<&Vec<u8>> = tree.iter_unique().map(|(_, k, _)| k).collect();
        assert_eq!(uniques, vec![&b"aa".to_vec(), &b"mm".to_vec(), &b"zz".to_vec()]);

        // The group stays shallow.
        let stats = tree.get_tree_stats();
        assert!(stats.max_height <= 12, "height {}", stats.max_height);
        assert_eq!(stats.num_duplicates, 36);
    }

    #[test]
    fn test_remove_from_duplicate_subtree() {
        let mut tree = Tree::<Vec<u8>, u32>::new();
        let mut dups: Vec<NodeId> = (0..20).map(|i| insert(&mut tree, b"k", i, 1)).collect();
        insert(&mut tree, b"j", 99, 1);

        let mut rng = rng();
        dups.shuffle(&mut rng);
        for (n, id) in dups.iter().enumerate() {
            assert!(tree.unlink(*id).unwrap());
            tree.check_invariants(1).unwrap();

            let mut remaining: Vec<u32> = dups[n + 1..]
                .iter()
                .map(|id| *tree.value(*id).unwrap())
                .collect();
            remaining.sort();
            let got: Vec<u32> = tree.iter().skip(1).map(|(_, _, v)| *v).collect();
            assert_eq!(got, remaining);

            // Freshly inserted duplicates still go after the survivors.
            if n == 10 {
                let late = insert(&mut tree, b"k", 1000, 1);
                assert_eq!(tree.last(), Some(late));
                tree.remove(late).unwrap();
            }
        }
        assert_eq!(keys_of(&tree), vec![b"j".to_vec()]);
    }

    #[test]
    fn test_random_strings() {
        let mut rng = rng();
        let mut tree = Tree::<Vec<u8>, u32>::new();
        let mut model: Vec<(Vec<u8>, u32)> = vec![];
        for i in 0..1_500 {
            let len = rng.random_range(0..=4);
            let key: Vec<u8> = (0..len).map(|_| rng.random_range(b'a'..=b'd')).collect();
            insert(&mut tree, &key, i, 4);
            model.push((key, i));
        }
        tree.check_invariants(4).unwrap();

        // Zero padding makes "ab" sort like "ab\0\0"; a stable sort keeps insertion order.
        let pad = |k: &[u8]| {
            let mut k = k.to_vec();
            k.resize(4, 0);
            k
        };
        model.sort_by_key(|(k, _)| pad(k));
        let got: Vec<u32> = tree.iter().map(|(_, _, v)| *v).collect();
        let expected: Vec<u32> = model.iter().map(|(_, v)| *v).collect();
        assert_eq!(got, expected);

        for (key, _) in model.iter().take(100) {
            let found = tree.lookup(key, 4).unwrap();
            assert_eq!(pad(tree.key(found).unwrap()), pad(key));
        }
    }

    #[test]
    fn test_str_keys() {
        let mut tree = Tree::<&str, ()>::new();
        for word in ["pear", "apple", "fig", "plum", "kiwi"] {
            let id = tree.alloc(word, ());
            tree.insert(id, 8).unwrap();
        }
        let words: Vec<&str> = tree.iter().map(|(_, k, _)| *k).collect();
        assert_eq!(words, vec!["apple", "fig", "kiwi", "pear", "plum"]);
        assert!(tree.lookup(b"kiwi", 8).is_some());
        assert!(tree.lookup(b"kiw", 8).is_none());
        tree.check_invariants(8).unwrap();
    }
}
