//! Unsigned integer keys.
//!
//! A branch's `bit` is the 1-based position of the highest bit in which its two subtrees differ,
//! so every key below a branch agrees with the branch owner's key on all bits from `bit` up, and
//! the child is picked by bit `bit - 1` of the key. Equal keys are chained behind the first one.

use std::ops::{Bound, RangeBounds};

use num_traits::{PrimInt, Unsigned};

use crate::error::{Result, TreeError};
use crate::node::{LeafState, Link, Parent, Side};
use crate::range::Range;
use crate::tree::Tree;
use crate::utils::arena::NodeId;
use crate::utils::bits::{bit_width, fls, shr_or_zero};

/// Insertion and lookup for trees keyed by an unsigned integer.
pub trait ScalarOps<K, V> {
    /// Link the detached node `id`.
    ///
    /// Returns `id`, or in a unique tree that already holds an equal key, the node holding it
    /// (`id` then stays detached).
    fn insert(&mut self, id: NodeId) -> Result<NodeId>;

    /// First node whose key equals `x`.
    fn lookup(&self, x: K) -> Option<NodeId>;

    /// First node whose key is `>= x`.
    fn lookup_ge(&self, x: K) -> Option<NodeId>;

    /// Last node whose key is `<= x`.
    fn lookup_le(&self, x: K) -> Option<NodeId>;

    /// In-order iteration over the nodes whose keys fall within `bounds`.
    fn range<R: RangeBounds<K>>(&self, bounds: R) -> Range<'_, K, V>;

    /// Verify the structure of the tree and the placement of every key.
    fn check_invariants(&self) -> Result<()>;
}

#[inline]
fn side_of<K: PrimInt>(x: K, bit: i32) -> Side {
    if (x >> (bit - 1) as usize) & K::one() == K::zero() {
        Side::Left
    } else {
        Side::Right
    }
}

impl<K, V> ScalarOps<K, V> for Tree<K, V>
where
    K: PrimInt + Unsigned,
{
    fn insert(&mut self, id: NodeId) -> Result<NodeId> {
        let x = self.check_detached(id)?.key;
        let Some(mut next) = self.root.left else {
            self.link_into_empty(id);
            return Ok(id);
        };

        let mut parent = Parent::Root;
        loop {
            match next {
                Link::Leaf(leaf) => {
                    if self.nodes[leaf].key == x {
                        if self.is_unique() {
                            return Ok(leaf);
                        }
                        self.chain_duplicate(leaf, id);
                        return Ok(id);
                    }
                    break;
                }
                Link::Branch(owner) => {
                    let branch = *self.branch(owner);
                    // No common bits left above this split: the new key goes above it.
                    if shr_or_zero(x ^ self.nodes[owner].key, branch.bit as u32) != K::zero() {
                        break;
                    }
                    let side = side_of(x, branch.bit);
                    parent = Parent::Branch(owner, side);
                    next = branch.child(side);
                }
            }
        }

        let other = self.nodes[next.node()].key;
        let side = if x > other { Side::Right } else { Side::Left };
        self.insert_above(id, parent, next, side, fls(x ^ other) as i32);
        Ok(id)
    }

    fn lookup(&self, x: K) -> Option<NodeId> {
        let mut next = self.root.left?;
        loop {
            match next {
                Link::Leaf(leaf) => return (self.nodes[leaf].key == x).then_some(leaf),
                Link::Branch(owner) => {
                    let key = self.nodes[owner].key;
                    // The owner's leaf sits somewhere below, and owners are always group heads.
                    if key == x {
                        return Some(owner);
                    }
                    let branch = self.branch(owner);
                    if shr_or_zero(x ^ key, branch.bit as u32) != K::zero() {
                        return None;
                    }
                    next = branch.child(side_of(x, branch.bit));
                }
            }
        }
    }

    fn lookup_ge(&self, x: K) -> Option<NodeId> {
        let mut next = self.root.left?;
        let mut parent = Parent::Root;
        loop {
            match next {
                Link::Leaf(leaf) => {
                    if self.nodes[leaf].key >= x {
                        return Some(leaf);
                    }
                    return self.next_from(parent);
                }
                Link::Branch(owner) => {
                    let key = self.nodes[owner].key;
                    let branch = *self.branch(owner);
                    let bit = branch.bit as u32;
                    if shr_or_zero(x ^ key, bit) != K::zero() {
                        // The whole subtree is either above or below x.
                        if shr_or_zero(key, bit) > shr_or_zero(x, bit) {
                            return Some(self.walk_down(next, Side::Left));
                        }
                        return self.next_from(branch.parent);
                    }
                    let side = side_of(x, branch.bit);
                    parent = Parent::Branch(owner, side);
                    next = branch.child(side);
                }
            }
        }
    }

    fn lookup_le(&self, x: K) -> Option<NodeId> {
        let mut next = self.root.left?;
        let mut parent = Parent::Root;
        loop {
            match next {
                Link::Leaf(leaf) => {
                    if self.nodes[leaf].key <= x {
                        return Some(self.chain_tail(leaf));
                    }
                    return self.prev_from(parent);
                }
                Link::Branch(owner) => {
                    let key = self.nodes[owner].key;
                    let branch = *self.branch(owner);
                    let bit = branch.bit as u32;
                    if shr_or_zero(x ^ key, bit) != K::zero() {
                        if shr_or_zero(key, bit) < shr_or_zero(x, bit) {
                            return Some(self.chain_tail(self.walk_down(next, Side::Right)));
                        }
                        return self.prev_from(branch.parent);
                    }
                    let side = side_of(x, branch.bit);
                    parent = Parent::Branch(owner, side);
                    next = branch.child(side);
                }
            }
        }
    }

    fn range<R: RangeBounds<K>>(&self, bounds: R) -> Range<'_, K, V> {
        let first = match bounds.start_bound() {
            Bound::Included(x) => self.lookup_ge(*x),
            Bound::Excluded(x) => x.checked_add(&K::one()).and_then(|x| self.lookup_ge(x)),
            Bound::Unbounded => self.first(),
        };
        let last = match bounds.end_bound() {
            Bound::Included(x) => self.lookup_le(*x),
            Bound::Excluded(x) => x.checked_sub(&K::one()).and_then(|x| self.lookup_le(x)),
            Bound::Unbounded => self.last(),
        };
        match (first, last) {
            (Some(f), Some(l)) if self.nodes[f].key <= self.nodes[l].key => {
                Range::new(self, f, l)
            }
            _ => Range::empty(self),
        }
    }

    fn check_invariants(&self) -> Result<()> {
        self.check_structure()?;

        let width = bit_width::<K>() as i32;
        for (id, node) in self.nodes.iter() {
            match node.leaf {
                LeafState::Detached => continue,
                LeafState::Duplicate => {
                    let head = self.group_head(id);
                    if self.nodes[head].key != node.key {
                        return Err(TreeError::Corrupted(format!(
                            "duplicate {id:?} chained behind {head:?} with a different key"
                        )));
                    }
                    continue;
                }
                LeafState::Linked(parent) => {
                    for (owner, side) in self.ancestors(parent) {
                        let bit = self.branch(owner).bit;
                        if bit < 1 || bit > width {
                            return Err(TreeError::Corrupted(format!(
                                "branch of {owner:?} splits on bit {bit}"
                            )));
                        }
                        let common = shr_or_zero(node.key ^ self.nodes[owner].key, bit as u32);
                        if common != K::zero() || side_of(node.key, bit) != side {
                            return Err(TreeError::Corrupted(format!(
                                "leaf {id:?} misplaced under the branch of {owner:?}"
                            )));
                        }
                    }
                }
            }
            if let Some(branch) = &node.branch {
                for side in Side::BOTH {
                    if let Link::Branch(child) = branch.child(side)
                        && self.branch(child).bit >= branch.bit
                    {
                        return Err(TreeError::Corrupted(format!(
                            "branch of {child:?} does not split below its parent {id:?}"
                        )));
                    }
                }
            }
        }

        self.check_order(|a, b| a <= b)
    }
}
