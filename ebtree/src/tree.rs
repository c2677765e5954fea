//! Elastic binary tree engine.
//!
//! This module contains [`Tree`], the representation-independent part of the crate: node
//! storage, traversal in both directions, and O(1) removal. Key-specific insertion and lookup
//! live in [`crate::keys`].

use crate::error::{Result, TreeError};
use crate::iter::{Iter, UniqueIter};
use crate::node::{Branch, LeafState, Link, Node, Parent, Root, Side};
use crate::utils::arena::{NodeArena, NodeId};
use crate::utils::list::{self, ChainLinks};

/// Construction-time configuration of a [`Tree`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct TreeOptions {
    /// Refuse to link a key that is already present; `insert` hands back the existing node
    /// instead.
    pub unique: bool,
    /// Number of node slots to reserve up front.
    pub capacity: usize,
}

/// An elastic binary tree: an ordered index where each key costs exactly one node, and that
/// node doubles as an internal split point when the tree needs one.
///
/// ## Features
///
/// - **One node per key**: no separate allocation for internal structure
/// - **No rebalancing**: the shape follows the bit structure of the keys
/// - **O(1) removal**: unlinking touches a bounded number of nodes
/// - **Duplicates**: equal keys are kept and iterated in insertion order, unless the tree was
///   built with [`TreeOptions::unique`]
///
/// The tree owns the storage of its nodes but leaves their lifecycle to the caller: a node is
/// created detached with [`Tree::alloc`], linked by a key-specific `insert`
/// ([`crate::ScalarOps`] or [`crate::BytesOps`]), detached again by [`Tree::unlink`], and
/// released by [`Tree::free`]. Ids stay valid across linking and unlinking.
///
/// ## Examples
///
/// ```rust
/// use ebtree::{ScalarOps, Tree};
///
/// let mut tree = Tree::<u32, &str>::new();
/// for (k, v) in [(8, "eight"), (12, "twelve"), (10, "ten")] {
///     let id = tree.alloc(k, v);
///     tree.insert(id).unwrap();
/// }
///
/// let keys: Vec<u32> = tree.iter().map(|(_, k, _)| *k).collect();
/// assert_eq!(keys, vec![8, 10, 12]);
///
/// let twelve = tree.lookup(12).unwrap();
/// assert_eq!(tree.value(twelve), Some(&"twelve"));
/// assert_eq!(tree.remove(twelve).unwrap(), (12, "twelve"));
/// assert!(tree.lookup(12).is_none());
/// ```
pub struct Tree<K, V> {
    pub(crate) nodes: NodeArena<Node<K, V>>,
    pub(crate) root: Root,
    pub(crate) linked: usize,
}

impl<K, V> Default for Tree<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Tree<K, V> {
    /// Create an empty tree that accepts duplicate keys.
    pub fn new() -> Self {
        Self::with_options(TreeOptions::default())
    }

    /// Create an empty tree that only ever holds one node per key.
    pub fn new_unique() -> Self {
        Self::with_options(TreeOptions {
            unique: true,
            ..Default::default()
        })
    }

    pub fn with_options(options: TreeOptions) -> Self {
        Self {
            nodes: NodeArena::with_capacity(options.capacity),
            root: Root {
                left: None,
                unique: options.unique,
            },
            linked: 0,
        }
    }

    pub fn is_unique(&self) -> bool {
        self.root.unique
    }

    /// Number of linked nodes, duplicates included.
    pub fn len(&self) -> usize {
        self.linked
    }

    pub fn is_empty(&self) -> bool {
        self.root.left.is_none()
    }

    /// Number of allocated nodes, linked or not.
    pub fn node_count(&self) -> usize {
        self.nodes.size()
    }

    /// Create a detached node carrying `key` and `value`.
    pub fn alloc(&mut self, key: K, value: V) -> NodeId {
        self.nodes.add(|id| Node::new(id, key, value))
    }

    /// Release a detached node and hand back its contents.
    pub fn free(&mut self, id: NodeId) -> Result<(K, V)> {
        self.check_detached(id)?;
        let node = self.nodes.remove(id).ok_or(TreeError::UnknownNode(id))?;
        Ok((node.key, node.value))
    }

    /// Unlink a node and release it.
    pub fn remove(&mut self, id: NodeId) -> Result<(K, V)> {
        self.unlink(id)?;
        self.free(id)
    }

    pub fn key(&self, id: NodeId) -> Option<&K> {
        self.nodes.get(id).map(|n| &n.key)
    }

    pub fn value(&self, id: NodeId) -> Option<&V> {
        self.nodes.get(id).map(|n| &n.value)
    }

    pub fn value_mut(&mut self, id: NodeId) -> Option<&mut V> {
        self.nodes.get_mut(id).map(|n| &mut n.value)
    }

    pub fn is_linked(&self, id: NodeId) -> bool {
        self.nodes.get(id).is_some_and(|n| n.is_linked())
    }

    /// Leftmost node, or `None` if the tree is empty.
    pub fn first(&self) -> Option<NodeId> {
        self.root.left.map(|l| self.walk_down(l, Side::Left))
    }

    /// Rightmost node, or `None` if the tree is empty. If the last key has duplicates, this is
    /// the most recently inserted of them.
    pub fn last(&self) -> Option<NodeId> {
        self.root
            .left
            .map(|l| self.chain_tail(self.walk_down(l, Side::Right)))
    }

    /// In-order successor of a linked node. Duplicates of a key come out in insertion order
    /// before any larger key.
    pub fn next(&self, id: NodeId) -> Result<Option<NodeId>> {
        self.check_linked(id)?;
        Ok(self.step_next(id))
    }

    /// In-order predecessor of a linked node; exactly the reverse of [`Tree::next`].
    pub fn prev(&self, id: NodeId) -> Result<Option<NodeId>> {
        self.check_linked(id)?;
        Ok(self.step_prev(id))
    }

    /// First node of the next larger key, skipping the rest of `id`'s duplicates.
    pub fn next_unique(&self, id: NodeId) -> Result<Option<NodeId>> {
        self.check_linked(id)?;
        Ok(self.step_next_unique(id))
    }

    /// Last node of the next smaller key, skipping the rest of `id`'s duplicates.
    pub fn prev_unique(&self, id: NodeId) -> Result<Option<NodeId>> {
        self.check_linked(id)?;
        Ok(self.step_prev_unique(id))
    }

    /// Detach a linked node from the tree in constant time. The node keeps its key and value
    /// and can be inserted again or freed.
    ///
    /// Returns `true` if the tree still holds other nodes, `false` if it is now empty.
    pub fn unlink(&mut self, id: NodeId) -> Result<bool> {
        let state = self.check_linked(id)?.leaf;
        let parent = match state {
            LeafState::Linked(parent) => parent,
            LeafState::Duplicate => {
                // Chained duplicates have no structural role; the head keeps the tree non-empty.
                list::unlink(&mut self.nodes, id);
                self.nodes[id].leaf = LeafState::Detached;
                self.linked -= 1;
                #[cfg(feature = "tracing")]
                tracing::trace!(node = ?id, "unlinked chained duplicate");
                return Ok(true);
            }
            LeafState::Detached => unreachable!("check_linked accepted detached node {id:?}"),
        };

        // The node whose (inert) branch can take over ours, should ours be in use.
        let spare = if !list::is_alone(&self.nodes, id) {
            // Head of a duplicate chain: promote the next member into our leaf position.
            let promoted = self.nodes[id].dups.next;
            list::unlink(&mut self.nodes, id);
            self.nodes[promoted].leaf = LeafState::Linked(parent);
            self.set_child(parent, Link::Leaf(promoted));
            promoted
        } else {
            match parent {
                Parent::Root => {
                    // Nodes attached directly to the root never have their branch in use.
                    debug_assert!(self.nodes[id].branch.is_none());
                    self.root.left = None;
                    self.nodes[id].leaf = LeafState::Detached;
                    self.linked -= 1;
                    return Ok(false);
                }
                Parent::Branch(owner, side) => {
                    // Our parent branch goes away; the sibling moves up to the grandparent.
                    let Branch {
                        parent: grandparent,
                        children,
                        ..
                    } = *self.branch(owner);
                    let sibling = children[side.opposite().index()];
                    self.set_parent(sibling, grandparent);
                    self.set_child(grandparent, sibling);
                    self.nodes[owner].branch = None;
                    owner
                }
            }
        };

        self.nodes[id].leaf = LeafState::Detached;
        if let Some(branch) = self.nodes[id].branch.take() {
            // `spare` sits below our branch, so its key still discriminates correctly there.
            self.relocate_branch(branch, spare);
            #[cfg(feature = "tracing")]
            tracing::trace!(node = ?id, to = ?spare, bit = branch.bit, "relocated branch");
        }
        self.linked -= 1;
        Ok(true)
    }

    /// Detach every node. Storage is kept; all ids remain valid and detached.
    pub fn clear(&mut self) {
        for (id, node) in self.nodes.iter_mut() {
            node.leaf = LeafState::Detached;
            node.branch = None;
            node.dups = ChainLinks::alone(id);
        }
        self.root.left = None;
        self.linked = 0;
    }

    /// Iterate over all linked nodes in key order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(self)
    }

    /// Iterate over the first node of every distinct key, in key order.
    pub fn iter_unique(&self) -> UniqueIter<'_, K, V> {
        UniqueIter::new(self)
    }
}

// Internals implementation
impl<K, V> Tree<K, V> {
    pub(crate) fn check_linked(&self, id: NodeId) -> Result<&Node<K, V>> {
        let node = self.nodes.get(id).ok_or(TreeError::UnknownNode(id))?;
        if !node.is_linked() {
            return Err(TreeError::NotLinked(id));
        }
        Ok(node)
    }

    pub(crate) fn check_detached(&self, id: NodeId) -> Result<&Node<K, V>> {
        let node = self.nodes.get(id).ok_or(TreeError::UnknownNode(id))?;
        if node.is_linked() {
            return Err(TreeError::AlreadyLinked(id));
        }
        Ok(node)
    }

    #[inline]
    pub(crate) fn branch(&self, id: NodeId) -> &Branch {
        match &self.nodes[id].branch {
            Some(branch) => branch,
            None => unreachable!("node {id:?} is referenced as a branch but its branch is inert"),
        }
    }

    #[inline]
    fn branch_mut(&mut self, id: NodeId) -> &mut Branch {
        match &mut self.nodes[id].branch {
            Some(branch) => branch,
            None => unreachable!("node {id:?} is referenced as a branch but its branch is inert"),
        }
    }

    /// Point the slot `parent` at `link`.
    pub(crate) fn set_child(&mut self, parent: Parent, link: Link) {
        match parent {
            Parent::Root => self.root.left = Some(link),
            Parent::Branch(owner, side) => self.branch_mut(owner).children[side.index()] = link,
        }
    }

    /// Record `parent` as the back reference of whichever role `link` addresses.
    pub(crate) fn set_parent(&mut self, link: Link, parent: Parent) {
        match link {
            Link::Leaf(id) => self.nodes[id].leaf = LeafState::Linked(parent),
            Link::Branch(id) => self.branch_mut(id).parent = parent,
        }
    }

    #[inline]
    pub(crate) fn leaf_parent(&self, id: NodeId) -> Parent {
        match self.nodes[id].leaf {
            LeafState::Linked(parent) => parent,
            state => unreachable!("node {id:?} has no leaf position ({state:?})"),
        }
    }

    /// Descend from `link`, always taking `side`, down to a leaf.
    pub(crate) fn walk_down(&self, mut link: Link, side: Side) -> NodeId {
        loop {
            match link {
                Link::Leaf(id) => return id,
                Link::Branch(id) => link = self.branch(id).child(side),
            }
        }
    }

    /// Last member of the duplicate chain headed by `head` (`head` itself if alone).
    #[inline]
    pub(crate) fn chain_tail(&self, head: NodeId) -> NodeId {
        self.nodes[head].dups.prev
    }

    /// The node of `id`'s duplicate chain that occupies the leaf position.
    pub(crate) fn group_head(&self, id: NodeId) -> NodeId {
        let mut cur = id;
        while self.nodes[cur].leaf == LeafState::Duplicate {
            cur = self.nodes[cur].dups.next;
        }
        cur
    }

    /// Leftmost leaf after everything hanging from `parent`.
    pub(crate) fn next_from(&self, mut parent: Parent) -> Option<NodeId> {
        loop {
            match parent {
                Parent::Root => return None,
                Parent::Branch(owner, Side::Left) => {
                    let right = self.branch(owner).child(Side::Right);
                    return Some(self.walk_down(right, Side::Left));
                }
                Parent::Branch(owner, Side::Right) => parent = self.branch(owner).parent,
            }
        }
    }

    /// Last node before everything hanging from `parent`.
    pub(crate) fn prev_from(&self, mut parent: Parent) -> Option<NodeId> {
        loop {
            match parent {
                Parent::Root => return None,
                Parent::Branch(owner, Side::Right) => {
                    let left = self.branch(owner).child(Side::Left);
                    return Some(self.chain_tail(self.walk_down(left, Side::Right)));
                }
                Parent::Branch(owner, Side::Left) => parent = self.branch(owner).parent,
            }
        }
    }

    pub(crate) fn step_next(&self, id: NodeId) -> Option<NodeId> {
        let node = &self.nodes[id];
        match node.leaf {
            LeafState::Linked(parent) => {
                if node.dups.next != id {
                    return Some(node.dups.next);
                }
                self.next_from(parent)
            }
            LeafState::Duplicate => {
                let next = node.dups.next;
                match self.nodes[next].leaf {
                    LeafState::Duplicate => Some(next),
                    // Wrapped around to the chain head.
                    LeafState::Linked(parent) => self.next_from(parent),
                    LeafState::Detached => unreachable!("detached node {next:?} in a chain"),
                }
            }
            LeafState::Detached => None,
        }
    }

    pub(crate) fn step_prev(&self, id: NodeId) -> Option<NodeId> {
        let node = &self.nodes[id];
        match node.leaf {
            LeafState::Linked(parent) => self.prev_from(parent),
            LeafState::Duplicate => Some(node.dups.prev),
            LeafState::Detached => None,
        }
    }

    pub(crate) fn step_next_unique(&self, id: NodeId) -> Option<NodeId> {
        let mut parent = self.leaf_parent(self.group_head(id));
        loop {
            match parent {
                Parent::Root => return None,
                Parent::Branch(owner, Side::Left) if !self.branch(owner).is_dup() => {
                    let right = self.branch(owner).child(Side::Right);
                    return Some(self.walk_down(right, Side::Left));
                }
                Parent::Branch(owner, _) => parent = self.branch(owner).parent,
            }
        }
    }

    pub(crate) fn step_prev_unique(&self, id: NodeId) -> Option<NodeId> {
        let mut parent = self.leaf_parent(self.group_head(id));
        loop {
            match parent {
                Parent::Root => return None,
                Parent::Branch(owner, Side::Right) if !self.branch(owner).is_dup() => {
                    let left = self.branch(owner).child(Side::Left);
                    return Some(self.chain_tail(self.walk_down(left, Side::Right)));
                }
                Parent::Branch(owner, _) => parent = self.branch(owner).parent,
            }
        }
    }

    /// Link `id` as the only node of an empty tree.
    pub(crate) fn link_into_empty(&mut self, id: NodeId) {
        debug_assert!(self.root.left.is_none());
        let node = &mut self.nodes[id];
        node.leaf = LeafState::Linked(Parent::Root);
        node.branch = None;
        list::init(&mut self.nodes, id);
        self.root.left = Some(Link::Leaf(id));
        self.linked += 1;
    }

    /// Link `id` behind `head`, which holds an equal key.
    pub(crate) fn chain_duplicate(&mut self, head: NodeId, id: NodeId) {
        let node = &mut self.nodes[id];
        node.leaf = LeafState::Duplicate;
        node.branch = None;
        list::append(&mut self.nodes, head, id);
        self.linked += 1;
        #[cfg(feature = "tracing")]
        tracing::trace!(node = ?id, head = ?head, "chained duplicate");
    }

    /// Insert `id` between the slot `parent` and the subtree `old` currently hanging there.
    /// `id`'s branch becomes the new split point, with `id`'s leaf on `new_side` and `old` on
    /// the other side.
    pub(crate) fn insert_above(
        &mut self,
        id: NodeId,
        parent: Parent,
        old: Link,
        new_side: Side,
        bit: i32,
    ) {
        let mut children = [old, old];
        children[new_side.index()] = Link::Leaf(id);

        let node = &mut self.nodes[id];
        node.branch = Some(Branch {
            parent,
            children,
            bit,
        });
        node.leaf = LeafState::Linked(Parent::Branch(id, new_side));
        list::init(&mut self.nodes, id);

        self.set_child(parent, Link::Branch(id));
        self.set_parent(old, Parent::Branch(id, new_side.opposite()));
        self.linked += 1;
        #[cfg(feature = "tracing")]
        tracing::trace!(node = ?id, ?parent, ?old, bit, "split");
    }

    /// Install `branch` as the branch of `to`, repointing its parent and children.
    fn relocate_branch(&mut self, branch: Branch, to: NodeId) {
        debug_assert!(self.nodes[to].branch.is_none());
        self.nodes[to].branch = Some(branch);
        self.set_child(branch.parent, Link::Branch(to));
        for side in Side::BOTH {
            self.set_parent(branch.child(side), Parent::Branch(to, side));
        }
    }
}
