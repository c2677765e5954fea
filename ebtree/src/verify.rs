//! Structural invariant checks.
//!
//! [`Tree::check_structure`] verifies everything that does not depend on the key type: back
//! references, child distinctness, duplicate chains, counts, and that every branch in use sits
//! above its own node's leaf. The key specializations layer their placement and ordering checks
//! on top of it in their `check_invariants`.

use crate::error::{Result, TreeError};
use crate::node::{LeafState, Link, Parent, Side};
use crate::tree::Tree;
use crate::utils::arena::NodeId;
use crate::utils::list::ChainLinks;

fn corrupted<T>(msg: String) -> Result<T> {
    Err(TreeError::Corrupted(msg))
}

/// The branches above a slot, nearest first, with the side the path goes through.
pub(crate) struct Ancestors<'a, K, V> {
    tree: &'a Tree<K, V>,
    parent: Parent,
}

impl<K, V> Iterator for Ancestors<'_, K, V> {
    type Item = (NodeId, Side);

    fn next(&mut self) -> Option<Self::Item> {
        match self.parent {
            Parent::Root => None,
            Parent::Branch(owner, side) => {
                self.parent = self.tree.branch(owner).parent;
                Some((owner, side))
            }
        }
    }
}

impl<K, V> Tree<K, V> {
    pub(crate) fn ancestors(&self, parent: Parent) -> Ancestors<'_, K, V> {
        Ancestors { tree: self, parent }
    }

    /// Check the key-independent invariants of the tree.
    pub fn check_structure(&self) -> Result<()> {
        let mut leaves = 0;
        let mut branches = 0;
        let mut chained = 0;

        if let Some(root) = self.root.left {
            // Bounded so that a cycle shows up as an error instead of a hang.
            let budget = 2 * self.nodes.size();
            let mut stack = vec![(root, Parent::Root)];
            while let Some((link, parent)) = stack.pop() {
                if leaves + branches > budget {
                    return corrupted(format!("more links than nodes, cycle through {link:?}?"));
                }
                let Some(node) = self.nodes.get(link.node()) else {
                    return corrupted(format!("{link:?} names a freed node"));
                };
                match link {
                    Link::Leaf(id) => {
                        if node.leaf != LeafState::Linked(parent) {
                            return corrupted(format!(
                                "leaf {id:?} hangs from {parent:?} but records {:?}",
                                node.leaf
                            ));
                        }
                        leaves += 1;
                        chained += self.check_chain(id)?;
                    }
                    Link::Branch(id) => {
                        let Some(branch) = &node.branch else {
                            return corrupted(format!("{link:?} names an inert branch"));
                        };
                        if branch.parent != parent {
                            return corrupted(format!(
                                "branch of {id:?} hangs from {parent:?} but records {:?}",
                                branch.parent
                            ));
                        }
                        if branch.children[0] == branch.children[1] {
                            return corrupted(format!("branch of {id:?} has twin children"));
                        }
                        branches += 1;
                        for side in Side::BOTH {
                            stack.push((branch.child(side), Parent::Branch(id, side)));
                        }
                    }
                }
            }
        }

        if leaves > 0 && branches != leaves - 1 {
            return corrupted(format!("{branches} branches in use for {leaves} leaves"));
        }
        if leaves + chained != self.linked {
            return corrupted(format!(
                "{} nodes reachable but {} counted as linked",
                leaves + chained,
                self.linked
            ));
        }

        // Everything that claims a role must have been reached in that role, and every branch
        // must sit above its own leaf.
        let (mut claimed_leaves, mut claimed_branches, mut claimed_chained) = (0, 0, 0);
        for (id, node) in self.nodes.iter() {
            match node.leaf {
                LeafState::Detached => {
                    if node.branch.is_some() || node.dups != ChainLinks::alone(id) {
                        return corrupted(format!("detached node {id:?} still holds links"));
                    }
                }
                LeafState::Duplicate => {
                    claimed_chained += 1;
                    if node.branch.is_some() {
                        return corrupted(format!("chained duplicate {id:?} has a branch"));
                    }
                }
                LeafState::Linked(parent) => {
                    claimed_leaves += 1;
                    if node.branch.is_some() {
                        claimed_branches += 1;
                        if !self.ancestors(parent).any(|(owner, _)| owner == id) {
                            return corrupted(format!("branch of {id:?} is not above its leaf"));
                        }
                    }
                }
            }
        }
        if (claimed_leaves, claimed_branches, claimed_chained) != (leaves, branches, chained) {
            return corrupted(format!(
                "nodes claim {claimed_leaves} leaves, {claimed_branches} branches and \
                 {claimed_chained} duplicates, tree holds {leaves}, {branches} and {chained}"
            ));
        }
        Ok(())
    }

    /// Walk the duplicate chain headed by `head`, returning the number of members behind it.
    fn check_chain(&self, head: NodeId) -> Result<usize> {
        let mut members = 0;
        let mut cur = head;
        loop {
            let next = self.nodes[cur].dups.next;
            let Some(next_node) = self.nodes.get(next) else {
                return corrupted(format!("chain of {head:?} runs into a freed node"));
            };
            if next_node.dups.prev != cur {
                return corrupted(format!("chain of {head:?} is broken after {cur:?}"));
            }
            if next == head {
                return Ok(members);
            }
            if next_node.leaf != LeafState::Duplicate {
                return corrupted(format!("{next:?} is chained behind {head:?} but not a duplicate"));
            }
            members += 1;
            if members > self.linked {
                return corrupted(format!("chain of {head:?} does not close"));
            }
            cur = next;
        }
    }

    /// Check that stepping forward visits every linked node once in an order accepted by
    /// `in_order`, and that stepping backward retraces it exactly.
    pub(crate) fn check_order(&self, in_order: impl Fn(&K, &K) -> bool) -> Result<()> {
        let mut seen = 0;
        let mut prev: Option<NodeId> = None;
        let mut cur = self.first();
        while let Some(id) = cur {
            seen += 1;
            if seen > self.linked {
                return corrupted("forward walk visits more nodes than are linked".to_string());
            }
            if let Some(p) = prev
                && !in_order(&self.nodes[p].key, &self.nodes[id].key)
            {
                return corrupted(format!("{p:?} and {id:?} are out of order"));
            }
            if self.step_prev(id) != prev {
                return corrupted(format!("stepping back from {id:?} does not reach {prev:?}"));
            }
            prev = cur;
            cur = self.step_next(id);
        }
        if seen != self.linked || prev != self.last() {
            return corrupted(format!(
                "forward walk visits {seen} of {} nodes and ends at {prev:?}",
                self.linked
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::error::TreeError;
    use crate::keys::scalar::ScalarOps;
    use crate::node::{Link, Parent};
    use crate::tree::Tree;

    fn sample() -> Tree<u8, ()> {
        let mut tree = Tree::new();
        for k in [3u8, 1, 2, 2, 7] {
            let id = tree.alloc(k, ());
            tree.insert(id).unwrap();
        }
        tree
    }

    #[test]
    fn test_sample_is_sound() {
        let tree = sample();
        tree.check_structure().unwrap();
        tree.check_invariants().unwrap();
    }

    #[test]
    fn test_detects_wrong_count() {
        let mut tree = sample();
        tree.linked += 1;
        assert!(matches!(tree.check_structure(), Err(TreeError::Corrupted(_))));
    }

    #[test]
    fn test_detects_broken_back_reference() {
        let mut tree = sample();
        let first = tree.first().unwrap();
        tree.set_parent(Link::Leaf(first), Parent::Root);
        assert!(matches!(tree.check_structure(), Err(TreeError::Corrupted(_))));
    }

    #[test]
    fn test_detects_misplaced_key() {
        let mut tree = sample();
        let seven = tree.lookup(7).unwrap();
        tree.nodes[seven].key = 0;
        tree.check_structure().unwrap();
        assert!(matches!(tree.check_invariants(), Err(TreeError::Corrupted(_))));
    }
}
