//! Structural statistics.
//!
//! Useful for seeing how deep a given key distribution makes the tree, and how much of it is
//! taken up by duplicates:
//!
//! ```rust
//! use ebtree::{ScalarOps, Tree, TreeStatsTrait};
//!
//! let mut tree = Tree::<u32, ()>::new();
//! for k in [1, 2, 2, 3] {
//!     let id = tree.alloc(k, ());
//!     tree.insert(id).unwrap();
//! }
//! let stats = tree.get_tree_stats();
//! assert_eq!(stats.num_values, 4);
//! assert_eq!(stats.num_leaves, 3);
//! assert_eq!(stats.num_duplicates, 1);
//! ```

use crate::node::{LeafState, Link};
use crate::tree::Tree;

pub trait TreeStatsTrait {
    fn get_tree_stats(&self) -> TreeStats;
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TreeStats {
    /// Linked nodes, duplicates included.
    pub num_values: usize,
    /// Leaf positions in the structure.
    pub num_leaves: usize,
    /// Branches in use, duplicate-subtree branches included.
    pub num_inner_nodes: usize,
    /// Branches with a negative split value.
    pub num_dup_branches: usize,
    /// Nodes that are not the first of their key: chained duplicates plus duplicate-subtree
    /// branches, since each of those adds exactly one equal key.
    pub num_duplicates: usize,
    /// Allocated nodes that are not linked.
    pub num_detached: usize,
    /// Largest number of branches between the root and a leaf.
    pub max_height: usize,
    pub avg_height: f64,
}

impl<K, V> TreeStatsTrait for Tree<K, V> {
    fn get_tree_stats(&self) -> TreeStats {
        let mut stats = TreeStats {
            num_values: self.len(),
            ..Default::default()
        };
        for (_, node) in self.nodes.iter() {
            match node.leaf {
                LeafState::Detached => stats.num_detached += 1,
                LeafState::Duplicate => stats.num_duplicates += 1,
                LeafState::Linked(_) => {}
            }
        }

        let Some(root) = self.root.left else {
            return stats;
        };
        let mut height_sum = 0;
        let mut stack = vec![(root, 0usize)];
        while let Some((link, depth)) = stack.pop() {
            match link {
                Link::Leaf(_) => {
                    stats.num_leaves += 1;
                    stats.max_height = stats.max_height.max(depth);
                    height_sum += depth;
                }
                Link::Branch(id) => {
                    let branch = self.branch(id);
                    stats.num_inner_nodes += 1;
                    if branch.is_dup() {
                        stats.num_dup_branches += 1;
                        stats.num_duplicates += 1;
                    }
                    stack.extend(branch.children.iter().map(|c| (*c, depth + 1)));
                }
            }
        }
        stats.avg_height = height_sum as f64 / stats.num_leaves as f64;
        stats
    }
}
