//! Elastic binary trees.
//!
//! An elastic binary tree is an ordered index in which every stored key costs exactly one node:
//! there are no separately allocated internal nodes, because each key's node can also serve as
//! the split point between two other subtrees. The shape follows the bit structure of the keys,
//! so nothing is ever rebalanced, and removing a node takes constant time.
//!
//! [`Tree`] holds the nodes and implements traversal and removal. Insertion and lookup depend
//! on the key representation and come from one of two traits:
//!
//! - [`ScalarOps`] for unsigned integer keys (`u8` through `u128`, `usize`)
//! - [`BytesOps`] for byte-string keys (`Vec<u8>`, `&[u8]`, `String`, ...) compared over a
//!   caller-chosen length
//!
//! Nodes are created detached with [`Tree::alloc`] and addressed by [`NodeId`] for their whole
//! life, which lets a caller keep a node in hand, unlink it, and insert it again without any
//! allocation.
//!
//! ```rust
//! use ebtree::{BytesOps, Tree};
//!
//! let mut tree = Tree::<&str, u32>::new();
//! for (word, n) in [("pear", 1), ("apple", 2), ("pear", 3)] {
//!     let id = tree.alloc(word, n);
//!     tree.insert(id, 8).unwrap();
//! }
//!
//! let pear = tree.lookup(b"pear", 8).unwrap();
//! assert_eq!(tree.value(pear), Some(&1));
//! // The second "pear" follows the first.
//! let next = tree.next(pear).unwrap().unwrap();
//! assert_eq!(tree.value(next), Some(&3));
//! // Skipping duplicates runs off the end.
//! assert_eq!(tree.next_unique(pear).unwrap(), None);
//! ```
//!
//! The crate is single threaded: a tree is a plain value, and mutation goes through `&mut`.
//!
//! With the `tracing` feature, structural changes are reported as `tracing` events at trace
//! level.

pub mod error;
pub mod iter;
pub mod keys;
mod node;
pub mod range;
pub mod stats;
pub mod tree;
pub mod utils;
mod verify;

pub use error::{Result, TreeError};
pub use iter::{Iter, UniqueIter};
pub use keys::{BytesOps, ScalarOps};
pub use range::Range;
pub use stats::{TreeStats, TreeStatsTrait};
pub use tree::{Tree, TreeOptions};
pub use utils::arena::NodeId;
