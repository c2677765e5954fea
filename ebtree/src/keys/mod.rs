//! Key specializations.
//!
//! The engine in [`crate::tree`] never looks at keys. Insertion and lookup do, and come in two
//! flavors that store duplicates differently:
//!
//! - [`scalar::ScalarOps`] for unsigned integer keys. Equal keys are chained behind the first
//!   one in a circular list and take no place in the tree structure.
//! - [`bytes::BytesOps`] for byte-string keys. Equal keys form a *duplicate subtree*: a group
//!   of branches with negative split values hanging where the single key would otherwise sit.

pub mod bytes;
pub mod scalar;

pub use bytes::BytesOps;
pub use scalar::ScalarOps;
