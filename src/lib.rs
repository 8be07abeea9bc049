//! A self-balancing binary search tree, or AVL tree, built on an intrusive node substrate.
//!
//! The crate has two layers:
//!
//! - [`substrate`] owns the physical shape of a tree: nodes linked to their children and parent,
//!   rotations, and structural navigation. It never compares payloads, so any search-tree strategy
//!   can sit on top of it. Nodes are linked intrusively through [`cordyceps::Linked`].
//! - [`AvlTree`] owns the ordering: comparator-driven insertion, lookup, overwrite and removal,
//!   and the rebalancing walk that restores the AVL invariant after every change.
//!
//! ```
//! use cordyceps_avl::{AvlTree, Error};
//!
//! let mut tree = AvlTree::new();
//! tree.insert_batch([50, 45, 40, 48, 39, 43]);
//!
//! assert_eq!(tree.iter().copied().collect::<Vec<_>>(), [39, 40, 43, 45, 48, 50]);
//! assert_eq!(tree.iter_pre_order().copied().collect::<Vec<_>>(), [45, 40, 39, 43, 50, 48]);
//! assert_eq!(tree.iter_post_order().copied().collect::<Vec<_>>(), [39, 43, 40, 48, 50, 45]);
//!
//! let handle = tree.find(&43)?;
//! assert_eq!(tree.get_at(handle), Ok(&43));
//!
//! tree.erase(&43)?;
//! assert_eq!(tree.find(&43), Err(Error::NotFound));
//! assert_eq!(tree.get_at(handle), Err(Error::Invalidated));
//! # Ok::<(), Error>(())
//! ```
#![no_std]

// Conventions used in comments:
// - The height of an absent subtree is 0; a leaf has height 1.
// - A node is balanced if the heights of its subtrees differ by at most 1.
// - A node is `dir`-heavy if its `dir` subtree is at least 2 taller than the other.
//
// The fundamental invariants of an AVL tree are:
// 1. Every node is balanced.
// 2. Every payload in a node's left subtree orders strictly before the node's payload, and every
//    payload in its right subtree strictly after.
//
// Corollaries:
// 3. A tree of height `h` has at least `F(h + 2) - 1` nodes, where `F` is the Fibonacci sequence.
//    Hence `h < 1.44 * log2(n + 2)`.
// 4. Inserting a leaf or removing a node changes the heights of its ancestors by at most 1, so
//    every node on the path to the root is at worst 2-heavy, and one single or double rotation
//    restores its balance.

extern crate alloc;

#[cfg(any(test, feature = "model"))]
extern crate std;

#[macro_use]
mod trace;

mod avl;
mod compare;
mod debug;
mod error;
mod handle;
pub mod iter;
pub mod substrate;
pub mod traverse;

#[cfg(any(test, feature = "model"))]
pub mod model;

#[cfg(test)]
mod tests;

pub use avl::AvlTree;
pub use compare::{ByKey, Comparator, NaturalOrder};
pub use error::{Error, Result};
pub use handle::Handle;
