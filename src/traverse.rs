//! Forward traversals over a [`BinaryTree`].
//!
//! Each order is its own state machine holding the next node to yield. Steps are computed from
//! parent links alone, so no traversal needs an auxiliary stack.

use core::{fmt, iter::FusedIterator, ptr::NonNull};

use cordyceps::Linked;

use crate::substrate::{BinaryTree, Dir, Link, Links};

/// Symmetric-order traversal: left subtree, node, right subtree.
pub struct InOrder<'tree, T>
where
    T: Linked<Links<T>> + ?Sized,
{
    tree: &'tree BinaryTree<T>,
    next: Link<T>,
    remaining: usize,
}

impl<'tree, T> InOrder<'tree, T>
where
    T: Linked<Links<T>> + ?Sized,
{
    pub fn new(tree: &'tree BinaryTree<T>) -> Self {
        InOrder {
            tree,
            next: tree.first(),
            remaining: tree.len(),
        }
    }

    /// Returns the node visited after `node`.
    ///
    /// # Safety
    ///
    /// `node` must be an element of `tree`.
    pub unsafe fn step(tree: &BinaryTree<T>, node: NonNull<T>) -> Link<T> {
        unsafe { tree.successor(node) }
    }
}

/// Pre-order traversal: node, left subtree, right subtree.
pub struct PreOrder<'tree, T>
where
    T: Linked<Links<T>> + ?Sized,
{
    tree: &'tree BinaryTree<T>,
    next: Link<T>,
    remaining: usize,
}

impl<'tree, T> PreOrder<'tree, T>
where
    T: Linked<Links<T>> + ?Sized,
{
    pub fn new(tree: &'tree BinaryTree<T>) -> Self {
        PreOrder {
            tree,
            next: tree.root(),
            remaining: tree.len(),
        }
    }

    /// Returns the node visited after `node`.
    ///
    /// # Safety
    ///
    /// `node` must be an element of `tree`.
    pub unsafe fn step(tree: &BinaryTree<T>, node: NonNull<T>) -> Link<T> {
        unsafe {
            if let Some(left) = tree.left(node) {
                return Some(left);
            }

            if let Some(right) = tree.right(node) {
                return Some(right);
            }

            // `node` is a leaf. Climb until some ancestor's right subtree is still unvisited, which
            // is the case exactly when we arrive at the ancestor from its left.
            let mut cur = node;
            while let Some(parent) = tree.parent(cur) {
                if tree.which_child(parent, cur) == Dir::Left {
                    if let Some(right) = tree.right(parent) {
                        return Some(right);
                    }
                }
                cur = parent;
            }

            None
        }
    }
}

/// Post-order traversal: left subtree, right subtree, node.
pub struct PostOrder<'tree, T>
where
    T: Linked<Links<T>> + ?Sized,
{
    tree: &'tree BinaryTree<T>,
    next: Link<T>,
    remaining: usize,
}

impl<'tree, T> PostOrder<'tree, T>
where
    T: Linked<Links<T>> + ?Sized,
{
    pub fn new(tree: &'tree BinaryTree<T>) -> Self {
        PostOrder {
            tree,
            next: tree.root().map(|root| unsafe { Self::first_in(tree, root) }),
            remaining: tree.len(),
        }
    }

    /// Returns the first node visited in the subtree rooted at `node`: the end of the path that
    /// prefers left children and falls back to right ones.
    ///
    /// # Safety
    ///
    /// `node` must be an element of `tree`.
    pub unsafe fn first_in(tree: &BinaryTree<T>, node: NonNull<T>) -> NonNull<T> {
        let mut cur = node;

        loop {
            unsafe {
                match (tree.left(cur), tree.right(cur)) {
                    (Some(left), _) => cur = left,
                    (None, Some(right)) => cur = right,
                    (None, None) => return cur,
                }
            }
        }
    }

    /// Returns the node visited after `node`.
    ///
    /// # Safety
    ///
    /// `node` must be an element of `tree`.
    pub unsafe fn step(tree: &BinaryTree<T>, node: NonNull<T>) -> Link<T> {
        unsafe {
            let parent = tree.parent(node)?;

            if tree.which_child(parent, node) == Dir::Left {
                if let Some(right) = tree.right(parent) {
                    return Some(Self::first_in(tree, right));
                }
            }

            Some(parent)
        }
    }
}

macro_rules! impl_traversal {
    ($name:ident) => {
        impl<'tree, T> Iterator for $name<'tree, T>
        where
            T: Linked<Links<T>> + ?Sized,
        {
            type Item = &'tree T;

            fn next(&mut self) -> Option<Self::Item> {
                let cur = self.next?;

                self.next = unsafe { Self::step(self.tree, cur) };
                self.remaining -= 1;

                Some(unsafe { cur.as_ref() })
            }

            fn size_hint(&self) -> (usize, Option<usize>) {
                (self.remaining, Some(self.remaining))
            }
        }

        impl<'tree, T> ExactSizeIterator for $name<'tree, T> where T: Linked<Links<T>> + ?Sized {}

        impl<'tree, T> FusedIterator for $name<'tree, T> where T: Linked<Links<T>> + ?Sized {}

        impl<'tree, T> Clone for $name<'tree, T>
        where
            T: Linked<Links<T>> + ?Sized,
        {
            fn clone(&self) -> Self {
                $name {
                    tree: self.tree,
                    next: self.next,
                    remaining: self.remaining,
                }
            }
        }

        impl<'tree, T> fmt::Debug for $name<'tree, T>
        where
            T: Linked<Links<T>> + ?Sized,
        {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($name))
                    .field("next", &self.next)
                    .field("remaining", &self.remaining)
                    .finish()
            }
        }
    };
}

impl_traversal!(InOrder);
impl_traversal!(PreOrder);
impl_traversal!(PostOrder);
