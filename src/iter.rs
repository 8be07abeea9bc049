//! Iterators over the elements of an [`AvlTree`](crate::AvlTree).
//!
//! Every iterator borrows the tree, so the tree cannot be modified while one is alive.

use core::iter::FusedIterator;

use crate::{
    avl::Node,
    substrate::BinaryTree,
    traverse::{InOrder, PostOrder, PreOrder},
};

/// An iterator over the elements of a tree in ascending order.
///
/// Created by [`AvlTree::iter`](crate::AvlTree::iter).
#[derive(Debug)]
pub struct Iter<'tree, T> {
    inner: InOrder<'tree, Node<T>>,
}

impl<'tree, T> Iter<'tree, T> {
    pub(crate) fn new(nodes: &'tree BinaryTree<Node<T>>) -> Self {
        Iter {
            inner: InOrder::new(nodes),
        }
    }
}

impl<'tree, T> Iterator for Iter<'tree, T> {
    type Item = &'tree T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|node| &node.payload)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Iter {
            inner: self.inner.clone(),
        }
    }
}

/// An iterator visiting each element before the elements of its left and then its right subtree.
///
/// Created by [`AvlTree::iter_pre_order`](crate::AvlTree::iter_pre_order).
#[derive(Debug)]
pub struct PreOrderIter<'tree, T> {
    inner: PreOrder<'tree, Node<T>>,
}

impl<'tree, T> PreOrderIter<'tree, T> {
    pub(crate) fn new(nodes: &'tree BinaryTree<Node<T>>) -> Self {
        PreOrderIter {
            inner: PreOrder::new(nodes),
        }
    }
}

impl<'tree, T> Iterator for PreOrderIter<'tree, T> {
    type Item = &'tree T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|node| &node.payload)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> ExactSizeIterator for PreOrderIter<'_, T> {}

impl<T> FusedIterator for PreOrderIter<'_, T> {}

impl<T> Clone for PreOrderIter<'_, T> {
    fn clone(&self) -> Self {
        PreOrderIter {
            inner: self.inner.clone(),
        }
    }
}

/// An iterator visiting each element after the elements of its left and then its right subtree.
///
/// Created by [`AvlTree::iter_post_order`](crate::AvlTree::iter_post_order).
#[derive(Debug)]
pub struct PostOrderIter<'tree, T> {
    inner: PostOrder<'tree, Node<T>>,
}

impl<'tree, T> PostOrderIter<'tree, T> {
    pub(crate) fn new(nodes: &'tree BinaryTree<Node<T>>) -> Self {
        PostOrderIter {
            inner: PostOrder::new(nodes),
        }
    }
}

impl<'tree, T> Iterator for PostOrderIter<'tree, T> {
    type Item = &'tree T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|node| &node.payload)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> ExactSizeIterator for PostOrderIter<'_, T> {}

impl<T> FusedIterator for PostOrderIter<'_, T> {}

impl<T> Clone for PostOrderIter<'_, T> {
    fn clone(&self) -> Self {
        PostOrderIter {
            inner: self.inner.clone(),
        }
    }
}
