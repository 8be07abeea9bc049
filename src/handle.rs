use core::{fmt, hash, ptr::NonNull};

use crate::avl::Node;

/// An opaque reference to a node of an [`AvlTree`](crate::AvlTree).
///
/// Handles do not borrow the tree. Each one records the tree it came from and that tree's removal
/// epoch; the tree rejects it with [`Error::ForeignHandle`](crate::Error::ForeignHandle) or
/// [`Error::Invalidated`](crate::Error::Invalidated) instead of following a stale pointer.
/// Insertions never invalidate handles.
pub struct Handle<T> {
    pub(crate) node: NonNull<Node<T>>,
    pub(crate) tree: usize,
    pub(crate) epoch: u64,
}

impl<T> Handle<T> {
    pub(crate) fn new(node: NonNull<Node<T>>, tree: usize, epoch: u64) -> Self {
        Handle { node, tree, epoch }
    }
}

// SAFETY: A handle is only dereferenced by the tree that issued it, after validation.
unsafe impl<T> Send for Handle<T> {}

// SAFETY: See above.
unsafe impl<T> Sync for Handle<T> {}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node && self.tree == other.tree && self.epoch == other.epoch
    }
}

impl<T> Eq for Handle<T> {}

impl<T> hash::Hash for Handle<T> {
    fn hash<H: hash::Hasher>(&self, state: &mut H) {
        self.node.hash(state);
        self.tree.hash(state);
        self.epoch.hash(state);
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("node", &self.node)
            .field("tree", &self.tree)
            .field("epoch", &self.epoch)
            .finish()
    }
}
