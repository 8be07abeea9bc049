//! The node substrate: intrusive links, primitive mutations and structural navigation.
//!
//! Nothing in this module compares payloads. A [`BinaryTree`] only knows the shape of the tree;
//! whichever search strategy sits on top decides where nodes go and when to rotate.

use alloc::vec::Vec;
use core::{cell::UnsafeCell, cmp, marker::PhantomPinned, mem, ops::Not, ptr::NonNull};

use cordyceps::Linked;

/// An optional link to a node.
pub type Link<T> = Option<NonNull<T>>;

/// A child slot of a node.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Dir {
    Left = 0,
    Right = 1,
}

impl Not for Dir {
    type Output = Dir;

    fn not(self) -> Self::Output {
        match self {
            Dir::Left => Dir::Right,
            Dir::Right => Dir::Left,
        }
    }
}

/// Links embedded in every node of a [`BinaryTree`].
pub struct Links<T: ?Sized> {
    inner: UnsafeCell<LinksInner<T>>,
}

#[repr(C)]
struct LinksInner<T: ?Sized> {
    parent: Link<T>,
    children: [Link<T>; 2],
    height: usize,
    _unpin: PhantomPinned,
}

/// An owning binary tree of intrusively linked nodes.
///
/// The tree owns every node reachable from its root and frees them when dropped. Parent links are
/// back-references only.
pub struct BinaryTree<T>
where
    T: Linked<Links<T>> + ?Sized,
{
    root: Link<T>,
    len: usize,
}

impl<T> BinaryTree<T>
where
    T: Linked<Links<T>> + ?Sized,
{
    /// Returns a new empty tree.
    pub const fn new() -> BinaryTree<T> {
        BinaryTree { root: None, len: 0 }
    }

    /// Returns `true` if the tree contains no nodes.
    pub const fn is_empty(&self) -> bool {
        let empty = self.len == 0;

        if cfg!(debug_assertions) {
            // Can't use assert_eq!() in const fn.
            assert!(empty == self.root.is_none());
        }

        empty
    }

    /// Returns the number of nodes in the tree.
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns the root node, if any.
    pub const fn root(&self) -> Option<NonNull<T>> {
        self.root
    }

    /// Returns the height of the whole tree.
    pub fn depth(&self) -> usize {
        unsafe { self.height(self.root) }
    }

    #[inline]
    unsafe fn links(&self, node: NonNull<T>) -> &Links<T> {
        unsafe { T::links(node).as_ref() }
    }

    #[inline]
    unsafe fn links_mut(&mut self, node: NonNull<T>) -> &mut Links<T> {
        unsafe { T::links(node).as_mut() }
    }

    // Navigation =============================================================
    //
    // Unless stated otherwise, every `node` argument must be an element of `self`.

    /// Returns the parent of `node`, or `None` for the root.
    ///
    /// # Safety
    ///
    /// `node` must be an element of `self`.
    #[inline]
    pub unsafe fn parent(&self, node: NonNull<T>) -> Link<T> {
        unsafe { self.links(node).parent() }
    }

    /// Returns the `dir` child of `node`.
    ///
    /// # Safety
    ///
    /// `node` must be an element of `self`.
    #[inline]
    pub unsafe fn child(&self, node: NonNull<T>, dir: Dir) -> Link<T> {
        unsafe { self.links(node).child(dir) }
    }

    /// # Safety
    ///
    /// `node` must be an element of `self`.
    #[inline]
    pub unsafe fn left(&self, node: NonNull<T>) -> Link<T> {
        unsafe { self.child(node, Dir::Left) }
    }

    /// # Safety
    ///
    /// `node` must be an element of `self`.
    #[inline]
    pub unsafe fn right(&self, node: NonNull<T>) -> Link<T> {
        unsafe { self.child(node, Dir::Right) }
    }

    /// Returns which child of `parent` the node `child` is.
    ///
    /// # Safety
    ///
    /// `child` must be a child of `parent`, and both must be elements of `self`.
    #[inline]
    pub unsafe fn which_child(&self, parent: NonNull<T>, child: NonNull<T>) -> Dir {
        if unsafe { self.left(parent) } == Some(child) {
            Dir::Left
        } else {
            debug_assert_eq!(unsafe { self.right(parent) }, Some(child));
            Dir::Right
        }
    }

    /// Returns the cached height of the subtree rooted at `node`; an absent node has height 0.
    ///
    /// # Safety
    ///
    /// `node`, if present, must be an element of `self`.
    #[inline]
    pub unsafe fn height(&self, node: Link<T>) -> usize {
        node.map(|n| unsafe { self.links(n).height() }).unwrap_or(0)
    }

    /// Recomputes the height of the subtree rooted at `node` from scratch, ignoring cached heights.
    ///
    /// Recursion depth is bounded by the height of the subtree.
    ///
    /// # Safety
    ///
    /// `node`, if present, must be an element of `self`.
    pub unsafe fn measure_height(&self, node: Link<T>) -> usize {
        match node {
            None => 0,
            Some(n) => unsafe {
                1 + cmp::max(
                    self.measure_height(self.left(n)),
                    self.measure_height(self.right(n)),
                )
            },
        }
    }

    /// Returns the node reached by following `dir` children from `node` until there are none.
    ///
    /// # Safety
    ///
    /// `node` must be an element of `self`.
    pub unsafe fn extreme(&self, node: NonNull<T>, dir: Dir) -> NonNull<T> {
        let mut cur = node;

        while let Some(next) = unsafe { self.child(cur, dir) } {
            cur = next;
        }

        cur
    }

    /// Returns the minimum node of the subtree rooted at `node`.
    ///
    /// # Safety
    ///
    /// `node` must be an element of `self`.
    #[inline]
    pub unsafe fn leftmost(&self, node: NonNull<T>) -> NonNull<T> {
        unsafe { self.extreme(node, Dir::Left) }
    }

    /// Returns the maximum node of the subtree rooted at `node`.
    ///
    /// # Safety
    ///
    /// `node` must be an element of `self`.
    #[inline]
    pub unsafe fn rightmost(&self, node: NonNull<T>) -> NonNull<T> {
        unsafe { self.extreme(node, Dir::Right) }
    }

    /// Returns the leftmost node of the tree.
    pub fn first(&self) -> Link<T> {
        self.root.map(|root| unsafe { self.leftmost(root) })
    }

    /// Returns the rightmost node of the tree.
    pub fn last(&self) -> Link<T> {
        self.root.map(|root| unsafe { self.rightmost(root) })
    }

    /// Returns the node following `node` in symmetric order.
    ///
    /// This is the leftmost node of `node`'s right subtree if there is one; otherwise it is the
    /// nearest ancestor whose left subtree contains `node`.
    ///
    /// # Safety
    ///
    /// `node` must be an element of `self`.
    pub unsafe fn successor(&self, node: NonNull<T>) -> Link<T> {
        unsafe {
            if let Some(right) = self.right(node) {
                return Some(self.leftmost(right));
            }

            let mut cur = node;
            while let Some(parent) = self.parent(cur) {
                if self.which_child(parent, cur) == Dir::Left {
                    return Some(parent);
                }
                cur = parent;
            }

            None
        }
    }

    // Mutation ===============================================================

    /// Sets the `dir` child of `parent` to `child`, pointing `child`'s parent link at `parent`.
    ///
    /// Returns the previous child, which is neither freed nor unlinked from `parent` on its side.
    ///
    /// # Safety
    ///
    /// `parent` and `child` must be elements of `self`, and the caller takes responsibility for
    /// the previous child, if any.
    pub unsafe fn attach(&mut self, parent: NonNull<T>, dir: Dir, child: Link<T>) -> Link<T> {
        unsafe {
            let old = self.links_mut(parent).set_child(dir, child);

            if let Some(child) = child {
                self.links_mut(child).set_parent(Some(parent));
            }

            old
        }
    }

    /// # Safety
    ///
    /// See [`attach`](Self::attach).
    #[inline]
    pub unsafe fn attach_left(&mut self, parent: NonNull<T>, child: Link<T>) -> Link<T> {
        unsafe { self.attach(parent, Dir::Left, child) }
    }

    /// # Safety
    ///
    /// See [`attach`](Self::attach).
    #[inline]
    pub unsafe fn attach_right(&mut self, parent: NonNull<T>, child: Link<T>) -> Link<T> {
        unsafe { self.attach(parent, Dir::Right, child) }
    }

    // Replaces `old_child` in its parent's child slot (or as the root) with `new_child`, updating
    // `new_child`'s parent link. `old_child`'s own links are left untouched.
    unsafe fn replace_child_or_set_root(
        &mut self,
        parent: Link<T>,
        old_child: NonNull<T>,
        new_child: Link<T>,
    ) {
        unsafe {
            match parent {
                Some(parent) => {
                    let dir = self.which_child(parent, old_child);
                    self.attach(parent, dir, new_child);
                }
                None => {
                    self.root = new_child;

                    if let Some(new_child) = new_child {
                        self.links_mut(new_child).set_parent(None);
                    }
                }
            }
        }
    }

    /// Links `item` in as the root of an empty tree, returning a pointer to it.
    ///
    /// # Panics
    ///
    /// Panics if the tree already has a root.
    pub fn insert_root(&mut self, item: T::Handle) -> NonNull<T> {
        assert!(self.root.is_none(), "tree already has a root");

        let ptr = T::into_ptr(item);

        unsafe {
            let links = self.links_mut(ptr);
            links.clear();
            links.set_height(1);
        }

        self.root = Some(ptr);
        self.len += 1;
        ptr
    }

    /// Links `item` in as the `dir` child of `parent`, returning a pointer to it.
    ///
    /// The heights of `parent` and its ancestors are not updated.
    ///
    /// # Safety
    ///
    /// `parent` must be an element of `self` whose `dir` child slot is vacant.
    pub unsafe fn insert_child(&mut self, parent: NonNull<T>, dir: Dir, item: T::Handle) -> NonNull<T> {
        let ptr = T::into_ptr(item);

        unsafe {
            let links = self.links_mut(ptr);
            links.clear();
            links.set_height(1);

            let old = self.attach(parent, dir, Some(ptr));
            debug_assert!(old.is_none(), "child slot must be vacant");
        }

        self.len += 1;
        ptr
    }

    /// Unlinks `node`, which has at most one child, splicing that child into its position.
    ///
    /// Returns ownership of the node together with its former parent. The heights of the former
    /// parent and its ancestors are not updated.
    ///
    /// # Safety
    ///
    /// `node` must be an element of `self`.
    ///
    /// # Panics
    ///
    /// Panics if `node` has two children.
    pub unsafe fn splice_out(&mut self, node: NonNull<T>) -> (T::Handle, Link<T>) {
        unsafe {
            let parent = self.parent(node);

            let child = match (self.left(node), self.right(node)) {
                (Some(_), Some(_)) => panic!("cannot splice out a node with two children"),
                (child, None) | (None, child) => child,
            };

            self.replace_child_or_set_root(parent, node, child);
            self.links_mut(node).clear();
            self.len -= 1;

            (T::from_ptr(node), parent)
        }
    }

    /// Recomputes the cached height of `node` from its children's cached heights.
    ///
    /// # Safety
    ///
    /// `node` must be an element of `self`.
    #[inline]
    pub unsafe fn update_height(&mut self, node: NonNull<T>) {
        unsafe {
            let height = 1 + cmp::max(
                self.height(self.left(node)),
                self.height(self.right(node)),
            );
            self.links_mut(node).set_height(height);
        }
    }

    /// Rotates `node` down towards `dir`, lifting its `!dir` child into its position.
    ///
    /// The lifted child's `dir` subtree moves across to become `node`'s `!dir` subtree. The cached
    /// heights of the two nodes are refreshed. Returns the lifted child, the new root of the
    /// rotated subtree.
    ///
    /// # Safety
    ///
    /// `node` must be an element of `self`.
    ///
    /// # Panics
    ///
    /// Panics if `node` has no `!dir` child.
    pub unsafe fn rotate(&mut self, node: NonNull<T>, dir: Dir) -> NonNull<T> {
        unsafe {
            let up = self
                .child(node, !dir)
                .expect("rotation requires a child on the lifted side");
            let across = self.child(up, dir);
            let parent = self.parent(node);

            self.replace_child_or_set_root(parent, node, Some(up));
            self.attach(node, !dir, across);
            self.attach(up, dir, Some(node));

            self.update_height(node);
            self.update_height(up);

            trace_log!(?dir, node = ?node, up = ?up, "rotated");

            up
        }
    }

    /// Rotates `node` left, lifting its right child. See [`rotate`](Self::rotate).
    ///
    /// # Safety
    ///
    /// `node` must be an element of `self`.
    #[inline]
    pub unsafe fn rotate_left(&mut self, node: NonNull<T>) -> NonNull<T> {
        unsafe { self.rotate(node, Dir::Left) }
    }

    /// Rotates `node` right, lifting its left child. See [`rotate`](Self::rotate).
    ///
    /// # Safety
    ///
    /// `node` must be an element of `self`.
    #[inline]
    pub unsafe fn rotate_right(&mut self, node: NonNull<T>) -> NonNull<T> {
        unsafe { self.rotate(node, Dir::Right) }
    }

    /// Clears the tree, dropping every node.
    pub fn clear(&mut self) {
        let mut opt_cur = self.root;

        while let Some(cur) = opt_cur {
            unsafe {
                // Descend to the minimum node.
                let min = self.leftmost(cur);
                let parent = self.parent(min);
                let right = self.right(min);

                // Elevate the node's right child (which may be None).
                self.replace_child_or_set_root(parent, min, right);

                drop(T::from_ptr(min));
                self.len -= 1;

                // If the node had no right child, climb to the parent. If the node had no parent,
                // the tree is empty.
                opt_cur = right.or(parent);
            }
        }

        debug_assert!(self.root.is_none());
        debug_assert_eq!(self.len(), 0);
    }

    /// Returns a tree with the same shape as `self`, building each node with `f`.
    pub fn clone_with<F>(&self, mut f: F) -> BinaryTree<T>
    where
        F: FnMut(&T) -> T::Handle,
    {
        let mut copy = BinaryTree::new();

        let Some(root) = self.root else {
            return copy;
        };

        // Parents are copied before their children, so every slot's parent already exists.
        let mut stack: Vec<(NonNull<T>, Option<(NonNull<T>, Dir)>)> = Vec::new();
        stack.push((root, None));

        while let Some((orig, slot)) = stack.pop() {
            unsafe {
                let item = f(orig.as_ref());
                let node = match slot {
                    None => copy.insert_root(item),
                    Some((parent, dir)) => copy.insert_child(parent, dir, item),
                };

                let height = self.links(orig).height();
                copy.links_mut(node).set_height(height);

                for dir in [Dir::Right, Dir::Left] {
                    if let Some(child) = self.child(orig, dir) {
                        stack.push((child, Some((node, dir))));
                    }
                }
            }
        }

        copy
    }
}

impl<T> Default for BinaryTree<T>
where
    T: Linked<Links<T>> + ?Sized,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for BinaryTree<T>
where
    T: Linked<Links<T>> + ?Sized,
{
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T: ?Sized> Links<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            inner: UnsafeCell::new(LinksInner {
                parent: None,
                children: [None; 2],
                height: 0,
                _unpin: PhantomPinned,
            }),
        }
    }

    #[inline]
    fn height(&self) -> usize {
        unsafe { (*self.inner.get()).height }
    }

    #[inline]
    fn parent(&self) -> Link<T> {
        unsafe { (*self.inner.get()).parent }
    }

    #[inline]
    fn child(&self, dir: Dir) -> Link<T> {
        unsafe { (*self.inner.get()).children[dir as usize] }
    }

    #[inline]
    fn set_parent(&mut self, parent: Link<T>) -> Link<T> {
        mem::replace(&mut self.inner.get_mut().parent, parent)
    }

    #[inline]
    fn set_child(&mut self, dir: Dir, child: Link<T>) -> Link<T> {
        mem::replace(&mut self.inner.get_mut().children[dir as usize], child)
    }

    #[inline]
    fn set_height(&mut self, height: usize) {
        self.inner.get_mut().height = height;
    }

    fn clear(&mut self) {
        let inner = self.inner.get_mut();
        inner.parent = None;
        inner.children = [None; 2];
        inner.height = 0;
    }
}

impl<T: ?Sized> Default for Links<T> {
    fn default() -> Self {
        Self::new()
    }
}
