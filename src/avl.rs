use alloc::boxed::Box;
use core::{
    cmp::Ordering,
    fmt,
    ptr::{self, NonNull},
    sync::atomic::{self, AtomicUsize},
};

use cordyceps::Linked;

use crate::{
    compare::{Comparator, NaturalOrder},
    error::{Error, Result},
    handle::Handle,
    iter::{Iter, PostOrderIter, PreOrderIter},
    substrate::{BinaryTree, Dir, Link, Links},
};

/// A self-balancing binary search tree maintaining the AVL invariant.
///
/// Payloads are their own keys, ordered by the comparator `C`. Inserting a payload equal to one
/// already stored overwrites it in place.
///
/// After every insertion and removal, the heights of the two subtrees of every node differ by at
/// most one, so lookups, insertions and removals complete in _O(log(n))_ time.
pub struct AvlTree<T, C = NaturalOrder> {
    nodes: BinaryTree<Node<T>>,
    cmp: C,
    id: usize,
    // Bumped whenever nodes are freed. Handles from an older epoch are rejected.
    epoch: u64,
}

pub(crate) struct Node<T> {
    links: Links<Node<T>>,
    pub(crate) payload: T,
}

impl<T> Node<T> {
    fn new_boxed(payload: T) -> Box<Self> {
        Box::new(Node {
            links: Links::new(),
            payload,
        })
    }
}

unsafe impl<T> Linked<Links<Node<T>>> for Node<T> {
    type Handle = Box<Self>;

    fn into_ptr(r: Self::Handle) -> NonNull<Self> {
        Box::leak(r).into()
    }

    unsafe fn from_ptr(ptr: NonNull<Self>) -> Self::Handle {
        unsafe { Box::from_raw(ptr.as_ptr()) }
    }

    unsafe fn links(ptr: NonNull<Self>) -> NonNull<Links<Node<T>>> {
        let ptr = ptr.as_ptr();
        // SAFETY: a field of a non-null pointer is non-null.
        unsafe { NonNull::new_unchecked(ptr::addr_of_mut!((*ptr).links)) }
    }
}

static NEXT_TREE_ID: AtomicUsize = AtomicUsize::new(0);

fn next_tree_id() -> usize {
    take_id(&NEXT_TREE_ID)
}

// Ids are never reused, so a handle can only ever match the tree that issued it.
fn take_id(counter: &AtomicUsize) -> usize {
    counter
        .fetch_update(atomic::Ordering::Relaxed, atomic::Ordering::Relaxed, |id| {
            id.checked_add(1)
        })
        .expect("tree ids exhausted")
}

// SAFETY: The tree exclusively owns every node reachable from its root, and links are only written
// through `&mut self`.
unsafe impl<T: Send, C: Send> Send for AvlTree<T, C> {}

// SAFETY: Shared references only read links and payloads.
unsafe impl<T: Sync, C: Sync> Sync for AvlTree<T, C> {}

impl<T: Ord> AvlTree<T> {
    /// Returns a new empty tree ordered by `T`'s [`Ord`] implementation.
    pub fn new() -> AvlTree<T> {
        AvlTree::with_comparator(NaturalOrder)
    }
}

impl<T, C> AvlTree<T, C> {
    /// Returns a new empty tree ordered by `cmp`.
    pub fn with_comparator(cmp: C) -> AvlTree<T, C> {
        AvlTree {
            nodes: BinaryTree::new(),
            cmp,
            id: next_tree_id(),
            epoch: 0,
        }
    }

    /// Returns the comparator ordering this tree.
    pub fn comparator(&self) -> &C {
        &self.cmp
    }

    /// Returns `true` if the tree contains no elements.
    #[doc(alias = "empty")]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the number of elements in the tree.
    #[doc(alias = "size")]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the height of the tree: 0 when empty, 1 for a lone root.
    pub fn depth(&self) -> usize {
        self.nodes.depth()
    }

    /// Returns the minimum element of the tree.
    pub fn first(&self) -> Option<&T> {
        self.nodes
            .first()
            .map(|node| unsafe { &node.as_ref().payload })
    }

    /// Returns the maximum element of the tree.
    pub fn last(&self) -> Option<&T> {
        self.nodes
            .last()
            .map(|node| unsafe { &node.as_ref().payload })
    }

    /// Returns an iterator over the elements in ascending order.
    #[doc(alias = "begin")]
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(&self.nodes)
    }

    /// Returns an iterator visiting each node before its left and then its right subtree.
    #[doc(alias = "fbegin")]
    pub fn iter_pre_order(&self) -> PreOrderIter<'_, T> {
        PreOrderIter::new(&self.nodes)
    }

    /// Returns an iterator visiting each node after its left and then its right subtree.
    #[doc(alias = "abegin")]
    pub fn iter_post_order(&self) -> PostOrderIter<'_, T> {
        PostOrderIter::new(&self.nodes)
    }

    /// Clears the tree, removing all elements.
    ///
    /// All outstanding handles are invalidated.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.epoch += 1;
    }

    // Handles ================================================================

    fn handle(&self, node: NonNull<Node<T>>) -> Handle<T> {
        Handle::new(node, self.id, self.epoch)
    }

    fn resolve(&self, handle: Handle<T>) -> Result<NonNull<Node<T>>> {
        if handle.tree != self.id {
            return Err(Error::ForeignHandle);
        }

        if handle.epoch != self.epoch {
            return Err(Error::Invalidated);
        }

        Ok(handle.node)
    }

    /// Returns a handle to the root node.
    pub fn root(&self) -> Option<Handle<T>> {
        self.nodes.root().map(|root| self.handle(root))
    }

    /// Returns the element stored in the node referred to by `handle`.
    pub fn get_at(&self, handle: Handle<T>) -> Result<&T> {
        let node = self.resolve(handle)?;
        Ok(unsafe { &node.as_ref().payload })
    }

    /// Returns a handle to the left child of the node referred to by `handle`.
    pub fn left(&self, handle: Handle<T>) -> Result<Option<Handle<T>>> {
        let node = self.resolve(handle)?;
        Ok(unsafe { self.nodes.left(node) }.map(|n| self.handle(n)))
    }

    /// Returns a handle to the right child of the node referred to by `handle`.
    pub fn right(&self, handle: Handle<T>) -> Result<Option<Handle<T>>> {
        let node = self.resolve(handle)?;
        Ok(unsafe { self.nodes.right(node) }.map(|n| self.handle(n)))
    }

    /// Returns a handle to the parent of the node referred to by `handle`.
    pub fn parent(&self, handle: Handle<T>) -> Result<Option<Handle<T>>> {
        let node = self.resolve(handle)?;
        Ok(unsafe { self.nodes.parent(node) }.map(|n| self.handle(n)))
    }

    /// Returns the height of the subtree rooted at the node referred to by `handle`.
    pub fn height_at(&self, handle: Handle<T>) -> Result<usize> {
        let node = self.resolve(handle)?;
        Ok(unsafe { self.nodes.height(Some(node)) })
    }

    /// Removes the node referred to by `handle`, returning its element.
    ///
    /// This operation completes in _O(log(n))_ time.
    pub fn erase_at(&mut self, handle: Handle<T>) -> Result<T> {
        let node = self.resolve(handle)?;
        Ok(unsafe { self.erase_node(node) })
    }

    // Removal and rebalancing ================================================

    // Removes `node` from the tree and rebalances.
    //
    // A node with two children keeps its place: its structural successor's payload moves into it,
    // and the successor, which has no left child, is spliced out instead.
    unsafe fn erase_node(&mut self, node: NonNull<Node<T>>) -> T {
        let (removed, parent) = unsafe {
            match (self.nodes.left(node), self.nodes.right(node)) {
                (Some(_), Some(_)) => {
                    let successor = self
                        .nodes
                        .successor(node)
                        .expect("a node with a right child has a successor");

                    ptr::swap(
                        ptr::addr_of_mut!((*node.as_ptr()).payload),
                        ptr::addr_of_mut!((*successor.as_ptr()).payload),
                    );

                    self.nodes.splice_out(successor)
                }

                _ => self.nodes.splice_out(node),
            }
        };

        debug_log!(parent = ?parent, len = self.len(), "erased node");

        self.epoch += 1;
        self.rebalance_from(parent);

        let Node { payload, .. } = *removed;
        payload
    }

    // Walks from `start` to the root, refreshing cached heights and rotating wherever the subtree
    // heights of a node differ by more than one.
    fn rebalance_from(&mut self, start: Link<Node<T>>) {
        let mut opt_cur = start;

        while let Some(cur) = opt_cur {
            unsafe {
                let top = self.rebalance_at(cur);
                opt_cur = self.nodes.parent(top);
            }
        }
    }

    // Restores the AVL invariant at `node`, whose children are both balanced and carry correct
    // heights. Returns the node now occupying `node`'s position.
    unsafe fn rebalance_at(&mut self, node: NonNull<Node<T>>) -> NonNull<Node<T>> {
        unsafe {
            let left_h = self.nodes.height(self.nodes.left(node));
            let right_h = self.nodes.height(self.nodes.right(node));

            let heavy = if left_h > right_h + 1 {
                Dir::Left
            } else if right_h > left_h + 1 {
                Dir::Right
            } else {
                self.nodes.update_height(node);
                return node;
            };

            let child = self
                .nodes
                .child(node, heavy)
                .expect("the heavy side of an unbalanced node is not empty");

            let outer_h = self.nodes.height(self.nodes.child(child, heavy));
            let inner_h = self.nodes.height(self.nodes.child(child, !heavy));

            // If the inner grandchild is taller, lift it first so that a single rotation at `node`
            // finishes the job.
            if outer_h < inner_h {
                self.nodes.rotate(child, heavy);
            }

            self.nodes.rotate(node, !heavy)
        }
    }

    #[doc(hidden)]
    pub fn assert_invariants(&self)
    where
        C: Comparator<T>,
    {
        let Some(root) = self.nodes.root() else {
            assert_eq!(self.len(), 0);
            return;
        };

        unsafe {
            assert_eq!(self.nodes.parent(root), None, "root must not have a parent");

            let (_, count) = self.assert_invariants_at(root);
            assert_eq!(count, self.len());
        }

        // Ensure the symmetric order is strictly increasing.
        let mut iter = self.iter();
        if let Some(mut prev) = iter.next() {
            for cur in iter {
                assert_eq!(self.cmp.compare(prev, cur), Ordering::Less);
                prev = cur;
            }
        }
    }

    // Returns the measured height and node count of the subtree rooted at `node`.
    unsafe fn assert_invariants_at(&self, node: NonNull<Node<T>>) -> (usize, usize) {
        let mut heights = [0; 2];
        let mut count = 1;

        unsafe {
            for dir in [Dir::Left, Dir::Right] {
                if let Some(child) = self.nodes.child(node, dir) {
                    // Ensure child's parent link points to this node.
                    assert_eq!(self.nodes.parent(child), Some(node));

                    let (height, child_count) = self.assert_invariants_at(child);
                    heights[dir as usize] = height;
                    count += child_count;
                }
            }

            let height = 1 + heights[0].max(heights[1]);

            // Ensure the cached height is accurate and the node is balanced.
            assert_eq!(self.nodes.height(Some(node)), height);
            assert!(heights[0].abs_diff(heights[1]) <= 1, "node is unbalanced");

            (height, count)
        }
    }
}

impl<T, C> AvlTree<T, C>
where
    C: Comparator<T>,
{
    fn find_raw(&self, key: &T) -> Result<NonNull<Node<T>>> {
        let mut opt_cur = self.nodes.root();

        loop {
            let cur = opt_cur.ok_or(Error::NotFound)?;

            unsafe {
                match self.cmp.compare(key, &cur.as_ref().payload) {
                    Ordering::Less => opt_cur = self.nodes.left(cur),
                    Ordering::Equal => return Ok(cur),
                    Ordering::Greater => opt_cur = self.nodes.right(cur),
                }
            }
        }
    }

    /// Returns a handle to the node holding `key`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no element equal to `key` is stored.
    pub fn find(&self, key: &T) -> Result<Handle<T>> {
        self.find_raw(key).map(|node| self.handle(node))
    }

    /// Returns a reference to the stored element equal to `key`.
    pub fn get(&self, key: &T) -> Option<&T> {
        let node = self.find_raw(key).ok()?;
        Some(unsafe { &node.as_ref().payload })
    }

    /// Returns `true` if an element equal to `key` is stored.
    pub fn contains(&self, key: &T) -> bool {
        self.find_raw(key).is_ok()
    }

    /// Inserts `payload` into the tree, returning a handle to its node.
    ///
    /// If an equal element is already stored, it is overwritten in place and the tree's shape does
    /// not change.
    ///
    /// This operation completes in _O(log(n))_ time.
    pub fn insert(&mut self, payload: T) -> Handle<T> {
        let Some(mut cur) = self.nodes.root() else {
            // Tree is empty. The new node becomes the root.
            let root = self.nodes.insert_root(Node::new_boxed(payload));
            return self.handle(root);
        };

        // Descend the tree, looking for an equal element or a vacant slot.
        loop {
            let ordering = unsafe { self.cmp.compare(&payload, &cur.as_ref().payload) };

            let dir = match ordering {
                Ordering::Less => Dir::Left,
                Ordering::Equal => {
                    unsafe { cur.as_mut().payload = payload };
                    return self.handle(cur);
                }
                Ordering::Greater => Dir::Right,
            };

            match unsafe { self.nodes.child(cur, dir) } {
                Some(child) => cur = child,
                None => {
                    let node = unsafe { self.nodes.insert_child(cur, dir, Node::new_boxed(payload)) };
                    debug_log!(node = ?node, len = self.len(), "inserted leaf");

                    self.rebalance_from(Some(cur));
                    return self.handle(node);
                }
            }
        }
    }

    /// Inserts every item of `items` in order, returning a handle to the last one.
    ///
    /// Returns `None` if `items` is empty.
    pub fn insert_batch<I>(&mut self, items: I) -> Option<Handle<T>>
    where
        I: IntoIterator<Item = T>,
    {
        items
            .into_iter()
            .fold(None, |_, item| Some(self.insert(item)))
    }

    /// Removes the element equal to `key`, returning it.
    ///
    /// All outstanding handles are invalidated.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no element equal to `key` is stored; the tree is unchanged.
    pub fn erase(&mut self, key: &T) -> Result<T> {
        let node = self.find_raw(key)?;
        Ok(unsafe { self.erase_node(node) })
    }
}

impl<T, C> Clone for AvlTree<T, C>
where
    T: Clone,
    C: Clone,
{
    fn clone(&self) -> Self {
        AvlTree {
            nodes: self
                .nodes
                .clone_with(|node| Node::new_boxed(node.payload.clone())),
            cmp: self.cmp.clone(),
            id: next_tree_id(),
            epoch: 0,
        }
    }
}

impl<T, C: Default> Default for AvlTree<T, C> {
    fn default() -> Self {
        Self::with_comparator(C::default())
    }
}

impl<T: fmt::Debug, C> fmt::Debug for AvlTree<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T: PartialEq, C> PartialEq for AvlTree<T, C> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<T: Eq, C> Eq for AvlTree<T, C> {}

impl<T, C> Extend<T> for AvlTree<T, C>
where
    C: Comparator<T>,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.insert_batch(iter);
    }
}

impl<T, C> FromIterator<T> for AvlTree<T, C>
where
    C: Comparator<T> + Default,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut tree = AvlTree::default();
        tree.extend(iter);
        tree
    }
}

impl<'tree, T, C> IntoIterator for &'tree AvlTree<T, C> {
    type Item = &'tree T;
    type IntoIter = Iter<'tree, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
