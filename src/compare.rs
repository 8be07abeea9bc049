use core::cmp::Ordering;

/// A total order over payloads of type `T`.
///
/// Two payloads that compare [`Equal`](Ordering::Equal) are the same key: inserting one while the
/// other is stored overwrites it.
pub trait Comparator<T: ?Sized> {
    fn compare(&self, lhs: &T, rhs: &T) -> Ordering;
}

/// Orders payloads by their [`Ord`] implementation.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct NaturalOrder;

impl<T: Ord + ?Sized> Comparator<T> for NaturalOrder {
    #[inline]
    fn compare(&self, lhs: &T, rhs: &T) -> Ordering {
        lhs.cmp(rhs)
    }
}

/// Orders payloads by a key projected out of them.
///
/// ```
/// use cordyceps_avl::{AvlTree, ByKey};
///
/// let mut tree = AvlTree::with_comparator(ByKey::new(|pair: &(u32, &str)| &pair.0));
/// tree.insert((1, "one"));
/// tree.insert((1, "uno"));
///
/// assert_eq!(tree.len(), 1);
/// assert_eq!(tree.get(&(1, "")), Some(&(1, "uno")));
/// ```
#[derive(Copy, Clone, Debug, Default)]
pub struct ByKey<F>(pub F);

impl<F> ByKey<F> {
    /// Wraps a key projection.
    ///
    /// Prefer this over the tuple constructor when passing a closure, so that the closure's
    /// signature is inferred as returning a key borrowed from its argument.
    pub fn new<T, K>(project: F) -> Self
    where
        T: ?Sized,
        K: ?Sized,
        F: Fn(&T) -> &K,
    {
        ByKey(project)
    }
}

impl<T, K, F> Comparator<T> for ByKey<F>
where
    T: ?Sized,
    K: Ord + ?Sized,
    F: Fn(&T) -> &K,
{
    #[inline]
    fn compare(&self, lhs: &T, rhs: &T) -> Ordering {
        (self.0)(lhs).cmp((self.0)(rhs))
    }
}

impl<T, F> Comparator<T> for F
where
    T: ?Sized,
    F: Fn(&T, &T) -> Ordering,
{
    #[inline]
    fn compare(&self, lhs: &T, rhs: &T) -> Ordering {
        self(lhs, rhs)
    }
}
