//! Model-based checking of [`AvlTree`] against the standard library's `BTreeMap`.
//!
//! Shared by the proptest suite and the fuzz targets.

use std::{cmp::Ordering, collections::BTreeMap, prelude::v1::*};

use arbitrary::Arbitrary;
use proptest::strategy::{Just, Strategy};

use crate::{AvlTree, Comparator, Error, Handle};

/// A payload ordered by `key` alone; `value` is overwritten when an equal key is reinserted.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    pub key: u32,
    pub value: u32,
}

impl Entry {
    fn probe(key: u32) -> Entry {
        Entry { key, value: 0 }
    }
}

#[derive(Copy, Clone, Debug, Default)]
pub struct KeyOrder;

impl Comparator<Entry> for KeyOrder {
    fn compare(&self, lhs: &Entry, rhs: &Entry) -> Ordering {
        lhs.key.cmp(&rhs.key)
    }
}

pub type ModelTree = AvlTree<Entry, KeyOrder>;

#[derive(Copy, Clone, Debug, Arbitrary)]
pub enum ItemValue {
    Index(usize),
    Random(u32),
}

proptest::prop_compose! {
    fn index_strategy()(
        index in 0usize..1000,
    ) -> ItemValue {
        ItemValue::Index(index)
    }
}

proptest::prop_compose! {
    fn random_strategy()(
        random in 0u32..1000,
    ) -> ItemValue {
        ItemValue::Random(random)
    }
}

fn value_strategy() -> impl Strategy<Value = ItemValue> {
    proptest::prop_oneof![index_strategy(), random_strategy()]
}

#[derive(Copy, Clone, Debug, Arbitrary)]
pub enum Op {
    Insert(ItemValue, u32),
    Find(ItemValue),
    Erase(ItemValue),
    EraseHandle(ItemValue),
    First,
    Last,
    Clear,
}

impl Op {
    fn finalize(self, sorted: &[u32]) -> FinalOp {
        fn get_value(v: &[u32], i: ItemValue) -> u32 {
            match i {
                ItemValue::Index(idx) => {
                    if v.is_empty() {
                        idx as u32
                    } else {
                        v[idx % v.len()]
                    }
                }
                ItemValue::Random(v) => v,
            }
        }

        match self {
            Op::Insert(item, value) => FinalOp::Insert(get_value(sorted, item), value),
            Op::Find(item) => FinalOp::Find(get_value(sorted, item)),
            Op::Erase(item) => FinalOp::Erase(get_value(sorted, item)),
            Op::EraseHandle(item) => FinalOp::EraseHandle(get_value(sorted, item)),
            Op::First => FinalOp::First,
            Op::Last => FinalOp::Last,
            Op::Clear => FinalOp::Clear,
        }
    }
}

#[derive(Copy, Clone, Debug)]
enum FinalOp {
    Insert(u32, u32),
    Find(u32),
    Erase(u32),
    EraseHandle(u32),
    First,
    Last,
    Clear,
}

pub fn op_strategy() -> impl Strategy<Value = Op> {
    proptest::prop_oneof![
        4 => (value_strategy(), 0u32..1000).prop_map(|(item, value)| Op::Insert(item, value)),
        2 => value_strategy().prop_map(Op::Find),
        2 => value_strategy().prop_map(Op::Erase),
        2 => value_strategy().prop_map(Op::EraseHandle),
        1 => Just(Op::First),
        1 => Just(Op::Last),
        1 => Just(Op::Clear),
    ]
}

pub fn run_btree_equivalence(ops: Vec<Op>) {
    let mut sorted_keys = Vec::with_capacity(ops.len());
    let mut btree = BTreeMap::new();
    let mut avl = ModelTree::with_comparator(KeyOrder);

    fn insert_sorted(v: &mut Vec<u32>, key: u32) {
        if let Err(idx) = v.binary_search(&key) {
            v.insert(idx, key);
        }
    }

    fn remove_sorted(v: &mut Vec<u32>, key: u32) {
        if let Ok(idx) = v.binary_search(&key) {
            v.remove(idx);
        }
    }

    fn entry((&key, &value): (&u32, &u32)) -> Entry {
        Entry { key, value }
    }

    for (op_id, op) in ops.into_iter().enumerate() {
        let final_op = op.finalize(&sorted_keys);

        match final_op {
            FinalOp::Insert(key, value) => {
                insert_sorted(&mut sorted_keys, key);
                btree.insert(key, value);

                let handle = avl.insert(Entry { key, value });

                assert_eq!(
                    avl.get_at(handle),
                    Ok(&Entry { key, value }),
                    "FinalOp #{op_id}: {final_op:?}"
                );
            }

            FinalOp::Find(key) => {
                let from_btree = btree.get_key_value(&key).map(entry).ok_or(Error::NotFound);
                let from_avl = avl
                    .find(&Entry::probe(key))
                    .and_then(|handle| avl.get_at(handle))
                    .copied();

                assert_eq!(from_btree, from_avl, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::Erase(key) => {
                remove_sorted(&mut sorted_keys, key);

                let from_btree = btree
                    .remove(&key)
                    .map(|value| Entry { key, value })
                    .ok_or(Error::NotFound);
                let from_avl = avl.erase(&Entry::probe(key));

                assert_eq!(from_btree, from_avl, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::EraseHandle(key) => {
                remove_sorted(&mut sorted_keys, key);

                let from_btree = btree
                    .remove(&key)
                    .map(|value| Entry { key, value })
                    .ok_or(Error::NotFound);
                let from_avl = avl
                    .find(&Entry::probe(key))
                    .and_then(|handle| avl.erase_at(handle));

                assert_eq!(from_btree, from_avl, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::First => {
                let from_btree = btree.first_key_value().map(entry);
                let from_avl = avl.first().copied();

                assert_eq!(from_btree, from_avl, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::Last => {
                let from_btree = btree.last_key_value().map(entry);
                let from_avl = avl.last().copied();

                assert_eq!(from_btree, from_avl, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::Clear => {
                sorted_keys.clear();
                btree.clear();
                avl.clear();
            }
        }

        avl.assert_invariants();
        assert_eq!(btree.len(), avl.len());
        assert!(btree.iter().map(entry).eq(avl.iter().copied()));

        // The other two orders visit the same elements.
        let mut pre: Vec<Entry> = avl.iter_pre_order().copied().collect();
        let mut post: Vec<Entry> = avl.iter_post_order().copied().collect();
        pre.sort_by_key(|e| e.key);
        post.sort_by_key(|e| e.key);
        assert!(btree.iter().map(entry).eq(pre));
        assert!(btree.iter().map(entry).eq(post));
    }
}

/// Builds a tree from `values` and checks all three traversals against a recursive walk over the
/// tree's per-node queries.
pub fn run_traversal_equivalence(values: Vec<u32>) {
    let tree: AvlTree<u32> = values.iter().copied().collect();
    tree.assert_invariants();

    let mut sorted = values;
    sorted.sort_unstable();
    sorted.dedup();
    assert_eq!(tree.len(), sorted.len());

    #[derive(Default)]
    struct Walk {
        pre: Vec<u32>,
        inorder: Vec<u32>,
        post: Vec<u32>,
    }

    fn walk(tree: &AvlTree<u32>, handle: Handle<u32>, out: &mut Walk) {
        let value = *tree.get_at(handle).expect("handle is current");
        let left = tree.left(handle).expect("handle is current");
        let right = tree.right(handle).expect("handle is current");

        for child in [left, right].into_iter().flatten() {
            assert_eq!(tree.parent(child), Ok(Some(handle)));
        }

        out.pre.push(value);
        if let Some(left) = left {
            walk(tree, left, out);
        }
        out.inorder.push(value);
        if let Some(right) = right {
            walk(tree, right, out);
        }
        out.post.push(value);
    }

    let mut expected = Walk::default();
    if let Some(root) = tree.root() {
        assert_eq!(tree.parent(root), Ok(None));
        assert_eq!(tree.height_at(root), Ok(tree.depth()));
        walk(&tree, root, &mut expected);
    }

    assert_eq!(expected.inorder, sorted);
    assert!(tree.iter().copied().eq(expected.inorder));
    assert!(tree.iter_pre_order().copied().eq(expected.pre));
    assert!(tree.iter_post_order().copied().eq(expected.post));
}
