use std::{cmp::Ordering, format, ops::Range, prelude::v1::*};

use proptest::prelude::*;

use crate::model;

use super::*;

const FIRST_BATCH: [u32; 12] = [50, 45, 40, 48, 39, 43, 47, 49, 38, 42, 44, 46];
const SECOND_BATCH: [u32; 12] = [100, 90, 200, 60, 95, 199, 202, 80, 94, 96, 201, 300];

// Calls `f` with every ordering of `keys`.
fn for_each_permutation(keys: &mut [u32], k: usize, f: &mut impl FnMut(&[u32])) {
    if k == keys.len() {
        f(keys);
        return;
    }

    for i in k..keys.len() {
        keys.swap(k, i);
        for_each_permutation(keys, k + 1, f);
        keys.swap(k, i);
    }
}

fn insert_find_all(keys: &[u32]) {
    let mut tree = AvlTree::new();

    for &key in keys {
        tree.insert(key);
        tree.assert_invariants();
    }

    for key in keys {
        let handle = tree.find(key).expect("item not found");
        assert_eq!(tree.get_at(handle), Ok(key));
    }
}

#[test]
fn zero_elems_find() {
    insert_find_all(&[]);
}

#[test]
fn single_elem_find() {
    insert_find_all(&[0]);
}

#[test]
fn up_to_six_elems_find() {
    for n in 2..=6 {
        let mut keys: Vec<u32> = (0..n).collect();
        for_each_permutation(&mut keys, 0, &mut |keys| insert_find_all(keys));
    }
}

fn insert_erase_all(keys: &[u32]) {
    let mut tree = AvlTree::new();

    for &key in keys {
        tree.insert(key);
        tree.assert_invariants();
    }

    for key in keys {
        assert_eq!(tree.erase(key), Ok(*key));
        tree.assert_invariants();
    }
    assert!(tree.is_empty());

    for &key in keys {
        tree.insert(key);
        tree.assert_invariants();
    }

    for key in keys.iter().rev() {
        let handle = tree.find(key).expect("item not found");
        assert_eq!(tree.erase_at(handle), Ok(*key));
        tree.assert_invariants();
    }
    assert!(tree.is_empty());
}

#[test]
fn erase_one() {
    insert_erase_all(&[0]);
}

#[test]
fn erase_up_to_six() {
    for n in 2..=6 {
        let mut keys: Vec<u32> = (0..n).collect();
        for_each_permutation(&mut keys, 0, &mut |keys| insert_erase_all(keys));
    }
}

#[test]
fn ascending_and_descending_runs_stay_shallow() {
    let up: AvlTree<u32> = (0..1023).collect();
    let down: AvlTree<u32> = (0..1023).rev().collect();

    for tree in [&up, &down] {
        tree.assert_invariants();
        assert_eq!(tree.len(), 1023);
        // 1023 = 2^10 - 1, and a sorted run packs into a perfect tree.
        assert_eq!(tree.depth(), 10);
    }
}

#[test]
fn first_batch_sorts_and_stays_shallow() {
    let mut tree = AvlTree::new();

    for key in FIRST_BATCH {
        tree.insert(key);
        tree.assert_invariants();
    }

    let mut sorted = FIRST_BATCH.to_vec();
    sorted.sort_unstable();

    assert_eq!(tree.iter().copied().collect::<Vec<_>>(), sorted);
    assert_eq!(tree.len(), 12);
    // ceil(1.44 * log2(13))
    assert!(tree.depth() <= 6);
}

#[test]
fn erase_absent_leaves_tree_unchanged() {
    let mut tree = AvlTree::new();
    tree.insert_batch(FIRST_BATCH);

    let root = tree.root().expect("tree is not empty");
    let pre: Vec<u32> = tree.iter_pre_order().copied().collect();

    assert_eq!(tree.erase(&100), Err(Error::NotFound));

    assert_eq!(tree.len(), 12);
    assert!(tree.iter_pre_order().copied().eq(pre));
    // A failed erase frees nothing, so handles stay valid.
    assert_eq!(tree.get_at(root), Ok(&45));
    tree.assert_invariants();
}

#[test]
fn second_batch_then_erase() {
    let mut tree = AvlTree::new();
    tree.insert_batch(FIRST_BATCH);
    let last = tree.insert_batch(SECOND_BATCH).expect("batch is not empty");

    assert_eq!(tree.get_at(last), Ok(&300));
    assert_eq!(tree.len(), 24);
    tree.assert_invariants();

    assert_eq!(tree.erase(&100), Ok(100));
    assert_eq!(tree.len(), 23);
    assert_eq!(tree.find(&100), Err(Error::NotFound));
    assert!(!tree.contains(&100));
    tree.assert_invariants();

    assert_eq!(tree.erase(&48), Ok(48));
    assert_eq!(tree.len(), 22);
    assert_eq!(tree.find(&48), Err(Error::NotFound));
    tree.assert_invariants();

    let mut expected: Vec<u32> = FIRST_BATCH.into_iter().chain(SECOND_BATCH).collect();
    expected.retain(|&k| k != 100 && k != 48);
    expected.sort_unstable();
    assert!(tree.iter().copied().eq(expected));
}

#[test]
fn empty_batch_inserts_nothing() {
    let mut tree: AvlTree<u32> = AvlTree::new();

    assert_eq!(tree.insert_batch([]), None);
    assert!(tree.is_empty());
    assert_eq!(tree.depth(), 0);
    assert_eq!(tree.first(), None);
    assert_eq!(tree.last(), None);
}

#[test]
fn reinsert_overwrites_in_place() {
    let by_first = |a: &(u32, char), b: &(u32, char)| a.0.cmp(&b.0);
    let mut tree = AvlTree::with_comparator(by_first);
    tree.insert_batch([(2, 'a'), (1, 'b'), (3, 'c')]);

    let pre: Vec<(u32, char)> = tree.iter_pre_order().copied().collect();
    let old = tree.find(&(1, '?')).expect("key is stored");

    let new = tree.insert((1, 'z'));

    // Same node, same shape, new payload, and the earlier handle still works.
    assert_eq!(old, new);
    assert_eq!(tree.len(), 3);
    assert_eq!(tree.get_at(old), Ok(&(1, 'z')));
    assert_eq!(tree.get(&(1, '?')), Some(&(1, 'z')));
    assert_eq!(
        tree.iter_pre_order().map(|p| p.0).collect::<Vec<_>>(),
        pre.iter().map(|p| p.0).collect::<Vec<_>>()
    );
    tree.assert_invariants();
}

#[test]
fn by_key_comparator() {
    let mut tree = AvlTree::with_comparator(ByKey::new(|s: &String| s));
    tree.insert_batch(["pear", "apple", "fig"].map(String::from));

    assert_eq!(tree.first().map(String::as_str), Some("apple"));
    assert_eq!(tree.last().map(String::as_str), Some("pear"));
    assert!(tree.contains(&String::from("fig")));
}

#[test]
fn reverse_comparator() {
    let mut tree = AvlTree::with_comparator(|a: &u32, b: &u32| b.cmp(a));
    tree.insert_batch(0..10);

    tree.assert_invariants();
    assert!(tree.iter().copied().eq((0..10).rev()));
    assert_eq!(tree.comparator()(&1, &2), Ordering::Greater);
}

#[test]
fn handles_survive_inserts() {
    let mut tree = AvlTree::new();
    let handle = tree.insert(10);

    // Enough inserts to rotate the node away from the root.
    tree.insert_batch(11..40);

    assert_eq!(tree.get_at(handle), Ok(&10));
    assert_ne!(tree.root(), Some(handle));
    assert_eq!(tree.find(&10), Ok(handle));
}

#[test]
fn erase_invalidates_handles() {
    let mut tree = AvlTree::new();
    let a = tree.insert(1);
    let b = tree.insert(2);

    assert_eq!(tree.erase_at(a), Ok(1));

    assert_eq!(tree.get_at(a), Err(Error::Invalidated));
    assert_eq!(tree.get_at(b), Err(Error::Invalidated));
    assert_eq!(tree.erase_at(a), Err(Error::Invalidated));
    assert_eq!(tree.len(), 1);

    let b = tree.find(&2).expect("key is stored");
    assert_eq!(tree.get_at(b), Ok(&2));
}

#[test]
fn clear_invalidates_handles() {
    let mut tree: AvlTree<u32> = (0..8).collect();
    let root = tree.root().expect("tree is not empty");

    tree.clear();

    assert!(tree.is_empty());
    assert_eq!(tree.root(), None);
    assert_eq!(tree.height_at(root), Err(Error::Invalidated));
    assert_eq!(tree.left(root), Err(Error::Invalidated));

    tree.insert(3);
    assert_eq!(tree.get_at(root), Err(Error::Invalidated));
}

#[test]
fn foreign_handles_are_rejected() {
    let mut a: AvlTree<u32> = (0..4).collect();
    let b: AvlTree<u32> = (0..4).collect();
    let from_b = b.find(&1).expect("key is stored");

    assert_eq!(a.get_at(from_b), Err(Error::ForeignHandle));
    assert_eq!(a.parent(from_b), Err(Error::ForeignHandle));
    assert_eq!(a.erase_at(from_b), Err(Error::ForeignHandle));
    assert_eq!(a.len(), 4);
}

#[test]
fn structural_queries() {
    let tree: AvlTree<u32> = (1..=3).collect();

    let root = tree.root().expect("tree is not empty");
    let left = tree.left(root).unwrap().expect("root has a left child");
    let right = tree.right(root).unwrap().expect("root has a right child");

    assert_eq!(tree.get_at(root), Ok(&2));
    assert_eq!(tree.get_at(left), Ok(&1));
    assert_eq!(tree.get_at(right), Ok(&3));
    assert_eq!(tree.parent(root), Ok(None));
    assert_eq!(tree.parent(left), Ok(Some(root)));
    assert_eq!(tree.height_at(root), Ok(2));
    assert_eq!(tree.height_at(right), Ok(1));
    assert_eq!(tree.left(left), Ok(None));
}

#[test]
fn clone_is_independent() {
    let mut tree: AvlTree<u32> = FIRST_BATCH.into_iter().collect();
    let copy = tree.clone();
    let handle = tree.find(&45).expect("key is stored");

    copy.assert_invariants();
    assert_eq!(tree, copy);
    assert!(tree.iter_pre_order().eq(copy.iter_pre_order()));
    assert_eq!(copy.get_at(handle), Err(Error::ForeignHandle));

    tree.erase(&45).unwrap();
    assert_ne!(tree, copy);
    assert!(copy.contains(&45));
    assert_eq!(copy.len(), 12);
}

#[test]
fn debug_lists_in_order() {
    let tree: AvlTree<u32> = [3, 1, 2].into_iter().collect();
    assert_eq!(format!("{tree:?}"), "{1, 2, 3}");
}

#[test]
fn iterators_report_exact_len() {
    let tree: AvlTree<u32> = (0..20).collect();

    let mut iter = tree.iter_post_order();
    assert_eq!(iter.len(), 20);
    iter.next();
    assert_eq!(iter.len(), 19);

    let mut n = 0;
    for _ in &tree {
        n += 1;
    }
    assert_eq!(n, 20);
}

#[test]
fn is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<AvlTree<u32>>();
    assert_send_sync::<Handle<u32>>();
}

#[test]
fn arbitrary_ops_replay() {
    use arbitrary::{Arbitrary, Unstructured};

    let bytes: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
    let mut u = Unstructured::new(&bytes);
    let ops = Vec::<model::Op>::arbitrary(&mut u).expect("enough bytes for an op sequence");

    model::run_btree_equivalence(ops);
}

#[cfg(miri)]
const FUZZ_RANGE: Range<usize> = 0..10;

#[cfg(not(miri))]
const FUZZ_RANGE: Range<usize> = 0..1000;

proptest::proptest! {
    #![proptest_config(ProptestConfig {
        max_shrink_iters: 65536,
        .. ProptestConfig::default()
    })]

    #[test]
    fn btree_equivalence(ops in proptest::collection::vec(model::op_strategy(), FUZZ_RANGE)) {
        model::run_btree_equivalence(ops);
    }

    #[test]
    fn traversal_equivalence(values in proptest::collection::vec(0u32..1000, FUZZ_RANGE)) {
        model::run_traversal_equivalence(values);
    }
}
