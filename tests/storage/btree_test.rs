use lumbung::{
    storage::{
        btree::BTree,
        index::{BTreeMapIndex, OrderedIndex},
    },
    types::error::DatabaseError,
};

type Index = Box<dyn OrderedIndex<i32, i32>>;

/// Every backend the conformance suite runs against.
fn backends() -> Vec<(String, Index)> {
    let mut backends: Vec<(String, Index)> = [3, 4, 5, 7]
        .into_iter()
        .map(|order| {
            let index: Index = Box::new(BTree::with_order(order).unwrap());
            (format!("btree order {}", order), index)
        })
        .collect();
    backends.push(("btreemap".to_string(), Box::new(BTreeMapIndex::new())));
    backends
}

fn keys(index: &dyn OrderedIndex<i32, i32>) -> Vec<i32> {
    index.entries().map(|e| e.unwrap().0).collect()
}

/// All orderings of `items`, by Heap's algorithm.
fn permutations(items: &[i32]) -> Vec<Vec<i32>> {
    fn heap(k: usize, items: &mut Vec<i32>, out: &mut Vec<Vec<i32>>) {
        if k <= 1 {
            out.push(items.clone());
            return;
        }
        heap(k - 1, items, out);
        for i in 0..k - 1 {
            if k % 2 == 0 {
                items.swap(i, k - 1);
            } else {
                items.swap(0, k - 1);
            }
            heap(k - 1, items, out);
        }
    }
    let mut items = items.to_vec();
    let mut out = Vec::new();
    heap(items.len(), &mut items, &mut out);
    out
}

/// Deterministic pseudo-random keys.
fn scrambled(count: usize) -> Vec<i32> {
    let mut state: u64 = 0x2545_f491_4f6c_dd1d;
    let mut keys: Vec<i32> = (0..count as i32).collect();
    for i in (1..keys.len()).rev() {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        let j = (state >> 33) as usize % (i + 1);
        keys.swap(i, j);
    }
    keys
}

#[test]
fn test_iterates_in_ascending_order() {
    for (name, mut index) in backends() {
        for key in [2, 4, 1, 10, 11, 0] {
            index.insert(key, key * 10).unwrap();
        }
        assert_eq!(keys(index.as_ref()), vec![0, 1, 2, 4, 10, 11], "{}", name);
        assert_eq!(index.len().unwrap(), 6, "{}", name);
    }
}

#[test]
fn test_insert_overwrites_existing_key() {
    for (name, mut index) in backends() {
        index.insert(5, 1).unwrap();
        index.insert(5, 2).unwrap();
        assert_eq!(index.get(&5).unwrap(), 2, "{}", name);
        assert_eq!(index.len().unwrap(), 1, "{}", name);
    }
}

#[test]
fn test_missing_key() {
    for (name, mut index) in backends() {
        assert!(matches!(index.get(&1), Err(DatabaseError::KeyNotFound)), "{}", name);
        assert!(!index.contains(&1).unwrap(), "{}", name);
        assert!(matches!(index.delete(&1), Err(DatabaseError::KeyNotFound)), "{}", name);
        assert!(keys(index.as_ref()).is_empty(), "{}", name);
        assert!(index.is_empty().unwrap(), "{}", name);
    }
}

#[test]
fn test_delete_of_absent_key_leaves_index_intact() {
    for (name, mut index) in backends() {
        for key in 0..20 {
            index.insert(key * 2, key).unwrap();
        }
        for key in [-1, 1, 7, 39, 100] {
            assert!(matches!(index.delete(&key), Err(DatabaseError::KeyNotFound)), "{}", name);
        }
        assert_eq!(keys(index.as_ref()), (0..20).map(|k| k * 2).collect::<Vec<_>>(), "{}", name);
    }
}

#[test]
fn test_delete_then_reinsert() {
    for (name, mut index) in backends() {
        for key in 0..10 {
            index.insert(key, key).unwrap();
        }
        index.delete(&4).unwrap();
        assert!(matches!(index.get(&4), Err(DatabaseError::KeyNotFound)), "{}", name);
        index.insert(4, 400).unwrap();
        assert_eq!(index.get(&4).unwrap(), 400, "{}", name);
        assert_eq!(index.len().unwrap(), 10, "{}", name);
    }
}

#[test]
fn test_iteration_is_restartable() {
    for (name, mut index) in backends() {
        for key in scrambled(50) {
            index.insert(key, -key).unwrap();
        }
        let first: Vec<(i32, i32)> = index.entries().map(|e| e.unwrap()).collect();
        let second: Vec<(i32, i32)> = index.entries().map(|e| e.unwrap()).collect();
        assert_eq!(first, second, "{}", name);
        assert_eq!(first.len(), 50, "{}", name);
        assert!(first.windows(2).all(|w| w[0].0 < w[1].0), "{}", name);
    }
}

#[test]
fn test_all_permutations_insert_then_delete() {
    let all = permutations(&[0, 1, 2, 3, 4, 5, 6]);
    assert_eq!(all.len(), 5040);

    for perm in &all {
        for (name, mut index) in backends() {
            for key in perm {
                index.insert(*key, *key).unwrap();
            }
            assert_eq!(keys(index.as_ref()), vec![0, 1, 2, 3, 4, 5, 6], "{} {:?}", name, perm);

            for (i, key) in perm.iter().enumerate() {
                index.delete(key).unwrap();
                for (j, other) in perm.iter().enumerate() {
                    assert_eq!(
                        index.contains(other).unwrap(),
                        j > i,
                        "{} {:?} after deleting {}",
                        name,
                        perm,
                        key
                    );
                }
            }
            assert!(index.is_empty().unwrap(), "{} {:?}", name, perm);
        }
    }
}

#[test]
fn test_all_permutations_keep_btree_invariants() {
    for perm in permutations(&[0, 1, 2, 3, 4, 5, 6]) {
        for order in [3, 4, 5] {
            let mut tree = BTree::with_order(order).unwrap();
            for key in 0..7 {
                tree.insert(key, ());
                tree.verify().unwrap();
            }
            for key in &perm {
                assert!(tree.remove(key).unwrap().is_some());
                tree.verify().unwrap();
            }
            assert!(tree.is_empty());
            assert_eq!(tree.height(), 0);
        }
    }
}

#[test]
fn test_large_workload() {
    let keys = scrambled(2000);
    for order in [3, 4, 5, 7, 16] {
        let mut tree = BTree::with_order(order).unwrap();
        for key in &keys {
            tree.insert(*key, key.to_string());
        }
        tree.verify().unwrap();
        assert_eq!(tree.len(), 2000);

        for key in keys.iter().filter(|k| *k % 3 == 0) {
            assert_eq!(tree.remove(key).unwrap(), Some(key.to_string()));
        }
        tree.verify().unwrap();

        let remaining: Vec<i32> = tree.iter().map(|(k, _)| *k).collect();
        let expected: Vec<i32> = (0..2000).filter(|k| k % 3 != 0).collect();
        assert_eq!(remaining, expected);
        assert_eq!(tree.get(&1), Some(&"1".to_string()));
        assert_eq!(tree.get(&3), None);
    }
}

#[test]
fn test_height_stays_logarithmic() {
    let mut tree = BTree::with_order(3).unwrap();
    for key in 0..1023 {
        tree.insert(key, ());
    }
    // a 2-3 tree of 1023 keys has between 7 and 10 levels
    assert!((7..=10).contains(&tree.height()), "height {}", tree.height());
}

#[test]
fn test_rejects_orders_below_three() {
    assert!(matches!(
        BTree::<i32, i32>::with_order(2),
        Err(DatabaseError::InvalidConfig { .. })
    ));
}
