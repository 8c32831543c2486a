//! B+ Tree Scenario Tests
//!
//! Fixed insert / delete sequences with the exact shape each one must leave.
//! Shapes are given level by level, left to right, as produced by
//! `BPlusTree::level_order`.
//!
//! Set `RUST_LOG=dblite=trace` to watch the splits and merges.

use dblite::{BPlusTree, DuplicatePolicy, Error, TreeConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const SEQUENCE: [i32; 15] = [20, 18, 22, 28, 25, 41, 23, 42, 53, 35, 62, 63, 84, 73, 99];

fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dblite=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init();
}

fn build(m: usize, l: usize, keys: &[i32]) -> BPlusTree<i32> {
    init_tracing();
    let mut tree = BPlusTree::new(m, l).unwrap();
    for &k in keys {
        tree.insert(k).unwrap();
    }
    tree.validate().unwrap();
    tree
}

/// Keys of every node, grouped by depth.
fn levels(tree: &BPlusTree<i32>) -> Vec<Vec<Vec<i32>>> {
    let mut levels: Vec<Vec<Vec<i32>>> = vec![];
    for view in tree.level_order() {
        if levels.len() == view.depth {
            levels.push(vec![]);
        }
        levels[view.depth].push(view.keys.to_vec());
    }
    levels
}

fn keys(tree: &BPlusTree<i32>) -> Vec<i32> {
    tree.iter().copied().collect()
}

// ============================================================================
// Insert
// ============================================================================

/// Fifteen inserts at M=4, L=4 fill one internal root with four leaves.
#[test]
fn test_insert_sequence_m4_l4() {
    let tree = build(4, 4, &SEQUENCE);

    assert_eq!(
        levels(&tree),
        vec![
            vec![vec![25, 42, 63]],
            vec![
                vec![18, 20, 22, 23],
                vec![25, 28, 35, 41],
                vec![42, 53, 62],
                vec![63, 73, 84, 99],
            ],
        ]
    );

    let mut sorted = SEQUENCE.to_vec();
    sorted.sort();
    assert_eq!(keys(&tree), sorted);
}

/// The same inserts at M=3 overflow the root and grow a third level.
#[test]
fn test_insert_sequence_m3_l4() {
    let tree = build(3, 4, &SEQUENCE);

    assert_eq!(
        levels(&tree),
        vec![
            vec![vec![42]],
            vec![vec![25], vec![63]],
            vec![
                vec![18, 20, 22, 23],
                vec![25, 28, 35, 41],
                vec![42, 53, 62],
                vec![63, 73, 84, 99],
            ],
        ]
    );
}

#[test]
fn test_every_inserted_key_is_found() {
    let tree = build(3, 2, &SEQUENCE);
    for k in SEQUENCE {
        let pos = tree.search(&k).unwrap();
        assert_eq!(tree.key_at(pos), Some(&k));
    }
    assert_eq!(tree.search(&0), Err(Error::KeyNotFound));
}

/// Five copies of one key are all stored; the fifth forces a split.
#[test]
fn test_duplicates_are_stored() {
    let mut tree = build(3, 4, &[10; 5]);

    assert_eq!(tree.len(), 5);
    assert_eq!(levels(&tree), vec![vec![vec![10]], vec![vec![10, 10, 10], vec![10, 10]]]);
    assert!(tree.contains(&10));

    for remaining in (0..5).rev() {
        tree.delete(&10).unwrap();
        tree.validate().unwrap();
        assert_eq!(tree.len(), remaining);
    }
    assert_eq!(tree.delete(&10), Err(Error::KeyNotFound));
    assert_eq!(levels(&tree), vec![vec![Vec::<i32>::new()]]);
}

#[test]
fn test_reject_policy_keeps_one_copy() {
    init_tracing();
    let config = TreeConfig::new(3, 4).with_duplicates(DuplicatePolicy::Reject);
    let mut tree = BPlusTree::with_config(config).unwrap();

    tree.insert(10).unwrap();
    for _ in 0..4 {
        assert_eq!(tree.insert(10), Err(Error::DuplicateKey));
    }
    assert_eq!(keys(&tree), vec![10]);
}

// ============================================================================
// Delete
// ============================================================================

/// Deletes that stay within leaf occupancy only refresh separators.
#[test]
fn test_delete_sequence_m3_l4() {
    let mut tree = build(3, 4, &SEQUENCE);
    for k in [41, 28, 62, 99, 20, 63] {
        tree.delete(&k).unwrap();
        tree.validate().unwrap();
    }

    assert_eq!(
        levels(&tree),
        vec![
            vec![vec![42]],
            vec![vec![25], vec![73]],
            vec![vec![18, 22, 23], vec![25, 35], vec![42, 53], vec![73, 84]],
        ]
    );
}

/// Emptying the right half merges leaves, then internal nodes, then drops a level.
#[test]
fn test_merge_cascade_shrinks_height() {
    let mut tree = build(3, 4, &SEQUENCE);
    for k in [41, 28, 62, 99, 20, 63] {
        tree.delete(&k).unwrap();
    }
    tree.reset_counters();

    tree.delete(&53).unwrap();
    tree.validate().unwrap();

    assert_eq!(
        levels(&tree),
        vec![
            vec![vec![25, 42]],
            vec![vec![18, 22, 23], vec![25, 35], vec![42, 73, 84]],
        ]
    );
    let stats = tree.stats();
    assert_eq!(stats.height, 2);
    assert_eq!(stats.merges, 2);
    assert_eq!(stats.root_collapses, 1);
}

/// Borrowing from the left leaf, then merging once it is at minimum.
#[test]
fn test_merging_after_borrow() {
    let mut tree = build(3, 4, &[10, 20, 30, 40, 50, 60, 70, 80, 90]);
    for k in [80, 70, 60, 50, 40] {
        tree.delete(&k).unwrap();
        tree.validate().unwrap();
    }

    assert_eq!(levels(&tree), vec![vec![vec![30]], vec![vec![10, 20], vec![30, 90]]]);
}

#[test]
fn test_rebalancing_with_duplicates() {
    let mut tree = build(
        3,
        4,
        &[15, 25, 35, 45, 55, 65, 75, 85, 95, 5, 35, 65, 75, 85, 95],
    );
    for k in [15, 25, 35, 45, 55, 65, 75, 85, 95] {
        tree.delete(&k).unwrap();
        tree.validate().unwrap();
    }

    assert_eq!(keys(&tree), vec![5, 35, 65, 75, 85, 95]);
}

#[test]
fn test_delete_sole_key_leaves_empty_root_leaf() {
    let mut tree = build(3, 4, &[7]);
    tree.delete(&7).unwrap();

    assert!(tree.is_empty());
    assert_eq!(tree.height(), 1);
    assert_eq!(tree.leaf_keys(tree.root()), Some(&[][..]));
    tree.validate().unwrap();
}

#[test]
fn test_delete_everything_then_reuse() {
    let mut tree = build(4, 3, &(0..200).collect::<Vec<_>>());
    for k in (0..200).rev() {
        tree.delete(&k).unwrap();
    }
    tree.validate().unwrap();
    assert_eq!(tree.height(), 1);
    assert_eq!(tree.stats().node_count(), 1);

    tree.extend([3, 1, 2]);
    assert_eq!(keys(&tree), vec![1, 2, 3]);
}

#[test]
fn test_absent_delete_changes_nothing() {
    let mut tree = build(3, 2, &SEQUENCE);
    let before = levels(&tree);

    assert_eq!(tree.delete(&1000), Err(Error::KeyNotFound));
    assert_eq!(tree.delete(&19), Err(Error::KeyNotFound));

    assert_eq!(levels(&tree), before);
    assert_eq!(tree.len(), SEQUENCE.len());
}

// ============================================================================
// Construction
// ============================================================================

#[test]
fn test_degenerate_orders_are_rejected() {
    for (m, l) in [(0, 4), (2, 4), (3, 0)] {
        assert_eq!(
            BPlusTree::<i32>::new(m, l).unwrap_err(),
            Error::InvalidOrder {
                max_children: m,
                max_leaf_keys: l
            }
        );
    }
}

#[test]
fn test_smallest_orders_work() {
    let mut tree = build(3, 1, &(0..64).collect::<Vec<_>>());
    assert!(tree.height() > 3);

    for k in (0..64).step_by(2) {
        tree.delete(&k).unwrap();
        tree.validate().unwrap();
    }
    assert_eq!(keys(&tree), (1..64).step_by(2).collect::<Vec<_>>());
}
