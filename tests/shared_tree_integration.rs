//! Integration tests for the shared tree handle.
//!
//! These tests verify behavior across threads that unit tests don't cover.

use dblite::{DuplicatePolicy, Error, SharedBPlusTree, TreeConfig};
use std::sync::Arc;
use std::sync::Barrier;
use std::thread;

/// Test concurrent writers on interleaved key ranges.
#[test]
fn test_concurrent_writers() {
    let index = SharedBPlusTree::new(4, 4).unwrap();
    let mut handles = vec![];

    for t in 0..8 {
        let index = index.clone();
        handles.push(thread::spawn(move || {
            for j in 0..250 {
                index.insert(j * 8 + t).unwrap();
            }
        }));
    }

    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(index.len(), 2000);
    index.read(|tree| tree.validate()).unwrap();
    assert_eq!(index.collect_range(..), (0..2000).collect::<Vec<_>>());
}

/// Test readers always see a fully rebalanced tree while a writer runs.
#[test]
fn test_readers_never_see_partial_rebalance() {
    let index = SharedBPlusTree::new(3, 2).unwrap();
    index.write(|tree| tree.extend(0..500));

    let barrier = Arc::new(Barrier::new(3));

    let writer = {
        let index = index.clone();
        let barrier = Arc::clone(&barrier);
        thread::spawn(move || {
            barrier.wait();
            for k in (0..500).step_by(2) {
                index.delete(&k).unwrap();
            }
        })
    };

    let readers: Vec<_> = (0..2)
        .map(|_| {
            let index = index.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for _ in 0..50 {
                    index.read(|tree| tree.validate()).unwrap();
                    // Odd keys are never deleted
                    assert!(index.contains(&251));
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for r in readers {
        r.join().unwrap();
    }

    assert_eq!(index.len(), 250);
    assert!(index.collect_range(..).iter().all(|k| k % 2 == 1));
}

/// Test that racing inserts of one key under `Reject` let exactly one win.
#[test]
fn test_reject_policy_under_contention() {
    let config = TreeConfig::new(3, 3).with_duplicates(DuplicatePolicy::Reject);
    let index = SharedBPlusTree::with_config(config).unwrap();

    let handles: Vec<_> = (0..6)
        .map(|_| {
            let index = index.clone();
            thread::spawn(move || index.insert(77))
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .filter(|r| r.is_err())
        .all(|r| *r == Err(Error::DuplicateKey)));
    assert_eq!(index.len(), 1);
}

/// Test stats accuracy after a mixed workload.
#[test]
fn test_stats_accuracy() {
    let index = SharedBPlusTree::new(3, 2).unwrap();
    for k in 0..100 {
        index.insert(k).unwrap();
    }

    let stats = index.stats();
    assert_eq!(stats.len, 100);
    assert!(stats.leaf_splits >= 1);
    assert!(stats.internal_splits >= 1);
    assert!(stats.height >= 3);

    for k in 0..100 {
        index.delete(&k).unwrap();
    }

    let stats = index.stats();
    assert_eq!(stats.len, 0);
    assert_eq!(stats.height, 1);
    assert!(stats.merges >= 1);
    assert!(stats.root_collapses >= 1);
}
