//! B+ tree statistics tracking.

use std::fmt;

/// Cumulative structural counters kept by the tree.
///
/// Each insert or delete bumps these as it splits, borrows, merges or
/// collapses nodes. The tree is mutated through `&mut`, so plain integers do.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Counters {
    pub(crate) leaf_splits: u64,
    pub(crate) internal_splits: u64,
    pub(crate) borrows: u64,
    pub(crate) merges: u64,
    pub(crate) root_collapses: u64,
}

impl Counters {
    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }
}

/// A point-in-time snapshot of a tree's shape and structural history.
///
/// # Example
/// ```
/// use dblite::BPlusTree;
///
/// let mut tree = BPlusTree::new(3, 2).unwrap();
/// for k in 0..10 {
///     tree.insert(k).unwrap();
/// }
/// let stats = tree.stats();
/// assert_eq!(stats.len, 10);
/// assert!(stats.leaf_splits > 0);
/// println!("{}", stats);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeStats {
    /// Number of stored keys, duplicates included.
    pub len: usize,
    /// Levels from root to leaves; 1 for a lone root leaf.
    pub height: usize,
    pub leaf_nodes: usize,
    pub internal_nodes: usize,
    pub leaf_splits: u64,
    pub internal_splits: u64,
    pub borrows: u64,
    pub merges: u64,
    pub root_collapses: u64,
}

impl TreeStats {
    pub(crate) fn new(
        len: usize,
        height: usize,
        leaf_nodes: usize,
        internal_nodes: usize,
        counters: Counters,
    ) -> Self {
        Self {
            len,
            height,
            leaf_nodes,
            internal_nodes,
            leaf_splits: counters.leaf_splits,
            internal_splits: counters.internal_splits,
            borrows: counters.borrows,
            merges: counters.merges,
            root_collapses: counters.root_collapses,
        }
    }

    /// Total nodes in the tree.
    pub fn node_count(&self) -> usize {
        self.leaf_nodes + self.internal_nodes
    }

    /// Average keys per leaf (0.0 for an empty tree).
    pub fn leaf_fill(&self) -> f64 {
        if self.leaf_nodes == 0 {
            0.0
        } else {
            self.len as f64 / self.leaf_nodes as f64
        }
    }
}

impl fmt::Display for TreeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Stats {{ keys: {}, height: {}, nodes: {} ({} leaves), splits: {}, borrows: {}, merges: {}, collapses: {} }}",
            self.len,
            self.height,
            self.node_count(),
            self.leaf_nodes,
            self.leaf_splits + self.internal_splits,
            self.borrows,
            self.merges,
            self.root_collapses
        )
    }
}
