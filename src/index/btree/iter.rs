//! Read-only traversals.
//!
//! - [`Iter`] / [`Range`] walk the leaf chain in ascending key order.
//! - [`LevelOrder`] walks nodes breadth-first for diagnostics.
//!
//! All three borrow the tree, are lazy, and can be restarted by asking the
//! tree for a fresh one.

use std::collections::VecDeque;
use std::iter::FusedIterator;
use std::ops::{Bound, RangeBounds};

use crate::common::NodeId;
use crate::index::btree::node::NodeKind;
use crate::index::btree::BPlusTree;

/// Ascending iterator over every key, following `next` links.
pub struct Iter<'a, K> {
    tree: &'a BPlusTree<K>,
    leaf: Option<NodeId>,
    index: usize,
    remaining: usize,
}

impl<'a, K: Ord + Clone> Iterator for Iter<'a, K> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(leaf) = self.leaf {
            let node = self.tree.node(leaf);
            if let Some(key) = node.keys.get(self.index) {
                self.index += 1;
                self.remaining -= 1;
                return Some(key);
            }
            self.leaf = node.next();
            self.index = 0;
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K: Ord + Clone> ExactSizeIterator for Iter<'_, K> {}

impl<K: Ord + Clone> FusedIterator for Iter<'_, K> {}

/// Ascending iterator over the keys inside a range.
pub struct Range<'a, K> {
    tree: &'a BPlusTree<K>,
    leaf: Option<NodeId>,
    index: usize,
    /// Cleared once the first key past the start bound is reached.
    start: Option<Bound<K>>,
    end: Bound<K>,
}

impl<'a, K: Ord + Clone> Iterator for Range<'a, K> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(leaf) = self.leaf {
            let node = self.tree.node(leaf);
            let Some(key) = node.keys.get(self.index) else {
                self.leaf = node.next();
                self.index = 0;
                continue;
            };
            if let Some(start) = &self.start {
                let below = match start {
                    Bound::Included(start) => key < start,
                    Bound::Excluded(start) => key <= start,
                    Bound::Unbounded => false,
                };
                if below {
                    self.index += 1;
                    continue;
                }
                self.start = None;
            }
            let in_range = match &self.end {
                Bound::Included(end) => key <= end,
                Bound::Excluded(end) => key < end,
                Bound::Unbounded => true,
            };
            if !in_range {
                self.leaf = None;
                return None;
            }
            self.index += 1;
            return Some(key);
        }
        None
    }
}

impl<K: Ord + Clone> FusedIterator for Range<'_, K> {}

/// One node as seen by [`LevelOrder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeView<'a, K> {
    pub id: NodeId,
    /// 0 at the root.
    pub depth: usize,
    pub is_leaf: bool,
    /// Keys of a leaf, separators of an internal node.
    pub keys: &'a [K],
}

/// Breadth-first walk over nodes, left to right within a level.
pub struct LevelOrder<'a, K> {
    tree: &'a BPlusTree<K>,
    queue: VecDeque<(NodeId, usize)>,
}

impl<'a, K: Ord + Clone> Iterator for LevelOrder<'a, K> {
    type Item = NodeView<'a, K>;

    fn next(&mut self) -> Option<Self::Item> {
        let (id, depth) = self.queue.pop_front()?;
        let node = self.tree.node(id);
        if let NodeKind::Internal { children } = &node.kind {
            self.queue.extend(children.iter().map(|&child| (child, depth + 1)));
        }
        Some(NodeView {
            id,
            depth,
            is_leaf: node.is_leaf(),
            keys: &node.keys,
        })
    }
}

impl<K: Ord + Clone> FusedIterator for LevelOrder<'_, K> {}

impl<K: Ord + Clone> BPlusTree<K> {
    /// Iterate every key in ascending order.
    pub fn iter(&self) -> Iter<'_, K> {
        Iter {
            tree: self,
            leaf: Some(self.leftmost_leaf()),
            index: 0,
            remaining: self.len(),
        }
    }

    /// Iterate the keys within `range` in ascending order.
    ///
    /// # Example
    /// ```
    /// use dblite::BPlusTree;
    ///
    /// let tree: BPlusTree<i32> = (0..20).collect();
    /// let keys: Vec<_> = tree.range(5..8).copied().collect();
    /// assert_eq!(keys, vec![5, 6, 7]);
    /// ```
    pub fn range<R: RangeBounds<K>>(&self, range: R) -> Range<'_, K> {
        let (leaf, index) = match range.start_bound() {
            Bound::Unbounded => (self.leftmost_leaf(), 0),
            Bound::Included(start) => {
                let leaf = self.find_leaf_lower_bound(start);
                (leaf, self.node(leaf).keys.partition_point(|k| k < start))
            }
            Bound::Excluded(start) => {
                let leaf = self.find_leaf_lower_bound(start);
                (leaf, self.node(leaf).keys.partition_point(|k| k <= start))
            }
        };
        Range {
            tree: self,
            leaf: Some(leaf),
            index,
            start: Some(range.start_bound().cloned()),
            end: range.end_bound().cloned(),
        }
    }

    /// Walk the nodes breadth-first from the root.
    pub fn level_order(&self) -> LevelOrder<'_, K> {
        LevelOrder {
            tree: self,
            queue: VecDeque::from([(self.root(), 0)]),
        }
    }
}

impl<'a, K: Ord + Clone> IntoIterator for &'a BPlusTree<K> {
    type Item = &'a K;
    type IntoIter = Iter<'a, K>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
