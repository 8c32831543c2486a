//! B+ tree - the ordered index.
//!
//! The [`BPlusTree`] provides:
//! - Ordered insertion with leaf and internal splits
//! - Deletion with borrow / merge rebalancing and root collapse
//! - Point search returning the leaf and slot of the key
//! - A forward-linked leaf chain for ordered scans (see `iter.rs`)

use tracing::{debug, trace};

use crate::common::config::{DuplicatePolicy, TreeConfig};
use crate::common::{Error, NodeId, Result};
use crate::index::btree::arena::Arena;
use crate::index::btree::node::{Node, NodeKind};
use crate::index::btree::stats::{Counters, TreeStats};

/// Where a key lives: a leaf and the key's slot in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub leaf: NodeId,
    pub index: usize,
}

/// A B+ tree over a single ordered key type.
///
/// # Architecture
/// ```text
///                      ┌───────────────┐
///                      │ root [25 | 42]│  internal: separators + children
///                      └─┬─────┬─────┬─┘
///            ┌───────────┘     │     └───────────┐
///     ┌──────▼──────┐   ┌──────▼──────┐   ┌──────▼──────┐
///     │ 18 20 22 23 │──▶│ 25 28 35 41 │──▶│ 42 53 62    │  leaves + next chain
///     └─────────────┘   └─────────────┘   └─────────────┘
/// ```
///
/// Nodes live in an arena and refer to each other by [`NodeId`]. An internal
/// node owns its children; `parent` and `next` are plain ids used for
/// navigation only.
///
/// # Invariants (restored by every public operation)
/// - All leaves sit at the same depth.
/// - An internal node has `keys.len() + 1` children, and `keys[i]` is the
///   smallest key under `children[i + 1]`.
/// - Non-root nodes hold at least `ceil(M/2)` children / `ceil(L/2)` keys.
/// - The root is a leaf (possibly empty) or an internal node with at least
///   two children.
///
/// # Usage
/// ```
/// use dblite::{BPlusTree, Error};
///
/// let mut tree = BPlusTree::new(4, 4)?;
/// for k in [20, 18, 22, 28, 25] {
///     tree.insert(k)?;
/// }
///
/// let pos = tree.search(&22)?;
/// assert_eq!(tree.key_at(pos), Some(&22));
///
/// tree.delete(&22)?;
/// assert_eq!(tree.search(&22), Err(Error::KeyNotFound));
/// assert_eq!(tree.iter().copied().collect::<Vec<_>>(), vec![18, 20, 25, 28]);
/// # Ok::<(), dblite::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct BPlusTree<K> {
    /// Storage for every live node.
    nodes: Arena<Node<K>>,

    /// The single node with no parent.
    root: NodeId,

    /// Orders and duplicate policy (immutable after construction).
    config: TreeConfig,

    /// Number of stored keys.
    len: usize,

    /// Structural counters reported by `stats()`.
    counters: Counters,
}

impl<K: Ord + Clone> BPlusTree<K> {
    /// Create a tree with `max_children` (`M`) and `max_leaf_keys` (`L`).
    ///
    /// # Errors
    /// - `Error::InvalidOrder` if `M < 3` or `L < 1`
    pub fn new(max_children: usize, max_leaf_keys: usize) -> Result<Self> {
        Self::with_config(TreeConfig::new(max_children, max_leaf_keys))
    }

    /// Create a tree from a full configuration.
    ///
    /// # Errors
    /// - `Error::InvalidOrder` if the orders cannot rebalance
    pub fn with_config(config: TreeConfig) -> Result<Self> {
        config.validate()?;
        debug!(
            max_children = config.max_children,
            max_leaf_keys = config.max_leaf_keys,
            duplicates = ?config.duplicates,
            "created B+ tree"
        );
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: TreeConfig) -> Self {
        let mut nodes = Arena::new();
        let root = nodes.alloc(Node::empty_leaf());
        Self {
            nodes,
            root,
            config,
            len: 0,
            counters: Counters::default(),
        }
    }

    // ========================================================================
    // Public API: Info
    // ========================================================================

    /// The tree's configuration.
    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    /// Number of stored keys, duplicates included.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Id of the current root node.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of levels; a lone root leaf has height 1.
    pub fn height(&self) -> usize {
        let mut height = 1;
        let mut id = self.root;
        while let NodeKind::Internal { children } = &self.node(id).kind {
            id = children[0];
            height += 1;
        }
        height
    }

    /// Keys of a leaf, or `None` if `leaf` is not a live leaf of this tree.
    ///
    /// Resolves the leaf half of a [`Position`] returned by [`search`](Self::search).
    pub fn leaf_keys(&self, leaf: NodeId) -> Option<&[K]> {
        self.nodes
            .try_get(leaf)
            .filter(|node| node.is_leaf())
            .map(|node| node.keys.as_slice())
    }

    /// The key stored at `pos`, if the position is still valid.
    pub fn key_at(&self, pos: Position) -> Option<&K> {
        self.leaf_keys(pos.leaf).and_then(|keys| keys.get(pos.index))
    }

    /// Smallest key.
    pub fn first(&self) -> Option<&K> {
        self.node(self.leftmost_leaf()).keys.first()
    }

    /// Largest key.
    pub fn last(&self) -> Option<&K> {
        let mut id = self.root;
        while let NodeKind::Internal { children } = &self.node(id).kind {
            id = children[children.len() - 1];
        }
        self.node(id).keys.last()
    }

    /// Snapshot of shape and structural counters.
    pub fn stats(&self) -> TreeStats {
        let mut leaves = 0;
        let mut cursor = Some(self.leftmost_leaf());
        while let Some(id) = cursor {
            leaves += 1;
            cursor = self.node(id).next();
        }
        TreeStats::new(
            self.len,
            self.height(),
            leaves,
            self.nodes.len() - leaves,
            self.counters,
        )
    }

    /// Zero the cumulative split / borrow / merge / collapse counters.
    pub fn reset_counters(&mut self) {
        self.counters.reset();
    }

    /// Drop every key, leaving a single empty root leaf.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root = self.nodes.alloc(Node::empty_leaf());
        self.len = 0;
        self.counters.reset();
        debug!("cleared B+ tree");
    }

    // ========================================================================
    // Public API: Search
    // ========================================================================

    /// Find `key` and return its leaf and slot.
    ///
    /// With duplicates, the position of the first occurrence in the reached
    /// leaf is returned. Never mutates the tree.
    ///
    /// # Errors
    /// - `Error::KeyNotFound` if the key is absent
    pub fn search(&self, key: &K) -> Result<Position> {
        let leaf = self.find_leaf(key);
        let keys = &self.node(leaf).keys;
        let index = keys.partition_point(|k| k < key);
        if keys.get(index) == Some(key) {
            trace!(%leaf, index, "search hit");
            Ok(Position { leaf, index })
        } else {
            trace!(%leaf, "search miss");
            Err(Error::KeyNotFound)
        }
    }

    /// Whether `key` is stored.
    pub fn contains(&self, key: &K) -> bool {
        self.search(key).is_ok()
    }

    // ========================================================================
    // Public API: Insert
    // ========================================================================

    /// Insert `key`, after any equal keys already stored.
    ///
    /// # Errors
    /// - `Error::DuplicateKey` if the key is present and the tree was built
    ///   with [`DuplicatePolicy::Reject`]
    pub fn insert(&mut self, key: K) -> Result<()> {
        let reject = self.config.duplicates == DuplicatePolicy::Reject;
        let max_leaf_keys = self.config.max_leaf_keys;

        let leaf = self.find_leaf(&key);
        let node = self.node_mut(leaf);
        let index = node.keys.partition_point(|k| k <= &key);
        if reject && index > 0 && node.keys[index - 1] == key {
            debug!(%leaf, "insert rejected: duplicate key");
            return Err(Error::DuplicateKey);
        }
        node.keys.insert(index, key);
        let overflow = node.keys.len() > max_leaf_keys;
        self.len += 1;

        if overflow {
            self.split_leaf(leaf);
        }
        debug!(%leaf, len = self.len, "inserted key");
        Ok(())
    }

    // ========================================================================
    // Public API: Delete
    // ========================================================================

    /// Remove one occurrence of `key`.
    ///
    /// An absent key leaves the tree untouched.
    ///
    /// # Errors
    /// - `Error::KeyNotFound` if the key is absent
    pub fn delete(&mut self, key: &K) -> Result<()> {
        let leaf = self.find_leaf(key);
        let node = self.node_mut(leaf);
        let index = node.keys.partition_point(|k| k < key);
        if node.keys.get(index) != Some(key) {
            debug!(%leaf, "delete: key not found");
            return Err(Error::KeyNotFound);
        }
        node.keys.remove(index);
        self.len -= 1;

        let survivor = self.rebalance_leaf(leaf);
        self.refresh_ancestors(survivor);
        debug!(leaf = %survivor, len = self.len, "deleted key");
        Ok(())
    }

    // ========================================================================
    // Internal: Node access and descent
    // ========================================================================

    #[inline]
    pub(crate) fn node(&self, id: NodeId) -> &Node<K> {
        self.nodes.get(id)
    }

    #[inline]
    fn node_mut(&mut self, id: NodeId) -> &mut Node<K> {
        self.nodes.get_mut(id)
    }

    /// Number of live nodes in the arena.
    pub(crate) fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[cfg(test)]
    pub(crate) fn nodes_mut_for_test(&mut self) -> &mut Arena<Node<K>> {
        &mut self.nodes
    }

    /// Descend from the root to the leaf that owns `key`.
    ///
    /// At each internal node take the first child whose separator is greater
    /// than `key`, or the last child if none is.
    pub(crate) fn find_leaf(&self, key: &K) -> NodeId {
        let mut id = self.root;
        loop {
            let node = self.node(id);
            match &node.kind {
                NodeKind::Leaf { .. } => return id,
                NodeKind::Internal { children } => {
                    id = children[node.keys.partition_point(|k| k <= key)];
                }
            }
        }
    }

    /// Descend to the leftmost leaf that may hold a key `>= key`.
    ///
    /// Differs from [`find_leaf`](Self::find_leaf) on separators equal to
    /// `key`: duplicates of a separator can sit at the end of its left
    /// neighbour, so scans must start there.
    pub(crate) fn find_leaf_lower_bound(&self, key: &K) -> NodeId {
        let mut id = self.root;
        loop {
            let node = self.node(id);
            match &node.kind {
                NodeKind::Leaf { .. } => return id,
                NodeKind::Internal { children } => {
                    id = children[node.keys.partition_point(|k| k < key)];
                }
            }
        }
    }

    pub(crate) fn leftmost_leaf(&self) -> NodeId {
        let mut id = self.root;
        while let NodeKind::Internal { children } = &self.node(id).kind {
            id = children[0];
        }
        id
    }

    /// Slot of `child` in `parent`'s children.
    fn child_position(&self, parent: NodeId, child: NodeId) -> usize {
        self.node(parent)
            .children()
            .iter()
            .position(|&c| c == child)
            .unwrap_or_else(|| panic!("{child} is not a child of {parent}"))
    }

    /// Left and right neighbours of `id` under the same parent.
    fn siblings(&self, parent: NodeId, id: NodeId) -> (Option<NodeId>, Option<NodeId>) {
        let index = self.child_position(parent, id);
        let children = self.node(parent).children();
        let left = index.checked_sub(1).map(|i| children[i]);
        let right = children.get(index + 1).copied();
        (left, right)
    }

    /// Smallest key under `id`, found along the leftmost path.
    ///
    /// # Panics
    /// Panics if that path ends in an empty leaf, which only the root may be.
    fn separator_for(&self, id: NodeId) -> K {
        let mut current = id;
        while let NodeKind::Internal { children } = &self.node(current).kind {
            current = children[0];
        }
        self.node(current)
            .keys
            .first()
            .cloned()
            .unwrap_or_else(|| panic!("non-root leaf {current} is empty"))
    }

    fn reparent_children(&mut self, id: NodeId) {
        for i in 0..self.node(id).children().len() {
            let child = self.node(id).children()[i];
            self.node_mut(child).parent = Some(id);
        }
    }

    // ========================================================================
    // Internal: Splits
    // ========================================================================

    /// Split an overfull leaf; the right half becomes a new leaf linked after it.
    fn split_leaf(&mut self, leaf: NodeId) {
        let mid = self.config.leaf_split_point();
        let node = self.node_mut(leaf);
        let right_keys = node.keys.split_off(mid);
        let next = node.next();
        let separator = right_keys[0].clone();
        let right_len = right_keys.len();

        let sibling = self.nodes.alloc(Node::leaf(right_keys, next));
        self.node_mut(leaf).set_next(Some(sibling));
        self.counters.leaf_splits += 1;
        trace!(%leaf, %sibling, left = mid, right = right_len, "split leaf");

        self.promote(leaf, separator, sibling);
    }

    /// Split an internal node with `M + 1` children.
    ///
    /// The middle separator moves up and is kept by neither half.
    fn split_internal(&mut self, id: NodeId) {
        let node = self.node_mut(id);
        let mid = node.keys.len() / 2;
        let mut right_keys = node.keys.split_off(mid);
        let separator = right_keys.remove(0);
        let right_children = node.children_mut().split_off(mid + 1);

        let sibling = self.nodes.alloc(Node::internal(right_keys, right_children));
        self.reparent_children(sibling);
        self.counters.internal_splits += 1;
        trace!(node = %id, %sibling, "split internal node");

        self.promote(id, separator, sibling);
    }

    /// Hang `right` next to `left` in their parent under `separator`.
    fn promote(&mut self, left: NodeId, separator: K, right: NodeId) {
        let Some(parent) = self.node(left).parent else {
            self.grow_root(left, separator, right);
            return;
        };

        let index = self.child_position(parent, left);
        let max_children = self.config.max_children;
        let node = self.node_mut(parent);
        node.keys.insert(index, separator);
        node.children_mut().insert(index + 1, right);
        let overflow = node.children().len() > max_children;
        self.node_mut(right).parent = Some(parent);

        if overflow {
            self.split_internal(parent);
        }
    }

    fn grow_root(&mut self, left: NodeId, separator: K, right: NodeId) {
        let root = self.nodes.alloc(Node::internal(vec![separator], vec![left, right]));
        self.node_mut(left).parent = Some(root);
        self.node_mut(right).parent = Some(root);
        self.root = root;
        debug!(%root, height = self.height(), "tree grew a level");
    }

    // ========================================================================
    // Internal: Underflow handling
    // ========================================================================

    /// Fix an underfull leaf by borrowing or merging.
    ///
    /// Returns the leaf that now holds the deleted key's neighbourhood.
    fn rebalance_leaf(&mut self, leaf: NodeId) -> NodeId {
        let min = self.config.min_leaf_keys();
        let node = self.node(leaf);
        let Some(parent) = node.parent else {
            return leaf;
        };
        if node.keys.len() >= min {
            return leaf;
        }

        let (left, right) = self.siblings(parent, leaf);

        if let Some(left) = left.filter(|&l| self.node(l).keys.len() > min) {
            let donor = self.node_mut(left);
            let key = donor.keys.remove(donor.keys.len() - 1);
            self.node_mut(leaf).keys.insert(0, key);
            self.counters.borrows += 1;
            trace!(%leaf, donor = %left, "borrowed key from left leaf");
            return leaf;
        }

        if let Some(right) = right.filter(|&r| self.node(r).keys.len() > min) {
            let key = self.node_mut(right).keys.remove(0);
            self.node_mut(leaf).keys.push(key);
            self.counters.borrows += 1;
            trace!(%leaf, donor = %right, "borrowed key from right leaf");
            return leaf;
        }

        let survivor = match (left, right) {
            (Some(left), _) => {
                self.merge_leaves(parent, left, leaf);
                left
            }
            (None, Some(right)) => {
                self.merge_leaves(parent, leaf, right);
                leaf
            }
            (None, None) => panic!("{leaf} has a parent but no siblings"),
        };
        self.rebalance_internal(parent);
        survivor
    }

    /// Append `right`'s keys to `left` and unlink `right`.
    fn merge_leaves(&mut self, parent: NodeId, left: NodeId, right: NodeId) {
        self.detach_child(parent, right);
        let absorbed = self.nodes.take(right);
        let node = self.node_mut(left);
        node.set_next(absorbed.next());
        node.keys.extend(absorbed.keys);
        self.counters.merges += 1;
        trace!(%left, %right, "merged leaves");
    }

    /// Fix an internal node that just lost a child.
    ///
    /// Cascades upward through merges; collapses a single-child root.
    fn rebalance_internal(&mut self, id: NodeId) {
        let min = self.config.min_children();
        let node = self.node(id);
        let Some(parent) = node.parent else {
            self.collapse_root();
            return;
        };
        if node.children().len() >= min {
            return;
        }

        let (left, right) = self.siblings(parent, id);

        if let Some(left) = left.filter(|&l| self.node(l).children().len() > min) {
            self.borrow_child_from_left(id, left);
            return;
        }

        if let Some(right) = right.filter(|&r| self.node(r).children().len() > min) {
            self.borrow_child_from_right(id, right);
            return;
        }

        match (left, right) {
            (Some(left), _) => self.merge_internals(parent, left, id),
            (None, Some(right)) => self.merge_internals(parent, id, right),
            (None, None) => panic!("{id} has a parent but no siblings"),
        }
        self.rebalance_internal(parent);
    }

    fn borrow_child_from_left(&mut self, id: NodeId, left: NodeId) {
        let donor = self.node_mut(left);
        let last = donor.children().len() - 1;
        let child = donor.children_mut().remove(last);
        donor.keys.remove(last - 1);

        let separator = self.separator_for(self.node(id).children()[0]);
        let node = self.node_mut(id);
        node.children_mut().insert(0, child);
        node.keys.insert(0, separator);
        self.node_mut(child).parent = Some(id);

        self.counters.borrows += 1;
        trace!(node = %id, donor = %left, %child, "borrowed child from left");
    }

    fn borrow_child_from_right(&mut self, id: NodeId, right: NodeId) {
        let donor = self.node_mut(right);
        let child = donor.children_mut().remove(0);
        donor.keys.remove(0);

        let separator = self.separator_for(child);
        let node = self.node_mut(id);
        node.keys.push(separator);
        node.children_mut().push(child);
        self.node_mut(child).parent = Some(id);

        self.counters.borrows += 1;
        trace!(node = %id, donor = %right, %child, "borrowed child from right");
    }

    /// Append `right`'s separators and children to `left` and unlink `right`.
    fn merge_internals(&mut self, parent: NodeId, left: NodeId, right: NodeId) {
        let separator = self.separator_for(right);
        self.detach_child(parent, right);
        let absorbed = self.nodes.take(right);
        let NodeKind::Internal { children } = absorbed.kind else {
            panic!("{right} is a leaf among internal siblings");
        };

        let node = self.node_mut(left);
        node.keys.push(separator);
        node.keys.extend(absorbed.keys);
        node.children_mut().extend(children.iter().copied());
        for child in children {
            self.node_mut(child).parent = Some(left);
        }

        self.counters.merges += 1;
        trace!(%left, %right, "merged internal nodes");
    }

    /// Remove `child` and the separator in front of it from `parent`.
    fn detach_child(&mut self, parent: NodeId, child: NodeId) {
        let index = self.child_position(parent, child);
        debug_assert!(index > 0, "only the right node of a pair is detached");
        let node = self.node_mut(parent);
        node.children_mut().remove(index);
        node.keys.remove(index - 1);
    }

    /// Replace an internal root that has a single child by that child.
    fn collapse_root(&mut self) {
        let root = self.node(self.root);
        if root.is_leaf() || !root.keys.is_empty() {
            return;
        }
        let child = root.children()[0];
        self.nodes.take(self.root);
        self.node_mut(child).parent = None;
        self.root = child;
        self.counters.root_collapses += 1;
        debug!(root = %child, height = self.height(), "root collapsed, tree shrank a level");
    }

    /// Recompute every separator on the path from `leaf` to the root.
    fn refresh_ancestors(&mut self, leaf: NodeId) {
        let mut current = self.node(leaf).parent;
        while let Some(id) = current {
            for i in 1..self.node(id).children().len() {
                let child = self.node(id).children()[i];
                let separator = self.separator_for(child);
                self.node_mut(id).keys[i - 1] = separator;
            }
            current = self.node(id).parent;
        }
    }
}

impl<K: Ord + Clone> Default for BPlusTree<K> {
    fn default() -> Self {
        Self::from_valid_config(TreeConfig::default())
    }
}

impl<K: Ord + Clone> FromIterator<K> for BPlusTree<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut tree = Self::default();
        tree.extend(iter);
        tree
    }
}

impl<K: Ord + Clone> Extend<K> for BPlusTree<K> {
    /// Insert every key; under `DuplicatePolicy::Reject` repeats are skipped.
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        for key in iter {
            if let Err(err) = self.insert(key) {
                debug_assert_eq!(err, Error::DuplicateKey);
            }
        }
    }
}
