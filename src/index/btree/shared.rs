//! Shared, lock-protected handle to a tree.

use std::ops::RangeBounds;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::common::config::TreeConfig;
use crate::common::Result;
use crate::index::btree::{BPlusTree, TreeStats};

/// A cloneable handle that serialises access to one [`BPlusTree`].
///
/// The tree itself is single-threaded: a rebalance must run to completion
/// before anyone looks at the nodes. This wrapper puts the whole tree behind
/// one `RwLock`, so there is at most one writer or any number of readers.
///
/// # Thread Safety
/// - `insert` / `delete` / `write`: exclusive lock for the whole operation
/// - `contains` / `len` / `collect_range` / `stats` / `read`: shared lock
///
/// # Example
/// ```
/// use dblite::SharedBPlusTree;
/// use std::thread;
///
/// let index = SharedBPlusTree::new(4, 4)?;
/// let writer = index.clone();
/// thread::spawn(move || writer.insert(42).unwrap()).join().unwrap();
/// assert!(index.contains(&42));
/// # Ok::<(), dblite::Error>(())
/// ```
pub struct SharedBPlusTree<K> {
    inner: Arc<RwLock<BPlusTree<K>>>,
}

impl<K: Ord + Clone> SharedBPlusTree<K> {
    /// Create a shared tree with the given orders.
    ///
    /// # Errors
    /// - `Error::InvalidOrder` if `M < 3` or `L < 1`
    pub fn new(max_children: usize, max_leaf_keys: usize) -> Result<Self> {
        Ok(Self::from_tree(BPlusTree::new(max_children, max_leaf_keys)?))
    }

    /// Create a shared tree from a full configuration.
    ///
    /// # Errors
    /// - `Error::InvalidOrder` if the orders cannot rebalance
    pub fn with_config(config: TreeConfig) -> Result<Self> {
        Ok(Self::from_tree(BPlusTree::with_config(config)?))
    }

    /// Wrap an existing tree.
    pub fn from_tree(tree: BPlusTree<K>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(tree)),
        }
    }

    // ========================================================================
    // Writers
    // ========================================================================

    /// Insert under the write lock. See [`BPlusTree::insert`].
    pub fn insert(&self, key: K) -> Result<()> {
        self.inner.write().insert(key)
    }

    /// Delete under the write lock. See [`BPlusTree::delete`].
    pub fn delete(&self, key: &K) -> Result<()> {
        self.inner.write().delete(key)
    }

    /// Run `f` with exclusive access, e.g. to apply a batch atomically.
    pub fn write<R>(&self, f: impl FnOnce(&mut BPlusTree<K>) -> R) -> R {
        f(&mut self.inner.write())
    }

    // ========================================================================
    // Readers
    // ========================================================================

    pub fn contains(&self, key: &K) -> bool {
        self.inner.read().contains(key)
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Copy out the keys within `range`.
    ///
    /// Keys are cloned because the lock is released on return.
    pub fn collect_range<R: RangeBounds<K>>(&self, range: R) -> Vec<K> {
        self.inner.read().range(range).cloned().collect()
    }

    pub fn stats(&self) -> TreeStats {
        self.inner.read().stats()
    }

    /// Run `f` with shared access.
    pub fn read<R>(&self, f: impl FnOnce(&BPlusTree<K>) -> R) -> R {
        f(&self.inner.read())
    }
}

impl<K> Clone for SharedBPlusTree<K> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K: Ord + Clone> Default for SharedBPlusTree<K> {
    fn default() -> Self {
        Self::from_tree(BPlusTree::default())
    }
}
