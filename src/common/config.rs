//! Configuration for the B+ tree index.

use crate::common::{Error, Result};

/// Default maximum number of children of an internal node (`M`).
pub const DEFAULT_MAX_CHILDREN: usize = 4;

/// Default maximum number of keys in a leaf (`L`).
pub const DEFAULT_MAX_LEAF_KEYS: usize = 4;

/// Smallest `M` that can still split and merge.
///
/// With `M = 2` an internal split would leave one side with a single child.
pub const MIN_MAX_CHILDREN: usize = 3;

/// Smallest `L` that can still hold a key.
pub const MIN_MAX_LEAF_KEYS: usize = 1;

/// What `insert` does with a key that is already present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// Store every occurrence, after the equal keys already present.
    #[default]
    Allow,
    /// Refuse the insert with [`Error::DuplicateKey`].
    Reject,
}

/// Order parameters and policies of a [`BPlusTree`](crate::index::btree::BPlusTree).
///
/// # Occupancy
/// | node      | max                  | min (non-root)      |
/// |-----------|----------------------|---------------------|
/// | internal  | `M` children         | `ceil(M/2)` children|
/// | leaf      | `L` keys             | `ceil(L/2)` keys    |
///
/// # Example
/// ```
/// use dblite::common::config::{DuplicatePolicy, TreeConfig};
///
/// let config = TreeConfig::new(5, 8).with_duplicates(DuplicatePolicy::Reject);
/// assert!(config.validate().is_ok());
/// assert_eq!(config.min_children(), 3);
/// assert_eq!(config.min_leaf_keys(), 4);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeConfig {
    /// Maximum children per internal node (`M`).
    pub max_children: usize,

    /// Maximum keys per leaf (`L`).
    pub max_leaf_keys: usize,

    /// Duplicate-key handling on insert.
    pub duplicates: DuplicatePolicy,
}

impl TreeConfig {
    /// Create a config with the given orders and duplicates allowed.
    pub fn new(max_children: usize, max_leaf_keys: usize) -> Self {
        Self {
            max_children,
            max_leaf_keys,
            duplicates: DuplicatePolicy::Allow,
        }
    }

    /// Set the duplicate-key policy.
    pub fn with_duplicates(mut self, duplicates: DuplicatePolicy) -> Self {
        self.duplicates = duplicates;
        self
    }

    /// Check that the orders can rebalance.
    ///
    /// # Errors
    /// - `Error::InvalidOrder` if `M < 3` or `L < 1`
    pub fn validate(&self) -> Result<()> {
        if self.max_children < MIN_MAX_CHILDREN || self.max_leaf_keys < MIN_MAX_LEAF_KEYS {
            return Err(Error::InvalidOrder {
                max_children: self.max_children,
                max_leaf_keys: self.max_leaf_keys,
            });
        }
        Ok(())
    }

    /// Minimum children of a non-root internal node: `ceil(M/2)`.
    #[inline]
    pub fn min_children(&self) -> usize {
        self.max_children.div_ceil(2)
    }

    /// Minimum keys of a non-root leaf: `ceil(L/2)`.
    #[inline]
    pub fn min_leaf_keys(&self) -> usize {
        self.max_leaf_keys.div_ceil(2)
    }

    /// Number of keys the left half keeps when an overfull leaf splits.
    #[inline]
    pub(crate) fn leaf_split_point(&self) -> usize {
        (self.max_leaf_keys + 1).div_ceil(2)
    }
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CHILDREN, DEFAULT_MAX_LEAF_KEYS)
    }
}
