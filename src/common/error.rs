//! Error types for dblite.

use thiserror::Error;

/// Convenient Result type alias.
///
/// Instead of writing `Result<T, Error>` everywhere, we can write `Result<T>`.
/// This is a common Rust pattern (see `std::io::Result`).
pub type Result<T> = std::result::Result<T, Error>;

/// All possible errors in dblite.
///
/// Every fallible index operation returns this enum. Shape problems found by
/// [`BPlusTree::validate`](crate::index::btree::BPlusTree::validate) are
/// reported as [`Error::CorruptedTree`]; shape problems hit in the middle of
/// an insert or delete are defects and panic instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// The requested tree order cannot rebalance.
    ///
    /// Internal nodes need at least 3 children and leaves at least 1 key.
    #[error("invalid tree order: max_children={max_children} (min 3), max_leaf_keys={max_leaf_keys} (min 1)")]
    InvalidOrder {
        max_children: usize,
        max_leaf_keys: usize,
    },

    /// The key is not stored in the tree.
    #[error("key not found")]
    KeyNotFound,

    /// The key is already stored and the tree rejects duplicates.
    #[error("duplicate key")]
    DuplicateKey,

    /// A structural invariant does not hold.
    #[error("corrupted tree: {0}")]
    CorruptedTree(String),
}
