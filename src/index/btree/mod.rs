//! B+ tree index implementation.
//!
//! # Components
//! - [`BPlusTree`] - The ordered index: insert, delete, search
//! - [`Iter`] / [`Range`] / [`LevelOrder`] - Read-only traversals
//! - [`TreeStats`] - Shape and structural counters
//! - [`SharedBPlusTree`] - Lock-protected handle for multi-threaded callers

mod arena;
mod iter;
mod node;
mod shared;
mod stats;
mod tree;
mod validate;

pub use iter::{Iter, LevelOrder, NodeView, Range};
pub use shared::SharedBPlusTree;
pub use stats::TreeStats;
pub use tree::{BPlusTree, Position};
