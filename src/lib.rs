//! dblite - the ordered index engine of the db-lite SQL shell.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                            dblite                               │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │        Shared handle (index/btree/shared.rs)             │   │
//! │  │        Arc<RwLock<BPlusTree>>: one writer | N readers    │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │            Index Layer (index/btree/)                    │   │
//! │  │   BPlusTree: insert / delete / search / range / stats    │   │
//! │  │   ┌─────────────────────────────────────────────────┐   │   │
//! │  │   │  Node arena: internal ─owns─▶ children           │   │   │
//! │  │   │              leaf ─next─▶ leaf ─next─▶ leaf      │   │   │
//! │  │   └─────────────────────────────────────────────────┘   │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │           Common (common/)                               │   │
//! │  │     TreeConfig + Error + NodeId                          │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//! - [`common`] - Shared primitives (NodeId, Error, config)
//! - [`index`] - Index structures (B+ tree)
//!
//! # Logging
//! Operations emit `tracing` events: `debug` per insert / delete / root
//! change, `trace` per split, borrow and merge. Install any subscriber to
//! see them; the crate never installs one itself.
//!
//! # Quick Start
//! ```
//! use dblite::BPlusTree;
//!
//! // Internal nodes hold up to 4 children, leaves up to 4 keys
//! let mut tree = BPlusTree::new(4, 4)?;
//! for k in [20, 18, 22, 28, 25, 41, 23] {
//!     tree.insert(k)?;
//! }
//!
//! assert!(tree.contains(&41));
//! let evens: Vec<_> = tree.range(20..=28).filter(|k| *k % 2 == 0).copied().collect();
//! assert_eq!(evens, vec![20, 22, 28]);
//! # Ok::<(), dblite::Error>(())
//! ```

pub mod common;
pub mod index;

// Re-export commonly used items at crate root for convenience
pub use common::config::{DuplicatePolicy, TreeConfig};
pub use common::{Error, NodeId, Result};

pub use index::btree::{BPlusTree, Position, SharedBPlusTree, TreeStats};
