//! Index structures.
//!
//! - [`btree`] - In-memory B+ tree over a single ordered key type

pub mod btree;
