//! Common types and utilities shared across dblite.
//!
//! This module contains fundamental primitives used throughout the codebase:
//! - Configuration constants and [`config::TreeConfig`]
//! - Error types
//! - Identifiers (NodeId)

pub mod config;
pub mod error;
mod node_id;

pub use error::{Error, Result};
pub use node_id::NodeId;
