//! Node identifier type.

use std::fmt;

/// Identifies a node slot in a tree's node arena.
///
/// Using `u32` keeps ids small and `Copy`; `parent` and `next` links are
/// stored as ids, so they never own or keep alive the node they name.
///
/// Ids are only meaningful for the tree that handed them out, and a slot is
/// reused once a merge frees it.
///
/// # Example
/// ```
/// use dblite::NodeId;
///
/// let node_id = NodeId::new(7);
/// assert_eq!(node_id.index(), 7);
/// assert_eq!(node_id.to_string(), "Node(7)");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Largest slot index an arena may hand out.
    pub const MAX_INDEX: usize = u32::MAX as usize;

    /// Create a new NodeId.
    #[inline]
    pub fn new(id: u32) -> Self {
        NodeId(id)
    }

    /// Build an id from an arena slot index.
    ///
    /// # Panics
    /// Panics if `index` does not fit in a `u32`.
    #[inline]
    pub(crate) fn from_index(index: usize) -> Self {
        let id = u32::try_from(index).unwrap_or_else(|_| panic!("node index {index} overflows NodeId"));
        NodeId(id)
    }

    /// The arena slot this id addresses.
    #[inline]
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({})", self.0)
    }
}
