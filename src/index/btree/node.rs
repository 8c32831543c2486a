//! Tree nodes.
//!
//! A [`Node`] is either a leaf holding keys and a forward link to the next
//! leaf, or an internal node routing to its children by separator keys.

use crate::common::NodeId;

/// Variant-specific part of a node.
#[derive(Debug, Clone)]
pub(crate) enum NodeKind {
    /// Data node. `next` is the following leaf in key order, if any.
    Leaf { next: Option<NodeId> },

    /// Routing node. Owns `children`, and `children.len() == keys.len() + 1`.
    Internal { children: Vec<NodeId> },
}

/// A tree node stored in the arena.
#[derive(Debug, Clone)]
pub(crate) struct Node<K> {
    /// Keys for a leaf, separators for an internal node. Non-decreasing.
    pub(crate) keys: Vec<K>,

    /// Back-reference used for rebalancing only. `None` at the root.
    pub(crate) parent: Option<NodeId>,

    pub(crate) kind: NodeKind,
}

impl<K> Node<K> {
    /// A leaf with no keys.
    pub(crate) fn empty_leaf() -> Self {
        Self::leaf(Vec::new(), None)
    }

    pub(crate) fn leaf(keys: Vec<K>, next: Option<NodeId>) -> Self {
        Self {
            keys,
            parent: None,
            kind: NodeKind::Leaf { next },
        }
    }

    pub(crate) fn internal(keys: Vec<K>, children: Vec<NodeId>) -> Self {
        debug_assert_eq!(children.len(), keys.len() + 1);
        Self {
            keys,
            parent: None,
            kind: NodeKind::Internal { children },
        }
    }

    #[inline]
    pub(crate) fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf { .. })
    }

    /// Children of an internal node.
    ///
    /// # Panics
    /// Panics on a leaf: callers only ask internal nodes for children.
    #[inline]
    pub(crate) fn children(&self) -> &[NodeId] {
        match &self.kind {
            NodeKind::Internal { children } => children,
            NodeKind::Leaf { .. } => panic!("leaf has no children"),
        }
    }

    #[inline]
    pub(crate) fn children_mut(&mut self) -> &mut Vec<NodeId> {
        match &mut self.kind {
            NodeKind::Internal { children } => children,
            NodeKind::Leaf { .. } => panic!("leaf has no children"),
        }
    }

    /// Forward link of a leaf; `None` for internal nodes and the last leaf.
    #[inline]
    pub(crate) fn next(&self) -> Option<NodeId> {
        match self.kind {
            NodeKind::Leaf { next } => next,
            NodeKind::Internal { .. } => None,
        }
    }

    #[inline]
    pub(crate) fn set_next(&mut self, link: Option<NodeId>) {
        match &mut self.kind {
            NodeKind::Leaf { next } => *next = link,
            NodeKind::Internal { .. } => panic!("internal node has no leaf link"),
        }
    }
}
