//! Structural invariant checks.

use crate::common::{Error, NodeId, Result};
use crate::index::btree::node::NodeKind;
use crate::index::btree::BPlusTree;

/// What a subtree walk reports upward.
struct SubtreeSummary<'a, K> {
    leaf_depth: usize,
    min: Option<&'a K>,
    key_count: usize,
}

fn corrupted(msg: String) -> Error {
    Error::CorruptedTree(msg)
}

impl<K: Ord + Clone> BPlusTree<K> {
    /// Check every structural invariant.
    ///
    /// Walks the whole tree, so it is meant for tests and debugging.
    ///
    /// # Errors
    /// - `Error::CorruptedTree` describing the first violation found
    pub fn validate(&self) -> Result<()> {
        let root = self.node(self.root());
        if root.parent.is_some() {
            return Err(corrupted(format!("root {} has a parent", self.root())));
        }
        if let NodeKind::Internal { children } = &root.kind {
            if children.len() < 2 {
                return Err(corrupted(format!(
                    "internal root {} has {} child(ren)",
                    self.root(),
                    children.len()
                )));
            }
        }

        let summary = self.check_subtree(self.root(), 0)?;
        if summary.key_count != self.len() {
            return Err(corrupted(format!(
                "subtrees hold {} keys, len is {}",
                summary.key_count,
                self.len()
            )));
        }
        if summary.leaf_depth + 1 != self.height() {
            return Err(corrupted("height disagrees with leaf depth".into()));
        }

        self.check_leaf_chain()?;

        let reachable = self.level_order().count();
        if reachable != self.node_count() {
            return Err(corrupted(format!(
                "{} nodes reachable, {} allocated",
                reachable,
                self.node_count()
            )));
        }
        Ok(())
    }

    fn check_subtree(&self, id: NodeId, depth: usize) -> Result<SubtreeSummary<'_, K>> {
        let node = self.node(id);
        let config = self.config();
        let is_root = id == self.root();

        if node.keys.windows(2).any(|w| w[0] > w[1]) {
            return Err(corrupted(format!("{id} keys are not sorted")));
        }

        match &node.kind {
            NodeKind::Leaf { .. } => {
                if node.keys.len() > config.max_leaf_keys {
                    return Err(corrupted(format!("leaf {id} overflows")));
                }
                if !is_root && node.keys.len() < config.min_leaf_keys() {
                    return Err(corrupted(format!("leaf {id} underflows")));
                }
                Ok(SubtreeSummary {
                    leaf_depth: depth,
                    min: node.keys.first(),
                    key_count: node.keys.len(),
                })
            }
            NodeKind::Internal { children } => {
                if children.len() != node.keys.len() + 1 {
                    return Err(corrupted(format!(
                        "{id} has {} keys and {} children",
                        node.keys.len(),
                        children.len()
                    )));
                }
                if children.len() > config.max_children {
                    return Err(corrupted(format!("internal {id} overflows")));
                }
                if !is_root && children.len() < config.min_children() {
                    return Err(corrupted(format!("internal {id} underflows")));
                }

                let mut leaf_depth = None;
                let mut min = None;
                let mut key_count = 0;
                for (i, &child) in children.iter().enumerate() {
                    if self.node(child).parent != Some(id) {
                        return Err(corrupted(format!("{child} does not point back to {id}")));
                    }
                    let summary = self.check_subtree(child, depth + 1)?;
                    if *leaf_depth.get_or_insert(summary.leaf_depth) != summary.leaf_depth {
                        return Err(corrupted(format!("leaves under {id} at unequal depth")));
                    }
                    if i == 0 {
                        min = summary.min;
                    } else if summary.min != Some(&node.keys[i - 1]) {
                        return Err(corrupted(format!(
                            "{id} separator {} is not the minimum of {child}",
                            i - 1
                        )));
                    }
                    key_count += summary.key_count;
                }
                Ok(SubtreeSummary {
                    leaf_depth: leaf_depth.unwrap_or(depth),
                    min,
                    key_count,
                })
            }
        }
    }

    /// The `next` chain must visit every leaf left to right in sorted order.
    fn check_leaf_chain(&self) -> Result<()> {
        let leaves: Vec<NodeId> = self
            .level_order()
            .filter(|view| view.is_leaf)
            .map(|view| view.id)
            .collect();

        let mut chained = Vec::with_capacity(leaves.len());
        let mut cursor = Some(self.leftmost_leaf());
        while let Some(id) = cursor {
            if chained.len() > leaves.len() {
                return Err(corrupted("leaf chain does not terminate".into()));
            }
            chained.push(id);
            cursor = self.node(id).next();
        }
        if chained != leaves {
            return Err(corrupted("leaf chain skips or reorders leaves".into()));
        }

        let mut prev: Option<&K> = None;
        for key in self.iter() {
            if prev.is_some_and(|p| p > key) {
                return Err(corrupted("leaf chain is not sorted".into()));
            }
            prev = Some(key);
        }
        Ok(())
    }
}
