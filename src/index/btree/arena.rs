//! Slot arena backing the tree's nodes.

use crate::common::NodeId;

/// Fixed-address storage for nodes.
///
/// Slots never move, so a [`NodeId`] stays valid until its node is freed.
/// Freed slots go on a LIFO free list and are handed out again first.
#[derive(Debug, Clone)]
pub(crate) struct Arena<T> {
    slots: Vec<Option<T>>,
    free: Vec<NodeId>,
}

impl<T> Arena<T> {
    pub(crate) fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Number of live elements.
    pub(crate) fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub(crate) fn alloc(&mut self, element: T) -> NodeId {
        if let Some(id) = self.free.pop() {
            self.slots[id.index()] = Some(element);
            id
        } else {
            assert!(
                self.slots.len() < NodeId::MAX_INDEX,
                "node arena is at maximum capacity ({})",
                NodeId::MAX_INDEX
            );
            self.slots.push(Some(element));
            NodeId::from_index(self.slots.len() - 1)
        }
    }

    /// Free a slot and return what it held.
    pub(crate) fn take(&mut self, id: NodeId) -> T {
        let element = self.slots[id.index()]
            .take()
            .unwrap_or_else(|| panic!("{id} freed twice"));
        self.free.push(id);
        element
    }

    #[inline]
    pub(crate) fn get(&self, id: NodeId) -> &T {
        self.slots[id.index()]
            .as_ref()
            .unwrap_or_else(|| panic!("{id} is not allocated"))
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, id: NodeId) -> &mut T {
        self.slots[id.index()]
            .as_mut()
            .unwrap_or_else(|| panic!("{id} is not allocated"))
    }

    /// Look up a slot without panicking on a freed or foreign id.
    #[inline]
    pub(crate) fn try_get(&self, id: NodeId) -> Option<&T> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alloc_and_get() {
        let mut arena = Arena::new();
        let a = arena.alloc("a");
        let b = arena.alloc("b");

        assert_eq!(*arena.get(a), "a");
        assert_eq!(*arena.get(b), "b");
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn test_freed_slot_is_reused_lifo() {
        let mut arena = Arena::new();
        let a = arena.alloc(1);
        let b = arena.alloc(2);
        let _c = arena.alloc(3);

        assert_eq!(arena.take(a), 1);
        assert_eq!(arena.take(b), 2);
        assert_eq!(arena.len(), 1);

        // Most recently freed slot comes back first
        assert_eq!(arena.alloc(4), b);
        assert_eq!(arena.alloc(5), a);
        assert_eq!(arena.len(), 3);
    }

    #[test]
    fn test_try_get_on_freed_slot() {
        let mut arena = Arena::new();
        let a = arena.alloc(1);
        arena.take(a);

        assert!(arena.try_get(a).is_none());
        assert!(arena.try_get(NodeId::new(99)).is_none());
    }

    #[test]
    #[should_panic(expected = "is not allocated")]
    fn test_get_freed_slot_panics() {
        let mut arena = Arena::new();
        let a = arena.alloc(1);
        arena.take(a);
        arena.get(a);
    }

    #[test]
    fn test_get_mut() {
        let mut arena = Arena::new();
        let a = arena.alloc(vec![1]);
        arena.get_mut(a).push(2);
        assert_eq!(arena.get(a), &vec![1, 2]);
    }
}
