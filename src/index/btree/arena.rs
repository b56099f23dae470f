//! Slot arena that owns every node of a tree.
//!
//! Nodes refer to each other only through [`NodeId`] handles, so the
//! parent/child, child/parent and leaf chain relations never form
//! ownership cycles. Freed slots go on a free list and are reused.

use crate::common::NodeId;

pub(crate) struct NodeArena<T> {
    slots: Vec<Option<T>>,
    free: Vec<NodeId>,
}

impl<T> NodeArena<T> {
    pub(crate) fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Number of live nodes.
    pub(crate) fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub(crate) fn alloc(&mut self, node: T) -> NodeId {
        if let Some(id) = self.free.pop() {
            self.slots[id.index()] = Some(node);
            id
        } else {
            self.slots.push(Some(node));
            NodeId::new(self.slots.len() - 1)
        }
    }

    #[inline]
    pub(crate) fn get(&self, id: NodeId) -> &T {
        match self.slots.get(id.index()) {
            Some(Some(node)) => node,
            _ => panic!("stale node handle {}", id),
        }
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, id: NodeId) -> &mut T {
        match self.slots.get_mut(id.index()) {
            Some(Some(node)) => node,
            _ => panic!("stale node handle {}", id),
        }
    }

    /// Whether `id` refers to a live node.
    pub(crate) fn contains(&self, id: NodeId) -> bool {
        matches!(self.slots.get(id.index()), Some(Some(_)))
    }

    /// Release a node, returning ownership of it to the caller.
    pub(crate) fn take(&mut self, id: NodeId) -> T {
        match self.slots.get_mut(id.index()).and_then(Option::take) {
            Some(node) => {
                self.free.push(id);
                node
            }
            None => panic!("stale node handle {}", id),
        }
    }

    pub(crate) fn free(&mut self, id: NodeId) {
        drop(self.take(id));
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_alloc_and_get() {
        let mut arena = NodeArena::new();
        let a = arena.alloc("a");
        let b = arena.alloc("b");

        assert_eq!(*arena.get(a), "a");
        assert_eq!(*arena.get(b), "b");
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn test_free_slot_is_reused() {
        let mut arena = NodeArena::new();
        let a = arena.alloc(1);
        let _b = arena.alloc(2);

        arena.free(a);
        assert!(!arena.contains(a));
        assert_eq!(arena.len(), 1);

        let c = arena.alloc(3);
        assert_eq!(c, a);
        assert_eq!(arena.len(), 2);
        assert_eq!(*arena.get(c), 3);
    }

    #[test]
    #[should_panic(expected = "stale node handle")]
    fn test_get_freed_panics() {
        let mut arena = NodeArena::new();
        let a = arena.alloc(1);
        arena.free(a);
        arena.get(a);
    }

    #[test]
    fn test_clear() {
        let mut arena = NodeArena::new();
        arena.alloc(1);
        arena.alloc(2);
        arena.clear();
        assert_eq!(arena.len(), 0);
        assert_eq!(arena.alloc(9), NodeId::new(0));
    }

    proptest! {
        #[test]
        fn arena_behaves_like_vec(ops in prop::collection::vec((any::<bool>(), any::<u32>()), 0..200)) {
            let mut model: Vec<(NodeId, u32)> = Vec::new();
            let mut arena = NodeArena::new();

            for (alloc, value) in ops {
                if alloc || model.is_empty() {
                    let id = arena.alloc(value);
                    model.push((id, value));
                } else {
                    let index = value as usize % model.len();
                    let (id, expected) = model.swap_remove(index);
                    prop_assert_eq!(arena.take(id), expected);
                }

                prop_assert_eq!(arena.len(), model.len());
                for &(id, value) in &model {
                    prop_assert_eq!(*arena.get(id), value);
                }
            }
        }
    }
}
