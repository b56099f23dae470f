//! Deletion: entry removal, underflow repair by borrowing from or merging
//! with an adjacent sibling, and root collapse.
//!
//! ```text
//!   borrow from left (leaf, order 4)
//!
//!          [ 20 ]                      [ 15 ]
//!         /      \         ──▶        /      \
//!    [5 10 15]   [ ]             [5 10]      [15]
//!
//!   merge into left (internal, order 3): separator 20 is pulled down
//!
//!        [ 20 | 40 ]                   [ 40 ]
//!       /     |     \      ──▶        /      \
//!     [10]   [ ]    [50]        [10 | 20]    [50]
//! ```

use tracing::debug;

use crate::common::{Error, NodeId, Result};
use crate::index::btree::node::{Entry, Node};
use crate::index::btree::stats::TreeStats;
use crate::index::btree::tree::BPlusTree;

impl<K: Ord + Clone, V> BPlusTree<K, V> {
    /// Remove the entry for `key`, returning its value.
    ///
    /// # Errors
    /// - `Error::KeyNotFound` if `key` is absent; the tree is left unchanged
    pub fn remove(&mut self, key: &K) -> Result<V> {
        let leaf_id = self.find_leaf(key);
        let pos = self
            .leaf(leaf_id)
            .search(key)
            .map_err(|_| Error::KeyNotFound)?;

        Ok(self.remove_at(leaf_id, pos).value)
    }

    /// Remove and return the smallest entry.
    pub fn pop_first(&mut self) -> Option<(K, V)> {
        let head = self.chain.head()?;
        if self.leaf(head).entries.is_empty() {
            return None;
        }
        Some(self.remove_at(head, 0).into_parts())
    }

    /// Remove and return the largest entry.
    pub fn pop_last(&mut self) -> Option<(K, V)> {
        let tail = self.chain.tail()?;
        let last = self.leaf(tail).len().checked_sub(1)?;
        Some(self.remove_at(tail, last).into_parts())
    }

    /// Take the entry at slot `pos` of `leaf_id` out of the tree and repair
    /// whatever the removal broke.
    fn remove_at(&mut self, leaf_id: NodeId, pos: usize) -> Entry<K, V> {
        let removed = self.leaf_mut(leaf_id).entries.remove(pos);
        self.len -= 1;

        if leaf_id != self.root {
            self.rebalance(leaf_id);
        }

        // Only a leaf's smallest key can also be a separator.
        if pos == 0 {
            self.replace_separator(&removed.key);
        }

        removed
    }

    /// Repair underflow starting at `node_id`, walking up while parents
    /// underflow in turn. The root is never repaired, only collapsed.
    fn rebalance(&mut self, mut node_id: NodeId) {
        loop {
            let Some(parent_id) = self.nodes.get(node_id).parent() else {
                return;
            };
            if !self.is_underflowing(node_id) {
                return;
            }

            let parent = self.internal(parent_id);
            let index = parent.position_of(node_id);
            let left = index.checked_sub(1).map(|i| parent.children[i]);
            let right = parent.children.get(index + 1).copied();

            if let Some(left) = left.filter(|&id| self.has_surplus(id)) {
                self.borrow_from_left(parent_id, index, left, node_id);
                return;
            }
            if let Some(right) = right.filter(|&id| self.has_surplus(id)) {
                self.borrow_from_right(parent_id, index, node_id, right);
                return;
            }

            match (left, right) {
                (Some(_), _) => self.merge_children(parent_id, index - 1),
                (None, Some(_)) => self.merge_children(parent_id, index),
                (None, None) => panic!("{} has no siblings under {}", node_id, parent_id),
            }

            if parent_id == self.root {
                if self.internal(parent_id).children.len() == 1 {
                    self.shrink_root();
                }
                return;
            }
            node_id = parent_id;
        }
    }

    fn is_underflowing(&self, id: NodeId) -> bool {
        match self.nodes.get(id) {
            Node::Leaf(leaf) => leaf.len() < self.config.min_leaf_entries(),
            Node::Internal(internal) => internal.children.len() < self.config.min_children(),
        }
    }

    /// Whether `id` can give one entry or child away and stay legal.
    fn has_surplus(&self, id: NodeId) -> bool {
        match self.nodes.get(id) {
            Node::Leaf(leaf) => leaf.len() > self.config.min_leaf_entries(),
            Node::Internal(internal) => internal.children.len() > self.config.min_children(),
        }
    }

    /// Move the left sibling's last entry (or last key and child) to the
    /// front of `node_id`, which sits at `index` under `parent_id`.
    fn borrow_from_left(
        &mut self,
        parent_id: NodeId,
        index: usize,
        left: NodeId,
        node_id: NodeId,
    ) {
        if self.nodes.get(node_id).is_leaf() {
            let sibling = self.leaf_mut(left);
            let last = sibling.len() - 1;
            let entry = sibling.entries.remove(last);
            let separator = entry.key.clone();
            self.leaf_mut(node_id).entries.insert(0, entry);
            self.internal_mut(parent_id).keys[index - 1] = separator;
        } else {
            let sibling = self.internal_mut(left);
            let last = sibling.keys.len() - 1;
            let key_up = sibling.keys.remove(last);
            let child = sibling.children.remove(last + 1);
            let parent = self.internal_mut(parent_id);
            let key_down = std::mem::replace(&mut parent.keys[index - 1], key_up);

            let node = self.internal_mut(node_id);
            node.keys.insert(0, key_down);
            node.children.insert(0, child);
            self.set_parent(child, Some(node_id));
        }

        TreeStats::bump(&self.stats.borrows);
        debug!(from = %left, to = %node_id, "borrowed from left sibling");
    }

    /// Move the right sibling's first entry (or first key and child) to the
    /// back of `node_id`, which sits at `index` under `parent_id`.
    fn borrow_from_right(
        &mut self,
        parent_id: NodeId,
        index: usize,
        node_id: NodeId,
        right: NodeId,
    ) {
        if self.nodes.get(node_id).is_leaf() {
            let sibling = self.leaf_mut(right);
            let entry = sibling.entries.remove(0);
            let separator = sibling.entries[0].key.clone();
            self.leaf_mut(node_id).entries.push(entry);
            self.internal_mut(parent_id).keys[index] = separator;
        } else {
            let sibling = self.internal_mut(right);
            let key_up = sibling.keys.remove(0);
            let child = sibling.children.remove(0);
            let parent = self.internal_mut(parent_id);
            let key_down = std::mem::replace(&mut parent.keys[index], key_up);

            let node = self.internal_mut(node_id);
            node.keys.push(key_down);
            node.children.push(child);
            self.set_parent(child, Some(node_id));
        }

        TreeStats::bump(&self.stats.borrows);
        debug!(from = %right, to = %node_id, "borrowed from right sibling");
    }

    /// Fold the child at `left_index + 1` into the child at `left_index`
    /// and drop the separator between them from the parent.
    fn merge_children(&mut self, parent_id: NodeId, left_index: usize) {
        let parent = self.internal_mut(parent_id);
        let separator = parent.keys.remove(left_index);
        let right_id = parent.children.remove(left_index + 1);
        let left_id = parent.children[left_index];

        match self.nodes.take(right_id) {
            Node::Leaf(right) => {
                self.leaf_mut(left_id).entries.extend(right.entries);
                self.chain.unlink(right_id);
            }
            Node::Internal(right) => {
                for &child in &right.children {
                    self.set_parent(child, Some(left_id));
                }
                let left = self.internal_mut(left_id);
                left.keys.push(separator);
                left.keys.extend(right.keys);
                left.children.extend(right.children);
            }
        }

        TreeStats::bump(&self.stats.merges);
        debug!(into = %left_id, freed = %right_id, "merged siblings");
    }

    /// Replace an internal root that has a single child by that child.
    fn shrink_root(&mut self) {
        let old_root = self.root;
        let child = self.internal(old_root).children[0];
        self.nodes.free(old_root);
        self.set_parent(child, None);
        self.root = child;
        self.height -= 1;

        TreeStats::bump(&self.stats.root_shrinks);
        debug!(root = %child, height = self.height, "collapsed root");
    }

    /// If `removed` survives as a separator, swap in the smallest key of the
    /// subtree to its right so separators keep naming real keys.
    fn replace_separator(&mut self, removed: &K) {
        let mut current = self.root;
        while let Node::Internal(internal) = self.nodes.get(current) {
            match internal.keys.binary_search(removed) {
                Ok(slot) => {
                    let leaf = self.leftmost_leaf(internal.children[slot + 1]);
                    let Some(successor) = self.leaf(leaf).first_key().cloned() else {
                        panic!("non-root {} is empty", leaf);
                    };
                    self.internal_mut(current).keys[slot] = successor;
                    return;
                }
                Err(index) => current = internal.children[index],
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{BPlusTree, Error};

    fn tree_with(order: usize, keys: impl IntoIterator<Item = i32>) -> BPlusTree<i32, i32> {
        let mut tree = BPlusTree::new(order).unwrap();
        for k in keys {
            tree.insert(k, k).unwrap();
        }
        tree
    }

    #[test]
    fn test_remove_missing_key() {
        let mut tree = tree_with(4, 0..10);
        assert_eq!(tree.remove(&42), Err(Error::KeyNotFound));
        assert_eq!(tree.remove(&42), Err(Error::KeyNotFound));
        assert_eq!(tree.len(), 10);
        tree.check_invariants();
    }

    #[test]
    fn test_root_leaf_may_empty_out() {
        let mut tree = tree_with(4, [1, 2]);
        assert_eq!(tree.remove(&1), Ok(1));
        assert_eq!(tree.remove(&2), Ok(2));
        assert!(tree.is_empty());
        assert_eq!(tree.height(), 1);
        tree.check_invariants();
    }

    #[test]
    fn test_borrow_from_left_leaf() {
        // Order 4 leaves: [10 20] [30 40 50] after the split; refill left.
        let mut tree = tree_with(4, [10, 20, 30, 40, 50]);
        tree.insert(15, 15).unwrap();
        // Leaves: [10 15 20] [30 40 50]; empty the right one down to zero.
        tree.remove(&30).unwrap();
        tree.remove(&40).unwrap();
        tree.remove(&50).unwrap();

        assert_eq!(tree.stats().borrows, 1);
        assert_eq!(tree.internal(tree.root).keys, vec![20]);
        assert_eq!(tree.keys().copied().collect::<Vec<_>>(), vec![10, 15, 20]);
        tree.check_invariants();
    }

    #[test]
    fn test_borrow_from_right_leaf() {
        let mut tree = tree_with(4, [10, 20, 30, 40, 50]);
        // Leaves: [10 20] [30 40 50]
        tree.remove(&10).unwrap();
        tree.remove(&20).unwrap();

        assert_eq!(tree.stats().borrows, 1);
        assert_eq!(tree.internal(tree.root).keys, vec![40]);
        tree.check_invariants();
    }

    #[test]
    fn test_merge_leaves_and_shrink_root() {
        let mut tree = tree_with(4, [10, 20, 30, 40]);
        // Leaves: [10 20] [30 40]; thin both to the minimum first.
        tree.remove(&10).unwrap();
        tree.remove(&40).unwrap();
        assert_eq!(tree.stats().merges, 0);

        tree.remove(&30).unwrap();

        let stats = tree.stats();
        assert_eq!(stats.merges, 1);
        assert_eq!(stats.root_shrinks, 1);
        assert_eq!(tree.height(), 1);
        assert_eq!(tree.leaf_count(), 1);
        assert_eq!(tree.node_count(), 1);
        tree.check_invariants();
    }

    #[test]
    fn test_merge_unlinks_leaf_from_chain() {
        // Leaves: [0 1] [2 3] [4 5] | [6 7] [8 9] [10 11]
        let mut tree = tree_with(4, 0..12);
        assert_eq!(tree.leaf_count(), 6);

        // Thin [2 3], [4 5] and [6 7] to one entry each.
        for k in [2, 4, 6] {
            tree.remove(&k).unwrap();
        }
        assert_eq!(tree.stats().merges, 0);

        // [5] empties; [3] cannot lend and it has no right sibling under
        // the same parent, so it merges into [3].
        tree.remove(&5).unwrap();

        let stats = tree.stats();
        assert_eq!(stats.merges, 1);
        assert_eq!(stats.borrows, 0);
        assert_eq!(tree.leaf_count(), 5);

        let chained: Vec<_> = tree.chain.iter().collect();
        assert_eq!(chained.len(), 5);
        for &leaf in &chained {
            assert!(tree.nodes.contains(leaf));
        }
        assert_eq!(tree.dump_leaf_chain().matches("Leaf").count(), 5);
        assert_eq!(
            tree.keys().copied().collect::<Vec<_>>(),
            vec![0, 1, 3, 7, 8, 9, 10, 11]
        );
        tree.check_invariants();
    }

    #[test]
    fn test_internal_merge_pulls_separator_down() {
        let mut tree = tree_with(3, 1..=6);
        // root [3]; internals [2] and [4 5]; leaves [1] [2] [3] [4] [5 6]
        assert_eq!(tree.height(), 3);

        tree.remove(&1).unwrap();
        // Leaf [1] empties and merges with [2]; the left internal drops to a
        // single child and borrows from [4 5].
        tree.check_invariants();
        assert_eq!(tree.height(), 3);

        tree.remove(&2).unwrap();
        tree.remove(&3).unwrap();
        tree.check_invariants();
        assert_eq!(tree.height(), 2);
        assert_eq!(tree.keys().copied().collect::<Vec<_>>(), vec![4, 5, 6]);
    }

    #[test]
    fn test_separator_tracks_deleted_minimum() {
        let mut tree = tree_with(5, 0..20);
        let root_keys = tree.internal(tree.root).keys.clone();
        let separator = root_keys[0];

        tree.remove(&separator).unwrap();

        assert!(!tree.internal(tree.root).keys.contains(&separator));
        tree.check_invariants();
    }

    #[test]
    fn test_pop_first_and_last() {
        let mut tree = tree_with(3, 0..10);
        assert_eq!(tree.pop_first(), Some((0, 0)));
        assert_eq!(tree.pop_last(), Some((9, 9)));
        assert_eq!(tree.len(), 8);
        tree.check_invariants();

        let mut empty: BPlusTree<i32, i32> = BPlusTree::new(3).unwrap();
        assert_eq!(empty.pop_first(), None);
        assert_eq!(empty.pop_last(), None);
    }

    #[test]
    fn test_pop_drains_deep_tree_from_both_ends() {
        let mut tree = tree_with(3, 0..40);
        let mut popped = Vec::new();
        while let Some((key, value)) = tree.pop_first() {
            assert_eq!(key, value);
            popped.push(key);
            tree.check_invariants();
            if let Some((key, _)) = tree.pop_last() {
                popped.push(key);
                tree.check_invariants();
            }
        }

        popped.sort_unstable();
        assert_eq!(popped, (0..40).collect::<Vec<_>>());
        assert!(tree.is_empty());
        assert_eq!(tree.height(), 1);
        assert!(tree.stats().merges > 0);
    }

    #[test]
    fn test_remove_everything_in_every_order() {
        for order in 3..8 {
            let mut tree = tree_with(order, 0..100);
            for k in (0..100).step_by(2).chain((1..100).step_by(2).rev()) {
                assert_eq!(tree.remove(&k), Ok(k));
                tree.check_invariants();
            }
            assert!(tree.is_empty());
            assert_eq!(tree.height(), 1);
            assert_eq!(tree.node_count(), 1);
        }
    }
}
